//! Move representation.
//!
//! A [`Move`] describes a single ply: board moves (with castling, en passant
//! and promotion flags) and variant drop moves, plus an ordering hint used by
//! move lists. Moves are immutable values; `with_priority` returns a new one.

use crate::{Piece, Square};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Flags for special move types, including variant drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MoveFlag {
    /// Normal move (no special action).
    Normal = 0,
    /// Pawn double push from the starting rank.
    DoublePush = 1,
    /// Kingside castling (O-O).
    CastleKingside = 2,
    /// Queenside castling (O-O-O).
    CastleQueenside = 3,
    /// En passant capture.
    EnPassant = 4,
    /// Pawn promotion to knight.
    PromoteKnight = 5,
    /// Pawn promotion to bishop.
    PromoteBishop = 6,
    /// Pawn promotion to rook.
    PromoteRook = 7,
    /// Pawn promotion to queen.
    PromoteQueen = 8,
    /// Pawn drop from the pocket.
    DropPawn = 9,
    /// Knight drop from the pocket.
    DropKnight = 10,
    /// Bishop drop from the pocket.
    DropBishop = 11,
    /// Rook drop from the pocket.
    DropRook = 12,
    /// Queen drop from the pocket.
    DropQueen = 13,
}

impl MoveFlag {
    const fn from_bits(bits: u8) -> MoveFlag {
        match bits {
            1 => MoveFlag::DoublePush,
            2 => MoveFlag::CastleKingside,
            3 => MoveFlag::CastleQueenside,
            4 => MoveFlag::EnPassant,
            5 => MoveFlag::PromoteKnight,
            6 => MoveFlag::PromoteBishop,
            7 => MoveFlag::PromoteRook,
            8 => MoveFlag::PromoteQueen,
            9 => MoveFlag::DropPawn,
            10 => MoveFlag::DropKnight,
            11 => MoveFlag::DropBishop,
            12 => MoveFlag::DropRook,
            13 => MoveFlag::DropQueen,
            _ => MoveFlag::Normal,
        }
    }

    /// Returns the promotion piece if this is a promotion move.
    #[inline]
    pub const fn promotion_piece(self) -> Option<Piece> {
        match self {
            MoveFlag::PromoteKnight => Some(Piece::Knight),
            MoveFlag::PromoteBishop => Some(Piece::Bishop),
            MoveFlag::PromoteRook => Some(Piece::Rook),
            MoveFlag::PromoteQueen => Some(Piece::Queen),
            _ => None,
        }
    }

    /// Returns the dropped piece if this is a drop move.
    #[inline]
    pub const fn drop_piece(self) -> Option<Piece> {
        match self {
            MoveFlag::DropPawn => Some(Piece::Pawn),
            MoveFlag::DropKnight => Some(Piece::Knight),
            MoveFlag::DropBishop => Some(Piece::Bishop),
            MoveFlag::DropRook => Some(Piece::Rook),
            MoveFlag::DropQueen => Some(Piece::Queen),
            _ => None,
        }
    }

    /// Returns the drop flag for a droppable piece type.
    #[inline]
    pub const fn drop_for(piece: Piece) -> Option<MoveFlag> {
        match piece {
            Piece::Pawn => Some(MoveFlag::DropPawn),
            Piece::Knight => Some(MoveFlag::DropKnight),
            Piece::Bishop => Some(MoveFlag::DropBishop),
            Piece::Rook => Some(MoveFlag::DropRook),
            Piece::Queen => Some(MoveFlag::DropQueen),
            Piece::King => None,
        }
    }

    /// Returns true if this is a promotion move.
    #[inline]
    pub const fn is_promotion(self) -> bool {
        self.promotion_piece().is_some()
    }

    /// Returns true if this is a drop move.
    #[inline]
    pub const fn is_drop(self) -> bool {
        self.drop_piece().is_some()
    }

    /// Returns true if this is a castling move.
    #[inline]
    pub const fn is_castling(self) -> bool {
        matches!(self, MoveFlag::CastleKingside | MoveFlag::CastleQueenside)
    }
}

/// A single ply.
///
/// Encoded compactly: 6 bits from, 6 bits to, 4 bits flag, 8 bits priority
/// hint. Drop moves store the destination in both square fields. The
/// priority hint participates in move-list ordering only; equality and
/// hashing ignore it, so re-sorting a list never changes move identity.
#[derive(Clone, Copy, Eq)]
pub struct Move(u32);

const IDENTITY_MASK: u32 = 0xFFFF;

impl Move {
    /// Creates a new move with priority 0.
    #[inline]
    pub const fn new(from: Square, to: Square, flag: MoveFlag) -> Self {
        let encoded =
            (from.index() as u32) | ((to.index() as u32) << 6) | ((flag as u32) << 12);
        Move(encoded)
    }

    /// Creates a normal move (no special flags).
    #[inline]
    pub const fn normal(from: Square, to: Square) -> Self {
        Self::new(from, to, MoveFlag::Normal)
    }

    /// Creates a drop move for a droppable piece type.
    ///
    /// Returns `None` for kings, which can never be dropped.
    #[inline]
    pub const fn drop(piece: Piece, to: Square) -> Option<Self> {
        match MoveFlag::drop_for(piece) {
            Some(flag) => Some(Self::new(to, to, flag)),
            None => None,
        }
    }

    /// Returns a copy of this move carrying the given ordering hint.
    #[inline]
    pub const fn with_priority(self, priority: u8) -> Self {
        Move((self.0 & IDENTITY_MASK) | ((priority as u32) << 16))
    }

    /// Returns the ordering hint.
    #[inline]
    pub const fn priority(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Returns the source square. For drop moves this equals [`Move::to`].
    #[inline]
    pub const fn from(self) -> Square {
        // SAFETY: masked to 6 bits, always a valid square index
        unsafe { Square::from_index_unchecked((self.0 & 0x3F) as u8) }
    }

    /// Returns the destination square.
    #[inline]
    pub const fn to(self) -> Square {
        // SAFETY: masked to 6 bits, always a valid square index
        unsafe { Square::from_index_unchecked(((self.0 >> 6) & 0x3F) as u8) }
    }

    /// Returns the move flag.
    #[inline]
    pub const fn flag(self) -> MoveFlag {
        MoveFlag::from_bits(((self.0 >> 12) & 0xF) as u8)
    }

    /// Returns true if this is a drop move.
    #[inline]
    pub const fn is_drop(self) -> bool {
        self.flag().is_drop()
    }

    /// Returns the coordinate notation for this move: "e2e4", "e7e8q" for
    /// promotions, "N@f3" for drops.
    pub fn to_coords(self) -> String {
        if let Some(piece) = self.flag().drop_piece() {
            return format!("{}@{}", piece.to_letter(), self.to());
        }
        let promo = match self.flag() {
            MoveFlag::PromoteKnight => "n",
            MoveFlag::PromoteBishop => "b",
            MoveFlag::PromoteRook => "r",
            MoveFlag::PromoteQueen => "q",
            _ => "",
        };
        format!("{}{}{}", self.from(), self.to(), promo)
    }

    /// Parses coordinate notation, including `P@e4`-style drops.
    ///
    /// The result carries no positional context: flags other than promotion
    /// and drop must be reconstructed against a position's legal move set.
    pub fn from_coords(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() == 4 && bytes[1] == b'@' {
            let piece = Piece::from_letter((bytes[0] as char).to_ascii_uppercase())?;
            let to = Square::from_algebraic(&s[2..4])?;
            return Self::drop(piece, to);
        }
        if s.len() < 4 || s.len() > 5 {
            return None;
        }
        let from = Square::from_algebraic(&s[0..2])?;
        let to = Square::from_algebraic(&s[2..4])?;
        let flag = if s.len() == 5 {
            match bytes[4].to_ascii_lowercase() {
                b'n' => MoveFlag::PromoteKnight,
                b'b' => MoveFlag::PromoteBishop,
                b'r' => MoveFlag::PromoteRook,
                b'q' => MoveFlag::PromoteQueen,
                _ => return None,
            }
        } else {
            MoveFlag::Normal
        };
        Some(Move::new(from, to, flag))
    }

    /// A null move (placeholder, not a legal move).
    pub const NULL: Move = Move(0);
}

impl PartialEq for Move {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        (self.0 & IDENTITY_MASK) == (other.0 & IDENTITY_MASK)
    }
}

impl Hash for Move {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.0 & IDENTITY_MASK).hash(state);
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({})", self.to_coords())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_coords())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{File, Rank};

    #[test]
    fn move_encoding() {
        let e2 = Square::new(File::E, Rank::R2);
        let e4 = Square::new(File::E, Rank::R4);
        let m = Move::new(e2, e4, MoveFlag::DoublePush);

        assert_eq!(m.from(), e2);
        assert_eq!(m.to(), e4);
        assert_eq!(m.flag(), MoveFlag::DoublePush);
        assert_eq!(m.priority(), 0);
    }

    #[test]
    fn drop_encoding() {
        let f3 = Square::new(File::F, Rank::R3);
        let m = Move::drop(Piece::Knight, f3).unwrap();
        assert!(m.is_drop());
        assert_eq!(m.to(), f3);
        assert_eq!(m.flag().drop_piece(), Some(Piece::Knight));
        assert!(Move::drop(Piece::King, f3).is_none());
    }

    #[test]
    fn priority_is_not_identity() {
        let e2 = Square::new(File::E, Rank::R2);
        let e4 = Square::new(File::E, Rank::R4);
        let m = Move::normal(e2, e4);
        let ranked = m.with_priority(50);

        assert_eq!(ranked.priority(), 50);
        assert_eq!(m, ranked);
        assert_eq!(ranked.from(), e2);
        assert_eq!(ranked.to(), e4);
    }

    #[test]
    fn coords_roundtrip() {
        let m = Move::from_coords("e2e4").unwrap();
        assert_eq!(m.to_coords(), "e2e4");

        let promo = Move::from_coords("e7e8q").unwrap();
        assert_eq!(promo.flag(), MoveFlag::PromoteQueen);
        assert_eq!(promo.to_coords(), "e7e8q");

        let drop = Move::from_coords("N@f3").unwrap();
        assert_eq!(drop.flag(), MoveFlag::DropKnight);
        assert_eq!(drop.to_coords(), "N@f3");

        assert!(Move::from_coords("e2").is_none());
        assert!(Move::from_coords("e2e9").is_none());
        assert!(Move::from_coords("K@e4").is_none());
        assert!(Move::from_coords("e7e8x").is_none());
    }

    #[test]
    fn drop_from_lowercase_coords() {
        let drop = Move::from_coords("p@e4").unwrap();
        assert_eq!(drop.flag(), MoveFlag::DropPawn);
        assert_eq!(drop.to_coords(), "P@e4");
    }
}
