//! Variant rule layer.
//!
//! Variants are a capability overlay on the shared rules engine rather than
//! separate engines: the base generator always runs, and the variant
//! contributes its extra moves (drops) and capture side effects through the
//! hooks the [`Position`] and generator call.

use talon_core::{FenParser, Move, MoveFlag, Piece};

use crate::movegen::{PriorityMoveList, PRIORITY_DROP};
use crate::{Bitboard, Position};

/// The supported rule sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    #[default]
    Standard,
    Crazyhouse,
}

impl Variant {
    /// Returns true if captured pieces go to a pocket and can be dropped.
    #[inline]
    pub const fn is_droppable(self) -> bool {
        matches!(self, Variant::Crazyhouse)
    }

    /// Returns the variant's name as used in PGN `[Variant "..."]` tags.
    pub const fn name(self) -> &'static str {
        match self {
            Variant::Standard => "Standard",
            Variant::Crazyhouse => "Crazyhouse",
        }
    }

    /// Resolves a PGN variant tag value. Unrecognized names are `None`.
    pub fn from_name(name: &str) -> Option<Variant> {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "standard" | "chess" | "normal" => Some(Variant::Standard),
            "crazyhouse" | "zh" => Some(Variant::Crazyhouse),
            _ => None,
        }
    }

    /// Returns the starting position for this variant.
    pub fn initial_position(self) -> Position {
        let fen = match self {
            Variant::Standard => FenParser::STARTPOS,
            Variant::Crazyhouse => FenParser::STARTPOS_CRAZYHOUSE,
        };
        Position::from_fen_variant(fen, self).expect("built-in start FEN is valid")
    }

    /// Appends pseudo-legal drop moves for the side to move.
    ///
    /// One drop per pocketed type per empty square; pawns are never dropped
    /// on the first or last rank. Standard chess contributes nothing.
    pub fn generate_drops(self, position: &Position, moves: &mut PriorityMoveList) {
        if !self.is_droppable() {
            return;
        }

        let us = position.side_to_move;
        let pocket = &position.pockets[us.index()];
        if pocket.is_empty() {
            return;
        }

        let empty = position.empty_squares();
        for (piece, _) in pocket.iter() {
            let targets = match piece {
                Piece::Pawn => empty & Bitboard::PAWN_DROP_MASK,
                _ => empty,
            };
            let flag = match MoveFlag::drop_for(piece) {
                Some(flag) => flag,
                None => continue,
            };
            for to in targets {
                moves.push(Move::new(to, to, flag).with_priority(PRIORITY_DROP));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talon_core::Color;

    #[test]
    fn names_roundtrip() {
        assert_eq!(Variant::from_name("Crazyhouse"), Some(Variant::Crazyhouse));
        assert_eq!(Variant::from_name("standard"), Some(Variant::Standard));
        assert_eq!(Variant::from_name("atomic"), None);
    }

    #[test]
    fn standard_generates_no_drops() {
        let pos = Variant::Standard.initial_position();
        let mut moves = PriorityMoveList::new();
        Variant::Standard.generate_drops(&pos, &mut moves);
        assert!(moves.is_empty());
    }

    #[test]
    fn empty_pocket_generates_no_drops() {
        let pos = Variant::Crazyhouse.initial_position();
        let mut moves = PriorityMoveList::new();
        Variant::Crazyhouse.generate_drops(&pos, &mut moves);
        assert!(moves.is_empty());
    }

    #[test]
    fn knight_drops_cover_all_empty_squares() {
        let pos =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR[N] w KQkq - 0 1")
                .unwrap();
        let mut moves = PriorityMoveList::new();
        Variant::Crazyhouse.generate_drops(&pos, &mut moves);
        assert_eq!(moves.len(), 32);
        assert!(moves.iter().all(|m| m.is_drop()));
    }

    #[test]
    fn pawn_drops_exclude_back_ranks() {
        // Board with empty squares on ranks 1 and 8.
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3[Pp] w - - 0 1").unwrap();
        let mut moves = PriorityMoveList::new();
        Variant::Crazyhouse.generate_drops(&pos, &mut moves);
        // 48 droppable squares (ranks 2-7), none occupied.
        assert_eq!(moves.len(), 48);
        assert!(moves
            .iter()
            .all(|m| { m.to().rank().index() >= 1 && m.to().rank().index() <= 6 }));
    }

    #[test]
    fn drops_use_side_to_move_pocket() {
        let pos =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR[n] w KQkq - 0 1")
                .unwrap();
        let mut moves = PriorityMoveList::new();
        Variant::Crazyhouse.generate_drops(&pos, &mut moves);
        assert!(moves.is_empty());
        assert_eq!(pos.pocket_count(Color::Black, Piece::Knight), 1);
    }
}
