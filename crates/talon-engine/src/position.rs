//! Chess position representation.
//!
//! [`Position`] is the authoritative board state: bitboard occupancy, side
//! to move, castling and en-passant rights, clocks, and variant extras
//! (drop pockets, promoted-piece tracking). It is mutated in place by
//! [`Position::apply_move`] and cloned via [`Position::deep_copy`] for
//! search, undo-by-replay, and legality filtering.
//!
//! Legality is not checked here: applying an illegal move is a caller
//! contract violation. The move generator is the legality authority.

use talon_core::{Color, FenError, FenParser, Move, MoveFlag, Piece, Square};

use crate::zobrist;
use crate::{Bitboard, Pocket, Variant};

/// Castling rights flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const WHITE_KINGSIDE: u8 = 0b0001;
    pub const WHITE_QUEENSIDE: u8 = 0b0010;
    pub const BLACK_KINGSIDE: u8 = 0b0100;
    pub const BLACK_QUEENSIDE: u8 = 0b1000;
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    /// Creates castling rights from raw flags.
    #[inline]
    pub const fn new(flags: u8) -> Self {
        CastlingRights(flags & 0b1111)
    }

    /// Returns true if the given side can castle kingside.
    #[inline]
    pub const fn can_castle_kingside(self, color: Color) -> bool {
        let flag = match color {
            Color::White => Self::WHITE_KINGSIDE,
            Color::Black => Self::BLACK_KINGSIDE,
        };
        (self.0 & flag) != 0
    }

    /// Returns true if the given side can castle queenside.
    #[inline]
    pub const fn can_castle_queenside(self, color: Color) -> bool {
        let flag = match color {
            Color::White => Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_QUEENSIDE,
        };
        (self.0 & flag) != 0
    }

    /// Removes all castling rights for a color.
    #[inline]
    pub fn remove_color(&mut self, color: Color) {
        let mask = match color {
            Color::White => !(Self::WHITE_KINGSIDE | Self::WHITE_QUEENSIDE),
            Color::Black => !(Self::BLACK_KINGSIDE | Self::BLACK_QUEENSIDE),
        };
        self.0 &= mask;
    }

    /// Removes kingside castling for a color.
    #[inline]
    pub fn remove_kingside(&mut self, color: Color) {
        let mask = match color {
            Color::White => !Self::WHITE_KINGSIDE,
            Color::Black => !Self::BLACK_KINGSIDE,
        };
        self.0 &= mask;
    }

    /// Removes queenside castling for a color.
    #[inline]
    pub fn remove_queenside(&mut self, color: Color) {
        let mask = match color {
            Color::White => !Self::WHITE_QUEENSIDE,
            Color::Black => !Self::BLACK_QUEENSIDE,
        };
        self.0 &= mask;
    }

    /// Returns the raw flags.
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

/// Complete board state for a single position.
#[derive(Debug, Clone)]
pub struct Position {
    /// Bitboards per piece type. Intersect with a color mask to get the
    /// per-color occupancy for that type.
    pub pieces: [Bitboard; 6],

    /// Bitboards per color.
    pub colors: [Bitboard; 2],

    /// The side to move.
    pub side_to_move: Color,

    /// Castling rights.
    pub castling: CastlingRights,

    /// En passant target square, set only immediately after a double push.
    pub en_passant: Option<Square>,

    /// Halfmove clock for the 50-move rule.
    pub halfmove_clock: u32,

    /// Fullmove number (starts at 1, increments after Black's move).
    pub fullmove_number: u32,

    /// The active variant rules.
    pub variant: Variant,

    /// Per-color drop pockets (meaningful in droppable variants).
    pub pockets: [Pocket; 2],

    /// Squares occupied by pieces that arose from promotion. A captured
    /// promoted piece pockets as a pawn in droppable variants.
    pub promoted: Bitboard,

    /// Cached Zobrist hash, invalidated on mutation. Not part of equality.
    hash: Option<u64>,
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.pieces == other.pieces
            && self.colors == other.colors
            && self.side_to_move == other.side_to_move
            && self.castling == other.castling
            && self.en_passant == other.en_passant
            && self.halfmove_clock == other.halfmove_clock
            && self.fullmove_number == other.fullmove_number
            && self.variant == other.variant
            && self.pockets == other.pockets
            && self.promoted == other.promoted
    }
}

impl Eq for Position {}

impl Position {
    /// Creates an empty position for the given variant.
    pub fn empty(variant: Variant) -> Self {
        Position {
            pieces: [Bitboard::EMPTY; 6],
            colors: [Bitboard::EMPTY; 2],
            side_to_move: Color::White,
            castling: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            variant,
            pockets: [Pocket::new(); 2],
            promoted: Bitboard::EMPTY,
            hash: None,
        }
    }

    /// Creates the standard starting position.
    pub fn startpos() -> Self {
        Self::from_fen(FenParser::STARTPOS).expect("STARTPOS is valid")
    }

    /// Creates a position from a FEN string.
    ///
    /// A bracketed pocket segment (`...RNBQKBNR[QRp] w ...`) selects the
    /// crazyhouse variant; use [`Position::from_fen_variant`] to force one.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let parsed = FenParser::parse(fen)?;
        let variant = if parsed.pocket.is_some() {
            Variant::Crazyhouse
        } else {
            Variant::Standard
        };
        Self::build(parsed, variant)
    }

    /// Creates a position from a FEN string with an explicit variant.
    pub fn from_fen_variant(fen: &str, variant: Variant) -> Result<Self, FenError> {
        let parsed = FenParser::parse(fen)?;
        Self::build(parsed, variant)
    }

    fn build(parsed: FenParser, variant: Variant) -> Result<Self, FenError> {
        let mut position = Position::empty(variant);

        let ranks: Vec<&str> = parsed.piece_placement.split('/').collect();
        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx; // FEN lists rank 8 first
            let mut file = 0usize;

            for c in rank_str.chars() {
                if let Some(digit) = c.to_digit(10) {
                    file += digit as usize;
                } else if let Some((piece, color)) = Piece::from_fen_char(c) {
                    let sq = unsafe { Square::from_index_unchecked((rank * 8 + file) as u8) };
                    position.pieces[piece.index()].set(sq);
                    position.colors[color.index()].set(sq);
                    file += 1;
                }
            }
        }

        if let Some(pocket) = &parsed.pocket {
            for c in pocket.chars() {
                if let Some((piece, color)) = Piece::from_fen_char(c) {
                    position.pockets[color.index()].add(piece);
                }
            }
        }

        position.side_to_move = match parsed.active_color {
            'w' => Color::White,
            'b' => Color::Black,
            _ => unreachable!("FEN parser validated this"),
        };

        let mut castling = 0u8;
        for c in parsed.castling.chars() {
            match c {
                'K' => castling |= CastlingRights::WHITE_KINGSIDE,
                'Q' => castling |= CastlingRights::WHITE_QUEENSIDE,
                'k' => castling |= CastlingRights::BLACK_KINGSIDE,
                'q' => castling |= CastlingRights::BLACK_QUEENSIDE,
                _ => {}
            }
        }
        position.castling = CastlingRights::new(castling);

        position.en_passant = if parsed.en_passant == "-" {
            None
        } else {
            Square::from_algebraic(&parsed.en_passant)
        };

        position.halfmove_clock = parsed.halfmove_clock;
        position.fullmove_number = parsed.fullmove_number;

        Ok(position)
    }

    /// Serializes the position to FEN. Droppable variants include the
    /// bracketed pocket segment.
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();

        for rank in (0..8).rev() {
            let mut empty_count = 0;
            for file in 0..8 {
                let sq = unsafe { Square::from_index_unchecked(rank * 8 + file) };
                if let Some((piece, color)) = self.piece_at(sq) {
                    if empty_count > 0 {
                        fen.push_str(&empty_count.to_string());
                        empty_count = 0;
                    }
                    fen.push(piece.to_fen_char(color));
                } else {
                    empty_count += 1;
                }
            }
            if empty_count > 0 {
                fen.push_str(&empty_count.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        if self.variant.is_droppable() {
            fen.push('[');
            fen.push_str(&self.pockets[Color::White.index()].to_fen_chars(Color::White));
            fen.push_str(&self.pockets[Color::Black.index()].to_fen_chars(Color::Black));
            fen.push(']');
        }

        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        fen.push(' ');
        if self.castling.raw() == 0 {
            fen.push('-');
        } else {
            if self.castling.can_castle_kingside(Color::White) {
                fen.push('K');
            }
            if self.castling.can_castle_queenside(Color::White) {
                fen.push('Q');
            }
            if self.castling.can_castle_kingside(Color::Black) {
                fen.push('k');
            }
            if self.castling.can_castle_queenside(Color::Black) {
                fen.push('q');
            }
        }

        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&sq.to_algebraic()),
            None => fen.push('-'),
        }

        fen.push(' ');
        fen.push_str(&self.halfmove_clock.to_string());
        fen.push(' ');
        fen.push_str(&self.fullmove_number.to_string());

        fen
    }

    /// Returns the piece and color at the given square, if any.
    pub fn piece_at(&self, sq: Square) -> Option<(Piece, Color)> {
        let bb = Bitboard::from_square(sq);

        let color = if (self.colors[Color::White.index()] & bb).is_not_empty() {
            Color::White
        } else if (self.colors[Color::Black.index()] & bb).is_not_empty() {
            Color::Black
        } else {
            return None;
        };

        for piece in Piece::ALL {
            if (self.pieces[piece.index()] & bb).is_not_empty() {
                return Some((piece, color));
            }
        }

        None
    }

    /// Returns a bitboard of all occupied squares.
    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.colors[0] | self.colors[1]
    }

    /// Returns a bitboard of all empty squares.
    #[inline]
    pub fn empty_squares(&self) -> Bitboard {
        !self.occupied()
    }

    /// Returns the occupancy mask for one of the 12 color/piece-type pairs.
    #[inline]
    pub fn pieces_of(&self, piece: Piece, color: Color) -> Bitboard {
        self.pieces[piece.index()] & self.colors[color.index()]
    }

    /// Returns the king square for the given color, if present.
    #[inline]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces_of(Piece::King, color).lsb()
    }

    /// Returns the pocket count for a color and piece type.
    #[inline]
    pub fn pocket_count(&self, color: Color, piece: Piece) -> u8 {
        self.pockets[color.index()].count(piece)
    }

    /// Returns an independent clone of this position.
    ///
    /// With `ignore_hashes` the cached Zobrist hash is not carried over;
    /// callers that will mutate the copy immediately (search, legality
    /// probing) skip the stale cache this way.
    pub fn deep_copy(&self, ignore_hashes: bool) -> Position {
        let mut copy = self.clone();
        if ignore_hashes {
            copy.hash = None;
        }
        copy
    }

    /// Returns the Zobrist hash of this position, computing it if no cached
    /// value is available.
    pub fn zobrist_hash(&self) -> u64 {
        self.hash.unwrap_or_else(|| zobrist::hash_position(self))
    }

    /// Computes and caches the Zobrist hash.
    pub fn refresh_hash(&mut self) -> u64 {
        let h = zobrist::hash_position(self);
        self.hash = Some(h);
        h
    }

    /// Applies a move in place.
    ///
    /// The move must be legal in this position; this method trusts its
    /// caller and performs no legality checking. Occupancy masks, clocks,
    /// castling and en-passant rights, the promoted mask, and drop pockets
    /// are all updated.
    pub fn apply_move(&mut self, m: Move) {
        let us = self.side_to_move;
        let them = us.opposite();
        self.hash = None;

        if let Some(piece) = m.flag().drop_piece() {
            self.apply_drop(piece, m.to());
            self.debug_validate();
            return;
        }

        let from = m.from();
        let to = m.to();
        let (piece, _) = self
            .piece_at(from)
            .expect("apply_move: no piece on the from square");

        self.pieces[piece.index()].clear(from);
        self.colors[us.index()].clear(from);

        let mut is_capture = false;
        if let Some((captured, _)) = self.piece_at(to) {
            self.pieces[captured.index()].clear(to);
            self.colors[them.index()].clear(to);
            is_capture = true;

            if self.variant.is_droppable() {
                // A captured promoted piece reverts to its base type.
                let pocketed = if self.promoted.contains(to) {
                    Piece::Pawn
                } else {
                    captured
                };
                self.pockets[us.index()].add(pocketed);
            }
            self.promoted.clear(to);
        }

        if m.flag() == MoveFlag::EnPassant {
            let captured_sq = match us {
                Color::White => unsafe { Square::from_index_unchecked(to.index() - 8) },
                Color::Black => unsafe { Square::from_index_unchecked(to.index() + 8) },
            };
            self.pieces[Piece::Pawn.index()].clear(captured_sq);
            self.colors[them.index()].clear(captured_sq);
            is_capture = true;

            if self.variant.is_droppable() {
                self.pockets[us.index()].add(Piece::Pawn);
            }
        }

        let dest_piece = m.flag().promotion_piece().unwrap_or(piece);
        self.pieces[dest_piece.index()].set(to);
        self.colors[us.index()].set(to);

        // Promoted tracking travels with the piece.
        let was_promoted = self.promoted.contains(from);
        self.promoted.clear(from);
        if was_promoted || m.flag().is_promotion() {
            self.promoted.set(to);
        }

        match m.flag() {
            MoveFlag::CastleKingside => {
                let (rook_from, rook_to) = match us {
                    Color::White => (Square::H1, Square::F1),
                    Color::Black => (Square::H8, Square::F8),
                };
                self.move_rook_for_castle(us, rook_from, rook_to);
            }
            MoveFlag::CastleQueenside => {
                let (rook_from, rook_to) = match us {
                    Color::White => (Square::A1, Square::D1),
                    Color::Black => (Square::A8, Square::D8),
                };
                self.move_rook_for_castle(us, rook_from, rook_to);
            }
            _ => {}
        }

        // A king move drops both rights; a rook move or a capture on a rook
        // home square drops the matching one.
        if piece == Piece::King {
            self.castling.remove_color(us);
        }
        if piece == Piece::Rook {
            match from {
                Square::H1 => self.castling.remove_kingside(Color::White),
                Square::A1 => self.castling.remove_queenside(Color::White),
                Square::H8 => self.castling.remove_kingside(Color::Black),
                Square::A8 => self.castling.remove_queenside(Color::Black),
                _ => {}
            }
        }
        match to {
            Square::H1 => self.castling.remove_kingside(Color::White),
            Square::A1 => self.castling.remove_queenside(Color::White),
            Square::H8 => self.castling.remove_kingside(Color::Black),
            Square::A8 => self.castling.remove_queenside(Color::Black),
            _ => {}
        }

        self.en_passant = if m.flag() == MoveFlag::DoublePush {
            let ep_sq = match us {
                Color::White => unsafe { Square::from_index_unchecked(to.index() - 8) },
                Color::Black => unsafe { Square::from_index_unchecked(to.index() + 8) },
            };
            Some(ep_sq)
        } else {
            None
        };

        if piece == Piece::Pawn || is_capture {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }

        if us == Color::Black {
            self.fullmove_number += 1;
        }

        self.side_to_move = them;
        self.debug_validate();
    }

    fn apply_drop(&mut self, piece: Piece, to: Square) {
        let us = self.side_to_move;
        let removed = self.pockets[us.index()].remove(piece);
        debug_assert!(removed, "drop move without a pocketed {piece}");

        self.pieces[piece.index()].set(to);
        self.colors[us.index()].set(to);

        self.en_passant = None;
        if piece == Piece::Pawn {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if us == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = us.opposite();
    }

    fn move_rook_for_castle(&mut self, us: Color, rook_from: Square, rook_to: Square) {
        self.pieces[Piece::Rook.index()].clear(rook_from);
        self.colors[us.index()].clear(rook_from);
        self.pieces[Piece::Rook.index()].set(rook_to);
        self.colors[us.index()].set(rook_to);
    }

    /// Debug check of the core bitboard invariant: the per-type masks are
    /// pairwise disjoint and their union equals the occupancy mask.
    #[inline]
    fn debug_validate(&self) {
        #[cfg(debug_assertions)]
        {
            let mut union = Bitboard::EMPTY;
            let mut total = 0;
            for piece in Piece::ALL {
                union |= self.pieces[piece.index()];
                total += self.pieces[piece.index()].count();
            }
            debug_assert_eq!(total, union.count(), "piece masks overlap");
            debug_assert_eq!(union, self.occupied(), "piece/color masks disagree");
            debug_assert!((self.colors[0] & self.colors[1]).is_empty());
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}
