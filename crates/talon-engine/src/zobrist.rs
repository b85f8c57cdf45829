//! Zobrist hashing.
//!
//! Keys are generated at compile time with an xorshift64 generator so the
//! hash of a position is stable across runs. Pockets and promoted-piece
//! tracking are hashed too; two crazyhouse positions with identical boards
//! but different pockets must not collide in repetition detection.

use talon_core::{Color, Piece};

use crate::Position;

const SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// Pocket counts above this are clamped for key lookup. A real game cannot
/// exceed 16 of one type in hand.
const MAX_POCKET: usize = 16;

const fn next_key(state: u64) -> u64 {
    let mut x = state;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x
}

const fn gen_piece_keys() -> [[[u64; 64]; 6]; 2] {
    let mut keys = [[[0u64; 64]; 6]; 2];
    let mut state = SEED;
    let mut color = 0;
    while color < 2 {
        let mut piece = 0;
        while piece < 6 {
            let mut sq = 0;
            while sq < 64 {
                state = next_key(state);
                keys[color][piece][sq] = state;
                sq += 1;
            }
            piece += 1;
        }
        color += 1;
    }
    keys
}

const fn gen_keys<const N: usize>(mut state: u64) -> [u64; N] {
    let mut keys = [0u64; N];
    let mut i = 0;
    while i < N {
        state = next_key(state);
        keys[i] = state;
        i += 1;
    }
    keys
}

const fn gen_pocket_keys() -> [[[u64; MAX_POCKET + 1]; 5]; 2] {
    let mut keys = [[[0u64; MAX_POCKET + 1]; 5]; 2];
    let mut state = SEED ^ 0xC0FF_EE00_DEAD_BEEF;
    let mut color = 0;
    while color < 2 {
        let mut piece = 0;
        while piece < 5 {
            // Count 0 hashes to nothing so an empty pocket is neutral.
            let mut count = 1;
            while count <= MAX_POCKET {
                state = next_key(state);
                keys[color][piece][count] = state;
                count += 1;
            }
            piece += 1;
        }
        color += 1;
    }
    keys
}

const PIECE_KEYS: [[[u64; 64]; 6]; 2] = gen_piece_keys();
const CASTLING_KEYS: [u64; 4] = gen_keys(SEED ^ 0x1234_5678_9ABC_DEF0);
const EN_PASSANT_KEYS: [u64; 8] = gen_keys(SEED ^ 0x0F0F_0F0F_0F0F_0F0F);
const PROMOTED_KEYS: [u64; 64] = gen_keys(SEED ^ 0x5555_AAAA_5555_AAAA);
const POCKET_KEYS: [[[u64; MAX_POCKET + 1]; 5]; 2] = gen_pocket_keys();
const BLACK_TO_MOVE_KEY: u64 = next_key(SEED ^ 0xFFFF_0000_FFFF_0000);
const CRAZYHOUSE_KEY: u64 = next_key(SEED ^ 0x00FF_00FF_00FF_00FF);

/// Computes the Zobrist hash of a position from scratch.
pub fn hash_position(position: &Position) -> u64 {
    let mut hash = 0u64;

    for color in Color::ALL {
        for piece in Piece::ALL {
            for sq in position.pieces_of(piece, color) {
                hash ^= PIECE_KEYS[color.index()][piece.index()][sq.index() as usize];
            }
        }
    }

    if position.side_to_move == Color::Black {
        hash ^= BLACK_TO_MOVE_KEY;
    }

    let castling = position.castling.raw();
    for (bit, key) in CASTLING_KEYS.iter().enumerate() {
        if castling & (1 << bit) != 0 {
            hash ^= *key;
        }
    }

    if let Some(ep) = position.en_passant {
        hash ^= EN_PASSANT_KEYS[ep.file().index() as usize];
    }

    for sq in position.promoted {
        hash ^= PROMOTED_KEYS[sq.index() as usize];
    }

    if position.variant.is_droppable() {
        hash ^= CRAZYHOUSE_KEY;
        for color in Color::ALL {
            for (piece, count) in position.pockets[color.index()].iter() {
                let count = (count as usize).min(MAX_POCKET);
                hash ^= POCKET_KEYS[color.index()][piece.index()][count];
            }
        }
    }

    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Variant;
    use talon_core::{FenParser, Move, MoveFlag, Square};

    #[test]
    fn keys_are_distinct() {
        // Spot check: no duplicate among the per-square pawn keys.
        let mut seen = std::collections::HashSet::new();
        for sq in 0..64 {
            assert!(seen.insert(PIECE_KEYS[0][0][sq]));
        }
        assert!(!seen.contains(&BLACK_TO_MOVE_KEY));
    }

    #[test]
    fn hash_is_deterministic() {
        let a = Position::startpos();
        let b = Position::startpos();
        assert_eq!(hash_position(&a), hash_position(&b));
    }

    #[test]
    fn side_to_move_changes_hash() {
        let white = Position::startpos();
        let black =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1")
                .unwrap();
        assert_ne!(hash_position(&white), hash_position(&black));
    }

    #[test]
    fn en_passant_changes_hash() {
        let without =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1")
                .unwrap();
        let with =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1")
                .unwrap();
        assert_ne!(hash_position(&without), hash_position(&with));
    }

    #[test]
    fn variant_changes_hash() {
        let standard = Position::startpos();
        let zh = Position::from_fen_variant(FenParser::STARTPOS_CRAZYHOUSE, Variant::Crazyhouse)
            .unwrap();
        assert_ne!(hash_position(&standard), hash_position(&zh));
    }

    #[test]
    fn same_board_different_route_same_hash() {
        // Transposition: 1.Nf3 Nf6 2.Ng1 Ng8 returns to the start layout
        // but with clocks advanced; the hash ignores clocks.
        let mut pos = Position::startpos();
        pos.apply_move(Move::new(Square::G1, Square::from_algebraic("f3").unwrap(), MoveFlag::Normal));
        pos.apply_move(Move::new(Square::G8, Square::from_algebraic("f6").unwrap(), MoveFlag::Normal));
        pos.apply_move(Move::new(Square::from_algebraic("f3").unwrap(), Square::G1, MoveFlag::Normal));
        pos.apply_move(Move::new(Square::from_algebraic("f6").unwrap(), Square::G8, MoveFlag::Normal));
        assert_eq!(hash_position(&pos), hash_position(&Position::startpos()));
    }
}
