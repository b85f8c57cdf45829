//! Precomputed attack tables.
//!
//! Leaper attacks (knight, king, pawn) are straight table lookups. Sliding
//! attacks use occupancy-aware ray scans: take the full ray from the square,
//! find the first blocker with a bit scan, and mask off everything behind it.
//! All tables are built at compile time.

use talon_core::{Color, Square};

use crate::Bitboard;

/// Builds a leaper attack table from (file, rank) deltas.
const fn leaper_table<const N: usize>(deltas: &[(i8, i8); N]) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    let mut sq = 0;
    while sq < 64 {
        let file = (sq % 8) as i8;
        let rank = (sq / 8) as i8;
        let mut bits = 0u64;
        let mut i = 0;
        while i < N {
            let f = file + deltas[i].0;
            let r = rank + deltas[i].1;
            if f >= 0 && f < 8 && r >= 0 && r < 8 {
                bits |= 1u64 << (r * 8 + f);
            }
            i += 1;
        }
        table[sq] = Bitboard(bits);
        sq += 1;
    }
    table
}

/// Builds a ray table for one direction: all squares strictly beyond the
/// origin, stepping (file, rank) until the board edge.
const fn ray_table(df: i8, dr: i8) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    let mut sq = 0;
    while sq < 64 {
        let mut bits = 0u64;
        let mut f = (sq % 8) as i8 + df;
        let mut r = (sq / 8) as i8 + dr;
        while f >= 0 && f < 8 && r >= 0 && r < 8 {
            bits |= 1u64 << (r * 8 + f);
            f += df;
            r += dr;
        }
        table[sq] = Bitboard(bits);
        sq += 1;
    }
    table
}

const KNIGHT_TABLE: [Bitboard; 64] = leaper_table(&[
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
]);

const KING_TABLE: [Bitboard; 64] = leaper_table(&[
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
]);

const WHITE_PAWN_TABLE: [Bitboard; 64] = leaper_table(&[(-1, 1), (1, 1)]);
const BLACK_PAWN_TABLE: [Bitboard; 64] = leaper_table(&[(-1, -1), (1, -1)]);

// Direction indices into RAYS. The first four step toward higher square
// indices (first blocker = lsb), the last four toward lower (msb).
const NORTH: usize = 0;
const EAST: usize = 1;
const NORTH_EAST: usize = 2;
const NORTH_WEST: usize = 3;
const SOUTH: usize = 4;
const WEST: usize = 5;
const SOUTH_EAST: usize = 6;
const SOUTH_WEST: usize = 7;

const RAYS: [[Bitboard; 64]; 8] = [
    ray_table(0, 1),
    ray_table(1, 0),
    ray_table(1, 1),
    ray_table(-1, 1),
    ray_table(0, -1),
    ray_table(-1, 0),
    ray_table(1, -1),
    ray_table(-1, -1),
];

/// Returns squares a knight attacks from the given square.
#[inline]
pub fn knight_attacks(sq: Square) -> Bitboard {
    KNIGHT_TABLE[sq.index() as usize]
}

/// Returns squares a king attacks from the given square.
#[inline]
pub fn king_attacks(sq: Square) -> Bitboard {
    KING_TABLE[sq.index() as usize]
}

/// Returns squares a pawn of the given color attacks from the given square.
#[inline]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    match color {
        Color::White => WHITE_PAWN_TABLE[sq.index() as usize],
        Color::Black => BLACK_PAWN_TABLE[sq.index() as usize],
    }
}

#[inline]
fn ray_attacks(sq: Square, occupied: Bitboard, dir: usize) -> Bitboard {
    let ray = RAYS[dir][sq.index() as usize];
    let blockers = ray & occupied;
    let stop = if dir < 4 { blockers.lsb() } else { blockers.msb() };
    match stop {
        // The blocked square itself stays attackable; only what lies
        // beyond it is masked off.
        Some(b) => ray ^ RAYS[dir][b.index() as usize],
        None => ray,
    }
}

/// Returns squares a rook attacks given the occupancy.
pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    ray_attacks(sq, occupied, NORTH)
        | ray_attacks(sq, occupied, SOUTH)
        | ray_attacks(sq, occupied, EAST)
        | ray_attacks(sq, occupied, WEST)
}

/// Returns squares a bishop attacks given the occupancy.
pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    ray_attacks(sq, occupied, NORTH_EAST)
        | ray_attacks(sq, occupied, NORTH_WEST)
        | ray_attacks(sq, occupied, SOUTH_EAST)
        | ray_attacks(sq, occupied, SOUTH_WEST)
}

/// Returns squares a queen attacks given the occupancy.
pub fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    rook_attacks(sq, occupied) | bishop_attacks(sq, occupied)
}
