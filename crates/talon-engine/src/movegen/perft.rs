//! Perft (performance test) move path enumeration.
//!
//! Counts leaf nodes of the legal move tree to a fixed depth. The counts
//! for the standard positions are well known, which makes perft the
//! canonical correctness check for a move generator.

use talon_core::Move;

use crate::movegen::{generate_moves, make_move};
use crate::Position;

/// Counts leaf nodes at the given depth.
pub fn perft(position: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = generate_moves(position);
    if depth == 1 {
        return moves.len() as u64;
    }

    moves
        .into_iter()
        .map(|m| perft(&make_move(position, m), depth - 1))
        .sum()
}

/// Returns the per-move breakdown of leaf counts at the given depth.
/// Useful for diffing against another generator when a total disagrees.
pub fn perft_divide(position: &Position, depth: u32) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }

    generate_moves(position)
        .into_iter()
        .map(|m| {
            let count = perft(&make_move(position, m), depth - 1);
            (m, count)
        })
        .collect()
}
