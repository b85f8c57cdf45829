//! Bitboard rules engine: position state, legal move generation, SAN, and
//! the crazyhouse drop overlay.
//!
//! The crate is layered bottom-up: [`Bitboard`] primitives, [`Position`]
//! state with in-place move application, the two-phase move generator in
//! [`movegen`], and [`Game`] tying history and termination detection
//! together. Variant behavior is selected by the [`Variant`] value carried
//! on each position rather than by separate engine types.

mod bitboard;
pub mod game;
pub mod movegen;
mod pocket;
mod position;
pub mod san;
mod variant;
mod zobrist;

pub use bitboard::{Bitboard, BitboardIter};
pub use game::{Game, GameError, GameMove, GameStatus};
pub use movegen::{
    generate_moves, generate_pseudo_legal, is_king_attacked, is_square_attacked, make_move,
    PriorityMoveList,
};
pub use pocket::Pocket;
pub use position::{CastlingRights, Position};
pub use san::{move_to_san, san_to_move, SanError};
pub use variant::Variant;
