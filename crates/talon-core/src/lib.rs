//! Core types for the talon chess library.
//!
//! This crate provides the fundamental types shared by the engine and the
//! PGN parser:
//! - [`Piece`] and [`Color`] for piece representation
//! - [`Square`], [`File`], and [`Rank`] for board coordinates
//! - [`Move`] for move representation, including variant drop moves
//! - FEN parsing and serialization, including crazyhouse pocket segments

mod color;
mod fen;
mod mov;
mod piece;
mod square;

pub use color::Color;
pub use fen::{FenError, FenParser};
pub use mov::{Move, MoveFlag};
pub use piece::Piece;
pub use square::{File, Rank, Square};
