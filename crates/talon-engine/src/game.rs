//! Game state management on top of the position and move generator.
//!
//! A [`Game`] owns the current position, the move history with SAN, and the
//! hash trail used for repetition detection. Terminal states are detected
//! after every move.

use talon_core::{Color, FenError, Move, Piece};
use thiserror::Error;

use crate::movegen::{generate_moves, is_king_attacked, PriorityMoveList};
use crate::san::{move_to_san, san_to_move, SanError};
use crate::{Position, Variant};

/// Why a move could not be played.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error(transparent)]
    San(#[from] SanError),

    #[error("move {0} is not legal in the current position")]
    IllegalMove(Move),

    #[error("the game is over")]
    GameOver,
}

/// The status of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Checkmate { winner: Color },
    Stalemate,
    FiftyMoveDraw,
    ThreefoldRepetition,
    InsufficientMaterial,
}

impl GameStatus {
    /// Returns true if the game has ended.
    pub fn is_over(self) -> bool {
        self != GameStatus::InProgress
    }

    /// Returns the PGN result string for this status, `*` while in progress.
    pub fn result_token(self) -> &'static str {
        match self {
            GameStatus::InProgress => "*",
            GameStatus::Checkmate { winner: Color::White } => "1-0",
            GameStatus::Checkmate { winner: Color::Black } => "0-1",
            _ => "1/2-1/2",
        }
    }
}

/// One played ply with its SAN rendering.
#[derive(Debug, Clone)]
pub struct GameMove {
    pub mov: Move,
    pub san: String,
}

/// A game in progress: position, history, and termination tracking.
#[derive(Debug, Clone)]
pub struct Game {
    position: Position,
    history: Vec<GameMove>,
    /// Zobrist hashes of every position seen, including the initial one.
    hashes: Vec<u64>,
    status: GameStatus,
}

impl Game {
    /// Starts a standard game from the initial position.
    pub fn new() -> Self {
        Self::from_position(Position::startpos())
    }

    /// Starts a game of the given variant from its initial position.
    pub fn new_variant(variant: Variant) -> Self {
        Self::from_position(variant.initial_position())
    }

    /// Starts a game from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        Ok(Self::from_position(Position::from_fen(fen)?))
    }

    /// Starts a game from an arbitrary position.
    pub fn from_position(mut position: Position) -> Self {
        let hash = position.refresh_hash();
        let mut game = Game {
            position,
            history: Vec::new(),
            hashes: vec![hash],
            status: GameStatus::InProgress,
        };
        game.update_status();
        game
    }

    /// The current position.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// The active variant.
    pub fn variant(&self) -> Variant {
        self.position.variant
    }

    /// The moves played so far.
    pub fn history(&self) -> &[GameMove] {
        &self.history
    }

    /// The current game status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Legal moves in the current position. Empty once the game is over.
    pub fn legal_moves(&self) -> PriorityMoveList {
        if self.status.is_over() {
            return PriorityMoveList::new();
        }
        generate_moves(&self.position)
    }

    /// Plays a move, which must be legal in the current position.
    pub fn play(&mut self, m: Move) -> Result<(), GameError> {
        if self.status.is_over() {
            return Err(GameError::GameOver);
        }
        if !generate_moves(&self.position).contains(m) {
            return Err(GameError::IllegalMove(m));
        }

        let san = move_to_san(&self.position, m);
        self.position.apply_move(m);
        self.hashes.push(self.position.refresh_hash());
        self.history.push(GameMove { mov: m, san });
        self.update_status();
        Ok(())
    }

    /// Parses and plays a SAN token. Returns the resolved move.
    pub fn play_san(&mut self, san: &str) -> Result<Move, GameError> {
        if self.status.is_over() {
            return Err(GameError::GameOver);
        }
        let m = san_to_move(&self.position, san)?;
        self.play(m)?;
        Ok(m)
    }

    /// Number of times the current position has occurred.
    pub fn repetition_count(&self) -> usize {
        let current = match self.hashes.last() {
            Some(&h) => h,
            None => return 0,
        };
        self.hashes.iter().filter(|&&h| h == current).count()
    }

    fn update_status(&mut self) {
        if generate_moves(&self.position).is_empty() {
            self.status = if is_king_attacked(&self.position, self.position.side_to_move) {
                GameStatus::Checkmate {
                    winner: self.position.side_to_move.opposite(),
                }
            } else {
                GameStatus::Stalemate
            };
            return;
        }

        if self.position.halfmove_clock >= 100 {
            self.status = GameStatus::FiftyMoveDraw;
            return;
        }

        if self.repetition_count() >= 3 {
            self.status = GameStatus::ThreefoldRepetition;
            return;
        }

        // Pocketed material can always come back in droppable variants, so
        // the material draw only applies to standard chess.
        if !self.variant().is_droppable() && is_insufficient_material(&self.position) {
            self.status = GameStatus::InsufficientMaterial;
            return;
        }

        self.status = GameStatus::InProgress;
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

/// Neither side can possibly deliver mate: bare kings, a lone minor piece,
/// or same-colored lone bishops.
fn is_insufficient_material(position: &Position) -> bool {
    let heavy = position.pieces[Piece::Pawn.index()]
        | position.pieces[Piece::Rook.index()]
        | position.pieces[Piece::Queen.index()];
    if heavy.is_not_empty() {
        return false;
    }

    let knights = position.pieces[Piece::Knight.index()];
    let bishops = position.pieces[Piece::Bishop.index()];
    let minors = (knights | bishops).count();

    match minors {
        0 | 1 => true,
        2 => {
            // Two bishops on the same square color cannot mate, even on the
            // same side. Any knight pair or opposite-colored bishops can.
            if knights.is_not_empty() {
                return false;
            }
            let on_light = (bishops & crate::Bitboard::LIGHT_SQUARES).count();
            on_light == 0 || on_light == 2
        }
        _ => false,
    }
}
