//! Listener interface for streamed parse results.
//!
//! Callbacks steer the parse by return value: [`ParseControl::Stop`] ends it
//! cleanly after the current callback, no panicking or sentinel errors.

use talon_engine::{Game, GameStatus, Variant};

use crate::error::PgnParserError;

/// What the parser should do after a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseControl {
    Continue,
    Stop,
}

/// Progress snapshot, delivered every `progress_every` completed games.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PgnProgress {
    pub games_parsed: u64,
    pub errors: u64,
    pub lines_read: u64,
}

/// A fully parsed game.
#[derive(Debug, Clone)]
pub struct ParsedGame {
    /// Tag pairs in source order; unknown tags are retained verbatim.
    pub tags: Vec<(String, String)>,
    /// The replayed game: move history, SAN, and the final position.
    pub game: Game,
    pub variant: Variant,
    /// The result token that terminated the game text.
    pub result: String,
    /// Source lines the game spanned (1-based, inclusive).
    pub start_line: u64,
    pub end_line: u64,
}

impl ParsedGame {
    /// Looks up a tag value by name (case-sensitive, as PGN tags are).
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(tag, _)| tag == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns true if the recorded result matches the final position
    /// (e.g. a `1-0` game that really ends in mate by White).
    pub fn result_consistent(&self) -> bool {
        match self.game.status() {
            GameStatus::InProgress => true,
            status => status.result_token() == self.result,
        }
    }
}

/// Receives parse results as they are produced.
pub trait PgnListener {
    /// Called for every successfully parsed game.
    fn on_game(&mut self, game: ParsedGame) -> ParseControl;

    /// Called for every recoverable error. The default keeps going.
    fn on_error(&mut self, error: PgnParserError) -> ParseControl {
        let _ = error;
        ParseControl::Continue
    }

    /// Called at the configured progress cadence. The default ignores it.
    fn on_progress(&mut self, progress: PgnProgress) {
        let _ = progress;
    }
}

/// A listener that stores everything it receives. Handy for tests and for
/// callers that want the whole file at once.
#[derive(Debug, Default)]
pub struct CollectingListener {
    pub games: Vec<ParsedGame>,
    pub errors: Vec<PgnParserError>,
    pub progress: Vec<PgnProgress>,
}

impl CollectingListener {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PgnListener for CollectingListener {
    fn on_game(&mut self, game: ParsedGame) -> ParseControl {
        self.games.push(game);
        ParseControl::Continue
    }

    fn on_error(&mut self, error: PgnParserError) -> ParseControl {
        self.errors.push(error);
        ParseControl::Continue
    }

    fn on_progress(&mut self, progress: PgnProgress) {
        self.progress.push(progress);
    }
}
