//! Parser error types.
//!
//! Recoverable conditions ([`PgnParserError`]) are streamed to the listener
//! and never abort a lenient parse; fatal conditions ([`PgnParseError`])
//! come back as the `Err` of `parse()`.

use thiserror::Error;

/// Classification of a recoverable parse error.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PgnErrorKind {
    #[error("malformed header")]
    MalformedHeader,

    #[error("illegal move")]
    IllegalMove,

    #[error("ambiguous move")]
    AmbiguousMove,

    #[error("unexpected termination")]
    UnexpectedTermination,
}

/// A recoverable error tied to a source line.
///
/// In lenient mode the game it occurred in is abandoned and parsing resumes
/// at the next game; in strict mode the first such error halts the parse.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line}: {kind}: {context}")]
pub struct PgnParserError {
    /// 1-based line number in the source.
    pub line: u64,
    pub kind: PgnErrorKind,
    /// The offending token or header text.
    pub context: String,
}

/// A fatal parse failure.
#[derive(Debug, Error)]
pub enum PgnParseError {
    #[error("i/o error while reading PGN")]
    Io(#[from] std::io::Error),

    #[error("parse halted: {0}")]
    Halted(PgnParserError),
}
