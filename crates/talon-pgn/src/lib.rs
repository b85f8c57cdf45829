//! Streaming, error-tolerant PGN parsing.
//!
//! Feed any `BufRead` to [`StreamingPgnParser`] and receive games through a
//! [`PgnListener`] as they complete. Bad games are reported and skipped in
//! lenient mode (the default); strict mode halts on the first error. For
//! background parsing, [`spawn_parse`] forwards the same stream over an
//! `mpsc` channel with cooperative cancellation.
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//! use talon_pgn::{CollectingListener, StreamingPgnParser};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = BufReader::new(File::open("games.pgn")?);
//! let mut listener = CollectingListener::new();
//! let summary = StreamingPgnParser::new(file).parse(&mut listener)?;
//! println!("{} games, {} errors", summary.games_parsed, summary.errors);
//! # Ok(())
//! # }
//! ```

mod cancel;
mod channel;
mod error;
mod listener;
mod parser;

pub use cancel::CancelToken;
pub use channel::{spawn_parse, PgnEvent};
pub use error::{PgnErrorKind, PgnParseError, PgnParserError};
pub use listener::{CollectingListener, ParseControl, ParsedGame, PgnListener, PgnProgress};
pub use parser::{
    ParseSummary, StreamingPgnParser, DEFAULT_MAX_CHARS, DEFAULT_PROGRESS_EVERY,
};
