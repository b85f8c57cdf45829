//! Worker-thread adapter.
//!
//! [`spawn_parse`] runs a parser on a background thread and forwards
//! everything the listener would see over an `mpsc` channel, ending with a
//! single [`PgnEvent::Done`]. Dropping the receiver stops the worker at the
//! next callback.

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::{PgnParseError, PgnParserError};
use crate::listener::{ParseControl, ParsedGame, PgnListener, PgnProgress};
use crate::parser::{ParseSummary, StreamingPgnParser};

/// An event produced by a background parse.
#[derive(Debug)]
pub enum PgnEvent {
    Game(Box<ParsedGame>),
    Error(PgnParserError),
    Progress(PgnProgress),
    /// Always the last event on the channel.
    Done(Result<ParseSummary, PgnParseError>),
}

struct ChannelListener {
    tx: Sender<PgnEvent>,
}

impl ChannelListener {
    fn forward(&self, event: PgnEvent) -> ParseControl {
        // A closed channel means the consumer is gone; stop parsing.
        match self.tx.send(event) {
            Ok(()) => ParseControl::Continue,
            Err(_) => ParseControl::Stop,
        }
    }
}

impl PgnListener for ChannelListener {
    fn on_game(&mut self, game: ParsedGame) -> ParseControl {
        self.forward(PgnEvent::Game(Box::new(game)))
    }

    fn on_error(&mut self, error: PgnParserError) -> ParseControl {
        self.forward(PgnEvent::Error(error))
    }

    fn on_progress(&mut self, progress: PgnProgress) {
        let _ = self.tx.send(PgnEvent::Progress(progress));
    }
}

/// Runs the parser on a spawned thread.
///
/// Returns the cancellation token shared with the parser and the receiving
/// end of the event channel.
pub fn spawn_parse<R>(parser: StreamingPgnParser<R>) -> (CancelToken, Receiver<PgnEvent>)
where
    R: BufRead + Send + 'static,
{
    let token = parser.cancel.clone();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        debug!("background PGN parse starting");
        let mut listener = ChannelListener { tx: tx.clone() };
        let result = parser.parse(&mut listener);
        let _ = tx.send(PgnEvent::Done(result));
    });

    (token, rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn events_arrive_in_order_and_end_with_done() {
        let input = "[A \"1\"]\n\n1. e4 *\n\n[A \"2\"]\n\n1. bogus *\n";
        let (_token, rx) = spawn_parse(StreamingPgnParser::new(Cursor::new(input)));

        let events: Vec<PgnEvent> = rx.iter().collect();
        assert!(matches!(events[0], PgnEvent::Game(_)));
        assert!(matches!(events[1], PgnEvent::Error(_)));
        match &events[2] {
            PgnEvent::Done(Ok(summary)) => {
                assert_eq!(summary.games_parsed, 1);
                assert_eq!(summary.errors, 1);
            }
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[test]
    fn cancellation_stops_between_games() {
        let mut input = String::new();
        for i in 0..50 {
            input.push_str(&format!("[Round \"{i}\"]\n\n1. e4 e5 *\n\n"));
        }

        let (token, rx) = spawn_parse(StreamingPgnParser::new(Cursor::new(input)));
        token.cancel();

        let mut games = 0;
        let mut done = None;
        for event in rx.iter() {
            match event {
                PgnEvent::Game(_) => games += 1,
                PgnEvent::Done(result) => done = Some(result),
                _ => {}
            }
        }

        let summary = done.expect("Done event").unwrap();
        // Cancelled before reading everything; the flag raced the worker,
        // but whatever completed was delivered in order.
        assert!(summary.games_parsed < 50 || games == 50);
        assert_eq!(summary.games_parsed, games);
    }
}
