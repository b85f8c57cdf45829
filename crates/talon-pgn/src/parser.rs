//! Streaming PGN parser.
//!
//! The parser walks the input line by line through a small state machine
//! (awaiting header, reading headers, awaiting move text, reading move
//! text) and replays each game's SAN against a [`Game`], so every emitted
//! [`ParsedGame`] carries a verified move history and final position.
//!
//! It never loads the whole input: games are handed to the listener as they
//! complete, recoverable errors are streamed, and in lenient mode a broken
//! game is abandoned and parsing resynchronizes at the next header line.

use std::io::BufRead;

use tracing::{debug, warn};

use talon_engine::{Game, GameError, Position, SanError, Variant};

use crate::cancel::CancelToken;
use crate::error::{PgnErrorKind, PgnParseError, PgnParserError};
use crate::listener::{ParseControl, ParsedGame, PgnListener, PgnProgress};

/// Default input cap: one mebibyte of characters.
pub const DEFAULT_MAX_CHARS: u64 = 1_048_576;

/// Default progress cadence, in completed games.
pub const DEFAULT_PROGRESS_EVERY: u64 = 20;

/// Totals for a completed (or stopped) parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseSummary {
    pub games_parsed: u64,
    pub errors: u64,
    /// True if the input exceeded the character cap and the tail was not
    /// parsed.
    pub truncated: bool,
    pub lines_read: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    /// Between games, waiting for a `[` header line.
    AwaitingHeader,
    ReadingHeaders,
    /// Headers done (blank line seen), move text not started.
    AwaitingMoveText,
    ReadingMoveText,
    /// A game was abandoned; discard input until the next header line.
    Skipping,
}

/// Streaming parser over any buffered reader.
///
/// Configuration is builder-style; [`StreamingPgnParser::parse`] consumes
/// the parser and drives the listener.
pub struct StreamingPgnParser<R> {
    reader: R,
    max_chars: u64,
    strict: bool,
    progress_every: u64,
    pub(crate) cancel: CancelToken,
}

impl<R: BufRead> StreamingPgnParser<R> {
    pub fn new(reader: R) -> Self {
        StreamingPgnParser {
            reader,
            max_chars: DEFAULT_MAX_CHARS,
            strict: false,
            progress_every: DEFAULT_PROGRESS_EVERY,
            cancel: CancelToken::new(),
        }
    }

    /// Caps how many characters of input are parsed.
    pub fn max_chars(mut self, max_chars: u64) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// In strict mode the first recoverable error halts the parse with
    /// [`PgnParseError::Halted`] instead of being streamed.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets the progress cadence in completed games. Zero disables progress
    /// callbacks.
    pub fn progress_every(mut self, progress_every: u64) -> Self {
        self.progress_every = progress_every;
        self
    }

    /// Injects a shared cancellation token. Cancellation is observed
    /// between games.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Parses the input, streaming results to the listener.
    pub fn parse<L: PgnListener + ?Sized>(
        mut self,
        listener: &mut L,
    ) -> Result<ParseSummary, PgnParseError> {
        debug!(
            max_chars = self.max_chars,
            strict = self.strict,
            "starting PGN parse"
        );

        let mut run = ParseRun::new(self.strict, self.progress_every);
        let mut line = String::new();
        let mut chars_read: u64 = 0;

        loop {
            if run.stopped {
                break;
            }
            if self.cancel.is_cancelled() && run.between_games() {
                debug!(games = run.summary.games_parsed, "parse cancelled");
                return Ok(run.summary);
            }

            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                break;
            }

            chars_read += line.chars().count() as u64;
            if chars_read > self.max_chars {
                run.summary.truncated = true;
                warn!(
                    line = run.summary.lines_read + 1,
                    cap = self.max_chars,
                    "input exceeds character cap, truncating"
                );
                break;
            }

            run.summary.lines_read += 1;
            run.process_line(line.trim_end(), listener)?;
        }

        run.finish(listener)?;
        debug!(
            games = run.summary.games_parsed,
            errors = run.summary.errors,
            truncated = run.summary.truncated,
            "PGN parse finished"
        );
        Ok(run.summary)
    }
}

struct ParseRun {
    state: ParserState,
    strict: bool,
    progress_every: u64,
    summary: ParseSummary,
    stopped: bool,

    tags: Vec<(String, String)>,
    game: Option<Game>,
    variant: Variant,
    start_line: u64,
    in_comment: bool,
    variation_depth: u32,
}

impl ParseRun {
    fn new(strict: bool, progress_every: u64) -> Self {
        ParseRun {
            state: ParserState::AwaitingHeader,
            strict,
            progress_every,
            summary: ParseSummary::default(),
            stopped: false,
            tags: Vec::new(),
            game: None,
            variant: Variant::Standard,
            start_line: 0,
            in_comment: false,
            variation_depth: 0,
        }
    }

    fn between_games(&self) -> bool {
        matches!(
            self.state,
            ParserState::AwaitingHeader | ParserState::Skipping
        )
    }

    fn process_line<L: PgnListener + ?Sized>(
        &mut self,
        line: &str,
        listener: &mut L,
    ) -> Result<(), PgnParseError> {
        let line_no = self.summary.lines_read;

        match self.state {
            ParserState::AwaitingHeader | ParserState::Skipping => {
                // Everything that is not a header line is discarded here;
                // this is what makes resynchronization work.
                if line.starts_with('[') {
                    self.begin_game(line_no);
                    self.header_line(line, line_no, listener)?;
                }
            }
            ParserState::ReadingHeaders => {
                if line.trim().is_empty() {
                    self.state = ParserState::AwaitingMoveText;
                } else if line.starts_with('[') {
                    self.header_line(line, line_no, listener)?;
                } else {
                    // Some exporters skip the blank separator line.
                    self.start_move_text(line_no, listener)?;
                    if self.state == ParserState::ReadingMoveText {
                        self.move_text_line(line, line_no, listener)?;
                    }
                }
            }
            ParserState::AwaitingMoveText => {
                if line.trim().is_empty() {
                    // Still waiting.
                } else if line.starts_with('[') {
                    self.emit_error(
                        PgnErrorKind::UnexpectedTermination,
                        "game has no move text",
                        line_no,
                        listener,
                    )?;
                    if !self.stopped {
                        self.begin_game(line_no);
                        self.header_line(line, line_no, listener)?;
                    }
                } else {
                    self.start_move_text(line_no, listener)?;
                    if self.state == ParserState::ReadingMoveText {
                        self.move_text_line(line, line_no, listener)?;
                    }
                }
            }
            ParserState::ReadingMoveText => {
                if line.starts_with('[') && !self.in_comment && self.variation_depth == 0 {
                    self.emit_error(
                        PgnErrorKind::UnexpectedTermination,
                        "game interrupted by a new header",
                        line_no,
                        listener,
                    )?;
                    if !self.stopped {
                        self.begin_game(line_no);
                        self.header_line(line, line_no, listener)?;
                    }
                } else {
                    self.move_text_line(line, line_no, listener)?;
                }
            }
        }

        Ok(())
    }

    fn begin_game(&mut self, line_no: u64) {
        self.tags.clear();
        self.game = None;
        self.variant = Variant::Standard;
        self.start_line = line_no;
        self.in_comment = false;
        self.variation_depth = 0;
        self.state = ParserState::ReadingHeaders;
    }

    fn header_line<L: PgnListener + ?Sized>(
        &mut self,
        line: &str,
        line_no: u64,
        listener: &mut L,
    ) -> Result<(), PgnParseError> {
        match parse_tag_pair(line) {
            Some((name, value)) => {
                self.tags.push((name, value));
                Ok(())
            }
            None => {
                // A bad header line is skipped; the game itself survives.
                self.emit_error(PgnErrorKind::MalformedHeader, line, line_no, listener)
            }
        }
    }

    /// Resolves the `Variant` and `FEN` tags and builds the working game.
    fn start_move_text<L: PgnListener + ?Sized>(
        &mut self,
        line_no: u64,
        listener: &mut L,
    ) -> Result<(), PgnParseError> {
        let variant_tag = self.tag("Variant").map(str::to_string);
        let fen_tag = self.tag("FEN").map(str::to_string);

        let variant = match &variant_tag {
            Some(name) => match Variant::from_name(name) {
                Some(v) => Some(v),
                None => {
                    self.abandon_game(
                        PgnErrorKind::MalformedHeader,
                        &format!("unsupported variant '{name}'"),
                        line_no,
                        listener,
                    )?;
                    return Ok(());
                }
            },
            None => None,
        };

        let game = match (fen_tag, variant) {
            (Some(fen), Some(v)) => match Position::from_fen_variant(&fen, v) {
                Ok(position) => Game::from_position(position),
                Err(e) => {
                    self.abandon_game(
                        PgnErrorKind::MalformedHeader,
                        &format!("bad FEN tag: {e}"),
                        line_no,
                        listener,
                    )?;
                    return Ok(());
                }
            },
            (Some(fen), None) => match Position::from_fen(&fen) {
                Ok(position) => Game::from_position(position),
                Err(e) => {
                    self.abandon_game(
                        PgnErrorKind::MalformedHeader,
                        &format!("bad FEN tag: {e}"),
                        line_no,
                        listener,
                    )?;
                    return Ok(());
                }
            },
            (None, v) => Game::new_variant(v.unwrap_or(Variant::Standard)),
        };

        self.variant = game.variant();
        self.game = Some(game);
        self.state = ParserState::ReadingMoveText;
        Ok(())
    }

    fn move_text_line<L: PgnListener + ?Sized>(
        &mut self,
        line: &str,
        line_no: u64,
        listener: &mut L,
    ) -> Result<(), PgnParseError> {
        let mut token = String::new();

        for c in line.chars() {
            if self.state != ParserState::ReadingMoveText || self.stopped {
                return Ok(());
            }

            if self.in_comment {
                if c == '}' {
                    self.in_comment = false;
                }
                continue;
            }

            match c {
                ';' => {
                    // Rest-of-line comment.
                    self.handle_token(&std::mem::take(&mut token), line_no, listener)?;
                    return Ok(());
                }
                '{' => {
                    self.handle_token(&std::mem::take(&mut token), line_no, listener)?;
                    self.in_comment = true;
                }
                '(' => {
                    self.handle_token(&std::mem::take(&mut token), line_no, listener)?;
                    self.variation_depth += 1;
                }
                ')' => {
                    token.clear();
                    self.variation_depth = self.variation_depth.saturating_sub(1);
                }
                c if c.is_whitespace() => {
                    self.handle_token(&std::mem::take(&mut token), line_no, listener)?;
                }
                _ => token.push(c),
            }
        }

        if self.state == ParserState::ReadingMoveText && !self.stopped {
            self.handle_token(&token, line_no, listener)?;
        }
        Ok(())
    }

    fn handle_token<L: PgnListener + ?Sized>(
        &mut self,
        token: &str,
        line_no: u64,
        listener: &mut L,
    ) -> Result<(), PgnParseError> {
        if token.is_empty() || self.variation_depth > 0 {
            return Ok(());
        }

        // NAGs and bare annotation glyphs carry no moves.
        if token.starts_with('$') || token.chars().all(|c| c == '!' || c == '?') {
            return Ok(());
        }

        if matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*") {
            return self.complete_game(token, line_no, listener);
        }

        let san = strip_move_number(token);
        if san.is_empty() {
            return Ok(());
        }

        self.apply_san(san, line_no, listener)
    }

    fn apply_san<L: PgnListener + ?Sized>(
        &mut self,
        san: &str,
        line_no: u64,
        listener: &mut L,
    ) -> Result<(), PgnParseError> {
        let game = match self.game.as_mut() {
            Some(game) => game,
            None => return Ok(()),
        };

        let kind = match game.play_san(san) {
            Ok(_) => return Ok(()),
            Err(GameError::San(SanError::Ambiguous(_))) => PgnErrorKind::AmbiguousMove,
            Err(_) => PgnErrorKind::IllegalMove,
        };

        self.abandon_game(kind, san, line_no, listener)
    }

    /// Streams the error, drops the working game, and resynchronizes.
    fn abandon_game<L: PgnListener + ?Sized>(
        &mut self,
        kind: PgnErrorKind,
        context: &str,
        line_no: u64,
        listener: &mut L,
    ) -> Result<(), PgnParseError> {
        self.game = None;
        self.state = ParserState::Skipping;
        self.emit_error(kind, context, line_no, listener)
    }

    fn complete_game<L: PgnListener + ?Sized>(
        &mut self,
        result: &str,
        line_no: u64,
        listener: &mut L,
    ) -> Result<(), PgnParseError> {
        let game = match self.game.take() {
            Some(game) => game,
            None => return Ok(()),
        };

        let parsed = ParsedGame {
            tags: std::mem::take(&mut self.tags),
            game,
            variant: self.variant,
            result: result.to_string(),
            start_line: self.start_line,
            end_line: line_no,
        };

        self.summary.games_parsed += 1;
        self.state = ParserState::AwaitingHeader;
        debug!(
            game = self.summary.games_parsed,
            line = line_no,
            result,
            "parsed game"
        );

        if listener.on_game(parsed) == ParseControl::Stop {
            self.stopped = true;
            return Ok(());
        }

        if self.progress_every > 0 && self.summary.games_parsed % self.progress_every == 0 {
            listener.on_progress(PgnProgress {
                games_parsed: self.summary.games_parsed,
                errors: self.summary.errors,
                lines_read: self.summary.lines_read,
            });
        }

        Ok(())
    }

    fn emit_error<L: PgnListener + ?Sized>(
        &mut self,
        kind: PgnErrorKind,
        context: &str,
        line_no: u64,
        listener: &mut L,
    ) -> Result<(), PgnParseError> {
        let error = PgnParserError {
            line: line_no,
            kind,
            context: context.to_string(),
        };
        warn!(%error, "recoverable parse error");
        self.summary.errors += 1;

        if self.strict {
            return Err(PgnParseError::Halted(error));
        }
        if listener.on_error(error) == ParseControl::Stop {
            self.stopped = true;
        }
        Ok(())
    }

    /// EOF (or truncation) with a game still open counts as an error.
    fn finish<L: PgnListener + ?Sized>(
        &mut self,
        listener: &mut L,
    ) -> Result<(), PgnParseError> {
        if self.stopped {
            return Ok(());
        }
        if matches!(
            self.state,
            ParserState::ReadingHeaders
                | ParserState::AwaitingMoveText
                | ParserState::ReadingMoveText
        ) {
            let line_no = self.summary.lines_read;
            self.game = None;
            self.emit_error(
                PgnErrorKind::UnexpectedTermination,
                "end of input inside a game",
                line_no,
                listener,
            )?;
        }
        Ok(())
    }

    fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(tag, _)| tag == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Parses a `[Name "value"]` tag pair, unescaping `\"` and `\\`.
fn parse_tag_pair(line: &str) -> Option<(String, String)> {
    let inner = line.strip_prefix('[')?.trim_end().strip_suffix(']')?;
    let quote = inner.find('"')?;
    let name = inner[..quote].trim();
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }

    let rest = &inner[quote + 1..];
    let mut value = String::new();
    let mut chars = rest.chars();
    let mut closed = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped @ ('"' | '\\')) => value.push(escaped),
                Some(other) => value.push(other),
                None => return None,
            },
            '"' => {
                closed = true;
                break;
            }
            _ => value.push(c),
        }
    }
    if !closed || !chars.as_str().trim().is_empty() {
        return None;
    }

    Some((name.to_string(), value))
}

/// Strips a leading move number (`3.`, `12...`, including glued forms like
/// `1.e4`) from a token. Castling in zero-glyph form (`0-0`) is preserved.
fn strip_move_number(token: &str) -> &str {
    let digits = token.len() - token.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return token;
    }

    let rest = &token[digits..];
    if rest.is_empty() {
        // A bare move number.
        return "";
    }
    if rest.starts_with('.') {
        return rest.trim_start_matches('.');
    }

    // Not a move number ("0-0", stray garbage); leave it to SAN parsing.
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::CollectingListener;
    use std::io::Cursor;

    fn parse_str(input: &str) -> (ParseSummary, CollectingListener) {
        let mut listener = CollectingListener::new();
        let summary = StreamingPgnParser::new(Cursor::new(input))
            .parse(&mut listener)
            .unwrap();
        (summary, listener)
    }

    #[test]
    fn tag_pair_parsing() {
        assert_eq!(
            parse_tag_pair(r#"[Event "Casual Game"]"#),
            Some(("Event".to_string(), "Casual Game".to_string()))
        );
        assert_eq!(
            parse_tag_pair(r#"[Site "He said \"hi\""]"#),
            Some(("Site".to_string(), r#"He said "hi""#.to_string()))
        );
        assert_eq!(parse_tag_pair("[Event \"unterminated]"), None);
        assert_eq!(parse_tag_pair("[no quotes]"), None);
        assert_eq!(parse_tag_pair("not a tag"), None);
    }

    #[test]
    fn move_number_stripping() {
        assert_eq!(strip_move_number("1.e4"), "e4");
        assert_eq!(strip_move_number("12...Nf6"), "Nf6");
        assert_eq!(strip_move_number("3."), "");
        assert_eq!(strip_move_number("7"), "");
        assert_eq!(strip_move_number("e4"), "e4");
        assert_eq!(strip_move_number("0-0"), "0-0");
    }

    #[test]
    fn parses_a_minimal_game() {
        let (summary, listener) = parse_str(
            "[Event \"Test\"]\n[White \"A\"]\n[Black \"B\"]\n\n1. e4 e5 2. Nf3 Nc6 1/2-1/2\n",
        );
        assert_eq!(summary.games_parsed, 1);
        assert_eq!(summary.errors, 0);
        assert!(!summary.truncated);

        let parsed = &listener.games[0];
        assert_eq!(parsed.tag("Event"), Some("Test"));
        assert_eq!(parsed.result, "1/2-1/2");
        assert_eq!(parsed.game.history().len(), 4);
        assert_eq!(parsed.game.history()[0].san, "e4");
        assert_eq!(parsed.start_line, 1);
        assert_eq!(parsed.end_line, 5);
    }

    #[test]
    fn comments_nags_and_variations_are_skipped() {
        let (summary, listener) = parse_str(
            "[Event \"T\"]\n\n1. e4 {king's pawn} e5 $1 2. Nf3 (2. f4 {gambit} exf4) Nc6 *\n",
        );
        assert_eq!(summary.games_parsed, 1);
        assert_eq!(summary.errors, 0);
        assert_eq!(listener.games[0].game.history().len(), 4);
    }

    #[test]
    fn comment_spanning_lines() {
        let (summary, listener) =
            parse_str("[Event \"T\"]\n\n1. e4 {a comment\nspanning lines} e5 *\n");
        assert_eq!(summary.games_parsed, 1);
        assert_eq!(listener.games[0].game.history().len(), 2);
    }

    #[test]
    fn game_without_separator_line() {
        let (summary, _) = parse_str("[Event \"T\"]\n1. e4 e5 *\n");
        assert_eq!(summary.games_parsed, 1);
        assert_eq!(summary.errors, 0);
    }

    #[test]
    fn malformed_header_is_skipped_but_game_survives() {
        let (summary, listener) =
            parse_str("[Event \"T\"]\n[Broken\n\n1. e4 e5 *\n");
        assert_eq!(summary.games_parsed, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(listener.errors[0].kind, PgnErrorKind::MalformedHeader);
    }

    #[test]
    fn illegal_move_abandons_game() {
        let (summary, listener) = parse_str("[Event \"T\"]\n\n1. e4 e4 2. Nf3 *\n");
        assert_eq!(summary.games_parsed, 0);
        assert_eq!(summary.errors, 1);
        assert_eq!(listener.errors[0].kind, PgnErrorKind::IllegalMove);
        assert_eq!(listener.errors[0].context, "e4");
    }

    #[test]
    fn crazyhouse_game_with_drop() {
        let (summary, listener) = parse_str(
            "[Event \"T\"]\n[Variant \"Crazyhouse\"]\n\n1. e4 d5 2. exd5 Qxd5 3. P@e4 1-0\n",
        );
        assert_eq!(summary.games_parsed, 1);
        assert_eq!(summary.errors, 0);
        let parsed = &listener.games[0];
        assert_eq!(parsed.variant, Variant::Crazyhouse);
        assert_eq!(parsed.game.history().len(), 5);
        assert!(parsed.game.history()[4].mov.is_drop());
    }

    #[test]
    fn fen_tag_sets_starting_position() {
        let (summary, listener) = parse_str(
            "[Event \"T\"]\n[FEN \"k7/8/KQ6/8/8/8/8/8 w - - 0 1\"]\n\n1. Qb7# 1-0\n",
        );
        assert_eq!(summary.games_parsed, 1);
        let parsed = &listener.games[0];
        assert!(parsed.result_consistent());
    }

    #[test]
    fn unknown_variant_abandons_game() {
        let (summary, listener) = parse_str(
            "[Event \"T\"]\n[Variant \"Atomic\"]\n\n1. e4 e5 *\n",
        );
        assert_eq!(summary.games_parsed, 0);
        assert_eq!(summary.errors, 1);
        assert_eq!(listener.errors[0].kind, PgnErrorKind::MalformedHeader);
    }

    #[test]
    fn eof_inside_game_is_reported() {
        let (summary, listener) = parse_str("[Event \"T\"]\n\n1. e4 e5\n");
        assert_eq!(summary.games_parsed, 0);
        assert_eq!(summary.errors, 1);
        assert_eq!(
            listener.errors[0].kind,
            PgnErrorKind::UnexpectedTermination
        );
    }

    #[test]
    fn listener_stop_ends_parse_early() {
        struct StopAfterFirst(u64);
        impl PgnListener for StopAfterFirst {
            fn on_game(&mut self, _game: ParsedGame) -> ParseControl {
                self.0 += 1;
                ParseControl::Stop
            }
        }

        let input = "[A \"1\"]\n\n1. e4 *\n\n[A \"2\"]\n\n1. d4 *\n";
        let mut listener = StopAfterFirst(0);
        let summary = StreamingPgnParser::new(Cursor::new(input))
            .parse(&mut listener)
            .unwrap();
        assert_eq!(listener.0, 1);
        assert_eq!(summary.games_parsed, 1);
    }
}
