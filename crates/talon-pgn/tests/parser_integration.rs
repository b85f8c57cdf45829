//! End-to-end parser tests over file-backed input.

use std::io::{BufReader, Cursor, Write};

use talon_core::{Color, Piece};
use talon_engine::Variant;
use talon_pgn::{
    CancelToken, CollectingListener, ParseControl, ParsedGame, PgnErrorKind, PgnListener,
    PgnParseError, PgnParserError, StreamingPgnParser,
};

const GOOD_GAME: &str = "[Event \"Good\"]\n\n1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 1-0\n\n";
const BAD_GAME: &str = "[Event \"Bad\"]\n\n1. e4 e5 2. Qxf8 Nc6 0-1\n\n";

fn parse_file(content: &str) -> (talon_pgn::ParseSummary, CollectingListener) {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    let reader = BufReader::new(file.reopen().unwrap());

    let mut listener = CollectingListener::new();
    let summary = StreamingPgnParser::new(reader).parse(&mut listener).unwrap();
    (summary, listener)
}

#[test]
fn resynchronizes_after_a_bad_game() {
    // Three games, the middle one containing an illegal move: the other
    // two still come through, with one error reported in between.
    let input = format!("{GOOD_GAME}{BAD_GAME}{GOOD_GAME}");
    let (summary, listener) = parse_file(&input);

    assert_eq!(summary.games_parsed, 2);
    assert_eq!(summary.errors, 1);
    assert_eq!(listener.games.len(), 2);
    assert_eq!(listener.errors.len(), 1);
    assert_eq!(listener.errors[0].kind, PgnErrorKind::IllegalMove);
    assert_eq!(listener.errors[0].context, "Qxf8");
    assert!(listener
        .games
        .iter()
        .all(|g| g.tag("Event") == Some("Good")));
}

#[test]
fn truncates_at_the_character_cap() {
    let mut input = String::new();
    for _ in 0..10 {
        input.push_str(GOOD_GAME);
    }

    let mut listener = CollectingListener::new();
    // Cap after roughly three games.
    let summary = StreamingPgnParser::new(Cursor::new(input))
        .max_chars(GOOD_GAME.len() as u64 * 3 + 10)
        .parse(&mut listener)
        .unwrap();

    assert!(summary.truncated);
    assert_eq!(summary.games_parsed, 3);
    assert!(summary.lines_read < 10 * 5);
}

#[test]
fn untruncated_input_is_not_flagged() {
    let (summary, _) = parse_file(GOOD_GAME);
    assert!(!summary.truncated);
}

#[test]
fn strict_mode_halts_on_first_bad_move() {
    let input = format!("{BAD_GAME}{GOOD_GAME}");
    let mut listener = CollectingListener::new();
    let result = StreamingPgnParser::new(Cursor::new(input))
        .strict(true)
        .parse(&mut listener);

    match result {
        Err(PgnParseError::Halted(PgnParserError { kind, context, .. })) => {
            assert_eq!(kind, PgnErrorKind::IllegalMove);
            assert_eq!(context, "Qxf8");
        }
        other => panic!("expected Halted, got {other:?}"),
    }
    assert!(listener.games.is_empty());
}

#[test]
fn progress_fires_at_the_configured_cadence() {
    let mut input = String::new();
    for _ in 0..5 {
        input.push_str(GOOD_GAME);
    }

    let mut listener = CollectingListener::new();
    let summary = StreamingPgnParser::new(Cursor::new(input))
        .progress_every(2)
        .parse(&mut listener)
        .unwrap();

    assert_eq!(summary.games_parsed, 5);
    let counts: Vec<u64> = listener.progress.iter().map(|p| p.games_parsed).collect();
    assert_eq!(counts, vec![2, 4]);
}

#[test]
fn progress_can_be_disabled() {
    let mut input = String::new();
    for _ in 0..30 {
        input.push_str(GOOD_GAME);
    }

    let mut listener = CollectingListener::new();
    StreamingPgnParser::new(Cursor::new(input))
        .progress_every(0)
        .parse(&mut listener)
        .unwrap();
    assert!(listener.progress.is_empty());
}

#[test]
fn cancellation_between_games() {
    struct CancelAfterFirst {
        token: CancelToken,
        games: usize,
    }
    impl PgnListener for CancelAfterFirst {
        fn on_game(&mut self, _game: ParsedGame) -> ParseControl {
            self.games += 1;
            self.token.cancel();
            ParseControl::Continue
        }
    }

    let mut input = String::new();
    for _ in 0..10 {
        input.push_str(GOOD_GAME);
    }

    let token = CancelToken::new();
    let mut listener = CancelAfterFirst {
        token: token.clone(),
        games: 0,
    };
    let summary = StreamingPgnParser::new(Cursor::new(input))
        .cancel_token(token)
        .parse(&mut listener)
        .unwrap();

    // Cancellation is observed between games: exactly the game in flight
    // was finished.
    assert_eq!(listener.games, 1);
    assert_eq!(summary.games_parsed, 1);
}

#[test]
fn crazyhouse_pgn_replays_pocket_transfers() {
    let input = "[Event \"Zh\"]\n[Variant \"Crazyhouse\"]\n\n\
                 1. e4 d5 2. exd5 Qxd5 3. Nc3 Qd8 4. P@e4 P@d4 *\n";
    let (summary, listener) = parse_file(input);

    assert_eq!(summary.games_parsed, 1);
    assert_eq!(summary.errors, 0);

    let parsed = &listener.games[0];
    assert_eq!(parsed.variant, Variant::Crazyhouse);
    // Each side pocketed a pawn through the exchange and dropped it back.
    let position = parsed.game.position();
    assert_eq!(position.pocket_count(Color::White, Piece::Pawn), 0);
    assert_eq!(position.pocket_count(Color::Black, Piece::Pawn), 0);
    assert_eq!(position.occupied().count(), 32);
}

#[test]
fn multiple_games_keep_input_order() {
    let input = "[Round \"1\"]\n\n1. e4 *\n\n[Round \"2\"]\n\n1. d4 *\n\n[Round \"3\"]\n\n1. c4 *\n";
    let (summary, listener) = parse_file(input);

    assert_eq!(summary.games_parsed, 3);
    let rounds: Vec<_> = listener
        .games
        .iter()
        .map(|g| g.tag("Round").unwrap().to_string())
        .collect();
    assert_eq!(rounds, vec!["1", "2", "3"]);
    assert!(listener.games[0].end_line < listener.games[1].start_line);
}

#[test]
fn line_numbers_are_tracked() {
    let input = format!("{GOOD_GAME}{BAD_GAME}");
    let (_, listener) = parse_file(&input);

    assert_eq!(listener.games[0].start_line, 1);
    assert_eq!(listener.games[0].end_line, 3);
    // The bad game starts on line 5 and fails on its move line.
    assert_eq!(listener.errors[0].line, 7);
}
