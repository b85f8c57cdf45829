//! Standard Algebraic Notation.
//!
//! Converts between [`Move`] and SAN text in the context of a position.
//! Drop moves use the `P@e4` / `N@f3` notation common to crazyhouse PGN.
//! Parsing is lenient about capture markers and annotation suffixes
//! (`+`, `#`, `!`, `?`); generation always emits canonical SAN.

use talon_core::{File, Move, MoveFlag, Piece, Rank, Square};
use thiserror::Error;

use crate::movegen::{generate_moves, is_king_attacked, make_move};
use crate::Position;

/// Errors from SAN parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SanError {
    #[error("malformed SAN token '{0}'")]
    Malformed(String),

    #[error("move '{0}' is not legal in this position")]
    Illegal(String),

    #[error("move '{0}' is ambiguous")]
    Ambiguous(String),
}

/// Renders a legal move as SAN, including `+`/`#` suffixes.
pub fn move_to_san(position: &Position, m: Move) -> String {
    let mut san = match m.flag() {
        MoveFlag::CastleKingside => "O-O".to_string(),
        MoveFlag::CastleQueenside => "O-O-O".to_string(),
        flag if flag.is_drop() => {
            let piece = flag.drop_piece().unwrap_or(Piece::Pawn);
            format!("{}@{}", piece.to_letter(), m.to())
        }
        _ => match position.piece_at(m.from()) {
            Some((piece, _)) => board_move_san(position, m, piece),
            // Not a legal move here; fall back to coordinates.
            None => return m.to_coords(),
        },
    };

    let next = make_move(position, m);
    if is_king_attacked(&next, next.side_to_move) {
        if generate_moves(&next).is_empty() {
            san.push('#');
        } else {
            san.push('+');
        }
    }

    san
}

fn board_move_san(position: &Position, m: Move, piece: Piece) -> String {
    let is_capture =
        position.piece_at(m.to()).is_some() || m.flag() == MoveFlag::EnPassant;

    let mut san = String::new();

    if piece == Piece::Pawn {
        if is_capture {
            san.push(m.from().file().to_char());
            san.push('x');
        }
        san.push_str(&m.to().to_algebraic());
        if let Some(promo) = m.flag().promotion_piece() {
            san.push('=');
            san.push(promo.to_letter());
        }
        return san;
    }

    san.push(piece.to_letter());
    san.push_str(&disambiguation(position, m, piece));
    if is_capture {
        san.push('x');
    }
    san.push_str(&m.to().to_algebraic());
    san
}

/// Returns the minimal disambiguation prefix when another piece of the same
/// type can legally reach the same destination.
fn disambiguation(position: &Position, m: Move, piece: Piece) -> String {
    let rivals: Vec<Square> = generate_moves(position)
        .iter()
        .filter(|other| {
            other.to() == m.to()
                && other.from() != m.from()
                && !other.is_drop()
                && !other.flag().is_castling()
                && position.piece_at(other.from()).map(|(p, _)| p) == Some(piece)
        })
        .map(|other| other.from())
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let file_unique = rivals.iter().all(|sq| sq.file() != m.from().file());
    let rank_unique = rivals.iter().all(|sq| sq.rank() != m.from().rank());

    if file_unique {
        m.from().file().to_char().to_string()
    } else if rank_unique {
        m.from().rank().to_char().to_string()
    } else {
        m.from().to_algebraic()
    }
}

/// Parses a SAN token against the position's legal moves.
pub fn san_to_move(position: &Position, san: &str) -> Result<Move, SanError> {
    let stripped = san.trim_end_matches(['+', '#', '!', '?']);
    if stripped.is_empty() {
        return Err(SanError::Malformed(san.to_string()));
    }

    let legal = generate_moves(position);

    // Castling, tolerating the zero-glyph form.
    let normalized = stripped.replace('0', "O");
    if normalized == "O-O" || normalized == "O-O-O" {
        let wanted = if normalized == "O-O" {
            MoveFlag::CastleKingside
        } else {
            MoveFlag::CastleQueenside
        };
        return legal
            .iter()
            .copied()
            .find(|m| m.flag() == wanted)
            .ok_or_else(|| SanError::Illegal(san.to_string()));
    }

    if let Some(at) = stripped.find('@') {
        return parse_drop(&legal, stripped, at, san);
    }

    parse_board_move(position, &legal, stripped, san)
}

fn parse_drop(
    legal: &crate::movegen::PriorityMoveList,
    stripped: &str,
    at: usize,
    original: &str,
) -> Result<Move, SanError> {
    let piece = if at == 0 {
        Piece::Pawn
    } else {
        let c = stripped
            .chars()
            .next()
            .ok_or_else(|| SanError::Malformed(original.to_string()))?;
        Piece::from_letter(c.to_ascii_uppercase())
            .ok_or_else(|| SanError::Malformed(original.to_string()))?
    };

    let to = Square::from_algebraic(&stripped[at + 1..])
        .ok_or_else(|| SanError::Malformed(original.to_string()))?;
    let wanted = Move::drop(piece, to).ok_or_else(|| SanError::Malformed(original.to_string()))?;

    if legal.contains(wanted) {
        Ok(wanted)
    } else {
        Err(SanError::Illegal(original.to_string()))
    }
}

fn parse_board_move(
    position: &Position,
    legal: &crate::movegen::PriorityMoveList,
    stripped: &str,
    original: &str,
) -> Result<Move, SanError> {
    let mut chars: Vec<char> = stripped.chars().collect();

    let promotion = if chars.len() >= 2 && chars[chars.len() - 2] == '=' {
        let promo = Piece::from_letter(chars[chars.len() - 1])
            .filter(|p| !matches!(p, Piece::Pawn | Piece::King))
            .ok_or_else(|| SanError::Malformed(original.to_string()))?;
        chars.truncate(chars.len() - 2);
        Some(promo)
    } else {
        None
    };

    let piece = match chars.first() {
        Some(&c) if c.is_ascii_uppercase() => {
            let p = Piece::from_letter(c).ok_or_else(|| SanError::Malformed(original.to_string()))?;
            chars.remove(0);
            p
        }
        Some(_) => Piece::Pawn,
        None => return Err(SanError::Malformed(original.to_string())),
    };

    if chars.len() < 2 {
        return Err(SanError::Malformed(original.to_string()));
    }
    let dest: String = chars[chars.len() - 2..].iter().collect();
    let to = Square::from_algebraic(&dest)
        .ok_or_else(|| SanError::Malformed(original.to_string()))?;

    let mut from_file: Option<File> = None;
    let mut from_rank: Option<Rank> = None;
    for &c in &chars[..chars.len() - 2] {
        if c == 'x' {
            continue;
        }
        if let Some(f) = File::from_char(c) {
            from_file = Some(f);
        } else if let Some(r) = Rank::from_char(c) {
            from_rank = Some(r);
        } else {
            return Err(SanError::Malformed(original.to_string()));
        }
    }

    let mut matches = legal.iter().copied().filter(|m| {
        if m.is_drop() || m.flag().is_castling() {
            return false;
        }
        if m.to() != to {
            return false;
        }
        if position.piece_at(m.from()).map(|(p, _)| p) != Some(piece) {
            return false;
        }
        if m.flag().promotion_piece() != promotion {
            return false;
        }
        if let Some(f) = from_file {
            if m.from().file() != f {
                return false;
            }
        }
        if let Some(r) = from_rank {
            if m.from().rank() != r {
                return false;
            }
        }
        true
    });

    match (matches.next(), matches.next()) {
        (Some(m), None) => Ok(m),
        (Some(_), Some(_)) => Err(SanError::Ambiguous(original.to_string())),
        (None, _) => Err(SanError::Illegal(original.to_string())),
    }
}
