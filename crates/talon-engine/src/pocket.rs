//! Drop pockets for crazyhouse-style variants.

use talon_core::{Color, Piece};

/// Pieces a player holds in reserve for dropping.
///
/// Kings are never pocketed; count queries for kings always return zero and
/// king adds are rejected by debug assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pocket {
    counts: [u8; 5],
}

impl Pocket {
    /// Creates an empty pocket.
    pub const fn new() -> Self {
        Pocket { counts: [0; 5] }
    }

    /// Returns how many of the given piece type are held.
    #[inline]
    pub const fn count(&self, piece: Piece) -> u8 {
        match piece {
            Piece::King => 0,
            _ => self.counts[piece.index()],
        }
    }

    /// Adds one piece of the given type.
    pub fn add(&mut self, piece: Piece) {
        debug_assert!(!matches!(piece, Piece::King), "kings cannot be pocketed");
        if piece.index() < 5 {
            self.counts[piece.index()] += 1;
        }
    }

    /// Removes one piece of the given type. Returns false if none was held.
    pub fn remove(&mut self, piece: Piece) -> bool {
        if piece.index() < 5 && self.counts[piece.index()] > 0 {
            self.counts[piece.index()] -= 1;
            true
        } else {
            false
        }
    }

    /// Returns true if the pocket holds no pieces.
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Total number of held pieces.
    pub fn total(&self) -> u8 {
        self.counts.iter().sum()
    }

    /// Iterates over `(piece, count)` pairs with non-zero counts.
    pub fn iter(&self) -> impl Iterator<Item = (Piece, u8)> + '_ {
        Piece::DROPPABLE
            .iter()
            .map(|&p| (p, self.counts[p.index()]))
            .filter(|&(_, c)| c > 0)
    }

    /// Serializes pocket contents as FEN letters for the given color
    /// (uppercase for white, lowercase for black), queens first.
    pub fn to_fen_chars(&self, color: Color) -> String {
        let mut out = String::new();
        for &piece in Piece::DROPPABLE.iter().rev() {
            for _ in 0..self.counts[piece.index()] {
                out.push(piece.to_fen_char(color));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pocket() {
        let p = Pocket::new();
        assert!(p.is_empty());
        assert_eq!(p.total(), 0);
        assert_eq!(p.count(Piece::Pawn), 0);
    }

    #[test]
    fn add_remove() {
        let mut p = Pocket::new();
        p.add(Piece::Pawn);
        p.add(Piece::Pawn);
        p.add(Piece::Queen);
        assert_eq!(p.count(Piece::Pawn), 2);
        assert_eq!(p.count(Piece::Queen), 1);
        assert_eq!(p.total(), 3);

        assert!(p.remove(Piece::Pawn));
        assert_eq!(p.count(Piece::Pawn), 1);
        assert!(!p.remove(Piece::Rook));
    }

    #[test]
    fn king_count_is_zero() {
        let p = Pocket::new();
        assert_eq!(p.count(Piece::King), 0);
    }

    #[test]
    fn fen_chars_ordered() {
        let mut p = Pocket::new();
        p.add(Piece::Pawn);
        p.add(Piece::Queen);
        p.add(Piece::Rook);
        assert_eq!(p.to_fen_chars(Color::White), "QRP");
        assert_eq!(p.to_fen_chars(Color::Black), "qrp");
    }

    #[test]
    fn iter_skips_empty() {
        let mut p = Pocket::new();
        p.add(Piece::Knight);
        p.add(Piece::Knight);
        let pairs: Vec<_> = p.iter().collect();
        assert_eq!(pairs, vec![(Piece::Knight, 2)]);
    }
}
