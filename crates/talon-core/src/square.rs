//! Board square representation.

use std::fmt;

/// A file (column) on the chess board, from A to H.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum File {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
    E = 4,
    F = 5,
    G = 6,
    H = 7,
}

impl File {
    /// All files in order.
    pub const ALL: [File; 8] = [
        File::A,
        File::B,
        File::C,
        File::D,
        File::E,
        File::F,
        File::G,
        File::H,
    ];

    /// Creates a file from index (0-7).
    #[inline]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 8 {
            // SAFETY: File is repr(u8) with contiguous discriminants 0-7.
            Some(unsafe { std::mem::transmute::<u8, File>(index) })
        } else {
            None
        }
    }

    /// Creates a file from a character ('a'-'h').
    #[inline]
    pub const fn from_char(c: char) -> Option<Self> {
        let c = c.to_ascii_lowercase();
        if c >= 'a' && c <= 'h' {
            Self::from_index(c as u8 - b'a')
        } else {
            None
        }
    }

    /// Returns the index (0-7).
    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Returns the character representation ('a'-'h').
    #[inline]
    pub const fn to_char(self) -> char {
        (b'a' + self as u8) as char
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// A rank (row) on the chess board, from 1 to 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Rank {
    R1 = 0,
    R2 = 1,
    R3 = 2,
    R4 = 3,
    R5 = 4,
    R6 = 5,
    R7 = 6,
    R8 = 7,
}

impl Rank {
    /// All ranks in order.
    pub const ALL: [Rank; 8] = [
        Rank::R1,
        Rank::R2,
        Rank::R3,
        Rank::R4,
        Rank::R5,
        Rank::R6,
        Rank::R7,
        Rank::R8,
    ];

    /// Creates a rank from index (0-7).
    #[inline]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 8 {
            // SAFETY: Rank is repr(u8) with contiguous discriminants 0-7.
            Some(unsafe { std::mem::transmute::<u8, Rank>(index) })
        } else {
            None
        }
    }

    /// Creates a rank from a character ('1'-'8').
    #[inline]
    pub const fn from_char(c: char) -> Option<Self> {
        if c >= '1' && c <= '8' {
            Self::from_index(c as u8 - b'1')
        } else {
            None
        }
    }

    /// Returns the index (0-7).
    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Returns the character representation ('1'-'8').
    #[inline]
    pub const fn to_char(self) -> char {
        (b'1' + self as u8) as char
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// A square on the chess board, indexed 0-63.
///
/// Squares use little-endian rank-file mapping: a1 = 0, b1 = 1, ..., h8 = 63.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square(u8);

impl Square {
    /// Creates a square from file and rank.
    #[inline]
    pub const fn new(file: File, rank: Rank) -> Self {
        Square(rank.index() * 8 + file.index())
    }

    /// Creates a square from index (0-63).
    #[inline]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 64 {
            Some(Square(index))
        } else {
            None
        }
    }

    /// Creates a square from index without bounds checking.
    ///
    /// # Safety
    /// The index must be in the range 0-63.
    #[inline]
    pub const unsafe fn from_index_unchecked(index: u8) -> Self {
        debug_assert!(index < 64);
        Square(index)
    }

    /// Parses a square from algebraic notation (e.g., "e4").
    pub const fn from_algebraic(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = match File::from_char(bytes[0] as char) {
            Some(f) => f,
            None => return None,
        };
        let rank = match Rank::from_char(bytes[1] as char) {
            Some(r) => r,
            None => return None,
        };
        Some(Square::new(file, rank))
    }

    /// Returns the index (0-63).
    #[inline]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Returns the file of this square.
    #[inline]
    pub const fn file(self) -> File {
        match File::from_index(self.0 % 8) {
            Some(f) => f,
            None => unreachable!(),
        }
    }

    /// Returns the rank of this square.
    #[inline]
    pub const fn rank(self) -> Rank {
        match Rank::from_index(self.0 / 8) {
            Some(r) => r,
            None => unreachable!(),
        }
    }

    /// Returns the square shifted by a signed index delta, if on the board.
    ///
    /// Note: this wraps across board edges; callers doing geometric stepping
    /// must mask edges themselves.
    #[inline]
    pub const fn offset(self, delta: i8) -> Option<Self> {
        let idx = self.0 as i16 + delta as i16;
        if idx >= 0 && idx < 64 {
            Some(Square(idx as u8))
        } else {
            None
        }
    }

    /// Returns the algebraic notation for this square.
    pub fn to_algebraic(self) -> String {
        format!("{}{}", self.file(), self.rank())
    }

    pub const A1: Square = Square(0);
    pub const B1: Square = Square(1);
    pub const C1: Square = Square(2);
    pub const D1: Square = Square(3);
    pub const E1: Square = Square(4);
    pub const F1: Square = Square(5);
    pub const G1: Square = Square(6);
    pub const H1: Square = Square(7);
    pub const A8: Square = Square(56);
    pub const B8: Square = Square(57);
    pub const C8: Square = Square(58);
    pub const D8: Square = Square(59);
    pub const E8: Square = Square(60);
    pub const F8: Square = Square(61);
    pub const G8: Square = Square(62);
    pub const H8: Square = Square(63);
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Square({})", self.to_algebraic())
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_new() {
        let e4 = Square::new(File::E, Rank::R4);
        assert_eq!(e4.file(), File::E);
        assert_eq!(e4.rank(), Rank::R4);
        assert_eq!(e4.index(), 28);
    }

    #[test]
    fn square_from_algebraic() {
        assert_eq!(Square::from_algebraic("a1"), Some(Square::A1));
        assert_eq!(Square::from_algebraic("h8"), Some(Square::H8));
        assert_eq!(Square::from_algebraic("i1"), None);
        assert_eq!(Square::from_algebraic("a9"), None);
        assert_eq!(Square::from_algebraic(""), None);
    }

    #[test]
    fn square_to_algebraic() {
        assert_eq!(Square::A1.to_algebraic(), "a1");
        assert_eq!(Square::new(File::E, Rank::R4).to_algebraic(), "e4");
    }

    #[test]
    fn square_offset() {
        assert_eq!(Square::A1.offset(8), Some(Square::new(File::A, Rank::R2)));
        assert_eq!(Square::A1.offset(-1), None);
        assert_eq!(Square::H8.offset(1), None);
    }

    #[test]
    fn file_rank_chars() {
        assert_eq!(File::from_char('c'), Some(File::C));
        assert_eq!(File::from_char('C'), Some(File::C));
        assert_eq!(File::from_char('i'), None);
        assert_eq!(Rank::from_char('5'), Some(Rank::R5));
        assert_eq!(Rank::from_char('9'), None);
    }
}
