//! Legal move generation.
//!
//! Generation is two-phase: every piece's pseudo-legal moves (plus the
//! variant's drops) are collected into a [`PriorityMoveList`], then filtered
//! by applying each candidate to a copy of the position and rejecting those
//! that leave the mover's king attacked. Slow and simple beats subtle here;
//! pin and check bookkeeping lives in one place.

pub mod attacks;
pub mod perft;

use talon_core::{Color, Move, MoveFlag, Piece, Square};

use crate::{Bitboard, Position};

/// Ordering hint for promotion moves.
pub const PRIORITY_PROMOTION: u8 = 96;
/// Ordering hint for captures (including en passant).
pub const PRIORITY_CAPTURE: u8 = 64;
/// Ordering hint for quiet board moves.
pub const PRIORITY_QUIET: u8 = 32;
/// Ordering hint for pocket drops.
pub const PRIORITY_DROP: u8 = 16;

/// A growable move list ordered by priority hints.
///
/// Crazyhouse positions can exceed the ~218-move bound of standard chess
/// (every pocketed type multiplies by the empty squares), so the backing
/// store grows on demand. Sorting is stable and keys on the priority byte
/// only; it never changes which moves are present.
#[derive(Debug, Clone, Default)]
pub struct PriorityMoveList {
    moves: Vec<Move>,
}

impl PriorityMoveList {
    /// Creates an empty list.
    pub fn new() -> Self {
        PriorityMoveList {
            moves: Vec::with_capacity(64),
        }
    }

    /// Appends a move.
    #[inline]
    pub fn push(&mut self, m: Move) {
        self.moves.push(m);
    }

    /// Returns the number of moves.
    #[inline]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Returns true if the list is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Removes all moves.
    pub fn clear(&mut self) {
        self.moves.clear();
    }

    /// Returns true if the list contains the move (priority ignored).
    pub fn contains(&self, m: Move) -> bool {
        self.moves.contains(&m)
    }

    /// Keeps only moves for which the predicate holds.
    pub fn retain(&mut self, f: impl FnMut(&Move) -> bool) {
        self.moves.retain(f);
    }

    /// Sorts highest priority first. The sort is stable, so equal-priority
    /// moves keep their generation order.
    pub fn sort_by_priority(&mut self) {
        self.moves.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// Sorts with a caller-supplied comparator.
    pub fn sort_by(&mut self, compare: impl FnMut(&Move, &Move) -> std::cmp::Ordering) {
        self.moves.sort_by(compare);
    }

    /// Iterates over the moves in list order.
    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.moves.iter()
    }

    /// Returns the moves as a slice.
    pub fn as_slice(&self) -> &[Move] {
        &self.moves
    }
}

impl std::ops::Index<usize> for PriorityMoveList {
    type Output = Move;

    fn index(&self, index: usize) -> &Move {
        &self.moves[index]
    }
}

impl IntoIterator for PriorityMoveList {
    type Item = Move;
    type IntoIter = std::vec::IntoIter<Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.into_iter()
    }
}

impl<'a> IntoIterator for &'a PriorityMoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.iter()
    }
}

impl FromIterator<Move> for PriorityMoveList {
    fn from_iter<T: IntoIterator<Item = Move>>(iter: T) -> Self {
        PriorityMoveList {
            moves: iter.into_iter().collect(),
        }
    }
}

/// Generates all legal moves for the side to move, sorted by priority.
pub fn generate_moves(position: &Position) -> PriorityMoveList {
    let us = position.side_to_move;
    let mut moves = generate_pseudo_legal(position);

    moves.retain(|&m| {
        let next = make_move(position, m);
        !is_king_attacked(&next, us)
    });

    moves.sort_by_priority();
    moves
}

/// Generates pseudo-legal moves: piece moves plus variant drops, without
/// the own-king-safety filter.
pub fn generate_pseudo_legal(position: &Position) -> PriorityMoveList {
    let mut moves = PriorityMoveList::new();

    generate_pawn_moves(position, &mut moves);
    generate_knight_moves(position, &mut moves);
    generate_slider_moves(position, &mut moves);
    generate_king_moves(position, &mut moves);
    position.variant.generate_drops(position, &mut moves);

    moves
}

/// Applies a move to a copy of the position.
pub fn make_move(position: &Position, m: Move) -> Position {
    let mut next = position.deep_copy(true);
    next.apply_move(m);
    next
}

/// Returns true if `by` attacks the given square.
pub fn is_square_attacked(position: &Position, sq: Square, by: Color) -> bool {
    // A pawn of `by` attacks sq iff a pawn of the other color on sq would
    // attack the pawn's square.
    if (attacks::pawn_attacks(by.opposite(), sq) & position.pieces_of(Piece::Pawn, by))
        .is_not_empty()
    {
        return true;
    }

    if (attacks::knight_attacks(sq) & position.pieces_of(Piece::Knight, by)).is_not_empty() {
        return true;
    }

    if (attacks::king_attacks(sq) & position.pieces_of(Piece::King, by)).is_not_empty() {
        return true;
    }

    let occupied = position.occupied();
    let rook_like = position.pieces_of(Piece::Rook, by) | position.pieces_of(Piece::Queen, by);
    if (attacks::rook_attacks(sq, occupied) & rook_like).is_not_empty() {
        return true;
    }

    let bishop_like =
        position.pieces_of(Piece::Bishop, by) | position.pieces_of(Piece::Queen, by);
    (attacks::bishop_attacks(sq, occupied) & bishop_like).is_not_empty()
}

/// Returns true if the given side's king is attacked.
pub fn is_king_attacked(position: &Position, color: Color) -> bool {
    match position.king_square(color) {
        Some(king) => is_square_attacked(position, king, color.opposite()),
        None => false,
    }
}

fn generate_pawn_moves(position: &Position, moves: &mut PriorityMoveList) {
    let us = position.side_to_move;
    let them = us.opposite();
    let their_pieces = position.colors[them.index()];
    let empty = position.empty_squares();
    let dir = us.pawn_direction();
    let start_rank = match us {
        Color::White => 1,
        Color::Black => 6,
    };
    let promo_rank = them.back_rank();

    for from in position.pieces_of(Piece::Pawn, us) {
        // Pushes. `offset` cannot wrap files for straight pushes.
        if let Some(to) = from.offset(dir) {
            if empty.contains(to) {
                if to.rank().index() == promo_rank {
                    push_promotions(moves, from, to, PRIORITY_PROMOTION);
                } else {
                    moves.push(Move::normal(from, to).with_priority(PRIORITY_QUIET));
                    if from.rank().index() == start_rank {
                        if let Some(double) = to.offset(dir) {
                            if empty.contains(double) {
                                moves.push(
                                    Move::new(from, double, MoveFlag::DoublePush)
                                        .with_priority(PRIORITY_QUIET),
                                );
                            }
                        }
                    }
                }
            }
        }

        // Captures.
        for to in attacks::pawn_attacks(us, from) & their_pieces {
            if to.rank().index() == promo_rank {
                push_promotions(moves, from, to, PRIORITY_PROMOTION);
            } else {
                moves.push(Move::normal(from, to).with_priority(PRIORITY_CAPTURE));
            }
        }

        if let Some(ep) = position.en_passant {
            if attacks::pawn_attacks(us, from).contains(ep) {
                moves.push(Move::new(from, ep, MoveFlag::EnPassant).with_priority(PRIORITY_CAPTURE));
            }
        }
    }
}

fn push_promotions(moves: &mut PriorityMoveList, from: Square, to: Square, priority: u8) {
    for flag in [
        MoveFlag::PromoteQueen,
        MoveFlag::PromoteRook,
        MoveFlag::PromoteBishop,
        MoveFlag::PromoteKnight,
    ] {
        moves.push(Move::new(from, to, flag).with_priority(priority));
    }
}

fn generate_knight_moves(position: &Position, moves: &mut PriorityMoveList) {
    let us = position.side_to_move;
    let our_pieces = position.colors[us.index()];
    let their_pieces = position.colors[us.opposite().index()];

    for from in position.pieces_of(Piece::Knight, us) {
        for to in attacks::knight_attacks(from) & !our_pieces {
            let priority = if their_pieces.contains(to) {
                PRIORITY_CAPTURE
            } else {
                PRIORITY_QUIET
            };
            moves.push(Move::normal(from, to).with_priority(priority));
        }
    }
}

fn generate_slider_moves(position: &Position, moves: &mut PriorityMoveList) {
    let us = position.side_to_move;
    let our_pieces = position.colors[us.index()];
    let their_pieces = position.colors[us.opposite().index()];
    let occupied = position.occupied();

    let sliders = [
        (Piece::Bishop, attacks::bishop_attacks as fn(Square, Bitboard) -> Bitboard),
        (Piece::Rook, attacks::rook_attacks),
        (Piece::Queen, attacks::queen_attacks),
    ];

    for (piece, attack_fn) in sliders {
        for from in position.pieces_of(piece, us) {
            for to in attack_fn(from, occupied) & !our_pieces {
                let priority = if their_pieces.contains(to) {
                    PRIORITY_CAPTURE
                } else {
                    PRIORITY_QUIET
                };
                moves.push(Move::normal(from, to).with_priority(priority));
            }
        }
    }
}

fn generate_king_moves(position: &Position, moves: &mut PriorityMoveList) {
    let us = position.side_to_move;
    let them = us.opposite();
    let our_pieces = position.colors[us.index()];
    let their_pieces = position.colors[them.index()];

    let king = match position.king_square(us) {
        Some(sq) => sq,
        None => return,
    };

    for to in attacks::king_attacks(king) & !our_pieces {
        let priority = if their_pieces.contains(to) {
            PRIORITY_CAPTURE
        } else {
            PRIORITY_QUIET
        };
        moves.push(Move::normal(king, to).with_priority(priority));
    }

    // Castling: path empty, king not in or passing through check. The
    // landing square is covered by the legality filter.
    let empty = position.empty_squares();
    let (e_sq, f_sq, g_sq, d_sq, c_sq, b_sq) = match us {
        Color::White => (
            Square::E1,
            Square::F1,
            Square::G1,
            Square::D1,
            Square::C1,
            Square::B1,
        ),
        Color::Black => (
            Square::E8,
            Square::F8,
            Square::G8,
            Square::D8,
            Square::C8,
            Square::B8,
        ),
    };

    if king == e_sq && !is_square_attacked(position, e_sq, them) {
        if position.castling.can_castle_kingside(us)
            && empty.contains(f_sq)
            && empty.contains(g_sq)
            && !is_square_attacked(position, f_sq, them)
        {
            moves.push(Move::new(e_sq, g_sq, MoveFlag::CastleKingside).with_priority(PRIORITY_QUIET));
        }

        if position.castling.can_castle_queenside(us)
            && empty.contains(d_sq)
            && empty.contains(c_sq)
            && empty.contains(b_sq)
            && !is_square_attacked(position, d_sq, them)
        {
            moves.push(
                Move::new(e_sq, c_sq, MoveFlag::CastleQueenside).with_priority(PRIORITY_QUIET),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talon_core::FenParser;

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    #[test]
    fn startpos_has_twenty_moves() {
        let moves = generate_moves(&Position::startpos());
        assert_eq!(moves.len(), 20);
    }

    #[test]
    fn captures_sort_before_quiet_moves() {
        // Black pawn on d5 is capturable by the e4 pawn.
        let position = pos("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2");
        let moves = generate_moves(&position);
        let first_quiet = moves
            .iter()
            .position(|m| m.priority() < PRIORITY_CAPTURE)
            .unwrap();
        let last_capture = moves
            .iter()
            .rposition(|m| m.priority() >= PRIORITY_CAPTURE)
            .unwrap();
        assert!(last_capture < first_quiet);
    }

    #[test]
    fn pinned_piece_cannot_move() {
        // The e-file knight is pinned by the rook on e8.
        let position = pos("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1");
        let moves = generate_moves(&position);
        let e2 = Square::from_algebraic("e2").unwrap();
        assert!(moves.iter().all(|m| m.from() != e2));
    }

    #[test]
    fn checkmate_has_no_moves() {
        // Scholar's mate final position.
        let position = pos("r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4");
        let moves = generate_moves(&position);
        assert!(moves.is_empty());
        assert!(is_king_attacked(&position, Color::Black));
    }

    #[test]
    fn stalemate_has_no_moves() {
        let position = pos("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        let moves = generate_moves(&position);
        assert!(moves.is_empty());
        assert!(!is_king_attacked(&position, Color::Black));
    }

    #[test]
    fn en_passant_is_generated() {
        let position = pos("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3");
        let moves = generate_moves(&position);
        assert!(moves
            .iter()
            .any(|m| m.flag() == MoveFlag::EnPassant
                && m.to() == Square::from_algebraic("f6").unwrap()));
    }

    #[test]
    fn castling_generated_when_clear() {
        let position = pos("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1");
        let moves = generate_moves(&position);
        assert!(moves.iter().any(|m| m.flag() == MoveFlag::CastleKingside));
        assert!(moves.iter().any(|m| m.flag() == MoveFlag::CastleQueenside));
    }

    #[test]
    fn no_castling_through_attacked_square() {
        // Black rook on f8 covers f1.
        let position = pos("5r2/3k4/8/8/8/8/8/R3K2R w KQ - 0 1");
        let moves = generate_moves(&position);
        assert!(moves.iter().all(|m| m.flag() != MoveFlag::CastleKingside));
        assert!(moves.iter().any(|m| m.flag() == MoveFlag::CastleQueenside));
    }

    #[test]
    fn no_castling_out_of_check() {
        let position = pos("4r3/3k4/8/8/8/8/8/R3K2R w KQ - 0 1");
        let moves = generate_moves(&position);
        assert!(moves.iter().all(|m| !m.flag().is_castling()));
    }

    #[test]
    fn crazyhouse_startpos_matches_standard_count() {
        let position = Position::from_fen(FenParser::STARTPOS_CRAZYHOUSE).unwrap();
        let moves = generate_moves(&position);
        assert_eq!(moves.len(), 20);
    }

    #[test]
    fn pocket_adds_drop_moves() {
        let position = pos("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR[N] w KQkq - 0 1");
        let moves = generate_moves(&position);
        // 20 board moves + 32 knight drops.
        assert_eq!(moves.len(), 52);
    }

    #[test]
    fn drop_cannot_leave_king_in_check() {
        // White king in check from the e8 rook; only blocks on the e-file
        // (or legal king steps) survive the filter.
        let position = pos("4r2k/8/8/8/8/8/8/4K3[N] w - - 0 1");
        let moves = generate_moves(&position);
        for m in moves.iter().filter(|m| m.is_drop()) {
            assert_eq!(m.to().file(), talon_core::File::E);
        }
        assert!(moves.iter().any(|m| m.is_drop()));
    }

    #[test]
    fn drop_can_block_check() {
        // Rook checks along rank 8; the pocketed queen can interpose.
        let position = pos("R3k3/8/8/8/8/8/8/4K3[q] b - - 0 1");
        let moves = generate_moves(&position);
        let drops: Vec<_> = moves.iter().filter(|m| m.is_drop()).collect();
        assert!(!drops.is_empty());
        assert!(drops.iter().all(|m| m.to().rank() == talon_core::Rank::R8));
    }

    #[test]
    fn move_list_sort_is_stable() {
        let mut list = PriorityMoveList::new();
        let a = Move::from_coords("a2a3").unwrap().with_priority(10);
        let b = Move::from_coords("b2b3").unwrap().with_priority(10);
        let c = Move::from_coords("c2c4").unwrap().with_priority(20);
        list.push(a);
        list.push(b);
        list.push(c);
        list.sort_by_priority();
        assert_eq!(list[0], c);
        assert_eq!(list[1], a);
        assert_eq!(list[2], b);
    }
}
