//! Incrementally maintained pseudo-legal destinations.
//!
//! `destinations[origin]` holds every square the piece on `origin` could move
//! to by its movement rules alone: sliders run until blocked (capturing an
//! enemy blocker), knights and kings jump to anything but a friendly piece,
//! pawns push onto empty squares (twice from their start rank) and capture
//! diagonally onto enemy pieces. Checks and pins are ignored; en passant and
//! castling are generated by the position from the attack table instead.

use crate::bitboard::Bitboard;
use crate::board::{Board, MoveEffects};
use crate::geometry::{Direction, GEOMETRY};
use crate::piece_positions::PiecePositions;
use crate::types::{Color, Move, Piece, PieceType, Square, PIECES_CAN_PROMOTE_TO};

#[derive(Clone, PartialEq, Eq)]
pub struct MoveTable {
    destinations: [Bitboard; 64],
}

impl MoveTable {
    pub fn new_from_board(board: &Board) -> MoveTable {
        let mut destinations = [Bitboard::EMPTY; 64];
        for (sq, piece) in board.pieces() {
            destinations[sq.index()] = reachable(board, sq, piece);
        }
        MoveTable { destinations }
    }

    #[inline(always)]
    pub fn destinations(&self, origin: Square) -> Bitboard {
        self.destinations[origin.index()]
    }

    /// Table for the board after the move, `board` and `pieces` describing
    /// that new position.
    ///
    /// A piece's destinations only depend on the squares it can reach, so
    /// only pieces within reach of a square whose occupant changed are
    /// looked at: jumpers and pawns are recomputed whole, sliders have the
    /// one ray through the changed square walked again.
    pub fn apply_move(&self, effects: &MoveEffects, board: &Board, pieces: &PiecePositions) -> MoveTable {
        let mut next = self.clone();

        for sq in effects.vacated() {
            next.destinations[sq.index()] = Bitboard::EMPTY;
        }

        let mut recompute = Bitboard::from_square(effects.mv.to);
        if let Some((_, rook_to)) = effects.rook_shift {
            recompute.add(rook_to);
        }

        let knights = pieces.of_type(PieceType::Knight);
        let kings = pieces.of_type(PieceType::King);
        let mut stale_rays = Vec::new();
        for sq in effects.vacated().chain(std::iter::once(effects.mv.to)).chain(effects.arrived()) {
            recompute |= GEOMETRY.knight_targets(sq) & knights;
            recompute |= GEOMETRY.king_targets(sq) & kings;
            for color in Color::ALL {
                recompute |= GEOMETRY.pawn_sources(color, sq) & pieces.get(color, PieceType::Pawn);
            }
            for direction in Direction::ALL {
                if let Some((origin, piece)) = board.first_piece_along(sq, direction) {
                    if piece.piece_type.slides_along(direction) {
                        stale_rays.push((origin, direction.opposite()));
                    }
                }
            }
        }

        for (origin, direction) in stale_rays {
            if !recompute.contains(origin) {
                next.rewalk(board, origin, direction);
            }
        }
        for origin in recompute {
            next.destinations[origin.index()] = match board.piece_at(origin) {
                Some(piece) => reachable(board, origin, piece),
                None => Bitboard::EMPTY,
            };
        }
        next
    }

    /// Origins of the opposite color whose destinations include the king of `color`.
    pub fn get_checks(&self, color: Color, pieces: &PiecePositions) -> Bitboard {
        let king = pieces.king(color);
        pieces
            .occupancy(color.other_color())
            .iter()
            .filter(|&origin| self.destinations(origin).contains(king))
            .collect()
    }

    /// Every pseudo-legal move of `color`, origins and destinations ascending.
    pub fn to_moves(&self, color: Color, pieces: &PiecePositions, board: &Board) -> Vec<Move> {
        let mut moves = Vec::with_capacity(48);
        for origin in pieces.occupancy(color) {
            push_moves(board, origin, self.destinations(origin), &mut moves);
        }
        moves
    }

    fn rewalk(&mut self, board: &Board, origin: Square, direction: Direction) {
        let Some(piece) = board.piece_at(origin) else {
            panic!("slider on {origin} vanished while updating its {direction:?} ray");
        };
        let kept = self.destinations[origin.index()] - GEOMETRY.ray_mask(origin, direction);
        self.destinations[origin.index()] = kept | slide(board, origin, piece.color, direction);
    }
}

/// Expand origin/destination pairs into moves; a pawn reaching the last rank
/// becomes one move per promotion piece.
pub fn push_moves(board: &Board, origin: Square, targets: Bitboard, moves: &mut Vec<Move>) {
    let Some(piece) = board.piece_at(origin) else {
        return;
    };
    let promotes = piece.piece_type == PieceType::Pawn;
    for to in targets {
        if promotes && to.rank() == piece.color.promotion_rank() {
            moves.extend(
                PIECES_CAN_PROMOTE_TO
                    .iter()
                    .map(|&pt| Move::with_promotion(origin, to, pt)),
            );
        } else {
            moves.push(Move::new(origin, to));
        }
    }
}

fn reachable(board: &Board, origin: Square, piece: Piece) -> Bitboard {
    let color = piece.color;
    match piece.piece_type {
        PieceType::Pawn => pawn_destinations(board, origin, color),
        PieceType::Knight => jumps(board, GEOMETRY.knight_targets(origin), color),
        PieceType::King => jumps(board, GEOMETRY.king_targets(origin), color),
        slider => Direction::ALL
            .into_iter()
            .filter(|&d| slider.slides_along(d))
            .fold(Bitboard::EMPTY, |acc, d| acc | slide(board, origin, color, d)),
    }
}

fn jumps(board: &Board, targets: Bitboard, color: Color) -> Bitboard {
    targets
        .iter()
        .filter(|&sq| !board.is_friendly(sq, color))
        .collect()
}

fn slide(board: &Board, origin: Square, color: Color, direction: Direction) -> Bitboard {
    let mut reached = Bitboard::EMPTY;
    for &sq in GEOMETRY.ray(origin, direction) {
        match board.piece_at(sq) {
            None => reached.add(sq),
            Some(p) => {
                if p.color != color {
                    reached.add(sq);
                }
                break;
            }
        }
    }
    reached
}

fn pawn_destinations(board: &Board, origin: Square, color: Color) -> Bitboard {
    let forward = color.pawn_direction().vector();
    let mut reached = Bitboard::EMPTY;
    if let Some(one) = forward.step(origin) {
        if board.is_empty(one) {
            reached.add(one);
            if origin.rank() == color.pawn_start_rank() {
                if let Some(two) = forward.step(one) {
                    if board.is_empty(two) {
                        reached.add(two);
                    }
                }
            }
        }
    }
    for target in GEOMETRY.pawn_attacks(color, origin) {
        if board.is_enemy(target, color) {
            reached.add(target);
        }
    }
    reached
}

impl std::fmt::Debug for MoveTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for sq in Square::all() {
            let dests = self.destinations(sq);
            if !dests.is_empty() {
                map.entry(&sq.to_string(), &dests);
            }
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn squares(list: &[&str]) -> Bitboard {
        list.iter().map(|s| sq(s)).collect()
    }

    fn board(placement: &str) -> Board {
        Board::from_placement(placement).unwrap()
    }

    fn assert_incremental(placement: &str, text: &str) {
        let before = board(placement);
        let effects = before.effects_of(Move::from_text(text).unwrap());
        let after = before.apply(&effects);
        let pieces = PiecePositions::new_from_board(&after);
        let incremental = MoveTable::new_from_board(&before).apply_move(&effects, &after, &pieces);
        assert_eq!(incremental, MoveTable::new_from_board(&after), "{placement} {text}");
    }

    #[test]
    fn test_start_position_destinations() {
        let b = board("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR");
        let table = MoveTable::new_from_board(&b);
        assert_eq!(table.destinations(sq("e2")), squares(&["e3", "e4"]));
        assert_eq!(table.destinations(sq("g1")), squares(&["f3", "h3"]));
        assert!(table.destinations(sq("a1")).is_empty());
        assert!(table.destinations(sq("e1")).is_empty());

        let pieces = PiecePositions::new_from_board(&b);
        assert_eq!(table.to_moves(Color::White, &pieces, &b).len(), 20);
        assert_eq!(table.to_moves(Color::Black, &pieces, &b).len(), 20);
    }

    #[test]
    fn test_pawn_pushes_and_captures_are_separate() {
        // pawn e4 blocked by e5, may capture d5 but not the own piece on f5
        let table = MoveTable::new_from_board(&board("4k3/8/8/3pnN2/4P3/8/8/4K3"));
        assert_eq!(table.destinations(sq("e4")), squares(&["d5"]));
    }

    #[test]
    fn test_blocked_double_push() {
        let table = MoveTable::new_from_board(&board("4k3/8/8/8/4n3/8/4P3/4K3"));
        assert_eq!(table.destinations(sq("e2")), squares(&["e3"]));
        let table = MoveTable::new_from_board(&board("4k3/8/8/8/8/4n3/4P3/4K3"));
        assert!(table.destinations(sq("e2")).is_empty());
    }

    #[test]
    fn test_promotion_moves() {
        let b = board("7k/4P3/8/8/8/8/8/K7");
        let table = MoveTable::new_from_board(&b);
        let mut moves = Vec::new();
        push_moves(&b, sq("e7"), table.destinations(sq("e7")), &mut moves);
        let texts: Vec<String> = moves.iter().map(|m| m.to_text()).collect();
        assert_eq!(texts, vec!["e7e8q", "e7e8r", "e7e8b", "e7e8n"]);
    }

    #[test]
    fn test_get_checks() {
        // knight and rook both give check
        let b = board("4k3/8/3N4/8/8/8/8/4R1K1");
        let table = MoveTable::new_from_board(&b);
        let pieces = PiecePositions::new_from_board(&b);
        assert_eq!(table.get_checks(Color::Black, &pieces), squares(&["d6", "e1"]));
        assert!(table.get_checks(Color::White, &pieces).is_empty());
    }

    #[test]
    fn test_incremental_updates_double_push() {
        // knight landing in front of the pawn removes both pushes
        assert_incremental("4k3/8/8/8/8/8/4P3/4K1N1", "g1e3");
        // knight landing two squares ahead removes only the double push
        assert_incremental("4k3/8/8/8/8/5N2/4P3/4K3", "f3e4");
        // and leaving gives it back
        assert_incremental("4k3/8/8/8/4n3/8/4P3/4K3", "e4c3");
        // a pawn appearing diagonally in front creates captures for both sides
        assert_incremental("4k3/8/8/8/3p4/8/4P3/4K3", "d4d3");
        assert_incremental("4k3/3p4/8/8/8/8/4P3/4K3", "d7d5");
    }

    #[test]
    fn test_incremental_friendly_piece_leaving_unblocks_slider() {
        assert_incremental("4k3/8/8/8/8/N7/8/R3K3", "a3b5");
        assert_incremental("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR", "e2e4");
        assert_incremental("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR", "b1c3");
    }

    #[test]
    fn test_incremental_captures_change_sides() {
        assert_incremental("4k3/8/8/3r4/8/8/3R4/4K3", "d2d5");
        assert_incremental("4k3/8/2n5/3p4/4P3/8/8/4K3", "e4d5");
        assert_incremental("3r3k/4P3/8/8/8/8/8/4K3", "e7d8q");
    }

    #[test]
    fn test_incremental_special_moves() {
        assert_incremental("r3k2r/8/8/8/8/8/8/R3K2R", "e1g1");
        assert_incremental("r3k2r/8/8/8/8/8/8/R3K2R", "e8c8");
        assert_incremental("4k3/8/8/K2pP2r/8/8/8/8", "e5d6");
        assert_incremental("4k3/8/8/2pP4/8/8/8/6QK", "d5c6");
        assert_incremental("7k/8/8/8/8/8/4p3/K3R3", "e2e1q");
    }
}
