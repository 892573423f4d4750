//! Incrementally maintained attack table.
//!
//! For every square the table records, per color, the origins whose piece
//! attacks (or defends) it, and for every origin the squares its piece
//! attacks. Sliding attacks stop on the first occupied square, except that
//! the enemy king never blocks: a ray that hits it carries on behind it, so
//! the king cannot step backwards along the line it is attacked on.
//!
//! `apply_move` only touches the pieces a move can affect and must always
//! produce exactly what `new_from_board` would build for the new board.

use crate::bitboard::Bitboard;
use crate::board::{Board, MoveEffects};
use crate::geometry::{Direction, GEOMETRY};
use crate::types::{Color, Move, Piece, PieceType, Square, PIECES_CAN_PROMOTE_TO};

#[derive(Clone, PartialEq, Eq)]
pub struct SquareControl {
    /// attacks_from[origin]: squares the piece on origin attacks
    attacks_from: [Bitboard; 64],
    /// attacked_by[color][square]: origins of `color` attacking square
    attacked_by: [[Bitboard; 64]; 2],
}

/// A friendly piece standing between its king and an enemy slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pin {
    pub pinned: Square,
    pub attacker: Square,
    /// Direction from the king towards the pinned piece and the attacker
    pub direction: Direction,
}

impl Pin {
    /// Moving along the pin line (either way) keeps the king covered.
    pub fn allows(&self, mv: &Move) -> bool {
        match GEOMETRY.direction(mv.from, mv.to) {
            Some(d) => d == self.direction || d == self.direction.opposite(),
            None => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pins(Vec<Pin>);

impl Pins {
    pub fn get(&self, sq: Square) -> Option<&Pin> {
        self.0.iter().find(|pin| pin.pinned == sq)
    }

    /// Unpinned pieces may move anywhere as far as pins are concerned.
    pub fn allows(&self, mv: &Move) -> bool {
        self.get(mv.from).map_or(true, |pin| pin.allows(mv))
    }

    pub fn pinned(&self) -> Bitboard {
        self.0.iter().map(|pin| pin.pinned).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl SquareControl {
    fn empty() -> SquareControl {
        SquareControl {
            attacks_from: [Bitboard::EMPTY; 64],
            attacked_by: [[Bitboard::EMPTY; 64]; 2],
        }
    }

    pub fn new_from_board(board: &Board) -> SquareControl {
        let mut control = SquareControl::empty();
        for (sq, piece) in board.pieces() {
            control.add_piece(board, sq, piece);
        }
        control
    }

    /// Does any piece of `color` attack `sq`?
    #[inline(always)]
    pub fn attacks_square(&self, color: Color, sq: Square) -> bool {
        !self.attacked_by[color.index()][sq.index()].is_empty()
    }

    #[inline(always)]
    pub fn attackers(&self, color: Color, sq: Square) -> Bitboard {
        self.attacked_by[color.index()][sq.index()]
    }

    #[inline(always)]
    pub fn attacks_from(&self, origin: Square) -> Bitboard {
        self.attacks_from[origin.index()]
    }

    /// Candidate moves of `color` onto `sq`, one per recorded attacker.
    /// Pawns reaching the last rank expand into the four promotions.
    pub fn get_attacks_on_square(&self, board: &Board, color: Color, sq: Square) -> Vec<Move> {
        let mut moves = Vec::new();
        for origin in self.attackers(color, sq) {
            let promotes = matches!(
                board.piece_at(origin),
                Some(p) if p.piece_type == PieceType::Pawn
            ) && sq.rank() == color.promotion_rank();
            if promotes {
                moves.extend(
                    PIECES_CAN_PROMOTE_TO
                        .iter()
                        .map(|&pt| Move::with_promotion(origin, sq, pt)),
                );
            } else {
                moves.push(Move::new(origin, sq));
            }
        }
        moves
    }

    /// Pieces of `color` pinned to the king on `king`.
    ///
    /// On each of the eight rays from the king, the first occupied square is
    /// pinned when it holds a friendly piece that an enemy slider attacks
    /// from further along the same ray.
    pub fn get_pinned_pieces(&self, board: &Board, color: Color, king: Square) -> Pins {
        let enemy = color.other_color();
        let mut pins = Vec::new();
        for direction in Direction::ALL {
            let Some((sq, piece)) = board.first_piece_along(king, direction) else {
                continue;
            };
            if piece.color != color {
                continue;
            }
            let attacker = self.attackers(enemy, sq).iter().find(|&origin| {
                GEOMETRY.direction(sq, origin) == Some(direction)
                    && board.piece_at(origin).is_some_and(|p| p.is_sliding())
            });
            if let Some(attacker) = attacker {
                pins.push(Pin {
                    pinned: sq,
                    attacker,
                    direction,
                });
            }
        }
        Pins(pins)
    }

    /// Table for the board after the move, `board` being that new board.
    pub fn apply_move(&self, effects: &MoveEffects, board: &Board) -> SquareControl {
        let mut next = self.clone();
        let color = effects.mover.color;

        // Pieces that left their square take their attacks with them.
        next.remove_origin(color, effects.mv.from);
        if let Some((sq, captured)) = effects.captured {
            next.remove_origin(captured.color, sq);
        }
        if let Some((rook_from, _)) = effects.rook_shift {
            next.remove_origin(color, rook_from);
        }

        // Sliders that saw a vacated square now see past it; sliders that
        // saw an arrival square are now stopped by it. Collect both before
        // rewalking so every lookup reads the pre-update rays.
        let mut stale = Vec::new();
        for sq in effects.vacated().chain(effects.arrived()) {
            next.collect_sliders_through(board, sq, &mut stale);
        }
        for (origin, direction) in stale {
            next.rewalk(board, origin, direction);
        }

        next.add_piece(board, effects.mv.to, effects.placed);
        if let Some((_, rook_to)) = effects.rook_shift {
            next.add_piece(board, rook_to, Piece::new(color, PieceType::Rook));
        }
        next
    }

    fn add_piece(&mut self, board: &Board, origin: Square, piece: Piece) {
        for ray in GEOMETRY.attack_rays(piece, origin) {
            self.walk(board, origin, piece.color, &ray.squares);
        }
    }

    /// Record attacks along `squares` until a blocker, which is itself
    /// attacked. The enemy king does not block.
    fn walk(&mut self, board: &Board, origin: Square, color: Color, squares: &[Square]) {
        for &sq in squares {
            self.attacks_from[origin.index()].add(sq);
            self.attacked_by[color.index()][sq.index()].add(origin);
            match board.piece_at(sq) {
                None => {}
                Some(p) if p.is_king() && p.color != color => {}
                Some(_) => break,
            }
        }
    }

    fn remove_origin(&mut self, color: Color, origin: Square) {
        let targets = std::mem::take(&mut self.attacks_from[origin.index()]);
        for sq in targets {
            self.attacked_by[color.index()][sq.index()].remove(origin);
        }
    }

    fn collect_sliders_through(&self, board: &Board, sq: Square, out: &mut Vec<(Square, Direction)>) {
        for color in Color::ALL {
            for origin in self.attackers(color, sq) {
                let slides = board.piece_at(origin).is_some_and(|p| p.is_sliding());
                if !slides {
                    continue;
                }
                if let Some(direction) = GEOMETRY.direction(origin, sq) {
                    out.push((origin, direction));
                }
            }
        }
    }

    /// Drop everything recorded for one ray of a slider and walk it again.
    fn rewalk(&mut self, board: &Board, origin: Square, direction: Direction) {
        let Some(piece) = board.piece_at(origin) else {
            panic!("slider on {origin} vanished while updating its {direction:?} ray");
        };
        let color = piece.color;
        let mask = GEOMETRY.ray_mask(origin, direction);
        let stale = self.attacks_from[origin.index()] & mask;
        for sq in stale {
            self.attacked_by[color.index()][sq.index()].remove(origin);
        }
        self.attacks_from[origin.index()] = self.attacks_from[origin.index()] - mask;
        self.walk(board, origin, color, GEOMETRY.ray(origin, direction));
    }
}

impl std::fmt::Debug for SquareControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for sq in Square::all() {
            let white = self.attackers(Color::White, sq);
            let black = self.attackers(Color::Black, sq);
            if !white.is_empty() || !black.is_empty() {
                map.entry(&sq.to_string(), &(white, black));
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

    /// Apply `text` incrementally and compare against a fresh build.
    fn assert_incremental(placement: &str, text: &str) {
        let before = board(placement);
        let effects = before.effects_of(Move::from_text(text).unwrap());
        let after = before.apply(&effects);
        let incremental = SquareControl::new_from_board(&before).apply_move(&effects, &after);
        assert_eq!(incremental, SquareControl::new_from_board(&after), "{placement} {text}");
    }

    #[test]
    fn test_rook_attacks_stop_at_blockers() {
        // rook e4, own pawn e2, enemy pawn g4
        let control = SquareControl::new_from_board(&board("4k3/8/8/8/4R1p1/8/4P3/K7"));
        let rook = control.attacks_from(sq("e4"));
        assert!(rook.contains(sq("e2")));
        assert!(!rook.contains(sq("e1")));
        assert!(rook.contains(sq("g4")));
        assert!(!rook.contains(sq("h4")));
        assert!(rook.contains(sq("e8")));
        assert!(control.attacks_square(Color::White, sq("e2")));
        assert!(!control.attacks_square(Color::Black, sq("e3")));
    }

    #[test]
    fn test_rays_see_through_enemy_king() {
        // . . . . . . . .
        // . . . . . . . .
        // . . . . . . . .
        // . . . . . . . .
        // . . . . . . . .
        // . . . . . . . .
        // . . . . . . . .
        // ♜ . . ♔ . . . ♚
        let control = SquareControl::new_from_board(&board("8/8/8/8/8/8/8/r2K3k"));
        // the squares behind the white king stay attacked by the rook
        assert_eq!(
            control.attacks_from(sq("a1")) & squares(&["e1", "f1", "g1"]),
            squares(&["e1", "f1", "g1"])
        );
        // but a friendly king blocks
        let control = SquareControl::new_from_board(&board("8/8/8/8/8/8/8/r2k3K"));
        assert!(!control.attacks_square(Color::Black, sq("f1")));
    }

    #[test]
    fn test_pawn_attacks_are_diagonal_only() {
        let control = SquareControl::new_from_board(&board("4k3/8/8/8/8/8/4P3/K7"));
        assert_eq!(control.attacks_from(sq("e2")), squares(&["d3", "f3"]));
        assert!(!control.attacks_square(Color::White, sq("e3")));
    }

    #[test]
    fn test_get_attacks_on_square() {
        let b = board("3r3k/4P3/8/8/8/8/8/3RK3");
        let control = SquareControl::new_from_board(&b);
        let mut moves: Vec<String> = control
            .get_attacks_on_square(&b, Color::White, sq("d8"))
            .iter()
            .map(|m| m.to_text())
            .collect();
        moves.sort();
        assert_eq!(moves, vec!["d1d8", "e7d8b", "e7d8n", "e7d8q", "e7d8r"]);
    }

    #[test]
    fn test_pinned_pieces() {
        // . . . . . . . .
        // . . . ♜ . . . .
        // . . . . . . . .
        // . . . . . . . .
        // . . . ♖ . . . .
        // . . . . . . . .
        // . . . ♔ . . . .
        // . . . . . . . .
        let b = board("8/3r4/8/8/3R4/8/3K4/8");
        let control = SquareControl::new_from_board(&b);
        let pins = control.get_pinned_pieces(&b, Color::White, sq("d2"));
        assert_eq!(pins.len(), 1);
        let pin = pins.get(sq("d4")).unwrap();
        assert_eq!(pin.attacker, sq("d7"));
        assert_eq!(pin.direction, Direction::North);
        assert!(pin.allows(&Move::from_text("d4d7").unwrap()));
        assert!(pin.allows(&Move::from_text("d4d3").unwrap()));
        assert!(!pin.allows(&Move::from_text("d4e4").unwrap()));
    }

    #[test]
    fn test_no_pin_with_two_blockers() {
        let b = board("8/3r4/8/3N4/3R4/8/3K4/8");
        let control = SquareControl::new_from_board(&b);
        assert!(control.get_pinned_pieces(&b, Color::White, sq("d2")).is_empty());
    }

    #[test]
    fn test_diagonal_pin_by_queen() {
        let b = board("7k/8/8/8/3q4/8/1B6/K7");
        let control = SquareControl::new_from_board(&b);
        let pins = control.get_pinned_pieces(&b, Color::White, sq("a1"));
        assert_eq!(pins.pinned(), squares(&["b2"]));
        assert_eq!(pins.get(sq("b2")).unwrap().direction, Direction::NorthEast);
    }

    #[test]
    fn test_incremental_quiet_moves() {
        assert_incremental("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR", "e2e4");
        assert_incremental("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR", "g1f3");
        // bishop unblocked by the pawn
        assert_incremental("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR", "f1c4");
        // a piece stepping into a rook's file shrinks it
        assert_incremental("4k3/8/8/8/8/8/8/R3K3", "e1d1");
    }

    #[test]
    fn test_incremental_moving_along_a_ray() {
        // rook on a1 watching a queen that slides towards it and away
        assert_incremental("4k3/8/8/Q7/8/8/8/r3K3", "a5a3");
        assert_incremental("4k3/8/8/Q7/8/8/8/r3K3", "a5a8");
    }

    #[test]
    fn test_incremental_captures() {
        assert_incremental("4k3/8/8/3p4/4P3/8/8/4K3", "e4d5");
        assert_incremental("4k3/8/8/3r4/8/8/3R4/4K3", "d2d5");
        // capture that opens a diagonal behind the captured piece
        assert_incremental("4k3/8/5b2/8/3p4/8/1B6/4K3", "b2d4");
    }

    #[test]
    fn test_incremental_king_moves_behind_slider() {
        // rook sees through the king, king steps along the line
        assert_incremental("8/8/8/8/8/8/8/r2K3k", "d1d2");
        assert_incremental("8/8/8/8/8/8/8/r2K3k", "d1c1");
    }

    #[test]
    fn test_incremental_castling() {
        assert_incremental("r3k2r/8/8/8/8/8/8/R3K2R", "e1g1");
        assert_incremental("r3k2r/8/8/8/8/8/8/R3K2R", "e1c1");
        assert_incremental("r3k2r/8/8/8/8/8/8/R3K2R", "e8g8");
        assert_incremental("r3k2r/8/8/8/8/8/8/R3K2R", "e8c8");
        // enemy rook on the first rank sees through the king before castling
        assert_incremental("4k3/8/8/8/8/8/8/1r2K2R", "e1g1");
    }

    #[test]
    fn test_incremental_en_passant() {
        assert_incremental("4k3/8/8/3pP3/8/8/8/4K3", "e5d6");
        // the captured pawn was blocking a rank
        assert_incremental("4k3/8/8/K2pP2r/8/8/8/8", "e5d6");
        // and a diagonal
        assert_incremental("4k3/8/8/2pP4/8/8/8/6QK", "d5c6");
    }

    #[test]
    fn test_incremental_promotions() {
        assert_incremental("3r3k/4P3/8/8/8/8/8/4K3", "e7d8q");
        assert_incremental("7k/4P3/8/8/8/8/8/4K3", "e7e8n");
        assert_incremental("7k/8/8/8/8/8/4p3/K3R3", "e2e1q");
    }
}
