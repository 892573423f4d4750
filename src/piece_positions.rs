use crate::bitboard::Bitboard;
use crate::board::{Board, MoveEffects};
use crate::types::{Color, PieceType, Square};

/// Squares of every (color, piece type), kept in step with the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PiecePositions {
    /// sets[color][piece type]
    sets: [[Bitboard; 6]; 2],
}

impl PiecePositions {
    pub fn new_from_board(board: &Board) -> PiecePositions {
        let mut sets = [[Bitboard::EMPTY; 6]; 2];
        for (sq, piece) in board.pieces() {
            sets[piece.color.index()][piece.piece_type.index()].add(sq);
        }
        PiecePositions { sets }
    }

    #[inline(always)]
    pub fn get(&self, color: Color, piece_type: PieceType) -> Bitboard {
        self.sets[color.index()][piece_type.index()]
    }

    /// All squares held by `color`
    pub fn occupancy(&self, color: Color) -> Bitboard {
        self.sets[color.index()]
            .iter()
            .fold(Bitboard::EMPTY, |acc, &bb| acc | bb)
    }

    pub fn occupied(&self) -> Bitboard {
        self.occupancy(Color::White) | self.occupancy(Color::Black)
    }

    /// Both colors' pieces of one type
    pub fn of_type(&self, piece_type: PieceType) -> Bitboard {
        self.get(Color::White, piece_type) | self.get(Color::Black, piece_type)
    }

    pub fn count(&self) -> u32 {
        self.occupied().count()
    }

    /// # Panics
    /// Unless `color` has exactly one king.
    pub fn king(&self, color: Color) -> Square {
        let kings = self.get(color, PieceType::King);
        match (kings.count(), kings.first()) {
            (1, Some(sq)) => sq,
            (n, _) => panic!("{} must have exactly one king, found {n}", color.to_human()),
        }
    }

    /// Positions after the move described by `effects`.
    ///
    /// # Panics
    /// When the mover, the captured piece or the castling rook is not recorded
    /// on the square the move takes it from.
    pub fn apply_move(&self, effects: &MoveEffects) -> PiecePositions {
        let mut next = *self;
        if let Some((sq, captured)) = effects.captured {
            next.take(captured.color, captured.piece_type, sq);
        }
        let color = effects.mover.color;
        next.take(color, effects.mover.piece_type, effects.mv.from);
        next.sets[color.index()][effects.placed.piece_type.index()].add(effects.mv.to);
        if let Some((rook_from, rook_to)) = effects.rook_shift {
            next.take(color, PieceType::Rook, rook_from);
            next.sets[color.index()][PieceType::Rook.index()].add(rook_to);
        }
        next
    }

    fn take(&mut self, color: Color, piece_type: PieceType, sq: Square) {
        let set = &mut self.sets[color.index()][piece_type.index()];
        if !set.contains(sq) {
            panic!(
                "no {} {} recorded on {sq}",
                color.to_human(),
                piece_type.to_human()
            );
        }
        set.remove(sq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Move;
    use pretty_assertions::assert_eq;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn board(placement: &str) -> Board {
        Board::from_placement(placement).unwrap()
    }

    #[test]
    fn test_start_position_sets() {
        let pieces =
            PiecePositions::new_from_board(&board("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR"));
        assert_eq!(pieces.count(), 32);
        assert_eq!(pieces.get(Color::White, PieceType::Pawn).count(), 8);
        assert_eq!(pieces.get(Color::Black, PieceType::Knight).count(), 2);
        assert_eq!(pieces.king(Color::White), sq("e1"));
        assert_eq!(pieces.king(Color::Black), sq("e8"));
        assert_eq!(pieces.occupancy(Color::White).count(), 16);
    }

    #[test]
    fn test_apply_move_matches_rebuild() {
        let cases = [
            ("r3k2r/8/8/8/8/8/8/R3K2R", "e1c1"),
            ("4k3/8/8/3pP3/8/8/8/4K3", "e5d6"),
            ("3r3k/4P3/8/8/8/8/8/4K3", "e7d8q"),
            ("4k3/8/8/8/8/8/4P3/4K3", "e2e4"),
        ];
        for (placement, text) in cases {
            let before = board(placement);
            let effects = before.effects_of(Move::from_text(text).unwrap());
            let after = before.apply(&effects);
            let incremental = PiecePositions::new_from_board(&before).apply_move(&effects);
            assert_eq!(incremental, PiecePositions::new_from_board(&after), "{text}");
            assert_eq!(incremental.count() as usize, after.occupied_count());
        }
    }

    #[test]
    #[should_panic(expected = "exactly one king")]
    fn test_missing_king_panics() {
        let pieces = PiecePositions::new_from_board(&board("8/8/8/8/8/8/8/4K3"));
        pieces.king(Color::Black);
    }
}
