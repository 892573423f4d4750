use std::fmt;

use crate::error::{Error, Result};
use crate::geometry::{Direction, GEOMETRY};
use crate::types::{Color, Move, Piece, PieceType, Square};

/// Flat 64-square array, a1 first. Mirrors `PiecePositions` exactly.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    squares: [Option<Piece>; 64],
}

impl Board {
    pub fn empty() -> Board {
        Board {
            squares: [None; 64],
        }
    }

    /// Parse the piece placement field of a position text, rank 8 first.
    pub fn from_placement(text: &str) -> Result<Board> {
        let invalid = |reason| Error::InvalidPosition {
            field: "piece placement",
            value: text.to_string(),
            reason,
        };

        let ranks: Vec<&str> = text.split('/').collect();
        if ranks.len() != 8 {
            return Err(invalid("expected 8 ranks separated by `/`"));
        }

        let mut board = Board::empty();
        for (i, rank_text) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file: u8 = 0;
            for c in rank_text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return Err(invalid("empty-square count must be 1 to 8"));
                    }
                    file += skip as u8;
                } else {
                    let piece = Piece::from_char(c)?;
                    let sq = Square::from_file_rank(file, rank)
                        .ok_or_else(|| invalid("rank holds more than 8 squares"))?;
                    board.squares[sq.index()] = Some(piece);
                    file += 1;
                }
                if file > 8 {
                    return Err(invalid("rank holds more than 8 squares"));
                }
            }
            if file != 8 {
                return Err(invalid("rank holds fewer than 8 squares"));
            }
        }
        Ok(board)
    }

    pub fn placement(&self) -> String {
        let mut text = String::new();
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.squares[rank * 8 + file] {
                    Some(piece) => {
                        if empty > 0 {
                            text.push_str(&empty.to_string());
                            empty = 0;
                        }
                        text.push(piece.to_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                text.push_str(&empty.to_string());
            }
            if rank > 0 {
                text.push('/');
            }
        }
        text
    }

    #[inline(always)]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    #[inline(always)]
    pub fn is_empty(&self, sq: Square) -> bool {
        self.squares[sq.index()].is_none()
    }

    /// Occupied by a piece of the other color than `color`
    #[inline(always)]
    pub fn is_enemy(&self, sq: Square, color: Color) -> bool {
        matches!(self.squares[sq.index()], Some(p) if p.color != color)
    }

    #[inline(always)]
    pub fn is_friendly(&self, sq: Square, color: Color) -> bool {
        matches!(self.squares[sq.index()], Some(p) if p.color == color)
    }

    /// First occupied square walking from `from` (exclusive) in `direction`.
    pub fn first_piece_along(&self, from: Square, direction: Direction) -> Option<(Square, Piece)> {
        GEOMETRY
            .ray(from, direction)
            .iter()
            .find_map(|&sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    pub fn occupied_count(&self) -> usize {
        self.squares.iter().filter(|p| p.is_some()).count()
    }

    /// Occupied squares with their pieces, a1 first.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    /// Describe what `mv` does on this board.
    ///
    /// # Panics
    /// When there is no piece on the origin square.
    pub fn effects_of(&self, mv: Move) -> MoveEffects {
        MoveEffects::new(self, mv)
    }

    /// The board after the move, built on a scratch copy.
    pub fn apply(&self, effects: &MoveEffects) -> Board {
        let mut next = *self;
        if let Some((sq, _)) = effects.captured {
            next.set(sq, None);
        }
        next.move_piece(effects.mv.from, effects.mv.to);
        next.set(effects.mv.to, Some(effects.placed));
        if let Some((rook_from, rook_to)) = effects.rook_shift {
            next.move_piece(rook_from, rook_to);
        }
        next
    }

    pub(crate) fn set(&mut self, sq: Square, piece: Option<Piece>) {
        self.squares[sq.index()] = piece;
    }

    /// In-place relocation, only used while assembling the next snapshot.
    pub(crate) fn move_piece(&mut self, from: Square, to: Square) {
        let piece = self.squares[from.index()]
            .take()
            .unwrap_or_else(|| panic!("no piece on {from} to move to {to}"));
        self.squares[to.index()] = Some(piece);
    }

    pub fn draw_board(&self) -> String {
        let mut string = String::new();
        for rank in (0..8).rev() {
            for file in 0..8 {
                let symbol = match self.squares[rank * 8 + file] {
                    Some(piece) => piece.to_symbol(),
                    None => ".",
                };
                string.push(' ');
                string.push_str(symbol);
            }
            string.push('\n');
        }
        string
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.placement())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.draw_board())
    }
}

/// Everything a move does, resolved against the board it is played on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveEffects {
    pub mv: Move,
    /// The piece leaving the origin square
    pub mover: Piece,
    /// The piece arriving on the destination (differs on promotion)
    pub placed: Piece,
    /// Captured piece and the square it stood on; en passant takes from
    /// beside the destination rather than on it
    pub captured: Option<(Square, Piece)>,
    /// Rook origin and destination when castling
    pub rook_shift: Option<(Square, Square)>,
}

impl MoveEffects {
    fn new(board: &Board, mv: Move) -> MoveEffects {
        let mover = board
            .piece_at(mv.from)
            .unwrap_or_else(|| panic!("no piece on {} for move {mv}", mv.from));
        let placed = match mv.promotion {
            Some(piece_type) => Piece::new(mover.color, piece_type),
            None => mover,
        };

        let is_pawn = mover.piece_type == PieceType::Pawn;
        let en_passant = is_pawn && mv.from.file() != mv.to.file() && board.is_empty(mv.to);
        let captured = if en_passant {
            let victim_sq = Square::from_file_rank(mv.to.file(), mv.from.rank())
                .unwrap_or_else(|| panic!("en passant victim off the board for {mv}"));
            let victim = board
                .piece_at(victim_sq)
                .unwrap_or_else(|| panic!("no pawn on {victim_sq} to take en passant with {mv}"));
            Some((victim_sq, victim))
        } else {
            board.piece_at(mv.to).map(|p| (mv.to, p))
        };

        let is_castle = mover.is_king() && mv.from.file().abs_diff(mv.to.file()) == 2;
        let rook_shift = if is_castle {
            let rank = mv.from.rank();
            let (rook_file, rook_to_file) = if mv.to.file() > mv.from.file() {
                (7, 5)
            } else {
                (0, 3)
            };
            Square::from_file_rank(rook_file, rank).zip(Square::from_file_rank(rook_to_file, rank))
        } else {
            None
        };

        MoveEffects {
            mv,
            mover,
            placed,
            captured,
            rook_shift,
        }
    }

    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    pub fn is_en_passant(&self) -> bool {
        matches!(self.captured, Some((sq, _)) if sq != self.mv.to)
    }

    pub fn is_castle(&self) -> bool {
        self.rook_shift.is_some()
    }

    pub fn is_promotion(&self) -> bool {
        self.mv.promotion.is_some()
    }

    /// Squares that became empty: the origin, the en passant victim's square
    /// and the castling rook's origin.
    pub fn vacated(&self) -> impl Iterator<Item = Square> {
        let victim = match self.captured {
            Some((sq, _)) if sq != self.mv.to => Some(sq),
            _ => None,
        };
        std::iter::once(self.mv.from)
            .chain(victim)
            .chain(self.rook_shift.map(|(from, _)| from))
    }

    /// Squares that were empty and now hold a piece.
    pub fn arrived(&self) -> impl Iterator<Item = Square> {
        let destination = match self.captured {
            Some((sq, _)) if sq == self.mv.to => None,
            _ => Some(self.mv.to),
        };
        destination
            .into_iter()
            .chain(self.rook_shift.map(|(_, to)| to))
    }
}
