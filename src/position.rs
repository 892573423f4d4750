//! Immutable position snapshots.
//!
//! A `Position` bundles the board with its derived tables (piece sets,
//! attack table, destination table) and the game state that text notation
//! carries. Applying a move never mutates: it returns a new snapshot whose
//! tables were updated incrementally from this one. The legal-move list and
//! the successor list are computed on first request and then kept.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::OnceCell;

use crate::bitboard::Bitboard;
use crate::board::{Board, MoveEffects};
use crate::error::{Error, Result};
use crate::geometry::{Direction, GEOMETRY};
use crate::move_table::{push_moves, MoveTable};
use crate::piece_positions::PiecePositions;
use crate::square_control::SquareControl;
use crate::types::{CastleStatus, CastleStatuses, Color, Move, Piece, PieceType, Square};

pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

pub struct Position {
    board: Board,
    pieces: PiecePositions,
    control: SquareControl,
    moves: MoveTable,
    side_to_move: Color,
    castling: CastleStatuses,
    en_passant: Option<Square>,
    // number of half moves since last capture or pawn advance
    halfmove_clock: u32,
    // starts at 1, and gets incremented after every black move
    fullmove_number: u32,
    history: Vec<Move>,
    valid_moves: OnceCell<Vec<Move>>,
    successors: OnceCell<Vec<Position>>,
}

impl Position {
    pub fn starting() -> Position {
        Position::parse(STARTING_POSITION_FEN).unwrap_or_else(|e| panic!("starting position: {e}"))
    }

    /// Parse the six-field position text.
    ///
    /// # Panics
    /// When the text is well formed but a side does not have exactly one king.
    pub fn parse(text: &str) -> Result<Position> {
        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(Error::InvalidPosition {
                field: "position",
                value: text.to_string(),
                reason: "expected 6 space-separated fields",
            });
        }

        let board = Board::from_placement(fields[0])?;
        let side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(Error::InvalidPosition {
                    field: "side to move",
                    value: other.to_string(),
                    reason: "expected `w` or `b`",
                })
            }
        };
        let castling = CastleStatuses::from_text(fields[2])?;
        let en_passant = match fields[3] {
            "-" => None,
            target => {
                let sq = Square::from_algebraic(target)?;
                // the pawn that just moved belongs to the side not to move
                let expected_rank = side_to_move.promotion_rank().abs_diff(2);
                if sq.rank() != expected_rank {
                    return Err(Error::InvalidPosition {
                        field: "en passant target",
                        value: target.to_string(),
                        reason: "not on the square a double push just skipped",
                    });
                }
                Some(sq)
            }
        };
        let halfmove_clock = parse_counter("half-move clock", fields[4])?;
        let fullmove_number = parse_counter("full-move number", fields[5])?;

        Ok(Position::assemble(
            board,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        ))
    }

    fn assemble(
        board: Board,
        side_to_move: Color,
        castling: CastleStatuses,
        en_passant: Option<Square>,
        halfmove_clock: u32,
        fullmove_number: u32,
    ) -> Position {
        let pieces = PiecePositions::new_from_board(&board);
        for color in Color::ALL {
            pieces.king(color);
        }
        Position {
            control: SquareControl::new_from_board(&board),
            moves: MoveTable::new_from_board(&board),
            board,
            pieces,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
            history: Vec::new(),
            valid_moves: OnceCell::new(),
            successors: OnceCell::new(),
        }
    }

    /// Position text; also serves as a transposition key.
    pub fn text(&self) -> String {
        format!(
            "{} {} {} {} {} {}",
            self.board.placement(),
            self.side_to_move.to_char(),
            self.castling.to_text(),
            self.en_passant
                .map_or_else(|| "-".to_string(), |sq| sq.to_string()),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn pieces(&self) -> &PiecePositions {
        &self.pieces
    }

    pub fn square_control(&self) -> &SquareControl {
        &self.control
    }

    pub fn move_table(&self) -> &MoveTable {
        &self.moves
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn castling(&self) -> CastleStatuses {
        self.castling
    }

    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Moves played since the position was parsed.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn in_check(&self) -> bool {
        let king = self.pieces.king(self.side_to_move);
        self.control
            .attacks_square(self.side_to_move.other_color(), king)
    }

    pub fn is_mate(&self) -> bool {
        self.in_check() && self.valid_moves().is_empty()
    }

    pub fn is_stalemate(&self) -> bool {
        !self.in_check() && self.valid_moves().is_empty()
    }

    /// Fifty-move rule or stalemate.
    pub fn is_draw(&self) -> bool {
        self.halfmove_clock >= 100 || self.is_stalemate()
    }

    /// Legal moves for the side to move, computed once.
    pub fn valid_moves(&self) -> &[Move] {
        self.valid_moves.get_or_init(|| self.compute_valid_moves())
    }

    /// One child position per legal move, in `valid_moves` order, computed once.
    pub fn successors(&self) -> &[Position] {
        self.successors.get_or_init(|| {
            self.valid_moves()
                .iter()
                .map(|&mv| self.apply_move(mv))
                .collect()
        })
    }

    /// Parse `text` as a move and play it if it is legal here.
    pub fn apply_text_move(&self, text: &str) -> Result<Position> {
        let mv = Move::from_text(text)?;
        if !self.valid_moves().contains(&mv) {
            return Err(Error::IllegalMove(mv));
        }
        Ok(self.apply_move(mv))
    }

    /// The position after `mv`. The move is trusted to be legal.
    ///
    /// # Panics
    /// When the origin square is empty or holds a piece of the side not to move.
    pub fn apply_move(&self, mv: Move) -> Position {
        let effects = self.board.effects_of(mv);
        let color = effects.mover.color;
        assert_eq!(
            color,
            self.side_to_move,
            "{mv} moves a {} piece with {} to move",
            color.to_human(),
            self.side_to_move.to_human()
        );

        let board = self.board.apply(&effects);
        let pieces = self.pieces.apply_move(&effects);
        debug_assert_eq!(pieces.count() as usize, board.occupied_count());
        let control = self.control.apply_move(&effects, &board);
        let moves = self.moves.apply_move(&effects, &board, &pieces);

        let castling = self
            .castling
            .after_move(color, effects.mover.is_king(), mv.from, mv.to);
        let en_passant = en_passant_target(&effects, &board);
        let halfmove_clock = if effects.mover.piece_type == PieceType::Pawn || effects.is_capture() {
            0
        } else {
            self.halfmove_clock + 1
        };
        let fullmove_number = match color {
            Color::White => self.fullmove_number,
            Color::Black => self.fullmove_number + 1,
        };

        let mut history = Vec::with_capacity(self.history.len() + 1);
        history.extend_from_slice(&self.history);
        history.push(mv);

        Position {
            board,
            pieces,
            control,
            moves,
            side_to_move: color.other_color(),
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
            history,
            valid_moves: OnceCell::new(),
            successors: OnceCell::new(),
        }
    }

    fn compute_valid_moves(&self) -> Vec<Move> {
        let us = self.side_to_move;
        let them = us.other_color();
        let king = self.pieces.king(us);
        let pins = self.control.get_pinned_pieces(&self.board, us, king);
        let checks = self.moves.get_checks(us, &self.pieces);

        let mut moves = Vec::with_capacity(48);
        for to in self.moves.destinations(king) {
            if !self.control.attacks_square(them, to) {
                moves.push(Move::new(king, to));
            }
        }

        match (checks.count(), checks.first()) {
            (0, _) => {
                self.push_piece_moves(king, !Bitboard::EMPTY, &mut moves);
                self.push_en_passant_moves(king, &mut moves);
                self.push_castling_moves(king, &mut moves);
            }
            (1, Some(checker)) => {
                // take the checker or step into the line between it and the king
                let checker_slides = self
                    .board
                    .piece_at(checker)
                    .is_some_and(|p| p.is_sliding());
                let mut targets = Bitboard::from_square(checker);
                if checker_slides {
                    targets |= GEOMETRY.between(checker, king);
                }
                self.push_piece_moves(king, targets, &mut moves);
                if checker_slides || self.en_passant_victim() == Some(checker) {
                    self.push_en_passant_moves(king, &mut moves);
                }
            }
            // double check: only the king can move
            _ => {}
        }

        moves.retain(|mv| pins.allows(mv));
        moves
    }

    /// Moves of every piece but the king that land on `targets`.
    fn push_piece_moves(&self, king: Square, targets: Bitboard, moves: &mut Vec<Move>) {
        let others = self.pieces.occupancy(self.side_to_move) - Bitboard::from_square(king);
        for origin in others {
            push_moves(
                &self.board,
                origin,
                self.moves.destinations(origin) & targets,
                moves,
            );
        }
    }

    /// Square of the pawn an en passant capture would remove.
    fn en_passant_victim(&self) -> Option<Square> {
        let target = self.en_passant?;
        let them = self.side_to_move.other_color();
        let victim = them.pawn_direction().vector().step(target)?;
        let their_pawn = Piece::new(them, PieceType::Pawn);
        (self.board.piece_at(victim) == Some(their_pawn) && self.board.is_empty(target))
            .then_some(victim)
    }

    fn push_en_passant_moves(&self, king: Square, moves: &mut Vec<Move>) {
        let (Some(target), Some(victim)) = (self.en_passant, self.en_passant_victim()) else {
            return;
        };
        let us = self.side_to_move;
        let capturers =
            GEOMETRY.pawn_attacks(us.other_color(), target) & self.pieces.get(us, PieceType::Pawn);
        for from in capturers {
            if !self.en_passant_exposes_king(from, target, victim, king) {
                moves.push(Move::new(from, target));
            }
        }
    }

    /// En passant clears two squares of one rank at once, which can open a
    /// line onto the king that no pin records. Replay the occupancy change and
    /// look along every line from the king for an enemy slider.
    fn en_passant_exposes_king(&self, from: Square, target: Square, victim: Square, king: Square) -> bool {
        let us = self.side_to_move;
        let occupied = |sq: Square| sq == target || (sq != from && sq != victim && !self.board.is_empty(sq));
        Direction::ALL.into_iter().any(|direction| {
            let blocker = GEOMETRY
                .ray(king, direction)
                .iter()
                .copied()
                .find(|&sq| occupied(sq));
            match blocker {
                Some(sq) if sq != target => matches!(
                    self.board.piece_at(sq),
                    Some(p) if p.color != us && p.piece_type.slides_along(direction)
                ),
                _ => false,
            }
        })
    }

    fn push_castling_moves(&self, king: Square, moves: &mut Vec<Move>) {
        let us = self.side_to_move;
        let rights = self.castling.get(us);
        if rights == CastleStatus::None {
            return;
        }
        let rank = us.back_rank();
        let on_rank = |file: u8| Square::new(rank * 8 + file);
        if king != on_rank(4) {
            return;
        }
        let them = us.other_color();
        let safe = |file: u8| !self.control.attacks_square(them, on_rank(file));
        let empty = |file: u8| self.board.is_empty(on_rank(file));
        let rook = Some(Piece::new(us, PieceType::Rook));
        if !safe(4) {
            return;
        }

        if rights.kingside() && self.board.piece_at(on_rank(7)) == rook {
            if empty(5) && empty(6) && safe(5) && safe(6) {
                moves.push(Move::new(king, on_rank(6)));
            }
        }
        if rights.queenside() && self.board.piece_at(on_rank(0)) == rook {
            // the rook may cross an attacked b-file square, the king may not
            if empty(1) && empty(2) && empty(3) && safe(2) && safe(3) {
                moves.push(Move::new(king, on_rank(2)));
            }
        }
    }
}

fn parse_counter(field: &'static str, text: &str) -> Result<u32> {
    text.parse().map_err(|_| Error::InvalidPosition {
        field,
        value: text.to_string(),
        reason: "expected a non-negative integer",
    })
}

/// The square skipped by a double push, kept only when an enemy pawn
/// stands right beside the pawn that moved and could take it.
fn en_passant_target(effects: &MoveEffects, board: &Board) -> Option<Square> {
    let mv = effects.mv;
    if effects.mover.piece_type != PieceType::Pawn || mv.from.rank().abs_diff(mv.to.rank()) != 2 {
        return None;
    }
    let enemy_pawn = Some(Piece::new(
        effects.mover.color.other_color(),
        PieceType::Pawn,
    ));
    let beside = [-1, 1]
        .into_iter()
        .filter_map(|file_delta| mv.to.offset(file_delta, 0))
        .any(|sq| board.piece_at(sq) == enemy_pawn);
    if !beside {
        return None;
    }
    Square::from_file_rank(mv.from.file(), (mv.from.rank() + mv.to.rank()) / 2)
}

impl Default for Position {
    fn default() -> Self {
        Position::starting()
    }
}

/// Structural equality; history and caches are not compared.
impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.board == other.board
            && self.pieces == other.pieces
            && self.control == other.control
            && self.moves == other.moves
            && self.side_to_move == other.side_to_move
            && self.castling == other.castling
            && self.en_passant == other.en_passant
            && self.halfmove_clock == other.halfmove_clock
            && self.fullmove_number == other.fullmove_number
    }
}

impl Eq for Position {}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({})", self.text())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

impl FromStr for Position {
    type Err = Error;

    fn from_str(s: &str) -> Result<Position> {
        Position::parse(s)
    }
}
