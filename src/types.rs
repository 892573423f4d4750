use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::geometry::Direction;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    pub fn from_case(c: char) -> Color {
        if c.is_uppercase() {
            Color::White
        } else {
            Color::Black
        }
    }

    pub fn other_color(&self) -> Color {
        if *self == Color::White {
            Color::Black
        } else {
            Color::White
        }
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn to_char(self) -> char {
        match self {
            Self::White => 'w',
            Self::Black => 'b',
        }
    }

    pub fn to_human(&self) -> &str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }

    /// Rank (0-based) the pawns of this color start on
    pub const fn pawn_start_rank(self) -> u8 {
        match self {
            Self::White => 1,
            Self::Black => 6,
        }
    }

    /// Rank (0-based) where pawns of this color promote
    pub const fn promotion_rank(self) -> u8 {
        match self {
            Self::White => 7,
            Self::Black => 0,
        }
    }

    pub const fn back_rank(self) -> u8 {
        match self {
            Self::White => 0,
            Self::Black => 7,
        }
    }

    pub const fn pawn_direction(self) -> Direction {
        match self {
            Self::White => Direction::North,
            Self::Black => Direction::South,
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    pub fn from_char(c: char) -> Result<PieceType> {
        match c.to_ascii_lowercase() {
            'p' => Ok(PieceType::Pawn),
            'n' => Ok(PieceType::Knight),
            'b' => Ok(PieceType::Bishop),
            'r' => Ok(PieceType::Rook),
            'q' => Ok(PieceType::Queen),
            'k' => Ok(PieceType::King),
            _ => Err(Error::InvalidPiece(c)),
        }
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Is the piece a sliding piece (one which can move multiple square in a given direction)
    pub fn is_sliding(&self) -> bool {
        matches!(*self, PieceType::Rook | PieceType::Bishop | PieceType::Queen)
    }

    /// Whether a sliding piece of this type travels along `direction`.
    pub fn slides_along(&self, direction: Direction) -> bool {
        match *self {
            PieceType::Rook => !direction.is_diagonal(),
            PieceType::Bishop => direction.is_diagonal(),
            PieceType::Queen => true,
            _ => false,
        }
    }

    pub fn to_human(&self) -> &str {
        match self {
            Self::Pawn => "pawn",
            Self::Rook => "rook",
            Self::Knight => "knight",
            Self::Bishop => "bishop",
            Self::Queen => "queen",
            Self::King => "king",
        }
    }

    pub fn to_char(&self) -> char {
        match self {
            Self::Pawn => 'P',
            Self::Rook => 'R',
            Self::Knight => 'N',
            Self::Bishop => 'B',
            Self::Queen => 'Q',
            Self::King => 'K',
        }
    }
}

pub const PIECES_CAN_PROMOTE_TO: [PieceType; 4] = [
    PieceType::Queen,
    PieceType::Rook,
    PieceType::Bishop,
    PieceType::Knight,
];

/// Occupant of a square. An empty square is `None` on the board.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Piece {
    pub color: Color,
    pub piece_type: PieceType,
}

impl Piece {
    pub const fn new(color: Color, piece_type: PieceType) -> Piece {
        Piece { color, piece_type }
    }

    /// Parse a placement letter: uppercase is white, lowercase is black.
    pub fn from_char(c: char) -> Result<Piece> {
        Ok(Piece {
            color: Color::from_case(c),
            piece_type: PieceType::from_char(c)?,
        })
    }

    pub fn to_char(&self) -> char {
        let c = self.piece_type.to_char();
        match self.color {
            Color::White => c,
            Color::Black => c.to_ascii_lowercase(),
        }
    }

    pub fn is_sliding(&self) -> bool {
        self.piece_type.is_sliding()
    }

    pub fn is_king(&self) -> bool {
        self.piece_type == PieceType::King
    }

    pub fn to_symbol(&self) -> &'static str {
        match (self.color, self.piece_type) {
            (Color::White, PieceType::Pawn) => "♙",
            (Color::White, PieceType::Knight) => "♘",
            (Color::White, PieceType::Bishop) => "♗",
            (Color::White, PieceType::Rook) => "♖",
            (Color::White, PieceType::Queen) => "♕",
            (Color::White, PieceType::King) => "♔",
            (Color::Black, PieceType::Pawn) => "♟︎",
            (Color::Black, PieceType::Knight) => "♞",
            (Color::Black, PieceType::Bishop) => "♝",
            (Color::Black, PieceType::Rook) => "♜",
            (Color::Black, PieceType::Queen) => "♛",
            (Color::Black, PieceType::King) => "♚",
        }
    }
}

/// Board square, a1 = 0, b1 = 1, ..., h8 = 63.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct Square(u8);

impl Square {
    /// # Panics
    /// When `index` is not below 64.
    pub const fn new(index: u8) -> Square {
        assert!(index < 64, "square index out of range");
        Square(index)
    }

    /// File and rank are both 0-based.
    pub const fn from_file_rank(file: u8, rank: u8) -> Option<Square> {
        if file < 8 && rank < 8 {
            Some(Square(rank * 8 + file))
        } else {
            None
        }
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub const fn file(self) -> u8 {
        self.0 % 8
    }

    #[inline(always)]
    pub const fn rank(self) -> u8 {
        self.0 / 8
    }

    pub fn offset(self, file_delta: i8, rank_delta: i8) -> Option<Square> {
        let file = self.file() as i8 + file_delta;
        let rank = self.rank() as i8 + rank_delta;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Square((rank * 8 + file) as u8))
        } else {
            None
        }
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).map(Square)
    }

    pub fn from_algebraic(s: &str) -> Result<Square> {
        let mut chars = s.chars();
        let square = match (chars.next(), chars.next(), chars.next()) {
            (Some(file @ 'a'..='h'), Some(rank @ '1'..='8'), None) => {
                Square::from_file_rank(file as u8 - b'a', rank as u8 - b'1')
            }
            _ => None,
        };
        square.ok_or_else(|| Error::InvalidSquare(s.to_string()))
    }

    pub fn to_algebraic(&self) -> String {
        format!("{}{}", (b'a' + self.file()) as char, (b'1' + self.rank()) as char)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

impl FromStr for Square {
    type Err = Error;

    fn from_str(s: &str) -> Result<Square> {
        Square::from_algebraic(s)
    }
}

/// A move as the coordinates of the moving piece. Castling is the king
/// moving two files, en passant a pawn moving diagonally onto the target.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceType>,
}

impl Move {
    pub const fn new(from: Square, to: Square) -> Move {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    pub const fn with_promotion(from: Square, to: Square, piece_type: PieceType) -> Move {
        Move {
            from,
            to,
            promotion: Some(piece_type),
        }
    }

    /// Long algebraic text: `e2e4`, `e7e8q`.
    pub fn from_text(text: &str) -> Result<Move> {
        let invalid = |reason| Error::InvalidMove {
            text: text.to_string(),
            reason,
        };
        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return Err(invalid("expected four or five characters"));
        }
        let from = Square::from_algebraic(&text[0..2])?;
        let to = Square::from_algebraic(&text[2..4])?;
        if from == to {
            return Err(invalid("origin and destination are the same square"));
        }
        let promotion = match text[4..].chars().next() {
            None => None,
            Some('q') => Some(PieceType::Queen),
            Some('r') => Some(PieceType::Rook),
            Some('b') => Some(PieceType::Bishop),
            Some('n') => Some(PieceType::Knight),
            Some(_) => return Err(invalid("promotion must be one of q, r, b, n")),
        };
        Ok(Move {
            from,
            to,
            promotion,
        })
    }

    pub fn to_text(&self) -> String {
        match self.promotion {
            Some(piece_type) => format!(
                "{}{}{}",
                self.from,
                self.to,
                piece_type.to_char().to_ascii_lowercase()
            ),
            None => format!("{}{}", self.from, self.to),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

impl FromStr for Move {
    type Err = Error;

    fn from_str(s: &str) -> Result<Move> {
        Move::from_text(s)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default)]
pub enum CastleStatus {
    #[default]
    None,
    Kingside,
    Queenside,
    Both,
}

impl CastleStatus {
    pub fn from_flags(kingside: bool, queenside: bool) -> CastleStatus {
        match (kingside, queenside) {
            (true, true) => CastleStatus::Both,
            (true, false) => CastleStatus::Kingside,
            (false, true) => CastleStatus::Queenside,
            (false, false) => CastleStatus::None,
        }
    }

    pub fn kingside(self) -> bool {
        matches!(self, CastleStatus::Kingside | CastleStatus::Both)
    }

    pub fn queenside(self) -> bool {
        matches!(self, CastleStatus::Queenside | CastleStatus::Both)
    }

    pub fn without_kingside(self) -> CastleStatus {
        CastleStatus::from_flags(false, self.queenside())
    }

    pub fn without_queenside(self) -> CastleStatus {
        CastleStatus::from_flags(self.kingside(), false)
    }
}

/// Castling rights of both colors.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default)]
pub struct CastleStatuses([CastleStatus; 2]);

impl CastleStatuses {
    pub const ALL: CastleStatuses = CastleStatuses([CastleStatus::Both; 2]);

    pub fn get(&self, color: Color) -> CastleStatus {
        self.0[color.index()]
    }

    pub fn set(&mut self, color: Color, status: CastleStatus) {
        self.0[color.index()] = status;
    }

    /// Rights after a move from `from` to `to` by a king or not.
    ///
    /// A right is lost when the king moves, when its rook leaves the home
    /// corner, or when anything lands on that corner (the rook was captured).
    pub fn after_move(&self, color: Color, moved_king: bool, from: Square, to: Square) -> CastleStatuses {
        let mut next = *self;
        if moved_king {
            next.set(color, CastleStatus::None);
        }
        for square in [from, to] {
            for side in Color::ALL {
                let rank = side.back_rank();
                if square.rank() != rank {
                    continue;
                }
                match square.file() {
                    0 => next.set(side, next.get(side).without_queenside()),
                    7 => next.set(side, next.get(side).without_kingside()),
                    _ => {}
                }
            }
        }
        next
    }

    /// Parse the `KQkq` field; `-` means no rights.
    pub fn from_text(text: &str) -> Result<CastleStatuses> {
        let invalid = || Error::InvalidPosition {
            field: "castling",
            value: text.to_string(),
            reason: "expected `-` or a subset of `KQkq`",
        };
        if text == "-" {
            return Ok(CastleStatuses::default());
        }
        if text.is_empty() || text.chars().any(|c| !"KQkq".contains(c)) {
            return Err(invalid());
        }
        Ok(CastleStatuses([
            CastleStatus::from_flags(text.contains('K'), text.contains('Q')),
            CastleStatus::from_flags(text.contains('k'), text.contains('q')),
        ]))
    }

    pub fn to_text(&self) -> String {
        let mut text = String::new();
        let (white, black) = (self.get(Color::White), self.get(Color::Black));
        if white.kingside() {
            text.push('K');
        }
        if white.queenside() {
            text.push('Q');
        }
        if black.kingside() {
            text.push('k');
        }
        if black.queenside() {
            text.push('q');
        }
        if text.is_empty() {
            text.push('-');
        }
        text
    }
}
