//! Static board geometry: directions, vectors and the per-square tables the
//! attack and move tables walk.
//!
//! Everything here depends only on the shape of the board, never on a
//! position. The tables are built once on first use and shared read-only by
//! every thread afterwards.

use once_cell::sync::Lazy;

use crate::bitboard::Bitboard;
use crate::types::{Color, Piece, PieceType, Square};

/// The eight line and diagonal directions.
/// Indices: 0=N, 1=NE, 2=E, 3=SE, 4=S, 5=SW, 6=W, 7=NW
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn vector(self) -> Vector {
        match self {
            Direction::North => Vector::new(0, 1),
            Direction::NorthEast => Vector::new(1, 1),
            Direction::East => Vector::new(1, 0),
            Direction::SouthEast => Vector::new(1, -1),
            Direction::South => Vector::new(0, -1),
            Direction::SouthWest => Vector::new(-1, -1),
            Direction::West => Vector::new(-1, 0),
            Direction::NorthWest => Vector::new(-1, 1),
        }
    }

    pub const fn opposite(self) -> Direction {
        Direction::ALL[(self.index() + 4) % 8]
    }

    pub const fn is_diagonal(self) -> bool {
        self.index() % 2 == 1
    }

    /// The direction of a unit vector, if it is one.
    pub fn from_vector(vector: Vector) -> Option<Direction> {
        Direction::ALL.into_iter().find(|d| d.vector() == vector)
    }
}

/// A displacement on the board in files and ranks.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Vector {
    pub file_delta: i8,
    pub rank_delta: i8,
}

pub const KNIGHT_VECTORS: [Vector; 8] = [
    Vector::new(1, 2),
    Vector::new(2, 1),
    Vector::new(2, -1),
    Vector::new(1, -2),
    Vector::new(-1, -2),
    Vector::new(-2, -1),
    Vector::new(-2, 1),
    Vector::new(-1, 2),
];

impl Vector {
    pub const fn new(file_delta: i8, rank_delta: i8) -> Vector {
        Vector {
            file_delta,
            rank_delta,
        }
    }

    /// Apply the vector once; `None` when it leaves the board.
    #[inline]
    pub fn step(self, from: Square) -> Option<Square> {
        from.offset(self.file_delta, self.rank_delta)
    }

    /// Repeatedly step from `from` (exclusive) until the edge of the board.
    pub fn walk(self, from: Square) -> Walk {
        Walk {
            vector: self,
            current: Some(from),
        }
    }

    /// Split the displacement from `from` to `to` into a unit direction and
    /// the number of steps, when the squares share a line or diagonal.
    pub fn between(from: Square, to: Square) -> Option<(Direction, u8)> {
        let file_delta = to.file() as i8 - from.file() as i8;
        let rank_delta = to.rank() as i8 - from.rank() as i8;
        if (file_delta, rank_delta) == (0, 0) {
            return None;
        }
        if file_delta != 0 && rank_delta != 0 && file_delta.abs() != rank_delta.abs() {
            return None;
        }
        let magnitude = file_delta.abs().max(rank_delta.abs());
        let unit = Vector::new(file_delta.signum(), rank_delta.signum());
        Direction::from_vector(unit).map(|d| (d, magnitude as u8))
    }
}

pub struct Walk {
    vector: Vector,
    current: Option<Square>,
}

impl Iterator for Walk {
    type Item = Square;

    fn next(&mut self) -> Option<Square> {
        let next = self.vector.step(self.current?);
        self.current = next;
        next
    }
}

/// An ordered run of squares a piece attacks from its origin, nearest first.
/// Jumping pieces get one single-square ray per target.
#[derive(Debug, Clone)]
pub struct Ray {
    pub squares: Vec<Square>,
}

pub struct Geometry {
    knight: [Bitboard; 64],
    king: [Bitboard; 64],
    /// pawn_attacks[color][square]
    pawn_attacks: [[Bitboard; 64]; 2],
    /// pawn_sources[color][square]: origins from which a pawn of that color
    /// pushes to, double pushes to, or captures on the square
    pawn_sources: [[Bitboard; 64]; 2],
    /// rays[square][direction], nearest square first
    rays: Vec<[Vec<Square>; 8]>,
    ray_masks: [[Bitboard; 8]; 64],
    /// attack_rays[color][piece type][square]
    attack_rays: Vec<Vec<Vec<Vec<Ray>>>>,
    /// directions[from][to] when aligned
    directions: Vec<[Option<Direction>; 64]>,
}

impl Geometry {
    fn new() -> Self {
        let mut knight = [Bitboard::EMPTY; 64];
        let mut king = [Bitboard::EMPTY; 64];
        let mut pawn_attacks = [[Bitboard::EMPTY; 64]; 2];
        let mut pawn_sources = [[Bitboard::EMPTY; 64]; 2];
        let mut ray_masks = [[Bitboard::EMPTY; 8]; 64];

        for sq in Square::all() {
            knight[sq.index()] = KNIGHT_VECTORS.iter().filter_map(|v| v.step(sq)).collect();
            king[sq.index()] = Direction::ALL
                .iter()
                .filter_map(|d| d.vector().step(sq))
                .collect();
            for d in Direction::ALL {
                ray_masks[sq.index()][d.index()] = d.vector().walk(sq).collect();
            }
        }

        for color in Color::ALL {
            let forward = color.pawn_direction().vector();
            for sq in Square::all() {
                let attacks: Bitboard = [-1, 1]
                    .into_iter()
                    .filter_map(|file_delta| Vector::new(file_delta, forward.rank_delta).step(sq))
                    .collect();
                pawn_attacks[color.index()][sq.index()] = attacks;

                let mut influence = attacks;
                if let Some(one) = forward.step(sq) {
                    influence.add(one);
                    if sq.rank() == color.pawn_start_rank() {
                        if let Some(two) = forward.step(one) {
                            influence.add(two);
                        }
                    }
                }
                for target in influence {
                    pawn_sources[color.index()][target.index()].add(sq);
                }
            }
        }

        let rays: Vec<[Vec<Square>; 8]> = Square::all()
            .map(|sq| std::array::from_fn(|d| Direction::ALL[d].vector().walk(sq).collect()))
            .collect();

        let directions: Vec<[Option<Direction>; 64]> = Square::all()
            .map(|from| {
                let mut row: [Option<Direction>; 64] = [None; 64];
                for to in Square::all() {
                    row[to.index()] = Vector::between(from, to).map(|(d, _)| d);
                }
                row
            })
            .collect();

        let mut attack_rays: Vec<Vec<Vec<Vec<Ray>>>> = Vec::with_capacity(2);
        for color in Color::ALL {
            let mut per_type = Vec::with_capacity(PieceType::ALL.len());
            for piece_type in PieceType::ALL {
                let mut per_square: Vec<Vec<Ray>> = Vec::with_capacity(64);
                for sq in Square::all() {
                    let jumps = match piece_type {
                        PieceType::Pawn => Some(pawn_attacks[color.index()][sq.index()]),
                        PieceType::Knight => Some(knight[sq.index()]),
                        PieceType::King => Some(king[sq.index()]),
                        _ => None,
                    };
                    let piece_rays: Vec<Ray> = match jumps {
                        Some(targets) => targets
                            .iter()
                            .map(|target| Ray {
                                squares: vec![target],
                            })
                            .collect(),
                        None => Direction::ALL
                            .into_iter()
                            .filter(|d| piece_type.slides_along(*d))
                            .map(|d| Ray {
                                squares: rays[sq.index()][d.index()].clone(),
                            })
                            .filter(|ray| !ray.squares.is_empty())
                            .collect(),
                    };
                    per_square.push(piece_rays);
                }
                per_type.push(per_square);
            }
            attack_rays.push(per_type);
        }

        Geometry {
            knight,
            king,
            pawn_attacks,
            pawn_sources,
            rays,
            ray_masks,
            attack_rays,
            directions,
        }
    }

    #[inline(always)]
    pub fn knight_targets(&self, sq: Square) -> Bitboard {
        self.knight[sq.index()]
    }

    #[inline(always)]
    pub fn king_targets(&self, sq: Square) -> Bitboard {
        self.king[sq.index()]
    }

    /// Squares a pawn of `color` on `sq` attacks
    #[inline(always)]
    pub fn pawn_attacks(&self, color: Color, sq: Square) -> Bitboard {
        self.pawn_attacks[color.index()][sq.index()]
    }

    /// Origins whose pawn of `color` would gain or lose a move if `sq` changed
    #[inline(always)]
    pub fn pawn_sources(&self, color: Color, sq: Square) -> Bitboard {
        self.pawn_sources[color.index()][sq.index()]
    }

    #[inline(always)]
    pub fn ray(&self, sq: Square, direction: Direction) -> &[Square] {
        &self.rays[sq.index()][direction.index()]
    }

    #[inline(always)]
    pub fn ray_mask(&self, sq: Square, direction: Direction) -> Bitboard {
        self.ray_masks[sq.index()][direction.index()]
    }

    pub fn attack_rays(&self, piece: Piece, sq: Square) -> &[Ray] {
        &self.attack_rays[piece.color.index()][piece.piece_type.index()][sq.index()]
    }

    /// Direction to travel from `from` to reach `to`, if they are aligned
    #[inline(always)]
    pub fn direction(&self, from: Square, to: Square) -> Option<Direction> {
        self.directions[from.index()][to.index()]
    }

    /// Squares strictly between two aligned squares; empty otherwise
    pub fn between(&self, from: Square, to: Square) -> Bitboard {
        match self.direction(from, to) {
            Some(d) => self
                .ray(from, d)
                .iter()
                .copied()
                .take_while(|&sq| sq != to)
                .collect(),
            None => Bitboard::EMPTY,
        }
    }
}

pub static GEOMETRY: Lazy<Geometry> = Lazy::new(Geometry::new);
