pub mod types;
pub mod error;
pub mod bitboard;
pub mod geometry;
pub mod board;
pub mod piece_positions;
pub mod square_control;
pub mod move_table;
pub mod position;
pub mod perft;
pub mod verify;

pub use error::{Error, Result};
pub use position::{Position, STARTING_POSITION_FEN};
pub use types::{Color, Move, Piece, PieceType, Square};
