use thiserror::Error;

use crate::types::Move;

/// Recoverable failures: everything here comes from text supplied by a caller.
///
/// Broken internal state (a missing king, tables out of step with the board,
/// moving a piece that is not there) is not represented; those panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid square `{0}`")]
    InvalidSquare(String),

    #[error("invalid piece letter `{0}`")]
    InvalidPiece(char),

    #[error("invalid move `{text}`: {reason}")]
    InvalidMove { text: String, reason: &'static str },

    #[error("invalid position text, {field} `{value}`: {reason}")]
    InvalidPosition {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("move {0} is not legal in this position")]
    IllegalMove(Move),
}

pub type Result<T> = std::result::Result<T, Error>;
