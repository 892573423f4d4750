//! Differential checks of the incrementally updated tables.
//!
//! Every table a `Position` carries can also be rebuilt from its board
//! alone. Playing random games and comparing the two after each move is
//! the broadest check that the incremental updates are exact.

use itertools::Itertools;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;

use crate::move_table::MoveTable;
use crate::piece_positions::PiecePositions;
use crate::position::Position;
use crate::square_control::SquareControl;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Divergence {
    #[error("piece positions differ from the board after `{moves}` ({position})")]
    PiecePositions { position: String, moves: String },
    #[error("square control differs from a rebuild after `{moves}` ({position})")]
    SquareControl { position: String, moves: String },
    #[error("move table differs from a rebuild after `{moves}` ({position})")]
    MoveTable { position: String, moves: String },
    #[error("position text does not parse back to the same position after `{moves}` ({position})")]
    Text { position: String, moves: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayoutConfig {
    pub games: usize,
    pub max_plies: usize,
    pub seed: u64,
}

impl Default for PlayoutConfig {
    fn default() -> Self {
        PlayoutConfig {
            games: 100,
            max_plies: 200,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayoutSummary {
    pub games: usize,
    pub plies: usize,
    pub checkmates: usize,
    pub draws: usize,
}

/// Compare the tables of `position` against ones rebuilt from its board.
pub fn check_tables(position: &Position) -> Result<(), Divergence> {
    let board = position.board();
    let context = || (position.text(), position.history().iter().join(" "));

    if *position.pieces() != PiecePositions::new_from_board(board) {
        let (position, moves) = context();
        return Err(Divergence::PiecePositions { position, moves });
    }
    if *position.square_control() != SquareControl::new_from_board(board) {
        let (position, moves) = context();
        return Err(Divergence::SquareControl { position, moves });
    }
    if *position.move_table() != MoveTable::new_from_board(board) {
        let (position, moves) = context();
        return Err(Divergence::MoveTable { position, moves });
    }
    if Position::parse(&position.text()).as_ref() != Ok(position) {
        let (position, moves) = context();
        return Err(Divergence::Text { position, moves });
    }
    Ok(())
}

/// Play seeded random games from `start`, checking the tables after every move.
pub fn random_playouts(start: &Position, config: &PlayoutConfig) -> Result<PlayoutSummary, Divergence> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut summary = PlayoutSummary::default();

    for game in 0..config.games {
        let mut current: Option<Position> = None;
        for _ in 0..config.max_plies {
            let position = current.as_ref().unwrap_or(start);
            if position.is_draw() {
                break;
            }
            let Some(&mv) = position.valid_moves().choose(&mut rng) else {
                break;
            };
            let next = position.apply_move(mv);
            if let Err(divergence) = check_tables(&next) {
                warn!("game {game}: {divergence}");
                return Err(divergence);
            }
            summary.plies += 1;
            current = Some(next);
        }

        let last = current.as_ref().unwrap_or(start);
        if last.is_mate() {
            summary.checkmates += 1;
        } else if last.is_draw() {
            summary.draws += 1;
        }
        summary.games += 1;
        debug!(
            "game {game}: {} plies, ended at {}",
            last.history().len(),
            last.text()
        );
    }
    Ok(summary)
}
