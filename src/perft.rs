use std::ops::AddAssign;

use log::info;
use rayon::prelude::*;

use crate::position::Position;
use crate::types::Move;

/// Leaf counts of a perft walk, in the columns the published tables use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerftCounts {
    pub nodes: u64,
    pub captures: u64,
    pub en_passant: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
    pub checkmates: u64,
}

impl AddAssign for PerftCounts {
    fn add_assign(&mut self, other: Self) {
        self.nodes += other.nodes;
        self.captures += other.captures;
        self.en_passant += other.en_passant;
        self.castles += other.castles;
        self.promotions += other.promotions;
        self.checks += other.checks;
        self.checkmates += other.checkmates;
    }
}

/// Number of leaf positions `depth` plies below `position`.
///
/// Children are built with `apply_move` and dropped as soon as they are
/// counted; going through `successors` would keep the whole tree alive.
///
/// From the starting position
/// (https://www.chessprogramming.org/Perft_Results):
///
/// | Depth | Nodes       | Captures  | E.p. | Castles | Promotions | Checks  | Checkmates |
/// | ----- | ----------- | --------- | ---- | ------- | ---------- | ------- | ---------- |
/// | 0     | 1           | 0         | 0    | 0       | 0          | 0       | 0          |
/// | 1     | 20          | 0         | 0    | 0       | 0          | 0       | 0          |
/// | 2     | 400         | 0         | 0    | 0       | 0          | 0       | 0          |
/// | 3     | 8,902       | 34        | 0    | 0       | 0          | 12      | 0          |
/// | 4     | 197,281     | 1576      | 0    | 0       | 0          | 469     | 8          |
/// | 5     | 4,865,609   | 82,719    | 258  | 0       | 0          | 27,351  | 347        |
/// | 6     | 119,060,324 | 2,812,008 | 5248 | 0       | 0          | 809,099 | 10,828     |
pub fn perft(position: &Position, depth: u8) -> u64 {
    match depth {
        0 => 1,
        1 => position.valid_moves().len() as u64,
        _ => position
            .valid_moves()
            .iter()
            .map(|&mv| perft(&position.apply_move(mv), depth - 1))
            .sum(),
    }
}

/// `perft` with the root moves spread over the rayon pool.
pub fn perft_parallel(position: &Position, depth: u8) -> u64 {
    if depth < 2 {
        return perft(position, depth);
    }
    position
        .valid_moves()
        .par_iter()
        .map(|&mv| perft(&position.apply_move(mv), depth - 1))
        .sum()
}

/// Perft that also classifies the moves leading to the leaves.
pub fn perft_counts(position: &Position, depth: u8) -> PerftCounts {
    let mut counts = PerftCounts::default();
    if depth == 0 {
        counts.nodes = 1;
        return counts;
    }
    for &mv in position.valid_moves() {
        let child = position.apply_move(mv);
        if depth > 1 {
            counts += perft_counts(&child, depth - 1);
            continue;
        }
        let effects = position.board().effects_of(mv);
        counts.nodes += 1;
        counts.captures += u64::from(effects.is_capture());
        counts.en_passant += u64::from(effects.is_en_passant());
        counts.castles += u64::from(effects.is_castle());
        counts.promotions += u64::from(effects.is_promotion());
        if child.in_check() {
            counts.checks += 1;
            counts.checkmates += u64::from(child.valid_moves().is_empty());
        }
    }
    counts
}

/// Node count below each root move, sorted by move text.
pub fn divide(position: &Position, depth: u8) -> Vec<(Move, u64)> {
    let mut split: Vec<(Move, u64)> = position
        .valid_moves()
        .par_iter()
        .map(|&mv| (mv, perft(&position.apply_move(mv), depth.saturating_sub(1))))
        .collect();
    split.sort_by_key(|(mv, _)| mv.to_text());
    for (mv, nodes) in &split {
        info!("{mv}: {nodes}");
    }
    info!(
        "{} moves, {} nodes",
        split.len(),
        split.iter().map(|(_, nodes)| nodes).sum::<u64>()
    );
    split
}
