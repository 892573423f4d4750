//! Node counts from https://www.chessprogramming.org/Perft_Results
//!
//! Run the slow ones with: cargo test --release --test perft -- --ignored

use incremental_chess::perft::{perft, perft_counts, perft_parallel, PerftCounts};
use incremental_chess::Position;
use pretty_assertions::assert_eq;

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
const POSITION_4: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
const POSITION_5: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";
const POSITION_6: &str =
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10";

fn check_node_counts(fen: &str, expected: &[u64]) {
    let position = Position::parse(fen).unwrap();
    for (depth, &nodes) in expected.iter().enumerate() {
        let depth = depth as u8 + 1;
        assert_eq!(perft(&position, depth), nodes, "{fen} depth {depth}");
    }
}

#[test]
fn perft_kiwipete() {
    check_node_counts(KIWIPETE, &[48, 2039, 97_862]);
}

#[test]
fn perft_pos_3() {
    check_node_counts(POSITION_3, &[14, 191, 2812, 43_238]);
}

#[test]
fn perft_pos_3_counts() {
    let position = Position::parse(POSITION_3).unwrap();
    assert_eq!(
        perft_counts(&position, 3),
        PerftCounts {
            nodes: 2812,
            captures: 209,
            en_passant: 2,
            checks: 267,
            ..PerftCounts::default()
        }
    );
}

#[test]
fn perft_pos_4() {
    check_node_counts(POSITION_4, &[6, 264, 9467]);
}

/// Depth | Nodes
/// ----- | -----
/// 1     | 44
/// 2     | 1,486
/// 3     | 62,379
/// 4     | 2,103,487
#[test]
fn perft_pos_5() {
    check_node_counts(POSITION_5, &[44, 1486, 62_379]);
}

#[test]
fn perft_pos_6() {
    check_node_counts(POSITION_6, &[46, 2079, 89_890]);
}

#[test]
#[ignore = "slow in debug builds"]
fn perft_start_5() {
    assert_eq!(perft_parallel(&Position::starting(), 5), 4_865_609);
}

#[test]
#[ignore = "slow in debug builds"]
fn perft_pos_5_depth_4() {
    let position = Position::parse(POSITION_5).unwrap();
    assert_eq!(perft_parallel(&position, 4), 2_103_487);
}
