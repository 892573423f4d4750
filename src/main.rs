use std::time::Instant;

use clap::{Parser, Subcommand};
use itertools::Itertools;

use incremental_chess::perft::{divide, perft_parallel};
use incremental_chess::verify::{random_playouts, PlayoutConfig};
use incremental_chess::{Position, STARTING_POSITION_FEN};

#[derive(Parser, Debug)]
#[command(name = "incremental_chess")]
#[command(about = "Legal move generation over incrementally updated tables")]
struct Args {
    /// Position to start from
    #[arg(long, global = true, default_value = STARTING_POSITION_FEN)]
    fen: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count leaf positions below the start position
    Perft {
        #[arg(short, long, default_value_t = 4)]
        depth: u8,

        /// Print the count below every root move
        #[arg(long)]
        divide: bool,
    },
    /// List the legal moves
    Moves,
    /// Play moves given in coordinate notation and print the result
    Play { moves: Vec<String> },
    /// Play random games checking incremental tables against rebuilds
    Verify {
        #[arg(short, long, default_value_t = 100)]
        games: usize,

        #[arg(short, long, default_value_t = 200)]
        plies: usize,

        #[arg(short, long, default_value_t = 0)]
        seed: u64,
    },
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let args = Args::parse();
    let position = Position::parse(&args.fen)?;

    match args.command {
        Command::Perft { depth, divide: split } => {
            let start = Instant::now();
            let nodes = if split {
                let moves = divide(&position, depth);
                for (mv, count) in &moves {
                    println!("{mv}: {count}");
                }
                moves.iter().map(|(_, count)| count).sum()
            } else {
                perft_parallel(&position, depth)
            };
            let elapsed = start.elapsed();
            println!("Depth {depth}: {nodes} nodes in {:.3}s", elapsed.as_secs_f64());
            println!("Nodes/second: {:.0}", nodes as f64 / elapsed.as_secs_f64());
        }
        Command::Moves => {
            println!("{}", position.board());
            let moves: Vec<String> = position
                .valid_moves()
                .iter()
                .map(|mv| mv.to_text())
                .sorted()
                .collect();
            println!("{} legal moves", moves.len());
            println!("{}", moves.join(" "));
        }
        Command::Play { moves } => {
            let mut current = position;
            for text in &moves {
                current = current.apply_text_move(text)?;
            }
            println!("{}", current.board());
            println!("{}", current.text());
            if current.is_mate() {
                println!("Checkmate, {} wins", current.side_to_move().other_color().to_human());
            } else if current.is_draw() {
                println!("Draw");
            } else if current.in_check() {
                println!("{} is in check", current.side_to_move().to_human());
            }
        }
        Command::Verify { games, plies, seed } => {
            let config = PlayoutConfig {
                games,
                max_plies: plies,
                seed,
            };
            let summary = random_playouts(&position, &config)?;
            println!(
                "{} games, {} plies checked, {} checkmates, {} draws",
                summary.games, summary.plies, summary.checkmates, summary.draws
            );
        }
    }
    Ok(())
}
