//! Evaluate a trained Q-table against the greedy opponent.
//!
//! Usage:
//!   cargo run --release --bin evaluate -- [--model q_table.json] [--games 200] [--json]

use std::path::PathBuf;
use std::process;
use std::time::Instant;

use chess::Color;
use clap::Parser;

use chess_qlearner::qlearn::{evaluate_policy, QLearnError, QLearningAgent, QLearningConfig};

/// Evaluate a trained agent
#[derive(Parser, Debug)]
#[command(name = "evaluate")]
#[command(about = "Play greedy evaluation games of a trained Q-table", long_about = None)]
struct Args {
    /// Q-table written by the train binary
    #[arg(long, default_value = "q_table.json")]
    model: PathBuf,

    /// Number of games
    #[arg(short, long, default_value_t = 200)]
    games: usize,

    /// Base seed; game i uses seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Stop each game after this many plies
    #[arg(long)]
    max_plies: Option<usize>,

    /// Worker threads (default: all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn run(args: Args) -> Result<(), QLearnError> {
    if let Some(threads) = args.threads {
        if let Err(err) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            log::warn!("could not configure thread pool: {}", err);
        }
    }

    let agent = QLearningAgent::load(Color::White, QLearningConfig::exploit(), &args.model)?;
    log::info!(
        "loaded {} states ({} entries) from {}",
        agent.table().num_states(),
        agent.table().num_entries(),
        args.model.display()
    );

    let start = Instant::now();
    let report = evaluate_policy(&agent, args.games, args.seed, args.max_plies)?;

    if args.json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    println!("=== Evaluation vs Greedy Opponent ===");
    println!("Games: {}", report.games);
    println!("Wins: {}", report.wins);
    println!("Draws: {}", report.draws);
    println!("Losses: {}", report.losses);
    println!("Unfinished: {}", report.unfinished);
    println!("Win rate: {:.1}%", report.win_rate() * 100.0);
    println!("Mean length: {:.1} plies", report.mean_plies());
    println!("Time: {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(err) = run(args) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}
