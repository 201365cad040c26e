//! Train the Q-learning agent against the greedy opponent.
//!
//! Usage:
//!   cargo run --release --bin train -- [OPTIONS]
//!
//! Hyperparameters come from `--config` (JSON, missing fields default) and
//! are then overridden by any flag given on the command line.

use std::path::PathBuf;
use std::process;
use std::time::Instant;

use chess::Color;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use chess_qlearner::qlearn::{QLearnError, QLearningAgent, QLearningConfig, Trainer, TrainingConfig};

/// Train a tabular Q-learning chess agent
#[derive(Parser, Debug)]
#[command(name = "train")]
#[command(about = "Train the Q-learning agent against a greedy opponent", long_about = None)]
struct Args {
    /// Number of episodes
    #[arg(short, long, default_value_t = 20_000)]
    episodes: u64,

    /// Hyperparameter JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Learning rate (alpha)
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Discount factor (gamma)
    #[arg(long)]
    discount: Option<f64>,

    /// Initial exploration rate
    #[arg(long)]
    epsilon: Option<f64>,

    /// Exploration floor
    #[arg(long)]
    epsilon_min: Option<f64>,

    /// Per-episode exploration decay
    #[arg(long)]
    epsilon_decay: Option<f64>,

    /// Stop each episode after this many plies
    #[arg(long)]
    max_plies: Option<usize>,

    /// Episodes between progress updates
    #[arg(long, default_value_t = 100)]
    progress_interval: u64,

    /// Where to write the Q-table
    #[arg(short, long, default_value = "q_table.json")]
    output: PathBuf,

    /// Continue from an existing Q-table
    #[arg(long)]
    resume: Option<PathBuf>,
}

fn build_config(args: &Args) -> Result<QLearningConfig, QLearnError> {
    let mut config = match &args.config {
        Some(path) => QLearningConfig::from_json_file(path)?,
        None => QLearningConfig::default(),
    };

    if let Some(value) = args.learning_rate {
        config.learning_rate = value;
    }
    if let Some(value) = args.discount {
        config.discount_factor = value;
    }
    if let Some(value) = args.epsilon {
        config.epsilon = value;
    }
    if let Some(value) = args.epsilon_min {
        config.epsilon_min = value;
    }
    if let Some(value) = args.epsilon_decay {
        config.epsilon_decay = value;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> Result<(), QLearnError> {
    let config = build_config(&args)?;
    let training = TrainingConfig {
        episodes: args.episodes,
        max_plies: args.max_plies,
        progress_interval: args.progress_interval.max(1),
    };

    println!("=== Chess Q-Learning Trainer ===");
    println!(
        "alpha={} gamma={} epsilon={} (min {}, decay {})",
        config.learning_rate,
        config.discount_factor,
        config.epsilon,
        config.epsilon_min,
        config.epsilon_decay
    );
    if let Some(seed) = config.seed {
        println!("seed={}", seed);
    }

    let agent = match &args.resume {
        Some(path) => {
            let agent = QLearningAgent::load(Color::White, config, path)?;
            println!(
                "resuming from {} ({} states)",
                path.display(),
                agent.table().num_states()
            );
            agent
        }
        None => QLearningAgent::new(Color::White, config)?,
    };

    let mut trainer = Trainer::new(agent, training.clone());

    let progress = ProgressBar::new(training.episodes);
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} episodes {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let start = Instant::now();
    let stats = trainer
        .train_with_callback(training.episodes, training.progress_interval, |stats| {
            progress.set_position(stats.episodes);
            progress.set_message(format!(
                "states={} eps={:.4} W/D/L/U={}/{}/{}/{}",
                stats.states, stats.epsilon, stats.wins, stats.draws, stats.losses, stats.unfinished
            ));
        })?
        .clone();
    progress.finish_and_clear();

    println!("\n=== Training Complete ===");
    println!("Episodes: {}", stats.episodes);
    println!("Plies: {}", stats.plies);
    println!("Updates: {}", stats.updates);
    println!("States: {}", stats.states);
    println!(
        "Wins/Draws/Losses/Unfinished: {}/{}/{}/{}",
        stats.wins, stats.draws, stats.losses, stats.unfinished
    );
    println!("Final epsilon: {:.4}", stats.epsilon);
    println!(
        "Time: {:.2}s ({:.1} episodes/s)",
        start.elapsed().as_secs_f64(),
        stats.episodes_per_second
    );

    trainer.save_model(&args.output)?;
    println!("Q-table written to {}", args.output.display());
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
