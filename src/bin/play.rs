//! Interactive CLI to play Black against a trained Q-table.
//!
//! Usage: cargo run --bin play -- [--model q_table.json]
//!
//! Moves are entered in UCI notation (`e7e5`, `e2e1q`). `quit` leaves.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use chess::Color;
use clap::Parser;

use chess_qlearner::game::{parse_move, to_uci, Position};
use chess_qlearner::qlearn::{QLearnError, QLearningAgent, QLearningConfig};

/// Play chess against the trained agent
#[derive(Parser, Debug)]
#[command(name = "play")]
#[command(about = "Play Black against the trained Q-learning agent", long_about = None)]
struct Args {
    /// Q-table written by the train binary
    #[arg(long, default_value = "q_table.json")]
    model: PathBuf,

    /// Seed for the agent's fallback moves
    #[arg(long)]
    seed: Option<u64>,
}

/// Read moves until a legal one is entered. `None` on EOF or quit.
fn read_human_move(position: &Position, input: &mut impl BufRead) -> Option<chess::ChessMove> {
    loop {
        print!("Your move: ");
        io::stdout().flush().ok()?;

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => return None,
            Err(err) => {
                println!("Error reading input ({}), try again.", err);
                continue;
            }
            Ok(_) => {}
        }

        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "q" || text == "quit" {
            return None;
        }

        match parse_move(position, text) {
            Ok(mv) => return Some(mv),
            Err(err @ (QLearnError::MalformedNotation(_) | QLearnError::IllegalAction(_))) => {
                println!("{}. Try again.", err)
            }
            Err(err) => println!("Could not use that move: {}", err),
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut config = QLearningConfig::exploit();
    config.seed = args.seed;

    let mut agent = match QLearningAgent::load(Color::White, config, &args.model) {
        Ok(agent) => agent,
        Err(err) => {
            eprintln!("error: {}", err);
            eprintln!("Train a model first: cargo run --release --bin train");
            process::exit(1);
        }
    };

    println!(
        "Loaded {} states from {}. You play Black.",
        agent.table().num_states(),
        args.model.display()
    );

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut position = Position::new();

    while !position.is_game_over() {
        let legal = position.legal_moves();

        if position.side_to_move() == agent.color() {
            let mv = match agent.choose_action(&position, &legal) {
                Ok(mv) => mv,
                Err(err) => {
                    println!("{}", err);
                    break;
                }
            };
            println!("Agent plays {}", to_uci(mv));
            position.push(mv);
        } else {
            println!("\n{}", position);
            let Some(mv) = read_human_move(&position, &mut input) else {
                println!("\nGoodbye!");
                return;
            };
            position.push(mv);
        }
    }

    println!("\n{}", position);
    match position.outcome() {
        Some(result) => println!("Game over: {}", result),
        None => println!("Game stopped without a result"),
    }
}
