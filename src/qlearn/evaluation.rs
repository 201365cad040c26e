//! Evaluation matches of a frozen policy against the greedy opponent.
//!
//! Games run in parallel. The table is only read; every game owns its
//! position, environment and seeded random source, so results depend on the
//! seed alone and not on scheduling.

use chess::Color;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;

use crate::game::abstraction::state_key;
use crate::game::environment::RewardEnvironment;
use crate::game::opponent::GreedyOpponent;
use crate::qlearn::agent::{select_action, QLearningAgent};
use crate::qlearn::config::EpisodeOutcome;
use crate::qlearn::error::Result;
use crate::qlearn::storage::QTable;

/// Result of one evaluation game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameRecord {
    /// Outcome for the policy.
    pub outcome: EpisodeOutcome,
    /// Plies played.
    pub plies: usize,
}

/// Aggregate over a batch of evaluation games.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchReport {
    /// Games played.
    pub games: usize,
    /// Policy wins.
    pub wins: usize,
    /// Draws.
    pub draws: usize,
    /// Policy losses.
    pub losses: usize,
    /// Games stopped by the ply cap.
    pub unfinished: usize,
    /// Plies over all games.
    pub total_plies: usize,
}

impl MatchReport {
    /// Fold game records into a report.
    pub fn from_records(records: &[GameRecord]) -> Self {
        let mut report = Self {
            games: records.len(),
            ..Self::default()
        };
        for record in records {
            match record.outcome {
                EpisodeOutcome::Win => report.wins += 1,
                EpisodeOutcome::Draw => report.draws += 1,
                EpisodeOutcome::Loss => report.losses += 1,
                EpisodeOutcome::Unfinished => report.unfinished += 1,
            }
            report.total_plies += record.plies;
        }
        report
    }

    /// Fraction of games won.
    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.wins as f64 / self.games as f64
        }
    }

    /// Pretty-printed JSON rendering of the report.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Average game length in plies.
    pub fn mean_plies(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.total_plies as f64 / self.games as f64
        }
    }
}

/// Play one greedy (ε = 0) game of `table` as `color` against the greedy opponent.
pub fn play_evaluation_game(
    table: &QTable,
    color: Color,
    seed: u64,
    max_plies: Option<usize>,
) -> Result<GameRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let opponent = GreedyOpponent::new(!color);
    let mut environment = RewardEnvironment::new();
    let mut plies = 0usize;

    while !environment.is_done() && max_plies.map_or(true, |cap| plies < cap) {
        let position = environment.position();
        let mv = if position.side_to_move() == color {
            let key = state_key(position, color);
            select_action(table, &key, &position.legal_moves(), 0.0, &mut rng)
        } else {
            opponent.get_move(position)
        };

        let Some(mv) = mv else {
            break;
        };
        environment.play(mv)?;
        plies += 1;
    }

    Ok(GameRecord {
        outcome: EpisodeOutcome::from_result(environment.position().outcome(), color),
        plies,
    })
}

/// Play `games` evaluation games in parallel.
///
/// Game `i` uses seed `seed + i`, so the report is reproducible.
pub fn evaluate_policy(
    agent: &QLearningAgent,
    games: usize,
    seed: u64,
    max_plies: Option<usize>,
) -> Result<MatchReport> {
    let table = agent.table();
    let color = agent.color();

    let records = (0..games)
        .into_par_iter()
        .map(|i| play_evaluation_game(table, color, seed.wrapping_add(i as u64), max_plies))
        .collect::<Result<Vec<_>>>()?;

    Ok(MatchReport::from_records(&records))
}
