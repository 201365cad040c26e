//! Episode loop pitting the learning agent against the greedy opponent.
//!
//! Each episode starts from the initial position and alternates moves by the
//! side the rules engine reports on move. Agent moves go through the reward
//! environment and are followed immediately by a Bellman update; opponent
//! moves are played directly and never recorded. ε decays once per episode.

use std::path::Path;
use std::time::Instant;

use log::{debug, info, warn};

use crate::game::environment::RewardEnvironment;
use crate::game::opponent::GreedyOpponent;
use crate::qlearn::agent::QLearningAgent;
use crate::qlearn::config::{EpisodeOutcome, TrainingConfig, TrainingStats};
use crate::qlearn::error::Result;

/// Summary of a single episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeSummary {
    /// Result from the agent's point of view.
    pub outcome: EpisodeOutcome,
    /// Plies played by both sides.
    pub plies: usize,
    /// Sum of the rewards the agent received.
    pub reward: f64,
}

/// Drives training episodes and owns everything they touch.
pub struct Trainer {
    agent: QLearningAgent,
    opponent: GreedyOpponent,
    environment: RewardEnvironment,
    config: TrainingConfig,
    stats: TrainingStats,
}

impl Trainer {
    /// Trainer for `agent`; the opponent takes the other color.
    pub fn new(agent: QLearningAgent, config: TrainingConfig) -> Self {
        let opponent = GreedyOpponent::new(!agent.color());
        let stats = TrainingStats {
            epsilon: agent.epsilon(),
            states: agent.table().num_states(),
            ..TrainingStats::new()
        };

        Self {
            agent,
            opponent,
            environment: RewardEnvironment::new(),
            config,
            stats,
        }
    }

    /// The agent being trained.
    pub fn agent(&self) -> &QLearningAgent {
        &self.agent
    }

    /// Give back the trained agent.
    pub fn into_agent(self) -> QLearningAgent {
        self.agent
    }

    /// Statistics so far.
    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    /// Episode settings.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Play one full episode.
    pub fn run_episode(&mut self) -> Result<EpisodeSummary> {
        self.environment.reset();
        let color = self.agent.color();
        let mut plies = 0usize;
        let mut total_reward = 0.0;

        loop {
            if self.environment.is_done() {
                break;
            }
            if self.config.max_plies.is_some_and(|cap| plies >= cap) {
                break;
            }

            let position = self.environment.position();
            let legal = position.legal_moves();
            if legal.is_empty() {
                warn!(
                    "episode {} stopped: no legal moves in a live position",
                    self.stats.episodes + 1
                );
                break;
            }

            if position.side_to_move() == color {
                let state = self.agent.state_key(position);
                let action = self.agent.choose_action_from(&state, &legal)?;
                let (next_position, reward, _) = self.environment.step(action)?;
                let next_state = self.agent.state_key(next_position);
                self.agent.update(state, action, reward, next_state);
                self.stats.updates += 1;
                total_reward += reward;
            } else {
                let Some(action) = self.opponent.get_move(position) else {
                    break;
                };
                self.environment.play(action)?;
            }
            plies += 1;
        }

        self.agent.decay_epsilon();

        let outcome = EpisodeOutcome::from_result(self.environment.position().outcome(), color);
        self.stats.episodes += 1;
        self.stats.plies += plies as u64;
        self.stats.record_outcome(outcome);
        self.stats.epsilon = self.agent.epsilon();

        debug!(
            "episode {}: {:?} after {} plies, reward {:.1}, epsilon {:.4}",
            self.stats.episodes,
            outcome,
            plies,
            total_reward,
            self.agent.epsilon()
        );

        Ok(EpisodeSummary {
            outcome,
            plies,
            reward: total_reward,
        })
    }

    /// Run the configured number of episodes.
    pub fn run(&mut self) -> Result<&TrainingStats> {
        let episodes = self.config.episodes;
        let interval = self.config.progress_interval;
        self.train_with_callback(episodes, interval, |_| {})
    }

    /// Train for `episodes` episodes.
    pub fn train(&mut self, episodes: u64) -> Result<&TrainingStats> {
        let start_time = Instant::now();

        for _ in 0..episodes {
            self.run_episode()?;
        }

        self.refresh_stats(start_time);
        Ok(&self.stats)
    }

    /// Train with a callback for progress tracking.
    ///
    /// # Arguments
    /// * `episodes` - Number of episodes to run
    /// * `callback_interval` - How often to call the callback
    /// * `callback` - Function called every `callback_interval` episodes
    pub fn train_with_callback<F>(
        &mut self,
        episodes: u64,
        callback_interval: u64,
        mut callback: F,
    ) -> Result<&TrainingStats>
    where
        F: FnMut(&TrainingStats),
    {
        let start_time = Instant::now();
        let interval = callback_interval.max(1);
        info!(
            "training {} episodes as {:?}, epsilon {:.4}",
            episodes,
            self.agent.color(),
            self.agent.epsilon()
        );

        for i in 0..episodes {
            self.run_episode()?;

            if (i + 1) % interval == 0 {
                self.refresh_stats(start_time);
                info!(
                    "episode {}: {} states, W/D/L/U {}/{}/{}/{}, epsilon {:.4}",
                    self.stats.episodes,
                    self.stats.states,
                    self.stats.wins,
                    self.stats.draws,
                    self.stats.losses,
                    self.stats.unfinished,
                    self.stats.epsilon
                );
                callback(&self.stats);
            }
        }

        self.refresh_stats(start_time);
        info!(
            "training finished: {} episodes, {} states, {} entries in {:.1}s",
            self.stats.episodes,
            self.stats.states,
            self.agent.table().num_entries(),
            self.stats.elapsed_seconds
        );
        Ok(&self.stats)
    }

    /// Persist the agent's table.
    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.agent.save(path.as_ref())?;
        info!("saved Q-table to {}", path.as_ref().display());
        Ok(())
    }

    fn refresh_stats(&mut self, start_time: Instant) {
        self.stats.states = self.agent.table().num_states();
        self.stats.epsilon = self.agent.epsilon();
        self.stats.elapsed_seconds = start_time.elapsed().as_secs_f64();
        self.stats.update_rate();
    }
}
