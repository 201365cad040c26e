//! Epsilon-greedy tabular Q-learning policy.

use std::path::Path;

use chess::{ChessMove, Color};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::game::abstraction::{state_key, StateKey};
use crate::game::notation::to_uci;
use crate::game::position::Position;
use crate::qlearn::config::QLearningConfig;
use crate::qlearn::error::{QLearnError, Result};
use crate::qlearn::storage::QTable;

/// The learning agent.
///
/// Owns its Q-table, its current exploration rate and its random source.
/// Hyperparameters other than ε are fixed at construction.
///
/// # Example
/// ```
/// use chess::Color;
/// use chess_qlearner::game::Position;
/// use chess_qlearner::qlearn::{QLearningAgent, QLearningConfig};
///
/// let config = QLearningConfig::exploit().with_seed(1);
/// let mut agent = QLearningAgent::new(Color::White, config).unwrap();
/// let position = Position::new();
/// let legal = position.legal_moves();
/// let mv = agent.choose_action(&position, &legal).unwrap();
/// assert!(legal.contains(&mv));
/// ```
#[derive(Debug, Clone)]
pub struct QLearningAgent {
    color: Color,
    table: QTable,
    config: QLearningConfig,
    epsilon: f64,
    rng: StdRng,
}

impl QLearningAgent {
    /// Fresh agent with an empty table.
    ///
    /// Fails with [`QLearnError::Config`] if `config` does not validate.
    pub fn new(color: Color, config: QLearningConfig) -> Result<Self> {
        Self::with_table(color, config, QTable::new())
    }

    /// Agent starting from an existing table.
    pub fn with_table(color: Color, config: QLearningConfig, table: QTable) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            color,
            table,
            epsilon: config.epsilon,
            config,
            rng,
        })
    }

    /// Agent whose table is read from a snapshot file.
    pub fn load<P: AsRef<Path>>(color: Color, config: QLearningConfig, path: P) -> Result<Self> {
        config.validate()?;
        let table = QTable::load_json(path)?;
        Self::with_table(color, config, table)
    }

    /// Persist the table.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.table.save_json(path)
    }

    /// Side the agent plays.
    pub fn color(&self) -> Color {
        self.color
    }

    /// The learned table.
    pub fn table(&self) -> &QTable {
        &self.table
    }

    /// Hyperparameters.
    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }

    /// Current exploration rate.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Override the exploration rate, clamped to [0, 1].
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }

    /// Restart the random source from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// State key of `position` from this agent's side.
    pub fn state_key(&self, position: &Position) -> StateKey {
        state_key(position, self.color)
    }

    /// Pick a move for `position` among `legal`.
    ///
    /// Fails with [`QLearnError::EmptyLegalMoveSet`] if `legal` is empty.
    pub fn choose_action(
        &mut self,
        position: &Position,
        legal: &[ChessMove],
    ) -> Result<ChessMove> {
        let key = self.state_key(position);
        self.choose_action_from(&key, legal)
    }

    /// Pick a move for an already computed state key.
    pub fn choose_action_from(
        &mut self,
        key: &StateKey,
        legal: &[ChessMove],
    ) -> Result<ChessMove> {
        select_action(&self.table, key, legal, self.epsilon, &mut self.rng)
            .ok_or(QLearnError::EmptyLegalMoveSet)
    }

    /// Bellman backup for a move, returning the new value.
    pub fn update(
        &mut self,
        state: StateKey,
        action: ChessMove,
        reward: f64,
        next: StateKey,
    ) -> f64 {
        self.update_value(state, &to_uci(action), reward, next)
    }

    /// Bellman backup keyed by action notation.
    ///
    /// `Q(S,A) <- Q(S,A) + alpha * (R + gamma * max_a Q(S',a) - Q(S,A))`
    pub fn update_value(
        &mut self,
        state: StateKey,
        action: &str,
        reward: f64,
        next: StateKey,
    ) -> f64 {
        let current = self.table.get(&state, action);
        let target = reward + self.config.discount_factor * self.table.max_value(&next);
        let value = current + self.config.learning_rate * (target - current);
        self.table.set(state, action, value);
        value
    }

    /// Decay ε once. Called after every finished episode.
    pub fn decay_epsilon(&mut self) {
        if self.epsilon > self.config.epsilon_min {
            self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
        }
    }
}

/// Epsilon-greedy choice among `legal`.
///
/// Returns `None` only when `legal` is empty. Falls back to a uniformly random
/// legal move when the table knows nothing about any of them.
pub fn select_action<R: Rng>(
    table: &QTable,
    key: &StateKey,
    legal: &[ChessMove],
    epsilon: f64,
    rng: &mut R,
) -> Option<ChessMove> {
    if legal.is_empty() {
        return None;
    }

    if rng.gen::<f64>() < epsilon {
        return legal.choose(rng).copied();
    }

    best_known_action(table, key, legal).or_else(|| legal.choose(rng).copied())
}

/// Legal move with the highest stored value; the first one wins ties.
///
/// Stored moves that are not in `legal` are skipped.
pub fn best_known_action(
    table: &QTable,
    key: &StateKey,
    legal: &[ChessMove],
) -> Option<ChessMove> {
    let actions = table.actions(key)?;

    let mut best = None;
    let mut best_value = f64::NEG_INFINITY;
    for &mv in legal {
        if let Some(&value) = actions.get(to_uci(mv).as_str()) {
            if value > best_value {
                best_value = value;
                best = Some(mv);
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::notation::parse_uci;
    use crate::qlearn::config::ConfigError;

    fn exploit_agent() -> QLearningAgent {
        QLearningAgent::new(Color::White, QLearningConfig::exploit().with_seed(11)).unwrap()
    }

    #[test]
    fn test_empty_table_falls_back_to_legal_move() {
        let mut agent = exploit_agent();
        let position = Position::new();
        let legal = position.legal_moves();

        for _ in 0..20 {
            let mv = agent.choose_action(&position, &legal).unwrap();
            assert!(legal.contains(&mv));
        }
    }

    #[test]
    fn test_empty_legal_set_is_an_error() {
        let mut agent = exploit_agent();
        let position = Position::new();
        assert!(matches!(
            agent.choose_action(&position, &[]),
            Err(QLearnError::EmptyLegalMoveSet)
        ));
    }

    #[test]
    fn test_exploits_highest_value() {
        let mut agent = exploit_agent();
        let position = Position::new();
        let key = agent.state_key(&position);
        agent.table.set(key, "e2e4", 1.0);
        agent.table.set(key, "d2d4", 2.0);
        agent.table.set(key, "a2a3", -3.0);

        let mv = agent.choose_action(&position, &position.legal_moves()).unwrap();
        assert_eq!(to_uci(mv), "d2d4");
    }

    #[test]
    fn test_ties_go_to_first_legal_move() {
        let mut agent = exploit_agent();
        let position = Position::new();
        let key = agent.state_key(&position);
        agent.table.set(key, "g1f3", 1.0);
        agent.table.set(key, "e2e4", 1.0);

        let legal = position.legal_moves();
        let expected = legal
            .iter()
            .copied()
            .find(|&mv| matches!(to_uci(mv).as_str(), "g1f3" | "e2e4"))
            .unwrap();

        for _ in 0..5 {
            assert_eq!(agent.choose_action(&position, &legal).unwrap(), expected);
        }
    }

    #[test]
    fn test_illegal_stored_move_is_skipped() {
        let mut agent = exploit_agent();
        let position = Position::new();
        let key = agent.state_key(&position);
        agent.table.set(key, "e2e5", 50.0);
        agent.table.set(key, "e2e4", 1.0);

        let mv = agent.choose_action(&position, &position.legal_moves()).unwrap();
        assert_eq!(mv, parse_uci("e2e4").unwrap());
    }

    #[test]
    fn test_only_illegal_entries_fall_back_to_random() {
        let mut agent = exploit_agent();
        let position = Position::new();
        let key = agent.state_key(&position);
        agent.table.set(key, "e2e5", 50.0);

        let legal = position.legal_moves();
        assert!(legal.contains(&agent.choose_action(&position, &legal).unwrap()));
    }

    #[test]
    fn test_full_exploration_ignores_table() {
        let config = QLearningConfig::default().with_epsilon(1.0).with_seed(5);
        let mut agent = QLearningAgent::new(Color::White, config).unwrap();
        let position = Position::new();
        let key = agent.state_key(&position);
        agent.table.set(key, "e2e4", 100.0);

        let legal = position.legal_moves();
        let picks: Vec<_> = (0..50)
            .map(|_| agent.choose_action(&position, &legal).unwrap())
            .collect();
        assert!(picks.iter().any(|&mv| to_uci(mv) != "e2e4"));
    }

    #[test]
    fn test_same_seed_same_choices() {
        let config = QLearningConfig::default().with_epsilon(0.5).with_seed(99);
        let mut a = QLearningAgent::new(Color::White, config.clone()).unwrap();
        let mut b = QLearningAgent::new(Color::White, config).unwrap();
        let position = Position::new();
        let legal = position.legal_moves();

        for _ in 0..20 {
            assert_eq!(
                a.choose_action(&position, &legal).unwrap(),
                b.choose_action(&position, &legal).unwrap()
            );
        }
    }

    #[test]
    fn test_update_rule() {
        let mut agent = exploit_agent();
        let state = StateKey::new(15, 15, 20);
        let next = StateKey::new(15, 14, 22);

        // Unseen pair, next state without entries
        let value = agent.update_value(state, "e4d5", 1.0, next);
        assert!((value - 0.1).abs() < 1e-12);

        // 0.1 + 0.1 * (0 + 0.9 * 2.0 - 0.1)
        agent.table.set(next, "d1d5", 2.0);
        let value = agent.update_value(state, "e4d5", 0.0, next);
        assert!((value - 0.27).abs() < 1e-12);
        assert_eq!(agent.table().get(&state, "e4d5"), value);
    }

    #[test]
    fn test_update_fixed_point() {
        let config = QLearningConfig::exploit().with_discount_factor(0.5).with_seed(1);
        let mut agent = QLearningAgent::new(Color::White, config).unwrap();
        let state = StateKey::new(10, 10, 10);
        let next = StateKey::new(9, 10, 12);
        agent.table.set(state, "a1a2", 2.0);
        agent.table.set(next, "b1b2", 4.0);

        for _ in 0..10 {
            assert_eq!(agent.update_value(state, "a1a2", 0.0, next), 2.0);
        }
    }

    #[test]
    fn test_update_by_move_uses_notation_key() {
        let mut agent = exploit_agent();
        let state = StateKey::new(15, 15, 20);
        agent.update(state, parse_uci("e2e4").unwrap(), 1.0, state);
        assert!(agent.table().stored(&state, "e2e4").is_some());
    }

    #[test]
    fn test_epsilon_decay_is_monotonic_and_floored() {
        let config = QLearningConfig::default()
            .with_epsilon(0.9)
            .with_epsilon_min(0.05)
            .with_epsilon_decay(0.5);
        let mut agent = QLearningAgent::new(Color::White, config).unwrap();

        let mut previous = agent.epsilon();
        for n in 1..=10 {
            agent.decay_epsilon();
            let expected = (0.9 * 0.5f64.powi(n)).max(0.05);
            assert!((agent.epsilon() - expected).abs() < 1e-12);
            assert!(agent.epsilon() <= previous);
            assert!(agent.epsilon() >= 0.05);
            previous = agent.epsilon();
        }
    }

    #[test]
    fn test_constructors_reject_invalid_config() {
        let growing = QLearningConfig::default().with_epsilon(0.5).with_epsilon_decay(1.5);
        assert!(matches!(
            QLearningAgent::new(Color::White, growing.clone()),
            Err(QLearnError::Config(ConfigError::InvalidDecay(_)))
        ));
        assert!(matches!(
            QLearningAgent::with_table(Color::White, growing, QTable::new()),
            Err(QLearnError::Config(ConfigError::InvalidDecay(_)))
        ));

        let zero_alpha = QLearningConfig::default().with_learning_rate(0.0);
        assert!(QLearningAgent::new(Color::White, zero_alpha).is_err());
    }

    #[test]
    fn test_load_rejects_invalid_config_before_reading() {
        let config = QLearningConfig::exploit().with_discount_factor(2.0);
        let path = std::env::temp_dir().join("agent-load-never-read.json");
        assert!(matches!(
            QLearningAgent::load(Color::White, config, path),
            Err(QLearnError::Config(ConfigError::InvalidDiscount(_)))
        ));
    }

    #[test]
    fn test_epsilon_never_increases_for_accepted_configs() {
        let config = QLearningConfig::default()
            .with_epsilon(0.5)
            .with_epsilon_min(0.0)
            .with_epsilon_decay(1.0);
        let mut agent = QLearningAgent::new(Color::White, config).unwrap();
        for _ in 0..5 {
            agent.decay_epsilon();
            assert!(agent.epsilon() <= 0.5);
        }
    }

    #[test]
    fn test_state_key_is_from_agent_side() {
        let agent = QLearningAgent::new(Color::Black, QLearningConfig::exploit()).unwrap();
        let mut position = Position::new();
        position.try_push(parse_uci("e2e4").unwrap()).unwrap();
        let key = agent.state_key(&position);
        assert_eq!(key, state_key(&position, Color::Black));
        assert_eq!(key.own_mobility, 20);
    }
}
