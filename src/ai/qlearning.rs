use std::collections::HashMap;
use std::fmt;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::agent::Agent;
use super::state_encoding::state_key;
use crate::game::{Board, GameSummary, MatchResult, Player, Successor};

/// Q-learning hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QLearningConfig {
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon: f64,
    pub min_epsilon: f64,
    /// Multiplied into epsilon after every training decision.
    pub epsilon_decay: f64,
    /// Initial value of an unseen capture successor.
    pub capture_seed: f64,
    /// Applied to capture successors when ranking and bootstrapping.
    pub capture_multiplier: f64,
    /// Applied to the updated value when the reward is positive.
    pub positive_reward_boost: f64,
    /// Explore among captures only, when there are any.
    pub capture_biased_exploration: bool,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        QLearningConfig {
            alpha: 0.1,
            gamma: 0.9,
            epsilon: 0.2,
            min_epsilon: 0.01,
            epsilon_decay: 0.9999,
            capture_seed: 1.0,
            capture_multiplier: 1.2,
            positive_reward_boost: 1.0,
            capture_biased_exploration: true,
        }
    }
}

/// State key -> resulting-state key -> value estimate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QTable {
    entries: HashMap<String, HashMap<String, f64>>,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, state: &str, action: &str) -> Option<f64> {
        self.entries.get(state)?.get(action).copied()
    }

    pub fn set(&mut self, state: &str, action: &str, value: f64) {
        self.entries
            .entry(state.to_string())
            .or_default()
            .insert(action.to_string(), value);
    }

    /// Stored value, inserting `init` first if the pair is unseen.
    pub fn get_or_insert(&mut self, state: &str, action: &str, init: f64) -> f64 {
        *self
            .entries
            .entry(state.to_string())
            .or_default()
            .entry(action.to_string())
            .or_insert(init)
    }

    pub fn actions(&self, state: &str) -> Option<&HashMap<String, f64>> {
        self.entries.get(state)
    }

    pub fn num_states(&self) -> usize {
        self.entries.len()
    }

    /// Number of (state, action) pairs.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Aggregate results over every recorded game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentStats {
    pub total_games: u64,
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
    pub reward_history: Vec<f64>,
    pub move_history: Vec<usize>,
    pub average_duration_secs: f64,
    pub last_game_id: Option<u64>,
}

impl AgentStats {
    pub fn record(&mut self, result: MatchResult, moves: usize, duration_secs: f64, total_reward: f64) {
        self.total_games += 1;
        self.move_history.push(moves);
        self.reward_history.push(total_reward);

        if result.is_win() {
            self.wins += 1;
        } else if result.is_loss() {
            self.losses += 1;
        } else {
            self.draws += 1;
        }

        let n = self.total_games as f64;
        self.average_duration_secs = (self.average_duration_secs * (n - 1.0) + duration_secs) / n;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        fn mean<T: Copy + Into<f64>>(values: &[T]) -> f64 {
            if values.is_empty() {
                return 0.0;
            }
            values.iter().map(|&v| v.into()).sum::<f64>() / values.len() as f64
        }
        fn last_ten<T: Clone>(values: &[T]) -> Vec<T> {
            values[values.len().saturating_sub(10)..].to_vec()
        }

        let moves: Vec<f64> = self.move_history.iter().map(|&m| m as f64).collect();
        StatsSnapshot {
            games_played: self.total_games,
            wins: self.wins,
            losses: self.losses,
            draws: self.draws,
            win_rate: if self.total_games == 0 {
                0.0
            } else {
                self.wins as f64 / self.total_games as f64 * 100.0
            },
            average_moves: mean(&moves),
            average_duration_secs: self.average_duration_secs,
            average_reward: mean(&self.reward_history),
            recent_rewards: last_ten(&self.reward_history),
            recent_moves: last_ten(&self.move_history),
        }
    }
}

/// Point-in-time view of [`AgentStats`] for display.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub games_played: u64,
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
    /// Percentage of games won.
    pub win_rate: f64,
    pub average_moves: f64,
    pub average_duration_secs: f64,
    pub average_reward: f64,
    pub recent_rewards: Vec<f64>,
    pub recent_moves: Vec<usize>,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Agent statistics ===")?;
        writeln!(f, "Games played:     {}", self.games_played)?;
        writeln!(f, "Wins:             {}", self.wins)?;
        writeln!(f, "Losses:           {}", self.losses)?;
        writeln!(f, "Draws:            {}", self.draws)?;
        writeln!(f, "Win rate:         {:.1}%", self.win_rate)?;
        writeln!(f, "Average moves:    {:.1}", self.average_moves)?;
        writeln!(f, "Average duration: {:.1}s", self.average_duration_secs)?;
        write!(f, "Average reward:   {:.1}", self.average_reward)
    }
}

/// Tabular Q-learning over (state key, resulting-state key) pairs.
pub struct QLearningAgent {
    config: QLearningConfig,
    table: QTable,
    stats: AgentStats,
    epsilon: f64,
    rng: StdRng,
}

impl QLearningAgent {
    pub fn new(config: QLearningConfig) -> Self {
        Self::with_state(config, QTable::new(), AgentStats::default())
    }

    /// Resume from a previously persisted table and statistics.
    pub fn with_state(config: QLearningConfig, table: QTable, stats: AgentStats) -> Self {
        QLearningAgent {
            epsilon: config.epsilon,
            config,
            table,
            stats,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn stats(&self) -> &AgentStats {
        &self.stats
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Stored value for the pair, 0.0 when unseen.
    pub fn q_value(&self, state: &Board, action: &Board) -> f64 {
        self.table
            .get(&state_key(state), &state_key(action))
            .unwrap_or(0.0)
    }

    /// Epsilon-greedy choice among `successors`; explores only while training.
    pub fn pick_successor(&mut self, board: &Board, successors: &[Successor], training: bool) -> usize {
        assert!(!successors.is_empty(), "No legal moves available");

        if training {
            self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.min_epsilon);
            if self.rng.random_range(0.0..1.0) < self.epsilon {
                return self.explore(successors);
            }
        }

        self.best_successor(&state_key(board), successors)
    }

    fn explore(&mut self, successors: &[Successor]) -> usize {
        let captures: Vec<usize> = successors
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_capture())
            .map(|(i, _)| i)
            .collect();
        if self.config.capture_biased_exploration && !captures.is_empty() {
            captures[self.rng.random_range(0..captures.len())]
        } else {
            self.rng.random_range(0..successors.len())
        }
    }

    /// Highest-valued successor, captures ranked first so they win ties.
    fn best_successor(&mut self, state: &str, successors: &[Successor]) -> usize {
        let order = successors
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_capture())
            .chain(successors.iter().enumerate().filter(|(_, s)| !s.is_capture()));

        let mut best: Option<usize> = None;
        let mut best_value = f64::NEG_INFINITY;
        for (idx, succ) in order {
            let capture = succ.is_capture();
            let init = if capture { self.config.capture_seed } else { 0.0 };
            let mut value = self.table.get_or_insert(state, &state_key(&succ.board), init);
            if capture {
                value *= self.config.capture_multiplier;
            }
            if value > best_value {
                best_value = value;
                best = Some(idx);
            }
        }

        best.unwrap_or_else(|| self.rng.random_range(0..successors.len()))
    }

    /// Temporal-difference update of `Q(state, action)`.
    ///
    /// `next_successors` are the boards the learner can reach from `next_state`;
    /// pass an empty slice when the game is over. Returns the new value.
    pub fn learn(
        &mut self,
        state: &Board,
        action: &Board,
        reward: f64,
        next_state: &Board,
        next_successors: &[Successor],
    ) -> f64 {
        let s = state_key(state);
        let a = state_key(action);
        let next_max = self.next_max(&state_key(next_state), next_successors);

        let current = self.table.get_or_insert(&s, &a, 0.0);
        let mut updated =
            current + self.config.alpha * (reward + self.config.gamma * next_max - current);
        if reward > 0.0 {
            updated *= self.config.positive_reward_boost;
        }
        self.table.set(&s, &a, updated);
        updated
    }

    fn next_max(&self, next_key: &str, next_successors: &[Successor]) -> f64 {
        let Some(known) = self.table.actions(next_key) else {
            return 0.0;
        };
        next_successors
            .iter()
            .filter_map(|succ| {
                let value = *known.get(&state_key(&succ.board))?;
                Some(if succ.is_capture() {
                    value * self.config.capture_multiplier
                } else {
                    value
                })
            })
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
            .unwrap_or(0.0)
    }

    /// Tally a finished game from `side`'s point of view.
    ///
    /// Returns `false` if the game is unfinished or was already recorded.
    pub fn record_game_result(&mut self, summary: &GameSummary, side: Player, total_reward: f64) -> bool {
        let Some(outcome) = summary.outcome else {
            return false;
        };
        if self.stats.last_game_id == Some(summary.game_id) {
            debug!("game {:016x} already recorded", summary.game_id);
            return false;
        }
        self.stats.last_game_id = Some(summary.game_id);
        self.stats.record(
            outcome.result_for(side),
            summary.total_moves,
            summary.elapsed.as_secs_f64(),
            total_reward,
        );
        true
    }

    pub fn stats_snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl Agent for QLearningAgent {
    fn select_successor(
        &mut self,
        board: &Board,
        _player: Player,
        successors: &[Successor],
        training: bool,
    ) -> usize {
        self.pick_successor(board, successors, training)
    }

    fn name(&self) -> &str {
        "Q-Learning"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameOutcome, Piece, Square};
    use std::time::Duration;

    fn greedy_config() -> QLearningConfig {
        QLearningConfig {
            epsilon: 0.0,
            min_epsilon: 0.0,
            ..QLearningConfig::default()
        }
    }

    fn summary(game_id: u64, outcome: GameOutcome) -> GameSummary {
        GameSummary {
            game_id,
            outcome: Some(outcome),
            total_moves: 12,
            elapsed: Duration::from_secs(2),
            white_left: 1,
            red_left: 0,
            white_kings: 0,
            red_kings: 0,
            captured_by_white: 2,
            captured_by_red: 1,
        }
    }

    #[test]
    fn test_learn_steps_toward_reward() {
        let mut agent = QLearningAgent::new(QLearningConfig::default());
        let state = Board::standard();
        let action = state.successors(Player::White)[0].board.clone();

        let q1 = agent.learn(&state, &action, 10.0, &action, &[]);
        assert!((q1 - 1.0).abs() < 1e-12);

        let q2 = agent.learn(&state, &action, -5.0, &action, &[]);
        assert!((q2 - (1.0 + 0.1 * (-5.0 - 1.0))).abs() < 1e-12);
        assert!((agent.q_value(&state, &action) - q2).abs() < 1e-12);
    }

    #[test]
    fn test_positive_reward_boost() {
        let mut agent = QLearningAgent::new(QLearningConfig {
            positive_reward_boost: 1.1,
            ..QLearningConfig::default()
        });
        let state = Board::standard();
        let action = state.successors(Player::White)[0].board.clone();
        let q = agent.learn(&state, &action, 10.0, &action, &[]);
        assert!((q - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_learn_bootstraps_from_known_successors() {
        let mut agent = QLearningAgent::new(QLearningConfig::default());
        let state = Board::standard();
        let action = state.successors(Player::White)[0].board.clone();
        let next_successors = action.successors(Player::White);

        // Unseen next state bootstraps from zero.
        let q = agent.learn(&state, &action, 0.0, &action, &next_successors);
        assert_eq!(q, 0.0);

        agent.learn(&action, &next_successors[0].board, 10.0, &next_successors[0].board, &[]);
        let q = agent.learn(&state, &action, 0.0, &action, &next_successors);
        assert!((q - 0.1 * 0.9 * 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_greedy_prefers_capture() {
        let mut board = Board::empty(4, 4);
        board.place(Piece::new(0, 1, Player::White));
        board.place(Piece::new(1, 2, Player::Red));
        board.place(Piece::new(3, 0, Player::Red));
        let successors = board.successors(Player::White);
        assert!(!successors[0].is_capture());
        assert!(successors[1].is_capture());

        let mut agent = QLearningAgent::new(greedy_config());
        let idx = agent.select_successor(&board, Player::White, &successors, false);
        assert_eq!(idx, 1);
        // The capture was seeded on first sight.
        assert_eq!(agent.q_value(&board, &successors[1].board), 1.0);
        assert_eq!(agent.q_value(&board, &successors[0].board), 0.0);
    }

    #[test]
    fn test_greedy_picks_highest_value() {
        let board = Board::standard();
        let successors = board.successors(Player::White);
        let mut agent = QLearningAgent::new(greedy_config());
        agent.learn(&board, &successors[2].board, 5.0, &successors[2].board, &[]);

        let idx = agent.select_successor(&board, Player::White, &successors, false);
        assert_eq!(successors[idx].mv.to, Square::new(1, 2));
        assert_eq!(successors[idx].mv.from, Square::new(0, 3));
    }

    #[test]
    fn test_ties_go_to_first_successor() {
        let board = Board::standard();
        let successors = board.successors(Player::White);
        let mut agent = QLearningAgent::new(greedy_config());
        assert_eq!(agent.select_successor(&board, Player::White, &successors, true), 0);
    }

    #[test]
    fn test_exploration_favours_captures() {
        let mut board = Board::empty(4, 4);
        board.place(Piece::new(0, 1, Player::White));
        board.place(Piece::new(1, 2, Player::Red));
        board.place(Piece::new(3, 0, Player::Red));
        let successors = board.successors(Player::White);

        let mut agent = QLearningAgent::new(QLearningConfig {
            epsilon: 1.0,
            min_epsilon: 1.0,
            ..QLearningConfig::default()
        })
        .with_seed(5);
        for _ in 0..50 {
            let idx = agent.select_successor(&board, Player::White, &successors, true);
            assert!(successors[idx].is_capture());
        }
    }

    #[test]
    fn test_epsilon_decays_only_while_training() {
        let board = Board::standard();
        let successors = board.successors(Player::White);
        let mut agent = QLearningAgent::new(QLearningConfig {
            epsilon: 0.5,
            epsilon_decay: 0.5,
            min_epsilon: 0.1,
            ..QLearningConfig::default()
        })
        .with_seed(1);

        agent.select_successor(&board, Player::White, &successors, false);
        assert_eq!(agent.epsilon(), 0.5);
        agent.select_successor(&board, Player::White, &successors, true);
        assert_eq!(agent.epsilon(), 0.25);
        for _ in 0..5 {
            agent.select_successor(&board, Player::White, &successors, true);
        }
        assert_eq!(agent.epsilon(), 0.1);
    }

    #[test]
    fn test_record_game_result_once_per_game() {
        let mut agent = QLearningAgent::new(QLearningConfig::default());
        let s = summary(42, GameOutcome::Winner(Player::White));
        assert!(agent.record_game_result(&s, Player::White, 150.0));
        assert!(!agent.record_game_result(&s, Player::White, 150.0));

        let stats = agent.stats();
        assert_eq!(stats.total_games, 1);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.move_history, vec![12]);
        assert_eq!(stats.average_duration_secs, 2.0);
    }

    #[test]
    fn test_record_ignores_unfinished_game() {
        let mut agent = QLearningAgent::new(QLearningConfig::default());
        let mut s = summary(1, GameOutcome::Draw);
        s.outcome = None;
        assert!(!agent.record_game_result(&s, Player::White, 0.0));
        assert_eq!(agent.stats().total_games, 0);
    }

    #[test]
    fn test_stats_snapshot() {
        let mut agent = QLearningAgent::new(QLearningConfig::default());
        agent.record_game_result(&summary(1, GameOutcome::Winner(Player::White)), Player::White, 100.0);
        agent.record_game_result(
            &summary(2, GameOutcome::Blocked { loser: Player::White }),
            Player::White,
            -200.0,
        );
        agent.record_game_result(&summary(3, GameOutcome::Draw), Player::White, 10.0);

        let snap = agent.stats_snapshot();
        assert_eq!(snap.games_played, 3);
        assert_eq!((snap.wins, snap.losses, snap.draws), (1, 1, 1));
        assert!((snap.win_rate - 100.0 / 3.0).abs() < 1e-9);
        assert!((snap.average_reward - (-30.0)).abs() < 1e-9);
        assert_eq!(snap.average_moves, 12.0);
        assert_eq!(snap.recent_rewards, vec![100.0, -200.0, 10.0]);
        assert!(snap.to_string().contains("Games played:     3"));
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = AgentStats::default().snapshot();
        assert_eq!(snap.games_played, 0);
        assert_eq!(snap.win_rate, 0.0);
        assert!(snap.recent_moves.is_empty());
    }

    #[test]
    fn test_qtable_counts() {
        let mut table = QTable::new();
        assert!(table.is_empty());
        table.set("a", "b", 1.0);
        table.set("a", "c", 2.0);
        table.set("d", "b", 3.0);
        assert_eq!(table.num_states(), 2);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("a", "c"), Some(2.0));
        assert_eq!(table.get_or_insert("a", "c", 9.0), 2.0);
        assert_eq!(table.get_or_insert("x", "y", 9.0), 9.0);
        assert_eq!(table.get("z", "y"), None);
    }
}
