use std::collections::VecDeque;
use std::time::Duration;

use crate::game::MatchResult;

/// Result of a single episode, from the learner's side.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeResult {
    pub result: MatchResult,
    pub game_length: usize,
    pub total_reward: f64,
    pub duration: Duration,
}

/// Training metrics tracker with rolling window computations.
pub struct TrainingMetrics {
    episode_results: VecDeque<EpisodeResult>,
    capacity: usize,
    total_episodes: usize, // lifetime count, never capped
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TrainingMetrics {
            episode_results: VecDeque::with_capacity(capacity),
            capacity,
            total_episodes: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn record_episode(&mut self, result: EpisodeResult) {
        self.total_episodes += 1;
        self.episode_results.push_back(result);
        if self.episode_results.len() > self.capacity {
            self.episode_results.pop_front();
        }
    }

    fn last(&self, last_n: usize) -> impl Iterator<Item = &EpisodeResult> + '_ {
        self.episode_results.iter().rev().take(last_n)
    }

    fn rate(&self, last_n: usize, pred: impl Fn(MatchResult) -> bool) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let hits = self.last(n).filter(|r| pred(r.result)).count();
        hits as f32 / n as f32
    }

    /// Learner win rate (including blocked wins) in the last N episodes.
    pub fn win_rate(&self, last_n: usize) -> f32 {
        self.rate(last_n, MatchResult::is_win)
    }

    pub fn loss_rate(&self, last_n: usize) -> f32 {
        self.rate(last_n, MatchResult::is_loss)
    }

    pub fn draw_rate(&self, last_n: usize) -> f32 {
        self.rate(last_n, |r| r == MatchResult::Draw)
    }

    /// Average game length over the last N episodes.
    pub fn average_game_length(&self, last_n: usize) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let total: usize = self.last(n).map(|r| r.game_length).sum();
        total as f32 / n as f32
    }

    pub fn average_reward(&self, last_n: usize) -> f64 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        self.last(n).map(|r| r.total_reward).sum::<f64>() / n as f64
    }

    /// Mean wall time of the last N episodes in milliseconds.
    pub fn average_episode_ms(&self, last_n: usize) -> f64 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        self.last(n)
            .map(|r| r.duration.as_secs_f64() * 1000.0)
            .sum::<f64>()
            / n as f64
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}
