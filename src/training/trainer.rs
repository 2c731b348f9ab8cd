use std::time::Instant;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::ai::{Agent, MinimaxAgent, MinimaxConfig, QLearningAgent, RandomAgent, RewardConfig};
use crate::config::AppConfig;
use crate::error::TrainingError;
use crate::game::{Player, RulesConfig};
use crate::persistence::LearningStore;
use crate::training::episode::{evaluate, play_training_episode, EvalReport, OpponentKind};
use crate::training::metrics::TrainingMetrics;

/// Trainer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub num_episodes: usize,
    pub log_interval: usize,
    pub eval_interval: usize,
    pub eval_games: usize,
    pub opponent: OpponentKind,
    pub agent_side: Player,
    /// Persist the learning state every N completed games.
    pub save_interval: usize,
    /// Seeds the opponents for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            num_episodes: 1000,
            log_interval: 100,
            eval_interval: 500,
            eval_games: 50,
            opponent: OpponentKind::SelfPlay,
            agent_side: Player::White,
            save_interval: 1,
            seed: None,
        }
    }
}

/// Runs Q-learning episodes and keeps the learning state on disk up to date.
pub struct Trainer {
    config: TrainerConfig,
    rules: RulesConfig,
    reward: RewardConfig,
    minimax: MinimaxConfig,
}

impl Trainer {
    pub fn new(
        config: TrainerConfig,
        rules: RulesConfig,
        reward: RewardConfig,
        minimax: MinimaxConfig,
    ) -> Self {
        Trainer {
            config,
            rules,
            reward,
            minimax,
        }
    }

    pub fn from_app_config(app: &AppConfig) -> Self {
        Self::new(
            app.training.clone(),
            app.rules.clone(),
            app.reward.clone(),
            app.minimax.clone(),
        )
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    fn random_agent(&self, offset: u64) -> RandomAgent {
        match self.config.seed {
            Some(seed) => RandomAgent::with_seed(seed.wrapping_add(offset)),
            None => RandomAgent::new(),
        }
    }

    fn opponent(&self) -> Option<Box<dyn Agent>> {
        match self.config.opponent {
            OpponentKind::SelfPlay => None,
            OpponentKind::Random => Some(Box::new(self.random_agent(0))),
            OpponentKind::Minimax => {
                let minimax = match self.config.seed {
                    Some(seed) => MinimaxAgent::with_seed(&self.minimax, seed),
                    None => MinimaxAgent::new(&self.minimax),
                };
                Some(Box::new(
                    minimax.with_chain_captures(self.rules.chain_captures),
                ))
            }
        }
    }

    /// Run the full training loop.
    pub fn train(
        &self,
        agent: &mut QLearningAgent,
        store: &LearningStore,
    ) -> Result<TrainingMetrics, TrainingError> {
        let mut metrics = TrainingMetrics::new();
        let mut opponent = self.opponent();
        let side = self.config.agent_side;
        let start = Instant::now();
        let start_games = agent.stats().total_games;

        info!(
            "Starting Q-learning for {} episodes as {} vs {:?} (games so far: {}, table states: {})",
            self.config.num_episodes,
            side.name(),
            self.config.opponent,
            start_games,
            agent.table().num_states()
        );

        for episode in 1..=self.config.num_episodes {
            let trace = play_training_episode(
                agent,
                opponent.as_deref_mut(),
                side,
                &self.rules,
                &self.reward,
            )?;
            if !agent.record_game_result(&trace.summary, side, trace.result.total_reward) {
                warn!("episode {episode} was not recorded");
            }
            metrics.record_episode(trace.result);

            if self.config.save_interval > 0 && episode % self.config.save_interval == 0 {
                store.save_agent(agent)?;
            }

            if self.config.log_interval > 0 && episode % self.config.log_interval == 0 {
                let window = self.config.log_interval;
                info!(
                    "Episode {}/{} | eps: {:.4} | win({}): {:.1}% | loss: {:.1}% | draw: {:.1}% | avg_len: {:.1} | avg_reward: {:.1} | {:.2} ms/ep | states: {}",
                    episode,
                    self.config.num_episodes,
                    agent.epsilon(),
                    window,
                    metrics.win_rate(window) * 100.0,
                    metrics.loss_rate(window) * 100.0,
                    metrics.draw_rate(window) * 100.0,
                    metrics.average_game_length(window),
                    metrics.average_reward(window),
                    metrics.average_episode_ms(window),
                    agent.table().num_states(),
                );
            }

            if self.config.eval_interval > 0 && episode % self.config.eval_interval == 0 {
                let report = self.evaluate(agent)?;
                info!(
                    "  >> Eval vs Random ({} games): {:.1}% win rate ({}W/{}L/{}D)",
                    report.games,
                    report.win_rate() * 100.0,
                    report.wins,
                    report.losses,
                    report.draws
                );
            }
        }

        store.save_agent(agent)?;
        info!(
            "Training complete: {} episodes in {:.1}s, {} games recorded in total",
            metrics.total_episodes(),
            start.elapsed().as_secs_f64(),
            agent.stats().total_games
        );

        Ok(metrics)
    }

    /// Greedy evaluation against a random opponent, alternating sides.
    pub fn evaluate(&self, agent: &mut QLearningAgent) -> Result<EvalReport, TrainingError> {
        let mut random = self.random_agent(1);
        evaluate(agent, &mut random, self.config.eval_games, &self.rules)
    }
}
