use std::time::Instant;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::ai::{calc_reward, Agent, QLearningAgent, RewardConfig, RewardContext};
use crate::error::TrainingError;
use crate::game::{Board, GameState, GameSummary, MatchResult, Player, RulesConfig, Successor};
use crate::training::metrics::EpisodeResult;

/// Who the learner plays against during training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OpponentKind {
    /// The learner plays both sides and shares one table.
    #[serde(rename = "self")]
    #[value(name = "self")]
    SelfPlay,
    Random,
    Minimax,
}

/// Result of playing a single training episode.
pub struct EpisodeTrace {
    pub summary: GameSummary,
    pub result: EpisodeResult,
    /// Number of table updates made.
    pub updates: usize,
}

/// A learner move whose reward is not known until it is next to move.
struct Pending {
    state: Board,
    action: Board,
    captured: bool,
}

/// Play one training episode.
///
/// With `opponent == None` the learner plays both sides; otherwise it plays
/// `learner_side` and only its own moves are learned.
pub fn play_training_episode(
    learner: &mut QLearningAgent,
    mut opponent: Option<&mut (dyn Agent + '_)>,
    learner_side: Player,
    rules: &RulesConfig,
    reward: &RewardConfig,
) -> Result<EpisodeTrace, TrainingError> {
    let started = Instant::now();
    let mut state = GameState::new(rules.clone());
    let mut pending: [Option<Pending>; 2] = [None, None];
    let mut total_reward = 0.0;
    let mut updates = 0;

    learner.new_game();
    if let Some(op) = opponent.as_deref_mut() {
        op.new_game();
    }

    while !state.is_terminal() {
        let player = state.turn();
        let learns = opponent.is_none() || player == learner_side;
        let mut successors = state.candidate_successors();

        if learns {
            if let Some(p) = pending[player.idx()].take() {
                let ctx = RewardContext {
                    captured: p.captured,
                    moves_without_capture: state.moves_without_capture(),
                    outcome: None,
                };
                let r = calc_reward(state.board(), player, &ctx, reward);
                learner.learn(&p.state, &p.action, r, state.board(), &successors);
                updates += 1;
                if player == learner_side {
                    total_reward += r;
                }
            }
        }

        let idx = match opponent.as_deref_mut() {
            Some(op) if !learns => op.select_successor(state.board(), player, &successors, true),
            _ => learner.select_successor(state.board(), player, &successors, true),
        };
        let chosen = take_successor(&mut successors, idx)?;

        if learns {
            pending[player.idx()] = Some(Pending {
                state: state.board().clone(),
                action: chosen.board.clone(),
                captured: chosen.is_capture(),
            });
        }
        state.commit(chosen);
    }

    let outcome = state.outcome().ok_or(TrainingError::MissingOutcome)?;
    for side in [Player::White, Player::Red] {
        if let Some(p) = pending[side.idx()].take() {
            let ctx = RewardContext {
                captured: p.captured,
                moves_without_capture: state.moves_without_capture(),
                outcome: Some(outcome),
            };
            let r = calc_reward(state.board(), side, &ctx, reward);
            learner.learn(&p.state, &p.action, r, state.board(), &[]);
            updates += 1;
            if side == learner_side {
                total_reward += r;
            }
        }
    }

    let summary = state.summary();
    debug!(
        "episode finished: {:?} after {} moves, reward {:.1}",
        outcome, summary.total_moves, total_reward
    );

    Ok(EpisodeTrace {
        result: EpisodeResult {
            result: outcome.result_for(learner_side),
            game_length: summary.total_moves,
            total_reward,
            duration: started.elapsed(),
        },
        summary,
        updates,
    })
}

/// Play a single evaluation game between two agents, neither exploring.
pub fn play_eval_game(
    agent: &mut dyn Agent,
    opponent: &mut dyn Agent,
    agent_side: Player,
    rules: &RulesConfig,
) -> Result<GameSummary, TrainingError> {
    let mut state = GameState::new(rules.clone());
    agent.new_game();
    opponent.new_game();

    while !state.is_terminal() {
        let player = state.turn();
        let mut successors = state.candidate_successors();
        let idx = if player == agent_side {
            agent.select_successor(state.board(), player, &successors, false)
        } else {
            opponent.select_successor(state.board(), player, &successors, false)
        };
        state.commit(take_successor(&mut successors, idx)?);
    }

    if state.outcome().is_none() {
        return Err(TrainingError::MissingOutcome);
    }
    Ok(state.summary())
}

/// Play a greedy game from `state` through the controller, scoring `agent`'s
/// moves the same way a training episode does. Returns the summary and the
/// summed shaped reward.
pub fn play_match(
    mut state: GameState,
    agent: &mut dyn Agent,
    opponent: &mut dyn Agent,
    agent_side: Player,
    reward: &RewardConfig,
) -> Result<(GameSummary, f64), TrainingError> {
    agent.new_game();
    opponent.new_game();
    // Whether the agent's last move captured, until its reward is known.
    let mut pending: Option<bool> = None;
    let mut total_reward = 0.0;

    while !state.is_terminal() {
        let player = state.turn();
        let event = if player == agent_side {
            if let Some(captured) = pending.take() {
                let ctx = RewardContext {
                    captured,
                    moves_without_capture: state.moves_without_capture(),
                    outcome: None,
                };
                total_reward += calc_reward(state.board(), agent_side, &ctx, reward);
            }
            state.request_computer_move(agent, false)
        } else {
            state.request_computer_move(opponent, false)
        };
        let Some(event) = event else {
            break;
        };
        if event.player == agent_side {
            pending = Some(event.is_capture());
        }
    }

    let outcome = state.outcome().ok_or(TrainingError::MissingOutcome)?;
    if let Some(captured) = pending {
        let ctx = RewardContext {
            captured,
            moves_without_capture: state.moves_without_capture(),
            outcome: Some(outcome),
        };
        total_reward += calc_reward(state.board(), agent_side, &ctx, reward);
    }
    Ok((state.summary(), total_reward))
}

/// Tally of a batch of evaluation games.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalReport {
    pub games: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
}

impl EvalReport {
    pub fn record(&mut self, result: MatchResult) {
        self.games += 1;
        if result.is_win() {
            self.wins += 1;
        } else if result.is_loss() {
            self.losses += 1;
        } else {
            self.draws += 1;
        }
    }

    pub fn win_rate(&self) -> f32 {
        if self.games == 0 {
            return 0.0;
        }
        self.wins as f32 / self.games as f32
    }
}

/// Evaluate `agent` against `opponent` over N games, alternating sides.
pub fn evaluate(
    agent: &mut dyn Agent,
    opponent: &mut dyn Agent,
    eval_games: usize,
    rules: &RulesConfig,
) -> Result<EvalReport, TrainingError> {
    let mut report = EvalReport::default();
    for game_idx in 0..eval_games {
        let side = if game_idx % 2 == 0 {
            Player::White
        } else {
            Player::Red
        };
        let summary = play_eval_game(agent, opponent, side, rules)?;
        let outcome = summary.outcome.ok_or(TrainingError::MissingOutcome)?;
        report.record(outcome.result_for(side));
    }
    Ok(report)
}

fn take_successor(successors: &mut Vec<Successor>, idx: usize) -> Result<Successor, TrainingError> {
    if idx >= successors.len() {
        return Err(TrainingError::IllegalChoice {
            index: idx,
            available: successors.len(),
        });
    }
    Ok(successors.swap_remove(idx))
}
