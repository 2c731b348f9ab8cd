use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use ml_checkers::ai::MinimaxAgent;
use ml_checkers::config::AppConfig;
use ml_checkers::game::{GameState, Player};
use ml_checkers::persistence::LearningStore;
use ml_checkers::training::{play_match, OpponentKind, Trainer};

/// Pit the Q-learning agent against minimax, optionally training it first.
#[derive(Parser)]
#[command(name = "ml_checkers", about = "Q-learning vs minimax checkers matches")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Train the Q-learning agent before playing the matches
    #[arg(long)]
    train: bool,

    /// Override number of training episodes
    #[arg(long)]
    episodes: Option<usize>,

    /// Number of matches against minimax
    #[arg(long, default_value_t = 10)]
    games: usize,

    /// Override the training opponent
    #[arg(long, value_enum)]
    opponent: Option<OpponentKind>,

    /// Fix the minimax search depth
    #[arg(long)]
    depth: Option<usize>,

    /// Seed every random choice for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Apply CLI overrides
    if let Some(episodes) = cli.episodes {
        app_config.training.num_episodes = episodes;
    }
    if let Some(opponent) = cli.opponent {
        app_config.training.opponent = opponent;
    }
    if let Some(depth) = cli.depth {
        app_config.minimax.min_depth = depth;
        app_config.minimax.max_depth = depth;
    }
    if cli.seed.is_some() {
        app_config.training.seed = cli.seed;
    }
    app_config.validate().context("validating overrides")?;
    if !cli.train && cli.games == 0 {
        bail!("nothing to do: pass --train or a non-zero --games");
    }

    let store = LearningStore::new(app_config.persistence.clone());
    let mut agent = store.load_agent(app_config.qlearning.clone());
    if let Some(seed) = cli.seed {
        agent = agent.with_seed(seed);
    }

    if cli.train {
        let trainer = Trainer::from_app_config(&app_config);
        trainer
            .train(&mut agent, &store)
            .context("training the Q-learning agent")?;
    }

    let mut minimax = match cli.seed {
        Some(seed) => MinimaxAgent::with_seed(&app_config.minimax, seed),
        None => MinimaxAgent::new(&app_config.minimax),
    }
    .with_chain_captures(app_config.rules.chain_captures);

    for game in 0..cli.games {
        let side = if game % 2 == 0 {
            Player::White
        } else {
            Player::Red
        };
        let (summary, total_reward) = play_match(
            GameState::new(app_config.rules.clone()),
            &mut agent,
            &mut minimax,
            side,
            &app_config.reward,
        )
        .with_context(|| format!("playing match {}", game + 1))?;
        agent.record_game_result(&summary, side, total_reward);
        store
            .save_agent(&agent)
            .with_context(|| format!("saving learning state after game {}", game + 1))?;

        let result = summary
            .outcome
            .map(|o| o.result_for(side).name())
            .unwrap_or("unfinished");
        info!(
            "Game {}/{}: Q-learning as {} vs minimax (depth {}) | {} after {} moves | pieces W {} ({}K) R {} ({}K) | {:.2}s",
            game + 1,
            cli.games,
            side.name(),
            minimax.depth(),
            result,
            summary.total_moves,
            summary.white_left,
            summary.white_kings,
            summary.red_left,
            summary.red_kings,
            summary.elapsed.as_secs_f64(),
        );
    }

    println!("{}", agent.stats_snapshot());
    Ok(())
}
