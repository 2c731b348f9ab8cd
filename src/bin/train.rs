use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use ml_checkers::ai::QLearningAgent;
use ml_checkers::config::AppConfig;
use ml_checkers::game::Player;
use ml_checkers::persistence::LearningStore;
use ml_checkers::training::{OpponentKind, Trainer};

/// Train the checkers Q-learning agent.
#[derive(Parser)]
#[command(name = "train", about = "Train the checkers Q-learning agent")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override number of training episodes
    #[arg(long)]
    episodes: Option<usize>,

    /// Override the training opponent
    #[arg(long, value_enum)]
    opponent: Option<OpponentKind>,

    /// Learn as Red instead of the configured side
    #[arg(long)]
    red: bool,

    /// Start from an empty table instead of the saved one
    #[arg(long)]
    fresh: bool,

    /// Override the exploration rate
    #[arg(long)]
    epsilon: Option<f64>,

    /// Seed every random choice for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Write the default configuration to stdout and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", AppConfig::default_toml()?);
        return Ok(());
    }

    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Apply CLI overrides
    if let Some(episodes) = cli.episodes {
        app_config.training.num_episodes = episodes;
    }
    if let Some(opponent) = cli.opponent {
        app_config.training.opponent = opponent;
    }
    if cli.red {
        app_config.training.agent_side = Player::Red;
    }
    if let Some(epsilon) = cli.epsilon {
        app_config.qlearning.epsilon = epsilon;
        app_config.qlearning.min_epsilon = app_config.qlearning.min_epsilon.min(epsilon);
    }
    if cli.seed.is_some() {
        app_config.training.seed = cli.seed;
    }
    app_config.validate().context("validating overrides")?;

    let store = LearningStore::new(app_config.persistence.clone());
    let mut agent = if cli.fresh {
        info!("starting from an empty table");
        QLearningAgent::new(app_config.qlearning.clone())
    } else {
        store.load_agent(app_config.qlearning.clone())
    };
    if let Some(seed) = cli.seed {
        agent = agent.with_seed(seed);
    }

    let trainer = Trainer::from_app_config(&app_config);
    let metrics = trainer
        .train(&mut agent, &store)
        .context("training the Q-learning agent")?;

    let window = metrics.total_episodes().min(100);
    let report = trainer.evaluate(&mut agent).context("final evaluation")?;
    println!(
        "Trained {} episodes | last {}: win {:.1}% loss {:.1}% draw {:.1}% | eval vs random: {:.1}% ({}W/{}L/{}D)",
        metrics.total_episodes(),
        window,
        metrics.win_rate(window) * 100.0,
        metrics.loss_rate(window) * 100.0,
        metrics.draw_rate(window) * 100.0,
        report.win_rate() * 100.0,
        report.wins,
        report.losses,
        report.draws,
    );
    println!("{}", agent.stats_snapshot());
    Ok(())
}
