use std::path::Path;

use log::warn;

use crate::ai::{MinimaxConfig, QLearningConfig, RewardConfig};
use crate::error::ConfigError;
use crate::game::RulesConfig;
use crate::persistence::PersistenceConfig;
use crate::training::trainer::TrainerConfig;

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rules: RulesConfig,
    pub minimax: MinimaxConfig,
    pub qlearning: QLearningConfig,
    pub reward: RewardConfig,
    pub training: TrainerConfig,
    pub persistence: PersistenceConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rules = &self.rules;
        if rules.rows < 3 || rules.cols < 2 {
            return Err(ConfigError::Validation(
                "rules.rows must be >= 3 and rules.cols >= 2".into(),
            ));
        }
        if rules.home_rows == 0 || 2 * rules.home_rows >= rules.rows {
            return Err(ConfigError::Validation(
                "rules.home_rows must be > 0 and leave an empty middle row".into(),
            ));
        }
        if rules.no_capture_limit == 0 {
            return Err(ConfigError::Validation(
                "rules.no_capture_limit must be > 0".into(),
            ));
        }

        let mm = &self.minimax;
        if mm.min_depth == 0 {
            return Err(ConfigError::Validation(
                "minimax.min_depth must be >= 1".into(),
            ));
        }
        if mm.min_depth > mm.max_depth {
            return Err(ConfigError::Validation(
                "minimax.min_depth must be <= minimax.max_depth".into(),
            ));
        }
        if mm.win_score <= 0.0 {
            return Err(ConfigError::Validation(
                "minimax.win_score must be > 0".into(),
            ));
        }

        let q = &self.qlearning;
        if q.alpha <= 0.0 || q.alpha > 1.0 {
            return Err(ConfigError::Validation(
                "qlearning.alpha must be in (0, 1]".into(),
            ));
        }
        if q.gamma < 0.0 || q.gamma > 1.0 {
            return Err(ConfigError::Validation(
                "qlearning.gamma must be in [0, 1]".into(),
            ));
        }
        if q.epsilon < 0.0 || q.epsilon > 1.0 {
            return Err(ConfigError::Validation(
                "qlearning.epsilon must be in [0, 1]".into(),
            ));
        }
        if q.min_epsilon < 0.0 || q.min_epsilon > q.epsilon {
            return Err(ConfigError::Validation(
                "qlearning.min_epsilon must be in [0, qlearning.epsilon]".into(),
            ));
        }
        if q.epsilon_decay <= 0.0 || q.epsilon_decay > 1.0 {
            return Err(ConfigError::Validation(
                "qlearning.epsilon_decay must be in (0, 1]".into(),
            ));
        }
        if q.capture_multiplier <= 0.0 || q.positive_reward_boost <= 0.0 {
            return Err(ConfigError::Validation(
                "qlearning multipliers must be > 0".into(),
            ));
        }

        if self.training.num_episodes == 0 {
            return Err(ConfigError::Validation(
                "training.num_episodes must be > 0".into(),
            ));
        }
        if self.training.log_interval == 0 {
            return Err(ConfigError::Validation(
                "training.log_interval must be > 0".into(),
            ));
        }

        if self.persistence.q_table_file.is_empty() || self.persistence.stats_file.is_empty() {
            return Err(ConfigError::Validation(
                "persistence file names must not be empty".into(),
            ));
        }
        if self.persistence.q_table_file == self.persistence.stats_file {
            return Err(ConfigError::Validation(
                "persistence.q_table_file and persistence.stats_file must differ".into(),
            ));
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> Result<String, ConfigError> {
        toml::to_string_pretty(&AppConfig::default())
            .map_err(|e| ConfigError::Validation(format!("cannot serialize defaults: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Player;
    use crate::training::OpponentKind;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        config.validate().expect("default config should be valid");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
[qlearning]
alpha = 0.25
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert!((config.qlearning.alpha - 0.25).abs() < 1e-9);
        // Other fields should be defaults
        assert!((config.qlearning.gamma - 0.9).abs() < 1e-9);
        assert_eq!(config.rules.no_capture_limit, 64);
        assert_eq!(config.training.num_episodes, 1000);
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_training_section_parses_enums() {
        let toml_str = r#"
[training]
opponent = "minimax"
agent_side = "red"
seed = 7
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.training.opponent, OpponentKind::Minimax);
        assert_eq!(config.training.agent_side, Player::Red);
        assert_eq!(config.training.seed, Some(7));
    }

    #[test]
    fn test_validation_rejects_zero_episodes() {
        let mut config = AppConfig::default();
        config.training.num_episodes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_alpha_out_of_range() {
        let mut config = AppConfig::default();
        config.qlearning.alpha = 0.0;
        assert!(config.validate().is_err());
        config.qlearning.alpha = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_invalid_gamma() {
        let mut config = AppConfig::default();
        config.qlearning.gamma = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_min_epsilon_above_epsilon() {
        let mut config = AppConfig::default();
        config.qlearning.epsilon = 0.05;
        config.qlearning.min_epsilon = 0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_inverted_depths() {
        let mut config = AppConfig::default();
        config.minimax.min_depth = 3;
        config.minimax.max_depth = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_depth() {
        let mut config = AppConfig::default();
        config.minimax.min_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_crowded_board() {
        let mut config = AppConfig::default();
        config.rules.home_rows = 2;
        assert!(config.validate().is_err());
        config.rules.rows = 6;
        config.rules.cols = 6;
        config.validate().expect("6x6 with two home rows is valid");
    }

    #[test]
    fn test_validation_rejects_zero_no_capture_limit() {
        let mut config = AppConfig::default();
        config.rules.no_capture_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_shared_persistence_file() {
        let mut config = AppConfig::default();
        config.persistence.stats_file = config.persistence.q_table_file.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = AppConfig::load_or_default(Path::new("nonexistent_config.toml")).unwrap();
        assert_eq!(config.training.num_episodes, 1000);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
[training]
num_episodes = 500

[rules]
chain_captures = true
"#
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.training.num_episodes, 500);
        assert!(config.rules.chain_captures);
        // Others are defaults
        assert!((config.qlearning.alpha - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[qlearning]\ngamma = 2.0\n").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Validation(_))
        ));

        std::fs::write(&path, "[qlearning\n").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_default_toml_roundtrips() {
        let toml_str = AppConfig::default_toml().unwrap();
        let config: AppConfig = toml::from_str(&toml_str).unwrap();
        config.validate().expect("roundtripped config should be valid");
        assert_eq!(config, AppConfig::default());
    }
}
