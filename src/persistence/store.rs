use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::document::{Document, Header, SCHEMA_VERSION};
use crate::ai::{AgentStats, QLearningAgent, QLearningConfig, QTable};
use crate::error::PersistenceError;

/// Where the learning state lives.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub dir: PathBuf,
    pub q_table_file: String,
    pub stats_file: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        PersistenceConfig {
            dir: PathBuf::from("learning"),
            q_table_file: "q_table.json".to_string(),
            stats_file: "stats.json".to_string(),
        }
    }
}

/// Reads and rewrites the Q-table and agent statistics as whole JSON files.
pub struct LearningStore {
    config: PersistenceConfig,
}

impl LearningStore {
    pub fn new(config: PersistenceConfig) -> Self {
        LearningStore { config }
    }

    pub fn q_table_path(&self) -> PathBuf {
        self.config.dir.join(&self.config.q_table_file)
    }

    pub fn stats_path(&self) -> PathBuf {
        self.config.dir.join(&self.config.stats_file)
    }

    /// Durably replace both files.
    pub fn save(&self, table: &QTable, stats: &AgentStats) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.config.dir)?;
        let saved_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        write_json(&self.q_table_path(), &Document::new(table, saved_at))?;
        write_json(&self.stats_path(), &Document::new(stats, saved_at))?;
        Ok(())
    }

    pub fn save_agent(&self, agent: &QLearningAgent) -> Result<(), PersistenceError> {
        self.save(agent.table(), agent.stats())
    }

    /// `Ok(None)` when the file does not exist yet.
    pub fn try_load_table(&self) -> Result<Option<QTable>, PersistenceError> {
        read_json(&self.q_table_path())
    }

    pub fn try_load_stats(&self) -> Result<Option<AgentStats>, PersistenceError> {
        read_json(&self.stats_path())
    }

    /// Load both files. Anything missing starts empty; if either file is
    /// unreadable both are discarded, so the table and statistics always agree.
    pub fn load(&self) -> (QTable, AgentStats) {
        let loaded = self
            .try_load_table()
            .and_then(|table| Ok((table, self.try_load_stats()?)));
        let (table, stats) = match loaded {
            Ok(pair) => pair,
            Err(e) => {
                warn!("ignoring learning state in {}: {e}", self.config.dir.display());
                return (QTable::default(), AgentStats::default());
            }
        };

        let table = table.unwrap_or_else(|| {
            info!("{} not found, starting fresh", self.q_table_path().display());
            QTable::default()
        });
        let stats = stats.unwrap_or_else(|| {
            info!("{} not found, starting fresh", self.stats_path().display());
            AgentStats::default()
        });
        if !table.is_empty() {
            info!(
                "loaded {} states ({} entries) from {}",
                table.num_states(),
                table.len(),
                self.q_table_path().display()
            );
        }
        (table, stats)
    }

    /// Construct an agent resumed from whatever state is on disk.
    pub fn load_agent(&self, config: QLearningConfig) -> QLearningAgent {
        let (table, stats) = self.load();
        QLearningAgent::with_state(config, table, stats)
    }
}

fn write_json<T: Serialize>(path: &Path, doc: &Document<T>) -> Result<(), PersistenceError> {
    let tmp = path.with_extension("json.tmp");
    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer(&mut writer, doc)?;
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PersistenceError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(PersistenceError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    let parse_err = |source: serde_json::Error| PersistenceError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let header: Header = serde_json::from_str(&text).map_err(parse_err)?;
    if header.schema_version != SCHEMA_VERSION {
        return Err(PersistenceError::SchemaVersion {
            path: path.to_path_buf(),
            found: header.schema_version,
            expected: SCHEMA_VERSION,
        });
    }
    let doc: Document<T> = serde_json::from_str(&text).map_err(parse_err)?;
    Ok(Some(doc.data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::MatchResult;

    fn store_in(dir: &Path) -> LearningStore {
        LearningStore::new(PersistenceConfig {
            dir: dir.join("learning"),
            ..PersistenceConfig::default()
        })
    }

    fn sample() -> (QTable, AgentStats) {
        let mut table = QTable::new();
        table.set("0,1N", "1N,0", 0.5);
        table.set("0,1N", "0,0", -1.25);
        let mut stats = AgentStats::default();
        stats.record(MatchResult::Win, 9, 1.5, 220.0);
        stats.record(MatchResult::Draw, 64, 3.0, -40.0);
        stats.last_game_id = Some(77);
        (table, stats)
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        let (table, stats) = sample();

        store.save(&table, &stats).unwrap();
        let (loaded_table, loaded_stats) = store.load();
        assert_eq!(loaded_table, table);
        assert_eq!(loaded_stats, stats);
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        let (table, stats) = sample();
        store.save(&table, &stats).unwrap();
        store.save(&table, &stats).unwrap();

        let mut names: Vec<String> = fs::read_dir(tmp.path().join("learning"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["q_table.json", "stats.json"]);
    }

    #[test]
    fn test_files_carry_schema_version() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        let (table, stats) = sample();
        store.save(&table, &stats).unwrap();

        let raw = fs::read_to_string(store.stats_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["schema_version"], 1);
        assert_eq!(value["data"]["wins"], 1);
    }

    #[test]
    fn test_missing_files_start_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        assert!(store.try_load_table().unwrap().is_none());
        let (table, stats) = store.load();
        assert!(table.is_empty());
        assert_eq!(stats, AgentStats::default());
    }

    #[test]
    fn test_corrupt_file_falls_back_to_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        let (table, stats) = sample();
        store.save(&table, &stats).unwrap();
        fs::write(store.q_table_path(), "{ not json").unwrap();

        assert!(matches!(
            store.try_load_table(),
            Err(PersistenceError::Parse { .. })
        ));
        let (loaded_table, loaded_stats) = store.load();
        assert!(loaded_table.is_empty());
        assert_eq!(loaded_stats, AgentStats::default());
    }

    #[test]
    fn test_corrupt_stats_discard_good_table() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        let (table, mut stats) = sample();
        for _ in 0..500 {
            stats.record(MatchResult::Win, 10, 1.0, 100.0);
        }
        store.save(&table, &stats).unwrap();
        fs::write(store.stats_path(), "garbage").unwrap();

        let (loaded_table, loaded_stats) = store.load();
        assert!(loaded_table.is_empty());
        assert_eq!(loaded_stats.total_games, 0);

        let agent = store.load_agent(QLearningConfig::default());
        assert!(agent.table().is_empty());
        assert_eq!(agent.stats().wins, 0);
    }

    #[test]
    fn test_missing_stats_keep_table() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        let (table, stats) = sample();
        store.save(&table, &stats).unwrap();
        fs::remove_file(store.stats_path()).unwrap();

        let (loaded_table, loaded_stats) = store.load();
        assert_eq!(loaded_table, table);
        assert_eq!(loaded_stats, AgentStats::default());
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        fs::create_dir_all(tmp.path().join("learning")).unwrap();
        fs::write(
            store.stats_path(),
            r#"{"schema_version": 2, "saved_at": 0, "data": {}}"#,
        )
        .unwrap();

        assert!(matches!(
            store.try_load_stats(),
            Err(PersistenceError::SchemaVersion { found: 2, expected: 1, .. })
        ));
        assert_eq!(store.load().1, AgentStats::default());
    }

    #[test]
    fn test_load_agent_resumes_state() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        let (table, stats) = sample();
        store.save(&table, &stats).unwrap();

        let agent = store.load_agent(QLearningConfig::default());
        assert_eq!(agent.table().len(), 2);
        assert_eq!(agent.stats().total_games, 2);
        assert_eq!(agent.stats_snapshot().draws, 1);
    }
}
