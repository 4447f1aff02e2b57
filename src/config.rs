use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::Result;
use crate::opponents::DEFAULT_MAX_STEP;
use crate::passage::DEFAULT_CORPUS;
use crate::session::MAX_OPPONENTS;

/// Slowest opponent movement a config may ask for
pub const MAX_OPPONENT_TICK_MS: u64 = 60_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RaceConfig {
    pub countdown_secs: u32,
    pub opponent_count: usize,
    pub opponent_tick_ms: u64,
    pub max_opponent_step: f64,
    pub player_name: String,
    pub corpus: String,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 10,
            opponent_count: 2,
            opponent_tick_ms: 500,
            max_opponent_step: DEFAULT_MAX_STEP,
            player_name: "You".to_string(),
            corpus: DEFAULT_CORPUS.to_string(),
        }
    }
}

impl RaceConfig {
    /// Pull hand-edited values back into a range the race can run with
    pub fn sanitized(mut self) -> Self {
        self.opponent_count = self.opponent_count.min(MAX_OPPONENTS);
        self.opponent_tick_ms = self.opponent_tick_ms.clamp(1, MAX_OPPONENT_TICK_MS);
        if !self.max_opponent_step.is_finite() || self.max_opponent_step < 0.0 {
            self.max_opponent_step = DEFAULT_MAX_STEP;
        }
        if self.player_name.trim().is_empty() {
            self.player_name = Self::default().player_name;
        }
        self
    }
}

pub trait ConfigStore {
    fn load(&self) -> RaceConfig;
    fn save(&self, cfg: &RaceConfig) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> RaceConfig {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<RaceConfig>(&bytes) {
                Ok(cfg) => cfg.sanitized(),
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), %err, "ignoring unreadable config");
                    RaceConfig::default()
                }
            },
            Err(_) => RaceConfig::default(),
        }
    }

    fn save(&self, cfg: &RaceConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::from)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RaceError;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let cfg = RaceConfig::default();
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nope").join("config.json"));
        assert_eq!(store.load(), RaceConfig::default());
    }

    #[test]
    fn garbage_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"{{{").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), RaceConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "countdown_secs": 3, "player_name": "Ada" }"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.countdown_secs, 3);
        assert_eq!(cfg.player_name, "Ada");
        assert_eq!(cfg.opponent_count, 2);
        assert_eq!(cfg.opponent_tick_ms, 500);
    }

    #[test]
    fn sanitize_clamps_values() {
        let cfg = RaceConfig {
            opponent_count: 40,
            opponent_tick_ms: 0,
            max_opponent_step: -2.0,
            player_name: "  ".into(),
            ..RaceConfig::default()
        }
        .sanitized();

        assert_eq!(cfg.opponent_count, MAX_OPPONENTS);
        assert_eq!(cfg.opponent_tick_ms, 1);
        assert_eq!(cfg.max_opponent_step, DEFAULT_MAX_STEP);
        assert_eq!(cfg.player_name, "You");
    }

    #[test]
    fn huge_tick_period_is_capped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "opponent_tick_ms": 18446744073709551615 }"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.opponent_tick_ms, MAX_OPPONENT_TICK_MS);
    }

    #[test]
    fn save_into_a_file_path_fails_with_io() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();

        let store = FileConfigStore::with_path(blocker.join("config.json"));
        assert_matches!(store.save(&RaceConfig::default()), Err(RaceError::Io(_)));
    }
}
