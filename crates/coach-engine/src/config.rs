//! Configuration file loading for the coach.
//!
//! Settings live in `coach.toml`. Every field has a default, so an empty or
//! missing file yields a working configuration that runs `stockfish` from `PATH`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use uci::SearchLimit;

use crate::difficulty::SearchBudget;

/// Environment variable that overrides the configured engine path.
pub const ENGINE_PATH_ENV: &str = "COACH_ENGINE_PATH";

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// A value was syntactically valid but unusable.
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// What a session does when the defensive search deadline expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchTimeoutPolicy {
    /// Fail the session with a search timeout.
    #[default]
    Fail,
    /// Stop the search and return the lines collected so far.
    ReturnPartial,
}

/// How to launch and supervise the engine process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to the UCI engine executable.
    /// Defaults to "stockfish" (assumes it's in PATH).
    #[serde(default = "default_engine_path")]
    pub path: PathBuf,
    /// Extra command-line arguments for the engine.
    #[serde(default)]
    pub args: Vec<String>,
    /// Bound on each handshake acknowledgement wait.
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
    /// Search deadline as a multiple of the move time budget.
    /// `0` disables the deadline: the search then ends only on `bestmove`.
    #[serde(default = "default_search_timeout_factor")]
    pub search_timeout_factor: u32,
    /// Lower bound for the search deadline.
    #[serde(default = "default_min_search_timeout_ms")]
    pub min_search_timeout_ms: u64,
    /// Behaviour when the search deadline expires.
    #[serde(default)]
    pub on_search_timeout: SearchTimeoutPolicy,
}

fn default_engine_path() -> PathBuf {
    PathBuf::from("stockfish")
}

fn default_handshake_timeout_ms() -> u64 {
    5_000
}

fn default_search_timeout_factor() -> u32 {
    10
}

fn default_min_search_timeout_ms() -> u64 {
    2_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: default_engine_path(),
            args: Vec::new(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            search_timeout_factor: default_search_timeout_factor(),
            min_search_timeout_ms: default_min_search_timeout_ms(),
            on_search_timeout: SearchTimeoutPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Config for an engine at `path` with all other settings defaulted.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    /// Deadline for a search under `budget`, if enabled.
    ///
    /// Depth-limited searches have no time limit of their own, so the
    /// budget's `movetime_ms` serves as the time scale for both kinds.
    pub fn search_deadline(&self, budget: &SearchBudget) -> Option<Duration> {
        if self.search_timeout_factor == 0 {
            return None;
        }
        let scale = match budget.limit() {
            SearchLimit::MoveTime(ms) => ms,
            SearchLimit::Depth(_) => budget.movetime_ms,
        };
        let scaled = scale.saturating_mul(u64::from(self.search_timeout_factor));
        Some(Duration::from_millis(scaled.max(self.min_search_timeout_ms)))
    }
}

/// Main coach configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoachConfig {
    /// Cap on simultaneously running sessions. Unbounded when absent.
    #[serde(default)]
    pub max_concurrent_sessions: Option<usize>,
    /// Engine process settings.
    #[serde(default)]
    pub engine: EngineConfig,
}

impl CoachConfig {
    /// Loads the configuration from [`Self::config_path()`].
    ///
    /// Returns the default configuration if the file does not exist. The engine
    /// path can be overridden through [`ENGINE_PATH_ENV`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
    /// [`ConfigError::ParseError`] on invalid TOML and [`ConfigError::Invalid`]
    /// for unusable values.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(Self::config_path())?;
        if let Some(path) = std::env::var_os(ENGINE_PATH_ENV) {
            config.engine.path = PathBuf::from(path);
        }
        Ok(config)
    }

    /// Loads the configuration from an explicit path, defaulting when missing.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the path to the configuration file.
    ///
    /// Currently returns `coach.toml` in the current working directory.
    pub fn config_path() -> PathBuf {
        PathBuf::from("coach.toml")
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.handshake_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "engine.handshake_timeout_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.max_concurrent_sessions == Some(0) {
            return Err(ConfigError::Invalid {
                field: "max_concurrent_sessions",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::resolve_profile;
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
max_concurrent_sessions = 4

[engine]
path = "/usr/games/stockfish"
args = ["--threads", "1"]
handshake_timeout_ms = 2500
search_timeout_factor = 20
min_search_timeout_ms = 500
on_search_timeout = "return_partial"
"#;

        let config: CoachConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.max_concurrent_sessions, Some(4));
        assert_eq!(config.engine.path, PathBuf::from("/usr/games/stockfish"));
        assert_eq!(config.engine.args, vec!["--threads", "1"]);
        assert_eq!(config.engine.handshake_timeout(), Duration::from_millis(2500));
        assert_eq!(config.engine.search_timeout_factor, 20);
        assert_eq!(config.engine.on_search_timeout, SearchTimeoutPolicy::ReturnPartial);
    }

    #[test]
    fn test_empty_config_defaults() {
        let config: CoachConfig = toml::from_str("").unwrap();

        assert_eq!(config, CoachConfig::default());
        assert_eq!(config.engine.path, PathBuf::from("stockfish"));
        assert_eq!(config.engine.handshake_timeout_ms, 5000);
        assert_eq!(config.engine.search_timeout_factor, 10);
        assert_eq!(config.engine.on_search_timeout, SearchTimeoutPolicy::Fail);
        assert_eq!(config.max_concurrent_sessions, None);
    }

    fn movetime(ms: u64) -> SearchBudget {
        SearchBudget {
            movetime_ms: ms,
            depth: None,
        }
    }

    #[test]
    fn test_search_deadline_scales_with_budget() {
        let engine = EngineConfig::default();
        assert_eq!(
            engine.search_deadline(&movetime(400)),
            Some(Duration::from_millis(4000))
        );
        // Small budgets are raised to the floor.
        assert_eq!(
            engine.search_deadline(&movetime(50)),
            Some(Duration::from_millis(2000))
        );
    }

    #[test]
    fn test_depth_limited_search_deadline_uses_movetime_scale() {
        let engine = EngineConfig::default();
        let profile = resolve_profile(2000);
        assert!(matches!(profile.budget.limit(), SearchLimit::Depth(14)));
        assert_eq!(
            engine.search_deadline(&profile.budget),
            Some(Duration::from_millis(4000))
        );
        assert_eq!(
            engine.search_deadline(&resolve_profile(400).budget),
            Some(Duration::from_millis(2000))
        );
    }

    #[test]
    fn test_search_deadline_can_be_disabled() {
        let engine = EngineConfig {
            search_timeout_factor: 0,
            ..EngineConfig::default()
        };
        assert_eq!(engine.search_deadline(&movetime(400)), None);
        assert_eq!(engine.search_deadline(&resolve_profile(1600).budget), None);
    }

    #[test]
    fn test_load_from_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoachConfig::load_from(dir.path().join("coach.toml")).unwrap();
        assert_eq!(config, CoachConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\npath = \"/opt/engines/sf\"").unwrap();

        let config = CoachConfig::load_from(file.path()).unwrap();
        assert_eq!(config.engine.path, PathBuf::from("/opt/engines/sf"));
        assert_eq!(config.engine.handshake_timeout_ms, 5000);
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[engine\npath = ").unwrap();

        match CoachConfig::load_from(file.path()) {
            Err(ConfigError::ParseError(_)) => {}
            other => panic!("Expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_load_rejects_zero_concurrency() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_concurrent_sessions = 0").unwrap();

        match CoachConfig::load_from(file.path()) {
            Err(ConfigError::Invalid { field, .. }) => {
                assert_eq!(field, "max_concurrent_sessions");
            }
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_config_path_returns_expected_path() {
        assert_eq!(CoachConfig::config_path(), PathBuf::from("coach.toml"));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = CoachConfig {
            engine: EngineConfig::with_path("/usr/bin/stockfish"),
            max_concurrent_sessions: Some(8),
        };

        let serialized = toml::to_string(&config).unwrap();
        let deserialized: CoachConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(deserialized, config);
    }
}
