//! Application-level configuration loading for timer and session defaults.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TRIVIA_LIVE_CONFIG_PATH";

/// Round timer poll granularity when the config does not override it.
const DEFAULT_ROUND_TICK_MS: u64 = 500;
/// Countdown applied to new session definitions when unspecified.
const DEFAULT_SECONDS_PER_QUESTION: u32 = 30;
/// Leaderboard cap applied when a definition carries a malformed value.
const DEFAULT_LEADERBOARD_MAX: u32 = 1000;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    round_tick: Duration,
    default_seconds_per_question: u32,
    fallback_leaderboard_max: u32,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        round_tick_ms = app_config.round_tick.as_millis() as u64,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Poll interval of the authoritative round timer.
    pub fn round_tick(&self) -> Duration {
        self.round_tick
    }

    /// Countdown duration applied to session definitions created without one.
    pub fn default_seconds_per_question(&self) -> u32 {
        self.default_seconds_per_question
    }

    /// Leaderboard cap substituted for malformed or out-of-range values.
    pub fn fallback_leaderboard_max(&self) -> u32 {
        self.fallback_leaderboard_max
    }

    /// Configuration with a fast timer tick so round-close tests do not wait
    /// on the production poll interval.
    #[cfg(test)]
    pub fn for_tests(round_tick: Duration) -> Self {
        Self {
            round_tick,
            ..Self::default()
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            round_tick: Duration::from_millis(DEFAULT_ROUND_TICK_MS),
            default_seconds_per_question: DEFAULT_SECONDS_PER_QUESTION,
            fallback_leaderboard_max: DEFAULT_LEADERBOARD_MAX,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    round_tick_ms: Option<u64>,
    default_seconds_per_question: Option<u32>,
    fallback_leaderboard_max: Option<u32>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            round_tick: value
                .round_tick_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.round_tick),
            default_seconds_per_question: value
                .default_seconds_per_question
                .unwrap_or(defaults.default_seconds_per_question),
            fallback_leaderboard_max: value
                .fallback_leaderboard_max
                .unwrap_or(defaults.fallback_leaderboard_max),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
