//! Application-level configuration loading: coordinator limits and the seeded teams.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dao::models::{RosterPlayerEntity, TeamEntity};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CRICKET_SCORE_BACK_CONFIG_PATH";

const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);
const DEFAULT_SSE_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Upper bound for one scoring transaction, lock wait excluded.
    pub transaction_timeout: Duration,
    /// How long a writer waits for the per-match gate before giving up.
    pub lock_wait: Duration,
    /// Capacity of the public SSE broadcast channel.
    pub sse_capacity: usize,
    /// Teams written to storage once it becomes available.
    pub teams: Vec<TeamEntity>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        teams = app_config.teams.len(),
                        transaction_timeout_ms = app_config.transaction_timeout.as_millis() as u64,
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
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
            lock_wait: DEFAULT_LOCK_WAIT,
            sse_capacity: DEFAULT_SSE_CAPACITY,
            teams: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    transaction_timeout_ms: Option<u64>,
    lock_wait_ms: Option<u64>,
    sse_capacity: Option<usize>,
    #[serde(default)]
    teams: Vec<RawTeam>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            transaction_timeout: value
                .transaction_timeout_ms
                .map_or(defaults.transaction_timeout, Duration::from_millis),
            lock_wait: value
                .lock_wait_ms
                .map_or(defaults.lock_wait, Duration::from_millis),
            sse_capacity: value
                .sse_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.sse_capacity),
            teams: value.teams.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a seeded team and its roster.
struct RawTeam {
    id: Uuid,
    name: String,
    #[serde(default)]
    players: Vec<RawPlayer>,
}

#[derive(Debug, Deserialize)]
struct RawPlayer {
    id: Uuid,
    name: String,
}

impl From<RawTeam> for TeamEntity {
    fn from(value: RawTeam) -> Self {
        Self {
            id: value.id,
            name: value.name,
            players: value
                .players
                .into_iter()
                .map(|player| RosterPlayerEntity {
                    id: player.id,
                    name: player.name,
                })
                .collect(),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let raw: RawConfig = serde_json::from_str(r#"{"lock_wait_ms": 250}"#).unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.lock_wait, Duration::from_millis(250));
        assert_eq!(config.transaction_timeout, DEFAULT_TRANSACTION_TIMEOUT);
        assert_eq!(config.sse_capacity, DEFAULT_SSE_CAPACITY);
        assert!(config.teams.is_empty());
    }

    #[test]
    fn seeded_teams_keep_their_rosters() {
        let raw: RawConfig = serde_json::from_str(
            r#"{
                "sse_capacity": 0,
                "teams": [{
                    "id": "7d1f8a0e-2c4b-4f7a-9a51-0d3e6b1c2a10",
                    "name": "Harbour Hawks",
                    "players": [{"id": "0b9c7a52-3f1e-4d2a-8c6b-5e4f3a2b1c01", "name": "A. Rao"}]
                }]
            }"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.sse_capacity, DEFAULT_SSE_CAPACITY);
        assert_eq!(config.teams.len(), 1);
        assert_eq!(config.teams[0].players[0].name, "A. Rao");
    }
}
