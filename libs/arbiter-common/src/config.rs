// Process configuration, read once from the environment at start-up

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://emkc.org/api/v2/piston/execute";
pub const DEFAULT_COMPILE_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_RUN_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 20_000;
pub const DEFAULT_LANGUAGES_FILE: &str = "config/languages.json";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a positive integer number of milliseconds, got '{value}'")]
    InvalidDuration { key: &'static str, value: String },
    #[error("run timeout ({run_ms}ms) must be shorter than compile timeout ({compile_ms}ms)")]
    RunNotShorterThanCompile { run_ms: u64, compile_ms: u64 },
    #[error(
        "request timeout ({request_ms}ms) must exceed compile + run timeouts ({budget_ms}ms)"
    )]
    RequestTimeoutTooShort { request_ms: u64, budget_ms: u64 },
    #[error("{key} must not be empty")]
    Empty { key: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub endpoint: String,
    pub compile_timeout: Duration,
    pub run_timeout: Duration,
    /// Caller-side bound on the whole HTTP exchange
    pub request_timeout: Duration,
    pub languages_file: PathBuf,
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            compile_timeout: Duration::from_millis(DEFAULT_COMPILE_TIMEOUT_MS),
            run_timeout: Duration::from_millis(DEFAULT_RUN_TIMEOUT_MS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            languages_file: PathBuf::from(DEFAULT_LANGUAGES_FILE),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl Config {
    /// Load from `ARBITER_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let endpoint = match lookup("ARBITER_ENDPOINT") {
            Some(value) if value.trim().is_empty() => {
                return Err(ConfigError::Empty {
                    key: "ARBITER_ENDPOINT",
                })
            }
            Some(value) => value.trim().to_string(),
            None => defaults.endpoint,
        };

        let compile_timeout = duration_var(
            &lookup,
            "ARBITER_COMPILE_TIMEOUT_MS",
            defaults.compile_timeout,
        )?;
        let run_timeout = duration_var(&lookup, "ARBITER_RUN_TIMEOUT_MS", defaults.run_timeout)?;
        let request_timeout = duration_var(
            &lookup,
            "ARBITER_REQUEST_TIMEOUT_MS",
            defaults.request_timeout,
        )?;

        let languages_file = lookup("ARBITER_LANGUAGES_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.languages_file);
        let bind_addr = lookup("ARBITER_BIND_ADDR").unwrap_or(defaults.bind_addr);

        let config = Self {
            endpoint,
            compile_timeout,
            run_timeout,
            request_timeout,
            languages_file,
            bind_addr,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants between fields; also run after CLI overrides
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Empty { key: "endpoint" });
        }
        if self.run_timeout >= self.compile_timeout {
            return Err(ConfigError::RunNotShorterThanCompile {
                run_ms: self.run_timeout.as_millis() as u64,
                compile_ms: self.compile_timeout.as_millis() as u64,
            });
        }
        // The outer deadline must leave room for a full compile plus run
        let budget = self.compile_timeout + self.run_timeout;
        if self.request_timeout <= budget {
            return Err(ConfigError::RequestTimeoutTooShort {
                request_ms: self.request_timeout.as_millis() as u64,
                budget_ms: budget.as_millis() as u64,
            });
        }
        Ok(())
    }
}

fn duration_var<F>(lookup: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
            _ => Err(ConfigError::InvalidDuration { key, value: raw }),
        },
    }
}
