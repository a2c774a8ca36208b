use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::tracker::{WindowConfig, DEFAULT_CAP_LIMIT, DEFAULT_TIME_FRAME_HOURS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            other => anyhow::bail!("unknown store backend {other}"),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Sqlite => f.write_str("sqlite"),
            StoreBackend::Memory => f.write_str("memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub server_host: String,
    pub server_port: u16,
    pub data_dir: PathBuf,
    pub store_backend: StoreBackend,
    pub default_cap_limit: u64,
    pub default_time_frame_hours: f64,
    pub refresh_interval_secs: u64,
    pub log_level: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 8190,
            data_dir: PathBuf::from("data/cap-watch"),
            store_backend: StoreBackend::Sqlite,
            default_cap_limit: DEFAULT_CAP_LIMIT,
            default_time_frame_hours: DEFAULT_TIME_FRAME_HOURS,
            refresh_interval_secs: 60,
            log_level: "info".to_string(),
        }
    }
}

impl TrackerConfig {
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        if let Ok(host) = env::var("CAP_WATCH_HOST") {
            if !host.trim().is_empty() {
                cfg.server_host = host;
            }
        }
        if let Ok(port) = env::var("CAP_WATCH_PORT") {
            cfg.server_port = port.parse().context("CAP_WATCH_PORT must be a valid u16")?;
        }
        if let Ok(dir) = env::var("CAP_WATCH_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Ok(backend) = env::var("CAP_WATCH_STORE") {
            cfg.store_backend = backend
                .parse()
                .with_context(|| format!("CAP_WATCH_STORE is invalid: {backend}"))?;
        }
        if let Ok(limit) = env::var("DEFAULT_CAP_LIMIT") {
            cfg.default_cap_limit = limit
                .parse()
                .context("DEFAULT_CAP_LIMIT must be a positive integer")?;
        }
        if let Ok(hours) = env::var("DEFAULT_TIME_FRAME_HOURS") {
            cfg.default_time_frame_hours = hours
                .parse()
                .context("DEFAULT_TIME_FRAME_HOURS must be a number of hours")?;
        }
        if let Ok(interval) = env::var("REFRESH_INTERVAL_SECS") {
            cfg.refresh_interval_secs = interval
                .parse()
                .context("REFRESH_INTERVAL_SECS must be a positive integer")?;
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            cfg.log_level = level;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.store_backend == StoreBackend::Sqlite {
            ensure_directory(&self.data_dir)?;
        }

        if self.default_cap_limit == 0 {
            anyhow::bail!("DEFAULT_CAP_LIMIT must be greater than zero");
        }
        if !(self.default_time_frame_hours.is_finite() && self.default_time_frame_hours > 0.0) {
            anyhow::bail!("DEFAULT_TIME_FRAME_HOURS must be greater than zero");
        }
        if self.refresh_interval_secs == 0 {
            anyhow::bail!("REFRESH_INTERVAL_SECS must be greater than zero");
        }

        Ok(())
    }

    pub fn window_defaults(&self) -> WindowConfig {
        WindowConfig {
            cap_limit: self.default_cap_limit,
            time_frame_hours: self.default_time_frame_hours,
        }
    }
}

fn ensure_directory(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            anyhow::bail!("{} exists but is not a directory", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("unable to create data directory {}", path.display()))?;
    }
    Ok(())
}
