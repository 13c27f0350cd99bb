use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Retry/timeout flags handed to the external tool on every attempt
/// (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// `--retries` for the whole download.
    pub retries: u32,
    /// `--fragment-retries` for fragmented formats.
    pub fragment_retries: u32,
    /// `--socket-timeout` in seconds.
    pub socket_timeout_secs: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            fragment_retries: 3,
            socket_timeout_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/fetchq/config.toml`.
/// Missing keys take their built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchqConfig {
    /// Where finished media lands. Defaults to the working directory of `fetchq serve`.
    pub download_dir: Option<PathBuf>,
    /// External extraction tool executable (looked up on PATH when relative).
    pub tool_path: PathBuf,
    /// Dispatcher sleep when no job is eligible, in milliseconds.
    pub idle_poll_ms: u64,
    /// Dispatcher sleep after a supervisor fault, in milliseconds.
    pub fault_backoff_ms: u64,
    /// Title probes allowed to run the tool at the same time.
    pub title_probe_limit: usize,
    /// Optional tool flags; if missing, built-in defaults are used.
    pub tool: Option<ToolConfig>,
}

impl Default for FetchqConfig {
    fn default() -> Self {
        Self {
            download_dir: None,
            tool_path: PathBuf::from("yt-dlp"),
            idle_poll_ms: 1000,
            fault_backoff_ms: 5000,
            title_probe_limit: 2,
            tool: None,
        }
    }
}

impl FetchqConfig {
    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms.max(1))
    }

    pub fn fault_backoff(&self) -> Duration {
        Duration::from_millis(self.fault_backoff_ms)
    }

    /// Never below one, so probes cannot stall forever.
    pub fn title_probe_limit(&self) -> usize {
        self.title_probe_limit.max(1)
    }

    pub fn tool_or_default(&self) -> ToolConfig {
        self.tool.clone().unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fetchq")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FetchqConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FetchqConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: FetchqConfig = toml::from_str(&data)?;
    Ok(cfg)
}
