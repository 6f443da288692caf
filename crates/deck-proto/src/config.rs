use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub youtube: YoutubeConfig,
    #[serde(default)]
    pub twitch: TwitchConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
}

/// Remote control listener. Port 0 leaves it switched off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default)]
    pub port: u16,
}

/// User-configurable paths for downloads and the feed cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of the local-file source; the downloader writes here.
    #[serde(default = "platform::files_dir")]
    pub files_dir: PathBuf,
    /// One raw JSON payload per subreddit.
    #[serde(default = "platform::cache_dir")]
    pub cache_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_subreddit")]
    pub default_subreddit: String,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_feed_limit")]
    pub limit: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TwitchConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub access_token: String,
    /// Optional helper run (and awaited) before the stream player, e.g. a
    /// chat popout opener. `{channel}` is replaced with the channel login.
    #[serde(default)]
    pub chat_command: Vec<String>,
}

/// argv prefixes for every external program; the item reference is appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
    #[serde(default = "platform::default_player")]
    pub player: Vec<String>,
    #[serde(default = "default_stream_player")]
    pub stream_player: Vec<String>,
    #[serde(default = "default_downloader")]
    pub downloader: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl FeedConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl WorkerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: 0,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            files_dir: platform::files_dir(),
            cache_dir: platform::cache_dir(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_subreddit: default_subreddit(),
            cache_ttl_secs: default_cache_ttl_secs(),
            limit: default_feed_limit(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            max_results: default_max_results(),
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            player: platform::default_player(),
            stream_player: default_stream_player(),
            downloader: default_downloader(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_subreddit() -> String {
    "videos".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    600
}

fn default_feed_limit() -> u32 {
    90
}

fn default_user_agent() -> String {
    format!("feeddeck/{} (terminal feed browser)", env!("CARGO_PKG_VERSION"))
}

fn default_max_results() -> u32 {
    50
}

fn default_stream_player() -> Vec<String> {
    vec![
        "streamlink".to_string(),
        "--player".to_string(),
        "mpv".to_string(),
    ]
}

fn default_downloader() -> Vec<String> {
    vec![
        platform::downloader_binary_name().to_string(),
        "-q".to_string(),
        "--restrict-filenames".to_string(),
    ]
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Read `path`, writing the defaults there first when it doesn't exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
