use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from `~/.config/fasthttp/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Worker count used when the caller does not give one (1..=255).
    pub workers: u8,
    /// Receive buffer size in bytes; bounds each body increment written to the sink.
    pub buffer_size: usize,
    /// Follow HTTP redirects on the probe and on every range GET.
    pub follow_redirects: bool,
    /// Maximum redirects followed per request.
    pub max_redirections: u32,
    /// Optional connect timeout in seconds (None = client default).
    pub connect_timeout_secs: Option<u64>,
    /// Optional User-Agent header.
    pub user_agent: Option<String>,
    /// Initial in-memory capacity when the resource length is unknown.
    pub memory_reserve_bytes: usize,
    /// fsync the output file before it is moved into place.
    pub sync_on_finish: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            buffer_size: 16 * 1024,
            follow_redirects: true,
            max_redirections: 10,
            connect_timeout_secs: None,
            user_agent: None,
            memory_reserve_bytes: 8 * 1024 * 1024,
            sync_on_finish: true,
        }
    }
}

impl FetchConfig {
    /// Client options shared by the probe and every fetcher.
    pub fn curl_options(&self) -> CurlOptions {
        CurlOptions {
            buffer_size: self.buffer_size,
            follow_redirects: self.follow_redirects,
            max_redirections: self.max_redirections,
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
            user_agent: self.user_agent.clone(),
        }
    }
}

/// libcurl handle options derived from `FetchConfig`.
#[derive(Debug, Clone, Default)]
pub struct CurlOptions {
    pub buffer_size: usize,
    pub follow_redirects: bool,
    pub max_redirections: u32,
    pub connect_timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

impl CurlOptions {
    pub(crate) fn apply(&self, easy: &mut curl::easy::Easy) -> Result<(), curl::Error> {
        easy.follow_location(self.follow_redirects)?;
        if self.follow_redirects {
            easy.max_redirections(self.max_redirections)?;
        }
        if self.buffer_size > 0 {
            easy.buffer_size(self.buffer_size)?;
        }
        if let Some(t) = self.connect_timeout {
            easy.connect_timeout(t)?;
        }
        if let Some(ua) = &self.user_agent {
            easy.useragent(ua)?;
        }
        Ok(())
    }
}

/// Errors reading or writing the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config directory: {0}")]
    Xdg(#[from] xdg::BaseDirectoriesError),
    #[error("config io: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fasthttp")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FetchConfig, ConfigError> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from(&path)
}

/// Load configuration from an explicit file. Missing keys take their defaults.
pub fn load_from(path: &Path) -> Result<FetchConfig, ConfigError> {
    let data = fs::read_to_string(path)?;
    let cfg: FetchConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = FetchConfig::default();
        assert_eq!(cfg.workers, 4);
        assert_eq!(cfg.buffer_size, 16384);
        assert!(cfg.follow_redirects);
        assert!(cfg.connect_timeout_secs.is_none());
        assert!(cfg.sync_on_finish);
    }

    #[test]
    fn config_toml_roundtrip() {
        let mut cfg = FetchConfig::default();
        cfg.user_agent = Some("fasthttp-test".to_string());
        cfg.connect_timeout_secs = Some(5);
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: FetchConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "workers = 16\nsync_on_finish = false\n").unwrap();
        let cfg = load_from(&path).unwrap();
        assert_eq!(cfg.workers, 16);
        assert!(!cfg.sync_on_finish);
        assert_eq!(cfg.buffer_size, FetchConfig::default().buffer_size);
    }

    #[test]
    fn out_of_range_workers_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "workers = 300\n").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn curl_options_follow_config() {
        let cfg = FetchConfig {
            connect_timeout_secs: Some(3),
            ..FetchConfig::default()
        };
        let opts = cfg.curl_options();
        assert_eq!(opts.connect_timeout, Some(Duration::from_secs(3)));
        assert_eq!(opts.buffer_size, 16384);
    }
}
