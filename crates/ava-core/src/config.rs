use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use anyhow::{Result, anyhow, bail};
use reqwest::Url;

/// Backend the widget talks to when nothing else is configured.
pub const FALLBACK_BACKEND_URL: &str = "https://tars-ava-chatbot.onrender.com";

/// Placeholders shown on the settings page before the URLs are filled in.
pub const DEFAULT_FRONTEND_SETTING: &str = "https://YOUR_VERCEL_URL.vercel.app";
pub const DEFAULT_BACKEND_SETTING: &str = "https://YOUR_RENDER_URL.onrender.com";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HISTORY_WARN_THRESHOLD: usize = 40;

/// Environment variable that overrides the stored backend URL.
pub const BACKEND_URL_ENV: &str = "AVA_API_URL";

/// Persisted host settings.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub frontend_url: Option<String>,
    pub backend_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub history_warn_threshold: Option<usize>,
}

/// Which of the two URL settings a write targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlSetting {
    Frontend,
    Backend,
}

impl UrlSetting {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlSetting::Frontend => "frontend",
            UrlSetting::Backend => "backend",
        }
    }
}

impl FromStr for UrlSetting {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "frontend" | "frontend_url" => Ok(UrlSetting::Frontend),
            "backend" | "backend_url" => Ok(UrlSetting::Backend),
            _ => bail!("unknown setting {s:?}, expected frontend or backend"),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Stored frontend URL, or the settings-page placeholder.
    pub fn frontend_url(&self) -> &str {
        self.frontend_url.as_deref().unwrap_or(DEFAULT_FRONTEND_SETTING)
    }

    /// Stored backend URL, or the settings-page placeholder.
    pub fn backend_url(&self) -> &str {
        self.backend_url.as_deref().unwrap_or(DEFAULT_BACKEND_SETTING)
    }

    /// Validate and store one of the URL settings.
    pub fn set_url(&mut self, setting: UrlSetting, value: &str) -> Result<()> {
        let url = validate_url(value)?;
        match setting {
            UrlSetting::Frontend => self.frontend_url = Some(url),
            UrlSetting::Backend => self.backend_url = Some(url),
        }
        tracing::info!(setting = setting.as_str(), "updated url setting");
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("ava").join("config.json"))
    }
}

/// Absolute http(s) URL without a trailing slash.
pub fn validate_url(value: &str) -> Result<String> {
    let trimmed = value.trim();
    let url = Url::parse(trimmed).map_err(|e| anyhow!("invalid URL {trimmed:?}: {e}"))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        bail!("URL must use http or https, got {:?}", url.scheme());
    }
    if url.host_str().is_none() {
        bail!("URL {trimmed:?} has no host");
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Resolved configuration handed to the widget controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    pub backend_url: String,
    pub request_timeout: Duration,
    /// History length past which a warning is logged on each send.
    pub history_warn_threshold: usize,
}

impl WidgetConfig {
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            history_warn_threshold: DEFAULT_HISTORY_WARN_THRESHOLD,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Resolve the backend URL: explicit override, then the environment
    /// value, then the stored setting, then [`FALLBACK_BACKEND_URL`].
    pub fn resolve(
        config: &Config,
        cli_override: Option<&str>,
        env_value: Option<&str>,
    ) -> Result<Self> {
        let nonblank = |v: &&str| !v.trim().is_empty();
        let backend_url = match cli_override
            .filter(nonblank)
            .or(env_value.filter(nonblank))
            .or(config.backend_url.as_deref())
        {
            Some(url) => validate_url(url)?,
            None => FALLBACK_BACKEND_URL.to_string(),
        };

        let request_timeout = Duration::from_secs(
            config.request_timeout_secs
                .filter(|&s| s > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        );

        Ok(Self {
            backend_url,
            request_timeout,
            history_warn_threshold: config.history_warn_threshold
                .unwrap_or(DEFAULT_HISTORY_WARN_THRESHOLD),
        })
    }

    /// [`WidgetConfig::resolve`] reading the override from `AVA_API_URL`.
    pub fn from_env(config: &Config, cli_override: Option<&str>) -> Result<Self> {
        let env_value = std::env::var(BACKEND_URL_ENV).ok();
        Self::resolve(config, cli_override, env_value.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
        assert_eq!(config.frontend_url(), DEFAULT_FRONTEND_SETTING);
        assert_eq!(config.backend_url(), DEFAULT_BACKEND_SETTING);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::new();
        config.set_url(UrlSetting::Backend, "https://api.example.com/").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.backend_url(), "https://api.example.com");
        assert_eq!(loaded.frontend_url(), DEFAULT_FRONTEND_SETTING);
    }

    #[test]
    fn test_set_url_rejects_bad_values() {
        let mut config = Config::new();
        assert!(config.set_url(UrlSetting::Frontend, "not a url").is_err());
        assert!(config.set_url(UrlSetting::Frontend, "ftp://files.example.com").is_err());
        assert_eq!(config.frontend_url, None);
    }

    #[test]
    fn test_url_setting_names() {
        assert_eq!("Backend".parse::<UrlSetting>().unwrap(), UrlSetting::Backend);
        assert_eq!("frontend_url".parse::<UrlSetting>().unwrap(), UrlSetting::Frontend);
        let err = "sidebar".parse::<UrlSetting>().unwrap_err();
        assert!(err.to_string().contains("sidebar"));
    }

    #[test]
    fn test_resolve_falls_back_to_literal() {
        let widget = WidgetConfig::resolve(&Config::new(), None, None).unwrap();
        assert_eq!(widget.backend_url, FALLBACK_BACKEND_URL);
        assert_eq!(widget.request_timeout, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));
        assert_eq!(widget.history_warn_threshold, DEFAULT_HISTORY_WARN_THRESHOLD);
    }

    #[test]
    fn test_resolve_precedence() {
        let config = Config {
            backend_url: Some("https://stored.example.com".into()),
            request_timeout_secs: Some(5),
            ..Config::new()
        };

        let stored = WidgetConfig::resolve(&config, None, None).unwrap();
        assert_eq!(stored.backend_url, "https://stored.example.com");
        assert_eq!(stored.request_timeout, Duration::from_secs(5));

        let env = WidgetConfig::resolve(&config, None, Some("https://env.example.com")).unwrap();
        assert_eq!(env.backend_url, "https://env.example.com");

        let cli = WidgetConfig::resolve(
            &config,
            Some("https://cli.example.com/"),
            Some("https://env.example.com"),
        )
        .unwrap();
        assert_eq!(cli.backend_url, "https://cli.example.com");
    }

    #[test]
    fn test_resolve_ignores_blank_env() {
        let widget = WidgetConfig::resolve(&Config::new(), None, Some("  ")).unwrap();
        assert_eq!(widget.backend_url, FALLBACK_BACKEND_URL);
    }

    #[test]
    fn test_resolve_blank_override_falls_through_to_env() {
        let config = Config {
            backend_url: Some("https://stored.example.com".into()),
            ..Config::new()
        };

        let widget =
            WidgetConfig::resolve(&config, Some(" "), Some("https://env.example.com")).unwrap();
        assert_eq!(widget.backend_url, "https://env.example.com");

        let widget = WidgetConfig::resolve(&config, Some(""), Some("\t")).unwrap();
        assert_eq!(widget.backend_url, "https://stored.example.com");
    }
}
