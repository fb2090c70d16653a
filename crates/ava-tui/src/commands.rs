//! Non-interactive subcommands: the settings page and page embedding.

use std::fs;
use std::path::Path;
use anyhow::{Context, Result};
use ava_core::config::{Config, UrlSetting, FALLBACK_BACKEND_URL};
use ava_core::host::{self, WidgetAssets};

/// Settings page contents as printable text.
pub fn show_settings(config_path: &Path) -> Result<String> {
    let config = Config::load_from(config_path)?;
    let mut out = String::new();
    out.push_str("Ava Chatbot Settings\n");
    out.push_str(&format!("  Frontend URL:    {}\n", config.frontend_url()));
    out.push_str(&format!("  Backend API URL: {}\n", config.backend_url()));
    if config.backend_url.is_none() {
        out.push_str(&format!("  (widget falls back to {FALLBACK_BACKEND_URL})\n"));
    }
    out.push_str(&format!("\nUsage: add {} to any page.\n", host::MOUNT_MARKER));
    out.push_str(&format!("Settings file: {}\n", config_path.display()));
    Ok(out)
}

pub fn set_setting(config_path: &Path, setting: UrlSetting, value: &str) -> Result<Config> {
    let mut config = Config::load_from(config_path)?;
    config.set_url(setting, value)?;
    config.save_to(config_path)?;
    Ok(config)
}

/// Forget both URLs, keeping any other stored values.
pub fn reset_settings(config_path: &Path) -> Result<Config> {
    let mut config = Config::load_from(config_path)?;
    config.frontend_url = None;
    config.backend_url = None;
    config.save_to(config_path)?;
    tracing::info!("url settings reset");
    Ok(config)
}

/// Expand the mount marker in a page file.
pub fn embed_page(config_path: &Path, page: &Path) -> Result<String> {
    let content = fs::read_to_string(page)
        .with_context(|| format!("failed to read {}", page.display()))?;

    if !host::contains_mount_marker(&content) {
        tracing::warn!(page = %page.display(), "page has no {} marker", host::MOUNT_MARKER);
    }

    let config = Config::load_from(config_path)?;
    let assets = WidgetAssets::from_config(&config);
    let body = host::expand_mount_marker(&content);
    Ok(format!("{}\n{}", assets.head_tags()?, body))
}

pub fn asset_tags(config_path: &Path) -> Result<String> {
    let config = Config::load_from(config_path)?;
    WidgetAssets::from_config(&config).head_tags()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_then_show() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        set_setting(&path, UrlSetting::Backend, "https://api.example.com").unwrap();
        let shown = show_settings(&path).unwrap();
        assert!(shown.contains("Backend API URL: https://api.example.com"));
        assert!(shown.contains("Frontend URL:    https://YOUR_VERCEL_URL.vercel.app"));
        assert!(!shown.contains("falls back"));
    }

    #[test]
    fn test_invalid_setting_is_not_saved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        assert!(set_setting(&path, UrlSetting::Frontend, "localhost").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_reset_keeps_other_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let config = Config {
            backend_url: Some("https://api.example.com".into()),
            request_timeout_secs: Some(12),
            ..Config::new()
        };
        config.save_to(&path).unwrap();

        let reset = reset_settings(&path).unwrap();
        assert_eq!(reset.backend_url, None);
        assert_eq!(reset.request_timeout_secs, Some(12));
    }

    #[test]
    fn test_embed_page() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.json");
        let page = dir.path().join("contact.html");
        fs::write(&page, "<main>[ava_chatbot]</main>").unwrap();

        set_setting(&config_path, UrlSetting::Frontend, "https://ava.example.app").unwrap();
        let out = embed_page(&config_path, &page).unwrap();
        assert!(out.ends_with("<main><div id=\"root\"></div></main>"));
        assert!(out.contains("https://ava.example.app/dist/index.js?ver=1.0.0"));
    }

    #[test]
    fn test_embed_missing_page() {
        let dir = TempDir::new().unwrap();
        let err = embed_page(&dir.path().join("config.json"), &dir.path().join("nope.html"));
        assert!(err.is_err());
    }
}
