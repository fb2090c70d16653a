//! Embedding the widget in a host page.
//!
//! The host expands a content marker into the mount container and loads the
//! widget bundle after publishing the two configured URLs as `avaConfig`.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::config::Config;

/// Content marker that expands into the mount container.
pub const MOUNT_MARKER: &str = "[ava_chatbot]";
pub const MOUNT_ELEMENT: &str = r#"<div id="root"></div>"#;

/// Cache-busting version appended to asset URLs.
pub const ASSET_VERSION: &str = "1.0.0";

/// Global the bundle reads its configuration from.
pub const CONFIG_GLOBAL: &str = "avaConfig";

fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\s*ava_chatbot\s*/?\s*\]").unwrap())
}

/// Replace every mount marker in `content` with the mount container.
pub fn expand_mount_marker(content: &str) -> String {
    marker_regex().replace_all(content, MOUNT_ELEMENT).into_owned()
}

pub fn contains_mount_marker(content: &str) -> bool {
    marker_regex().is_match(content)
}

/// Configuration object published to the page before the bundle runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapConfig {
    pub api_url: String,
    pub frontend_url: String,
}

/// Script and stylesheet the host page has to load for the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetAssets {
    pub script_url: String,
    pub style_url: String,
    pub bootstrap: BootstrapConfig,
}

impl WidgetAssets {
    pub fn from_config(config: &Config) -> Self {
        let frontend = config.frontend_url().trim_end_matches('/');
        Self {
            script_url: format!("{frontend}/dist/index.js?ver={ASSET_VERSION}"),
            style_url: format!("{frontend}/dist/index.css?ver={ASSET_VERSION}"),
            bootstrap: BootstrapConfig {
                api_url: config.backend_url().to_string(),
                frontend_url: frontend.to_string(),
            },
        }
    }

    /// Inline script assigning the bootstrap config to the page global.
    pub fn bootstrap_script(&self) -> anyhow::Result<String> {
        // `</` inside a JSON string would end the surrounding <script> early.
        let json = serde_json::to_string(&self.bootstrap)?.replace("</", "<\\/");
        Ok(format!("var {CONFIG_GLOBAL} = {json};"))
    }

    /// `<head>` markup in load order: stylesheet, config, then the bundle.
    pub fn head_tags(&self) -> anyhow::Result<String> {
        Ok(format!(
            "<link rel=\"stylesheet\" id=\"ava-chatbot-style-css\" href=\"{}\" media=\"all\" />\n\
             <script id=\"ava-chatbot-app-js-extra\">{}</script>\n\
             <script src=\"{}\" id=\"ava-chatbot-app-js\"></script>",
            escape_attr(&self.style_url),
            self.bootstrap_script()?,
            escape_attr(&self.script_url),
        ))
    }
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
