//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the runtime
//! and CLI. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::reactive::RenderOptions;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Template source discovery.
    pub loader: LoaderConfig,

    /// Initial navigation state.
    pub router: RouterConfig,

    /// Rendering behaviour.
    pub render: RenderConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,

    /// File watching for `hashview watch`.
    pub watch: WatchConfig,
}

/// Template source discovery settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoaderConfig {
    /// Surface used when a source declares no `data-mount`.
    pub default_mount: String,

    /// `type` attribute of script elements holding template sources.
    pub script_type: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            default_mount: "app".to_string(),
            script_type: "text/hashview".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RouterConfig {
    /// Hash the in-memory location starts at. Any accepted fragment form.
    pub initial_fragment: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            initial_fragment: "#/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// HTML-escape interpolated values.
    pub escape_html: bool,

    /// Prefix of rendered handler attributes.
    pub handler_attribute_prefix: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let options = RenderOptions::default();
        Self {
            escape_html: options.escape_html,
            handler_attribute_prefix: options.handler_attribute_prefix,
        }
    }
}

impl From<&RenderConfig> for RenderOptions {
    fn from(config: &RenderConfig) -> Self {
        Self {
            escape_html: config.escape_html,
            handler_attribute_prefix: config.handler_attribute_prefix.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct WatchConfig {
    /// Poll interval for backends without native notifications.
    pub poll_interval_ms: u64,

    /// Changes closer together than this are reported once.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            debounce_ms: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.loader.default_mount, "app");
    }

    #[test]
    fn test_partial_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [render]
            escape_html = true

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert!(config.render.escape_html);
        assert_eq!(config.render.handler_attribute_prefix, "data-on-");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.observability.log_level, "info");
    }
}
