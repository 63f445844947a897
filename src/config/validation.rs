//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check identifiers and prefixes are usable in markup
//! - Validate value ranges (intervals > 0, known log levels)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use tracing_subscriber::EnvFilter;

use crate::config::schema::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `loader.default_mount`.
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut fail = |field: &'static str, message: String| {
        errors.push(ValidationError { field, message });
    };

    if !is_attribute_value(&config.loader.default_mount) {
        fail(
            "loader.default_mount",
            format!("`{}` is not a usable element id", config.loader.default_mount),
        );
    }
    if config.loader.script_type.trim().is_empty() {
        fail("loader.script_type", "must not be empty".to_string());
    }

    let prefix = &config.render.handler_attribute_prefix;
    if prefix.is_empty()
        || !prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':')
    {
        fail(
            "render.handler_attribute_prefix",
            format!("`{prefix}` is not a valid attribute name prefix"),
        );
    }

    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        fail(
            "observability.log_level",
            format!("`{}` is not a valid level or filter", config.observability.log_level),
        );
    }

    if config.watch.poll_interval_ms == 0 {
        fail("watch.poll_interval_ms", "must be greater than 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_attribute_value(id: &str) -> bool {
    !id.is_empty() && !id.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = AppConfig::default();
        config.loader.default_mount = "two words".to_string();
        config.render.handler_attribute_prefix = "on click".to_string();
        config.watch.poll_interval_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            [
                "loader.default_mount",
                "render.handler_attribute_prefix",
                "watch.poll_interval_ms"
            ]
        );
    }
}
