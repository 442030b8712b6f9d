//! Log subscriber setup
//!
//! ```rust,no_run
//! use llm_observe::telemetry::{OutputFormat, SubscriberConfig, init_subscriber};
//!
//! let config = SubscriberConfig::builder()
//!     .log_level(tracing::Level::DEBUG)
//!     .output_format(OutputFormat::Json)
//!     .build();
//! let _guard = init_subscriber(config)?;
//! # Ok::<(), llm_observe::error::LlmError>(())
//! ```

use crate::error::LlmError;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonCompact,
}

impl std::str::FromStr for OutputFormat {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-compact" => Ok(Self::JsonCompact),
            other => Err(LlmError::ConfigurationError(format!(
                "Invalid log format: {other}. Valid options: text, json, json-compact"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
    /// Write to this file instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
            log_file: None,
        }
    }
}

impl SubscriberConfig {
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    /// Read `LLM_OBSERVE_LOG_LEVEL`, `LLM_OBSERVE_LOG_FORMAT` and `LLM_OBSERVE_LOG_FILE`
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LlmError> {
        let mut builder = Self::builder();
        if let Some(level) = lookup("LLM_OBSERVE_LOG_LEVEL") {
            builder = builder.log_level_str(&level)?;
        }
        if let Some(format) = lookup("LLM_OBSERVE_LOG_FORMAT") {
            builder = builder.output_format(format.parse()?);
        }
        if let Some(path) = lookup("LLM_OBSERVE_LOG_FILE") {
            builder = builder.log_file(PathBuf::from(path));
        }
        Ok(builder.build())
    }

    fn filter(&self) -> String {
        let level = self.log_level.as_str().to_ascii_lowercase();
        format!("llm_observe={level}")
    }
}

#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    log_file: Option<PathBuf>,
}

impl SubscriberConfigBuilder {
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn log_level_str(mut self, level: &str) -> Result<Self, LlmError> {
        let level = level.trim().parse::<tracing::Level>().map_err(|_| {
            LlmError::ConfigurationError(format!(
                "Invalid log level: {level}. Valid options: trace, debug, info, warn, error"
            ))
        })?;
        self.log_level = Some(level);
        Ok(self)
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn log_file(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    pub fn build(self) -> SubscriberConfig {
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(tracing::Level::INFO),
            output_format: self.output_format.unwrap_or_default(),
            log_file: self.log_file,
        }
    }
}

/// Install the global subscriber.
///
/// Returns the non-blocking writer's guard; keep it alive until exit so buffered lines
/// are written. A subscriber that is already installed is left in place.
pub fn init_subscriber(config: SubscriberConfig) -> Result<Option<WorkerGuard>, LlmError> {
    let filter = EnvFilter::try_new(config.filter())
        .map_err(|e| LlmError::ConfigurationError(format!("Invalid log filter: {e}")))?;

    let (writer, guard) = match &config.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    LlmError::ConfigurationError(format!(
                        "Cannot open log file {}: {e}",
                        path.display()
                    ))
                })?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            (writer, Some(guard))
        }
        None => {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
            (writer, Some(guard))
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true);

    let init_result = match config.output_format {
        OutputFormat::Json => builder.json().try_init(),
        OutputFormat::JsonCompact => builder.json().flatten_event(true).try_init(),
        OutputFormat::Text => builder.try_init(),
    };

    match init_result {
        Ok(()) => Ok(guard),
        Err(e) if e.to_string().contains("already") => Ok(None),
        Err(e) => Err(LlmError::ConfigurationError(format!(
            "Failed to initialize tracing: {e}"
        ))),
    }
}

pub fn init_from_env() -> Result<Option<WorkerGuard>, LlmError> {
    init_subscriber(SubscriberConfig::from_env()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_level_and_format_from_lookup() {
        let config = SubscriberConfig::from_lookup(|key| match key {
            "LLM_OBSERVE_LOG_LEVEL" => Some("debug".to_string()),
            "LLM_OBSERVE_LOG_FORMAT" => Some("json-compact".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.log_level, tracing::Level::DEBUG);
        assert_eq!(config.output_format, OutputFormat::JsonCompact);
        assert_eq!(config.filter(), "llm_observe=debug");
    }

    #[test]
    fn rejects_unknown_format() {
        let result = SubscriberConfig::from_lookup(|key| {
            (key == "LLM_OBSERVE_LOG_FORMAT").then(|| "yaml".to_string())
        });
        assert!(matches!(result, Err(LlmError::ConfigurationError(_))));
    }

    #[test]
    fn log_file_from_lookup() {
        let config = SubscriberConfig::from_lookup(|key| {
            (key == "LLM_OBSERVE_LOG_FILE").then(|| "/tmp/observe.log".to_string())
        })
        .unwrap();
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/observe.log")));
        assert_eq!(config.log_level, tracing::Level::INFO);
    }

    #[test]
    fn unopenable_log_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = SubscriberConfig::builder()
            .log_file(dir.path().join("missing").join("observe.log"))
            .build();
        assert!(matches!(
            init_subscriber(config),
            Err(LlmError::ConfigurationError(_))
        ));
    }
}
