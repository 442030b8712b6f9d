//! Langfuse Configuration

use secrecy::SecretString;

pub const DEFAULT_HOST: &str = "https://cloud.langfuse.com";
pub const DEFAULT_FLUSH_AT: usize = 15;

/// Where and how observations are reported
#[derive(Debug, Clone)]
pub struct LangfuseConfig {
    pub public_key: Option<String>,
    pub secret_key: Option<SecretString>,
    /// Base URL of the Langfuse deployment, without trailing slash
    pub host: String,
    /// Used to build project-scoped trace URLs
    pub project_id: Option<String>,
    pub enabled: bool,
    pub release: Option<String>,
    pub environment: Option<String>,
    /// Maximum events per ingestion request
    pub flush_at: usize,
}

impl Default for LangfuseConfig {
    fn default() -> Self {
        Self {
            public_key: None,
            secret_key: None,
            host: DEFAULT_HOST.to_string(),
            project_id: None,
            enabled: true,
            release: None,
            environment: None,
            flush_at: DEFAULT_FLUSH_AT,
        }
    }
}

impl LangfuseConfig {
    pub fn builder() -> LangfuseConfigBuilder {
        LangfuseConfigBuilder::default()
    }

    /// Read `LANGFUSE_*` variables from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an injectable variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = Self::builder();
        if let Some(public_key) = get("LANGFUSE_PUBLIC_KEY") {
            builder = builder.public_key(public_key);
        }
        if let Some(secret_key) = get("LANGFUSE_SECRET_KEY") {
            builder = builder.secret_key(secret_key);
        }
        if let Some(host) = get("LANGFUSE_HOST").or_else(|| get("LANGFUSE_BASEURL")) {
            builder = builder.host(host);
        }
        if let Some(project_id) = get("LANGFUSE_PROJECT_ID") {
            builder = builder.project_id(project_id);
        }
        if let Some(enabled) = get("LANGFUSE_ENABLED") {
            builder = builder.enabled(!matches!(
                enabled.trim().to_ascii_lowercase().as_str(),
                "false" | "0" | "no" | "off"
            ));
        }
        if let Some(release) = get("LANGFUSE_RELEASE") {
            builder = builder.release(release);
        }
        if let Some(environment) = get("LANGFUSE_TRACING_ENVIRONMENT") {
            builder = builder.environment(environment);
        }
        if let Some(flush_at) = get("LANGFUSE_FLUSH_AT") {
            match flush_at.trim().parse::<usize>() {
                Ok(n) => builder = builder.flush_at(n),
                Err(_) => tracing::warn!(
                    value = %flush_at,
                    "ignoring LANGFUSE_FLUSH_AT: not a positive integer"
                ),
            }
        }
        builder.build()
    }

    /// Both keys present and not switched off
    pub fn is_exportable(&self) -> bool {
        self.enabled && self.public_key.is_some() && self.secret_key.is_some()
    }

    /// UI link for a trace
    pub fn trace_url(&self, trace_id: &str) -> String {
        match &self.project_id {
            Some(project_id) => format!("{}/project/{project_id}/traces/{trace_id}", self.host),
            None => format!("{}/trace/{trace_id}", self.host),
        }
    }

    pub fn ingestion_url(&self) -> String {
        format!("{}/api/public/ingestion", self.host)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LangfuseConfigBuilder {
    config: LangfuseConfig,
}

impl LangfuseConfigBuilder {
    pub fn public_key(mut self, key: impl Into<String>) -> Self {
        self.config.public_key = Some(key.into());
        self
    }

    pub fn secret_key(mut self, key: impl Into<String>) -> Self {
        self.config.secret_key = Some(SecretString::from(key.into()));
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into().trim_end_matches('/').to_string();
        self
    }

    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.config.project_id = Some(project_id.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn release(mut self, release: impl Into<String>) -> Self {
        self.config.release = Some(release.into());
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.config.environment = Some(environment.into());
        self
    }

    /// Zero is treated as one
    pub fn flush_at(mut self, flush_at: usize) -> Self {
        self.config.flush_at = flush_at.max(1);
        self
    }

    pub fn build(self) -> LangfuseConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn trace_url_without_project() {
        let config = LangfuseConfig::builder()
            .host("https://langfuse.example.com/")
            .build();
        assert_eq!(
            config.trace_url("abc"),
            "https://langfuse.example.com/trace/abc"
        );
    }

    #[test]
    fn trace_url_with_project() {
        let config = LangfuseConfig::builder().project_id("proj-9").build();
        assert_eq!(
            config.trace_url("abc"),
            "https://cloud.langfuse.com/project/proj-9/traces/abc"
        );
    }

    #[test]
    fn env_without_keys_is_not_exportable() {
        let config = LangfuseConfig::from_lookup(lookup(&[("LANGFUSE_HOST", "http://localhost:3000")]));
        assert!(!config.is_exportable());
        assert_eq!(config.ingestion_url(), "http://localhost:3000/api/public/ingestion");
    }

    #[test]
    fn env_reads_every_setting() {
        let config = LangfuseConfig::from_lookup(lookup(&[
            ("LANGFUSE_PUBLIC_KEY", "pk-lf-1"),
            ("LANGFUSE_SECRET_KEY", "sk-lf-1"),
            ("LANGFUSE_BASEURL", "http://lf.local"),
            ("LANGFUSE_RELEASE", "v1.2.3"),
            ("LANGFUSE_TRACING_ENVIRONMENT", "staging"),
            ("LANGFUSE_FLUSH_AT", "3"),
        ]));
        assert!(config.is_exportable());
        assert_eq!(config.host, "http://lf.local");
        assert_eq!(config.release.as_deref(), Some("v1.2.3"));
        assert_eq!(config.environment.as_deref(), Some("staging"));
        assert_eq!(config.flush_at, 3);
    }

    #[test]
    fn env_can_disable_export() {
        let config = LangfuseConfig::from_lookup(lookup(&[
            ("LANGFUSE_PUBLIC_KEY", "pk-lf-1"),
            ("LANGFUSE_SECRET_KEY", "sk-lf-1"),
            ("LANGFUSE_ENABLED", "False"),
            ("LANGFUSE_FLUSH_AT", "lots"),
        ]));
        assert!(!config.is_exportable());
        assert_eq!(config.flush_at, DEFAULT_FLUSH_AT);
    }
}
