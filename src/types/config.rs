//! Configuration types for a conversion run.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConverterError, Result};
use crate::processing::filter::FilterConfig;
use crate::processing::language::{self, LanguageDescriptor};
use crate::{DEFAULT_CONCURRENCY, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_RETRIES};

/// Log output format for the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Text,
    Json,
}

/// Global converter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Root of the tree to scan
    pub source_dir: PathBuf,

    /// Root of the mirrored output tree
    pub output_dir: PathBuf,

    /// Canonical name of the language to convert into
    pub target_language: String,

    /// Base URL of the OpenAI-compatible model service
    pub llm_api_url: String,

    /// Bearer token for the model service
    #[serde(skip_serializing)]
    pub llm_api_key: Option<String>,

    /// Model identifier sent with each request
    pub llm_model: String,

    /// Per-request timeout in seconds
    pub llm_timeout_secs: u64,

    /// Extra attempts after a retryable failure
    pub max_retries: u32,

    /// Base delay between retries in milliseconds
    pub retry_backoff_ms: u64,

    /// Files classified and converted in parallel
    pub concurrency: usize,

    /// Files larger than this are skipped during the scan
    pub max_file_size: u64,

    /// Regexes matched against paths relative to the source root
    pub ignore_patterns: Vec<String>,

    /// Classify and report only; never call the model
    pub dry_run: bool,

    /// Keep going after a file fails to convert
    pub continue_on_error: bool,

    pub log_format: LogFormat,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            output_dir: PathBuf::from("converted"),
            target_language: "rust".to_string(),
            llm_api_url: "http://localhost:11434/v1".to_string(),
            llm_api_key: None,
            llm_model: "gpt-4o-mini".to_string(),
            llm_timeout_secs: 120,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: 500,
            concurrency: DEFAULT_CONCURRENCY,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            ignore_patterns: Vec::new(),
            dry_run: false,
            continue_on_error: true,
            log_format: LogFormat::Text,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ConverterConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup; unset or unparsable values
    /// fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            source_dir: lookup("SOURCE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.source_dir),
            output_dir: lookup("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            target_language: lookup("TARGET_LANGUAGE")
                .map(|s| s.trim().to_lowercase())
                .unwrap_or(defaults.target_language),
            llm_api_url: lookup("LLM_API_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.llm_api_url),
            llm_api_key: lookup("LLM_API_KEY").filter(|s| !s.is_empty()),
            llm_model: lookup("LLM_MODEL").unwrap_or(defaults.llm_model),
            llm_timeout_secs: lookup("LLM_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.llm_timeout_secs),
            max_retries: lookup("MAX_RETRIES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            retry_backoff_ms: lookup("RETRY_BACKOFF_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.retry_backoff_ms),
            concurrency: lookup("CONCURRENCY")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.concurrency),
            max_file_size: lookup("MAX_FILE_SIZE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_file_size),
            ignore_patterns: lookup("IGNORE_PATTERNS")
                .map(|s| {
                    s.split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or(defaults.ignore_patterns),
            dry_run: lookup("DRY_RUN")
                .and_then(|s| parse_bool(&s))
                .unwrap_or(defaults.dry_run),
            continue_on_error: lookup("CONTINUE_ON_ERROR")
                .and_then(|s| parse_bool(&s))
                .unwrap_or(defaults.continue_on_error),
            log_format: match lookup("LOG_FORMAT").as_deref().map(str::trim) {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        }
    }

    /// Check the values that would otherwise fail halfway through a run.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(ConverterError::Config("CONCURRENCY must be at least 1".to_string()));
        }
        self.target()?;
        for pattern in &self.ignore_patterns {
            regex::Regex::new(pattern).map_err(|e| {
                ConverterError::Config(format!("invalid ignore pattern {:?}: {}", pattern, e))
            })?;
        }
        Ok(())
    }

    /// The registry entry for the target language.
    pub fn target(&self) -> Result<&'static LanguageDescriptor> {
        language::by_name(&self.target_language)
            .ok_or_else(|| ConverterError::UnknownLanguage(self.target_language.clone()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Filter settings derived from this configuration.
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            max_file_size: self.max_file_size,
            ignore_patterns: self.ignore_patterns.clone(),
            ..Default::default()
        }
    }
}
