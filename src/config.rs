use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tunables for the whole pipeline. Every field has a default, so a YAML file
/// only needs to name what it overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub request_timeout_secs: u64,
    pub resolver: ResolverConfig,
    pub summarizer: SummarizerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
            resolver: ResolverConfig::default(),
            summarizer: SummarizerConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("parse config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be positive".into()));
        }
        if self.resolver.caption_attempts == 0 {
            return Err(Error::Config("resolver.caption_attempts must be positive".into()));
        }
        self.summarizer.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    pub caption_language: String,
    pub caption_attempts: u32,
    pub caption_backoff_ms: u64,
    /// Cleaned transcripts shorter than this fall back to the description.
    pub min_transcript_chars: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            caption_language: "en".to_owned(),
            caption_attempts: 3,
            caption_backoff_ms: 500,
            min_transcript_chars: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SummarizerConfig {
    /// Candidate models in preference order.
    pub models: Vec<String>,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    pub max_input_chars: usize,
    /// Cap for the single degraded pass after the full-length input failed.
    pub short_input_chars: usize,
    pub min_input_chars: usize,
    pub min_summary_chars: usize,
    pub sentences_per_paragraph: usize,
    pub wait_for_model: bool,
    pub generation: GenerationParams,
    pub short_generation: GenerationParams,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            models: vec![
                "facebook/bart-large-cnn".to_owned(),
                "sshleifer/distilbart-cnn-12-6".to_owned(),
                "philschmid/bart-large-cnn-samsum".to_owned(),
            ],
            max_attempts: 3,
            backoff_base_ms: 1000,
            backoff_max_ms: 8000,
            max_input_chars: 5000,
            short_input_chars: 2000,
            min_input_chars: 50,
            min_summary_chars: 100,
            sentences_per_paragraph: 2,
            wait_for_model: true,
            generation: GenerationParams::default(),
            short_generation: GenerationParams {
                max_length: 200,
                min_length: 50,
                ..GenerationParams::default()
            },
        }
    }
}

impl SummarizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.models.iter().all(|m| m.trim().is_empty()) {
            return Err(Error::Config("summarizer.models must name at least one model".into()));
        }
        if self.max_attempts == 0 {
            return Err(Error::Config("summarizer.max_attempts must be positive".into()));
        }
        if self.max_input_chars == 0 {
            return Err(Error::Config("summarizer.max_input_chars must be positive".into()));
        }
        if self.short_input_chars >= self.max_input_chars {
            return Err(Error::Config(format!(
                "summarizer.short_input_chars ({}) must be below max_input_chars ({})",
                self.short_input_chars, self.max_input_chars
            )));
        }
        if self.generation.min_length > self.generation.max_length
            || self.short_generation.min_length > self.short_generation.max_length
        {
            return Err(Error::Config("generation min_length exceeds max_length".into()));
        }
        Ok(())
    }
}

/// Parameters forwarded verbatim to the inference provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationParams {
    pub max_length: u32,
    pub min_length: u32,
    pub length_penalty: f32,
    pub num_beams: u32,
    pub temperature: f32,
    pub repetition_penalty: f32,
    pub do_sample: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: 300,
            min_length: 100,
            length_penalty: 1.0,
            num_beams: 4,
            temperature: 0.8,
            repetition_penalty: 1.2,
            do_sample: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() -> anyhow::Result<()> {
        let config: Config = serde_yaml::from_str(
            "summarizer:\n  models: [\"a/one\"]\n  max_attempts: 5\nresolver:\n  caption_language: de\n",
        )?;
        assert_eq!(config.summarizer.models, vec!["a/one".to_owned()]);
        assert_eq!(config.summarizer.max_attempts, 5);
        assert_eq!(config.summarizer.max_input_chars, 5000);
        assert_eq!(config.resolver.caption_language, "de");
        assert_eq!(config.resolver.min_transcript_chars, 100);
        assert_eq!(config.request_timeout_secs, 60);
        config.validate()?;
        Ok(())
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed = serde_yaml::from_str::<Config>("summarizer:\n  retries: 3\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn validate_rejects_inconsistent_caps() {
        let mut config = Config::default();
        config.summarizer.short_input_chars = config.summarizer.max_input_chars;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("short_input_chars"));

        let mut config = Config::default();
        config.summarizer.models = vec![" ".to_owned()];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.summarizer.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_yaml_file() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("ytsum.yaml");
        std::fs::write(&path, "request_timeout_secs: 5\n")?;
        let config = Config::load(Some(&path))?;
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(Config::load(None)?, Config::default());
        Ok(())
    }
}
