use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MallardError, Result};
use crate::latency::LatencyPolicy;
use crate::reveal::DEFAULT_CHARS_PER_FRAME;
use crate::store::DEFAULT_GREETING;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub latency: LatencyPolicy,
    pub reveal_chars_per_frame: usize,
    pub tick_rate_ms: u64,
    /// First bot message of every session; `null` starts with an empty chat.
    pub greeting: Option<String>,
    /// Replaces the built-in duck phrases when set.
    pub phrases: Option<Vec<String>>,
    /// Fixed RNG seed for reproducible replies.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            latency: LatencyPolicy::default(),
            reveal_chars_per_frame: DEFAULT_CHARS_PER_FRAME,
            tick_rate_ms: 40,
            greeting: Some(DEFAULT_GREETING.to_string()),
            phrases: None,
            seed: None,
        }
    }
}

impl Config {
    /// Load from the user config directory, falling back to defaults when no
    /// file exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.latency.validate()?;
        if self.reveal_chars_per_frame == 0 {
            return Err(MallardError::InvalidArgument(
                "reveal_chars_per_frame must be at least 1".to_string(),
            ));
        }
        if self.tick_rate_ms == 0 {
            return Err(MallardError::InvalidArgument(
                "tick_rate_ms must be at least 1".to_string(),
            ));
        }
        if let Some(phrases) = &self.phrases {
            if phrases.is_empty() || phrases.iter().any(|p| p.trim().is_empty()) {
                return Err(MallardError::InvalidArgument(
                    "phrases must be a non-empty list of non-blank strings".to_string(),
                ));
            }
        }
        if matches!(&self.greeting, Some(g) if g.trim().is_empty()) {
            return Err(MallardError::InvalidArgument(
                "greeting must not be blank; use null to disable it".to_string(),
            ));
        }
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| MallardError::Config("Could not determine config directory".to_string()))?;

        Ok(config_dir.join("llmallard").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let file = write_config(r#"{ "latency": { "max_ms": 2000 }, "seed": 9 }"#);
        let config = Config::load_from(file.path()).unwrap();

        assert_eq!(config.latency.max_ms, 2_000);
        assert_eq!(config.latency.base_ms, LatencyPolicy::default().base_ms);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.greeting.as_deref(), Some(DEFAULT_GREETING));
    }

    #[test]
    fn test_null_greeting_disables_it() {
        let file = write_config(r#"{ "greeting": null }"#);
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.greeting, None);
    }

    #[test]
    fn test_empty_phrase_list_is_rejected() {
        let file = write_config(r#"{ "phrases": [] }"#);
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, MallardError::InvalidArgument(_)));
    }

    #[test]
    fn test_inverted_latency_is_rejected() {
        let file = write_config(r#"{ "latency": { "base_ms": 9000, "max_ms": 100 } }"#);
        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let file = write_config("{ not json");
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, MallardError::Json(_)));
    }

    #[test]
    fn test_config_path_is_namespaced() {
        if let Ok(path) = Config::config_path() {
            assert!(path.ends_with("llmallard/config.json"));
        }
    }
}
