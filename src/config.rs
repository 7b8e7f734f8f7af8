use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub live: LiveConfig,
    pub translate: TranslateConfig,
    pub flush: FlushConfig,
    pub ledger: LedgerConfig,
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub sample_rate: u32,
    pub frame_size: usize,
}

/// Live transcription session configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LiveConfig {
    pub model: String,
    /// Source language code ("en", "ja", "ko", "fr") or "mixed".
    pub language: String,
    pub session_timeout_secs: u64,
    pub reconnect_backoff_secs: u64,
}

/// Translation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranslateConfig {
    pub model: String,
    pub context_pairs: usize,
    pub min_chunk_chars: usize,
}

/// Buffer flush policy configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlushConfig {
    pub max_buffer_secs: f64,
    pub sentence_min_mixed_secs: f64,
    pub sentence_min_bilingual_secs: f64,
}

/// Session ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LedgerConfig {
    pub dir: PathBuf,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
            frame_size: defaults::FRAME_SIZE,
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            model: defaults::LIVE_MODEL.to_string(),
            language: "en".to_string(),
            session_timeout_secs: defaults::SESSION_TIMEOUT.as_secs(),
            reconnect_backoff_secs: defaults::RECONNECT_BACKOFF.as_secs(),
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            model: defaults::TRANSLATE_MODEL.to_string(),
            context_pairs: defaults::CONTEXT_PAIRS,
            min_chunk_chars: defaults::MIN_CHUNK_CHARS,
        }
    }
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            max_buffer_secs: defaults::MAX_BUFFER_SECS,
            sentence_min_mixed_secs: defaults::SENTENCE_FLUSH_MIN_MIXED_SECS,
            sentence_min_bilingual_secs: defaults::SENTENCE_FLUSH_MIN_BILINGUAL_SECS,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(defaults::LEDGER_DIR),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file
    /// doesn't exist. Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - PARLEY_DEVICE → audio.device
    /// - PARLEY_LANGUAGE → live.language
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(device) = std::env::var("PARLEY_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        if let Ok(language) = std::env::var("PARLEY_LANGUAGE")
            && !language.is_empty()
        {
            self.live.language = language;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/parley/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("parley")
            .join("config.toml")
    }
}
