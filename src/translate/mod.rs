//! Translation pipeline: request/result types, prompt construction,
//! provider registry, HTTP transport, and the client tying them together.

pub mod client;
pub mod prompt;
pub mod providers;
pub mod transport;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use client::TranslationClient;
pub use providers::{ProviderEntry, ProviderId};

/// Languages the panel can translate into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetLanguage {
    #[default]
    #[serde(rename = "chinese")]
    Chinese,
    #[serde(rename = "japanese")]
    Japanese,
    #[serde(rename = "british-english")]
    BritishEnglish,
}

impl TargetLanguage {
    /// Stored setting code, e.g. `british-english`.
    pub fn code(self) -> &'static str {
        match self {
            TargetLanguage::Chinese => "chinese",
            TargetLanguage::Japanese => "japanese",
            TargetLanguage::BritishEnglish => "british-english",
        }
    }

    /// Parse a stored code. Unknown codes resolve to Chinese everywhere.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "chinese" => TargetLanguage::Chinese,
            "japanese" => TargetLanguage::Japanese,
            "british-english" => TargetLanguage::BritishEnglish,
            other => {
                warn!(code = other, "unknown target language, falling back to chinese");
                TargetLanguage::Chinese
            }
        }
    }

    /// English name used inside prompts.
    pub fn prompt_name(self) -> &'static str {
        match self {
            TargetLanguage::Chinese => "Chinese",
            TargetLanguage::Japanese => "Japanese",
            TargetLanguage::BritishEnglish => "English",
        }
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One translation invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationRequest {
    pub source_text: String,
    pub target_language: TargetLanguage,
    pub preserve_format: bool,
}

/// Successful translation.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub text: String,
    pub provider: ProviderId,
    pub model: String,
}

pub type TranslationResult = Result<Translation, TranslateError>;

/// Which setting was absent when a translation was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingSetting {
    ApiKey,
    Provider,
}

impl fmt::Display for MissingSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingSetting::ApiKey => write!(f, "API key"),
            MissingSetting::Provider => write!(f, "provider"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TranslateError {
    #[error("{0} not configured")]
    ConfigurationMissing(MissingSetting),
    #[error("{message}")]
    Provider { status: u16, message: String },
    #[error("{0}")]
    Network(String),
    #[error("{0}")]
    Parse(String),
}

/// Coarse classification of [`TranslateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConfigurationMissing,
    ProviderError,
    NetworkError,
    ParseError,
}

impl TranslateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslateError::ConfigurationMissing(_) => ErrorKind::ConfigurationMissing,
            TranslateError::Provider { .. } => ErrorKind::ProviderError,
            TranslateError::Network(_) => ErrorKind::NetworkError,
            TranslateError::Parse(_) => ErrorKind::ParseError,
        }
    }
}
