//! Settings persistence behind a small key/value store trait.
//! `JsonFileStore` keeps a flat JSON object on disk; `MemoryStore` backs tests
//! and embedders that manage persistence themselves.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::i18n::InterfaceLanguage;
use crate::translate::{MissingSetting, ProviderId, TargetLanguage, TranslateError};

/// Stored setting names.
pub mod keys {
    pub const API_KEY: &str = "apiKey";
    pub const SELECTED_AI: &str = "selectedAI";
    pub const MODEL_NAME: &str = "modelName";
    pub const TARGET_LANGUAGE: &str = "targetLanguage";
    pub const INTERFACE_LANGUAGE: &str = "interfaceLanguage";
    pub const DELAY_SECONDS: &str = "delaySeconds";
    pub const MAX_WIDTH: &str = "maxWidth";
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("config file {0} does not hold a JSON object")]
    NotAnObject(PathBuf),
}

pub trait ConfigStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value) -> Result<(), ConfigError>;

    /// Pick up changes written by someone else. No-op for in-memory stores.
    fn reload(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

pub trait ConfigStoreExt: ConfigStore {
    /// Typed read. Absent, null, or mistyped values yield `default`.
    fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.get(key) {
            None | Some(Value::Null) => default,
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(key, error = %e, "config value has unexpected type, using default");
                default
            }),
        }
    }
}

impl<S: ConfigStore + ?Sized> ConfigStoreExt for S {}

#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(entries: impl IntoIterator<Item = (&'static str, Value)>) -> Self {
        let values = entries
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), ConfigError> {
        self.values.write().insert(key.to_owned(), value);
        Ok(())
    }
}

/// JSON object file, rewritten on every `set`.
pub struct JsonFileStore {
    path: PathBuf,
    values: RwLock<Map<String, Value>>,
}

impl JsonFileStore {
    /// Open `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => Map::new(),
            Ok(content) => match serde_json::from_str::<Value>(&content)? {
                Value::Object(map) => map,
                _ => return Err(ConfigError::NotAnObject(path)),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "config file not found, starting with defaults");
                Map::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }
}

impl ConfigStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), ConfigError> {
        let mut values = self.values.write();
        values.insert(key.to_owned(), value);
        let content = serde_json::to_string_pretty(&*values)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Re-read the file, e.g. after an external settings dialog saved it.
    fn reload(&self) -> Result<(), ConfigError> {
        let fresh = Self::open(self.path.clone())?;
        *self.values.write() = fresh.values.into_inner();
        Ok(())
    }
}

pub const DEFAULT_DELAY_SECONDS: f64 = 0.5;
pub const DEFAULT_MAX_WIDTH: f64 = 400.0;
const DELAY_RANGE: (f64, f64) = (0.0, 5.0);
const MAX_WIDTH_RANGE: (f64, f64) = (200.0, 1000.0);

/// Presentation settings, read once at startup and on `settings_changed`.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub delay: Duration,
    pub max_width: f64,
    pub target_language: TargetLanguage,
    pub interface_language: InterfaceLanguage,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs_f64(DEFAULT_DELAY_SECONDS),
            max_width: DEFAULT_MAX_WIDTH,
            target_language: TargetLanguage::Chinese,
            interface_language: InterfaceLanguage::Zh,
        }
    }
}

impl Settings {
    pub fn load(store: &dyn ConfigStore) -> Self {
        let delay_seconds = clamp_setting(
            keys::DELAY_SECONDS,
            store.get_or(keys::DELAY_SECONDS, DEFAULT_DELAY_SECONDS),
            DEFAULT_DELAY_SECONDS,
            DELAY_RANGE,
        );
        let max_width = clamp_setting(
            keys::MAX_WIDTH,
            store.get_or(keys::MAX_WIDTH, DEFAULT_MAX_WIDTH),
            DEFAULT_MAX_WIDTH,
            MAX_WIDTH_RANGE,
        );
        let target: String = store.get_or(keys::TARGET_LANGUAGE, "chinese".to_owned());
        let interface: String = store.get_or(keys::INTERFACE_LANGUAGE, "zh".to_owned());

        let settings = Self {
            delay: Duration::from_secs_f64(delay_seconds),
            max_width,
            target_language: TargetLanguage::from_code(&target),
            interface_language: InterfaceLanguage::from_code(&interface),
        };
        info!(
            delay_ms = settings.delay.as_millis() as u64,
            max_width = settings.max_width,
            target = %settings.target_language,
            interface = ?settings.interface_language,
            "settings_loaded"
        );
        settings
    }

    pub fn save(&self, store: &dyn ConfigStore) -> Result<(), ConfigError> {
        store.set(keys::DELAY_SECONDS, Value::from(self.delay.as_secs_f64()))?;
        store.set(keys::MAX_WIDTH, Value::from(self.max_width))?;
        store.set(keys::TARGET_LANGUAGE, Value::from(self.target_language.code()))?;
        store.set(keys::INTERFACE_LANGUAGE, Value::from(self.interface_language.code()))?;
        Ok(())
    }
}

fn clamp_setting(key: &str, value: f64, default: f64, (min, max): (f64, f64)) -> f64 {
    if !value.is_finite() {
        warn!(key, "non-finite setting, using default");
        return default;
    }
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!(key, value, clamped, "setting out of range");
    }
    clamped
}

/// Provider credentials and model for one request. Never written back.
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    pub provider: ProviderId,
    pub api_key: String,
    /// Effective model: configured name, or the provider default.
    pub model: String,
    pub endpoint: String,
}

impl ProviderConfig {
    pub fn load(store: &dyn ConfigStore) -> Result<Self, TranslateError> {
        let api_key = store.get_or(keys::API_KEY, String::new()).trim().to_owned();
        if api_key.is_empty() {
            return Err(TranslateError::ConfigurationMissing(MissingSetting::ApiKey));
        }

        let selected: String = store.get_or(keys::SELECTED_AI, String::new());
        let provider = ProviderId::from_key(&selected).ok_or_else(|| {
            if !selected.trim().is_empty() {
                warn!(selected = %selected, "unknown provider id in settings");
            }
            TranslateError::ConfigurationMissing(MissingSetting::Provider)
        })?;

        let configured: String = store.get_or(keys::MODEL_NAME, String::new());
        let entry = provider.entry();
        let model = entry.effective_model(&configured).to_owned();
        let endpoint = entry.endpoint_for(&model);

        Ok(Self {
            provider,
            api_key,
            model,
            endpoint,
        })
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &mask_key(&self.api_key))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// First four characters then `****`, for logs.
pub fn mask_key(key: &str) -> String {
    if key.is_empty() {
        return "EMPTY".to_owned();
    }
    let head: String = key.chars().take(4).collect();
    format!("{head}**** (len={})", key.chars().count())
}
