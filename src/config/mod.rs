//! Service configuration: a TOML file plus the API key from the environment.

use std::sync::Arc;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::chat::{ChatProvider, SamplingParams};
use crate::dialogue::{DialogueSettings, Orchestrator};
use crate::persona::{PersonaRegistry, PersonasConfig};
use crate::topic::{TopicConfig, TopicValidator};

mod error;
mod load;

pub use error::ConfigError;
pub use load::{default_config_path, load_config, LoadedConfig};

pub const DEFAULT_LOG_ROTATE_SIZE: u64 = 10 * 1024 * 1024;
pub const DEFAULT_LOG_ROTATE_KEEP: usize = 5;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub sampling: SamplingParams,
    pub dialogue: DialogueSettings,
    pub topic: TopicConfig,
    pub personas: PersonasConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Overrides the Groq endpoint.
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_seconds: None,
            api_key_env: "GROQ_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Log to this file instead of stderr.
    pub path: Option<String>,
    pub rotate_size: u64,
    pub rotate_keep: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            path: None,
            rotate_size: DEFAULT_LOG_ROTATE_SIZE,
            rotate_keep: DEFAULT_LOG_ROTATE_KEEP,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dialogue.window_size == 0 || self.dialogue.context_size == 0 {
            return Err(ConfigError::Dialogue(
                "window_size and context_size must be greater than 0".to_string(),
            ));
        }
        self.personas()?;
        self.topic_validator()?;
        Ok(())
    }

    /// Reads the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<SecretString> {
        std::env::var(&self.provider.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::new)
    }

    pub fn personas(&self) -> Result<PersonaRegistry, ConfigError> {
        Ok(PersonaRegistry::new(self.personas.clone())?)
    }

    pub fn topic_validator(&self) -> Result<TopicValidator, ConfigError> {
        Ok(TopicValidator::new(&self.topic)?)
    }

    /// Wires an orchestrator around `provider` using this configuration.
    pub fn orchestrator(&self, provider: Arc<dyn ChatProvider>) -> Result<Orchestrator, ConfigError> {
        Ok(Orchestrator::builder(provider)
            .personas(self.personas()?)
            .topics(self.topic_validator()?)
            .sampling(self.sampling.clone())
            .settings(self.dialogue)
            .build())
    }
}
