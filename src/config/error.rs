use std::io;

use crate::persona::PersonaTableError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config IO error: {0}")]
    Io(#[from] io::Error),
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid topic rules: {0}")]
    TopicRules(#[from] regex::Error),
    #[error("invalid persona table: {0}")]
    Personas(#[from] PersonaTableError),
    #[error("invalid dialogue settings: {0}")]
    Dialogue(String),
    #[error("missing home directory for config paths")]
    MissingHome,
}
