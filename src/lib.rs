pub mod audio;
pub mod behavior;
pub mod config;
pub mod hal;
pub mod integration;
pub mod llm;
pub mod mouth;
pub mod servo;
pub mod speech;
pub mod state;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum HeadError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Connectivity error: {0}")]
    Connectivity(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for HeadError {
    fn from(e: std::io::Error) -> Self {
        HeadError::Io(e.to_string())
    }
}

impl HeadError {
    /// Whether this error should push the head into the offline visual state.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, HeadError::Connectivity(_))
    }
}

pub type Result<T> = std::result::Result<T, HeadError>;
