use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Failed to load configuration: {0}")]
    Config(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to spawn task {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Task {index} in group '{group}' panicked: {message}")]
    TaskPanicked {
        group: String,
        index: usize,
        message: String,
    },
}

impl From<config::ConfigError> for BenchError {
    fn from(err: config::ConfigError) -> Self {
        BenchError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for BenchError {
    fn from(err: toml::ser::Error) -> Self {
        BenchError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
