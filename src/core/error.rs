use thiserror::Error;

#[derive(Error, Debug)]
pub enum FpsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Report sink error: {0}")]
    Sink(String),

    #[error("Report worker error: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for monitor operations
pub type Result<T> = std::result::Result<T, FpsError>;

impl FpsError {
    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new sink error
    pub fn sink<S: Into<String>>(msg: S) -> Self {
        Self::Sink(msg.into())
    }

    /// Creates a new worker error
    pub fn worker<S: Into<String>>(msg: S) -> Self {
        Self::Worker(msg.into())
    }

    /// Returns the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::Yaml(_) => "config",
            Self::Sink(_) => "sink",
            Self::Worker(_) => "worker",
            Self::Io(_) => "io",
        }
    }
}
