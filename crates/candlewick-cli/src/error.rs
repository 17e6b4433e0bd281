use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] candlewick_core::ValidationError),

    #[error(transparent)]
    Retrieval(#[from] candlewick_core::RetrievalError),

    #[error(transparent)]
    Config(#[from] candlewick_core::ConfigError),

    #[error("warm-up task failed: {0}")]
    Task(String),

    #[error("strict mode failed: data was degraded or unavailable")]
    StrictModeViolation,

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Retrieval(_) => 2,
            Self::Config(_) => 3,
            Self::Task(_) => 6,
            Self::StrictModeViolation => 5,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}
