use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] mosaic_core::ConfigError),

    #[error(transparent)]
    Validation(#[from] mosaic_core::ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error("invalid query plan '{path}': {source}")]
    Plan {
        path: String,
        #[source]
        source: mosaic_core::CoreError,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Command(_) | Self::Plan { .. } => 2,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}
