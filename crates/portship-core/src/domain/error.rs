//! Domain-level error taxonomy for portship.

/// Errors produced across the release pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PortshipError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("checkout failed: {0}")]
    Checkout(String),

    #[error("git error: {0}")]
    Git(String),

    #[error("failed to execute `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command `{command}` exited with code {code}: {stderr}")]
    Command {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("no content hash found in trial build output")]
    HashNotFound,

    #[error("verified build requested before a trial build produced a content hash")]
    MissingTrialHash,

    #[error("verification install failed with exit code {code}")]
    FinalInstall { code: i32 },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PortshipError {
    /// Process exit code for this error.
    ///
    /// Checkout and hash-extraction failures exit 1. The verification
    /// install's own exit code is propagated, as is the status of any
    /// other failed command when it carries one; everything else maps
    /// to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            PortshipError::FinalInstall { code } => *code,
            PortshipError::Command { code, .. } if *code > 0 => *code,
            _ => 1,
        }
    }
}

/// Result type for portship operations.
pub type Result<T> = std::result::Result<T, PortshipError>;
