//! Error types for shellquest.

/// Errors produced by the shell engine and the virtual file system.
///
/// Every variant is recoverable: the executor renders each as a single
/// error-kind transcript line and returns control to the prompt.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("no such file or directory: {0}")]
    NotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("is a directory: {0}")]
    IsADirectory(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("command not found: {0}")]
    UnknownCommand(String),

    #[error("{0}")]
    BadArgument(String),

    #[error("level descriptor error: {0}")]
    Descriptor(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ShellError>;
