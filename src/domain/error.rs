use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Enter an Instagram post link.")]
    MissingLink,

    #[error("Provide a valid Instagram post link or shortcode.")]
    InvalidInput,

    #[error("Provide both username and password, or leave both blank.")]
    IncompleteCredentials,

    #[error("A download is already running. Wait for it to finish.")]
    ConcurrentJob,

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Missing dependency: {0}")]
    MissingDependency(String),
}
