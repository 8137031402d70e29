/// Errors raised by the synthesis shell.
///
/// Every variant carries owned strings so the error is `Clone`: a single
/// in-flight load hands the same failure to all of its waiters.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Failed to load {resource}: {reason}")]
    ResourceLoad { resource: String, reason: String },
    #[error("Tokenization failed: {0}")]
    Tokenization(String),
    #[error("Speech generation failed: {0}")]
    Generation(String),
    #[error("Pipeline inference failed: {0}")]
    Inference(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("I/O error: {0}")]
    Io(String),
}

impl ShellError {
    pub(crate) fn load(resource: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::ResourceLoad {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<std::io::Error> for ShellError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;
