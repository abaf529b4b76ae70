use thiserror::Error;

/// Failures raised while adapting a Qt TS document.
///
/// Any of these aborts processing of the current document; nothing is
/// retried and no partial document is returned.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// The raw input could not be opened or read, or the output could not be written
    #[error("{message}: {source}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// The raw input is not well-formed enough to be tokenized
    #[error("unable to tokenize document at byte {position}: {message}")]
    Parse { position: usize, message: String },

    /// A document part did not have the expected skeleton shape
    #[error("unexpected resource type: {0}")]
    UnexpectedResource(String),

    /// A locale tag could not be parsed or used for a rewrite
    #[error("invalid locale: {0}")]
    InvalidLocale(String),

    /// Invalid or unreadable adapter configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl AdapterError {
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        AdapterError::Io {
            message: message.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AdapterError>;
