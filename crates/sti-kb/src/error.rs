use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum KbError {
    /// The knowledge base (or the proxy in front of it) failed to answer.
    #[error("knowledge base lookup failed: {message}")]
    Proxy { message: String },

    #[error("failed to read knowledge base fixture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse knowledge base fixture {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl KbError {
    pub fn proxy(message: impl Into<String>) -> Self {
        Self::Proxy {
            message: message.into(),
        }
    }
}
