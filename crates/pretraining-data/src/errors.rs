use std::path::PathBuf;
use thiserror::Error;
use tokenizer::artifacts::CommitError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("input not found or unreadable at {}: {source}", .path.display())]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("token id {id} at position {position} does not fit below {limit}")]
    Range { id: u32, position: usize, limit: u32 },

    #[error("failed to write {}: {source}", .path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("token file {} has odd length {len}; expected pairs of bytes", .path.display())]
    CorruptTokenFile { path: PathBuf, len: u64 },

    #[error("invalid split: {0}")]
    InvalidSplit(String),

    #[error("invalid configuration: {}", .0.join("; "))]
    Config(Vec<String>),

    #[error("failed to parse config: {0}")]
    ConfigFormat(String),

    #[error(transparent)]
    Tokenizer(#[from] tokenizer::Error),
}

impl From<CommitError> for Error {
    fn from(value: CommitError) -> Self {
        Error::Serialization {
            path: value.path,
            source: value.source,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(value: toml::de::Error) -> Self {
        Error::ConfigFormat(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::ConfigFormat(value.to_string())
    }
}
