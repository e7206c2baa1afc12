use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde_json error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("tokenizer error: {0}")]
    Tokenizer(#[from] tokenizers::Error),

    #[error("corpus contains no symbols; a vocabulary needs at least one")]
    EmptyCorpus,

    #[error("symbol {symbol:?} at position {position} is not in the vocabulary")]
    UnknownSymbol { symbol: char, position: usize },

    #[error("token id {id} at position {position} is not in the vocabulary")]
    UnknownId { id: u32, position: usize },

    #[error("vocabulary of {size} symbols exceeds the {limit} ids representable in 16 bits")]
    VocabularyTooLarge { size: usize, limit: u32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("artifact error: {0}")]
    Artifact(String),
}
