use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid limit {0}: must be a positive integer")]
    InvalidLimit(i64),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Embedding failure: {0}")]
    EmbeddingFailure(String),

    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Catalog error: {0}")]
    Catalog(String),
}

impl Error {
    /// Stable machine-readable name of the variant, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidQuery(_) => "InvalidQuery",
            Error::InvalidLimit(_) => "InvalidLimit",
            Error::InvalidFilter(_) => "InvalidFilter",
            Error::EmbeddingFailure(_) => "EmbeddingFailure",
            Error::IndexUnavailable(_) => "IndexUnavailable",
            Error::InvalidConfig(_) => "InvalidConfig",
            Error::NotFound(_) => "NotFound",
            Error::Catalog(_) => "CatalogError",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
