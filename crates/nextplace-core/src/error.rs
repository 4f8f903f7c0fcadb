use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Category label must not be empty")]
    EmptyCategory,
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Fehler des Textgenerierungsdienstes (Transport oder Anbieter).
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Text generation transport failed: {0}")]
    Transport(String),
    #[error("Text generation provider error: {0}")]
    Provider(String),
}

/// Fehler der Ortssuche. Eine leere Trefferliste ist kein Fehler.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Place search transport failed: {0}")]
    Transport(String),
    #[error("Place search provider error: {0}")]
    Provider(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Like store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Like store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
