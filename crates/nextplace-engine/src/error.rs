use nextplace_bandits::BanditError;
use nextplace_core::{GenerationError, SearchError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Category response is not a JSON object: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("Category selection failed: {0}")]
    Selection(#[from] BanditError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
