use nextplace_core::GenerationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BanditError {
    #[error("Snapshot deserialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("No categories to choose from")]
    NoCategories,
    #[error("Exploration prompt failed: {0}")]
    Generation(#[from] GenerationError),
}

pub type Result<T> = std::result::Result<T, BanditError>;
