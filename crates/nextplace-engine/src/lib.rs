#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Recommendation selection engine.
//!
//! One request runs sequentially through [`CategoryClassifier`],
//! [`CategorySelector`](nextplace_bandits::CategorySelector),
//! [`ExpandingRadiusSearch`] and [`BestPickSelector`], each step waiting on a
//! single collaborator call.

pub mod best_pick;
pub mod classifier;
pub mod config;
pub mod error;
pub mod recommender;
pub mod search;

pub use best_pick::BestPickSelector;
pub use classifier::CategoryClassifier;
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use recommender::{check_inputs, RecommendationResult, Recommendations, Recommender};
pub use search::{ExpandingRadiusSearch, SearchOutcome, SearchState, StopReason};
