#![warn(clippy::unwrap_used, clippy::expect_used)]

pub mod collab;
pub mod error;
pub mod exclusion;
pub mod place;

pub use collab::{LikeStore, PlaceSearch, SearchPage, SearchRequest, TextGeneration};
pub use error::{CoreError, GenerationError, SearchError, StoreError};
pub use place::{Candidate, Category, CategoryCounts, CategoryMap, GeoPoint, LikedPlace, UserId};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Eine Handlung, die eine Policy vorschlagen kann: Kennung plus grober Typ.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Action {
    pub id: String,
    pub kind: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Decision {
    pub action: Action,
    pub score: f64,
    pub why: String,
}

/// Lernende Policy über undurchsichtige Zustandskennungen.
pub trait Policy {
    /// `None`, wenn für den Zustand noch keine Handlung bekannt ist.
    fn decide(&mut self, state: &str) -> Option<Decision>;
    fn feedback(&mut self, state: &str, action: &str, reward: f64, next_state: &str);
    fn snapshot(&self) -> Value;
    fn load(&mut self, snapshot: Value) -> Result<(), serde_json::Error>;
}
