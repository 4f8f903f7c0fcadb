//! Request boundary: classify → select → search → pick.
//!
//! [`Recommender::get_recommendations`] never fails. Every error path turns
//! into a [`RecommendationResult`] carrying an explanatory message.

use crate::classifier::{count_categories, CategoryClassifier};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::search::{ExpandingRadiusSearch, SearchOutcome};
use nextplace_bandits::CategorySelector;
use nextplace_core::{GeoPoint, LikedPlace, PlaceSearch, TextGeneration};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const NO_LIKED_PLACES: &str = "No liked places found";
pub const NO_LOCATION: &str = "No location provided";
pub const CATEGORIES_UNPROCESSABLE: &str = "Could not process categories";
pub const NO_VALID_CATEGORIES: &str = "No valid categories found";
pub const FAILED: &str = "Failed to get recommendations";

/// Either a list of picks or a human-readable explanation. Both are success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recommendations {
    List(Vec<String>),
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub recommendations: Recommendations,
}

impl RecommendationResult {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            recommendations: Recommendations::Message(text.into()),
        }
    }

    #[must_use]
    pub fn list(items: Vec<String>) -> Self {
        Self {
            recommendations: Recommendations::List(items),
        }
    }

    #[must_use]
    pub fn as_message(&self) -> Option<&str> {
        match &self.recommendations {
            Recommendations::Message(text) => Some(text),
            Recommendations::List(_) => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match &self.recommendations {
            Recommendations::List(items) => Some(items),
            Recommendations::Message(_) => None,
        }
    }
}

/// Checks that need no collaborator: the search center, or the message
/// explaining why there is nothing to recommend.
pub fn check_inputs(
    liked: &[LikedPlace],
    location: Option<GeoPoint>,
) -> std::result::Result<GeoPoint, RecommendationResult> {
    if liked.is_empty() {
        return Err(RecommendationResult::message(NO_LIKED_PLACES));
    }
    location.ok_or_else(|| RecommendationResult::message(NO_LOCATION))
}

pub struct Recommender<G, S, R = StdRng> {
    generator: G,
    search: S,
    classifier: CategoryClassifier,
    selector: CategorySelector,
    radius_search: ExpandingRadiusSearch,
    rng: R,
}

impl<G, S> Recommender<G, S, StdRng>
where
    G: TextGeneration,
    S: PlaceSearch,
{
    pub fn new(generator: G, search: S, config: EngineConfig) -> Self {
        Self::with_rng(generator, search, config, StdRng::from_entropy())
    }
}

impl<G, S, R> Recommender<G, S, R>
where
    G: TextGeneration,
    S: PlaceSearch,
    R: Rng,
{
    pub fn with_rng(generator: G, search: S, config: EngineConfig, rng: R) -> Self {
        Self {
            generator,
            search,
            classifier: CategoryClassifier,
            selector: CategorySelector::new(config.exploit_ratio),
            radius_search: ExpandingRadiusSearch::new(config),
            rng,
        }
    }

    pub fn get_recommendations(
        &mut self,
        liked: &[LikedPlace],
        location: Option<GeoPoint>,
    ) -> RecommendationResult {
        let center = match check_inputs(liked, location) {
            Ok(center) => center,
            Err(message) => return message,
        };

        match self.recommend(liked, center) {
            Ok(result) => result,
            Err(EngineError::Parse(err)) => {
                warn!(%err, "category response could not be parsed");
                RecommendationResult::message(CATEGORIES_UNPROCESSABLE)
            }
            Err(err) => {
                warn!(%err, "recommendation failed");
                RecommendationResult::message(FAILED)
            }
        }
    }

    fn recommend(&mut self, liked: &[LikedPlace], center: GeoPoint) -> Result<RecommendationResult> {
        let categories = self.classifier.classify(liked, &self.generator)?;
        let counts = count_categories(&categories);
        if counts.is_empty() {
            return Ok(RecommendationResult::message(NO_VALID_CATEGORIES));
        }

        let selection = self
            .selector
            .select(&counts, &self.generator, &mut self.rng)?;
        info!(category = %selection.category, mode = ?selection.mode, "category selected");

        let outcome = self
            .radius_search
            .run(&selection.category, center, &self.search, &self.generator)?;
        Ok(match outcome {
            SearchOutcome::Found {
                recommendations, ..
            } => RecommendationResult::list(recommendations),
            SearchOutcome::Exhausted { .. } => RecommendationResult::message(format!(
                "No places found for {} within the search area",
                selection.category
            )),
        })
    }
}
