//! Expanding-radius candidate search.
//!
//! [`SearchState`] is a bounded state machine: every page moves it forward by
//! exactly one attempt, the radius only grows in `radius_step` increments up
//! to `max_radius`, and it stops once enough recommendations are collected,
//! the attempts are spent, or the radius cannot grow any further.

use crate::best_pick::BestPickSelector;
use crate::config::EngineConfig;
use crate::error::Result;
use nextplace_core::exclusion::{is_chain_name, is_likely_local_business};
use nextplace_core::{Candidate, Category, GeoPoint, PlaceSearch, SearchRequest, TextGeneration};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    TargetReached,
    AttemptsSpent,
    RadiusExhausted,
}

/// Terminal result of a search. Errors are carried by the surrounding `Result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SearchOutcome {
    Found {
        recommendations: Vec<String>,
        stop: StopReason,
    },
    Exhausted {
        stop: StopReason,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchState {
    pub radius: u32,
    pub max_radius: u32,
    pub radius_step: u32,
    pub continuation_token: Option<String>,
    pub attempts: u32,
    pub max_attempts: u32,
    pub target_count: usize,
    pub collected: Vec<String>,
    radius_exhausted: bool,
}

impl SearchState {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            radius: config.initial_radius.min(config.max_radius),
            max_radius: config.max_radius,
            radius_step: config.radius_step,
            continuation_token: None,
            attempts: 0,
            max_attempts: config.max_attempts,
            target_count: config.target_count,
            collected: Vec::new(),
            radius_exhausted: false,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.radius_exhausted
            && self.collected.len() < self.target_count
            && self.attempts < self.max_attempts
    }

    #[must_use]
    pub fn request(&self, category: &Category, center: GeoPoint) -> SearchRequest {
        SearchRequest {
            query: category.to_string(),
            center,
            radius_meters: self.radius,
            continuation_token: self.continuation_token.clone(),
        }
    }

    /// Widens the search, or marks it exhausted at `max_radius`. A pending
    /// token belongs to the old radius and is dropped.
    fn widen(&mut self) {
        self.continuation_token = None;
        if self.radius < self.max_radius {
            self.radius = self.radius.saturating_add(self.radius_step).min(self.max_radius);
        } else {
            self.radius_exhausted = true;
        }
    }

    /// The last query returned nothing.
    pub fn on_empty_page(&mut self) {
        self.widen();
        self.attempts += 1;
    }

    /// The last query returned results; `pick` is set when some survived filtering.
    pub fn on_results(&mut self, pick: Option<String>, next_token: Option<String>) {
        if let Some(pick) = pick {
            self.collected.push(pick);
        }
        match next_token {
            Some(token) => self.continuation_token = Some(token),
            None => self.widen(),
        }
        self.attempts += 1;
    }

    #[must_use]
    pub fn finish(self) -> SearchOutcome {
        let stop = if self.collected.len() >= self.target_count {
            StopReason::TargetReached
        } else if self.radius_exhausted {
            StopReason::RadiusExhausted
        } else {
            StopReason::AttemptsSpent
        };
        if self.collected.is_empty() {
            SearchOutcome::Exhausted { stop }
        } else {
            SearchOutcome::Found {
                recommendations: self.collected,
                stop,
            }
        }
    }
}

/// Drops chain locations and, with `prefer_local`, anything that does not
/// look like a local business.
#[must_use]
pub fn filter_candidates(results: Vec<Candidate>, prefer_local: bool) -> Vec<Candidate> {
    results
        .into_iter()
        .filter(|c| !is_chain_name(&c.name))
        .filter(|c| !prefer_local || is_likely_local_business(c))
        .collect()
}

/// Best rated first, more ratings first on ties. Unrated and NaN ratings count as zero.
pub fn rank_candidates(candidates: &mut [Candidate]) {
    let rating = |c: &Candidate| c.rating.filter(|r| !r.is_nan()).unwrap_or(0.0);
    candidates.sort_by(|a, b| {
        rating(b).total_cmp(&rating(a)).then_with(|| {
            b.user_ratings_total
                .unwrap_or(0)
                .cmp(&a.user_ratings_total.unwrap_or(0))
        })
    });
}

/// Fills in missing descriptions. A failed lookup leaves the candidate as it is.
pub fn describe_candidates<S>(candidates: &mut [Candidate], search: &S)
where
    S: PlaceSearch + ?Sized,
{
    for candidate in candidates.iter_mut().filter(|c| c.description.is_none()) {
        let Some(id) = candidate.id.as_deref() else {
            continue;
        };
        match search.description(id) {
            Ok(description) => candidate.description = description,
            Err(err) => warn!(%err, place_id = id, "place details unavailable"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExpandingRadiusSearch {
    config: EngineConfig,
    best_pick: BestPickSelector,
}

impl ExpandingRadiusSearch {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            best_pick: BestPickSelector,
        }
    }

    /// Runs the search to completion. Any collaborator failure aborts the run.
    pub fn run<S, G>(
        &self,
        category: &Category,
        center: GeoPoint,
        search: &S,
        generator: &G,
    ) -> Result<SearchOutcome>
    where
        S: PlaceSearch + ?Sized,
        G: TextGeneration + ?Sized,
    {
        let mut state = SearchState::new(&self.config);
        while state.is_running() {
            let request = state.request(category, center);
            let page = search.search(&request)?;
            debug!(
                radius = request.radius_meters,
                results = page.results.len(),
                attempt = state.attempts,
                "search page"
            );

            if page.results.is_empty() {
                state.on_empty_page();
                continue;
            }

            let mut candidates = filter_candidates(page.results, self.config.prefer_local);
            let pick = if candidates.is_empty() {
                None
            } else {
                rank_candidates(&mut candidates);
                if self.config.fetch_details {
                    describe_candidates(&mut candidates, search);
                }
                Some(self.best_pick.pick(category, &candidates, generator)?)
            };
            state.on_results(pick, page.next_token);
        }

        let outcome = state.finish();
        info!(%category, ?outcome, "search finished");
        Ok(outcome)
    }
}
