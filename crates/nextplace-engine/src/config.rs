use serde::{Deserialize, Serialize};

/// Tuning knobs for one recommendation request. Every field has a default,
/// so partial JSON files are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// First search radius in meters.
    pub initial_radius: u32,
    pub max_radius: u32,
    pub radius_step: u32,
    /// Number of recommendations after which the search stops.
    pub target_count: usize,
    pub max_attempts: u32,
    /// Probability of drawing from known categories instead of exploring.
    pub exploit_ratio: f64,
    /// Apply the stricter local-business heuristic on top of the chain list.
    pub prefer_local: bool,
    /// Look up a description for every candidate that survived filtering.
    pub fetch_details: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_radius: 5000,
            max_radius: 20000,
            radius_step: 5000,
            target_count: 5,
            max_attempts: 5,
            exploit_ratio: 0.6,
            prefer_local: false,
            fetch_details: true,
        }
    }
}
