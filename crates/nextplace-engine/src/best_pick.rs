//! Lets the text generator choose one winner among filtered candidates.

use nextplace_core::{Candidate, Category, GenerationError, TextGeneration};
use serde_json::{json, Value};

const NO_RATING: &str = "No rating";

#[derive(Debug, Default, Clone, Copy)]
pub struct BestPickSelector;

impl BestPickSelector {
    /// One generation call; the trimmed answer is returned as is.
    pub fn pick<G>(
        &self,
        category: &Category,
        candidates: &[Candidate],
        generator: &G,
    ) -> Result<String, GenerationError>
    where
        G: TextGeneration + ?Sized,
    {
        let answer = generator.generate(&selection_prompt(category, candidates))?;
        Ok(answer.trim().to_string())
    }
}

fn project(candidate: &Candidate) -> Value {
    let rating = candidate
        .rating
        .map_or_else(|| json!(NO_RATING), |r| json!(r));
    let mut projected = json!({
        "name": candidate.name,
        "address": candidate.address,
        "rating": rating,
    });
    if let Some(description) = &candidate.description {
        projected["description"] = json!(description);
    }
    if let Some(level) = candidate.price_level {
        projected["price_level"] = json!(level);
    }
    projected
}

#[must_use]
pub fn selection_prompt(category: &Category, candidates: &[Candidate]) -> String {
    let projected: Vec<Value> = candidates.iter().map(project).collect();
    format!(
        "A user is looking for a {category}. From the following places, choose the single best one \
         for them and answer with its name, its address and one sentence on why it fits:\n{}",
        Value::Array(projected)
    )
}
