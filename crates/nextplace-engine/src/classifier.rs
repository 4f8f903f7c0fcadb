//! Maps liked places to free-text categories via the text generator.

use crate::error::Result;
use nextplace_core::exclusion::is_excluded_category;
use nextplace_core::{Category, CategoryCounts, CategoryMap, LikedPlace, TextGeneration};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct CategoryClassifier;

impl CategoryClassifier {
    /// Issues exactly one generation call for a non-empty list, none otherwise.
    pub fn classify<G>(&self, liked: &[LikedPlace], generator: &G) -> Result<CategoryMap>
    where
        G: TextGeneration + ?Sized,
    {
        if liked.is_empty() {
            return Ok(CategoryMap::new());
        }
        let answer = generator.generate(&categorization_prompt(liked))?;
        parse_category_map(&answer, liked)
    }
}

#[must_use]
pub fn categorization_prompt(liked: &[LikedPlace]) -> String {
    let listing: Vec<String> = liked
        .iter()
        .map(|p| format!("- {} (type: {})", p.name, p.r#type))
        .collect();
    format!(
        "Categorize each of these places into a short, human-readable category \
         such as \"Italian restaurant\", \"coffee shop\" or \"art museum\".\n\
         {}\n\
         Respond with a JSON object that maps each place name exactly as given to its category.",
        listing.join("\n")
    )
}

/// Removes a surrounding code fence and its optional language tag.
#[must_use]
pub fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        let tag_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(rest.len());
        body = &rest[tag_len..];
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Parses the generator's answer. Names that were not asked about and blank
/// labels are dropped.
pub fn parse_category_map(answer: &str, liked: &[LikedPlace]) -> Result<CategoryMap> {
    let raw: BTreeMap<String, String> = serde_json::from_str(strip_code_fence(answer))?;
    let known: HashSet<&str> = liked.iter().map(|p| p.name.as_str()).collect();

    let mut map = CategoryMap::new();
    for (name, label) in raw {
        if !known.contains(name.as_str()) {
            debug!(%name, "dropping category for a place that was not liked");
            continue;
        }
        match Category::new(&label) {
            Ok(category) => {
                map.insert(name, category);
            }
            Err(_) => debug!(%name, "dropping blank category"),
        }
    }
    Ok(map)
}

/// Counts categories, skipping the ones on the exclusion list.
#[must_use]
pub fn count_categories(map: &CategoryMap) -> CategoryCounts {
    let mut counts = CategoryCounts::new();
    for category in map.values() {
        if is_excluded_category(category.as_str()) {
            debug!(%category, "excluded category");
            continue;
        }
        *counts.entry(category.clone()).or_insert(0) += 1;
    }
    counts
}
