//! Auswahl einer Kategorie zwischen Ausnutzung und Erkundung.
//!
//! Mit Wahrscheinlichkeit `exploit_ratio` wird gewichtet nach Häufigkeit aus
//! den bekannten Kategorien gezogen, sonst fragt der Selector den
//! Textgenerator nach einer neuen Kategorie.

use crate::error::{BanditError, Result};
use nextplace_core::{Category, CategoryCounts, TextGeneration};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const RESTAURANT: &str = "restaurant";

/// Zieht einen Schlüssel proportional zu seinem Gewicht.
///
/// Läuft die Map in ihrer festen Reihenfolge ab und liefert den ersten
/// Eintrag, dessen kumulierte Summe den Zufallswert übersteigt. Greift das
/// wegen Rundung nicht, kommt der erste Eintrag zurück. `None` nur bei einer
/// leeren Map.
pub fn weighted_pick<'a, K, R>(weights: &'a BTreeMap<K, u32>, rng: &mut R) -> Option<&'a K>
where
    R: Rng + ?Sized,
{
    let first = weights.keys().next()?;
    let total: f64 = weights.values().map(|&w| f64::from(w)).sum();
    if total <= 0.0 {
        return Some(first);
    }
    let draw = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    for (key, &weight) in weights {
        cumulative += f64::from(weight);
        if cumulative > draw {
            return Some(key);
        }
    }
    Some(first)
}

/// Welcher Zweig die Kategorie geliefert hat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    Exploit,
    Explore,
    /// Erkundung lieferte leeren Text, es wurde gewichtet gezogen.
    ExploreFallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub category: Category,
    pub mode: SelectionMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySelector {
    /// Anteil der Ausnutzungs-Schritte zwischen 0.0 und 1.0.
    pub exploit_ratio: f64,
}

impl Default for CategorySelector {
    fn default() -> Self {
        Self { exploit_ratio: 0.6 }
    }
}

impl CategorySelector {
    #[must_use]
    pub fn new(exploit_ratio: f64) -> Self {
        let exploit_ratio = if exploit_ratio.is_finite() {
            exploit_ratio.clamp(0.0, 1.0)
        } else {
            0.6
        };
        Self { exploit_ratio }
    }

    /// Wählt eine Kategorie. Der einzige externe Aufruf passiert im
    /// Erkundungszweig.
    pub fn select<G, R>(&self, counts: &CategoryCounts, generator: &G, rng: &mut R) -> Result<Selection>
    where
        G: TextGeneration + ?Sized,
        R: Rng + ?Sized,
    {
        if counts.is_empty() {
            return Err(BanditError::NoCategories);
        }

        if rng.gen::<f64>() < self.exploit_ratio {
            let category = Self::exploit(counts, rng)?;
            return Ok(Selection {
                category,
                mode: SelectionMode::Exploit,
            });
        }

        let answer = generator.generate(&novelty_prompt(counts))?;
        match Category::new(answer) {
            Ok(category) => Ok(Selection {
                category,
                mode: SelectionMode::Explore,
            }),
            Err(_) => {
                warn_log!("exploration returned an empty category, drawing from known ones");
                let category = Self::exploit(counts, rng)?;
                Ok(Selection {
                    category,
                    mode: SelectionMode::ExploreFallback,
                })
            }
        }
    }

    /// Gewichtete Ziehung. Gibt es Restaurant-Kategorien und mindestens eine
    /// andere, wird nur unter den anderen gezogen.
    fn exploit<R: Rng + ?Sized>(counts: &CategoryCounts, rng: &mut R) -> Result<Category> {
        let is_restaurant = |c: &Category| c.as_str().to_lowercase().contains(RESTAURANT);
        let has_restaurant = counts.keys().any(is_restaurant);
        let others: CategoryCounts = counts
            .iter()
            .filter(|(c, _)| !is_restaurant(*c))
            .map(|(c, &n)| (c.clone(), n))
            .collect();

        let pool = if has_restaurant && !others.is_empty() {
            &others
        } else {
            counts
        };
        weighted_pick(pool, rng)
            .cloned()
            .ok_or(BanditError::NoCategories)
    }
}

fn novelty_prompt(counts: &CategoryCounts) -> String {
    let known: Vec<&str> = counts.keys().map(Category::as_str).collect();
    format!(
        "A user enjoys these kinds of places: {}.\n\
         Suggest one new category of place they have not tried yet that they might enjoy \
         (for example a museum, a bakery or a climbing gym).\n\
         Answer with the category name only, no explanation.",
        known.join(", ")
    )
}
