//! Ausschlusslisten für Ketten und Franchise-Betriebe.
//!
//! Alle Prüfungen sind reine Funktionen und vergleichen ohne Beachtung der
//! Groß-/Kleinschreibung per Teilstring.

use crate::place::Candidate;

/// Kategoriebegriffe, die kein brauchbares Vorliebensignal sind.
pub const EXCLUDED_CATEGORY_TERMS: &[&str] = &[
    "fast food",
    "fast-food",
    "chain",
    "franchise",
    "drive-thru",
    "drive-through",
    "quick service",
];

/// Bekannte Ketten, deren Filialen nie empfohlen werden.
pub const EXCLUDED_CHAINS: &[&str] = &[
    "McDonald's",
    "Burger King",
    "Subway",
    "KFC",
    "Wendy's",
    "Taco Bell",
    "Starbucks",
    "Domino's Pizza",
    "Pizza Hut",
    "Dairy Queen",
    "Popeyes",
    "Chick-fil-A",
    "Five Guys",
    "Arby's",
    "Dunkin'",
    "Jack in the Box",
    "Little Caesars",
    "Tim Hortons",
];

/// Namensbestandteile, die auf Ketten oder Konzerne hindeuten
/// (zusätzlich zu [`EXCLUDED_CHAINS`]).
pub const CHAIN_INDICATORS: &[&str] = &[
    "franchise",
    "chain",
    "corp",
    "corporation",
    "inc",
    "incorporated",
    "# location",
    "# branch",
    "store #",
    "llc",
    "ltd",
    "co.",
    "company",
    "international",
    "worldwide",
    "global",
];

/// Hinweise auf lokale oder familiengeführte Betriebe.
pub const LOCAL_BUSINESS_INDICATORS: &[&str] = &[
    "family owned",
    "family run",
    "family business",
    "local",
    "independent",
    "authentic",
    "homemade",
    "handmade",
    "artisan",
    "traditional",
    "original",
    "since",
    "brothers",
    "sisters",
    "& sons",
    "& daughters",
    "house of",
    "casa",
    "ristorante",
    "trattoria",
    "bistro",
    "cafe",
    "deli",
    "market",
];

/// Ab dieser Zahl an Bewertungen gilt ein Ort nicht mehr als „klein“.
pub const SMALL_BUSINESS_MAX_RATINGS: u32 = 1000;

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let haystack = haystack.to_lowercase();
    needles
        .iter()
        .any(|needle| haystack.contains(&needle.to_lowercase()))
}

/// `true`, wenn die Kategorie einen ausgeschlossenen Begriff enthält.
#[must_use]
pub fn is_excluded_category(label: &str) -> bool {
    contains_any(label, EXCLUDED_CATEGORY_TERMS)
}

/// `true`, wenn der Name eine bekannte Kette enthält.
#[must_use]
pub fn is_chain_name(name: &str) -> bool {
    contains_any(name, EXCLUDED_CHAINS)
}

/// Namen wie „Joe's“ oder „Mary & John's“.
fn looks_like_person_name(name: &str) -> bool {
    let mut chars = name.chars().peekable();
    if !chars.next().is_some_and(|c| c.is_ascii_uppercase()) {
        return false;
    }
    let mut lower = 0;
    while chars.peek().is_some_and(char::is_ascii_lowercase) {
        chars.next();
        lower += 1;
    }
    if lower == 0 {
        return false;
    }
    let rest: String = chars.collect();
    rest.is_empty()
        || rest.starts_with("'s")
        || (rest.starts_with(char::is_whitespace) && rest.trim_start().starts_with('&'))
}

/// Strengere Heuristik für `prefer_local`: Kettenindikatoren schließen aus,
/// danach genügt ein lokaler Hinweis, wenige Bewertungen oder ein
/// Personenname.
#[must_use]
pub fn is_likely_local_business(candidate: &Candidate) -> bool {
    if is_chain_name(&candidate.name) || contains_any(&candidate.name, CHAIN_INDICATORS) {
        return false;
    }
    let has_local_hint = contains_any(&candidate.name, LOCAL_BUSINESS_INDICATORS)
        || contains_any(&candidate.address, LOCAL_BUSINESS_INDICATORS);
    let is_small = candidate.user_ratings_total.unwrap_or(0) < SMALL_BUSINESS_MAX_RATINGS;
    has_local_hint || is_small || looks_like_person_name(&candidate.name)
}
