//! Datenstrukturen für Orte, Kategorien und Standorte.
//!
//! Ein [`LikedPlace`] ist das Minimum, das zur Ableitung von Vorlieben nötig
//! ist. [`Candidate`] beschreibt einen Treffer der Ortssuche. Kategorien sind
//! freier Text und werden über [`Category`] validiert.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Ein Ort, den die Person mit „gefällt mir“ markiert hat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LikedPlace {
    pub name: String,
    /// Grober Typ des Ortes (z. B. "pizza", "cafe").
    /// Wie bei externen Events als raw identifier, damit der JSON-Name `type` bleibt.
    pub r#type: String,
    /// Optionale Kennung des Anbieters; wird von der Like-Ablage gesetzt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl LikedPlace {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            r#type: kind.into(),
            id: None,
        }
    }
}

/// Ein Treffer der Ortssuche.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub rating: Option<f32>,
    /// Anzahl der Bewertungen, sofern der Suchdienst sie liefert.
    #[serde(default)]
    pub user_ratings_total: Option<u32>,
    #[serde(default)]
    pub id: Option<String>,
    /// Kurzbeschreibung aus den Ortsdetails, falls nachgeladen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Preisniveau 0 (kostenlos) bis 4 (sehr teuer).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_reference: Option<String>,
}

impl Candidate {
    pub fn new(name: impl Into<String>, address: impl Into<String>, rating: Option<f32>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            rating,
            user_ratings_total: None,
            id: None,
            description: None,
            price_level: None,
            photo_reference: None,
        }
    }
}

/// Geographischer Mittelpunkt einer Suche.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Prüft die Wertebereiche für Breite und Länge.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoreError::InvalidCoordinate(format!("latitude {latitude}")));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoreError::InvalidCoordinate(format!("longitude {longitude}")));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Freitext-Kategorie, garantiert nicht leer und ohne Rand-Leerzeichen.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category(String);

impl Category {
    pub fn new(label: impl AsRef<str>) -> Result<Self> {
        let trimmed = label.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CoreError::EmptyCategory);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Category {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ortsname → Kategorie.
pub type CategoryMap = BTreeMap<String, Category>;

/// Kategorie → Häufigkeit (immer ≥ 1). Die `BTreeMap` legt die
/// Iterationsreihenfolge fest, auf die sich die gewichtete Auswahl stützt.
pub type CategoryCounts = BTreeMap<Category, u32>;

/// Stabile Kennung einer Person oder `"anonymous"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub const ANONYMOUS: &'static str = "anonymous";

    /// Leere oder fehlende Kennungen werden zu `"anonymous"`.
    pub fn new(id: Option<&str>) -> Self {
        match id.map(str::trim) {
            Some(id) if !id.is_empty() => Self(id.to_string()),
            _ => Self::anonymous(),
        }
    }

    pub fn anonymous() -> Self {
        Self(Self::ANONYMOUS.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
