//! Schnittstellen zu externen Diensten.
//!
//! Der Kern ruft diese Traits synchron auf; Zeitüberschreitungen liegen in
//! der Verantwortung der jeweiligen Implementierung.

use crate::error::{GenerationError, SearchError, StoreError};
use crate::place::{Candidate, GeoPoint, LikedPlace, UserId};
use serde::{Deserialize, Serialize};

/// Freitext-Generierung: Prompt rein, Text raus.
pub trait TextGeneration {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Parameter einer einzelnen Suchanfrage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub center: GeoPoint,
    pub radius_meters: u32,
    pub continuation_token: Option<String>,
}

/// Eine Seite Suchergebnisse samt optionalem Fortsetzungstoken.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchPage {
    pub results: Vec<Candidate>,
    pub next_token: Option<String>,
}

/// Geokodierte Ortssuche.
pub trait PlaceSearch {
    fn search(&self, request: &SearchRequest) -> Result<SearchPage, SearchError>;

    /// Kurzbeschreibung eines Ortes über dessen Kennung. Dienste ohne
    /// Detailabfrage liefern `None`.
    fn description(&self, _place_id: &str) -> Result<Option<String>, SearchError> {
        Ok(None)
    }
}

/// Ablage für Likes pro Person und Like-Zähler pro Ort.
pub trait LikeStore {
    fn liked_places(&self, user: &UserId) -> Result<Vec<LikedPlace>, StoreError>;

    /// Setzt oder entfernt ein Like und liefert die Gesamtzahl der Likes des Ortes.
    fn set_liked(
        &mut self,
        user: &UserId,
        place: &LikedPlace,
        liked: bool,
    ) -> Result<u32, StoreError>;
}

impl<T: TextGeneration + ?Sized> TextGeneration for &T {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt)
    }
}

impl<T: PlaceSearch + ?Sized> PlaceSearch for &T {
    fn search(&self, request: &SearchRequest) -> Result<SearchPage, SearchError> {
        (**self).search(request)
    }

    fn description(&self, place_id: &str) -> Result<Option<String>, SearchError> {
        (**self).description(place_id)
    }
}
