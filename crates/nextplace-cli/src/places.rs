//! Place search over the Places `nearbysearch` and `details` HTTP APIs.

use anyhow::{Context, Result};
use nextplace_core::{Candidate, PlaceSearch, SearchError, SearchPage, SearchRequest};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::env;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";
const NO_ADDRESS: &str = "Address not available";
const INVALID_REQUEST: &str = "INVALID_REQUEST";
const TOKEN_DELAY: Duration = Duration::from_secs(2);
const TOKEN_RETRIES: u32 = 3;

#[derive(Deserialize, Debug)]
struct Photo {
    photo_reference: String,
}

#[derive(Deserialize, Debug)]
pub(crate) struct NearbyResult {
    name: String,
    vicinity: Option<String>,
    rating: Option<f32>,
    user_ratings_total: Option<u32>,
    place_id: Option<String>,
    price_level: Option<u8>,
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct NearbyResponse {
    #[serde(default)]
    results: Vec<NearbyResult>,
    next_page_token: Option<String>,
    status: String,
    error_message: Option<String>,
}

impl NearbyResponse {
    /// `ZERO_RESULTS` is an empty page, any status other than `OK` an error.
    pub(crate) fn into_page(self) -> std::result::Result<SearchPage, SearchError> {
        match self.status.as_str() {
            "OK" | "ZERO_RESULTS" => {}
            other => {
                return Err(SearchError::Provider(
                    self.error_message.unwrap_or_else(|| other.to_string()),
                ))
            }
        }
        let results = self
            .results
            .into_iter()
            .map(|r| Candidate {
                name: r.name,
                address: r.vicinity.unwrap_or_else(|| NO_ADDRESS.to_string()),
                rating: r.rating,
                user_ratings_total: r.user_ratings_total,
                id: r.place_id,
                description: None,
                price_level: r.price_level,
                photo_reference: r.photos.into_iter().next().map(|p| p.photo_reference),
            })
            .collect();
        Ok(SearchPage {
            results,
            next_token: self.next_page_token,
        })
    }
}

/// Fetches one page. A fresh `next_page_token` is rejected with
/// `INVALID_REQUEST` until the provider has activated it, so token requests
/// are retried after `TOKEN_DELAY`. A token that never becomes valid ends
/// the page chain with an empty page.
pub(crate) fn fetch_page<F, W>(
    paged: bool,
    mut fetch: F,
    mut wait: W,
) -> std::result::Result<SearchPage, SearchError>
where
    F: FnMut() -> std::result::Result<NearbyResponse, SearchError>,
    W: FnMut(Duration),
{
    let mut retries = 0;
    loop {
        let response = fetch()?;
        if !paged || response.status != INVALID_REQUEST {
            return response.into_page();
        }
        if retries == TOKEN_RETRIES {
            warn!(retries, "continuation token never became valid");
            return Ok(SearchPage::default());
        }
        retries += 1;
        debug!(retry = retries, "continuation token not ready yet");
        wait(TOKEN_DELAY);
    }
}

#[derive(Deserialize, Debug)]
struct EditorialSummary {
    overview: Option<String>,
}

#[derive(Deserialize, Debug)]
struct DetailsResult {
    editorial_summary: Option<EditorialSummary>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct DetailsResponse {
    result: Option<DetailsResult>,
    status: String,
    error_message: Option<String>,
}

impl DetailsResponse {
    /// The editorial overview, if the place has one.
    pub(crate) fn into_description(self) -> std::result::Result<Option<String>, SearchError> {
        match self.status.as_str() {
            "OK" => Ok(self
                .result
                .and_then(|r| r.editorial_summary)
                .and_then(|s| s.overview)
                .filter(|o| !o.trim().is_empty())),
            "NOT_FOUND" | "ZERO_RESULTS" => Ok(None),
            other => Err(SearchError::Provider(
                self.error_message.unwrap_or_else(|| other.to_string()),
            )),
        }
    }
}

fn place_api_url(base: &str, endpoint: &str) -> Result<Url> {
    let mut url = Url::parse(base).context("Invalid Places base URL")?;
    url.path_segments_mut()
        .map_err(|()| anyhow::anyhow!("Places base URL cannot be a base"))?
        .pop_if_empty()
        .extend(["maps", "api", "place", endpoint, "json"]);
    Ok(url)
}

pub(crate) fn build_nearby_url(base: &str, request: &SearchRequest, api_key: &str) -> Result<Url> {
    let mut url = place_api_url(base, "nearbysearch")?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("location", &request.center.to_string())
            .append_pair("radius", &request.radius_meters.to_string())
            .append_pair("keyword", &request.query);
        if let Some(token) = &request.continuation_token {
            query.append_pair("pagetoken", token);
        }
        query.append_pair("key", api_key);
    }
    Ok(url)
}

pub(crate) fn build_details_url(base: &str, place_id: &str, api_key: &str) -> Result<Url> {
    let mut url = place_api_url(base, "details")?;
    url.query_pairs_mut()
        .append_pair("place_id", place_id)
        .append_pair("fields", "editorial_summary")
        .append_pair("key", api_key);
    Ok(url)
}

pub struct PlacesClient {
    client: Client,
    base: String,
    api_key: String,
}

impl PlacesClient {
    /// Reads `GOOGLE_PLACES_API_KEY`, and optionally `PLACES_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("GOOGLE_PLACES_API_KEY")
            .context("GOOGLE_PLACES_API_KEY env var is required")?;
        let base = env::var("PLACES_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Url::parse(&base).context("Invalid Places base URL")?;
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base,
            api_key,
        })
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> std::result::Result<T, SearchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| SearchError::Transport(e.without_url().to_string()))?;
        resp.json().map_err(|e| SearchError::Provider(e.to_string()))
    }
}

impl PlaceSearch for PlacesClient {
    fn search(&self, request: &SearchRequest) -> std::result::Result<SearchPage, SearchError> {
        let url = build_nearby_url(&self.base, request, &self.api_key)
            .map_err(|e| SearchError::Transport(e.to_string()))?;
        fetch_page(
            request.continuation_token.is_some(),
            || self.get_json(url.clone()),
            thread::sleep,
        )
    }

    fn description(&self, place_id: &str) -> std::result::Result<Option<String>, SearchError> {
        let url = build_details_url(&self.base, place_id, &self.api_key)
            .map_err(|e| SearchError::Transport(e.to_string()))?;
        self.get_json::<DetailsResponse>(url)?.into_description()
    }
}
