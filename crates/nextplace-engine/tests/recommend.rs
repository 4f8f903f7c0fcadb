use nextplace_core::{
    Candidate, GenerationError, GeoPoint, LikedPlace, PlaceSearch, SearchError, SearchPage,
    SearchRequest, TextGeneration,
};
use nextplace_engine::{EngineConfig, Recommender};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;

/// Answers by prompt kind and records every prompt.
struct FakeGenerator {
    categories: Result<String, ()>,
    novel: String,
    pick: String,
    prompts: RefCell<Vec<String>>,
}

impl FakeGenerator {
    fn new(categories: &str) -> Self {
        Self {
            categories: Ok(categories.to_string()),
            novel: "board game cafe".to_string(),
            pick: "Luigi's Trattoria, 3 Elm St".to_string(),
            prompts: RefCell::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            categories: Err(()),
            ..Self::new("")
        }
    }

    fn calls(&self) -> usize {
        self.prompts.borrow().len()
    }

    fn pick_calls(&self) -> usize {
        self.prompts
            .borrow()
            .iter()
            .filter(|p| p.contains("choose the single best"))
            .count()
    }
}

impl TextGeneration for FakeGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        if prompt.starts_with("Categorize") {
            self.categories
                .clone()
                .map_err(|()| GenerationError::Transport("connection reset".into()))
        } else if prompt.contains("Suggest one new category") {
            Ok(self.novel.clone())
        } else {
            Ok(self.pick.clone())
        }
    }
}

type Responder = Box<dyn Fn(&SearchRequest) -> Result<SearchPage, SearchError>>;

struct FakeSearch {
    respond: Responder,
    requests: RefCell<Vec<SearchRequest>>,
    described: RefCell<Vec<String>>,
}

impl FakeSearch {
    fn new(respond: impl Fn(&SearchRequest) -> Result<SearchPage, SearchError> + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            requests: RefCell::new(Vec::new()),
            described: RefCell::new(Vec::new()),
        }
    }

    fn radii(&self) -> Vec<u32> {
        self.requests.borrow().iter().map(|r| r.radius_meters).collect()
    }
}

impl PlaceSearch for FakeSearch {
    fn search(&self, request: &SearchRequest) -> Result<SearchPage, SearchError> {
        self.requests.borrow_mut().push(request.clone());
        (self.respond)(request)
    }

    fn description(&self, place_id: &str) -> Result<Option<String>, SearchError> {
        self.described.borrow_mut().push(place_id.to_string());
        Ok(Some(format!("Notes on {place_id}")))
    }
}

fn page(names: &[&str]) -> SearchPage {
    SearchPage {
        results: names
            .iter()
            .map(|n| Candidate::new(*n, "3 Elm St", Some(4.6)))
            .collect(),
        next_token: None,
    }
}

fn exploit_only() -> EngineConfig {
    EngineConfig {
        exploit_ratio: 1.0,
        ..EngineConfig::default()
    }
}

fn seattle() -> Option<GeoPoint> {
    Some(GeoPoint::new(47.61, -122.33).expect("valid point"))
}

fn tonys() -> Vec<LikedPlace> {
    vec![LikedPlace::new("Tony's Pizza", "pizza")]
}

const ITALIAN: &str = r#"{"Tony's Pizza": "Italian restaurant"}"#;

#[test]
fn empty_likes_short_circuit_without_calls() {
    let generator = FakeGenerator::new(ITALIAN);
    let search = FakeSearch::new(|_| Ok(page(&["Luigi's Trattoria"])));
    let mut engine = Recommender::with_rng(&generator, &search, exploit_only(), StdRng::seed_from_u64(1));

    let result = engine.get_recommendations(&[], seattle());

    assert_eq!(result.as_message(), Some("No liked places found"));
    assert_eq!(generator.calls(), 0);
    assert!(search.requests.borrow().is_empty());
}

#[test]
fn missing_location_short_circuits_without_calls() {
    let generator = FakeGenerator::new(ITALIAN);
    let search = FakeSearch::new(|_| Ok(page(&["Luigi's Trattoria"])));
    let mut engine = Recommender::with_rng(&generator, &search, exploit_only(), StdRng::seed_from_u64(1));

    let result = engine.get_recommendations(&tonys(), None);

    assert_eq!(result.as_message(), Some("No location provided"));
    assert_eq!(generator.calls(), 0);
}

#[test]
fn single_liked_place_searches_its_category() {
    let generator = FakeGenerator::new(ITALIAN);
    let search = FakeSearch::new(|_| Ok(page(&["Luigi's Trattoria"])));
    let mut engine = Recommender::with_rng(&generator, &search, exploit_only(), StdRng::seed_from_u64(2));

    let result = engine.get_recommendations(&tonys(), seattle());

    let picks = result.as_list().expect("recommendations");
    assert!(!picks.is_empty());
    assert!(picks.iter().all(|p| p == "Luigi's Trattoria, 3 Elm St"));
    assert!(search
        .requests
        .borrow()
        .iter()
        .all(|r| r.query == "Italian restaurant"));
}

#[test]
fn empty_first_radius_widens_once_before_success() {
    let generator = FakeGenerator::new(ITALIAN);
    let search = FakeSearch::new(|r| {
        Ok(if r.radius_meters < 10000 {
            SearchPage::default()
        } else {
            page(&["Luigi's Trattoria"])
        })
    });
    let config = EngineConfig {
        target_count: 1,
        ..exploit_only()
    };
    let mut engine = Recommender::with_rng(&generator, &search, config, StdRng::seed_from_u64(3));

    let result = engine.get_recommendations(&tonys(), seattle());

    assert_eq!(result.as_list().map(<[String]>::len), Some(1));
    assert_eq!(search.radii(), vec![5000, 10000]);
    assert_eq!(generator.pick_calls(), 1);
}

#[test]
fn fenced_classification_answer_is_accepted() {
    let generator = FakeGenerator::new(&format!("```json\n{ITALIAN}\n```"));
    let search = FakeSearch::new(|_| Ok(page(&["Luigi's Trattoria"])));
    let mut engine = Recommender::with_rng(&generator, &search, exploit_only(), StdRng::seed_from_u64(4));

    let result = engine.get_recommendations(&tonys(), seattle());

    assert!(result.as_list().is_some());
    assert_eq!(search.requests.borrow()[0].query, "Italian restaurant");
}

#[test]
fn malformed_classification_is_reported_not_raised() {
    let generator = FakeGenerator::new("Tony's Pizza is an Italian restaurant.");
    let search = FakeSearch::new(|_| Ok(page(&["Luigi's Trattoria"])));
    let mut engine = Recommender::with_rng(&generator, &search, exploit_only(), StdRng::seed_from_u64(5));

    let result = engine.get_recommendations(&tonys(), seattle());

    assert_eq!(result.as_message(), Some("Could not process categories"));
    assert!(search.requests.borrow().is_empty());
}

#[test]
fn all_excluded_categories_stop_before_selection() {
    let generator = FakeGenerator::new(r#"{"Tony's Pizza": "Fast food chain"}"#);
    let search = FakeSearch::new(|_| Ok(page(&["Luigi's Trattoria"])));
    let mut engine = Recommender::with_rng(&generator, &search, EngineConfig::default(), StdRng::seed_from_u64(6));

    let result = engine.get_recommendations(&tonys(), seattle());

    assert_eq!(result.as_message(), Some("No valid categories found"));
    assert_eq!(generator.calls(), 1);
    assert!(search.requests.borrow().is_empty());
}

#[test]
fn exhausted_search_is_an_explanatory_message() {
    let generator = FakeGenerator::new(ITALIAN);
    let search = FakeSearch::new(|_| Ok(SearchPage::default()));
    let mut engine = Recommender::with_rng(&generator, &search, exploit_only(), StdRng::seed_from_u64(7));

    let result = engine.get_recommendations(&tonys(), seattle());

    assert_eq!(
        result.as_message(),
        Some("No places found for Italian restaurant within the search area")
    );
    let radii = search.radii();
    assert!(radii.len() <= 5);
    assert!(radii.windows(2).all(|w| w[0] <= w[1]));
    assert!(radii.iter().all(|&r| r <= 20000));
}

#[test]
fn chain_only_results_never_reach_best_pick() {
    let generator = FakeGenerator::new(ITALIAN);
    let search = FakeSearch::new(|_| Ok(page(&["Pizza Hut", "Domino's Pizza"])));
    let mut engine = Recommender::with_rng(&generator, &search, exploit_only(), StdRng::seed_from_u64(8));

    let result = engine.get_recommendations(&tonys(), seattle());

    assert!(result.as_message().is_some());
    assert_eq!(generator.pick_calls(), 0);
}

#[test]
fn continuation_tokens_are_followed_at_the_same_radius() {
    let generator = FakeGenerator::new(ITALIAN);
    let search = FakeSearch::new(|r| {
        let mut p = page(&["Luigi's Trattoria"]);
        if r.continuation_token.is_none() {
            p.next_token = Some("page-2".into());
        }
        Ok(p)
    });
    let config = EngineConfig {
        target_count: 2,
        ..exploit_only()
    };
    let mut engine = Recommender::with_rng(&generator, &search, config, StdRng::seed_from_u64(9));

    engine.get_recommendations(&tonys(), seattle());

    let requests = search.requests.borrow();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].continuation_token.as_deref(), Some("page-2"));
    assert_eq!(requests[1].radius_meters, 5000);
}

#[test]
fn collaborator_failures_become_a_generic_message() {
    let generator = FakeGenerator::failing();
    let search = FakeSearch::new(|_| Ok(page(&["Luigi's Trattoria"])));
    let mut engine = Recommender::with_rng(&generator, &search, exploit_only(), StdRng::seed_from_u64(10));
    assert_eq!(
        engine.get_recommendations(&tonys(), seattle()).as_message(),
        Some("Failed to get recommendations")
    );

    let generator = FakeGenerator::new(ITALIAN);
    let search = FakeSearch::new(|_| Err(SearchError::Transport("timeout".into())));
    let mut engine = Recommender::with_rng(&generator, &search, exploit_only(), StdRng::seed_from_u64(11));
    assert_eq!(
        engine.get_recommendations(&tonys(), seattle()).as_message(),
        Some("Failed to get recommendations")
    );
}

#[test]
fn exploration_searches_the_generated_category() {
    let generator = FakeGenerator::new(ITALIAN);
    let search = FakeSearch::new(|_| Ok(page(&["Meeple Lounge"])));
    let config = EngineConfig {
        exploit_ratio: 0.0,
        target_count: 1,
        ..EngineConfig::default()
    };
    let mut engine = Recommender::with_rng(&generator, &search, config, StdRng::seed_from_u64(12));

    engine.get_recommendations(&tonys(), seattle());

    assert_eq!(search.requests.borrow()[0].query, "board game cafe");
}

#[test]
fn details_reach_the_best_pick_prompt() {
    let generator = FakeGenerator::new(ITALIAN);
    let search = FakeSearch::new(|_| {
        let mut p = page(&["Luigi's Trattoria"]);
        p.results[0].id = Some("p1".into());
        Ok(p)
    });
    let config = EngineConfig {
        target_count: 1,
        ..exploit_only()
    };
    let mut engine = Recommender::with_rng(&generator, &search, config.clone(), StdRng::seed_from_u64(13));

    assert!(engine.get_recommendations(&tonys(), seattle()).as_list().is_some());
    assert_eq!(*search.described.borrow(), vec!["p1".to_string()]);
    assert!(generator
        .prompts
        .borrow()
        .iter()
        .any(|p| p.contains("choose the single best") && p.contains("Notes on p1")));

    let search = FakeSearch::new(|_| {
        let mut p = page(&["Luigi's Trattoria"]);
        p.results[0].id = Some("p1".into());
        Ok(p)
    });
    let config = EngineConfig {
        fetch_details: false,
        ..config
    };
    let mut engine = Recommender::with_rng(&generator, &search, config, StdRng::seed_from_u64(14));
    engine.get_recommendations(&tonys(), seattle());
    assert!(search.described.borrow().is_empty());
}

#[test]
fn empty_continuation_page_keeps_earlier_picks() {
    let generator = FakeGenerator::new(ITALIAN);
    let search = FakeSearch::new(|r| {
        Ok(match (&r.continuation_token, r.radius_meters) {
            (Some(_), _) => SearchPage::default(),
            (None, 5000) => SearchPage {
                next_token: Some("not-yet-valid".into()),
                ..page(&["Luigi's Trattoria"])
            },
            (None, _) => SearchPage::default(),
        })
    });
    let mut engine = Recommender::with_rng(&generator, &search, exploit_only(), StdRng::seed_from_u64(15));

    let result = engine.get_recommendations(&tonys(), seattle());

    assert_eq!(result.as_list(), Some(&["Luigi's Trattoria, 3 Elm St".to_string()][..]));
    let requests = search.requests.borrow();
    assert_eq!(requests[1].continuation_token.as_deref(), Some("not-yet-valid"));
    assert_eq!(requests[2].radius_meters, 10000);
    assert!(requests[2].continuation_token.is_none());
}
