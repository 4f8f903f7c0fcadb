//! Tabellarischer Q-Learning-Agent mit Abwechslungsregel.
//!
//! Der Agent hält pro Zustand eine Zeile mit Handlungswerten und lernt per
//!
//! ```text
//! Q(s,a) ← Q(s,a) + α · (r + γ · max_a' Q(s',a') − Q(s,a))
//! ```
//!
//! Bei der Auswahl wird der zuletzt empfohlene Typ übersprungen, solange es
//! Alternativen gibt.

use crate::error::Result;
use indexmap::IndexMap;
use nextplace_core::{Action, Decision, Policy};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

pub const DEFAULT_ALPHA: f64 = 0.1;
pub const DEFAULT_GAMMA: f64 = 0.9;
/// Typ für Kennungen ohne bekannten Begriff.
pub const DEFAULT_KIND: &str = "other";

type Row = IndexMap<String, f64>;

/// Leitet den groben Typ aus der Kennung ab.
#[must_use]
pub fn action_kind(id: &str) -> String {
    let id = id.to_lowercase();
    if id.contains("burger") {
        "burger".to_string()
    } else if id.contains("pizza") {
        "pizza".to_string()
    } else {
        DEFAULT_KIND.to_string()
    }
}

/// Serialisierte Form für [`Policy::snapshot`] / [`Policy::load`].
#[derive(Debug, Serialize, Deserialize)]
struct QSnapshot {
    alpha: f64,
    gamma: f64,
    #[serde(default)]
    table: IndexMap<String, Row>,
    #[serde(default)]
    last_recommended_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QAgent {
    /// Lernrate zwischen 0.0 und 1.0.
    pub alpha: f64,
    /// Diskontfaktor zwischen 0.0 und 1.0.
    pub gamma: f64,
    table: IndexMap<String, Row>,
    last_recommended_type: Option<String>,
    rng: StdRng,
}

impl Default for QAgent {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA, DEFAULT_GAMMA)
    }
}

fn unit_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

impl QAgent {
    #[must_use]
    pub fn new(alpha: f64, gamma: f64) -> Self {
        Self::with_rng(alpha, gamma, StdRng::from_entropy())
    }

    /// Reproduzierbare Auswahl für Tests und Simulationen.
    #[must_use]
    pub fn seeded(alpha: f64, gamma: f64, seed: u64) -> Self {
        Self::with_rng(alpha, gamma, StdRng::seed_from_u64(seed))
    }

    fn with_rng(alpha: f64, gamma: f64, rng: StdRng) -> Self {
        Self {
            alpha: unit_or(alpha, DEFAULT_ALPHA),
            gamma: unit_or(gamma, DEFAULT_GAMMA),
            table: IndexMap::new(),
            last_recommended_type: None,
            rng,
        }
    }

    fn row_mut(&mut self, state: &str) -> &mut Row {
        self.table.entry(state.to_string()).or_default()
    }

    /// Temporal-Difference-Update; liefert den neuen Wert `Q(s,a)`.
    ///
    /// Unbekannte Zustände werden leer angelegt. Ist die Zeile von `s'` leer,
    /// zählt die Belohnung selbst als `max Q(s',·)`. Nicht-endliche
    /// Belohnungen werden verworfen.
    pub fn update(&mut self, state: &str, action: &str, reward: f64, next_state: &str) -> f64 {
        self.row_mut(state);
        let max_next = self
            .row_mut(next_state)
            .values()
            .copied()
            .fold(None, |max: Option<f64>, q| Some(max.map_or(q, |m| m.max(q))))
            .unwrap_or(reward);

        let (alpha, gamma) = (self.alpha, self.gamma);
        let row = self.row_mut(state);
        let current = row.get(action).copied().unwrap_or(0.0);
        if !reward.is_finite() {
            warn_log!("ignoring non-finite reward {reward} for {state}/{action}");
            return current;
        }
        let updated = current + alpha * (reward + gamma * max_next - current);
        row.insert(action.to_string(), updated);
        updated
    }

    #[must_use]
    pub fn q_value(&self, state: &str, action: &str) -> Option<f64> {
        self.table.get(state)?.get(action).copied()
    }

    #[must_use]
    pub fn last_recommended_type(&self) -> Option<&str> {
        self.last_recommended_type.as_deref()
    }

    #[must_use]
    pub fn state_count(&self) -> usize {
        self.table.len()
    }

    /// Wählt eine Handlung für `state` und merkt sich deren Typ.
    ///
    /// Handlungen vom zuletzt empfohlenen Typ werden ausgelassen, unter den
    /// übrigen wird gleichverteilt gezogen. Bleibt keine übrig, gewinnt die
    /// Handlung mit dem höchsten Wert (bei Gleichstand die zuerst gesehene).
    pub fn select_action(&mut self, state: &str) -> Option<Action> {
        self.decide_inner(state).map(|(action, _, _)| action)
    }

    fn decide_inner(&mut self, state: &str) -> Option<(Action, f64, &'static str)> {
        let row = self.table.entry(state.to_string()).or_default();
        if row.is_empty() {
            return None;
        }

        let last = self.last_recommended_type.as_deref();
        let diverse: Vec<(Action, f64)> = row
            .iter()
            .map(|(id, &q)| {
                let action = Action {
                    id: id.clone(),
                    kind: action_kind(id),
                };
                (action, q)
            })
            .filter(|(action, _)| Some(action.kind.as_str()) != last)
            .collect();

        let chosen = if let Some((action, q)) = diverse.choose(&mut self.rng) {
            (action.clone(), *q, "random among other types")
        } else {
            let mut best: Option<(&String, f64)> = None;
            for (id, &q) in row.iter() {
                if best.map_or(true, |(_, b)| q > b) {
                    best = Some((id, q));
                }
            }
            let (id, q) = best?;
            let action = Action {
                id: id.clone(),
                kind: action_kind(id),
            };
            (action, q, "highest value, no other type left")
        };

        self.last_recommended_type = Some(chosen.0.kind.clone());
        Some(chosen)
    }
}

impl Policy for QAgent {
    fn decide(&mut self, state: &str) -> Option<Decision> {
        self.decide_inner(state).map(|(action, score, why)| Decision {
            action,
            score,
            why: why.into(),
        })
    }

    fn feedback(&mut self, state: &str, action: &str, reward: f64, next_state: &str) {
        self.update(state, action, reward, next_state);
    }

    /// Persistiert Parameter, Tabelle und zuletzt empfohlenen Typ als JSON.
    fn snapshot(&self) -> Value {
        json!({
            "alpha": self.alpha,
            "gamma": self.gamma,
            "table": self.table,
            "last_recommended_type": self.last_recommended_type,
        })
    }

    fn load(&mut self, snapshot: Value) -> std::result::Result<(), serde_json::Error> {
        let snap: QSnapshot = serde_json::from_value(snapshot)?;
        if !(snap.alpha.is_finite() && snap.gamma.is_finite()) {
            warn_log!("snapshot carries non-finite parameters, using defaults");
        }
        self.alpha = unit_or(snap.alpha, DEFAULT_ALPHA);
        self.gamma = unit_or(snap.gamma, DEFAULT_GAMMA);
        self.table = snap.table;
        self.last_recommended_type = snap.last_recommended_type;
        Ok(())
    }
}

/// Ein Agent für mehrere gleichzeitige Anfragen einer Sitzung.
///
/// `update` und `select_action` laufen unter demselben Lock, damit sich das
/// Anlegen neuer Zeilen nicht überlappt.
#[derive(Debug, Clone, Default)]
pub struct SharedAgent {
    inner: Arc<Mutex<QAgent>>,
}

impl SharedAgent {
    #[must_use]
    pub fn new(agent: QAgent) -> Self {
        Self {
            inner: Arc::new(Mutex::new(agent)),
        }
    }

    pub fn update(&self, state: &str, action: &str, reward: f64, next_state: &str) -> f64 {
        self.inner.lock().update(state, action, reward, next_state)
    }

    pub fn select_action(&self, state: &str) -> Option<Action> {
        self.inner.lock().select_action(state)
    }

    #[must_use]
    pub fn snapshot(&self) -> Value {
        self.inner.lock().snapshot()
    }

    /// Lädt einen Snapshot in den geteilten Agenten.
    pub fn load(&self, snapshot: Value) -> Result<()> {
        self.inner.lock().load(snapshot)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn action_kind_buckets() {
        assert_eq!(action_kind("joes-burger-shack"), "burger");
        assert_eq!(action_kind("PizzaPlace_12"), "pizza");
        assert_eq!(action_kind("boba-tea"), DEFAULT_KIND);
    }

    #[test]
    fn first_update_on_fresh_states_uses_reward_as_max() {
        let mut agent = QAgent::seeded(0.1, 0.9, 1);
        let q = agent.update("s", "pizza-1", 1.0, "s2");
        // 0 + 0.1 * (1 + 0.9 * 1 - 0)
        assert!((q - 0.19).abs() < 1e-12);
        assert_eq!(agent.state_count(), 2);
        assert!(q.is_finite());
    }

    #[test]
    fn update_uses_max_of_next_state() {
        let mut agent = QAgent::seeded(0.5, 0.5, 1);
        agent.update("next", "a", 4.0, "elsewhere");
        let next_max = agent.q_value("next", "a").unwrap();
        let q = agent.update("s", "b", 1.0, "next");
        assert!((q - 0.5 * (1.0 + 0.5 * next_max)).abs() < 1e-12);
    }

    #[test]
    fn update_at_fixed_point_is_unchanged() {
        let mut agent = QAgent::seeded(0.1, 0.9, 1);
        // Q(s,a) = 0 und r = 0: 0 + 0.9 * max(0) = 0
        agent.update("s", "a", 0.0, "other");
        let before = agent.q_value("s", "a").unwrap();
        assert_eq!(before, 0.0);
        agent.update("s", "a", 0.0, "s");
        assert_eq!(agent.q_value("s", "a").unwrap(), before);
    }

    #[test]
    fn update_at_nonzero_fixed_point_is_unchanged() {
        // γ = 1, einzige Aktion mit Wert c: c + α(0 + c - c) = c
        let mut agent = QAgent::seeded(1.0, 0.0, 1);
        agent.update("s", "a", 2.5, "t");
        assert_eq!(agent.q_value("s", "a").unwrap(), 2.5);

        agent.alpha = 0.1;
        agent.gamma = 1.0;
        let q = agent.update("s", "a", 0.0, "s");
        assert_eq!(q, 2.5);

        // γ < 1: Fixpunkt bei r = c(1 - γ)
        agent.gamma = 0.9;
        let q = agent.update("s", "a", 2.5 * (1.0 - 0.9), "s");
        assert!((q - 2.5).abs() < 1e-12);
    }

    #[test]
    fn non_finite_reward_is_ignored() {
        let mut agent = QAgent::seeded(0.1, 0.9, 1);
        agent.update("s", "a", 1.0, "t");
        let before = agent.q_value("s", "a").unwrap();
        agent.update("s", "a", f64::NAN, "t");
        assert_eq!(agent.q_value("s", "a").unwrap(), before);
    }

    #[test]
    fn unknown_state_has_no_action() {
        let mut agent = QAgent::default();
        assert!(agent.select_action("nowhere").is_none());
        assert_eq!(agent.state_count(), 1);
        assert!(agent.last_recommended_type().is_none());
    }

    #[test]
    fn consecutive_selections_alternate_types() {
        let mut agent = QAgent::seeded(0.1, 0.9, 99);
        for id in ["burger-1", "burger-2", "pizza-1", "tea-1"] {
            agent.update("home", id, 1.0, "home");
        }
        let mut previous: Option<String> = None;
        let mut seen = HashSet::new();
        for _ in 0..100 {
            let action = agent.select_action("home").expect("actions known");
            assert_ne!(Some(action.kind.clone()), previous);
            assert_eq!(agent.last_recommended_type(), Some(action.kind.as_str()));
            seen.insert(action.kind.clone());
            previous = Some(action.kind);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn single_type_falls_back_to_highest_value() {
        let mut agent = QAgent::seeded(1.0, 0.0, 3);
        agent.update("s", "pizza-low", 1.0, "t");
        agent.update("s", "pizza-high", 5.0, "t");
        agent.update("s", "pizza-tie", 5.0, "t");

        let first = agent.select_action("s").unwrap();
        assert_eq!(first.kind, "pizza");
        // Nun ist "pizza" gesperrt, es bleibt nur der Rückfall.
        let second = agent.decide("s").unwrap();
        assert_eq!(second.action.id, "pizza-high");
        assert_eq!(second.score, 5.0);
        assert!(second.why.contains("highest"));
        assert_eq!(agent.last_recommended_type(), Some("pizza"));
    }

    #[test]
    fn snapshot_roundtrip_keeps_table_and_memory() {
        let mut agent = QAgent::seeded(0.2, 0.8, 5);
        agent.update("s", "burger-1", 1.0, "t");
        agent.select_action("s");
        let snap = agent.snapshot();

        let mut restored = QAgent::seeded(0.9, 0.1, 6);
        restored.load(snap).unwrap();
        assert_eq!(restored.alpha, 0.2);
        assert_eq!(restored.gamma, 0.8);
        let (a, b) = (
            restored.q_value("s", "burger-1").unwrap(),
            agent.q_value("s", "burger-1").unwrap(),
        );
        assert!((a - b).abs() < 1e-12);
        assert_eq!(restored.last_recommended_type(), Some("burger"));
    }

    #[test]
    fn load_clamps_parameters() {
        let mut agent = QAgent::default();
        agent
            .load(json!({"alpha": 7.0, "gamma": -1.0, "table": {}}))
            .unwrap();
        assert_eq!(agent.alpha, 1.0);
        assert_eq!(agent.gamma, 0.0);
        assert!(agent.load(json!({"alpha": "x"})).is_err());
    }

    #[test]
    fn shared_agent_serializes_access_across_threads() {
        let shared = SharedAgent::new(QAgent::seeded(0.1, 0.9, 8));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let agent = shared.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        agent.update(&format!("s{t}"), &format!("pizza-{i}"), 1.0, "shared");
                        agent.select_action(&format!("s{t}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let snap = shared.snapshot();
        let table = snap["table"].as_object().unwrap();
        // s0..s3 plus "shared"
        assert_eq!(table.len(), 5);
        assert_eq!(table["s0"].as_object().unwrap().len(), 50);
    }
}
