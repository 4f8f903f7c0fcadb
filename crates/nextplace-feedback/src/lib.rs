#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Like storage and like/dislike feedback.
//!
//! Likes live in a [`LikeStore`](nextplace_core::LikeStore). Each swipe is
//! also kept as a [`FeedbackEvent`] that can be replayed into any
//! [`Policy`], turning likes into positive and dislikes into negative
//! rewards.

pub mod store;

pub use store::{place_key, JsonLikeStore, MemoryLikeStore};

use nextplace_bandits::action_kind;
use nextplace_core::{Policy, StoreError, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use time::OffsetDateTime;
use tracing::debug;

/// Reward for a like.
pub const LIKE_REWARD: f64 = 1.0;
/// Reward for a dislike.
pub const DISLIKE_REWARD: f64 = -1.0;
/// State used when a swipe has no predecessor in the session.
pub const START_STATE: &str = "start";

/// One like or dislike.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackEvent {
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub user: UserId,
    /// Place shown before this one, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    pub place_id: String,
    pub liked: bool,
}

impl FeedbackEvent {
    #[must_use]
    pub fn reward(&self) -> f64 {
        if self.liked {
            LIKE_REWARD
        } else {
            DISLIKE_REWARD
        }
    }

    #[must_use]
    pub fn state(&self) -> &str {
        self.previous.as_deref().unwrap_or(START_STATE)
    }

    /// Applies the reward; the swiped place is both the action and the next state.
    pub fn apply_to<P: Policy + ?Sized>(&self, policy: &mut P) {
        policy.feedback(self.state(), &self.place_id, self.reward(), &self.place_id);
    }
}

/// Like/dislike counts for one coarse place type.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct KindStatistics {
    pub likes: usize,
    pub dislikes: usize,
}

impl KindStatistics {
    #[must_use]
    pub fn total(&self) -> usize {
        self.likes + self.dislikes
    }

    /// Share of likes (0.0 to 1.0).
    #[must_use]
    pub fn like_rate(&self) -> f32 {
        if self.total() == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.likes as f32 / self.total() as f32
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct FeedbackLog {
    events: Vec<FeedbackEvent>,
}

impl FeedbackLog {
    /// Reads a saved log; a missing file yields an empty log.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_reader(File::open(path)?)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        serde_json::to_writer_pretty(File::create(path)?, self)?;
        debug!(?path, events = self.events.len(), "feedback log saved");
        Ok(())
    }

    pub fn record(&mut self, user: &UserId, previous: Option<&str>, place_id: &str, liked: bool) -> &FeedbackEvent {
        debug!(%user, place_id, liked, "feedback recorded");
        let index = self.events.len();
        self.events.push(FeedbackEvent {
            ts: OffsetDateTime::now_utc(),
            user: user.clone(),
            previous: previous.map(str::to_string),
            place_id: place_id.to_string(),
            liked,
        });
        &self.events[index]
    }

    #[must_use]
    pub fn events(&self) -> &[FeedbackEvent] {
        &self.events
    }

    #[must_use]
    pub fn stats_by_kind(&self) -> BTreeMap<String, KindStatistics> {
        let mut stats: BTreeMap<String, KindStatistics> = BTreeMap::new();
        for event in &self.events {
            let entry = stats.entry(action_kind(&event.place_id)).or_default();
            if event.liked {
                entry.likes += 1;
            } else {
                entry.dislikes += 1;
            }
        }
        stats
    }

    /// Feeds every event, oldest first, into `policy`.
    pub fn replay_into<P: Policy + ?Sized>(&self, policy: &mut P) {
        for event in &self.events {
            event.apply_to(policy);
        }
        debug!(events = self.events.len(), "feedback replayed");
    }
}
