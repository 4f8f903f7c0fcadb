//! Like storage: one wishlist per user, one like counter per place.

use nextplace_core::{LikeStore, LikedPlace, StoreError, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key under which a place is counted: its id, or its name if it has none.
#[must_use]
pub fn place_key(place: &LikedPlace) -> &str {
    place.id.as_deref().unwrap_or(&place.name)
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryLikeStore {
    wishlists: BTreeMap<UserId, Vec<LikedPlace>>,
    total_likes: BTreeMap<String, u32>,
}

impl MemoryLikeStore {
    #[must_use]
    pub fn total_likes(&self, place_key: &str) -> u32 {
        self.total_likes.get(place_key).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn is_liked(&self, user: &UserId, key: &str) -> bool {
        self.wishlists
            .get(user)
            .is_some_and(|list| list.iter().any(|p| place_key(p) == key))
    }

    /// Likes and unlikes are idempotent per user; the counter never drops below zero.
    pub fn toggle(&mut self, user: &UserId, place: &LikedPlace, liked: bool) -> u32 {
        let key = place_key(place).to_string();
        let already = self.is_liked(user, &key);

        if liked && !already {
            self.wishlists
                .entry(user.clone())
                .or_default()
                .push(place.clone());
            *self.total_likes.entry(key.clone()).or_insert(0) += 1;
        } else if !liked && already {
            if let Some(list) = self.wishlists.get_mut(user) {
                list.retain(|p| place_key(p) != key);
            }
            let total = self.total_likes.entry(key.clone()).or_insert(0);
            *total = total.saturating_sub(1);
        }
        self.total_likes(&key)
    }
}

impl LikeStore for MemoryLikeStore {
    fn liked_places(&self, user: &UserId) -> Result<Vec<LikedPlace>, StoreError> {
        Ok(self.wishlists.get(user).cloned().unwrap_or_default())
    }

    fn set_liked(&mut self, user: &UserId, place: &LikedPlace, liked: bool) -> Result<u32, StoreError> {
        Ok(self.toggle(user, place, liked))
    }
}

/// [`MemoryLikeStore`] persisted as pretty JSON after every change.
#[derive(Debug)]
pub struct JsonLikeStore {
    path: PathBuf,
    inner: MemoryLikeStore,
}

impl JsonLikeStore {
    /// Opens the store; a missing file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let inner = if path.exists() {
            serde_json::from_reader(File::open(&path)?)?
        } else {
            MemoryLikeStore::default()
        };
        Ok(Self { path, inner })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn inner(&self) -> &MemoryLikeStore {
        &self.inner
    }

    fn save(&self, store: &MemoryLikeStore) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.path)?;
        serde_json::to_writer_pretty(file, store)?;
        debug!(path = ?self.path, "like store saved");
        Ok(())
    }
}

impl LikeStore for JsonLikeStore {
    fn liked_places(&self, user: &UserId) -> Result<Vec<LikedPlace>, StoreError> {
        self.inner.liked_places(user)
    }

    fn set_liked(&mut self, user: &UserId, place: &LikedPlace, liked: bool) -> Result<u32, StoreError> {
        // Memory only changes once the file is written.
        let mut updated = self.inner.clone();
        let total = updated.toggle(user, place, liked);
        self.save(&updated)?;
        self.inner = updated;
        Ok(total)
    }
}
