//! In-memory bookmark state for the signed-in user.
//!
//! Two views: the set of bookmarked meal ids (answers "is this bookmarked?"
//! without I/O) and a time-boxed copy of the full record list.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::types::bookmark::BookmarkRecord;

pub struct BookmarkCache {
    ids: HashSet<String>,
    /// Owner, records, fetch time.
    list: Option<(String, Arc<Vec<BookmarkRecord>>, Instant)>,
    ttl: Duration,
    /// User whose bookmarks the id set currently mirrors.
    loaded_for: Option<String>,
    /// Bumped on every invalidation. A fetch that saw another generation
    /// when it started must not overwrite newer state.
    generation: u64,
}

impl BookmarkCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ids: HashSet::new(),
            list: None,
            ttl,
            loaded_for: None,
            generation: 0,
        }
    }

    pub fn contains(&self, meal_id: &str) -> bool {
        self.ids.contains(meal_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.ids.iter()
    }

    pub fn loaded_for(&self) -> Option<&str> {
        self.loaded_for.as_deref()
    }

    /// Adds a meal id and drops the cached list.
    pub fn insert(&mut self, meal_id: &str) {
        self.ids.insert(meal_id.to_string());
        self.invalidate();
    }

    /// Removes a meal id and drops the cached list.
    pub fn remove(&mut self, meal_id: &str) {
        self.ids.remove(meal_id);
        self.invalidate();
    }

    /// Replaces the id set wholesale with what the store holds for `user_id`.
    pub fn replace(&mut self, user_id: &str, ids: impl IntoIterator<Item = String>) {
        self.ids = ids.into_iter().collect();
        self.loaded_for = Some(user_id.to_string());
        self.invalidate();
    }

    /// Forgets everything, including whose bookmarks were loaded.
    pub fn clear(&mut self) {
        self.ids.clear();
        self.loaded_for = None;
        self.invalidate();
    }

    pub fn invalidate(&mut self) {
        self.list = None;
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The cached list of `user_id`, if it is younger than the TTL at `now`.
    pub fn fresh_list(&self, user_id: &str, now: Instant) -> Option<Arc<Vec<BookmarkRecord>>> {
        match &self.list {
            Some((owner, list, fetched_at))
                if owner == user_id && now.saturating_duration_since(*fetched_at) < self.ttl =>
            {
                Some(Arc::clone(list))
            }
            _ => None,
        }
    }

    pub fn store_list(
        &mut self,
        user_id: &str,
        list: Vec<BookmarkRecord>,
        now: Instant,
    ) -> Arc<Vec<BookmarkRecord>> {
        let list = Arc::new(list);
        self.list = Some((user_id.to_string(), Arc::clone(&list), now));
        list
    }

    /// Caches `list` only if nothing was invalidated since `generation` was read.
    /// The list is returned either way.
    pub fn store_list_if_current(
        &mut self,
        user_id: &str,
        list: Vec<BookmarkRecord>,
        now: Instant,
        generation: u64,
    ) -> Arc<Vec<BookmarkRecord>> {
        if generation == self.generation {
            self.store_list(user_id, list, now)
        } else {
            Arc::new(list)
        }
    }
}
