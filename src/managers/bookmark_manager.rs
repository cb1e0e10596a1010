//! Bookmark Manager for ZaikaBox.
//!
//! Single authority for the signed-in user's bookmarks during a session. Bridges
//! UI actions to the backing store, keeps the in-memory id set and the timed
//! list cache coherent with it, and tells every attached bookmark button and
//! event subscriber when something changed.
//!
//! The id set is only updated after the store call resolves, so a failed write
//! never shows up in `is_bookmarked`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::managers::bookmark_cache::BookmarkCache;
use crate::services::auth_session::AuthSession;
use crate::storage::BookmarkStore;
use crate::types::auth::{AuthState, Identity};
use crate::types::bookmark::{sort_newest_first, BookmarkRecord, NewBookmark, RecipeSnapshot};
use crate::types::errors::BookmarkError;
use crate::types::event::{BookmarkEvent, Notice};
use crate::types::settings::{BookmarkSettings, StorageBackend};
use crate::ui::bookmark_buttons::{BookmarkButton, ButtonRegistry};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Fetches a load may repeat when mutations keep landing while it is in flight.
const MAX_LOAD_ATTEMPTS: usize = 3;

pub const MSG_LOGIN_TO_BOOKMARK: &str = "Please log in to bookmark recipes";
pub const MSG_LOGIN_TO_MANAGE: &str = "Please log in to manage bookmarks";
pub const MSG_INVALID_RECIPE: &str = "Invalid recipe data";
pub const MSG_ALREADY_BOOKMARKED: &str = "Recipe already bookmarked!";
pub const MSG_BOOKMARKED: &str = "Recipe bookmarked!";
pub const MSG_BOOKMARK_FAILED: &str = "Failed to bookmark recipe";
pub const MSG_REMOVED: &str = "Bookmark removed";
pub const MSG_REMOVE_FAILED: &str = "Failed to remove bookmark";
pub const MSG_CLEARED: &str = "All bookmarks cleared";
pub const MSG_CLEAR_FAILED: &str = "Failed to clear bookmarks";

/// Result of a successful add.
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Added(BookmarkRecord),
    /// The meal was already in the set; nothing was written.
    AlreadyBookmarked,
}

/// Trait defining bookmark management operations.
///
/// None of these return errors: failures become a safe default plus a
/// [`Notice`] on the event channel.
#[async_trait]
pub trait BookmarkManagerTrait {
    async fn load_user_bookmarks(&self);
    fn is_bookmarked(&self, meal_id: &str) -> bool;
    async fn add_bookmark(&self, meal_id: &str, snapshot: Option<&RecipeSnapshot>) -> bool;
    async fn remove_bookmark(&self, meal_id: &str) -> bool;
    /// Removes every bookmark of the current user. Returns how many meals were removed.
    async fn clear_all_bookmarks(&self) -> usize;
    /// Newest first; served from the cache while it is fresh.
    async fn get_user_bookmarks(&self) -> Arc<Vec<BookmarkRecord>>;
    /// Removes the bookmark if present, adds it otherwise.
    async fn toggle(&self, meal_id: &str, snapshot: Option<&RecipeSnapshot>) -> bool;
    fn bookmark_count(&self) -> usize;
    /// Re-renders every attached button from `is_bookmarked`. Returns how many were updated.
    fn update_bookmark_buttons(&self) -> usize;
}

struct ManagerState {
    cache: BookmarkCache,
    /// Meals with an add/remove that has not resolved yet.
    in_flight: HashSet<String>,
}

/// Bookmark manager over one backing store, chosen at construction.
pub struct BookmarkManager {
    store: Arc<dyn BookmarkStore>,
    auth: AuthSession,
    state: Mutex<ManagerState>,
    buttons: ButtonRegistry,
    events: broadcast::Sender<BookmarkEvent>,
    ready: watch::Sender<bool>,
    settle_delay: Duration,
}

impl BookmarkManager {
    pub fn new(store: Arc<dyn BookmarkStore>, auth: AuthSession, settings: &BookmarkSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (ready, _) = watch::channel(false);
        Self {
            store,
            auth,
            state: Mutex::new(ManagerState {
                cache: BookmarkCache::new(settings.cache_ttl()),
                in_flight: HashSet::new(),
            }),
            buttons: ButtonRegistry::new(),
            events,
            ready,
            settle_delay: settings.settle_delay(),
        }
    }

    fn state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The id set, if it belongs to whoever is signed in right now. Reads go
    /// through here so a sign-out is visible before the watcher catches up.
    fn with_active_set<T>(&self, f: impl FnOnce(Option<&BookmarkCache>) -> T) -> T {
        let uid = self.auth.current().map(|identity| identity.uid);
        let st = self.state();
        match uid {
            Some(uid) if st.cache.loaded_for() == Some(uid.as_str()) => f(Some(&st.cache)),
            _ => f(None),
        }
    }

    fn emit(&self, event: BookmarkEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn notify(&self, notice: Notice) {
        debug!(kind = ?notice.kind, message = %notice.message, "notice");
        self.emit(BookmarkEvent::Notice(notice));
    }

    fn changed(&self) {
        self.update_bookmark_buttons();
        self.emit(BookmarkEvent::Changed);
    }

    pub fn backend(&self) -> StorageBackend {
        self.store.backend()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookmarkEvent> {
        self.events.subscribe()
    }

    /// True once bookmarks have been loaded for the signed-in user. Reset on sign-out
    /// and when another user signs in.
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Resolves once the first load has completed.
    pub async fn wait_until_ready(&self) {
        let mut rx = self.ready.subscribe();
        // The sender lives in `self`, so this cannot fail while we are borrowed.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    /// Attaches a bookmark button for `meal_id`, rendered from the current state.
    pub fn attach_button(&self, meal_id: &str, snapshot: RecipeSnapshot) -> Arc<BookmarkButton> {
        self.buttons.attach(meal_id, snapshot, self.is_bookmarked(meal_id))
    }

    /// Starts following the auth state.
    ///
    /// On sign-in of a user whose bookmarks are not loaded, waits the settle
    /// delay (skipped when the token is already established) and loads them.
    /// On sign-out, forgets the previous user's bookmarks immediately.
    pub fn initialize(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let mut auth_rx = self.auth.subscribe();
        tokio::spawn(async move {
            loop {
                let state = auth_rx.borrow_and_update().clone();
                manager.on_auth_state(state).await;
                if auth_rx.changed().await.is_err() {
                    break;
                }
            }
            debug!("auth channel closed, bookmark watcher stopped");
        })
    }

    async fn on_auth_state(&self, state: AuthState) {
        match state {
            None => {
                let had_state = {
                    let mut st = self.state();
                    let had = st.cache.loaded_for().is_some() || !st.cache.is_empty();
                    st.cache.clear();
                    had
                };
                self.ready.send_replace(false);
                if had_state {
                    info!("signed out, bookmark state cleared");
                    self.changed();
                }
            }
            Some(identity) => {
                let previous = {
                    let st = self.state();
                    st.cache.loaded_for().map(str::to_string)
                };
                if previous.as_deref() == Some(identity.uid.as_str()) {
                    return;
                }
                if previous.is_some() {
                    // A different user: never show the previous one's set, even briefly.
                    self.state().cache.clear();
                    self.ready.send_replace(false);
                    self.changed();
                }
                if !identity.token_ready && !self.settle_delay.is_zero() {
                    debug!(delay_ms = self.settle_delay.as_millis() as u64, "waiting for auth to settle");
                    tokio::time::sleep(self.settle_delay).await;
                }
                self.load_user_bookmarks().await;
            }
        }
    }

    /// Lists the identity's bookmarks and installs them as the id set.
    ///
    /// A fetch overtaken by an add or remove is repeated, so the installed set
    /// never predates a mutation that already completed.
    async fn load_for(&self, identity: &Identity) -> Result<usize, BookmarkError> {
        for attempt in 1..=MAX_LOAD_ATTEMPTS {
            let generation = self.state().cache.generation();
            let records = self.store.list_where(&identity.uid).await?;

            // The user may have changed while the list was in flight.
            if self.auth.current().map(|i| i.uid) != Some(identity.uid.clone()) {
                debug!(uid = %identity.uid, "discarding bookmark load for stale identity");
                return Ok(0);
            }

            let count = {
                let mut st = self.state();
                if st.cache.generation() != generation {
                    None
                } else {
                    st.cache.replace(&identity.uid, records.into_iter().map(|r| r.meal_id));
                    Some(st.cache.len())
                }
            };
            match count {
                Some(count) => {
                    self.ready.send_replace(true);
                    info!(uid = %identity.uid, count, backend = ?self.store.backend(), "bookmarks loaded");
                    return Ok(count);
                }
                None => debug!(uid = %identity.uid, attempt, "bookmarks changed during load, fetching again"),
            }
        }
        warn!(uid = %identity.uid, "bookmarks kept changing during load, set left as it was");
        Ok(0)
    }

    /// Loads the set first if it does not mirror `identity` yet, so the
    /// duplicate check below sees what the store already holds.
    async fn ensure_loaded(&self, identity: &Identity) -> Result<(), BookmarkError> {
        let loaded = self.state().cache.loaded_for() == Some(identity.uid.as_str());
        if !loaded {
            self.load_for(identity).await?;
        }
        Ok(())
    }

    /// Reserves `meal_id` for one mutation; fails if another is pending.
    fn begin(&self, meal_id: &str) -> Result<(), BookmarkError> {
        if self.state().in_flight.insert(meal_id.to_string()) {
            Ok(())
        } else {
            Err(BookmarkError::AlreadyInFlight(meal_id.to_string()))
        }
    }

    /// Adds a bookmark, reporting the precise failure. Emits `Changed` on success
    /// but no notices.
    pub async fn try_add(
        &self,
        meal_id: &str,
        snapshot: Option<&RecipeSnapshot>,
    ) -> Result<AddOutcome, BookmarkError> {
        let identity = self.auth.current().ok_or(BookmarkError::Unauthenticated)?;
        if meal_id.trim().is_empty() {
            return Err(BookmarkError::InvalidInput("missing meal id".to_string()));
        }
        let snapshot = snapshot
            .ok_or_else(|| BookmarkError::InvalidInput("missing recipe snapshot".to_string()))?;

        self.ensure_loaded(&identity).await?;
        if self.is_bookmarked(meal_id) {
            return Ok(AddOutcome::AlreadyBookmarked);
        }

        self.begin(meal_id)?;
        let result = self
            .store
            .create(NewBookmark::from_snapshot(&identity.uid, meal_id, snapshot))
            .await;

        {
            let mut st = self.state();
            st.in_flight.remove(meal_id);
            if result.is_ok() {
                if st.cache.loaded_for() == Some(identity.uid.as_str()) {
                    st.cache.insert(meal_id);
                } else {
                    // Not mirrored yet: make any load in flight fetch again.
                    st.cache.invalidate();
                }
            }
        }

        let record = result?;
        info!(uid = %identity.uid, meal_id, "bookmark added");
        self.changed();
        Ok(AddOutcome::Added(record))
    }

    /// Removes every record of `meal_id` for the current user. Returns how many
    /// records were deleted. Emits `Changed` on success but no notices.
    pub async fn try_remove(&self, meal_id: &str) -> Result<usize, BookmarkError> {
        let identity = self.auth.current().ok_or(BookmarkError::Unauthenticated)?;
        self.remove_for(&identity, meal_id).await
    }

    async fn remove_for(&self, identity: &Identity, meal_id: &str) -> Result<usize, BookmarkError> {
        self.begin(meal_id)?;
        let result = self.store.delete_where(&identity.uid, meal_id).await;

        {
            let mut st = self.state();
            st.in_flight.remove(meal_id);
            if result.is_ok() {
                if st.cache.loaded_for() == Some(identity.uid.as_str()) {
                    st.cache.remove(meal_id);
                } else {
                    st.cache.invalidate();
                }
            }
        }

        let removed = result?;
        info!(uid = %identity.uid, meal_id, removed, "bookmark removed");
        self.changed();
        Ok(removed)
    }
}

#[async_trait]
impl BookmarkManagerTrait for BookmarkManager {
    /// Replaces the id set with the store's view. Without a signed-in user this
    /// does nothing; failures are logged and leave the set untouched.
    async fn load_user_bookmarks(&self) {
        let Some(identity) = self.auth.current() else {
            return;
        };
        match self.load_for(&identity).await {
            Ok(_) => {
                if self.buttons.attached_count() > 0 {
                    self.update_bookmark_buttons();
                }
                self.emit(BookmarkEvent::Changed);
            }
            Err(e) => error!(uid = %identity.uid, "Error loading bookmarks: {}", e),
        }
    }

    fn is_bookmarked(&self, meal_id: &str) -> bool {
        self.with_active_set(|set| set.is_some_and(|cache| cache.contains(meal_id)))
    }

    async fn add_bookmark(&self, meal_id: &str, snapshot: Option<&RecipeSnapshot>) -> bool {
        match self.try_add(meal_id, snapshot).await {
            Ok(AddOutcome::Added(_)) => {
                self.notify(Notice::success(MSG_BOOKMARKED));
                true
            }
            Ok(AddOutcome::AlreadyBookmarked) => {
                self.notify(Notice::info(MSG_ALREADY_BOOKMARKED));
                true
            }
            Err(BookmarkError::Unauthenticated) => {
                self.notify(Notice::error(MSG_LOGIN_TO_BOOKMARK));
                false
            }
            Err(BookmarkError::InvalidInput(reason)) => {
                warn!(meal_id, %reason, "rejected bookmark");
                self.notify(Notice::error(MSG_INVALID_RECIPE));
                false
            }
            Err(BookmarkError::AlreadyInFlight(_)) => {
                debug!(meal_id, "add ignored, operation already in flight");
                false
            }
            Err(e) => {
                error!(meal_id, "Error adding bookmark: {}", e);
                self.notify(Notice::error(MSG_BOOKMARK_FAILED));
                false
            }
        }
    }

    async fn remove_bookmark(&self, meal_id: &str) -> bool {
        match self.try_remove(meal_id).await {
            Ok(_) => {
                self.notify(Notice::success(MSG_REMOVED));
                true
            }
            Err(BookmarkError::Unauthenticated) => {
                self.notify(Notice::error(MSG_LOGIN_TO_MANAGE));
                false
            }
            Err(BookmarkError::AlreadyInFlight(_)) => {
                debug!(meal_id, "remove ignored, operation already in flight");
                false
            }
            Err(e) => {
                error!(meal_id, "Error removing bookmark: {}", e);
                self.notify(Notice::error(MSG_REMOVE_FAILED));
                false
            }
        }
    }

    async fn clear_all_bookmarks(&self) -> usize {
        let Some(identity) = self.auth.current() else {
            self.notify(Notice::error(MSG_LOGIN_TO_MANAGE));
            return 0;
        };

        let meal_ids: Vec<String> = match self.store.list_where(&identity.uid).await {
            Ok(records) => {
                let mut seen = HashSet::new();
                records
                    .into_iter()
                    .map(|r| r.meal_id)
                    .filter(|id| seen.insert(id.clone()))
                    .collect()
            }
            Err(e) => {
                error!(uid = %identity.uid, "Error clearing bookmarks: {}", e);
                self.notify(Notice::error(MSG_CLEAR_FAILED));
                return 0;
            }
        };

        let mut cleared = 0;
        let mut failed = 0;
        for meal_id in &meal_ids {
            match self.remove_for(&identity, meal_id).await {
                Ok(_) => cleared += 1,
                Err(e) => {
                    warn!(meal_id = %meal_id, "could not clear bookmark: {}", e);
                    failed += 1;
                }
            }
        }

        if failed == 0 {
            self.notify(Notice::success(MSG_CLEARED));
        } else {
            error!(uid = %identity.uid, cleared, failed, "clear all left bookmarks behind");
            self.notify(Notice::error(MSG_CLEAR_FAILED));
        }
        cleared
    }

    async fn get_user_bookmarks(&self) -> Arc<Vec<BookmarkRecord>> {
        let Some(identity) = self.auth.current() else {
            return Arc::new(Vec::new());
        };

        let (cached, generation) = {
            let st = self.state();
            (st.cache.fresh_list(&identity.uid, Instant::now()), st.cache.generation())
        };
        if let Some(list) = cached {
            return list;
        }

        match self.store.list_where(&identity.uid).await {
            Ok(mut records) => {
                sort_newest_first(&mut records);
                let mut st = self.state();
                st.cache
                    .store_list_if_current(&identity.uid, records, Instant::now(), generation)
            }
            Err(e) => {
                error!(uid = %identity.uid, "Error fetching bookmarks: {}", e);
                Arc::new(Vec::new())
            }
        }
    }

    async fn toggle(&self, meal_id: &str, snapshot: Option<&RecipeSnapshot>) -> bool {
        if self.is_bookmarked(meal_id) {
            self.remove_bookmark(meal_id).await
        } else {
            self.add_bookmark(meal_id, snapshot).await
        }
    }

    fn bookmark_count(&self) -> usize {
        self.with_active_set(|set| set.map_or(0, BookmarkCache::len))
    }

    fn update_bookmark_buttons(&self) -> usize {
        let ids: HashSet<String> =
            self.with_active_set(|set| set.map(|cache| cache.ids().cloned().collect()).unwrap_or_default());
        self.buttons.refresh(|meal_id| ids.contains(meal_id))
    }
}
