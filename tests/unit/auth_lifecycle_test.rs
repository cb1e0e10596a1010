//! Unit tests for how the bookmark manager follows sign-in and sign-out.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use tokio::time::Instant;

use zaikabox::app::App;
use zaikabox::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use zaikabox::services::auth_session::AuthSession;
use zaikabox::services::settings_engine::SettingsEngine;
use zaikabox::storage::remote_store::BOOKMARKS_COLLECTION;
use zaikabox::storage::{BookmarkStore, LocalBookmarkStore, MemoryDocumentStore, RemoteBookmarkStore};
use zaikabox::types::auth::Identity;
use zaikabox::types::bookmark::RecipeSnapshot;
use zaikabox::types::settings::BookmarkSettings;

async fn seeded_docs(entries: &[(&str, &str)]) -> MemoryDocumentStore {
    let docs = MemoryDocumentStore::new();
    for (user_id, meal_id) in entries {
        let fields = json!({ "userId": user_id, "mealId": meal_id });
        docs.seed(BOOKMARKS_COLLECTION, fields.as_object().cloned().unwrap(), None)
            .await;
    }
    docs
}

fn manager(docs: &MemoryDocumentStore, settle_delay_ms: u64) -> (Arc<BookmarkManager>, AuthSession) {
    let auth = AuthSession::new();
    let store: Arc<dyn BookmarkStore> = Arc::new(RemoteBookmarkStore::new(docs.clone()));
    let settings = BookmarkSettings { cache_ttl_secs: 30, settle_delay_ms };
    (Arc::new(BookmarkManager::new(store, auth.clone(), &settings)), auth)
}

/// Polls `check` until it holds, giving the auth watcher time to run.
async fn eventually(check: impl Fn() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn test_sign_in_loads_bookmarks() {
    let docs = seeded_docs(&[("u1", "52772"), ("u1", "52771"), ("u2", "53000")]).await;
    let (manager, auth) = manager(&docs, 0);
    let watcher = manager.initialize();
    assert!(!manager.is_ready());

    auth.sign_in(Identity::new("u1", "u1@example.com"));
    manager.wait_until_ready().await;

    assert_eq!(manager.bookmark_count(), 2);
    assert!(manager.is_bookmarked("52772"));
    assert!(!manager.is_bookmarked("53000"));
    watcher.abort();
}

#[tokio::test]
async fn test_sign_out_is_visible_before_watcher_runs() {
    let docs = seeded_docs(&[("u1", "52771")]).await;
    let (manager, auth) = manager(&docs, 0);
    let watcher = manager.initialize();

    auth.sign_in(Identity::new("u1", "u1@example.com").with_token("id-token"));
    manager.wait_until_ready().await;
    let snapshot = RecipeSnapshot::new("Teriyaki Chicken Casserole", "", "Chicken", "Japanese");
    assert!(manager.add_bookmark("52772", Some(&snapshot)).await);
    assert_eq!(manager.bookmark_count(), 2);

    auth.sign_out();
    assert!(!manager.is_bookmarked("52772"));
    assert!(!manager.is_bookmarked("52771"));
    assert_eq!(manager.bookmark_count(), 0);
    watcher.abort();
}

#[tokio::test]
async fn test_sign_out_clears_state() {
    let docs = seeded_docs(&[("u1", "52772")]).await;
    let (manager, auth) = manager(&docs, 0);
    let watcher = manager.initialize();

    auth.sign_in(Identity::new("u1", "u1@example.com"));
    manager.wait_until_ready().await;
    assert!(manager.is_bookmarked("52772"));

    auth.sign_out();
    eventually(|| !manager.is_ready()).await;
    assert!(!manager.is_bookmarked("52772"));
    assert_eq!(manager.bookmark_count(), 0);
    watcher.abort();
}

#[tokio::test]
async fn test_switching_users_never_leaks_bookmarks() {
    let docs = seeded_docs(&[("u1", "52772"), ("u2", "52771")]).await;
    let (manager, auth) = manager(&docs, 0);
    let watcher = manager.initialize();

    auth.sign_in(Identity::new("u1", "u1@example.com"));
    manager.wait_until_ready().await;
    assert!(manager.is_bookmarked("52772"));

    auth.sign_in(Identity::new("u2", "u2@example.com"));
    eventually(|| manager.is_bookmarked("52771")).await;
    assert!(!manager.is_bookmarked("52772"));
    assert_eq!(manager.bookmark_count(), 1);
    watcher.abort();
}

#[tokio::test]
async fn test_token_refresh_for_same_user_does_not_reload() {
    let docs = seeded_docs(&[("u1", "52772")]).await;
    let (manager, auth) = manager(&docs, 0);
    let watcher = manager.initialize();

    auth.sign_in(Identity::new("u1", "u1@example.com"));
    manager.wait_until_ready().await;
    let queries = docs.query_count();

    auth.mark_token_ready("fresh-token");
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    assert_eq!(docs.query_count(), queries);
    assert!(manager.is_ready());
    watcher.abort();
}

#[tokio::test(start_paused = true)]
async fn test_first_load_waits_for_settle_delay() {
    let docs = seeded_docs(&[("u1", "52772")]).await;
    let (manager, auth) = manager(&docs, 500);
    let watcher = manager.initialize();

    let start = Instant::now();
    auth.sign_in(Identity::new("u1", "u1@example.com"));
    manager.wait_until_ready().await;

    assert!(start.elapsed() >= Duration::from_millis(500));
    assert!(manager.is_bookmarked("52772"));
    watcher.abort();
}

#[tokio::test(start_paused = true)]
async fn test_established_token_skips_settle_delay() {
    let docs = seeded_docs(&[("u1", "52772")]).await;
    let (manager, auth) = manager(&docs, 500);
    let watcher = manager.initialize();

    let start = Instant::now();
    auth.sign_in(Identity::new("u1", "u1@example.com").with_token("id-token"));
    manager.wait_until_ready().await;

    assert!(start.elapsed() < Duration::from_millis(500));
    assert!(manager.is_bookmarked("52772"));
    watcher.abort();
}

#[tokio::test]
async fn test_load_for_signed_out_user_is_discarded() {
    let docs = seeded_docs(&[("u1", "52772")]).await;
    docs.set_latency(Some(Duration::from_millis(30)));
    let (manager, auth) = manager(&docs, 0);
    let watcher = manager.initialize();

    auth.sign_in(Identity::new("u1", "u1@example.com"));
    tokio::task::yield_now().await;
    auth.sign_out();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!manager.is_bookmarked("52772"));
    assert!(!manager.is_ready());
    watcher.abort();
}

#[tokio::test]
async fn test_attached_buttons_follow_load() {
    let docs = seeded_docs(&[("u1", "52772")]).await;
    let (manager, auth) = manager(&docs, 0);
    let watcher = manager.initialize();
    let button = manager.attach_button("52772", RecipeSnapshot::default());
    assert!(!button.state().bookmarked);

    auth.sign_in(Identity::new("u1", "u1@example.com"));
    eventually(|| button.state().bookmarked).await;

    auth.sign_out();
    eventually(|| !button.state().bookmarked).await;
    watcher.abort();
}

#[tokio::test]
async fn test_app_wires_manager_to_store() {
    let dir = TempDir::new().unwrap();
    let engine = SettingsEngine::new(Some(dir.path().join("zaikabox.json").to_string_lossy().to_string()));
    let store: Arc<dyn BookmarkStore> = Arc::new(LocalBookmarkStore::open_in_memory().unwrap());
    let app = App::with_store(engine, AuthSession::new(), store);
    let watcher = app.startup();

    app.auth.sign_in(Identity::new("u1", "u1@example.com").with_token("t"));
    app.bookmarks.wait_until_ready().await;

    let snapshot = RecipeSnapshot::new("Teriyaki Chicken Casserole", "", "Chicken", "Japanese");
    assert!(app.bookmarks.add_bookmark("52772", Some(&snapshot)).await);
    assert_eq!(app.bookmarks.get_user_bookmarks().await.len(), 1);
    watcher.abort();
}

#[tokio::test]
async fn test_app_new_uses_configured_local_backend() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("zaikabox.json");
    let db = dir.path().join("bookmarks.db");
    std::fs::write(
        &config,
        json!({
            "storage": {
                "backend": "local",
                "remote": {
                    "base_url": "https://firestore.googleapis.com/v1",
                    "project_id": "food-recommendation-fea21",
                    "collection": "bookmarks",
                    "request_timeout_secs": 15
                },
                "local_db_path": db.to_string_lossy()
            },
            "bookmarks": { "cache_ttl_secs": 30, "settle_delay_ms": 0 }
        })
        .to_string(),
    )
    .unwrap();

    let app = App::new(Some(config.to_string_lossy().to_string())).unwrap();
    assert_eq!(app.bookmarks.backend(), zaikabox::types::settings::StorageBackend::Local);
    assert!(db.exists());
}
