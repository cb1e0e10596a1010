//! ZaikaBox bookmark layer — console demo.
//!
//! Runs the bookmark manager against the in-process document store and the
//! local SQLite fallback. Set `RUST_LOG=zaikabox=debug` to watch it work.

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};
use zaikabox::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use zaikabox::services::auth_session::AuthSession;
use zaikabox::storage::{BookmarkStore, LocalBookmarkStore, MemoryDocumentStore, RemoteBookmarkStore};
use zaikabox::types::auth::Identity;
use zaikabox::types::bookmark::RecipeSnapshot;
use zaikabox::types::event::BookmarkEvent;
use zaikabox::types::settings::BookmarkSettings;

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    println!();
    println!("══════════════════════════════════════════════════════");
    println!("  ZaikaBox bookmarks v{} — Demo Mode", env!("CARGO_PKG_VERSION"));
    println!("══════════════════════════════════════════════════════");
    println!();

    let remote: Arc<dyn BookmarkStore> = Arc::new(RemoteBookmarkStore::new(MemoryDocumentStore::new()));
    demo_store("Remote document store (in-process)", remote).await;

    match LocalBookmarkStore::open_in_memory() {
        Ok(local) => demo_store("Local SQLite fallback", Arc::new(local)).await,
        Err(e) => eprintln!("  could not open local store: {}", e),
    }

    println!("  ✓ Demo finished");
}

fn section(name: &str) {
    println!("──────────────────────────────────────────────────────");
    println!("  📦 {}", name);
    println!("──────────────────────────────────────────────────────");
}

async fn demo_store(name: &str, store: Arc<dyn BookmarkStore>) {
    section(name);

    let auth = AuthSession::new();
    let manager = Arc::new(BookmarkManager::new(store, auth.clone(), &BookmarkSettings::default()));
    let mut events = manager.subscribe();
    let watcher = manager.initialize();

    auth.sign_in(Identity::new("demo-user", "cook@zaikabox.test"));
    manager.wait_until_ready().await;
    println!("  Signed in, {} bookmark(s) loaded", manager.bookmark_count());

    let teriyaki = RecipeSnapshot::new(
        "Teriyaki Chicken Casserole",
        "https://www.themealdb.com/images/media/meals/wvpsxx1468256321.jpg",
        "Chicken",
        "Japanese",
    );
    let button = manager.attach_button("52772", teriyaki.clone());
    println!("  Button before: {}", button.state().tooltip);

    button.click(&manager).await;
    println!("  Button after click: {}", button.state().tooltip);
    manager.add_bookmark("52772", Some(&teriyaki)).await;
    manager
        .add_bookmark("52771", Some(&RecipeSnapshot::new("Spicy Arrabiata Penne", "", "Vegetarian", "Italian")))
        .await;

    for record in manager.get_user_bookmarks().await.iter() {
        println!("  • {} [{}] ({})", record.meal_name, record.meal_category, record.meal_id);
    }

    let cleared = manager.clear_all_bookmarks().await;
    println!("  Cleared {} bookmark(s), is 52772 bookmarked? {}", cleared, manager.is_bookmarked("52772"));

    auth.sign_out();
    watcher.abort();

    while let Ok(event) = events.try_recv() {
        if let BookmarkEvent::Notice(notice) = event {
            println!("  toast [{:?}] {}", notice.kind, notice.message);
        }
    }
    println!();
}
