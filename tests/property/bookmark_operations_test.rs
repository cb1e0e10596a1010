//! Property-based tests for Bookmark Manager operations.
//!
//! Any sequence of adds and removes leaves the in-memory set, the list view and
//! the backing store in agreement, and never stores a meal twice for a user.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use proptest::prelude::*;
use zaikabox::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use zaikabox::services::auth_session::AuthSession;
use zaikabox::storage::{BookmarkStore, LocalBookmarkStore, MemoryDocumentStore, RemoteBookmarkStore};
use zaikabox::types::auth::Identity;
use zaikabox::types::bookmark::RecipeSnapshot;
use zaikabox::types::settings::BookmarkSettings;

#[derive(Debug, Clone)]
enum Op {
    Add(String),
    Remove(String),
    Toggle(String),
}

/// Meal ids from a small pool so sequences revisit the same meals.
fn arb_meal_id() -> impl Strategy<Value = String> {
    (52770u32..52776).prop_map(|n| n.to_string())
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        arb_meal_id().prop_map(Op::Add),
        arb_meal_id().prop_map(Op::Remove),
        arb_meal_id().prop_map(Op::Toggle),
    ]
}

fn arb_snapshot() -> impl Strategy<Value = RecipeSnapshot> {
    ("[A-Za-z][A-Za-z ]{0,24}", "[A-Za-z]{0,10}", "[A-Za-z]{0,10}")
        .prop_map(|(name, category, area)| RecipeSnapshot::new(&name, "", &category, &area))
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("build runtime")
}

fn settings() -> BookmarkSettings {
    BookmarkSettings { cache_ttl_secs: 30, settle_delay_ms: 0 }
}

/// Applies `ops`, checking `is_bookmarked` against a model after each step.
/// Returns the model and how many meals went from unbookmarked to bookmarked.
async fn apply(
    manager: &BookmarkManager,
    ops: &[Op],
    snapshot: &RecipeSnapshot,
) -> Result<(BTreeSet<String>, usize), TestCaseError> {
    let mut model = BTreeSet::new();
    let mut additions = 0;
    for op in ops {
        match op {
            Op::Add(id) => {
                prop_assert!(manager.add_bookmark(id, Some(snapshot)).await);
                if model.insert(id.clone()) {
                    additions += 1;
                }
            }
            Op::Remove(id) => {
                prop_assert!(manager.remove_bookmark(id).await);
                model.remove(id);
            }
            Op::Toggle(id) => {
                prop_assert!(manager.toggle(id, Some(snapshot)).await);
                if !model.remove(id) {
                    model.insert(id.clone());
                    additions += 1;
                }
            }
        }
        let id = match op {
            Op::Add(id) | Op::Remove(id) | Op::Toggle(id) => id,
        };
        prop_assert_eq!(manager.is_bookmarked(id), model.contains(id));
    }
    prop_assert_eq!(manager.bookmark_count(), model.len());
    Ok((model, additions))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    /// Remote store: one insert per actual addition, store matches the model.
    #[test]
    fn remote_store_matches_model(ops in proptest::collection::vec(arb_op(), 1..25), snapshot in arb_snapshot()) {
        runtime().block_on(async {
            let docs = MemoryDocumentStore::new();
            let store: Arc<dyn BookmarkStore> = Arc::new(RemoteBookmarkStore::new(docs.clone()));
            let auth = AuthSession::new();
            auth.sign_in(Identity::new("u1", "u1@example.com"));
            let manager = BookmarkManager::new(Arc::clone(&store), auth, &settings());

            let (model, additions) = apply(&manager, &ops, &snapshot).await?;
            prop_assert_eq!(docs.insert_count(), additions);

            let stored: Vec<String> = store.list_where("u1").await.unwrap().into_iter().map(|r| r.meal_id).collect();
            let unique: HashSet<&String> = stored.iter().collect();
            prop_assert_eq!(unique.len(), stored.len(), "a meal is stored at most once");
            prop_assert_eq!(stored.into_iter().collect::<BTreeSet<_>>(), model.clone());

            let listed: BTreeSet<String> = manager.get_user_bookmarks().await.iter().map(|r| r.meal_id.clone()).collect();
            prop_assert_eq!(listed, model);
            Ok(())
        })?;
    }

    /// Local store: same agreement, and every stored name comes from the snapshot.
    #[test]
    fn local_store_matches_model(ops in proptest::collection::vec(arb_op(), 1..25), snapshot in arb_snapshot()) {
        runtime().block_on(async {
            let store: Arc<dyn BookmarkStore> = Arc::new(LocalBookmarkStore::open_in_memory().unwrap());
            let auth = AuthSession::new();
            auth.sign_in(Identity::new("u1", "u1@example.com"));
            let manager = BookmarkManager::new(Arc::clone(&store), auth, &settings());

            let (model, _) = apply(&manager, &ops, &snapshot).await?;

            let records = store.list_where("u1").await.unwrap();
            let stored: BTreeSet<String> = records.iter().map(|r| r.meal_id.clone()).collect();
            prop_assert_eq!(stored, model);
            let expected_name = snapshot.name.as_ref().and_then(|v| v.as_str()).unwrap_or_default().to_string();
            for record in &records {
                prop_assert_eq!(&record.meal_name, &expected_name);
            }
            Ok(())
        })?;
    }
}
