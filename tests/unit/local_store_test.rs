//! Unit tests for the on-device SQLite bookmark store.

use std::sync::Arc;

use zaikabox::storage::{BookmarkStore, LocalBookmarkStore};
use zaikabox::types::bookmark::{NewBookmark, RecipeSnapshot};
use zaikabox::types::settings::StorageBackend;

fn teriyaki(user_id: &str) -> NewBookmark {
    NewBookmark::from_snapshot(
        user_id,
        "52772",
        &RecipeSnapshot::new(
            "Teriyaki Chicken Casserole",
            "https://www.themealdb.com/images/media/meals/wvpsxx1468256321.jpg",
            "Chicken",
            "Japanese",
        ),
    )
}

fn arrabiata(user_id: &str) -> NewBookmark {
    NewBookmark::from_snapshot(
        user_id,
        "52771",
        &RecipeSnapshot::new("Spicy Arrabiata Penne", "", "Vegetarian", "Italian"),
    )
}

#[tokio::test]
async fn test_create_then_list() {
    let store = LocalBookmarkStore::open_in_memory().unwrap();
    let created = store.create(teriyaki("u1")).await.unwrap();

    assert!(created.id.is_none(), "local records have no generated id");
    assert!(created.bookmarked_at.is_some());
    assert_eq!(created.meal_name, "Teriyaki Chicken Casserole");

    let listed = store.list_where("u1").await.unwrap();
    assert_eq!(listed, vec![created]);
}

#[tokio::test]
async fn test_duplicate_create_keeps_single_entry() {
    let store = LocalBookmarkStore::open_in_memory().unwrap();
    let first = store.create(teriyaki("u1")).await.unwrap();

    let mut renamed = teriyaki("u1");
    renamed.meal_name = "Renamed".to_string();
    let second = store.create(renamed).await.unwrap();

    assert_eq!(second, first, "existing entry is returned unchanged");
    assert_eq!(store.list_where("u1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_users_are_isolated() {
    let store = LocalBookmarkStore::open_in_memory().unwrap();
    store.create(teriyaki("u1")).await.unwrap();
    store.create(arrabiata("u2")).await.unwrap();

    let u1: Vec<_> = store.list_where("u1").await.unwrap().into_iter().map(|r| r.meal_id).collect();
    let u2: Vec<_> = store.list_where("u2").await.unwrap().into_iter().map(|r| r.meal_id).collect();
    assert_eq!(u1, vec!["52772"]);
    assert_eq!(u2, vec!["52771"]);

    assert_eq!(store.delete_where("u2", "52772").await.unwrap(), 0);
    assert_eq!(store.list_where("u1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_where_reports_removed_rows() {
    let store = LocalBookmarkStore::open_in_memory().unwrap();
    store.create(teriyaki("u1")).await.unwrap();
    store.create(arrabiata("u1")).await.unwrap();

    assert_eq!(store.delete_where("u1", "52772").await.unwrap(), 1);
    assert_eq!(store.delete_where("u1", "52772").await.unwrap(), 0);

    let remaining = store.list_where("u1").await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].meal_id, "52771");
}

#[tokio::test]
async fn test_list_unknown_user_is_empty() {
    let store = LocalBookmarkStore::open_in_memory().unwrap();
    assert!(store.list_where("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bookmarks_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bookmarks.db");

    {
        let store = LocalBookmarkStore::open(&path).unwrap();
        store.create(teriyaki("u1")).await.unwrap();
    }

    let store = LocalBookmarkStore::open(&path).unwrap();
    let listed = store.list_where("u1").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].meal_category, "Chicken");
    assert_eq!(store.backend(), StorageBackend::Local);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_tasks_share_the_store() {
    let store = Arc::new(LocalBookmarkStore::open_in_memory().unwrap());

    let tasks: Vec<_> = (0..16)
        .map(|n| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let meal_id = format!("5277{:02}", n);
                let bookmark = NewBookmark::from_snapshot("u1", &meal_id, &RecipeSnapshot::default());
                store.create(bookmark).await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(store.list_where("u1").await.unwrap().len(), 16);
}
