//! PostgreSQL note store integration tests.
//!
//! Skipped unless `RUN_DB_TESTS=1`; see `notebot_db::test_fixtures`.

use std::time::Duration;

use notebot_db::test_fixtures::{should_run_db_tests, TestDatabase};
use notebot_db::{CreateNoteRequest, NoteStore, PgNoteRepository};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn titles(tags: &[notebot_db::Tag]) -> Vec<String> {
    let mut out: Vec<String> = tags.iter().map(|t| t.title.clone()).collect();
    out.sort();
    out
}

#[tokio::test]
async fn test_create_with_tags_round_trip() {
    if !should_run_db_tests() {
        return;
    }
    let test_db = TestDatabase::new().await;
    let db = &test_db.db;

    let note_id = db
        .create_note_with_tags(CreateNoteRequest {
            user_id: test_db.user_id,
            title: "Groceries".to_string(),
            url: Some("https://shop.example".to_string()),
            description: None,
            tags: strings(&["a", "b", "a", ""]),
        })
        .await
        .expect("create note");

    let note = db.get_note(note_id).await.unwrap().expect("note exists");
    assert_eq!(note.title, "Groceries");
    assert_eq!(note.url.as_deref(), Some("https://shop.example"));
    assert_eq!(note.description, None);

    let tags = db.get_tags_by_note(note_id).await.unwrap();
    assert_eq!(titles(&tags), strings(&["a", "b"]));

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_update_with_same_tags_is_idempotent() {
    if !should_run_db_tests() {
        return;
    }
    let test_db = TestDatabase::new().await;
    let db = &test_db.db;

    let note_id = db
        .create_note_with_tags(CreateNoteRequest {
            user_id: test_db.user_id,
            title: "Read later".to_string(),
            tags: strings(&["a", "b"]),
            ..Default::default()
        })
        .await
        .unwrap();
    let note = db.get_note(note_id).await.unwrap().unwrap();

    db.update_note_with_tag_diff(&note, &strings(&["b", "a"]))
        .await
        .unwrap();
    db.update_note_with_tag_diff(&note, &strings(&["b", "a"]))
        .await
        .unwrap();

    let tags = db.get_tags_by_note(note_id).await.unwrap();
    assert_eq!(titles(&tags), strings(&["a", "b"]));
    assert_eq!(db.get_tags_by_user(test_db.user_id).await.unwrap().len(), 2);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_update_replaces_tag_set() {
    if !should_run_db_tests() {
        return;
    }
    let test_db = TestDatabase::new().await;
    let db = &test_db.db;

    let note_id = db
        .create_note_with_tags(CreateNoteRequest {
            user_id: test_db.user_id,
            title: "Trip".to_string(),
            tags: strings(&["travel", "todo"]),
            ..Default::default()
        })
        .await
        .unwrap();
    let mut note = db.get_note(note_id).await.unwrap().unwrap();
    note.description = Some("pack light".to_string());

    db.update_note_with_tag_diff(&note, &strings(&["travel", "summer"]))
        .await
        .unwrap();

    let stored = db.get_note(note_id).await.unwrap().unwrap();
    assert_eq!(stored.description.as_deref(), Some("pack light"));
    let tags = db.get_tags_by_note(note_id).await.unwrap();
    assert_eq!(titles(&tags), strings(&["summer", "travel"]));

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_update_of_foreign_note_is_not_found() {
    if !should_run_db_tests() {
        return;
    }
    let test_db = TestDatabase::new().await;
    let db = &test_db.db;
    let intruder = test_db.another_user().await;

    let note_id = db
        .create_note_with_tags(CreateNoteRequest {
            user_id: test_db.user_id,
            title: "Mine".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let mut note = db.get_note(note_id).await.unwrap().unwrap();
    note.user_id = intruder;
    note.title = "Stolen".to_string();

    let err = db.update_note_with_tag_diff(&note, &[]).await.unwrap_err();
    assert!(err.is_not_found());
    let stored = db.get_note(note_id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Mine");

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_list_by_tag_filters_to_owner() {
    if !should_run_db_tests() {
        return;
    }
    let test_db = TestDatabase::new().await;
    let db = &test_db.db;
    let other = test_db.another_user().await;

    for (user_id, title, tags) in [
        (test_db.user_id, "one", vec!["x"]),
        (test_db.user_id, "two", vec!["y"]),
        (test_db.user_id, "three", vec!["x", "y"]),
        (other, "foreign", vec!["x"]),
    ] {
        db.create_note_with_tags(CreateNoteRequest {
            user_id,
            title: title.to_string(),
            tags: strings(&tags),
            ..Default::default()
        })
        .await
        .unwrap();
    }

    let tagged = db
        .get_notes_by_user_and_tag(test_db.user_id, "x")
        .await
        .unwrap();
    let names: Vec<&str> = tagged.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(names, vec!["one", "three"]);

    let all = db.get_notes_by_user(test_db.user_id).await.unwrap();
    assert_eq!(all.len(), 3);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_delete_cascades_links() {
    if !should_run_db_tests() {
        return;
    }
    let test_db = TestDatabase::new().await;
    let db = &test_db.db;

    let note_id = db
        .create_note_with_tags(CreateNoteRequest {
            user_id: test_db.user_id,
            title: "Gone soon".to_string(),
            tags: strings(&["tmp"]),
            ..Default::default()
        })
        .await
        .unwrap();

    db.delete_note(note_id).await.unwrap();
    assert!(db.get_note(note_id).await.unwrap().is_none());
    assert!(db.get_tags_by_note(note_id).await.unwrap().is_empty());
    assert!(db.delete_note(note_id).await.unwrap_err().is_not_found());

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_expired_deadline_rolls_back() {
    if !should_run_db_tests() {
        return;
    }
    let test_db = TestDatabase::new().await;
    let repo = PgNoteRepository::new(test_db.db.pool.clone()).with_write_timeout(Duration::ZERO);

    let result = repo
        .insert_with_tags(CreateNoteRequest {
            user_id: test_db.user_id,
            title: "Too slow".to_string(),
            tags: strings(&["late"]),
            ..Default::default()
        })
        .await;

    assert!(result.unwrap_err().is_timeout());
    let notes = test_db.db.get_notes_by_user(test_db.user_id).await.unwrap();
    assert!(notes.is_empty());

    test_db.cleanup().await;
}
