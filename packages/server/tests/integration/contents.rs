use futures::future::join_all;
use quire_common::{ArtifactId, BlobStore};
use quire_server::entity::content;
use sea_orm::{EntityTrait, PaginatorTrait};

use crate::common::{TestApp, routes};

#[tokio::test]
async fn register_then_replace_content() {
    let app = TestApp::spawn().await;

    let res = app
        .register_content("abc123", b"first encrypted bytes", "SzE=", Some(21))
        .await;
    assert_eq!(res.status, 201, "{}", res.text);

    let res = app.get(&routes::content("abc123")).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.bytes, b"first encrypted bytes");
    assert_eq!(res.header("content-type"), Some("application/epub+zip"));
    assert_eq!(res.header("content-length"), Some("21"));
    assert!(
        res.header("content-disposition")
            .unwrap()
            .starts_with("attachment; filename=\"abc123.epub\"")
    );

    // Same id again: bytes replaced, omitted length resets to unknown.
    let res = app
        .register_content("abc123", b"second", "SzI=", None)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app.get(&routes::content("abc123")).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.bytes, b"second");
    assert_eq!(res.header("content-length"), Some("6"));

    let res = app.get(routes::CONTENTS).await;
    assert_eq!(res.status, 200);
    let list = res.body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], "abc123");
    assert_eq!(list[0]["length"], -1);
    assert_eq!(list[0]["location"], "abc123.epub");
    assert!(list[0].get("encryption_key").is_none());
    assert!(list[0].get("content-encryption-key").is_none());
}

#[tokio::test]
async fn missing_blob_is_an_integrity_error() {
    let app = TestApp::spawn().await;
    let res = app.register_content("orphan", b"bytes", "SzE=", None).await;
    assert_eq!(res.status, 201);

    let id = ArtifactId::parse("orphan").unwrap();
    assert!(app.blob_store.delete(&id).await.unwrap());

    let res = app.get(&routes::content("orphan")).await;
    assert_eq!(res.status, 500);
    assert_eq!(res.body["code"], "INTEGRITY_ERROR");
}

#[tokio::test]
async fn unknown_content_is_not_found() {
    let app = TestApp::spawn().await;
    let res = app.get(&routes::content("never-registered")).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn invalid_content_id_is_rejected() {
    let app = TestApp::spawn().await;

    let res = app.get(&routes::content("bad%20id")).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");

    let res = app.register_content(".hidden", b"x", "SzE=", None).await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn unreadable_location_registers_nothing() {
    let app = TestApp::spawn().await;
    let missing = app.dir.path().join("fixtures").join("does-not-exist");

    let res = app
        .put_json(
            &routes::content("ghost"),
            &serde_json::json!({
                "content-encryption-key": "SzE=",
                "protected-content-location": missing.to_string_lossy(),
            }),
        )
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");

    let res = app.get(&routes::content("ghost")).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn malformed_key_is_rejected() {
    let app = TestApp::spawn().await;
    let location = app.write_encrypted("k", b"bytes");

    let res = app
        .put_json(
            &routes::content("bad-key"),
            &serde_json::json!({
                "content-encryption-key": "not base64!",
                "protected-content-location": location,
            }),
        )
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn ingest_encrypts_and_registers_under_new_id() {
    let app = TestApp::spawn().await;

    let res = app
        .post_bytes(&routes::content("book.epub"), b"plain epub".to_vec())
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let id = res.body.as_str().expect("body should be the new id").to_string();
    assert!(uuid::Uuid::parse_str(&id).is_ok());

    let res = app.get(&routes::content(&id)).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.bytes, b"ENC:plain epub");
    assert!(
        res.header("content-disposition")
            .unwrap()
            .contains("filename=\"book.epub\"")
    );
    assert_eq!(app.scratch_entries(), 0);
}

#[tokio::test]
async fn ingest_rejects_empty_body() {
    let app = TestApp::spawn().await;
    let res = app.post_bytes(&routes::content("book.epub"), Vec::new()).await;
    assert_eq!(res.status, 400);

    let res = app.get(routes::CONTENTS).await;
    assert_eq!(res.body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::spawn().await;
    let res = app.get(routes::HEALTH).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["status"], "ok");
}

#[tokio::test]
async fn concurrent_first_registrations_create_one_row() {
    let app = TestApp::spawn().await;

    let responses = join_all((0..8).map(|i| {
        let app = &app;
        async move {
            app.register_content("racy-id", format!("payload {i}").as_bytes(), "SzE=", None)
                .await
        }
    }))
    .await;

    let created = responses.iter().filter(|r| r.status == 201).count();
    let updated = responses.iter().filter(|r| r.status == 200).count();
    let statuses: Vec<u16> = responses.iter().map(|r| r.status).collect();
    assert_eq!(created, 1, "statuses: {statuses:?}");
    assert_eq!(updated, responses.len() - 1);

    let rows = content::Entity::find().count(&app.db).await.unwrap();
    assert_eq!(rows, 1);

    let res = app.get(&routes::content("racy-id")).await;
    assert_eq!(res.status, 200);
    assert!(res.text.starts_with("payload "));
}

#[tokio::test]
async fn declared_length_mismatch_still_downloads_stored_bytes() {
    let app = TestApp::spawn().await;
    let res = app.register_content("short", b"hello", "SzE=", Some(99)).await;
    assert_eq!(res.status, 201);

    let res = app.get(&routes::content("short")).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.header("content-length"), Some("5"));
    assert_eq!(res.bytes, b"hello");

    // The declared value is still what the catalog reports.
    let res = app.get(routes::CONTENTS).await;
    assert_eq!(res.body[0]["length"], 99);
}
