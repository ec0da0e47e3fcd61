use crate::common::{TestApp, routes};

#[tokio::test]
async fn create_publication_registers_encrypted_content() {
    let app = TestApp::spawn().await;
    app.write_master("moby.epub", b"call me ishmael");

    let res = app
        .post_json(
            routes::PUBLICATIONS,
            &serde_json::json!({ "title": "  Moby Dick ", "masterFilename": "moby.epub" }),
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["title"], "Moby Dick");
    assert_eq!(res.body["status"], "draft");
    assert_eq!(res.body["masterFilename"], "moby.epub");
    assert!(res.body["uuid"].is_string());

    let res = app.get(routes::CONTENTS).await;
    let list = res.body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["location"], "moby-dick");
    assert_eq!(list[0]["length"], "ENC:call me ishmael".len() as i64);

    let id = list[0]["id"].as_str().unwrap();
    let res = app.get(&routes::content(id)).await;
    assert_eq!(res.bytes, b"ENC:call me ishmael");
}

#[tokio::test]
async fn create_publication_requires_master_file() {
    let app = TestApp::spawn().await;
    let res = app
        .post_json(
            routes::PUBLICATIONS,
            &serde_json::json!({ "title": "Ghost", "masterFilename": "ghost.epub" }),
        )
        .await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");

    let res = app.get(routes::PUBLICATIONS).await;
    assert_eq!(res.body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn create_publication_validates_input() {
    let app = TestApp::spawn().await;
    app.write_master("ok.epub", b"x");

    for (title, filename) in [
        ("", "ok.epub"),
        ("   ", "ok.epub"),
        ("Fine", "../ok.epub"),
        ("Fine", "sub/ok.epub"),
        ("!!!", "ok.epub"),
    ] {
        let res = app
            .post_json(
                routes::PUBLICATIONS,
                &serde_json::json!({ "title": title, "masterFilename": filename }),
            )
            .await;
        assert_eq!(res.status, 400, "title={title:?} filename={filename:?}");
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    let long = "x".repeat(257);
    let res = app
        .post_json(
            routes::PUBLICATIONS,
            &serde_json::json!({ "title": long, "masterFilename": "ok.epub" }),
        )
        .await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn list_publications_paginates_with_link_headers() {
    let app = TestApp::spawn().await;
    for i in 0..3 {
        app.create_publication(&format!("Book {i}"), &format!("book-{i}.epub"))
            .await;
    }

    let res = app
        .get(&format!("{}?page=1&per_page=2", routes::PUBLICATIONS))
        .await;
    assert_eq!(res.status, 200);
    let page = res.body.as_array().unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0]["title"], "Book 0");
    assert_eq!(
        res.header_all("link"),
        vec![
            "</api/v1/publications?page=2&per_page=2>; rel=\"next\"; title=\"next\"".to_string()
        ]
    );

    let res = app
        .get(&format!("{}?page=2&per_page=2", routes::PUBLICATIONS))
        .await;
    let page = res.body.as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["title"], "Book 2");
    let links = res.header_all("link");
    assert_eq!(links.len(), 2);
    assert!(links.iter().any(|l| l.contains("page=3") && l.contains("rel=\"next\"")));
    assert!(
        links
            .iter()
            .any(|l| l.contains("page=1") && l.contains("rel=\"previous\""))
    );

    let res = app
        .get(&format!("{}?page=3&per_page=2", routes::PUBLICATIONS))
        .await;
    assert_eq!(res.body.as_array().unwrap().len(), 0);
    let links = res.header_all("link");
    assert_eq!(links.len(), 1);
    assert!(links[0].contains("rel=\"previous\""));
}

#[tokio::test]
async fn list_publications_rejects_bad_paging() {
    let app = TestApp::spawn().await;
    for query in ["page=0", "per_page=0", "per_page=101", "page=abc"] {
        let res = app
            .get(&format!("{}?{query}", routes::PUBLICATIONS))
            .await;
        assert_eq!(res.status, 400, "query {query}");
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn check_by_title_finds_exact_match() {
    let app = TestApp::spawn().await;
    let id = app.create_publication("Dracula", "dracula.epub").await;

    let res = app
        .get(&format!("{}?title=Dracula", routes::CHECK_BY_TITLE))
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.id(), id);

    let res = app
        .get(&format!("{}?title=Frankenstein", routes::CHECK_BY_TITLE))
        .await;
    assert_eq!(res.status, 404);

    let res = app.get(routes::CHECK_BY_TITLE).await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn update_publication_changes_only_title() {
    let app = TestApp::spawn().await;
    let id = app.create_publication("Emma", "emma.epub").await;
    let before = app.get(&routes::publication(id)).await;

    let res = app
        .put_json(
            &routes::publication(id),
            &serde_json::json!({ "title": "Emma (Annotated)" }),
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["title"], "Emma (Annotated)");
    assert_eq!(res.body["status"], before.body["status"]);
    assert_eq!(res.body["uuid"], before.body["uuid"]);
    assert_eq!(res.body["masterFilename"], "emma.epub");

    let res = app
        .put_json(&routes::publication(id), &serde_json::json!({ "title": "" }))
        .await;
    assert_eq!(res.status, 400);

    let res = app
        .put_json(
            &routes::publication(id + 1000),
            &serde_json::json!({ "title": "Nobody" }),
        )
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn delete_publication_removes_master_but_keeps_content() {
    let app = TestApp::spawn().await;
    let id = app.create_publication("Ulysses", "ulysses.epub").await;
    assert!(app.master_path("ulysses.epub").exists());

    let res = app.delete(&routes::publication(id)).await;
    assert_eq!(res.status, 204);
    assert!(!app.master_path("ulysses.epub").exists());

    let res = app.get(&routes::publication(id)).await;
    assert_eq!(res.status, 404);

    let res = app.get(routes::CONTENTS).await;
    let list = res.body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    let content_id = list[0]["id"].as_str().unwrap();
    let res = app.get(&routes::content(content_id)).await;
    assert_eq!(res.status, 200);

    let res = app.delete(&routes::publication(id)).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn upload_registers_content_named_after_title() {
    let app = TestApp::spawn().await;

    let res = app
        .upload(
            &format!("{}?title=War%20and%20Peace", routes::PUBLICATIONS_UPLOAD),
            "book.epub",
            b"tolstoy".to_vec(),
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["disposition"], "war-and-peace");
    let content_id = res.body["content_id"].as_str().unwrap().to_string();

    let res = app.get(&routes::content(&content_id)).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.bytes, b"ENC:tolstoy");
    assert_eq!(app.scratch_entries(), 0);

    // Upload alone never creates a publication.
    let res = app.get(routes::PUBLICATIONS).await;
    assert_eq!(res.body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn upload_requires_file_field() {
    let app = TestApp::spawn().await;
    let form = reqwest::multipart::Form::new().text("note", "no file here");
    let res = app
        .client
        .post(format!(
            "http://{}{}?title=Empty",
            app.addr,
            routes::PUBLICATIONS_UPLOAD
        ))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
}
