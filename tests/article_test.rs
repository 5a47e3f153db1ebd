mod common;

use serde_json::Value;

#[tokio::test]
async fn create_and_get_article() {
    let app = common::spawn_app().await;
    let (user_id, token) = common::create_test_user(&app, "writer").await;

    let resp = app
        .client
        .post(app.url("/articles"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "title": "Hello",
            "content": "# Heading\n\nBody with <script>alert(1)</script>"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let article_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["user_id"], user_id);
    assert_eq!(body["data"]["likes"], 0);
    assert_eq!(body["data"]["has_liked"], false);

    let resp = app
        .client
        .get(app.url(&format!("/articles/{}", article_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let html = body["data"]["content_html"].as_str().unwrap();
    assert!(html.contains("<h1>"));
    assert!(!html.contains("<script>"));
    assert!(!body["data"]["excerpt"].as_str().unwrap().contains('#'));
}

#[tokio::test]
async fn create_article_requires_auth() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/articles"))
        .json(&serde_json::json!({ "title": "Nope", "content": "Body" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn create_article_validates_title() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "writer").await;

    let resp = app
        .client
        .post(app.url("/articles"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "title": "", "content": "Body" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn get_missing_article_returns_404() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url(&format!("/articles/{}", i32::MAX)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn only_author_can_edit() {
    let app = common::spawn_app().await;
    let (_, author) = common::create_test_user(&app, "author").await;
    let (_, other) = common::create_test_user(&app, "other").await;
    let article_id = common::create_article(&app, &author).await;

    let resp = app
        .client
        .put(app.url(&format!("/articles/{}", article_id)))
        .bearer_auth(&other)
        .json(&serde_json::json!({ "title": "Hijack", "content": "Body" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .delete(app.url(&format!("/articles/{}", article_id)))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn admin_can_delete_any_article() {
    let app = common::spawn_app().await;
    let (_, author) = common::create_test_user(&app, "author").await;
    let (admin_id, admin) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, admin_id).await;
    let article_id = common::create_article(&app, &author).await;

    let resp = app
        .client
        .delete(app.url(&format!("/articles/{}", article_id)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/articles/{}", article_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn list_articles_paginates() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "writer").await;
    for _ in 0..3 {
        common::create_article(&app, &token).await;
    }

    let resp = app
        .client
        .get(app.url("/articles?page=1&per_page=2"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["per_page"], 2);
    assert!(body["data"]["total"].as_u64().unwrap() >= 3);
}

#[tokio::test]
async fn most_liked_is_ordered_by_likes() {
    let app = common::spawn_app().await;
    let (_, author) = common::create_test_user(&app, "author").await;
    let (_, a) = common::create_test_user(&app, "fan").await;
    let (_, b) = common::create_test_user(&app, "fan").await;
    let popular = common::create_article(&app, &author).await;
    let liked_once = common::create_article(&app, &author).await;

    common::toggle_ok(&app, &a, "articles", popular).await;
    common::toggle_ok(&app, &b, "articles", popular).await;
    common::toggle_ok(&app, &a, "articles", liked_once).await;

    let resp = app
        .client
        .get(app.url("/articles/most-liked?limit=50"))
        .bearer_auth(&a)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let items = body["data"].as_array().unwrap();

    let likes: Vec<i64> = items.iter().map(|i| i["likes"].as_i64().unwrap()).collect();
    assert!(likes.windows(2).all(|w| w[0] >= w[1]));

    let position = |id: i32| items.iter().position(|i| i["id"] == id);
    if let (Some(p), Some(o)) = (position(popular), position(liked_once)) {
        assert!(p < o);
        assert_eq!(items[p]["has_liked"], true);
    }
}

async fn write(app: &common::TestApp, token: &str, title: &str, content: &str) -> i64 {
    let resp = app
        .client
        .post(app.url("/articles"))
        .bearer_auth(token)
        .json(&serde_json::json!({ "title": title, "content": content }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn admin_can_edit_any_article() {
    let app = common::spawn_app().await;
    let (_, author) = common::create_test_user(&app, "author").await;
    let (admin_id, admin) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, admin_id).await;
    let article_id = common::create_article(&app, &author).await;

    let resp = app
        .client
        .put(app.url(&format!("/articles/{}", article_id)))
        .bearer_auth(&admin)
        .json(&serde_json::json!({ "title": "Moderated", "content": "Cleaned" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Moderated");
    assert_eq!(body["data"]["likes"], 0);
}

#[tokio::test]
async fn article_search_is_case_insensitive_and_literal() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "writer").await;
    let term = common::unique_name("Quill");

    let in_title = write(&app, &token, &format!("{} notes", term), "Body").await;
    let in_content = write(
        &app,
        &token,
        "Elsewhere",
        &format!("Deep in the text: {}", term.to_lowercase()),
    )
    .await;
    // Only differs in where `_` sits, so a wildcard `_` would match it.
    write(&app, &token, &term.replacen('_', "x", 1), "Body").await;

    let resp = app
        .client
        .get(app.url(&format!("/articles/search?q={}&per_page=1", term.to_uppercase())))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["items"][0]["id"], in_content);

    let resp = app
        .client
        .get(app.url(&format!("/articles/search?q={}&page=2&per_page=1", term)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["items"][0]["id"], in_title);
}

#[tokio::test]
async fn articles_listed_by_author_carry_like_flags() {
    let app = common::spawn_app().await;
    let (author_id, author) = common::create_test_user(&app, "author").await;
    let (_, reader) = common::create_test_user(&app, "reader").await;
    let article_id = common::create_article(&app, &author).await;
    common::create_article(&app, &reader).await;
    common::toggle_ok(&app, &reader, "articles", article_id).await;

    let resp = app
        .client
        .get(app.url(&format!("/users/{}/articles", author_id)))
        .bearer_auth(&reader)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], article_id);
    assert_eq!(body["data"]["items"][0]["has_liked"], true);
    assert_eq!(body["data"]["items"][0]["likes"], 1);

    let resp = app
        .client
        .get(app.url(&format!("/users/{}/articles", i32::MAX)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
