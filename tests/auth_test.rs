mod common;

use reqwest::{header::SET_COOKIE, Response, StatusCode};
use serde_json::{json, Value};

const PASSWORD: &str = "password_123";

async fn register(app: &common::TestApp, username: &str, email: &str) -> Response {
    app.client
        .post(app.url("/auth/register"))
        .json(&json!({ "username": username, "email": email, "password": PASSWORD }))
        .send()
        .await
        .unwrap()
}

async fn login(app: &common::TestApp, identifier: &str, password: &str) -> Response {
    app.client
        .post(app.url("/auth/login"))
        .json(&json!({ "username": identifier, "password": password }))
        .send()
        .await
        .unwrap()
}

async fn me_with_cookie(app: &common::TestApp, token: &str) -> Response {
    app.client
        .get(app.url("/auth/me"))
        .header("Cookie", format!("theme=dark; access_token={}", token))
        .send()
        .await
        .unwrap()
}

fn set_cookies(resp: &Response) -> Vec<String> {
    resp.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn register_then_login_by_username_or_email() {
    let app = common::spawn_app().await;
    let username = common::unique_name("alice");
    let email = format!("{}@example.com", username);

    let resp = register(&app, &username, &email).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["username"], username.as_str());
    assert!(body["data"]["token"].is_string());

    assert_eq!(login(&app, &username, PASSWORD).await.status(), StatusCode::OK);

    let body: Value = login(&app, &email, PASSWORD).await.json().await.unwrap();
    let token = body["data"]["token"].as_str().unwrap();

    let me: Value = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["data"]["email"], email.as_str());
    assert_eq!(me["data"]["role"], "user");
    assert!(me["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = common::spawn_app().await;
    let email = format!("{}@example.com", common::unique_name("dup"));

    let first = register(&app, &common::unique_name("bob"), &email).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = register(&app, &common::unique_name("bob"), &email).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_rejects_bad_input() {
    let app = common::spawn_app().await;

    // username too short
    let resp = register(&app, "ab", "short@example.com").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = register(&app, &common::unique_name("mail"), "not-an-email").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&json!({
            "username": common::unique_name("pw"),
            "email": "pw@example.com",
            "password": "short"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = common::spawn_app().await;
    let username = common::unique_name("carol");
    register(&app, &username, &format!("{}@example.com", username)).await;

    let resp = login(&app, &username, "wrong_password").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_without_credentials_is_unauthorized() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/auth/me")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_cookie_is_http_only_and_accepted() {
    let app = common::spawn_app().await;
    let username = common::unique_name("cookie");

    let resp = register(&app, &username, &format!("{}@example.com", username)).await;
    let cookies = set_cookies(&resp);
    let session = cookies
        .iter()
        .find(|c| c.starts_with("access_token="))
        .expect("register sets the session cookie");
    assert!(session.contains("HttpOnly"));

    let token = session
        .trim_start_matches("access_token=")
        .split(';')
        .next()
        .unwrap();
    assert_eq!(me_with_cookie(&app, token).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn like_toggle_accepts_session_cookie() {
    let app = common::spawn_app().await;
    let (_, author) = common::create_test_user(&app, "author").await;
    let (_, token) = common::create_test_user(&app, "cookie").await;
    let article_id = common::create_article(&app, &author).await;

    let body: Value = app
        .client
        .post(app.url(&format!("/likes/articles/{}", article_id)))
        .header("Cookie", format!("access_token={}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["liked"], true);
    assert_eq!(body["data"]["count"], 1);
}

#[tokio::test]
async fn logout_expires_session_cookie() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "leaver").await;

    let resp = app
        .client
        .post(app.url("/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(set_cookies(&resp)
        .iter()
        .any(|c| c.starts_with("access_token=;") && c.contains("Max-Age=0")));
}

#[tokio::test]
async fn banned_user_can_neither_like_nor_log_in() {
    let app = common::spawn_app().await;
    let (_, author) = common::create_test_user(&app, "author").await;
    let username = common::unique_name("troll");
    let body: Value = register(&app, &username, &format!("{}@example.com", username))
        .await
        .json()
        .await
        .unwrap();
    let user_id = body["data"]["user_id"].as_i64().unwrap() as i32;
    let token = body["data"]["token"].as_str().unwrap().to_string();
    let article_id = common::create_article(&app, &author).await;

    common::set_role(&app.db, user_id, "banned").await;

    let resp = common::toggle(&app, &token, "articles", article_id).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(common::mark_count(&app.db, "article", article_id).await, 0);

    let resp = login(&app, &username, PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn error_responses_carry_security_headers() {
    let app = common::spawn_app().await;

    let resp = login(&app, "missing_user", "wrong_password").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let header = |name: &str| {
        resp.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    assert!(header("content-security-policy").is_some());
    assert_eq!(header("x-content-type-options").as_deref(), Some("nosniff"));
    assert_eq!(header("x-frame-options").as_deref(), Some("DENY"));
}
