#![allow(dead_code)]

use reqwest::Client;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Once,
};
use tokio::sync::OnceCell;

static INIT: Once = Once::new();
static SCHEMA: OnceCell<()> = OnceCell::const_new();
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        std::env::set_var("BCRYPT_COST", "4");
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        std::env::set_var("LIKE_LOCK_TIMEOUT_MS", "5000");
        let config = quorum::config::jwt::JwtConfig::from_env().unwrap();
        let _ = quorum::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }
}

pub async fn spawn_app() -> TestApp {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    // Migrate and clear once per test binary. Tests in a binary run
    // concurrently, so they only ever touch rows they created themselves.
    SCHEMA
        .get_or_init(|| async {
            quorum::migration::Migrator::up(&db, None)
                .await
                .expect("Failed to run migrations");
            cleanup_tables(&db).await;
        })
        .await;

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(quorum::routes::create_routes())
        .layer(axum::middleware::from_fn(
            quorum::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client: Client::new(),
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    db.execute(Statement::from_string(
        sea_orm::DatabaseBackend::Postgres,
        "TRUNCATE TABLE likes, comments, questions, articles, users CASCADE".to_string(),
    ))
    .await
    .expect("Failed to truncate tables");
}

/// Username unique across the tests of this run.
pub fn unique_name(prefix: &str) -> String {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}_{}_{}", prefix, std::process::id(), counter)
}

/// Register a user and return (user_id, token).
pub async fn create_test_user(app: &TestApp, username_prefix: &str) -> (i32, String) {
    let username = unique_name(username_prefix);

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": username,
            "email": format!("{}@test.com", username),
            "password": "test_password_123"
        }))
        .send()
        .await
        .expect("Failed to register user");

    let status = resp.status();
    let body: Value = resp.json().await.unwrap_or_else(|e| {
        panic!(
            "Failed to parse register response for '{}': status={}, error={}",
            username, status, e
        );
    });

    if !body["success"].as_bool().unwrap_or(false) {
        panic!(
            "Failed to register user '{}': status={}, body={}",
            username, status, body
        );
    }

    let user_id = body["data"]["user_id"]
        .as_i64()
        .unwrap_or_else(|| panic!("Response missing user_id: {body}")) as i32;
    let token = body["data"]["token"]
        .as_str()
        .unwrap_or_else(|| panic!("Response missing token: {body}"))
        .to_string();
    (user_id, token)
}

/// Make a user admin by directly updating the database.
pub async fn make_admin(db: &DatabaseConnection, user_id: i32) {
    set_role(db, user_id, "admin").await;
}

pub async fn set_role(db: &DatabaseConnection, user_id: i32, role: &str) {
    db.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        "UPDATE users SET role = $1 WHERE id = $2",
        vec![role.into(), user_id.into()],
    ))
    .await
    .expect("Failed to update user role");
}

async fn post_for_id(app: &TestApp, path: &str, token: &str, payload: Value) -> i32 {
    let resp = app
        .client
        .post(app.url(path))
        .bearer_auth(token)
        .json(&payload)
        .send()
        .await
        .expect("Failed to send create request");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("POST {} failed: status={}, body={}", path, status, body);
    }
    body["data"]["id"]
        .as_i64()
        .unwrap_or_else(|| panic!("Response missing id: {body}")) as i32
}

pub async fn create_article(app: &TestApp, token: &str) -> i32 {
    post_for_id(
        app,
        "/articles",
        token,
        serde_json::json!({ "title": "Test Article", "content": "Some **markdown** body" }),
    )
    .await
}

pub async fn create_question(app: &TestApp, token: &str) -> i32 {
    post_for_id(
        app,
        "/questions",
        token,
        serde_json::json!({ "title": "Test Question?", "description": "Details" }),
    )
    .await
}

pub async fn create_comment(app: &TestApp, token: &str, question_id: i32) -> i32 {
    post_for_id(
        app,
        &format!("/questions/{}/comments", question_id),
        token,
        serde_json::json!({ "content": "An answer" }),
    )
    .await
}

/// POST a like toggle and return the raw response.
pub async fn toggle(app: &TestApp, token: &str, kind: &str, id: i32) -> reqwest::Response {
    app.client
        .post(app.url(&format!("/likes/{}/{}", kind, id)))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send toggle")
}

/// POST a like toggle, assert success and return `data`.
pub async fn toggle_ok(app: &TestApp, token: &str, kind: &str, id: i32) -> Value {
    let resp = toggle(app, token, kind, id).await;
    assert_eq!(resp.status(), 200, "toggle {kind}/{id} failed");
    let body: Value = resp.json().await.unwrap();
    body["data"].clone()
}

/// GET like status, optionally authenticated, and return `data`.
pub async fn like_status(app: &TestApp, token: Option<&str>, kind: &str, id: i32) -> Value {
    let mut req = app.client.get(app.url(&format!("/likes/{}/{}", kind, id)));
    if let Some(token) = token {
        req = req.bearer_auth(token);
    }
    let resp = req.send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    body["data"].clone()
}

/// Number of mark rows for a target, straight from the table.
pub async fn mark_count(db: &DatabaseConnection, target_type: &str, target_id: i32) -> i64 {
    let row = db
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT COUNT(*) FROM likes WHERE target_type = $1 AND target_id = $2",
            vec![target_type.into(), target_id.into()],
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get_by_index::<i64>(0).unwrap()
}

/// Number of mark rows a user owns, across all targets.
pub async fn user_mark_count(db: &DatabaseConnection, user_id: i32) -> i64 {
    let row = db
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT COUNT(*) FROM likes WHERE user_id = $1",
            vec![user_id.into()],
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get_by_index::<i64>(0).unwrap()
}

/// Cached counter column of a likeable row.
pub async fn counter_value(db: &DatabaseConnection, table: &str, column: &str, id: i32) -> i64 {
    let row = db
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            &format!("SELECT {column} FROM {table} WHERE id = $1"),
            vec![id.into()],
        ))
        .await
        .unwrap()
        .unwrap();
    i64::from(row.try_get_by_index::<i32>(0).unwrap())
}
