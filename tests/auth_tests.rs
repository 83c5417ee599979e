use axum::http::{HeaderMap, HeaderValue, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::sync::Arc;
use tokio::net::TcpListener;
use webshop_api::{
    AppConfig, AppState, MemoryStore, OrderStoreState, ProductStoreState, PublicDir,
    StaticFileState, UserStoreState,
    auth::extract_credentials,
    create_router,
    models::{Role, User},
    store::UserStore,
};

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
}

async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());

    let state = AppState {
        users: store.clone() as UserStoreState,
        products: store.clone() as ProductStoreState,
        orders: store.clone() as OrderStoreState,
        files: Arc::new(PublicDir::new("public")) as StaticFileState,
        config: AppConfig::default(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, store }
}

fn basic_header(payload: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let value = format!("Basic {}", STANDARD.encode(payload));
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&value).unwrap());
    headers
}

// --- Credential Extraction (unit) ---

#[test]
fn test_extract_credentials_absent_header() {
    let headers = HeaderMap::new();
    assert!(extract_credentials(&headers).is_none());
}

#[test]
fn test_extract_credentials_wrong_scheme() {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_static("Bearer some-token"),
    );
    assert!(extract_credentials(&headers).is_none());

    // The scheme token is matched case-sensitively.
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_static("basic YWxpY2U6cHc="),
    );
    assert!(extract_credentials(&headers).is_none());
}

#[test]
fn test_extract_credentials_invalid_base64() {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_static("Basic !!!not-base64!!!"),
    );
    assert!(extract_credentials(&headers).is_none());
}

#[test]
fn test_extract_credentials_no_colon_yields_empty_password() {
    let headers = basic_header("alice@example.com");
    let creds = extract_credentials(&headers).unwrap();
    assert_eq!(creds.username, "alice@example.com");
    assert_eq!(creds.password, "");
}

#[test]
fn test_extract_credentials_password_may_contain_colons() {
    let headers = basic_header("alice@example.com:top:secret:pw");
    let creds = extract_credentials(&headers).unwrap();
    assert_eq!(creds.username, "alice@example.com");
    assert_eq!(creds.password, "top:secret:pw");
}

// --- Identity Resolution (end to end) ---

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    app.store
        .create_user(User::new(
            "Alice",
            "alice@example.com",
            "correct-password",
            Role::Customer,
        ))
        .await;

    let response = client
        .get(format!("{}/api/products", app.address))
        .header("Accept", "application/json")
        .basic_auth("alice@example.com", Some("wrong-password"))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), 401);
    assert_eq!(
        response
            .headers()
            .get("www-authenticate")
            .and_then(|v| v.to_str().ok()),
        Some("Basic")
    );
}

#[tokio::test]
async fn test_unknown_email_is_unauthorized() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/orders", app.address))
        .header("Accept", "application/json")
        .basic_auth("nobody@example.com", Some("whatever-password"))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_registration_then_basic_auth_roundtrip() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Register. The requested admin role is validated for shape but ignored.
    let response = client
        .post(format!("{}/api/register", app.address))
        .header("Accept", "application/json")
        .json(&serde_json::json!({
            "name": "Bob",
            "email": "bob@example.com",
            "password": "a-long-enough-password",
            "role": "admin"
        }))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), 201);
    let created: serde_json::Value = response.json().await.unwrap();
    assert_eq!(created["role"], "customer");
    assert!(created.get("password").is_none());

    // The freshly registered credentials authenticate against the stored digest.
    let response = client
        .get(format!("{}/api/orders", app.address))
        .header("Accept", "application/json")
        .basic_auth("bob@example.com", Some("a-long-enough-password"))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), 200);
}
