use std::sync::Arc;
use tokio::net::TcpListener;
use webshop_api::{
    AppConfig, AppState, MemoryStore, OrderStoreState, ProductStoreState, PublicDir,
    StaticFileState, UserStoreState, create_router,
    models::{Role, User},
    store::UserStore,
};

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "admin-password";
const CUSTOMER_EMAIL: &str = "carol@example.com";
const CUSTOMER_PASSWORD: &str = "carol-password";

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub admin: User,
    pub customer: User,
}

/// Boots the application with one admin and one customer account already present.
async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());

    let admin = store
        .create_user(User::new("Admin", ADMIN_EMAIL, ADMIN_PASSWORD, Role::Admin))
        .await;
    let customer = store
        .create_user(User::new(
            "Carol",
            CUSTOMER_EMAIL,
            CUSTOMER_PASSWORD,
            Role::Customer,
        ))
        .await;

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

    TestApp {
        address,
        store,
        admin,
        customer,
    }
}

#[tokio::test]
async fn test_customer_cannot_list_users() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/users", app.address))
        .header("Accept", "application/json")
        .basic_auth(CUSTOMER_EMAIL, Some(CUSTOMER_PASSWORD))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_admin_lists_all_users() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/users", app.address))
        .header("Accept", "application/json")
        .basic_auth(ADMIN_EMAIL, Some(ADMIN_PASSWORD))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), 200);
    let users: serde_json::Value = response.json().await.unwrap();
    assert_eq!(users.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_admin_views_single_user_without_password() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/users/{}", app.address, app.customer.id))
        .header("Accept", "application/json")
        .basic_auth(ADMIN_EMAIL, Some(ADMIN_PASSWORD))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), 200);
    let user: serde_json::Value = response.json().await.unwrap();
    assert_eq!(user["_id"], app.customer.id.as_str());
    assert_eq!(user["email"], CUSTOMER_EMAIL);
    assert!(user.get("password").is_none());
}

#[tokio::test]
async fn test_view_unknown_user_is_not_found() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!(
            "{}/api/users/0123456789abcdefabcdef01",
            app.address
        ))
        .header("Accept", "application/json")
        .basic_auth(ADMIN_EMAIL, Some(ADMIN_PASSWORD))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_admin_promotes_customer() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .put(format!("{}/api/users/{}", app.address, app.customer.id))
        .header("Accept", "application/json")
        .basic_auth(ADMIN_EMAIL, Some(ADMIN_PASSWORD))
        .json(&serde_json::json!({ "role": "admin" }))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), 200);
    let updated: serde_json::Value = response.json().await.unwrap();
    assert_eq!(updated["role"], "admin");

    let stored = app.store.find_by_id(&app.customer.id).await.unwrap();
    assert_eq!(stored.role, Role::Admin);
}

#[tokio::test]
async fn test_role_update_requires_a_role_field() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .put(format!("{}/api/users/{}", app.address, app.customer.id))
        .header("Accept", "application/json")
        .basic_auth(ADMIN_EMAIL, Some(ADMIN_PASSWORD))
        .json(&serde_json::json!({}))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing role");
}

#[tokio::test]
async fn test_role_update_rejects_unknown_role() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .put(format!("{}/api/users/{}", app.address, app.customer.id))
        .header("Accept", "application/json")
        .basic_auth(ADMIN_EMAIL, Some(ADMIN_PASSWORD))
        .json(&serde_json::json!({ "role": "superuser" }))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Role is not correct");
}

#[tokio::test]
async fn test_admin_cannot_update_own_record() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .put(format!("{}/api/users/{}", app.address, app.admin.id))
        .header("Accept", "application/json")
        .basic_auth(ADMIN_EMAIL, Some(ADMIN_PASSWORD))
        .json(&serde_json::json!({ "role": "customer" }))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Updating own data is not allowed");

    // The record stays untouched.
    let stored = app.store.find_by_id(&app.admin.id).await.unwrap();
    assert_eq!(stored.role, Role::Admin);
}

#[tokio::test]
async fn test_admin_cannot_delete_own_record() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .delete(format!("{}/api/users/{}", app.address, app.admin.id))
        .header("Accept", "application/json")
        .basic_auth(ADMIN_EMAIL, Some(ADMIN_PASSWORD))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Deleting own data is not allowed");
    assert!(app.store.find_by_id(&app.admin.id).await.is_some());
}

#[tokio::test]
async fn test_admin_deletes_customer_and_gets_the_document_back() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .delete(format!("{}/api/users/{}", app.address, app.customer.id))
        .header("Accept", "application/json")
        .basic_auth(ADMIN_EMAIL, Some(ADMIN_PASSWORD))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), 200);
    let deleted: serde_json::Value = response.json().await.unwrap();
    assert_eq!(deleted["_id"], app.customer.id.as_str());

    // A second lookup of the same user now misses.
    let response = client
        .get(format!("{}/api/users/{}", app.address, app.customer.id))
        .header("Accept", "application/json")
        .basic_auth(ADMIN_EMAIL, Some(ADMIN_PASSWORD))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), 404);
}
