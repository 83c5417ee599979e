use axum::{Router, extract::FromRef, http::HeaderName};

use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod models;
pub mod negotiation;
pub mod routing;
pub mod static_files;
pub mod store;

// --- Public Re-exports ---

// Makes core state types easily accessible to the application entry point and tests.
pub use config::AppConfig;
pub use static_files::{PublicDir, StaticFileState};
pub use store::{MemoryStore, OrderStoreState, ProductStoreState, UserStoreState};

/// AppState
///
/// Implements the **Unified State Pattern**. This is the single, thread-safe, and
/// immutable container holding all essential application services and configuration.
/// The state is shared across all in-flight requests; nothing in it is mutated per
/// request — the stores serialize their own writes internally.
#[derive(Clone)]
pub struct AppState {
    /// User store: account documents plus the password-verification capability.
    pub users: UserStoreState,
    /// Product store: the catalog.
    pub products: ProductStoreState,
    /// Order store: per-customer order history.
    pub orders: OrderStoreState,
    /// Static file collaborator serving everything outside the API prefix.
    pub files: StaticFileState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These implementations allow components to selectively pull collaborators from the
// shared AppState, keeping dependency boundaries explicit.

impl FromRef<AppState> for UserStoreState {
    fn from_ref(app_state: &AppState) -> UserStoreState {
        app_state.users.clone()
    }
}

impl FromRef<AppState> for ProductStoreState {
    fn from_ref(app_state: &AppState) -> ProductStoreState {
        app_state.products.clone()
    }
}

impl FromRef<AppState> for OrderStoreState {
    fn from_ref(app_state: &AppState) -> OrderStoreState {
        app_state.orders.clone()
    }
}

impl FromRef<AppState> for StaticFileState {
    fn from_ref(app_state: &AppState) -> StaticFileState {
        app_state.files.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the application, applies global middleware, and registers the state.
///
/// Routing is deliberately NOT expressed through axum's routing tree: every request
/// lands in the dispatch pipeline (`dispatch::handle_request`), which owns path
/// classification, the allowed-method table, OPTIONS/CORS answers, content
/// negotiation, authentication and role policy. Axum contributes connection
/// handling, body plumbing and the observability layers below.
pub fn create_router(state: AppState) -> Router {
    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    Router::new()
        .fallback(dispatch::handle_request)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                // Request ID Generation: a unique UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // Request Tracing: wraps the request/response lifecycle in a span
                // that carries the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // Request ID Propagation: return the x-request-id header to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
}

/// trace_span_logger
///
/// Helper function used by `TraceLayer` to customize the tracing span creation.
/// It extracts the `x-request-id` header (if present) and includes it in the
/// structured logging metadata alongside the HTTP method and URI, so every log
/// line for a single request is correlated by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
