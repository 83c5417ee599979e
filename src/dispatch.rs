use crate::{
    AppState, auth,
    auth::Identity,
    error::ApiError,
    handlers,
    models::Role,
    negotiation::{accepts_json, is_json_body},
    routing,
};
use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

// Request bodies are collected once, bounded; anything larger is refused before
// parsing starts.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// AccessDecision
///
/// The dispatcher's terminal classification of a request before any domain logic
/// runs. Exactly one decision is computed per request, by running the gate stages
/// in the fixed order each resource documents; the first non-Allow stage wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Unauthenticated,
    Forbidden,
    MethodNotAllowed,
    NotAcceptable,
    NotFound,
}

impl AccessDecision {
    /// Converts a refusing decision into its API error; `Allow` passes through.
    pub fn refusal(self) -> Result<(), ApiError> {
        match self {
            AccessDecision::Allow => Ok(()),
            AccessDecision::Unauthenticated => Err(ApiError::Unauthenticated),
            AccessDecision::Forbidden => Err(ApiError::Forbidden),
            AccessDecision::MethodNotAllowed => Err(ApiError::MethodNotAllowed),
            AccessDecision::NotAcceptable => Err(ApiError::NotAcceptable),
            AccessDecision::NotFound => Err(ApiError::not_found()),
        }
    }
}

/// handle_request
///
/// The top of the dispatch pipeline, mounted as the router's only handler. Stages
/// run in a fixed order that is itself part of the API contract:
///
/// 1. GET outside `/api` falls through to the static file service.
/// 2. Unknown canonical path → 404.
/// 3. OPTIONS → 204 with CORS headers, bypassing negotiation and authentication.
/// 4. Method outside the route's allowed set → 405 (before any authentication, so
///    anonymous callers still get 405 rather than 401).
/// 5. Per-resource gates (negotiation/authentication/authorization in the order
///    each resource defines), then the domain handler.
pub async fn handle_request(State(state): State<AppState>, request: Request) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if method == Method::GET && !path.starts_with(routing::API_PREFIX) {
        return serve_static(&state, &path).await;
    }

    tracing::debug!(%method, %path, "dispatching api request");

    let target = routing::classify(&path);

    let Some(route) = routing::lookup(&target.canonical_path) else {
        return ApiError::not_found().into_response();
    };

    if method == Method::OPTIONS {
        // The preflight answer is looked up under the unstripped path: an
        // id-suffixed path is not itself a table entry and stays 404.
        return send_options(&path);
    }

    if !route.methods.contains(&method) {
        return ApiError::MethodNotAllowed.into_response();
    }

    let (parts, body) = request.into_parts();
    let result = match target.canonical_path.as_str() {
        "/api/register" => register_route(&state, &parts.headers, body).await,
        "/api/users" => {
            users_route(&state, &parts.headers, &method, target.trailing_id, body).await
        }
        "/api/products" => {
            products_route(&state, &parts.headers, &method, target.trailing_id, body).await
        }
        "/api/orders" => {
            orders_route(&state, &parts.headers, &method, target.trailing_id, body).await
        }
        _ => Err(ApiError::not_found()),
    };

    result.unwrap_or_else(IntoResponse::into_response)
}

/// Send the response to a client OPTIONS request: 204 with the route's allowed
/// methods, for any path that is itself a table entry.
fn send_options(path: &str) -> Response {
    match routing::lookup(path) {
        Some(route) => (
            StatusCode::NO_CONTENT,
            [
                ("access-control-allow-methods", route.allow),
                ("access-control-allow-headers", "Content-Type,Accept"),
                ("access-control-max-age", "86400"),
                ("access-control-expose-headers", "Content-Type,Accept"),
            ],
        )
            .into_response(),
        None => ApiError::not_found().into_response(),
    }
}

/// Hands a non-API GET to the static file collaborator.
async fn serve_static(state: &AppState, path: &str) -> Response {
    match state.files.serve(path).await {
        Some((content_type, bytes)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type)],
            bytes,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

/// Collects the request body (bounded) and parses it as JSON. Transport failures
/// and over-limit bodies surface the collaborator message; parse failures are a
/// plain bad request. This is the single suspend point for body handling.
async fn read_json<T: DeserializeOwned>(body: Body) -> Result<T, ApiError> {
    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ApiError::Store(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::BadRequest(e.to_string()))
}

// --- Per-resource gate stages ---
//
// Each gate is the linear decision sequence for one resource shape. The order of
// checks inside a gate is a correctness contract: /api/users negotiates before
// authenticating (so a bad Accept header is 406 even anonymously), while
// /api/users/{id} authenticates first (so a bad Accept header is 401 anonymously).

/// users (collection): negotiation → authentication → admin role.
fn users_collection_gate(headers: &HeaderMap, identity: Option<&Identity>) -> AccessDecision {
    if !accepts_json(headers) {
        return AccessDecision::NotAcceptable;
    }
    let Some(caller) = identity else {
        return AccessDecision::Unauthenticated;
    };
    if caller.role != Role::Admin {
        return AccessDecision::Forbidden;
    }
    AccessDecision::Allow
}

/// users/{id}: authentication → admin role → negotiation.
fn users_item_gate(headers: &HeaderMap, identity: Option<&Identity>) -> AccessDecision {
    let Some(caller) = identity else {
        return AccessDecision::Unauthenticated;
    };
    if caller.role != Role::Admin {
        return AccessDecision::Forbidden;
    }
    if !accepts_json(headers) {
        return AccessDecision::NotAcceptable;
    }
    AccessDecision::Allow
}

/// products (all methods) and orders: negotiation → authentication. Both roles may
/// pass; per-method role restrictions come afterwards.
fn negotiated_access_gate(headers: &HeaderMap, identity: Option<&Identity>) -> AccessDecision {
    if !accepts_json(headers) {
        return AccessDecision::NotAcceptable;
    }
    if identity.is_none() {
        return AccessDecision::Unauthenticated;
    }
    AccessDecision::Allow
}

/// products PUT pre-gate: authentication → negotiation → admin role. Runs in
/// addition to (and before) the shared gate, reproducing the double Accept check
/// this route carries.
fn products_put_gate(headers: &HeaderMap, identity: Option<&Identity>) -> AccessDecision {
    let Some(caller) = identity else {
        return AccessDecision::Unauthenticated;
    };
    if !accepts_json(headers) {
        return AccessDecision::NotAcceptable;
    }
    if caller.role != Role::Admin {
        return AccessDecision::Forbidden;
    }
    AccessDecision::Allow
}

// --- Per-resource branches ---

/// register: negotiation, then a JSON content-type requirement (400, not 415), no
/// authentication at all.
async fn register_route(
    state: &AppState,
    headers: &HeaderMap,
    body: Body,
) -> Result<Response, ApiError> {
    if !accepts_json(headers) {
        return Err(ApiError::NotAcceptable);
    }
    // The route table admits POST only, so no method branching is needed here.
    if !is_json_body(headers) {
        return Err(ApiError::BadRequest(
            "Invalid Content-Type. Expected application/json".to_string(),
        ));
    }

    let payload = read_json(body).await?;
    handlers::register_user(state, payload).await
}

async fn users_route(
    state: &AppState,
    headers: &HeaderMap,
    method: &Method,
    trailing_id: Option<String>,
    body: Body,
) -> Result<Response, ApiError> {
    if let Some(id) = trailing_id {
        return users_item_route(state, headers, method, &id, body).await;
    }

    let identity = auth::resolve_identity(headers, &state.users).await;
    users_collection_gate(headers, identity.as_ref()).refusal()?;

    if *method == Method::GET {
        handlers::list_users(state).await
    } else {
        // PUT and DELETE address a single user and need an id segment.
        Err(ApiError::MethodNotAllowed)
    }
}

async fn users_item_route(
    state: &AppState,
    headers: &HeaderMap,
    method: &Method,
    id: &str,
    body: Body,
) -> Result<Response, ApiError> {
    let identity = auth::resolve_identity(headers, &state.users).await;
    users_item_gate(headers, identity.as_ref()).refusal()?;
    let Some(caller) = identity else {
        return Err(ApiError::Unauthenticated);
    };

    let Some(target) = state.users.find_by_id(id).await else {
        return Err(ApiError::not_found());
    };

    if *method == Method::GET {
        handlers::view_user(target)
    } else if *method == Method::PUT {
        let payload = read_json(body).await?;
        handlers::update_user(state, target, &caller, payload).await
    } else {
        handlers::delete_user(state, target, &caller).await
    }
}

async fn products_route(
    state: &AppState,
    headers: &HeaderMap,
    method: &Method,
    trailing_id: Option<String>,
    body: Body,
) -> Result<Response, ApiError> {
    let identity = auth::resolve_identity(headers, &state.users).await;

    // PUT carries its own gate sequence; control then continues through the shared
    // gate below, so both Accept checks must hold before the update executes.
    if *method == Method::PUT {
        products_put_gate(headers, identity.as_ref()).refusal()?;
    }

    negotiated_access_gate(headers, identity.as_ref()).refusal()?;
    let Some(caller) = identity else {
        return Err(ApiError::Unauthenticated);
    };

    if *method == Method::GET {
        match trailing_id {
            Some(id) => handlers::view_product(state, &id).await,
            None => handlers::list_products(state).await,
        }
    } else if *method == Method::POST {
        if caller.role != Role::Admin {
            return Err(ApiError::Forbidden);
        }
        let payload = read_json(body).await?;
        handlers::add_product(state, payload).await
    } else if *method == Method::PUT {
        let payload = read_json(body).await?;
        handlers::update_product(state, trailing_id, payload).await
    } else {
        if caller.role != Role::Admin {
            return Err(ApiError::Forbidden);
        }
        handlers::delete_product(state, trailing_id).await
    }
}

async fn orders_route(
    state: &AppState,
    headers: &HeaderMap,
    method: &Method,
    trailing_id: Option<String>,
    body: Body,
) -> Result<Response, ApiError> {
    let identity = auth::resolve_identity(headers, &state.users).await;
    negotiated_access_gate(headers, identity.as_ref()).refusal()?;
    let Some(caller) = identity else {
        return Err(ApiError::Unauthenticated);
    };

    if *method == Method::GET {
        match trailing_id {
            Some(id) => handlers::view_order(state, &caller, &id).await,
            None => handlers::list_orders(state, &caller).await,
        }
    } else {
        let payload = read_json(body).await?;
        handlers::create_order(state, &caller, payload).await
    }
}
