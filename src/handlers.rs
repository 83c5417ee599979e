use crate::{
    AppState,
    auth::Identity,
    error::ApiError,
    models::{Order, OrderPayload, Product, ProductPayload, RegisterRequest, Role, RoleUpdate, User},
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;

// --- Users ---

/// register_user
///
/// [Public Route] Creates a new account from a validated registration payload.
///
/// *Validation*: field errors are accumulated and joined into a single 400 message.
/// A duplicate email is a 400 as well. Whatever role the client asked for, the
/// created account is always a customer; the response never echoes the password.
pub async fn register_user(state: &AppState, payload: RegisterRequest) -> Result<Response, ApiError> {
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::BadRequest(errors.join(", ")));
    }

    let (Some(name), Some(email), Some(password)) = (
        payload.name.as_deref(),
        payload.email.as_deref(),
        payload.password.as_deref(),
    ) else {
        return Err(ApiError::BadRequest("Missing name, email or password".to_string()));
    };

    if state.users.find_by_email(email).await.is_some() {
        return Err(ApiError::BadRequest("Email is already in use".to_string()));
    }

    let user = state
        .users
        .create_user(User::new(name, email, password, Role::Customer))
        .await;

    Ok((StatusCode::CREATED, Json(user)).into_response())
}

/// list_users
///
/// [Admin Route] Sends all user documents. The dispatcher has already enforced the
/// admin role before this runs.
pub async fn list_users(state: &AppState) -> Result<Response, ApiError> {
    let users = state.users.all_users().await;
    Ok(Json(users).into_response())
}

/// view_user
///
/// [Admin Route] Sends a single user document resolved by the dispatcher.
pub fn view_user(target: User) -> Result<Response, ApiError> {
    Ok(Json(target).into_response())
}

/// update_user
///
/// [Admin Route] Changes a user's role, the only mutable user field.
///
/// *Refusals*: updating one's own record is a 400 regardless of payload; a missing
/// role field and an unparseable role value are 400s with distinct messages.
pub async fn update_user(
    state: &AppState,
    target: User,
    caller: &Identity,
    payload: RoleUpdate,
) -> Result<Response, ApiError> {
    if caller.user_id == target.id {
        return Err(ApiError::BadRequest("Updating own data is not allowed".to_string()));
    }

    let Some(role_str) = payload.role.as_deref().filter(|r| !r.is_empty()) else {
        return Err(ApiError::BadRequest("Missing role".to_string()));
    };
    let Some(role) = Role::parse(role_str) else {
        return Err(ApiError::BadRequest("Role is not correct".to_string()));
    };

    match state.users.update_role(&target.id, role).await {
        Some(updated) => Ok(Json(updated).into_response()),
        None => Err(ApiError::not_found()),
    }
}

/// delete_user
///
/// [Admin Route] Deletes a user and sends the deleted document back.
///
/// *Refusal*: self-deletion is a 400; the record stays untouched.
pub async fn delete_user(
    state: &AppState,
    target: User,
    caller: &Identity,
) -> Result<Response, ApiError> {
    if caller.user_id == target.id {
        return Err(ApiError::BadRequest("Deleting own data is not allowed".to_string()));
    }

    match state.users.delete_user(&target.id).await {
        Some(deleted) => Ok(Json(deleted).into_response()),
        None => Err(ApiError::not_found()),
    }
}

// --- Products ---

/// list_products
///
/// [Authenticated Route] Sends the whole catalog. Readable by both roles.
pub async fn list_products(state: &AppState) -> Result<Response, ApiError> {
    let products = state.products.all_products().await;
    Ok(Json(products).into_response())
}

/// view_product
///
/// [Authenticated Route] Sends a single product, 404 when the id is unknown.
pub async fn view_product(state: &AppState, id: &str) -> Result<Response, ApiError> {
    match state.products.find_product(id).await {
        Some(product) => Ok(Json(product).into_response()),
        None => Err(ApiError::NotFound("Product not found".to_string())),
    }
}

/// add_product
///
/// [Admin Route] Creates a catalog entry. Name and price are mandatory.
pub async fn add_product(state: &AppState, payload: ProductPayload) -> Result<Response, ApiError> {
    let Some((name, price)) = payload.required_fields() else {
        return Err(ApiError::BadRequest("No name or price given!".to_string()));
    };

    let product = state
        .products
        .create_product(Product {
            id: String::new(),
            name: name.to_string(),
            price,
            image: payload.image.clone(),
            description: payload.description.clone(),
        })
        .await;

    Ok((StatusCode::CREATED, Json(product)).into_response())
}

/// update_product
///
/// [Admin Route] Rewrites name and price, merging in description/image when given.
/// A missing id segment cannot address anything and is a 400.
pub async fn update_product(
    state: &AppState,
    id: Option<String>,
    payload: ProductPayload,
) -> Result<Response, ApiError> {
    let Some(id) = id else {
        return Err(ApiError::BadRequest("Missing product id".to_string()));
    };

    if payload.required_fields().is_none() {
        return Err(ApiError::BadRequest("No required name or price".to_string()));
    }

    match state.products.update_product(&id, payload).await {
        Some(product) => Ok(Json(product).into_response()),
        None => Err(ApiError::not_found()),
    }
}

/// delete_product
///
/// [Admin Route] Deletes a product and sends the removed document back.
pub async fn delete_product(state: &AppState, id: Option<String>) -> Result<Response, ApiError> {
    let Some(id) = id else {
        return Err(ApiError::NotFound("Product not found".to_string()));
    };

    match state.products.delete_product(&id).await {
        Some(product) => Ok(Json(product).into_response()),
        None => Err(ApiError::NotFound("Product not found".to_string())),
    }
}

// --- Orders ---

/// list_orders
///
/// [Authenticated Route] Admins see every order; customers see only their own.
pub async fn list_orders(state: &AppState, caller: &Identity) -> Result<Response, ApiError> {
    let orders = match caller.role {
        Role::Admin => state.orders.all_orders().await,
        Role::Customer => state.orders.orders_for_customer(&caller.user_id).await,
    };
    Ok(Json(orders).into_response())
}

/// view_order
///
/// [Authenticated Route] Single-order view. For customers the lookup is scoped to
/// their own orders, so a foreign order reads as 404 — ownership is hidden as
/// absence, never leaked as 403.
pub async fn view_order(state: &AppState, caller: &Identity, id: &str) -> Result<Response, ApiError> {
    let order = match caller.role {
        Role::Admin => state.orders.find_order(id).await,
        Role::Customer => state.orders.find_order_for_customer(id, &caller.user_id).await,
    };

    match order {
        Some(order) => Ok(Json(order).into_response()),
        None => Err(ApiError::NotFound("Order not found".to_string())),
    }
}

/// create_order
///
/// [Customer Route] Persists a new order from validated cart items.
///
/// *Ordering*: item-shape validation runs to completion before the role decision,
/// so an admin submitting a defective cart gets 400, and 403 only with a valid one.
pub async fn create_order(
    state: &AppState,
    caller: &Identity,
    payload: OrderPayload,
) -> Result<Response, ApiError> {
    if payload.items.is_empty() {
        return Err(ApiError::BadRequest("Missing items".to_string()));
    }

    let mut items = Vec::with_capacity(payload.items.len());
    for item in payload.items {
        match item.into_order_item() {
            Some(item) => items.push(item),
            None => {
                return Err(ApiError::BadRequest("Missing required fields in item".to_string()));
            }
        }
    }

    if caller.role != Role::Customer {
        return Err(ApiError::Forbidden);
    }

    let order = state
        .orders
        .create_order(Order {
            id: String::new(),
            customer_id: caller.user_id.clone(),
            items,
            created_at: Utc::now(),
        })
        .await;

    Ok((StatusCode::CREATED, Json(order)).into_response())
}
