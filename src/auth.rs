use crate::models::Role;
use crate::store::UserStoreState;
use axum::http::{HeaderMap, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Credentials
///
/// Username/password pair pulled out of an `Authorization: Basic` header.
/// The username is the account email in this API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Identity
///
/// The resolved caller for the current request. Produced per request by
/// [`resolve_identity`] and owned exclusively by the request-handling call chain;
/// an identity only exists once the supplied password has verified against the
/// stored digest. Anonymous callers are represented as `None`.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

/// Decode, parse and return user credentials from the Authorization header.
///
/// Returns None when the header is absent, does not carry the literal `Basic `
/// scheme token (case-sensitive), is not valid Base64, or does not decode to UTF-8.
/// The payload splits on the *first* `:`; everything after it is the password, so
/// passwords may themselves contain colons. A payload with no `:` yields an empty
/// password.
pub fn extract_credentials(headers: &HeaderMap) -> Option<Credentials> {
    let header_value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let payload = header_value.strip_prefix("Basic ")?;

    let decoded = STANDARD.decode(payload).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;

    let (username, password) = decoded.split_once(':').unwrap_or((decoded.as_str(), ""));

    Some(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Resolve the current request to a verified identity, or None for anonymous.
///
/// Extraction failure, an unknown email, and a password mismatch all resolve to
/// anonymous; the caller cannot distinguish which check failed. This function has
/// no side effects and never reads the request body, so the dispatcher is free to
/// call it at whichever pipeline stage the resource demands.
pub async fn resolve_identity(headers: &HeaderMap, users: &UserStoreState) -> Option<Identity> {
    let credentials = extract_credentials(headers)?;

    let user = users.find_by_email(&credentials.username).await?;
    if !user.check_password(&credentials.password) {
        return None;
    }

    Some(Identity {
        user_id: user.id,
        email: user.email,
        role: user.role,
    })
}
