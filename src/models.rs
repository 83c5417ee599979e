use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::LazyLock;
use uuid::Uuid;

/// Email shape accepted at registration: something@something.tld, no whitespace.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

// Registration rejects passwords shorter than this.
pub const MIN_PASSWORD_LENGTH: usize = 10;

/// Role
///
/// The closed role enumeration used for all authorization decisions. Serialized in wire
/// format as lowercase strings ("admin" / "customer"). Free-form role strings coming in
/// over the API are converted at the boundary via [`Role::parse`]; an unknown value is a
/// validation failure, never a silent pass-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    // New registrations always start as customers.
    #[default]
    Customer,
}

impl Role {
    /// Parses a role string from a request body. Returns None for anything other than
    /// the two known roles.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "admin" => Some(Role::Admin),
            "customer" => Some(Role::Customer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "customer",
        }
    }
}

// --- Document Types (JSON wire format of the document store) ---

/// User
///
/// A user document. The stored password is a salted digest and is never serialized
/// into responses; the `_id` field carries the store-generated identifier.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct User {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub name: String,
    pub email: String,
    // Salted digest in "salt$base64" form. Excluded from all JSON output.
    #[serde(skip_serializing, default)]
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Builds a new user document with a freshly salted password digest.
    /// The id is left empty; the store assigns one on insert.
    pub fn new(name: &str, email: &str, password: &str, role: Role) -> Self {
        Self {
            id: String::new(),
            name: name.to_string(),
            email: email.to_string(),
            password: hash_password(password),
            role,
            created_at: Utc::now(),
        }
    }

    /// Compare a supplied password with the user's own (hashed) password.
    ///
    /// This is the opaque verification capability consumed by the authenticator;
    /// callers never see the digest format.
    pub fn check_password(&self, password: &str) -> bool {
        match self.password.split_once('$') {
            Some((salt, digest)) => digest_with_salt(salt, password) == digest,
            None => false,
        }
    }
}

/// Salted SHA-256 digest in "salt$base64(digest)" form.
fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = digest_with_salt(&salt, password);
    format!("{salt}${digest}")
}

fn digest_with_salt(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// Product
///
/// A product document as listed in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Product {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Order
///
/// An order document. `customerId` is the owning customer's user id; items carry a
/// full product snapshot so later catalog edits do not rewrite order history.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Order {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "customerId")]
    pub customer_id: String,
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrderItem {
    pub product: ProductSnapshot,
    pub quantity: u32,
}

/// The subset of product fields frozen into an order at purchase time.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProductSnapshot {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for the public registration endpoint (POST /api/register).
/// All fields are optional at the serde level so that validation can report the
/// precise missing field instead of a generic deserialization error.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    // Accepted for shape validation only; every new account is created as a customer.
    pub role: Option<String>,
}

impl RegisterRequest {
    /// Validate the registration payload.
    ///
    /// Returns the accumulated error messages, empty when the payload is valid:
    /// missing name/email/password, malformed email, too-short password, unknown role.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.as_deref().is_none_or(str::is_empty) {
            errors.push("Missing name".to_string());
        }
        match self.email.as_deref() {
            None | Some("") => errors.push("Missing email".to_string()),
            Some(email) if !EMAIL_RE.is_match(email) => {
                errors.push("Invalid email".to_string());
            }
            Some(_) => {}
        }
        match self.password.as_deref() {
            None | Some("") => errors.push("Missing password".to_string()),
            Some(p) if p.len() < MIN_PASSWORD_LENGTH => {
                errors.push("Too short password".to_string());
            }
            Some(_) => {}
        }
        if let Some(role) = self.role.as_deref() {
            if Role::parse(role).is_none() {
                errors.push("Unknown role".to_string());
            }
        }

        errors
    }
}

/// RoleUpdate
///
/// Input payload for PUT /api/users/{id}. The only mutable user field is the role.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RoleUpdate {
    pub role: Option<String>,
}

/// ProductPayload
///
/// Input payload for creating or updating a product. `name` and `price` are required
/// (and must be non-empty / positive); `image` and `description` are optional extras.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProductPayload {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl ProductPayload {
    /// The required (name, price) pair, or None when either is missing, empty or
    /// non-positive.
    pub fn required_fields(&self) -> Option<(&str, f64)> {
        let name = self.name.as_deref().filter(|n| !n.is_empty())?;
        let price = self.price.filter(|p| *p > 0.0)?;
        Some((name, price))
    }
}

/// OrderPayload
///
/// Input payload for POST /api/orders. Item shape is validated field by field before
/// any role decision is made, so a defective cart is always a 400 regardless of who
/// sent it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrderPayload {
    #[serde(default)]
    pub items: Vec<OrderItemPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrderItemPayload {
    pub product: Option<SnapshotPayload>,
    pub quantity: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SnapshotPayload {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
}

impl OrderItemPayload {
    /// Converts the raw item into a validated order item. Requires a complete product
    /// snapshot (_id, name, price) and a positive quantity.
    pub fn into_order_item(self) -> Option<OrderItem> {
        let quantity = self.quantity.filter(|q| *q > 0)?;
        let snapshot = self.product?;
        let id = snapshot.id.filter(|i| !i.is_empty())?;
        let name = snapshot.name.filter(|n| !n.is_empty())?;
        let price = snapshot.price.filter(|p| *p > 0.0)?;
        Some(OrderItem {
            product: ProductSnapshot {
                id,
                name,
                price,
                description: snapshot.description,
            },
            quantity,
        })
    }
}
