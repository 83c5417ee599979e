use crate::models::{Order, Product, ProductPayload, Role, User};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

// Store-generated ids are 24 lowercase hex characters, the shape the path matcher
// recognizes as a trailing identifier segment.
const ID_LENGTH: usize = 24;

fn generate_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(ID_LENGTH);
    id
}

/// UserStore
///
/// Abstract contract for user persistence. This is the boundary the dispatcher and
/// handlers program against; swapping the concrete implementation (in-memory here,
/// a real document database elsewhere) never touches the calling code.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn UserStore>`) safely shareable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact-match lookup by email, used by the authenticator.
    async fn find_by_email(&self, email: &str) -> Option<User>;
    async fn find_by_id(&self, id: &str) -> Option<User>;
    async fn all_users(&self) -> Vec<User>;
    /// Inserts the document and assigns a fresh store-generated id.
    async fn create_user(&self, user: User) -> User;
    /// Replaces the user's role. Returns the updated document, or None if the id is
    /// unknown.
    async fn update_role(&self, id: &str, role: Role) -> Option<User>;
    /// Removes the user and returns the deleted document, or None if the id is unknown.
    async fn delete_user(&self, id: &str) -> Option<User>;
}

/// ProductStore
///
/// Abstract contract for catalog persistence.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn all_products(&self) -> Vec<Product>;
    async fn find_product(&self, id: &str) -> Option<Product>;
    async fn create_product(&self, product: Product) -> Product;
    /// Applies a validated payload: name and price are always replaced, image and
    /// description only when supplied. Returns None if the id is unknown.
    async fn update_product(&self, id: &str, payload: ProductPayload) -> Option<Product>;
    async fn delete_product(&self, id: &str) -> Option<Product>;
}

/// OrderStore
///
/// Abstract contract for order persistence. Customer-scoped reads are a store
/// concern so that ownership filtering cannot be forgotten at a call site.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn all_orders(&self) -> Vec<Order>;
    async fn orders_for_customer(&self, customer_id: &str) -> Vec<Order>;
    async fn find_order(&self, id: &str) -> Option<Order>;
    /// Scoped lookup: the order must exist AND belong to the given customer.
    /// A foreign order is indistinguishable from a missing one.
    async fn find_order_for_customer(&self, id: &str, customer_id: &str) -> Option<Order>;
    async fn create_order(&self, order: Order) -> Order;
}

// Shared trait-object aliases for the application state.
pub type UserStoreState = Arc<dyn UserStore>;
pub type ProductStoreState = Arc<dyn ProductStore>;
pub type OrderStoreState = Arc<dyn OrderStore>;

/// MemoryStore
///
/// The in-memory document store backing all three store contracts. Concurrent
/// requests share it behind `Arc`; each map serializes its own writes through an
/// async RwLock, which is the only synchronization in the system (the dispatcher
/// itself holds no locks).
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    products: RwLock<HashMap<String, Product>>,
    orders: RwLock<HashMap<String, Order>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Option<User> {
        let users = self.users.read().await;
        users.values().find(|u| u.email == email).cloned()
    }

    async fn find_by_id(&self, id: &str) -> Option<User> {
        self.users.read().await.get(id).cloned()
    }

    async fn all_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        users
    }

    async fn create_user(&self, mut user: User) -> User {
        user.id = generate_id();
        self.users
            .write()
            .await
            .insert(user.id.clone(), user.clone());
        user
    }

    async fn update_role(&self, id: &str, role: Role) -> Option<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(id)?;
        user.role = role;
        Some(user.clone())
    }

    async fn delete_user(&self, id: &str) -> Option<User> {
        self.users.write().await.remove(id)
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn all_products(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self.products.read().await.values().cloned().collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        products
    }

    async fn find_product(&self, id: &str) -> Option<Product> {
        self.products.read().await.get(id).cloned()
    }

    async fn create_product(&self, mut product: Product) -> Product {
        product.id = generate_id();
        self.products
            .write()
            .await
            .insert(product.id.clone(), product.clone());
        product
    }

    async fn update_product(&self, id: &str, payload: ProductPayload) -> Option<Product> {
        let mut products = self.products.write().await;
        let product = products.get_mut(id)?;
        if let Some(name) = payload.name {
            product.name = name;
        }
        if let Some(price) = payload.price {
            product.price = price;
        }
        if payload.description.is_some() {
            product.description = payload.description;
        }
        if payload.image.is_some() {
            product.image = payload.image;
        }
        Some(product.clone())
    }

    async fn delete_product(&self, id: &str) -> Option<Product> {
        self.products.write().await.remove(id)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn all_orders(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self.orders.read().await.values().cloned().collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        orders
    }

    async fn orders_for_customer(&self, customer_id: &str) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        orders
    }

    async fn find_order(&self, id: &str) -> Option<Order> {
        self.orders.read().await.get(id).cloned()
    }

    async fn find_order_for_customer(&self, id: &str, customer_id: &str) -> Option<Order> {
        self.orders
            .read()
            .await
            .get(id)
            .filter(|o| o.customer_id == customer_id)
            .cloned()
    }

    async fn create_order(&self, mut order: Order) -> Order {
        order.id = generate_id();
        self.orders
            .write()
            .await
            .insert(order.id.clone(), order.clone());
        order
    }
}
