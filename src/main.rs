use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use webshop_api::{
    AppState, MemoryStore, OrderStoreState, ProductStoreState, PublicDir, StaticFileState,
    UserStoreState, create_router,
    config::{AppConfig, Env},
    models::{Role, User},
};

/// main
///
/// The asynchronous entry point for the application, responsible for initializing
/// all core components: Configuration, Logging, Stores, and the HTTP Server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    // Loads .env file settings before configuration can be read.
    dotenv::dotenv().ok();
    // AppConfig::load() implements the fail-fast principle for missing Production settings.
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // Sets the default log level. It prioritizes the RUST_LOG environment variable,
    // falling back to sensible defaults for local development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "webshop_api=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment (Production Observability)
    // The structured logging format is dynamically selected based on the APP_ENV.
    match config.env {
        Env::Local => {
            // LOCAL: Pretty print output for human readability during local debugging.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON format output for ingestion by centralized log aggregators.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Store Initialization (In-Memory)
    // A single MemoryStore instance backs all three collection traits.
    let store = Arc::new(MemoryStore::new());

    // LOCAL-ONLY: Seed demo accounts so the API is explorable out of the box.
    // This is a development convenience; production environments start empty.
    if config.env == Env::Local {
        seed_demo_accounts(&store).await;
    }

    let users = store.clone() as UserStoreState;
    let products = store.clone() as ProductStoreState;
    let orders = store as OrderStoreState;

    // 5. Static File Service Initialization
    // Serves the storefront frontend from the configured public directory.
    let files = Arc::new(PublicDir::new(&config.public_dir)) as StaticFileState;

    // 6. Unified State Assembly
    // Bundles all initialized dependencies into the shared AppState.
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        users,
        products,
        orders,
        files,
        config,
    };

    // 7. Router and Server Startup
    let app = create_router(app_state);

    // Binds the TCP listener and initiates the HTTP server.
    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the configured address. Check BIND_ADDR.");

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on {bind_addr}");

    // The long-running Axum server process.
    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}

/// seed_demo_accounts
///
/// Inserts a known admin and customer account when the user collection is empty,
/// so local development never starts from an unusable, admin-less state.
async fn seed_demo_accounts(store: &Arc<MemoryStore>) {
    use webshop_api::store::UserStore;

    if !store.all_users().await.is_empty() {
        return;
    }

    let admin = User::new(
        "Demo Admin",
        "admin@webshop.local",
        "admin-password-123",
        Role::Admin,
    );
    let customer = User::new(
        "Demo Customer",
        "customer@webshop.local",
        "customer-password-123",
        Role::Customer,
    );

    let admin = store.create_user(admin).await;
    let customer = store.create_user(customer).await;

    tracing::info!(
        "Seeded demo accounts: {} (admin), {} (customer)",
        admin.email,
        customer.email
    );
}
