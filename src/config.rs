use std::env;

/// AppConfig
///
/// Holds the application's entire configuration state. This struct is designed to be
/// immutable once loaded, ensuring consistency across all threads and services
/// (Dispatcher, stores, static file service). It is pulled into the application state
/// via FromRef, embodying the "immutable AppConfig" part of the Unified State Pattern.
#[derive(Clone)]
pub struct AppConfig {
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Directory the static file service reads from (GET requests outside /api).
    pub public_dir: String,
    // Runtime environment marker. Controls logging format and demo seeding.
    pub env: Env,
}

/// Env
///
/// Defines the runtime context, used to switch between development conveniences
/// (pretty logs, seeded demo accounts) and production behavior (JSON logs, no seeding).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Provides a safe, non-panicking AppConfig instance primarily used for test setup.
    /// This allows us to instantiate the configuration without needing to set environment
    /// variables for lightweight unit or integration testing state scaffolding.
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            public_dir: "public".to_string(),
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// The canonical function for initializing the application configuration at startup.
    /// It reads all parameters from environment variables and implements the **fail-fast**
    /// principle.
    ///
    /// # Panics
    /// Panics if a critical environment variable required for the current runtime
    /// environment (Production) is not found. This prevents the application from starting
    /// with an incomplete configuration.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        match env {
            Env::Local => Self {
                env: Env::Local,
                bind_addr,
                // Local development serves the checked-in storefront by default.
                public_dir: env::var("PUBLIC_DIR").unwrap_or_else(|_| "public".to_string()),
            },
            Env::Production => Self {
                env: Env::Production,
                bind_addr,
                // Production deployments must state where the static assets live.
                public_dir: env::var("PUBLIC_DIR")
                    .expect("FATAL: PUBLIC_DIR must be set in production."),
            },
        }
    }
}
