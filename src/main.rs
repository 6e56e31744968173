//! Chat Core - session-gated chat portal backend
//!
//! Every protected request must carry a signed `auth` cookie holding a
//! session token issued by the identity service. Employee forms are checked
//! against a config-driven validation schema before they reach storage.

use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tokio::net::TcpListener;

mod api;
mod auth;
mod config;
mod domain;
mod error;
mod logging;
mod storage;
mod validation;

use crate::api::{build_router, PageContext};
use crate::auth::{CookieSigner, SessionAuth, SessionGate};
use crate::config::Config;
use crate::storage::EmployeeRepository;
use crate::validation::{PredicateRegistry, Schema};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database repository.
    pub repository: EmployeeRepository,
    /// Compiled employee form schema.
    pub employee_schema: Arc<Schema>,
    /// Values rendered into every page.
    pub page: Arc<PageContext>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: No .env file loaded ({e})");
    }

    // Initialize logging
    logging::init();

    tracing::info!("Starting Chat Core v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        database = %config.database.url,
        domain = %config.app.domain,
        secure_cookies = config.app.is_secure(),
        "Configuration loaded"
    );

    // Connect to database
    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to database");
            anyhow::anyhow!("Database connection error: {}", e)
        })?;

    // Initialize repository and schema
    let repository = EmployeeRepository::new(pool);
    repository.init_schema().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize database schema");
        anyhow::anyhow!("Schema initialization error: {}", e)
    })?;

    tracing::info!("Database connected and schema initialized");

    // Compile the employee form schema against the built-in predicates
    let employee_schema = Schema::compile(
        config.validation.employee.clone(),
        &PredicateRegistry::with_builtins(),
    )
    .map_err(|e| {
        tracing::error!(error = %e, "Invalid employee schema");
        anyhow::anyhow!("Schema error: {}", e)
    })?;

    tracing::info!(
        fields = employee_schema.fields().count(),
        "Employee schema compiled"
    );

    // Build the session gate
    let gate = SessionGate::new(
        &config.app.app_secret,
        &config.app.auth_service_url,
        &config.app.domain,
    );
    tracing::info!(login_url = %gate.login_url(), "Session gate ready");

    let session_auth = SessionAuth::new(gate, CookieSigner::new(&config.app.cookie_secret));

    // Build application state
    let state = AppState {
        repository,
        employee_schema: Arc::new(employee_schema),
        page: Arc::new(PageContext::from(&config.app)),
    };

    // Build router
    let app = build_router(state, session_auth);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(address = %addr, "Server listening");
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
