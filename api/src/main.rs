//! PalPay API Server
//!
//! Tracks shared expenses between users and works out who owes whom.
//! Uses hexagonal (ports & adapters) architecture: the HTTP layer and the
//! services only see the ledger ports, and the storage backend is chosen at
//! startup.

use std::sync::Arc;

use anyhow::Context;
use axum::{http::HeaderValue, routing::get, Json, Router};
use sea_orm::Database;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod config;
mod domain;
mod entity;
mod error;
mod handlers;

#[cfg(test)]
mod test_utils;


use adapters::{ensure_schema, InMemoryLedgerStore, PostgresLedgerStore};
use app::{BalanceService, LedgerService};
use config::Config;
use domain::ports::LedgerStore;

/// Application state shared across all handlers
pub struct AppState<S: LedgerStore> {
    pub ledger_service: Arc<LedgerService<S>>,
    pub balance_service: Arc<BalanceService<S>>,
}

impl<S: LedgerStore> AppState<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            ledger_service: Arc::new(LedgerService::new(store.clone())),
            balance_service: Arc::new(BalanceService::new(store)),
        }
    }
}

// Manual impl: deriving would demand `S: Clone`
impl<S: LedgerStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            ledger_service: self.ledger_service.clone(),
            balance_service: self.balance_service.clone(),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// All API routes over the given backend. Collection routes answer with and
/// without the trailing slash.
pub fn build_router<S: LedgerStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        // Users
        .route(
            "/users",
            get(handlers::list_users::<S>).post(handlers::create_user::<S>),
        )
        .route(
            "/users/",
            get(handlers::list_users::<S>).post(handlers::create_user::<S>),
        )
        .route("/users/:id", get(handlers::get_user::<S>))
        // Activities
        .route(
            "/activities",
            get(handlers::list_activities::<S>).post(handlers::create_activity::<S>),
        )
        .route(
            "/activities/",
            get(handlers::list_activities::<S>).post(handlers::create_activity::<S>),
        )
        .route("/activities/:id", get(handlers::get_activity::<S>))
        // Expenses
        .route(
            "/expenses",
            get(handlers::list_expenses::<S>).post(handlers::create_expense::<S>),
        )
        .route(
            "/expenses/",
            get(handlers::list_expenses::<S>).post(handlers::create_expense::<S>),
        )
        .route("/expenses/:id", get(handlers::get_expense::<S>))
        // Payments
        .route(
            "/payments",
            get(handlers::list_payments::<S>).post(handlers::create_payment::<S>),
        )
        .route(
            "/payments/",
            get(handlers::list_payments::<S>).post(handlers::create_payment::<S>),
        )
        .route("/payments/:id", get(handlers::get_payment::<S>))
        // Derived views
        .route("/balances", get(handlers::get_balances::<S>))
        .route("/balances/", get(handlers::get_balances::<S>))
        .route("/balances/net", get(handlers::get_net_balances::<S>))
        .route(
            "/settlements/:activity_id",
            get(handlers::get_activity_settlements::<S>),
        )
        // Audit trail
        .route("/audit-logs", get(handlers::list_audit_logs::<S>))
        .route("/audit-logs/", get(handlers::list_audit_logs::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let origin = match &config.cors_allow_origin {
        Some(origin) => AllowOrigin::exact(
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid CORS_ALLOW_ORIGIN: {}", origin))?,
        ),
        None => AllowOrigin::from(Any),
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,palpay_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting PalPay API...");

    // Load configuration
    let config = Config::from_env();

    // Pick the storage backend
    let app = match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let db = Database::connect(url)
                .await
                .context("Failed to connect to database")?;
            ensure_schema(&db)
                .await
                .context("Failed to create database schema")?;
            tracing::info!("Database connected");

            build_router(AppState::new(Arc::new(PostgresLedgerStore::new(db))))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory ledger (lost on restart)");
            build_router(AppState::new(Arc::new(InMemoryLedgerStore::new())))
        }
    };
    let app = app.layer(cors_layer(&config)?);

    // Start server
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
