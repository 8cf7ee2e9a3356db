//! # gymctl: Gym Class Reservation Service
//!
//! `gymctl` manages a gym's class schedule and its bookings. It exposes a
//! RESTful API for managing user accounts, scheduling classes, and reserving
//! seats, with capacity-aware booking: members get a confirmed seat while one
//! is open and join a waitlist once the class is full. Cancelling a confirmed
//! seat promotes the longest-waiting member automatically, and cancelling a
//! whole class closes every open reservation for it.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses SQLite (via SQLx) for persistence, so a single
//! binary and a database file are a complete deployment.
//!
//! The **API layer** ([`api`]) exposes the management API at
//! `/admin/api/v1/*` with RESTful conventions for users, classes, and
//! reservations. Interactive documentation is served at `/admin/docs`.
//!
//! The **database layer** ([`db`]) uses the repository pattern to abstract
//! data access. Each table has a corresponding repository handling queries and
//! row mapping, and the capacity ledger keeps the per-class seat counter in
//! step with reservation state.
//!
//! The **booking core** ([`booking`]) owns every reservation state
//! transition. It serializes bookings per class with an in-process lock and
//! runs each operation in a single transaction, so two members can never be
//! confirmed into the same last seat.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use gymctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = gymctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     gymctl::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! The application opens (and creates, if missing) the configured SQLite file
//! and runs migrations automatically on startup:
//!
//! ```no_run
//! # use sqlx::SqlitePool;
//! # async fn example(pool: SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
//! gymctl::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod booking;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use crate::{
    api::models::users::Role,
    booking::ClassLocks,
    db::handlers::{Repository, Users},
    db::models::users::UserCreateDBRequest,
    openapi::ApiDoc,
};
use axum::{
    Router,
    routing::{get, patch, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

pub use types::{ClassId, ReservationId, UserId};

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `db`: SQLite connection pool for application data
/// - `config`: Application configuration loaded from file/environment
/// - `class_locks`: Per-class mutexes serializing booking operations
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    #[builder(default)]
    pub class_locks: ClassLocks,
}

/// Get the gymctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: when a user with this email already exists, nothing is written
/// and the existing ID is returned. Called during startup when the
/// `seed_admin` config section is present, so a fresh deployment always has an
/// account that can cancel classes.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(
    name: &str,
    email: &str,
    db: &SqlitePool,
) -> anyhow::Result<UserId> {
    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut tx);

    if let Some(existing) = user_repo.get_by_email(email).await? {
        tx.commit().await?;
        debug!(user_id = existing.id, "Admin user already exists");
        return Ok(existing.id);
    }

    let created = user_repo
        .create(&UserCreateDBRequest {
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            role: Role::Admin,
            membership_status: None,
        })
        .await?;

    tx.commit().await?;
    info!(user_id = created.id, "Created initial admin user");
    Ok(created.id)
}

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // User management
        .route("/users", post(api::handlers::users::create_user))
        .route("/users", get(api::handlers::users::list_users))
        .route("/users/{id}", get(api::handlers::users::get_user))
        .route("/users/{id}", patch(api::handlers::users::update_user))
        // Class catalogue
        .route("/classes", post(api::handlers::gym_classes::create_class))
        .route("/classes", get(api::handlers::gym_classes::list_classes))
        .route("/classes/{id}", get(api::handlers::gym_classes::get_class))
        .route("/classes/{id}", patch(api::handlers::gym_classes::update_class))
        .route("/classes/{id}/cancel", post(api::handlers::gym_classes::cancel_class))
        .route(
            "/classes/{id}/reservations",
            get(api::handlers::gym_classes::list_class_reservations),
        )
        // Reservations
        .route("/reservations", post(api::handlers::reservations::create_reservation))
        .route("/reservations", get(api::handlers::reservations::list_reservations))
        .route("/reservations/{id}", get(api::handlers::reservations::get_reservation))
        .route(
            "/reservations/{id}/cancel",
            post(api::handlers::reservations::cancel_reservation),
        )
        .with_state(state.clone());

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/admin/api/v1", api_routes)
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/admin/docs"));

    // Add Prometheus metrics if enabled
    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    // Add tracing layer
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] opens the database, runs migrations,
///    and seeds the admin user when configured
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts
///    handling requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests
///    drain and the pool closes
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create an application around an existing pool (used by tests).
    pub async fn new_with_pool(config: Config, pool: Option<SqlitePool>) -> anyhow::Result<Self> {
        debug!("Starting reservation service with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => pool,
            None => db::create_pool(&config).await?,
        };
        migrator().run(&pool).await?;

        if let Some(seed) = &config.seed_admin {
            create_initial_admin_user(&seed.name, &seed.email, &pool).await?;
        }

        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .class_locks(ClassLocks::new())
            .build();
        let router = build_router(state);

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Reservation service listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.server.port
        );

        // Run the server with graceful shutdown
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        // Close database connections
        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{create_test_app, create_test_config};

    #[sqlx::test]
    #[test_log::test]
    async fn test_healthz(pool: SqlitePool) {
        let server = create_test_app(pool).await;

        let response = server.get("/healthz").await;
        response.assert_status_ok();
        assert_eq!(response.text(), "OK");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_openapi_document_served(pool: SqlitePool) {
        let server = create_test_app(pool).await;

        let response = server.get("/api-docs/openapi.json").await;
        response.assert_status_ok();
        let doc: serde_json::Value = response.json();
        assert!(doc.get("openapi").is_some());
        assert!(doc["paths"].get("/reservations").is_some());

        let docs_page = server.get("/admin/docs").await;
        docs_page.assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_metrics_endpoint_when_enabled(pool: SqlitePool) {
        let mut config = create_test_config();
        config.enable_metrics = true;

        let app = Application::new_with_pool(config, Some(pool))
            .await
            .expect("Failed to create application");
        let server = app.into_test_server();

        server.get("/healthz").await.assert_status_ok();

        let response = server.get("/internal/metrics").await;
        response.assert_status_ok();
        assert!(response.text().contains("axum_http_requests"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_metrics_endpoint_absent_when_disabled(pool: SqlitePool) {
        let server = create_test_app(pool).await;

        server.get("/internal/metrics").await.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_initial_admin_user_is_idempotent(pool: SqlitePool) {
        let first = create_initial_admin_user("Front Desk", "frontdesk@example.com", &pool)
            .await
            .unwrap();
        let second = create_initial_admin_user("Front Desk", "frontdesk@example.com", &pool)
            .await
            .unwrap();
        assert_eq!(first, second);

        let mut conn = pool.acquire().await.unwrap();
        let admin = Users::new(&mut conn)
            .get_by_email("frontdesk@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(admin.membership_status.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_startup_seeds_admin_from_config(pool: SqlitePool) {
        let mut config = create_test_config();
        config.seed_admin = Some(crate::config::SeedAdminConfig {
            name: "Front Desk".to_string(),
            email: "seeded@example.com".to_string(),
        });

        Application::new_with_pool(config, Some(pool.clone()))
            .await
            .expect("Failed to create application");

        let mut conn = pool.acquire().await.unwrap();
        let admin = Users::new(&mut conn)
            .get_by_email("seeded@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
    }
}
