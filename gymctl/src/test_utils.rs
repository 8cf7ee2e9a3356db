//! Test utilities for integration testing (available with `test-utils` feature).
//!
//! Database fixtures (seeded users and classes) live in
//! [`crate::db::test_fixtures`]; this module provides the application-level
//! pieces.

use axum_test::TestServer;
use sqlx::SqlitePool;

use crate::config::{DatabaseConfig, ServerConfig};

/// Build a [`TestServer`] around an application backed by the given pool.
///
/// The pool comes from `#[sqlx::test]`, so migrations have already run.
pub async fn create_test_app(pool: SqlitePool) -> TestServer {
    let config = create_test_config();

    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

pub fn create_test_config() -> crate::Config {
    crate::Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig::default(),
        database_url: None,
        seed_admin: None,
        // Metrics install a process-global recorder, so tests opt in one at
        // a time rather than tripping over each other.
        enable_metrics: false,
    }
}
