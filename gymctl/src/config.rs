//! Application configuration.
//!
//! Configuration is merged from two sources, later entries winning:
//!
//! 1. A YAML file (default `config.yaml`, overridden with `-f` or the
//!    `GYMCTL_CONFIG` environment variable).
//! 2. `GYMCTL_`-prefixed environment variables, with `__` separating nesting
//!    levels (`GYMCTL_SERVER__PORT=8080` sets `server.port`).
//!
//! `DATABASE_URL` / `GYMCTL_DATABASE_URL` populate the top-level
//! `database_url` field, which wins over `database.path` when the pool is
//! opened.

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to config file
    #[arg(short = 'f', long, env = "GYMCTL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate config file and exit
    #[arg(long)]
    pub validate: bool,
}

/// Runtime configuration for the reservation service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// SQLite storage settings.
    pub database: DatabaseConfig,
    /// Full connection string override. Populated by `DATABASE_URL` or
    /// `GYMCTL_DATABASE_URL`; wins over `database.path` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Administrator account ensured to exist at startup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_admin: Option<SeedAdminConfig>,
    /// Expose Prometheus metrics at `/internal/metrics`.
    pub enable_metrics: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            database_url: None,
            seed_admin: None,
            enable_metrics: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path of the SQLite database file, created on first start if missing.
    pub path: String,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "gymctl.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Admin user inserted on startup when no user with this email exists.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SeedAdminConfig {
    pub name: String,
    pub email: String,
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("GYMCTL_").split("__"))
            // Common DATABASE_URL pattern, accepted without the prefix too
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    /// Connection string for the SQLite pool.
    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}", self.database.path),
        }
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.database.max_connections == 0 {
            return Err(Error::Internal {
                operation: "Config validation: database.max_connections must be at least 1"
                    .to_string(),
            });
        }

        if self.database_url.is_none() && self.database.path.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: database.path cannot be empty. Set database.path \
                            or provide GYMCTL_DATABASE_URL."
                    .to_string(),
            });
        }

        if let Some(seed) = &self.seed_admin {
            if seed.name.trim().is_empty() {
                return Err(Error::Internal {
                    operation: "Config validation: seed_admin.name cannot be empty".to_string(),
                });
            }
            if !seed.email.contains('@') {
                return Err(Error::Internal {
                    operation: format!(
                        "Config validation: seed_admin.email '{}' is not a valid email address",
                        seed.email
                    ),
                });
            }
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
