//! Configuration for the Comment Gateway
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)

use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{GatewayError, GatewayResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// GraphQL configuration
    pub graphql: GraphQLConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLConfig {
    /// HTTP endpoint for queries and mutations
    pub path: String,
    /// WebSocket endpoint for subscriptions
    pub subscriptions_path: String,
    /// Enable GraphiQL playground
    pub playground: bool,
    /// Max query depth
    pub max_depth: usize,
    /// Max query complexity
    pub max_complexity: usize,
    /// Enable introspection
    pub introspection: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            workers: num_cpus::get(),
        }
    }
}

impl Default for GraphQLConfig {
    fn default() -> Self {
        Self {
            path: "/graphql".to_string(),
            subscriptions_path: "/subscriptions".to_string(),
            playground: true,
            max_depth: 10,
            max_complexity: 1000,
            introspection: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> GatewayResult<Self> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let config = Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT")?.unwrap_or(defaults.server.port),
                workers: parse_var("SERVER_WORKERS")?.unwrap_or(defaults.server.workers),
            },
            graphql: GraphQLConfig {
                path: env::var("GRAPHQL_PATH").unwrap_or(defaults.graphql.path),
                subscriptions_path: env::var("GRAPHQL_WS_PATH")
                    .unwrap_or(defaults.graphql.subscriptions_path),
                playground: parse_var("GRAPHQL_PLAYGROUND")?
                    .unwrap_or(defaults.graphql.playground),
                max_depth: parse_var("GRAPHQL_MAX_DEPTH")?.unwrap_or(defaults.graphql.max_depth),
                max_complexity: parse_var("GRAPHQL_MAX_COMPLEXITY")?
                    .unwrap_or(defaults.graphql.max_complexity),
                introspection: parse_var("GRAPHQL_INTROSPECTION")?
                    .unwrap_or(defaults.graphql.introspection),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject endpoint layouts the router cannot serve
    pub fn validate(&self) -> GatewayResult<()> {
        for path in [&self.graphql.path, &self.graphql.subscriptions_path] {
            if !path.starts_with('/') {
                return Err(GatewayError::Config(format!(
                    "endpoint path must start with '/': {}",
                    path
                )));
            }
        }

        for path in [&self.graphql.path, &self.graphql.subscriptions_path] {
            if RESERVED_PATHS.contains(&path.as_str()) {
                return Err(GatewayError::Config(format!(
                    "endpoint path {} is reserved for a built-in route",
                    path
                )));
            }
        }

        if self.graphql.path == self.graphql.subscriptions_path {
            return Err(GatewayError::Config(format!(
                "GRAPHQL_PATH and GRAPHQL_WS_PATH must differ (both are {})",
                self.graphql.path
            )));
        }

        if self.server.workers == 0 {
            return Err(GatewayError::Config(
                "SERVER_WORKERS must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Fixed routes served next to the GraphQL endpoints
const RESERVED_PATHS: &[&str] = &["/schema", "/health", "/playground"];

/// Parse an optional environment variable; a present but malformed value is an error
fn parse_var<T: std::str::FromStr>(name: &str) -> GatewayResult<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| GatewayError::Config(format!("invalid value for {}: {}", name, raw))),
        Err(_) => Ok(None),
    }
}
