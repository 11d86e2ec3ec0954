use std::env;
use std::time::Duration;

/// Connection settings for the trip store.
///
/// Reads `GAGGLE_DATABASE_URL` and `GAGGLE_DB_MAX_CONNECTIONS` from the
/// environment, falling back to [`DbConfig::DEFAULT_URL`] and a pool of 5.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL.
    pub database_url: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
    /// How long to wait for a free connection before giving up.
    pub acquire_timeout: Duration,
}

impl DbConfig {
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/gaggle";
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

    /// Build a config from the environment.
    pub fn from_env() -> Self {
        let database_url =
            env::var("GAGGLE_DATABASE_URL").unwrap_or_else(|_| Self::DEFAULT_URL.to_owned());
        let max_connections = env::var("GAGGLE_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(Self::DEFAULT_MAX_CONNECTIONS);
        Self {
            max_connections,
            ..Self::new(database_url)
        }
    }

    /// Build a config from an explicit URL (CLI flags, tests).
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    /// Extract the database name from the URL, ignoring any query string.
    pub fn database_name(&self) -> Option<&str> {
        let without_query = self
            .database_url
            .split_once('?')
            .map_or(self.database_url.as_str(), |(base, _)| base);
        without_query
            .rsplit_once('/')
            .map(|(_, name)| name)
            .filter(|name| !name.is_empty())
    }

    /// URL of the `postgres` maintenance database on the same server, used
    /// to issue `CREATE DATABASE` when the trip database is missing.
    pub fn maintenance_url(&self) -> String {
        let (base, query) = match self.database_url.split_once('?') {
            Some((base, query)) => (base, Some(query)),
            None => (self.database_url.as_str(), None),
        };
        let mut url = match base.rfind('/') {
            Some(pos) => format!("{}/postgres", &base[..pos]),
            None => base.to_owned(),
        };
        if let Some(query) = query {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
