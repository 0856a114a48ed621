//! Database connection settings.
//!
//! The deployed system configures its database through four environment
//! variables. They are resolved exactly once, at process start, into an
//! explicit `DbConfig` that is passed by reference into every dispatch; no
//! handler performs ambient environment lookups of its own.
//!
//! An incomplete configuration must not crash the server process: the
//! resolution error is held and reported as a 500-class failure on each
//! request instead (see `Services::init`).

use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::env;
use std::time::Duration;

use crate::error::ServiceError;

/// Name of the traceability database on the shared server.
const DATABASE: &str = "Traceability_TEST";

/// Reported when `AZURE_SQL_DRIVER` is unset. The actual driver is linked
/// into the binary; the variable is only honored for deployment parity.
const DEFAULT_DRIVER: &str = "sqlx-postgres";

/// Bound on connection establishment, matching the deployed connection
/// string. In-flight statements are never cancelled.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct DbConfig {
    server: String,
    user: String,
    password: String,
    driver: String,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = require(&lookup, "AZURE_SQL_CONNECTION_STRING")?;
        let user = require(&lookup, "AZURE_SQL_DB_USER")?;
        let password = require(&lookup, "AZURE_SQL_DB_PASSWORD")?;
        let driver = lookup("AZURE_SQL_DRIVER")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_DRIVER.to_owned());

        Ok(DbConfig {
            server,
            user,
            password,
            driver,
        })
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    /// Options for one fresh connection. Every dispatch opens and closes its
    /// own connection; there is no pool.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.server)
            .username(&self.user)
            .password(&self.password)
            .database(DATABASE)
            .ssl_mode(PgSslMode::Require)
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        DbConfig {
            server: "localhost".to_owned(),
            user: "tester".to_owned(),
            password: "secret".to_owned(),
            driver: DEFAULT_DRIVER.to_owned(),
        }
    }
}

fn require<F>(lookup: &F, name: &str) -> Result<String, ServiceError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServiceError::Configuration(format!("{name} is not set")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn resolves_complete_settings() {
        let vars = env(&[
            ("AZURE_SQL_CONNECTION_STRING", "db.example.net"),
            ("AZURE_SQL_DB_USER", "traceability"),
            ("AZURE_SQL_DB_PASSWORD", "hunter2"),
            ("AZURE_SQL_DRIVER", "custom-driver"),
        ]);

        let cfg = DbConfig::from_lookup(|name| vars.get(name).cloned()).unwrap();
        assert_eq!(cfg.server, "db.example.net");
        assert_eq!(cfg.user, "traceability");
        assert_eq!(cfg.driver(), "custom-driver");
    }

    #[test]
    fn driver_has_a_default() {
        let vars = env(&[
            ("AZURE_SQL_CONNECTION_STRING", "db.example.net"),
            ("AZURE_SQL_DB_USER", "traceability"),
            ("AZURE_SQL_DB_PASSWORD", "hunter2"),
        ]);

        let cfg = DbConfig::from_lookup(|name| vars.get(name).cloned()).unwrap();
        assert_eq!(cfg.driver(), DEFAULT_DRIVER);
    }

    #[test]
    fn missing_server_is_a_configuration_error() {
        let vars = env(&[
            ("AZURE_SQL_DB_USER", "traceability"),
            ("AZURE_SQL_DB_PASSWORD", "hunter2"),
        ]);

        match DbConfig::from_lookup(|name| vars.get(name).cloned()) {
            Err(ServiceError::Configuration(msg)) => {
                assert!(msg.contains("AZURE_SQL_CONNECTION_STRING"));
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn empty_password_counts_as_unset() {
        let vars = env(&[
            ("AZURE_SQL_CONNECTION_STRING", "db.example.net"),
            ("AZURE_SQL_DB_USER", "traceability"),
            ("AZURE_SQL_DB_PASSWORD", ""),
        ]);

        assert!(DbConfig::from_lookup(|name| vars.get(name).cloned()).is_err());
    }
}
