//! Core of the user record store.
//! Validation, entity mapping and storage backends live here; binaries only
//! wire configuration to these types.

pub mod config;
pub mod context;
pub mod datastore;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;

pub use config::{ConfigError, StoreConfig};
pub use context::{ExecutionScope, RequestContext};
pub use datastore::{
    Datastore, DatastoreError, DatastoreResult, Entity, Key, MemoryDatastore, Properties,
    SqliteDatastore,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::user::{User, UserValidationError, USER_KIND};
pub use service::user_service::{UserService, UserServiceError, UserServiceResult};

/// Health check used by the CLI smoke command.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
