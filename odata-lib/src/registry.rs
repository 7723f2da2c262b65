//! Connection registry.

use std::sync::Arc;

use dashmap::DashMap;

use crate::client::Connection;
use crate::transport::HttpExecutor;

/// An explicit cache of connections keyed by endpoint and credentials.
///
/// The registry is owned by the caller and lives exactly as long as the
/// caller keeps it; there is no process-wide instance. Two lookups with the
/// same `(url, username, password)` key yield clones of the same
/// connection.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use odata_lib::ConnectionRegistry;
/// use odata_lib::transport::ReqwestExecutor;
///
/// let registry = ConnectionRegistry::new();
/// let connection = registry.get_or_create("http://host/odata", "user", "pw", || {
///     Arc::new(ReqwestExecutor::new())
/// });
/// assert_eq!(registry.len(), 1);
/// # drop(connection);
/// ```
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<(String, String, String), Connection>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the connection for the key, creating it on first use.
    ///
    /// `executor` is only invoked when the key is new.
    pub fn get_or_create(
        &self,
        url: &str,
        username: &str,
        password: &str,
        executor: impl FnOnce() -> Arc<dyn HttpExecutor>,
    ) -> Connection {
        self.connections
            .entry((url.to_string(), username.to_string(), password.to_string()))
            .or_insert_with(|| Connection::new(executor(), url, username, password))
            .clone()
    }

    /// Removes and returns the connection for the key, if cached.
    pub fn remove(&self, url: &str, username: &str, password: &str) -> Option<Connection> {
        self.connections
            .remove(&(url.to_string(), username.to_string(), password.to_string()))
            .map(|(_, connection)| connection)
    }

    /// Returns the number of cached connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns `true` if no connections are cached.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Drops every cached connection.
    pub fn clear(&self) {
        self.connections.clear();
    }
}
