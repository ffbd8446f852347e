//! Implements a struct that holds the state of the server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, cache::QueryCache, db::initialize, pagination::PaginationConfig};

/// The state of the server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The user id that owns all rows created through the web UI.
    ///
    /// The server runs single-user, so this is configuration rather than a
    /// session value.
    pub user_id: String,

    /// The config that controls how to display pages of data.
    pub pagination_config: PaginationConfig,

    /// The shared cache of query results.
    pub query_cache: QueryCache,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        local_timezone: &str,
        user_id: &str,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        Ok(Self {
            local_timezone: local_timezone.to_owned(),
            user_id: user_id.to_owned(),
            pagination_config,
            query_cache: QueryCache::new(),
            db_connection: connection,
        })
    }
}
