//! Defines the endpoint for deleting a category.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    cache::{MutationKind, QueryCache},
    database_id::CategoryId,
};

/// The state needed to delete a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The cache to invalidate after a successful write.
    pub query_cache: QueryCache,
}

impl FromRef<AppState> for DeleteCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_cache: state.query_cache.clone(),
        }
    }
}

/// A route handler for deleting a category, responds with an alert.
///
/// Transactions that referenced the category keep their other fields and
/// become uncategorised through the foreign key SET NULL rule.
pub async fn delete_category_endpoint(
    State(state): State<DeleteCategoryState>,
    Path(category_id): Path<CategoryId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_category(category_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(rows_affected) if rows_affected != 0 => {
            state
                .query_cache
                .invalidate(MutationKind::DeleteCategory(category_id));

            Alert::SuccessSimple {
                message: "Category deleted".to_owned(),
            }
            .into_response()
        }
        Ok(_) => Error::DeleteMissingCategory.into_alert_response(),
        Err(error) => {
            tracing::error!("Could not delete category {category_id}: {error}");
            error.into_alert_response()
        }
    }
}

type RowsAffected = usize;

fn delete_category(id: CategoryId, connection: &Connection) -> Result<RowsAffected, Error> {
    connection
        .execute("DELETE FROM category WHERE id = :id", &[(":id", &id)])
        .map_err(Error::from)
}
