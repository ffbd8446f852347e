//! Defines the endpoint for deleting an account.

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
    database_id::AccountId,
};

/// The state needed to delete an account.
#[derive(Debug, Clone)]
pub struct DeleteAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The cache to invalidate after a successful write.
    pub query_cache: QueryCache,
}

impl FromRef<AppState> for DeleteAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_cache: state.query_cache.clone(),
        }
    }
}

/// A route handler for deleting an account, responds with an alert.
///
/// Deleting an account also deletes its transactions through the foreign key
/// cascade.
pub async fn delete_account_endpoint(
    State(state): State<DeleteAccountState>,
    Path(account_id): Path<AccountId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_account(account_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(rows_affected) if rows_affected != 0 => {
            state
                .query_cache
                .invalidate(MutationKind::DeleteAccount(account_id));

            Alert::SuccessSimple {
                message: "Account deleted".to_owned(),
            }
            .into_response()
        }
        Ok(_) => Error::DeleteMissingAccount.into_alert_response(),
        Err(error) => {
            tracing::error!("Could not delete account {account_id}: {error}");
            error.into_alert_response()
        }
    }
}

type RowsAffected = usize;

fn delete_account(id: AccountId, connection: &Connection) -> Result<RowsAffected, Error> {
    connection
        .execute("DELETE FROM account WHERE id = :id", &[(":id", &id)])
        .map_err(Error::from)
}
