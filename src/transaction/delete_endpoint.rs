//! Defines the endpoint for deleting a transaction.

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
    database_id::TransactionId,
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The cache to invalidate after a successful write.
    pub query_cache: QueryCache,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_cache: state.query_cache.clone(),
        }
    }
}

/// A route handler for deleting a transaction, responds with an alert.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_transaction(transaction_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(rows_affected) if rows_affected != 0 => {
            state
                .query_cache
                .invalidate(MutationKind::DeleteTransaction(transaction_id));

            Alert::SuccessSimple {
                message: "Transaction deleted".to_owned(),
            }
            .into_response()
        }
        Ok(_) => Error::DeleteMissingTransaction.into_alert_response(),
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}

type RowsAffected = usize;

fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<RowsAffected, Error> {
    connection
        .execute("DELETE FROM \"transaction\" WHERE id = :id", &[(":id", &id)])
        .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        Error,
        cache::{CacheKey, QueryCache},
        db::initialize,
        transaction::get_transaction,
    };

    use super::{DeleteTransactionState, delete_transaction_endpoint};

    fn get_test_state() -> DeleteTransactionState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn.execute(
            "INSERT INTO account (name, user_id) VALUES ('Checking', 'test_user')",
            (),
        )
        .unwrap();
        conn.execute(
            "INSERT INTO \"transaction\" (date, amount, payee, account_id)
             VALUES ('2026-08-01', -12500, 'Cafe', 1)",
            (),
        )
        .unwrap();

        DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
            query_cache: QueryCache::new(),
        }
    }

    #[tokio::test]
    async fn deletes_transaction_and_invalidates() {
        let state = get_test_state();

        let response = delete_transaction_endpoint(State(state.clone()), Path(1)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(Err(Error::NotFound), get_transaction(1, &connection));
        assert_eq!(
            1,
            state
                .query_cache
                .invalidation_count(CacheKey::Transactions)
        );
        assert_eq!(
            1,
            state
                .query_cache
                .invalidation_count(CacheKey::Transaction(1))
        );
    }

    #[tokio::test]
    async fn missing_transaction_responds_not_found_without_invalidation() {
        let state = get_test_state();

        let response = delete_transaction_endpoint(State(state.clone()), Path(999)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            0,
            state
                .query_cache
                .invalidation_count(CacheKey::Transactions)
        );
    }
}
