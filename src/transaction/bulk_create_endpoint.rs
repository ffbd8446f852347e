//! Defines the endpoint for creating many transactions in one request.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, params};

use crate::{
    AppState, Error,
    alert::Alert,
    cache::{MutationKind, QueryCache},
    timezone::today,
    transaction::NewTransaction,
};

/// The state needed to bulk-create transactions.
#[derive(Debug, Clone)]
pub struct BulkCreateTransactionsState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The cache to invalidate after a successful write.
    pub query_cache: QueryCache,
}

impl FromRef<AppState> for BulkCreateTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
            query_cache: state.query_cache.clone(),
        }
    }
}

/// A route handler for creating a batch of transactions from a JSON array.
///
/// The batch is atomic: either every transaction is inserted or none are,
/// and the cache is invalidated once for the whole batch.
pub async fn bulk_create_transactions_endpoint(
    State(state): State<BulkCreateTransactionsState>,
    Json(new_transactions): Json<Vec<NewTransaction>>,
) -> Response {
    let max_date = today(&state.local_timezone);

    if let Some(transaction) = new_transactions
        .iter()
        .find(|transaction| transaction.date > max_date)
    {
        return Error::FutureDate(transaction.date).into_alert_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match insert_transactions(&new_transactions, &connection) {
        Ok(count) => {
            state
                .query_cache
                .invalidate(MutationKind::BulkCreateTransactions);

            Alert::SuccessSimple {
                message: format!("Created {count} transactions"),
            }
            .into_response()
        }
        Err(error) => {
            tracing::error!("Could not bulk-create transactions: {error}");
            error.into_alert_response()
        }
    }
}

/// Insert `new_transactions` inside a single SQL transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAccount] or [Error::InvalidCategory] if a referenced id
///   does not exist (nothing is inserted in that case),
/// - or [Error::SqlError] if there is some other SQL error.
pub fn insert_transactions(
    new_transactions: &[NewTransaction],
    connection: &Connection,
) -> Result<usize, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    {
        let mut statement = sql_transaction.prepare(
            "INSERT INTO \"transaction\" (account_id, category_id, date, amount, payee, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;

        for new_transaction in new_transactions {
            statement
                .execute(params![
                    new_transaction.account_id,
                    new_transaction.category_id,
                    new_transaction.date,
                    new_transaction.amount,
                    new_transaction.payee,
                    new_transaction.notes,
                ])
                .map_err(|error| match error {
                    rusqlite::Error::SqliteFailure(
                        rusqlite::ffi::Error {
                            code: _,
                            extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                        },
                        _,
                    ) => Error::InvalidAccount(Some(new_transaction.account_id)),
                    error => error.into(),
                })?;
        }
    }

    sql_transaction.commit()?;

    Ok(new_transactions.len())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, extract::State, http::StatusCode};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        cache::{CacheKey, QueryCache},
        db::initialize,
        miliunits::Miliunits,
        timezone::today,
        transaction::{NewTransaction, count_transactions},
    };

    use super::{BulkCreateTransactionsState, bulk_create_transactions_endpoint};

    fn get_test_state() -> BulkCreateTransactionsState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn.execute(
            "INSERT INTO account (name, user_id) VALUES ('Checking', 'test_user')",
            (),
        )
        .unwrap();

        BulkCreateTransactionsState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(conn)),
            query_cache: QueryCache::new(),
        }
    }

    fn new_transaction(account_id: i64, payee: &str) -> NewTransaction {
        NewTransaction {
            account_id,
            category_id: None,
            date: date!(2026 - 08 - 01),
            amount: Miliunits::from_raw(-5_000),
            payee: payee.to_owned(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn creates_all_transactions_with_a_single_invalidation() {
        let state = get_test_state();
        let batch = vec![
            new_transaction(1, "Cafe"),
            new_transaction(1, "Grocer"),
            new_transaction(1, "Bus"),
        ];

        let response =
            bulk_create_transactions_endpoint(State(state.clone()), Json(batch)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(Ok(3), count_transactions(&connection));
        assert_eq!(
            1,
            state
                .query_cache
                .invalidation_count(CacheKey::Transactions)
        );
    }

    #[tokio::test]
    async fn batch_with_invalid_account_inserts_nothing() {
        let state = get_test_state();
        let batch = vec![new_transaction(1, "Cafe"), new_transaction(999, "Grocer")];

        let response =
            bulk_create_transactions_endpoint(State(state.clone()), Json(batch)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(Ok(0), count_transactions(&connection));
        assert_eq!(
            0,
            state
                .query_cache
                .invalidation_count(CacheKey::Transactions)
        );
    }

    #[tokio::test]
    async fn batch_with_future_date_is_rejected() {
        let state = get_test_state();
        let mut transaction = new_transaction(1, "Cafe");
        transaction.date = today("Etc/UTC").next_day().unwrap();

        let response =
            bulk_create_transactions_endpoint(State(state.clone()), Json(vec![transaction])).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(Ok(0), count_transactions(&connection));
    }
}
