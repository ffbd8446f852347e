//! Defines the endpoint for updating a transaction.
use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::{Connection, params};

use crate::{
    AppState, Error,
    cache::{MutationKind, QueryCache},
    database_id::TransactionId,
    endpoints,
    timezone::today,
    transaction::{NewTransaction, create_endpoint::TransactionForm},
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The cache to invalidate after a successful write.
    pub query_cache: QueryCache,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
            query_cache: state.query_cache.clone(),
        }
    }
}

/// A route handler for updating a transaction, redirects to the transactions
/// view on success.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Path(transaction_id): Path<TransactionId>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let fields = match form.into_new_transaction(today(&state.local_timezone)) {
        Ok(fields) => fields,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_transaction(transaction_id, &fields, &connection) {
        Ok(rows_affected) if rows_affected != 0 => {
            state
                .query_cache
                .invalidate(MutationKind::UpdateTransaction(transaction_id));

            (
                HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Ok(_) => Error::UpdateMissingTransaction.into_alert_response(),
        Err(error) => {
            tracing::error!("Could not update transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}

type RowsAffected = usize;

fn update_transaction(
    id: TransactionId,
    fields: &NewTransaction,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "UPDATE \"transaction\"
        SET account_id = ?1, category_id = ?2, date = ?3, amount = ?4, payee = ?5, notes = ?6
        WHERE id = ?7",
            params![
                fields.account_id,
                fields.category_id,
                fields.date,
                fields.amount,
                fields.payee,
                fields.notes,
                id,
            ],
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidAccount(Some(fields.account_id)),
            error => error.into(),
        })
}
