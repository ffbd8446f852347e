//! Defines the endpoint for updating an account.
use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::{Connection, params};
use serde::Deserialize;

use crate::{
    AppState, Error,
    cache::{MutationKind, QueryCache},
    database_id::AccountId,
    endpoints,
};

/// The state needed to edit an account.
#[derive(Debug, Clone)]
pub struct EditAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The cache to invalidate after a successful write.
    pub query_cache: QueryCache,
}

impl FromRef<AppState> for EditAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_cache: state.query_cache.clone(),
        }
    }
}

/// The form data for renaming an account.
#[derive(Debug, Deserialize)]
pub struct EditAccountForm {
    /// The new account name.
    pub name: String,
}

/// A route handler for renaming an account, redirects to the accounts view on
/// success.
pub async fn edit_account_endpoint(
    State(state): State<EditAccountState>,
    Path(account_id): Path<AccountId>,
    Form(form): Form<EditAccountForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_account(account_id, &form, &connection) {
        Ok(rows_affected) if rows_affected != 0 => {
            state
                .query_cache
                .invalidate(MutationKind::UpdateAccount(account_id));

            (
                HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Ok(_) => Error::UpdateMissingAccount.into_alert_response(),
        Err(Error::DuplicateAccountName(_)) => {
            Error::DuplicateAccountName(form.name).into_alert_response()
        }
        Err(error) => {
            tracing::error!("Could not update account {account_id}: {error}");
            error.into_alert_response()
        }
    }
}

type RowsAffected = usize;

fn update_account(
    id: AccountId,
    form: &EditAccountForm,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    let name = form.name.trim();

    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    connection
        .execute(
            "UPDATE account SET name = ?1 WHERE id = ?2",
            params![name, id],
        )
        .map_err(Error::from)
}
