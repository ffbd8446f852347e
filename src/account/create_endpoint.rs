//! Defines the endpoint for creating a new account.
use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::{Connection, params};
use serde::Deserialize;

use crate::{
    AppState, Error,
    account::Account,
    cache::{MutationKind, QueryCache},
    endpoints,
};

/// The state needed to create an account.
#[derive(Debug, Clone)]
pub struct CreateAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The cache to invalidate after a successful write.
    pub query_cache: QueryCache,
    /// The user id to record as the owner of the new account.
    pub user_id: String,
}

impl FromRef<AppState> for CreateAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_cache: state.query_cache.clone(),
            user_id: state.user_id.clone(),
        }
    }
}

/// The form data for creating an account.
#[derive(Debug, Deserialize)]
pub struct AccountForm {
    /// The account name.
    pub name: String,
}

/// A route handler for creating a new account, redirects to the accounts view
/// on success.
pub async fn create_account_endpoint(
    State(state): State<CreateAccountState>,
    Form(form): Form<AccountForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_account(&form, &state.user_id, &connection) {
        Ok(_) => {
            state.query_cache.invalidate(MutationKind::CreateAccount);

            (
                HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::DuplicateAccountName(_)) => {
            Error::DuplicateAccountName(form.name).into_alert_response()
        }
        Err(error) => {
            tracing::error!("Could not create account with {form:?}: {error}");
            error.into_alert_response()
        }
    }
}

/// Insert a new account into the database.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyName] if the trimmed name is empty,
/// - or [Error::DuplicateAccountName] if an account with that name exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_account(
    form: &AccountForm,
    user_id: &str,
    connection: &Connection,
) -> Result<Account, Error> {
    let name = form.name.trim();

    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    connection.execute(
        "INSERT INTO account (name, user_id) VALUES (?1, ?2)",
        params![name, user_id],
    )?;

    let id = connection.last_insert_rowid();

    Ok(Account {
        id,
        name: name.to_owned(),
        user_id: user_id.to_owned(),
        plaid_id: None,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Form, extract::State, http::StatusCode};
    use rusqlite::Connection;

    use crate::{
        Error,
        account::{
            create_endpoint::{AccountForm, CreateAccountState, create_account},
            create_account_endpoint, get_account,
        },
        cache::{CacheKey, QueryCache},
        db::initialize,
        endpoints,
        test_utils::assert_hx_redirect,
    };

    fn get_test_state() -> CreateAccountState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        CreateAccountState {
            db_connection: Arc::new(Mutex::new(conn)),
            query_cache: QueryCache::new(),
            user_id: "test_user".to_owned(),
        }
    }

    #[tokio::test]
    async fn creates_account_and_redirects() {
        let state = get_test_state();
        let form = AccountForm {
            name: "Checking".to_owned(),
        };

        let response = create_account_endpoint(State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::ACCOUNTS_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let account = get_account(1, &connection).expect("could not get account from database");
        assert_eq!("Checking", account.name);
        assert_eq!("test_user", account.user_id);
    }

    #[tokio::test]
    async fn invalidates_account_list_on_success() {
        let state = get_test_state();
        let form = AccountForm {
            name: "Checking".to_owned(),
        };

        create_account_endpoint(State(state.clone()), Form(form)).await;

        assert_eq!(1, state.query_cache.invalidation_count(CacheKey::Accounts));
    }

    #[tokio::test]
    async fn duplicate_name_responds_with_error_and_skips_invalidation() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_account(
                &AccountForm {
                    name: "Checking".to_owned(),
                },
                "test_user",
                &connection,
            )
            .unwrap();
        }

        let form = AccountForm {
            name: "Checking".to_owned(),
        };
        let response = create_account_endpoint(State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(0, state.query_cache.invalidation_count(CacheKey::Accounts));
    }

    #[test]
    fn create_account_rejects_empty_name() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let result = create_account(
            &AccountForm {
                name: "   ".to_owned(),
            },
            "test_user",
            &conn,
        );

        assert_eq!(Err(Error::EmptyName), result);
    }
}
