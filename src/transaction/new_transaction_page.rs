//! The page for creating a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{Account, get_all_accounts},
    category::{Category, get_all_categories},
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, dollar_input_styles, render},
    navigation::NavBar,
    timezone::today,
    transaction::form::{TransactionFormDefaults, transaction_form_fields},
};

/// The state needed for the new transaction page.
#[derive(Debug, Clone)]
pub struct NewTransactionPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for reading accounts and categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for NewTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for creating a transaction.
pub async fn get_new_transaction_page(State(state): State<NewTransactionPageState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let accounts = match get_all_accounts(&connection) {
        Ok(accounts) => accounts,
        Err(error) => {
            tracing::error!("Failed to retrieve accounts for new transaction page: {error}");
            return error.into_response();
        }
    };

    let categories = match get_all_categories(&connection) {
        Ok(categories) => categories,
        Err(error) => {
            tracing::error!("Failed to retrieve categories for new transaction page: {error}");
            return error.into_response();
        }
    };

    let defaults = TransactionFormDefaults::empty(today(&state.local_timezone));

    render(
        StatusCode::OK,
        new_transaction_view(&defaults, &accounts, &categories),
    )
}

fn new_transaction_view(
    defaults: &TransactionFormDefaults<'_>,
    accounts: &[Account],
    categories: &[Category],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold py-4" { "New Transaction" }

            form
                class="w-full space-y-4"
                hx-post=(endpoints::TRANSACTIONS_API)
                hx-target-error="#alert-container"
            {
                (transaction_form_fields(defaults, accounts, categories))

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Transaction" }
            }
        }
    );

    base("New Transaction", &[dollar_input_styles()], &content)
}
