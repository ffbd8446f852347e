//! Defines the route handler for the CSV import page.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    account::{Account, get_all_accounts},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        loading_spinner, render,
    },
    navigation::NavBar,
};

/// The state needed to render the CSV import page.
#[derive(Debug, Clone)]
pub struct ImportPageState {
    /// The database connection for listing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ImportPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for importing transactions from a CSV file.
pub async fn get_import_page(State(state): State<ImportPageState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_all_accounts(&connection) {
        Ok(accounts) => render(StatusCode::OK, import_view(&accounts)),
        Err(error) => {
            tracing::error!("could not list accounts: {error}");
            error.into_response()
        }
    }
}

fn import_view(accounts: &[Account]) -> Markup {
    let nav_bar = NavBar::new(endpoints::IMPORT_VIEW).into_html();
    let spinner = loading_spinner();

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold py-4" { "Import Transactions" }

            form
                class="w-full space-y-4"
                hx-post=(endpoints::IMPORT)
                enctype="multipart/form-data"
                hx-disabled-elt="#file, #submit-button"
                hx-indicator="#indicator"
                hx-swap="none"
                hx-target-error="#alert-container"
            {
                div
                {
                    label for="account_id" class=(FORM_LABEL_STYLE) { "Account" }

                    select
                        name="account_id"
                        id="account_id"
                        required
                        class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for account in accounts {
                            option value=(account.id) { (account.name) }
                        }
                    }
                }

                div
                {
                    label for="file" class=(FORM_LABEL_STYLE) { "CSV file" }

                    input
                        id="file"
                        type="file"
                        name="file"
                        accept="text/csv"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);

                    p class="mt-2 text-sm"
                    {
                        "Upload a CSV with the columns date, payee, amount and \
                        notes. Amounts are negative for expenses."
                    }
                }

                button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
                {
                    span class="inline htmx-indicator" id="indicator" { (spinner) }
                    " Import"
                }
            }
        }
    );

    base("Import Transactions", &[], &content)
}
