//! The page for editing or deleting an existing account.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::Response,
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{Account, get_account},
    database_id::AccountId,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, base, render,
    },
    internal_server_error::render_internal_server_error,
    navigation::NavBar,
    not_found::get_404_not_found_response,
};

/// The state needed for the edit account page.
#[derive(Debug, Clone)]
pub struct EditAccountPageState {
    /// The database connection for reading accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditAccountPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing an account.
pub async fn get_edit_account_page(
    State(state): State<EditAccountPageState>,
    Path(account_id): Path<AccountId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return render_internal_server_error(Default::default());
        }
    };

    let account = match get_account(account_id, &connection) {
        Ok(account) => account,
        Err(Error::NotFound) => {
            return get_404_not_found_response();
        }
        Err(error) => {
            tracing::error!("Failed to retrieve account {account_id}: {error}");
            return render_internal_server_error(Default::default());
        }
    };

    render(StatusCode::OK, edit_account_view(&account))
}

fn edit_account_view(account: &Account) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_ACCOUNT_VIEW).into_html();
    let edit_url = format_endpoint(endpoints::PUT_ACCOUNT, account.id);
    let delete_url = format_endpoint(endpoints::DELETE_ACCOUNT, account.id);

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold py-4" { "Edit Account" }

            form
                class="w-full space-y-4"
                hx-put=(edit_url)
                hx-target-error="#alert-container"
            {
                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                    input
                        name="name"
                        id="name"
                        type="text"
                        value=(account.name)
                        required
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save Changes" }
            }

            button
                type="button"
                hx-delete=(delete_url)
                hx-confirm=(format!(
                    "Are you sure you want to delete the account '{}'? \
                    Its transactions will be deleted too. This cannot be undone.",
                    account.name
                ))
                hx-target-error="#alert-container"
                class=(BUTTON_DELETE_STYLE)
            {
                "Delete Account"
            }
        }
    );

    base("Edit Account", &[], &content)
}
