//! The page for editing or deleting an existing transaction.

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
    account::{Account, get_all_accounts},
    category::{Category, get_all_categories},
    database_id::TransactionId,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base,
        dollar_input_styles, render,
    },
    internal_server_error::render_internal_server_error,
    navigation::NavBar,
    not_found::get_404_not_found_response,
    timezone::today,
    transaction::{
        Transaction,
        form::{TransactionFormDefaults, TransactionType, transaction_form_fields},
        get_transaction,
    },
};

/// The state needed for the edit transaction page.
#[derive(Debug, Clone)]
pub struct EditTransactionPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing a transaction.
pub async fn get_edit_transaction_page(
    State(state): State<EditTransactionPageState>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return render_internal_server_error(Default::default());
        }
    };

    let transaction = match get_transaction(transaction_id, &connection) {
        Ok(transaction) => transaction,
        Err(Error::NotFound) => {
            return get_404_not_found_response();
        }
        Err(error) => {
            tracing::error!("Failed to retrieve transaction {transaction_id}: {error}");
            return render_internal_server_error(Default::default());
        }
    };

    let (accounts, categories) =
        match get_all_accounts(&connection).and_then(|accounts| {
            get_all_categories(&connection).map(|categories| (accounts, categories))
        }) {
            Ok(rows) => rows,
            Err(error) => {
                tracing::error!("Failed to retrieve form options: {error}");
                return render_internal_server_error(Default::default());
            }
        };

    let max_date = today(&state.local_timezone);

    render(
        StatusCode::OK,
        edit_transaction_view(&transaction, max_date, &accounts, &categories),
    )
}

fn edit_transaction_view(
    transaction: &Transaction,
    max_date: time::Date,
    accounts: &[Account],
    categories: &[Category],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_TRANSACTION_VIEW).into_html();
    let edit_url = format_endpoint(endpoints::PUT_TRANSACTION, transaction.id);
    let delete_url = format_endpoint(endpoints::DELETE_TRANSACTION, transaction.id);

    let transaction_type = if transaction.amount.is_expense() {
        TransactionType::Expense
    } else {
        TransactionType::Income
    };
    let defaults = TransactionFormDefaults {
        transaction_type,
        amount: Some(transaction.amount.to_decimal().abs()),
        date: transaction.date,
        payee: Some(&transaction.payee),
        notes: transaction.notes.as_deref(),
        account_id: Some(transaction.account_id),
        category_id: transaction.category_id,
        max_date,
    };

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold py-4" { "Edit Transaction" }

            form
                class="w-full space-y-4"
                hx-put=(edit_url)
                hx-target-error="#alert-container"
            {
                (transaction_form_fields(&defaults, accounts, categories))

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save Changes" }
            }

            button
                type="button"
                hx-delete=(delete_url)
                hx-confirm="Are you sure you want to delete this transaction? This cannot be undone."
                hx-target-error="#alert-container"
                class=(BUTTON_DELETE_STYLE)
            {
                "Delete Transaction"
            }
        }
    );

    base("Edit Transaction", &[dollar_input_styles()], &content)
}

#[cfg(test)]
mod edit_transaction_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        db::initialize,
        test_utils::{assert_status_ok, parse_html_document},
    };

    use super::{EditTransactionPageState, get_edit_transaction_page};

    fn get_test_state() -> EditTransactionPageState {
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

        EditTransactionPageState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    #[tokio::test]
    async fn form_is_prefilled_from_transaction() {
        let state = get_test_state();

        let response = get_edit_transaction_page(State(state), Path(1)).await;

        assert_status_ok(&response);
        let html = parse_html_document(response).await;

        let form_selector = Selector::parse("form").unwrap();
        let form = html.select(&form_selector).next().unwrap();
        assert_eq!(Some("/api/transactions/1"), form.attr("hx-put"));

        let amount_selector = Selector::parse("input[name=amount]").unwrap();
        let amount_input = html.select(&amount_selector).next().unwrap();
        assert_eq!(Some("12.50"), amount_input.attr("value"));

        let payee_selector = Selector::parse("input[name=payee]").unwrap();
        let payee_input = html.select(&payee_selector).next().unwrap();
        assert_eq!(Some("Cafe"), payee_input.attr("value"));

        let expense_selector = Selector::parse("#transaction-type-expense").unwrap();
        let expense = html.select(&expense_selector).next().unwrap();
        assert!(expense.attr("checked").is_some());
    }

    #[tokio::test]
    async fn missing_transaction_renders_not_found() {
        let state = get_test_state();

        let response = get_edit_transaction_page(State(state), Path(999)).await;

        assert_eq!(StatusCode::NOT_FOUND, response.status());
    }
}
