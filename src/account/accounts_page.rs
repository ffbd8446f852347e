//! Displays the list of accounts.

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
    cache::{CacheKey, QueryCache},
    endpoints::{self, format_endpoint},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links, render,
    },
    navigation::NavBar,
};

/// The state needed for the accounts page.
#[derive(Debug, Clone)]
pub struct AccountsPageState {
    /// The database connection for reading accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The cache that the account listing is read through.
    pub query_cache: QueryCache,
}

impl FromRef<AppState> for AccountsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_cache: state.query_cache.clone(),
        }
    }
}

/// A route handler that renders the accounts page.
pub async fn get_accounts_page(State(state): State<AccountsPageState>) -> Response {
    let accounts = match state.query_cache.get::<Vec<Account>>(CacheKey::Accounts) {
        Some(accounts) => accounts,
        None => {
            let connection = match state.db_connection.lock() {
                Ok(connection) => connection,
                Err(error) => {
                    tracing::error!("could not acquire database lock: {error}");
                    return Error::DatabaseLockError.into_response();
                }
            };

            match get_all_accounts(&connection) {
                Ok(accounts) => {
                    state.query_cache.put(CacheKey::Accounts, &accounts);
                    accounts
                }
                Err(error) => {
                    tracing::error!("Failed to retrieve accounts: {error}");
                    return error.into_response();
                }
            }
        }
    };

    render(StatusCode::OK, accounts_view(&accounts))
}

fn accounts_view(accounts: &[Account]) -> Markup {
    let create_account_page_url = endpoints::NEW_ACCOUNT_VIEW;
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();

    let table_row = |account: &Account| {
        let edit_url = format_endpoint(endpoints::EDIT_ACCOUNT_VIEW, account.id);
        let delete_url = format_endpoint(endpoints::DELETE_ACCOUNT, account.id);
        let action_links = edit_delete_action_links(
            &edit_url,
            &delete_url,
            &format!(
                "Are you sure you want to delete the account '{}'? \
                Its transactions will be deleted too. This cannot be undone.",
                account.name
            ),
            "closest tr",
            "delete",
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (account.name)
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (action_links)
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Accounts" }

                    a href=(create_account_page_url) class=(LINK_STYLE)
                    {
                        "Add Account"
                    }
                }

                section class="w-full overflow-x-auto dark:bg-gray-800 lg:max-w-5xl lg:mx-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Name"
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Actions"
                                }
                            }
                        }

                        tbody
                        {
                            @for account in accounts {
                                (table_row(account))
                            }

                            @if accounts.is_empty() {
                                tr
                                {
                                    td
                                        colspan="2"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No accounts found. Create an account "
                                        a href=(create_account_page_url) class=(LINK_STYLE)
                                        {
                                            "here"
                                        }
                                        "."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Accounts", &[], &content)
}

#[cfg(test)]
mod accounts_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        account::{Account, accounts_page::AccountsPageState, get_accounts_page},
        cache::{CacheKey, QueryCache},
        db::initialize,
        test_utils::{assert_status_ok, assert_valid_html, parse_html_document},
    };

    fn get_test_state() -> AccountsPageState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        AccountsPageState {
            db_connection: Arc::new(Mutex::new(conn)),
            query_cache: QueryCache::new(),
        }
    }

    fn insert_account(name: &str, state: &AccountsPageState) {
        let connection = state.db_connection.lock().unwrap();
        connection
            .execute(
                "INSERT INTO account (name, user_id) VALUES (?1, 'test_user')",
                [name],
            )
            .unwrap();
    }

    #[tokio::test]
    async fn lists_account_names() {
        let state = get_test_state();
        insert_account("Checking", &state);
        insert_account("Savings", &state);

        let response = get_accounts_page(State(state)).await;

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let row_selector = Selector::parse("tbody th").unwrap();
        let names: Vec<String> = html
            .select(&row_selector)
            .map(|cell| cell.text().collect::<String>().trim().to_owned())
            .collect();
        assert_eq!(vec!["Checking".to_owned(), "Savings".to_owned()], names);
    }

    #[tokio::test]
    async fn fills_cache_on_first_read() {
        let state = get_test_state();
        insert_account("Checking", &state);

        get_accounts_page(State(state.clone())).await;

        let cached: Vec<Account> = state
            .query_cache
            .get(CacheKey::Accounts)
            .expect("account listing should be cached after a page load");
        assert_eq!(1, cached.len());
        assert_eq!("Checking", cached[0].name);
    }

    #[tokio::test]
    async fn serves_cached_listing_without_touching_database() {
        let state = get_test_state();
        state.query_cache.put(
            CacheKey::Accounts,
            &vec![Account {
                id: 1,
                name: "From Cache".to_owned(),
                user_id: "test_user".to_owned(),
                plaid_id: None,
            }],
        );

        let response = get_accounts_page(State(state)).await;

        let html = parse_html_document(response).await;
        let row_selector = Selector::parse("tbody th").unwrap();
        let names: Vec<String> = html
            .select(&row_selector)
            .map(|cell| cell.text().collect::<String>().trim().to_owned())
            .collect();
        assert_eq!(vec!["From Cache".to_owned()], names);
    }

    #[tokio::test]
    async fn shows_empty_state_when_no_accounts() {
        let state = get_test_state();

        let response = get_accounts_page(State(state)).await;

        let html = parse_html_document(response).await;
        let cell_selector = Selector::parse("tbody td").unwrap();
        let text: String = html
            .select(&cell_selector)
            .flat_map(|cell| cell.text())
            .collect();
        assert!(text.contains("No accounts found"), "got {text:?}");
    }
}
