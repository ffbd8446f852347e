//! Displays transactions in a paginated, filterable table.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, html};
use rusqlite::{Connection, ToSql};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    account::{Account, get_all_accounts},
    cache::{CacheKey, QueryCache},
    database_id::{AccountId, TransactionId},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        edit_delete_action_links, format_currency, render,
    },
    miliunits::Miliunits,
    navigation::NavBar,
    pagination::{Page, PaginationConfig, create_pagination_indicators, pagination_controls},
};

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The cache that the default listing is read through.
    pub query_cache: QueryCache,
    /// The config that controls how to display pages of data.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_cache: state.query_cache.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query parameters accepted by the transactions page.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct TransactionsQuery {
    /// The page number to display, 1-indexed.
    pub page: Option<u64>,
    /// How many transactions to show per page.
    pub page_size: Option<u64>,
    /// Only show transactions for this account.
    pub account_id: Option<AccountId>,
    /// Only show transactions on or after this date.
    pub from: Option<Date>,
    /// Only show transactions on or before this date.
    pub to: Option<Date>,
}

impl TransactionsQuery {
    fn has_filters(&self) -> bool {
        self.account_id.is_some() || self.from.is_some() || self.to.is_some()
    }
}

/// A transaction row joined with its account and category names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionTableRow {
    pub id: TransactionId,
    pub date: Date,
    pub payee: String,
    pub notes: Option<String>,
    pub amount: Miliunits,
    pub account_name: String,
    pub category_name: Option<String>,
}

/// The data cached for the default (unfiltered, first page) listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CachedListing {
    rows: Vec<TransactionTableRow>,
    page_count: u64,
}

/// A route handler that renders the transactions page.
pub async fn get_transactions_page(
    State(state): State<TransactionsPageState>,
    Query(query): Query<TransactionsQuery>,
) -> Response {
    let page = Page {
        number: query.page.unwrap_or(state.pagination_config.default_page),
        size: query
            .page_size
            .unwrap_or(state.pagination_config.default_page_size),
    };
    // Only the default view is cached; filtered or paged views go straight
    // to the database.
    let is_default_view = !query.has_filters()
        && page.number == state.pagination_config.default_page
        && page.size == state.pagination_config.default_page_size;

    let cached = if is_default_view {
        state.query_cache.get::<CachedListing>(CacheKey::Transactions)
    } else {
        None
    };

    let (listing, accounts) = {
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
                tracing::error!("Failed to retrieve accounts for filter controls: {error}");
                return error.into_response();
            }
        };

        let listing = match cached {
            Some(listing) => listing,
            None => {
                let row_count = match count_filtered_transactions(&query, &connection) {
                    Ok(count) => count,
                    Err(error) => {
                        tracing::error!("Failed to count transactions: {error}");
                        return error.into_response();
                    }
                };

                let rows = match get_transaction_rows(&query, page, &connection) {
                    Ok(rows) => rows,
                    Err(error) => {
                        tracing::error!("Failed to retrieve transactions: {error}");
                        return error.into_response();
                    }
                };

                let listing = CachedListing {
                    rows,
                    page_count: page.count_pages(row_count),
                };

                if is_default_view {
                    state.query_cache.put(CacheKey::Transactions, &listing);
                }

                listing
            }
        };

        (listing, accounts)
    };

    let indicators = create_pagination_indicators(
        page.number,
        listing.page_count,
        state.pagination_config.max_pages,
    );
    let controls = pagination_controls(&indicators, |page_number| {
        page_url(page_number, &query)
    });

    render(
        StatusCode::OK,
        transactions_view(&listing.rows, &accounts, &query, &controls),
    )
}

fn page_url(page_number: u64, query: &TransactionsQuery) -> String {
    let mut url = format!("{}?page={page_number}", endpoints::TRANSACTIONS_VIEW);

    if let Some(account_id) = query.account_id {
        url.push_str(&format!("&account_id={account_id}"));
    }

    if let Some(from) = query.from {
        url.push_str(&format!("&from={from}"));
    }

    if let Some(to) = query.to {
        url.push_str(&format!("&to={to}"));
    }

    url
}

const FILTER_SQL: &str = "FROM \"transaction\" t
    INNER JOIN account a ON a.id = t.account_id
    LEFT JOIN category c ON c.id = t.category_id
    WHERE (:account_id IS NULL OR t.account_id = :account_id)
      AND (:from IS NULL OR t.date >= :from)
      AND (:to IS NULL OR t.date <= :to)";

fn count_filtered_transactions(
    query: &TransactionsQuery,
    connection: &Connection,
) -> Result<u64, Error> {
    let sql = format!("SELECT COUNT(t.id) {FILTER_SQL}");

    connection
        .prepare(&sql)?
        .query_one(
            &[
                (":account_id", &query.account_id as &dyn ToSql),
                (":from", &query.from),
                (":to", &query.to),
            ],
            |row| row.get::<_, i64>(0),
        )
        .map(|count| count as u64)
        .map_err(Error::from)
}

fn get_transaction_rows(
    query: &TransactionsQuery,
    page: Page,
    connection: &Connection,
) -> Result<Vec<TransactionTableRow>, Error> {
    let sql = format!(
        "SELECT t.id, t.date, t.payee, t.notes, t.amount, a.name, c.name {FILTER_SQL}
        ORDER BY t.date DESC, t.id DESC
        LIMIT :limit OFFSET :offset"
    );
    // SQLite parameters are signed 64-bit.
    let limit = page.size as i64;
    let offset = page.offset() as i64;

    connection
        .prepare(&sql)?
        .query_map(
            &[
                (":account_id", &query.account_id as &dyn ToSql),
                (":from", &query.from),
                (":to", &query.to),
                (":limit", &limit),
                (":offset", &offset),
            ],
            |row| {
                Ok(TransactionTableRow {
                    id: row.get(0)?,
                    date: row.get(1)?,
                    payee: row.get(2)?,
                    notes: row.get(3)?,
                    amount: row.get(4)?,
                    account_name: row.get(5)?,
                    category_name: row.get(6)?,
                })
            },
        )?
        .map(|row| row.map_err(Error::from))
        .collect()
}

fn transactions_view(
    rows: &[TransactionTableRow],
    accounts: &[Account],
    query: &TransactionsQuery,
    pagination: &Markup,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let table_row = |row: &TransactionTableRow| {
        let edit_url = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, row.id);
        let delete_url = format_endpoint(endpoints::DELETE_TRANSACTION, row.id);
        let amount_class = if row.amount.is_expense() {
            "px-6 py-4 text-right text-red-600 dark:text-red-400"
        } else {
            "px-6 py-4 text-right text-green-600 dark:text-green-400"
        };

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    time datetime=(row.date) { (row.date) }
                }

                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (row.payee)

                    @if let Some(notes) = &row.notes {
                        p class="text-xs font-normal text-gray-500 dark:text-gray-400"
                        {
                            (notes)
                        }
                    }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (row.category_name.as_deref().unwrap_or("Uncategorised"))
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (row.account_name)
                }

                td class=(amount_class)
                {
                    (format_currency(row.amount.to_decimal()))
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (edit_delete_action_links(
                            &edit_url,
                            &delete_url,
                            "Are you sure you want to delete this transaction? This cannot be undone.",
                            "closest tr",
                            "delete",
                        ))
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Transactions" }

                    div class="flex gap-4"
                    {
                        a href=(endpoints::IMPORT_VIEW) class=(LINK_STYLE) { "Import" }
                        a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                        {
                            "Add Transaction"
                        }
                    }
                }

                (filter_controls(accounts, query))

                section class="w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Payee" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                th scope="col" class="px-6 py-3 text-right" { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                (table_row(row))
                            }

                            @if rows.is_empty() {
                                tr
                                {
                                    td
                                        colspan="6"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No transactions found. Create one "
                                        a
                                            href=(endpoints::NEW_TRANSACTION_VIEW)
                                            class=(LINK_STYLE)
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

                (pagination)
            }
        }
    );

    base("Transactions", &[], &content)
}

fn filter_controls(accounts: &[Account], query: &TransactionsQuery) -> Markup {
    html!(
        form
            method="get"
            action=(endpoints::TRANSACTIONS_VIEW)
            class="flex flex-wrap items-end gap-4"
        {
            div
            {
                label for="account_id" class=(FORM_LABEL_STYLE) { "Account" }

                select name="account_id" id="account_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[query.account_id.is_none()] { "All accounts" }

                    @for account in accounts {
                        option
                            value=(account.id)
                            selected[query.account_id == Some(account.id)]
                        {
                            (account.name)
                        }
                    }
                }
            }

            div
            {
                label for="from" class=(FORM_LABEL_STYLE) { "From" }

                input
                    name="from"
                    id="from"
                    type="date"
                    value=[query.from.map(|date| date.to_string())]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="to" class=(FORM_LABEL_STYLE) { "To" }

                input
                    name="to"
                    id="to"
                    type="date"
                    value=[query.to.map(|date| date.to_string())]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) style="width: auto" { "Filter" }
        }
    )
}

#[cfg(test)]
mod transactions_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum_extra::extract::Query;
    use rusqlite::Connection;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        cache::{CacheKey, QueryCache},
        db::initialize,
        pagination::PaginationConfig,
        test_utils::{assert_status_ok, assert_valid_html, parse_html_document},
    };

    use super::{CachedListing, TransactionsPageState, TransactionsQuery, get_transactions_page};

    fn get_test_state() -> TransactionsPageState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn.execute(
            "INSERT INTO account (name, user_id) VALUES ('Checking', 'test_user')",
            (),
        )
        .unwrap();
        conn.execute(
            "INSERT INTO account (name, user_id) VALUES ('Savings', 'test_user')",
            (),
        )
        .unwrap();
        conn.execute(
            "INSERT INTO category (name, user_id) VALUES ('Food', 'test_user')",
            (),
        )
        .unwrap();

        TransactionsPageState {
            db_connection: Arc::new(Mutex::new(conn)),
            query_cache: QueryCache::new(),
            pagination_config: PaginationConfig::default(),
        }
    }

    fn insert_transaction(
        state: &TransactionsPageState,
        date: &str,
        payee: &str,
        account_id: i64,
        category_id: Option<i64>,
    ) {
        let connection = state.db_connection.lock().unwrap();
        connection
            .execute(
                "INSERT INTO \"transaction\" (date, amount, payee, account_id, category_id)
                 VALUES (?1, -10000, ?2, ?3, ?4)",
                rusqlite::params![date, payee, account_id, category_id],
            )
            .unwrap();
    }

    fn payees(html: &scraper::Html) -> Vec<String> {
        let selector = Selector::parse("tbody th").unwrap();
        html.select(&selector)
            .map(|cell| {
                cell.text()
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_owned()
            })
            .collect()
    }

    #[tokio::test]
    async fn lists_transactions_newest_first() {
        let state = get_test_state();
        insert_transaction(&state, "2026-08-01", "Cafe", 1, Some(1));
        insert_transaction(&state, "2026-08-05", "Grocer", 1, None);

        let response =
            get_transactions_page(State(state), Query(TransactionsQuery::default())).await;

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(vec!["Grocer".to_owned(), "Cafe".to_owned()], payees(&html));
    }

    #[tokio::test]
    async fn filters_by_account() {
        let state = get_test_state();
        insert_transaction(&state, "2026-08-01", "Cafe", 1, None);
        insert_transaction(&state, "2026-08-02", "Interest", 2, None);

        let query = TransactionsQuery {
            account_id: Some(2),
            ..Default::default()
        };
        let response = get_transactions_page(State(state), Query(query)).await;

        let html = parse_html_document(response).await;
        assert_eq!(vec!["Interest".to_owned()], payees(&html));
    }

    #[tokio::test]
    async fn filters_by_date_range() {
        let state = get_test_state();
        insert_transaction(&state, "2026-07-01", "Old", 1, None);
        insert_transaction(&state, "2026-08-01", "InRange", 1, None);
        insert_transaction(&state, "2026-08-20", "TooNew", 1, None);

        let query = TransactionsQuery {
            from: Some(date!(2026 - 07 - 15)),
            to: Some(date!(2026 - 08 - 10)),
            ..Default::default()
        };
        let response = get_transactions_page(State(state), Query(query)).await;

        let html = parse_html_document(response).await;
        assert_eq!(vec!["InRange".to_owned()], payees(&html));
    }

    #[tokio::test]
    async fn caches_default_view_only() {
        let state = get_test_state();
        insert_transaction(&state, "2026-08-01", "Cafe", 1, None);

        get_transactions_page(State(state.clone()), Query(TransactionsQuery::default())).await;
        assert!(
            state
                .query_cache
                .get::<CachedListing>(CacheKey::Transactions)
                .is_some()
        );

        let state = get_test_state();
        insert_transaction(&state, "2026-08-01", "Cafe", 1, None);
        let filtered = TransactionsQuery {
            account_id: Some(1),
            ..Default::default()
        };
        get_transactions_page(State(state.clone()), Query(filtered)).await;
        assert!(
            state
                .query_cache
                .get::<CachedListing>(CacheKey::Transactions)
                .is_none()
        );
    }

    #[tokio::test]
    async fn second_page_shows_remaining_rows() {
        let state = get_test_state();
        for day in 1..=25 {
            insert_transaction(&state, &format!("2026-08-{day:02}"), "Cafe", 1, None);
        }

        let query = TransactionsQuery {
            page: Some(2),
            ..Default::default()
        };
        let response = get_transactions_page(State(state), Query(query)).await;

        let html = parse_html_document(response).await;
        assert_eq!(5, payees(&html).len());
    }
}
