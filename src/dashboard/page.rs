//! Defines the route handler for the dashboard page.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, Duration};

use crate::{
    AppState, Error,
    cache::{CacheKey, QueryCache},
    dashboard::{
        aggregation::{Summary, get_summary},
        charts::{DashboardChart, chart_script, chart_view, spending_chart},
    },
    endpoints,
    html::{HeadElement, LINK_STYLE, base, format_currency, render},
    navigation::NavBar,
    timezone::today,
};

/// How many days the summary window covers when no bounds are given.
const DEFAULT_PERIOD_DAYS: i64 = 30;

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for aggregating transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The cache holding the most recently computed summary.
    pub query_cache: QueryCache,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
            query_cache: state.query_cache.clone(),
        }
    }
}

/// The date window for the dashboard summary.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// The first day of the window (inclusive).
    pub from: Option<Date>,
    /// The last day of the window (inclusive).
    pub to: Option<Date>,
}

/// Display a page summarising the user's finances over a date window.
///
/// The computed summary is cached under [CacheKey::Summary]. A cached summary
/// is only served when its window matches the requested one, otherwise it is
/// recomputed and replaces the cached entry.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let to = query.to.unwrap_or_else(|| today(&state.local_timezone));
    let from = query
        .from
        .unwrap_or_else(|| to - Duration::days(DEFAULT_PERIOD_DAYS));

    if let Some(summary) = state.query_cache.get::<Summary>(CacheKey::Summary)
        && summary.from == from
        && summary.to == to
    {
        return render(StatusCode::OK, dashboard_view(&summary));
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_summary(from, to, &connection) {
        Ok(summary) => {
            state.query_cache.put(CacheKey::Summary, &summary);

            render(StatusCode::OK, dashboard_view(&summary))
        }
        Err(error) => {
            tracing::error!("could not compute the dashboard summary: {error}");
            error.into_response()
        }
    }
}

fn dashboard_view(summary: &Summary) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    if summary.transaction_count == 0 {
        let content = html!(
            (nav_bar)

            div class="flex flex-col items-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
            {
                h2 class="text-xl font-bold" { "Nothing here yet..." }

                p
                {
                    "Totals will show up here once you add some transactions. "
                    "You can add transactions "
                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE) { "manually" }
                    " or by "
                    a href=(endpoints::IMPORT_VIEW) class=(LINK_STYLE) { "importing a CSV file" }
                    "."
                }
            }
        );

        return base("Dashboard", &[], &content);
    }

    let chart = DashboardChart {
        id: "spending-by-category-chart",
        options: spending_chart(&summary.spending_by_category).to_string(),
    };

    let content = html!(
        (nav_bar)

        div
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            p class="text-sm py-2" { "Showing " (summary.from) " to " (summary.to) }

            section class="w-full grid grid-cols-1 md:grid-cols-3 gap-4 mb-4"
            {
                (summary_card("Income", summary.income.to_decimal()))
                (summary_card("Expenses", summary.expenses.to_decimal()))
                (summary_card("Remaining", summary.remaining.to_decimal()))
            }

            section class="w-full mx-auto mb-4"
            {
                (chart_view(&chart))
            }
        }
    );

    let scripts = [
        HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
        chart_script(&chart),
    ];

    base("Dashboard", &scripts, &content)
}

fn summary_card(label: &str, amount: f64) -> Markup {
    let amount_style = if amount < 0.0 {
        "text-2xl font-bold text-red-600 dark:text-red-500"
    } else {
        "text-2xl font-bold text-green-600 dark:text-green-500"
    };

    html!(
        div class="rounded-lg bg-gray-50 dark:bg-gray-800 p-4"
        {
            p class="text-sm text-gray-600 dark:text-gray-400" { (label) }
            p class=(amount_style) { (format_currency(amount)) }
        }
    )
}

#[cfg(test)]
mod dashboard_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum_extra::extract::Query;
    use rusqlite::{Connection, params};
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        cache::{CacheKey, QueryCache},
        dashboard::aggregation::Summary,
        db::initialize,
        test_utils::{assert_status_ok, assert_valid_html, parse_html_document},
    };

    use super::{DashboardQuery, DashboardState, get_dashboard_page};

    fn get_test_state() -> DashboardState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        connection
            .execute(
                "INSERT INTO account (name, user_id) VALUES (?1, ?2)",
                params!["Checking", "user_1"],
            )
            .unwrap();
        connection
            .execute(
                "INSERT INTO category (name, user_id) VALUES (?1, ?2)",
                params!["Rent", "user_1"],
            )
            .unwrap();

        DashboardState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
            query_cache: QueryCache::new(),
        }
    }

    fn insert_transaction(state: &DashboardState, date: &str, amount: i64, category_id: Option<i64>) {
        state
            .db_connection
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO \"transaction\" (account_id, category_id, date, amount, payee)
                VALUES (1, ?1, ?2, ?3, 'Payee')",
                params![category_id, date, amount],
            )
            .unwrap();
    }

    fn window_query() -> Query<DashboardQuery> {
        Query(DashboardQuery {
            from: Some(date!(2026 - 03 - 01)),
            to: Some(date!(2026 - 03 - 31)),
        })
    }

    #[tokio::test]
    async fn renders_totals_and_spending_chart() {
        let state = get_test_state();
        insert_transaction(&state, "2026-03-01", 2_500_000, None);
        insert_transaction(&state, "2026-03-03", -500_000, Some(1));

        let response = get_dashboard_page(State(state), window_query()).await;

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let chart_selector = Selector::parse("#spending-by-category-chart").unwrap();
        assert!(html.select(&chart_selector).next().is_some());

        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("$2,500.00"), "missing income total: {text}");
        assert!(text.contains("$2,000.00"), "missing remaining total: {text}");
    }

    #[tokio::test]
    async fn caches_summary_for_requested_window() {
        let state = get_test_state();
        insert_transaction(&state, "2026-03-03", -500_000, Some(1));

        get_dashboard_page(State(state.clone()), window_query()).await;

        let cached = state
            .query_cache
            .get::<Summary>(CacheKey::Summary)
            .expect("summary should be cached after the first read");
        assert_eq!(date!(2026 - 03 - 01), cached.from);
        assert_eq!(date!(2026 - 03 - 31), cached.to);
        assert_eq!(1, cached.transaction_count);
    }

    #[tokio::test]
    async fn cached_summary_for_other_window_is_recomputed() {
        let state = get_test_state();
        insert_transaction(&state, "2026-03-03", -500_000, Some(1));
        get_dashboard_page(State(state.clone()), window_query()).await;

        let response = get_dashboard_page(
            State(state.clone()),
            Query(DashboardQuery {
                from: Some(date!(2026 - 04 - 01)),
                to: Some(date!(2026 - 04 - 30)),
            }),
        )
        .await;

        assert_status_ok(&response);
        let cached = state
            .query_cache
            .get::<Summary>(CacheKey::Summary)
            .expect("summary should be cached after the second read");
        assert_eq!(date!(2026 - 04 - 01), cached.from);
        assert_eq!(0, cached.transaction_count);
    }

    #[tokio::test]
    async fn stale_cached_summary_is_served_for_matching_window() {
        // Transaction mutations do not invalidate the summary, so new rows do
        // not show up until the cached entry is replaced.
        let state = get_test_state();
        insert_transaction(&state, "2026-03-03", -500_000, Some(1));
        get_dashboard_page(State(state.clone()), window_query()).await;

        insert_transaction(&state, "2026-03-04", -100_000, Some(1));

        let response = get_dashboard_page(State(state.clone()), window_query()).await;

        assert_status_ok(&response);
        let cached = state
            .query_cache
            .get::<Summary>(CacheKey::Summary)
            .unwrap();
        assert_eq!(1, cached.transaction_count, "cached summary should be served unchanged");
    }

    #[tokio::test]
    async fn prompts_for_transactions_when_window_is_empty() {
        let state = get_test_state();

        let response = get_dashboard_page(State(state), window_query()).await;

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Nothing here yet"), "missing prompt: {text}");
    }
}
