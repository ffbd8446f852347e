//! Application router configuration.

use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    account::{
        create_account_endpoint, delete_account_endpoint, edit_account_endpoint,
        get_accounts_page, get_create_account_page, get_edit_account_page,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, edit_category_endpoint,
        get_categories_page, get_create_category_page, get_edit_category_page,
    },
    csv_import::{get_import_page, import_transactions_endpoint},
    dashboard::get_dashboard_page,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    transaction::{
        bulk_create_transactions_endpoint, create_transaction_endpoint,
        delete_transaction_endpoint, edit_transaction_endpoint, get_edit_transaction_page,
        get_new_transaction_page, get_transactions_page,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let view_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(endpoints::NEW_TRANSACTION_VIEW, get(get_new_transaction_page))
        .route(endpoints::EDIT_TRANSACTION_VIEW, get(get_edit_transaction_page))
        .route(endpoints::IMPORT_VIEW, get(get_import_page))
        .route(endpoints::ACCOUNTS_VIEW, get(get_accounts_page))
        .route(endpoints::NEW_ACCOUNT_VIEW, get(get_create_account_page))
        .route(endpoints::EDIT_ACCOUNT_VIEW, get(get_edit_account_page))
        .route(endpoints::CATEGORIES_VIEW, get(get_categories_page))
        .route(endpoints::NEW_CATEGORY_VIEW, get(get_create_category_page))
        .route(endpoints::EDIT_CATEGORY_VIEW, get(get_edit_category_page))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let api_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::TRANSACTIONS_API, post(create_transaction_endpoint))
        .route(
            endpoints::BULK_CREATE_TRANSACTIONS,
            post(bulk_create_transactions_endpoint),
        )
        .route(
            endpoints::PUT_TRANSACTION,
            put(edit_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(endpoints::ACCOUNTS_API, post(create_account_endpoint))
        .route(
            endpoints::PUT_ACCOUNT,
            put(edit_account_endpoint).delete(delete_account_endpoint),
        )
        .route(endpoints::CATEGORIES_API, post(create_category_endpoint))
        .route(
            endpoints::PUT_CATEGORY,
            put(edit_category_endpoint).delete(delete_category_endpoint),
        )
        .route(endpoints::IMPORT, post(import_transactions_endpoint));

    view_routes
        .merge(api_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, Html("I'm a teapot")).into_response()
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}
