//! Tally is a web app for tracking personal finances: accounts, categories
//! and transactions managed through a browser UI.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use time::Date;
use tokio::signal;

mod account;
mod alert;
mod app_state;
mod cache;
mod category;
mod csv_import;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod logging;
mod miliunits;
mod navigation;
mod not_found;
mod pagination;
mod routing;
mod seed;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use miliunits::Miliunits;
pub use pagination::PaginationConfig;
pub use routing::build_router;
pub use seed::{SEED_USER_ID, SeedConfig, seed_database};

use crate::{
    alert::Alert,
    database_id::{AccountId, CategoryId},
    html::render,
    internal_server_error::{InternalServerErrorPageTemplate, render_internal_server_error},
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// A date in the future was used to create or edit a transaction.
    ///
    /// Transactions record events that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// The account ID used to create a transaction did not match a valid
    /// account.
    #[error("the account ID does not refer to a valid account")]
    InvalidAccount(Option<AccountId>),

    /// The category ID used to create a transaction did not match a valid
    /// category.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// A currency amount could not be represented in miliunits.
    ///
    /// This happens for non-finite floats (NaN, infinity) and for magnitudes
    /// that overflow a 64-bit integer once scaled.
    #[error("{0} cannot be converted to miliunits")]
    InvalidAmount(f64),

    /// An empty string was used for an account or category name.
    #[error("name cannot be empty")]
    EmptyName,

    /// The specified account name already exists in the database.
    #[error("the account \"{0}\" already exists in the database")]
    DuplicateAccountName(String),

    /// The specified category name already exists in the database.
    #[error("the category \"{0}\" already exists in the database")]
    DuplicateCategoryName(String),

    /// Tried to delete a transaction that does not exist.
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a transaction that does not exist.
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete an account that does not exist.
    #[error("tried to delete an account that is not in the database")]
    DeleteMissingAccount,

    /// Tried to update an account that does not exist.
    #[error("tried to update an account that is not in the database")]
    UpdateMissingAccount,

    /// Tried to delete a category that does not exist.
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to update a category that does not exist.
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// The multipart form could not be parsed as a list of CSV files.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// The multipart form did not contain a CSV file.
    #[error("File is not a CSV")]
    NotCSV,

    /// The CSV had issues that prevented it from being parsed.
    #[error("Could not parse the CSV file: {0}")]
    InvalidCSV(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// An error occurred while serializing a struct as JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed. The name that
            // caused the clash is filled in by the call site that has it.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("account.name") =>
            {
                Error::DuplicateAccountName(String::new())
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("category.name") =>
            {
                Error::DuplicateCategoryName(String::new())
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezone(timezone) => {
                render_internal_server_error(InternalServerErrorPageTemplate {
                    description: "Invalid Timezone Settings",
                    fix: &format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                })
            }
            Error::DatabaseLockError => render_internal_server_error(Default::default()),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                render_internal_server_error(Default::default())
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        match self {
            Error::InvalidTimezone(timezone) => render(
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                }
                .into_html(),
            ),
            Error::FutureDate(date) => render(
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid transaction date".to_owned(),
                    details: format!(
                        "{date} is a date in the future, which is not allowed. Change the date to \
                        today or earlier."
                    ),
                }
                .into_html(),
            ),
            Error::InvalidAccount(account_id) => render(
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid account ID".to_owned(),
                    details: format!("Could not find an account with the ID {account_id:?}"),
                }
                .into_html(),
            ),
            Error::InvalidCategory(category_id) => render(
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid category ID".to_owned(),
                    details: format!("Could not find a category with the ID {category_id:?}"),
                }
                .into_html(),
            ),
            Error::InvalidAmount(amount) => render(
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid amount".to_owned(),
                    details: format!("{amount} is not a valid currency amount."),
                }
                .into_html(),
            ),
            Error::EmptyName => render(
                StatusCode::BAD_REQUEST,
                Alert::ErrorSimple {
                    message: "Name cannot be empty".to_owned(),
                }
                .into_html(),
            ),
            Error::UpdateMissingTransaction => render(
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update transaction".to_owned(),
                    details: "The transaction could not be found.".to_owned(),
                }
                .into_html(),
            ),
            Error::DeleteMissingTransaction => render(
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete transaction".to_owned(),
                    details: "The transaction could not be found. \
                    Try refreshing the page to see if the transaction has already been deleted."
                        .to_owned(),
                }
                .into_html(),
            ),
            Error::UpdateMissingAccount => render(
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update account".to_owned(),
                    details: "The account could not be found.".to_owned(),
                }
                .into_html(),
            ),
            Error::DeleteMissingAccount => render(
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete account".to_owned(),
                    details: "The account could not be found. \
                    Try refreshing the page to see if the account has already been deleted."
                        .to_owned(),
                }
                .into_html(),
            ),
            Error::UpdateMissingCategory => render(
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update category".to_owned(),
                    details: "The category could not be found.".to_owned(),
                }
                .into_html(),
            ),
            Error::DeleteMissingCategory => render(
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete category".to_owned(),
                    details: "The category could not be found. \
                    Try refreshing the page to see if the category has already been deleted."
                        .to_owned(),
                }
                .into_html(),
            ),
            Error::DuplicateAccountName(name) => render(
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Duplicate Account Name".to_owned(),
                    details: format!(
                        "The account {name} already exists in the database. \
                        Choose a different account name, or edit or delete the existing account.",
                    ),
                }
                .into_html(),
            ),
            Error::DuplicateCategoryName(name) => render(
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Duplicate Category Name".to_owned(),
                    details: format!(
                        "The category {name} already exists in the database. \
                        Choose a different category name, or edit or delete the existing category.",
                    ),
                }
                .into_html(),
            ),
            Error::NotCSV => render(
                StatusCode::BAD_REQUEST,
                Alert::ErrorSimple {
                    message: "File type must be CSV.".to_owned(),
                }
                .into_html(),
            ),
            Error::InvalidCSV(details) => render(
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Could not parse the CSV file".to_owned(),
                    details,
                }
                .into_html(),
            ),
            Error::MultipartError(details) => render(
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Could not read the uploaded form".to_owned(),
                    details,
                }
                .into_html(),
            ),
            _ => render(
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details: "An unexpected error occurred, check the server logs for more details."
                        .to_owned(),
                }
                .into_html(),
            ),
        }
    }
}
