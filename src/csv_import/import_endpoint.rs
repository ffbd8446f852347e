//! Defines the endpoint for importing transactions from an uploaded CSV file.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Multipart, State, multipart::Field},
    http::StatusCode,
    response::Response,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    cache::{MutationKind, QueryCache},
    csv_import::csv::parse_transactions_csv,
    database_id::AccountId,
    html::render,
    transaction::insert_transactions,
};

/// The state needed for importing transactions.
#[derive(Debug, Clone)]
pub struct ImportState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The cache to invalidate after a successful import.
    pub query_cache: QueryCache,
}

impl FromRef<AppState> for ImportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_cache: state.query_cache.clone(),
        }
    }
}

/// A route handler for importing transactions from an uploaded CSV file.
///
/// Expects a multipart form with an `account_id` field selecting the account
/// the rows belong to and a `file` field holding the CSV data. The import is
/// atomic: either every row is inserted or none are.
pub async fn import_transactions_endpoint(
    State(state): State<ImportState>,
    mut multipart: Multipart,
) -> Result<Response, Response> {
    let start_time = std::time::Instant::now();
    let mut account_id: Option<AccountId> = None;
    let mut csv_data: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(error) => {
                tracing::error!("could not read multipart field: {error}");
                return Err(Error::MultipartError(error.to_string()).into_alert_response());
            }
        };

        match field.name() {
            Some("account_id") => {
                account_id = Some(
                    parse_account_id_field(field)
                        .await
                        .map_err(|error| error.into_alert_response())?,
                );
            }
            Some("file") => {
                csv_data = Some(
                    parse_csv_field(field)
                        .await
                        .map_err(|error| error.into_alert_response())?,
                );
            }
            name => tracing::debug!("ignoring unexpected multipart field {name:?}"),
        }
    }

    let account_id =
        account_id.ok_or_else(|| Error::InvalidAccount(None).into_alert_response())?;
    let csv_data = csv_data.ok_or_else(|| Error::NotCSV.into_alert_response())?;

    let new_transactions = parse_transactions_csv(&csv_data, account_id)
        .inspect_err(|error| tracing::debug!("could not parse uploaded CSV: {error}"))
        .map_err(|error| error.into_alert_response())?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError.into_alert_response()
    })?;

    let count = insert_transactions(&new_transactions, &connection)
        .inspect_err(|error| tracing::error!("could not import transactions: {error}"))
        .map_err(|error| error.into_alert_response())?;

    state
        .query_cache
        .invalidate(MutationKind::BulkCreateTransactions);

    let duration = start_time.elapsed();
    let alert = Alert::Success {
        message: "Import complete".to_owned(),
        details: format!("Imported {count} transactions in {}ms.", duration.as_millis()),
    };

    Ok(render(StatusCode::CREATED, alert.into_html()))
}

async fn parse_account_id_field(field: Field<'_>) -> Result<AccountId, Error> {
    let text = field
        .text()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))?;

    text.parse().map_err(|_| Error::InvalidAccount(None))
}

async fn parse_csv_field(field: Field<'_>) -> Result<String, Error> {
    if field.content_type() != Some("text/csv") {
        return Err(Error::NotCSV);
    }

    let data = field
        .text()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))?;

    tracing::debug!("received CSV upload of {} bytes", data.len());

    Ok(data)
}
