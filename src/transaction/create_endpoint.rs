//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    cache::{MutationKind, QueryCache},
    database_id::{AccountId, CategoryId},
    endpoints,
    miliunits::Miliunits,
    timezone::today,
    transaction::{NewTransaction, create_transaction},
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The cache to invalidate after a successful write.
    pub query_cache: QueryCache,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
            query_cache: state.query_cache.clone(),
        }
    }
}

/// Whether the form describes money leaving or entering the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormTransactionType {
    Expense,
    Income,
}

/// The form data for creating or editing a transaction.
///
/// The amount is entered unsigned; the sign comes from `type_`.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    pub type_: FormTransactionType,
    pub amount: f64,
    pub date: Date,
    pub payee: String,
    pub notes: Option<String>,
    pub account_id: AccountId,
    pub category_id: Option<CategoryId>,
}

impl TransactionForm {
    /// Validate the form against `max_date` and convert it into the fields
    /// for a database insert.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::FutureDate] if the date is after `max_date`,
    /// - or [Error::InvalidAmount] if the amount cannot be converted to
    ///   miliunits.
    pub fn into_new_transaction(self, max_date: Date) -> Result<NewTransaction, Error> {
        if self.date > max_date {
            return Err(Error::FutureDate(self.date));
        }

        let magnitude = Miliunits::from_decimal(self.amount.abs())?;
        let amount = match self.type_ {
            FormTransactionType::Expense => Miliunits::ZERO - magnitude,
            FormTransactionType::Income => magnitude,
        };

        Ok(NewTransaction {
            account_id: self.account_id,
            category_id: self.category_id,
            date: self.date,
            amount,
            payee: self.payee,
            notes: self.notes.filter(|notes| !notes.trim().is_empty()),
        })
    }
}

/// A route handler for creating a new transaction, redirects to the
/// transactions view on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let new_transaction = match form.into_new_transaction(today(&state.local_timezone)) {
        Ok(new_transaction) => new_transaction,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_transaction(&new_transaction, &connection) {
        Ok(_) => {
            state
                .query_cache
                .invalidate(MutationKind::CreateTransaction);

            (
                HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not create transaction with {new_transaction:?}: {error}");
            error.into_alert_response()
        }
    }
}
