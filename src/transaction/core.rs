use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::{AccountId, CategoryId, TransactionId},
    miliunits::Miliunits,
};

/// A single movement of money into or out of an account.
///
/// Positive amounts are income, negative amounts are expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The id for the transaction.
    pub id: TransactionId,
    /// The account the money moved into or out of.
    pub account_id: AccountId,
    /// The category of the transaction, if any.
    pub category_id: Option<CategoryId>,
    /// When the transaction happened.
    pub date: Date,
    /// The amount of money in miliunits.
    pub amount: Miliunits,
    /// Who the money went to or came from.
    pub payee: String,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// The fields needed to insert a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    /// The account the money moved into or out of.
    pub account_id: AccountId,
    /// The category of the transaction, if any.
    pub category_id: Option<CategoryId>,
    /// When the transaction happened.
    pub date: Date,
    /// The amount of money in miliunits.
    pub amount: Miliunits,
    /// Who the money went to or came from.
    pub payee: String,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER NOT NULL,
                category_id INTEGER,
                date TEXT NOT NULL,
                amount INTEGER NOT NULL,
                payee TEXT NOT NULL,
                notes TEXT,
                FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    // Add composite index used by the transactions page filters and the dashboard.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_date_account ON \"transaction\"(date, account_id);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Transaction].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let account_id = row.get(1)?;
    let category_id = row.get(2)?;
    let date = row.get(3)?;
    let amount = row.get(4)?;
    let payee = row.get(5)?;
    let notes = row.get(6)?;

    Ok(Transaction {
        id,
        account_id,
        category_id,
        date,
        amount,
        payee,
        notes,
    })
}

/// Create a new transaction in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAccount] or [Error::InvalidCategory] if a referenced id
///   does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    new_transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (account_id, category_id, date, amount, payee, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, account_id, category_id, date, amount, payee, notes",
        )?
        .query_row(
            params![
                new_transaction.account_id,
                new_transaction.category_id,
                new_transaction.date,
                new_transaction.amount,
                new_transaction.payee,
                new_transaction.notes,
            ],
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => foreign_key_error(new_transaction, connection),
            error => error.into(),
        })?;

    Ok(transaction)
}

/// SQLite does not report which foreign key failed, so check the account
/// first to pick the more helpful error.
fn foreign_key_error(new_transaction: &NewTransaction, connection: &Connection) -> Error {
    let account_exists = connection
        .query_row(
            "SELECT COUNT(id) FROM account WHERE id = ?1",
            params![new_transaction.account_id],
            |row| row.get::<_, i64>(0),
        )
        .map(|count| count > 0)
        .unwrap_or(false);

    if account_exists {
        Error::InvalidCategory(new_transaction.category_id)
    } else {
        Error::InvalidAccount(Some(new_transaction.account_id))
    }
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, account_id, category_id, date, amount, payee, notes \
            FROM \"transaction\" WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u64, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|count| count as u64)
        .map_err(|error| error.into())
}
