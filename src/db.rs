//! Database initialization for the application's SQLite database.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error, account::create_account_table, category::create_category_table,
    transaction::create_transaction_table,
};

/// Create the application's tables if they do not exist yet.
///
/// Also enables foreign key enforcement, which SQLite leaves off by default.
/// The transaction table references the account and category tables, so the
/// cascade rules on those relations only apply once this has run.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_account_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
