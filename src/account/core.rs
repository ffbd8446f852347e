use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::AccountId};

/// A bank account or credit card that transactions are recorded against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The display name of the account.
    pub name: String,
    /// The id of the user that owns the account.
    pub user_id: String,
    /// The id of the account at the upstream bank aggregator, if linked.
    pub plaid_id: Option<String>,
}

/// Create the account table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            user_id TEXT NOT NULL,
            plaid_id TEXT
        )",
        (),
    )?;

    Ok(())
}

/// Map a database row to an [Account].
pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;
    let user_id = row.get(2)?;
    let plaid_id = row.get(3)?;

    Ok(Account {
        id,
        name,
        user_id,
        plaid_id,
    })
}

/// Retrieve an account from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid account,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_account(id: AccountId, connection: &Connection) -> Result<Account, Error> {
    let account = connection
        .prepare("SELECT id, name, user_id, plaid_id FROM account WHERE id = :id")?
        .query_one(&[(":id", &id)], map_row_to_account)?;

    Ok(account)
}

/// Retrieve all accounts from the database, ordered by name.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_all_accounts(connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare("SELECT id, name, user_id, plaid_id FROM account ORDER BY name ASC")?
        .query_map([], map_row_to_account)?
        .map(|account| account.map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod create_table_tests {
    use rusqlite::Connection;

    use super::create_account_table;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), create_account_table(&connection));
    }
}
