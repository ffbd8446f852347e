use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::CategoryId};

/// A label for grouping transactions, e.g. "Food" or "Rent".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// The id for the category.
    pub id: CategoryId,
    /// The display name of the category.
    pub name: String,
    /// The id of the user that owns the category.
    pub user_id: String,
    /// The id of the category at the upstream bank aggregator, if linked.
    pub plaid_id: Option<String>,
}

/// Create the category table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            user_id TEXT NOT NULL,
            plaid_id TEXT
        )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Category].
pub fn map_row_to_category(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;
    let user_id = row.get(2)?;
    let plaid_id = row.get(3)?;

    Ok(Category {
        id,
        name,
        user_id,
        plaid_id,
    })
}

/// Retrieve a category from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid category,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_category(id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    let category = connection
        .prepare("SELECT id, name, user_id, plaid_id FROM category WHERE id = :id")?
        .query_one(&[(":id", &id)], map_row_to_category)?;

    Ok(category)
}

/// Retrieve all categories from the database, ordered by name.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, user_id, plaid_id FROM category ORDER BY name ASC")?
        .query_map([], map_row_to_category)?
        .map(|category| category.map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod category_query_tests {
    use rusqlite::{Connection, params};

    use crate::{Error, db::initialize};

    use super::{Category, get_all_categories, get_category};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn insert_category(name: &str, connection: &Connection) -> Category {
        connection
            .execute(
                "INSERT INTO category (name, user_id) VALUES (?1, ?2)",
                params![name, "test_user"],
            )
            .unwrap();

        Category {
            id: connection.last_insert_rowid(),
            name: name.to_owned(),
            user_id: "test_user".to_owned(),
            plaid_id: None,
        }
    }

    #[test]
    fn get_category_returns_matching_row() {
        let conn = get_test_connection();
        let want = insert_category("Food", &conn);

        assert_eq!(Ok(want), get_category(1, &conn));
    }

    #[test]
    fn get_category_returns_not_found_for_missing_id() {
        let conn = get_test_connection();

        assert_eq!(Err(Error::NotFound), get_category(42, &conn));
    }

    #[test]
    fn get_all_categories_orders_by_name() {
        let conn = get_test_connection();
        let rent = insert_category("Rent", &conn);
        let food = insert_category("Food", &conn);

        assert_eq!(Ok(vec![food, rent]), get_all_categories(&conn));
    }
}
