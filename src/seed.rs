//! Filling the database with generated development data.
//!
//! Used by the seed binary to produce a database that exercises every page:
//! a fixed set of categories and accounts, and a few months of randomised
//! transactions.

use std::ops::RangeInclusive;

use rand::Rng;
use rusqlite::{Connection, params};
use time::{Date, Duration};

use crate::{Error, database_id::DatabaseId, miliunits::Miliunits};

/// The user that owns all seeded rows.
pub const SEED_USER_ID: &str = "user_seed";

/// The chance that a generated transaction is income rather than an expense.
const INCOME_PROBABILITY: f64 = 0.4;

/// The categories created by the seed tool.
const CATEGORY_NAMES: [&str; 8] = [
    "Food",
    "Rent",
    "Utilities",
    "Transportation",
    "Health",
    "Entertainment",
    "Shopping",
    "Miscellaneous",
];

/// The accounts created by the seed tool.
const ACCOUNT_NAMES: [&str; 2] = ["Checking", "Savings"];

const PAYEES: [&str; 6] = [
    "Greenfields Grocer",
    "Corner Cafe",
    "City Transit",
    "Acme Payroll",
    "Streamflix",
    "Hardware Barn",
];

/// The chance that a generated transaction carries a note.
const NOTES_PROBABILITY: f64 = 0.3;

const NOTES: [&str; 4] = [
    "Paid by card",
    "Split with flatmate",
    "Recurring payment",
    "Check receipt",
];

/// Controls the date window the seed tool fills with transactions.
#[derive(Debug, Clone)]
pub struct SeedConfig {
    /// The last day of the window (inclusive), normally today.
    pub end_date: Date,
    /// How many days to go back from `end_date`.
    pub days: i64,
}

impl SeedConfig {
    /// A window of the 90 days leading up to `end_date`.
    pub fn new(end_date: Date) -> Self {
        Self { end_date, days: 90 }
    }
}

/// The range generated transaction amounts are drawn from, in currency units.
fn amount_range(category_name: &str) -> RangeInclusive<f64> {
    match category_name {
        "Rent" => 90.0..=490.0,
        "Utilities" => 50.0..=250.0,
        "Food" => 10.0..=40.0,
        "Transportation" | "Health" => 15.0..=65.0,
        "Entertainment" | "Shopping" | "Miscellaneous" => 20.0..=120.0,
        _ => 10.0..=60.0,
    }
}

/// Replace the database contents with generated development data.
///
/// Clears transactions, accounts and categories in that order, then inserts
/// the fixed categories and accounts and one to four transactions for each
/// day of the configured window.
///
/// The delete and insert phases run as separate statements rather than one
/// SQL transaction, so an interrupted run leaves a partially seeded database.
/// Run the tool again to get back to a known state.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub fn seed_database(
    connection: &Connection,
    config: &SeedConfig,
    rng: &mut impl Rng,
) -> Result<u64, Error> {
    connection.execute("DELETE FROM \"transaction\"", [])?;
    connection.execute("DELETE FROM account", [])?;
    connection.execute("DELETE FROM category", [])?;

    let mut category_ids = Vec::with_capacity(CATEGORY_NAMES.len());

    for name in CATEGORY_NAMES {
        let id: DatabaseId = connection.query_one(
            "INSERT INTO category (name, user_id) VALUES (?1, ?2) RETURNING id",
            params![name, SEED_USER_ID],
            |row| row.get(0),
        )?;
        category_ids.push((id, name));
    }

    let mut account_ids = Vec::with_capacity(ACCOUNT_NAMES.len());

    for name in ACCOUNT_NAMES {
        let id: DatabaseId = connection.query_one(
            "INSERT INTO account (name, user_id) VALUES (?1, ?2) RETURNING id",
            params![name, SEED_USER_ID],
            |row| row.get(0),
        )?;
        account_ids.push(id);
    }

    let mut statement = connection.prepare(
        "INSERT INTO \"transaction\" (account_id, category_id, date, amount, payee, notes)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    let mut transaction_count = 0;

    for day_offset in 0..=config.days {
        let date = config.end_date - Duration::days(day_offset);
        let transactions_today = rng.gen_range(1..=4);

        for _ in 0..transactions_today {
            let (category_id, category_name) =
                category_ids[rng.gen_range(0..category_ids.len())];
            let account_id = account_ids[rng.gen_range(0..account_ids.len())];
            let payee = PAYEES[rng.gen_range(0..PAYEES.len())];

            let magnitude = rng.gen_range(amount_range(category_name));
            let signed = if rng.gen_bool(INCOME_PROBABILITY) {
                magnitude
            } else {
                -magnitude
            };
            let amount = Miliunits::from_decimal(signed)?;
            let notes = rng
                .gen_bool(NOTES_PROBABILITY)
                .then(|| NOTES[rng.gen_range(0..NOTES.len())]);

            statement.execute(params![account_id, category_id, date, amount, payee, notes])?;
            transaction_count += 1;
        }
    }

    Ok(transaction_count)
}

#[cfg(test)]
mod seed_database_tests {
    use rand::{SeedableRng, rngs::SmallRng};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::db::initialize;

    use super::{SeedConfig, amount_range, seed_database};

    fn get_seeded_connection(config: &SeedConfig) -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let mut rng = SmallRng::seed_from_u64(42);
        seed_database(&connection, config, &mut rng).expect("Could not seed database");

        connection
    }

    #[test]
    fn creates_fixed_accounts_and_categories() {
        let connection = get_seeded_connection(&SeedConfig::new(date!(2026 - 03 - 31)));

        let account_count: i64 = connection
            .query_one("SELECT COUNT(*) FROM account", [], |row| row.get(0))
            .unwrap();
        let category_count: i64 = connection
            .query_one("SELECT COUNT(*) FROM category", [], |row| row.get(0))
            .unwrap();

        assert_eq!(2, account_count);
        assert_eq!(8, category_count);
    }

    #[test]
    fn every_day_in_the_window_has_one_to_four_transactions() {
        let config = SeedConfig::new(date!(2026 - 03 - 31));
        let connection = get_seeded_connection(&config);

        let per_day: Vec<(String, i64)> = connection
            .prepare("SELECT date, COUNT(*) FROM \"transaction\" GROUP BY date")
            .unwrap()
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(
            config.days as usize + 1,
            per_day.len(),
            "every day of the window should have transactions"
        );

        for (date, count) in per_day {
            assert!(
                (1..=4).contains(&count),
                "want 1 to 4 transactions on {date}, got {count}"
            );
        }
    }

    #[test]
    fn amounts_fall_within_their_category_range() {
        let connection = get_seeded_connection(&SeedConfig::new(date!(2026 - 03 - 31)));

        let rows: Vec<(String, i64)> = connection
            .prepare(
                "SELECT c.name, t.amount
                FROM \"transaction\" t
                INNER JOIN category c ON c.id = t.category_id",
            )
            .unwrap()
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert!(!rows.is_empty());

        for (category_name, amount) in rows {
            let magnitude = (amount.abs() as f64) / 1000.0;
            let range = amount_range(&category_name);

            assert!(
                range.contains(&magnitude),
                "want {category_name} amount in {range:?}, got {magnitude}"
            );
        }
    }

    #[test]
    fn some_transactions_carry_notes_and_some_do_not() {
        let connection = get_seeded_connection(&SeedConfig::new(date!(2026 - 03 - 31)));

        let with_notes: i64 = connection
            .query_one(
                "SELECT COUNT(*) FROM \"transaction\" WHERE notes IS NOT NULL",
                [],
                |row| row.get(0),
            )
            .unwrap();
        let without_notes: i64 = connection
            .query_one(
                "SELECT COUNT(*) FROM \"transaction\" WHERE notes IS NULL",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert!(with_notes > 0, "want some transactions with notes");
        assert!(without_notes > 0, "want some transactions without notes");
    }

    #[test]
    fn income_and_expense_split_is_roughly_forty_sixty() {
        let config = SeedConfig {
            end_date: date!(2026 - 03 - 31),
            days: 365,
        };
        let connection = get_seeded_connection(&config);

        let total: f64 = connection
            .query_one("SELECT COUNT(*) FROM \"transaction\"", [], |row| row.get(0))
            .unwrap();
        let income: f64 = connection
            .query_one(
                "SELECT COUNT(*) FROM \"transaction\" WHERE amount > 0",
                [],
                |row| row.get(0),
            )
            .unwrap();

        let income_fraction = income / total;
        assert!(
            (0.3..=0.5).contains(&income_fraction),
            "want roughly 40% income, got {income_fraction}"
        );
    }

    #[test]
    fn reseeding_replaces_previous_data() {
        let config = SeedConfig::new(date!(2026 - 03 - 31));
        let connection = get_seeded_connection(&config);

        let mut rng = SmallRng::seed_from_u64(7);
        seed_database(&connection, &config, &mut rng).expect("Could not reseed database");

        let account_count: i64 = connection
            .query_one("SELECT COUNT(*) FROM account", [], |row| row.get(0))
            .unwrap();
        assert_eq!(2, account_count, "reseeding should not duplicate accounts");

        let per_day_max: i64 = connection
            .query_one(
                "SELECT MAX(count) FROM (
                    SELECT COUNT(*) AS count FROM \"transaction\" GROUP BY date
                )",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(per_day_max <= 4, "reseeding should not accumulate transactions");
    }
}
