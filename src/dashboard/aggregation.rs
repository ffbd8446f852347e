//! Aggregation of transactions into the dashboard summary.

use rusqlite::{Connection, named_params};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, miliunits::Miliunits};

/// The label used for spending on transactions without a category.
pub(super) const UNCATEGORISED_LABEL: &str = "Uncategorised";

/// Spending within one category over the summary window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(super) struct CategorySpending {
    /// The category name, or [UNCATEGORISED_LABEL].
    pub name: String,
    /// The total spent, as a positive amount.
    pub spent: Miliunits,
}

/// Totals for a date window.
///
/// The window bounds are part of the summary so that a cached summary can be
/// checked against the window being requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(super) struct Summary {
    /// The first day of the window (inclusive).
    pub from: Date,
    /// The last day of the window (inclusive).
    pub to: Date,
    /// The sum of all positive amounts in the window.
    pub income: Miliunits,
    /// The sum of all negative amounts in the window, as a negative value.
    pub expenses: Miliunits,
    /// Income plus expenses.
    pub remaining: Miliunits,
    /// Per-category spending, largest first.
    pub spending_by_category: Vec<CategorySpending>,
    /// How many transactions fall inside the window.
    pub transaction_count: u64,
}

/// Compute the summary for the date window `from..=to`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub(super) fn get_summary(
    from: Date,
    to: Date,
    connection: &Connection,
) -> Result<Summary, Error> {
    let mut statement = connection.prepare(
        "SELECT t.amount, c.name
        FROM \"transaction\" t
        LEFT JOIN category c ON c.id = t.category_id
        WHERE t.date >= :from AND t.date <= :to",
    )?;

    let rows = statement.query_map(
        named_params! {":from": from, ":to": to},
        |row| {
            Ok((
                row.get::<_, Miliunits>("amount")?,
                row.get::<_, Option<String>>("name")?,
            ))
        },
    )?;

    let mut income = Miliunits::ZERO;
    let mut expenses = Miliunits::ZERO;
    let mut transaction_count = 0;
    let mut spending: Vec<CategorySpending> = Vec::new();

    for row in rows {
        let (amount, category_name) = row?;
        transaction_count += 1;

        if amount.is_expense() {
            expenses = expenses + amount;

            let name = category_name.unwrap_or_else(|| UNCATEGORISED_LABEL.to_owned());
            let spent = Miliunits::ZERO - amount;

            match spending.iter_mut().find(|entry| entry.name == name) {
                Some(entry) => entry.spent = entry.spent + spent,
                None => spending.push(CategorySpending { name, spent }),
            }
        } else {
            income = income + amount;
        }
    }

    spending.sort_by(|a, b| b.spent.cmp(&a.spent).then_with(|| a.name.cmp(&b.name)));

    Ok(Summary {
        from,
        to,
        income,
        expenses,
        remaining: income + expenses,
        spending_by_category: spending,
        transaction_count,
    })
}

#[cfg(test)]
mod get_summary_tests {
    use rusqlite::{Connection, params};
    use time::macros::date;

    use crate::{db::initialize, miliunits::Miliunits};

    use super::{CategorySpending, UNCATEGORISED_LABEL, get_summary};

    fn get_test_connection() -> Connection {
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
                "INSERT INTO category (name, user_id) VALUES (?1, ?2), (?3, ?2)",
                params!["Food", "user_1", "Rent"],
            )
            .unwrap();

        connection
    }

    fn insert_transaction(
        connection: &Connection,
        date: &str,
        amount: i64,
        category_id: Option<i64>,
    ) {
        connection
            .execute(
                "INSERT INTO \"transaction\" (account_id, category_id, date, amount, payee)
                VALUES (1, ?1, ?2, ?3, 'Payee')",
                params![category_id, date, amount],
            )
            .unwrap();
    }

    #[test]
    fn splits_income_and_expenses() {
        let connection = get_test_connection();
        insert_transaction(&connection, "2026-03-01", 2_500_000, None);
        insert_transaction(&connection, "2026-03-02", -40_000, Some(1));
        insert_transaction(&connection, "2026-03-03", -500_000, Some(2));

        let summary =
            get_summary(date!(2026 - 03 - 01), date!(2026 - 03 - 31), &connection).unwrap();

        assert_eq!(Miliunits::from_raw(2_500_000), summary.income);
        assert_eq!(Miliunits::from_raw(-540_000), summary.expenses);
        assert_eq!(Miliunits::from_raw(1_960_000), summary.remaining);
        assert_eq!(3, summary.transaction_count);
    }

    #[test]
    fn groups_spending_by_category_largest_first() {
        let connection = get_test_connection();
        insert_transaction(&connection, "2026-03-02", -40_000, Some(1));
        insert_transaction(&connection, "2026-03-05", -25_000, Some(1));
        insert_transaction(&connection, "2026-03-03", -500_000, Some(2));
        insert_transaction(&connection, "2026-03-04", -10_000, None);

        let summary =
            get_summary(date!(2026 - 03 - 01), date!(2026 - 03 - 31), &connection).unwrap();

        assert_eq!(
            vec![
                CategorySpending {
                    name: "Rent".to_owned(),
                    spent: Miliunits::from_raw(500_000),
                },
                CategorySpending {
                    name: "Food".to_owned(),
                    spent: Miliunits::from_raw(65_000),
                },
                CategorySpending {
                    name: UNCATEGORISED_LABEL.to_owned(),
                    spent: Miliunits::from_raw(10_000),
                },
            ],
            summary.spending_by_category
        );
    }

    #[test]
    fn ignores_transactions_outside_the_window() {
        let connection = get_test_connection();
        insert_transaction(&connection, "2026-02-28", -40_000, Some(1));
        insert_transaction(&connection, "2026-03-01", -25_000, Some(1));
        insert_transaction(&connection, "2026-04-01", 100_000, None);

        let summary =
            get_summary(date!(2026 - 03 - 01), date!(2026 - 03 - 31), &connection).unwrap();

        assert_eq!(1, summary.transaction_count);
        assert_eq!(Miliunits::from_raw(-25_000), summary.expenses);
    }

    #[test]
    fn empty_window_has_zero_totals() {
        let connection = get_test_connection();

        let summary =
            get_summary(date!(2026 - 03 - 01), date!(2026 - 03 - 31), &connection).unwrap();

        assert_eq!(0, summary.transaction_count);
        assert_eq!(Miliunits::ZERO, summary.income);
        assert_eq!(Miliunits::ZERO, summary.expenses);
        assert!(summary.spending_by_category.is_empty());
    }
}
