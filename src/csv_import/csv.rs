//! Parsing of uploaded transaction CSV files.
//!
//! Files must have a header row of `date,payee,amount,notes`. Dates use the
//! ISO 8601 calendar format (e.g. 2026-03-14) and amounts are decimal
//! currency values, negative for expenses.

use serde::Deserialize;
use time::Date;

use crate::{
    Error, database_id::AccountId, miliunits::Miliunits, transaction::NewTransaction,
};

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: Date,
    payee: String,
    amount: f64,
    notes: Option<String>,
}

/// Parse the rows of `csv_data` into transactions for `account_id`.
///
/// Row numbers in error messages are one-based and count the header row, so
/// they match what a spreadsheet application shows the user.
///
/// # Errors
/// Returns an [Error::InvalidCSV] naming the offending row if a row cannot be
/// parsed or its amount is not a valid currency value.
pub fn parse_transactions_csv(
    csv_data: &str,
    account_id: AccountId,
) -> Result<Vec<NewTransaction>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(csv_data.as_bytes());

    let mut transactions = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        // Row 1 is the header.
        let row_number = index + 2;

        let row = result
            .map_err(|error| Error::InvalidCSV(format!("row {row_number}: {error}")))?;

        let amount = Miliunits::from_decimal(row.amount).map_err(|_| {
            Error::InvalidCSV(format!(
                "row {row_number}: {} is not a valid amount",
                row.amount
            ))
        })?;

        transactions.push(NewTransaction {
            account_id,
            category_id: None,
            date: row.date,
            amount,
            payee: row.payee,
            notes: row.notes.filter(|notes| !notes.is_empty()),
        });
    }

    Ok(transactions)
}
