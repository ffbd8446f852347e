//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// The ID of a row in the account table.
pub type AccountId = i64;

/// The ID of a row in the category table.
pub type CategoryId = i64;

/// The ID of a row in the transaction table.
pub type TransactionId = i64;
