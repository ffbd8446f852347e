//! Importing transactions from uploaded CSV files.

mod csv;
mod import_endpoint;
mod import_page;

pub(crate) use import_endpoint::import_transactions_endpoint;
pub(crate) use import_page::get_import_page;
