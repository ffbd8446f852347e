//! Income and expense records tied to an account and, optionally, a category.
//!
//! Amounts are stored as [crate::miliunits::Miliunits], negative for expenses
//! and positive for income.

mod bulk_create_endpoint;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
pub(crate) mod form;
mod new_transaction_page;
mod transactions_page;

pub(crate) use bulk_create_endpoint::{bulk_create_transactions_endpoint, insert_transactions};
pub(crate) use core::{
    NewTransaction, Transaction, create_transaction, create_transaction_table, get_transaction,
};
pub(crate) use create_endpoint::create_transaction_endpoint;
pub(crate) use delete_endpoint::delete_transaction_endpoint;
pub(crate) use edit_endpoint::edit_transaction_endpoint;
pub(crate) use edit_page::get_edit_transaction_page;
pub(crate) use new_transaction_page::get_new_transaction_page;
pub(crate) use transactions_page::get_transactions_page;

#[cfg(test)]
pub(crate) use core::count_transactions;
