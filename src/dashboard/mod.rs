//! The dashboard summarising income, expenses and per-category spending.

mod aggregation;
mod charts;
mod page;

pub(crate) use page::get_dashboard_page;
