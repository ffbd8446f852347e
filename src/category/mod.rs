//! Categories: the model, list/create/edit pages and the CRUD endpoints.

mod categories_page;
mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;

pub use categories_page::get_categories_page;
pub use core::{Category, create_category_table, get_all_categories, get_category};
pub use create_endpoint::create_category_endpoint;
pub use create_page::get_create_category_page;
pub use delete_endpoint::delete_category_endpoint;
pub use edit_endpoint::edit_category_endpoint;
pub use edit_page::get_edit_category_page;
