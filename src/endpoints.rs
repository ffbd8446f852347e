//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/accounts/{account_id}/edit',
//! use [format_endpoint].

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The landing page summarising recent activity.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for displaying transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page for creating a new transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
/// The page for editing an existing transaction.
pub const EDIT_TRANSACTION_VIEW: &str = "/transactions/{transaction_id}/edit";
/// The page for importing transactions from CSV files.
pub const IMPORT_VIEW: &str = "/transactions/import";
/// The page for listing all accounts.
pub const ACCOUNTS_VIEW: &str = "/accounts";
/// The page for creating a new account.
pub const NEW_ACCOUNT_VIEW: &str = "/accounts/new";
/// The page for editing an existing account.
pub const EDIT_ACCOUNT_VIEW: &str = "/accounts/{account_id}/edit";
/// The page for listing all categories.
pub const CATEGORIES_VIEW: &str = "/categories";
/// The page for creating a new category.
pub const NEW_CATEGORY_VIEW: &str = "/categories/new";
/// The page for editing an existing category.
pub const EDIT_CATEGORY_VIEW: &str = "/categories/{category_id}/edit";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";
/// The route to create a transaction.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to create many transactions in a single request.
pub const BULK_CREATE_TRANSACTIONS: &str = "/api/transactions/bulk-create";
/// The route to update a transaction.
pub const PUT_TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to delete a transaction.
pub const DELETE_TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to create an account.
pub const ACCOUNTS_API: &str = "/api/accounts";
/// The route to update an account.
pub const PUT_ACCOUNT: &str = "/api/accounts/{account_id}";
/// The route to delete an account.
pub const DELETE_ACCOUNT: &str = "/api/accounts/{account_id}";
/// The route to create a category.
pub const CATEGORIES_API: &str = "/api/categories";
/// The route to update a category.
pub const PUT_CATEGORY: &str = "/api/categories/{category_id}";
/// The route to delete a category.
pub const DELETE_CATEGORY: &str = "/api/categories/{category_id}";
/// The route to upload CSV files for importing transactions.
pub const IMPORT: &str = "/api/import";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/accounts/{account_id}/edit',
/// '{account_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
