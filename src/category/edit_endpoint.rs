//! Defines the endpoint for updating a category.
use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::{Connection, params};
use serde::Deserialize;

use crate::{
    AppState, Error,
    cache::{MutationKind, QueryCache},
    database_id::CategoryId,
    endpoints,
};

/// The state needed to edit a category.
#[derive(Debug, Clone)]
pub struct EditCategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The cache to invalidate after a successful write.
    pub query_cache: QueryCache,
}

impl FromRef<AppState> for EditCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_cache: state.query_cache.clone(),
        }
    }
}

/// The form data for renaming a category.
#[derive(Debug, Deserialize)]
pub struct EditCategoryForm {
    /// The new category name.
    pub name: String,
}

/// A route handler for renaming a category, redirects to the categories view
/// on success.
pub async fn edit_category_endpoint(
    State(state): State<EditCategoryState>,
    Path(category_id): Path<CategoryId>,
    Form(form): Form<EditCategoryForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_category(category_id, &form, &connection) {
        Ok(rows_affected) if rows_affected != 0 => {
            state
                .query_cache
                .invalidate(MutationKind::UpdateCategory(category_id));

            (
                HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Ok(_) => Error::UpdateMissingCategory.into_alert_response(),
        Err(Error::DuplicateCategoryName(_)) => {
            Error::DuplicateCategoryName(form.name).into_alert_response()
        }
        Err(error) => {
            tracing::error!("Could not update category {category_id}: {error}");
            error.into_alert_response()
        }
    }
}

type RowsAffected = usize;

fn update_category(
    id: CategoryId,
    form: &EditCategoryForm,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    let name = form.name.trim();

    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    connection
        .execute(
            "UPDATE category SET name = ?1 WHERE id = ?2",
            params![name, id],
        )
        .map_err(Error::from)
}
