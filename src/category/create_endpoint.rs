//! Defines the endpoint for creating a new category.
use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::{Connection, params};
use serde::Deserialize;

use crate::{
    AppState, Error,
    cache::{MutationKind, QueryCache},
    category::Category,
    endpoints,
};

/// The state needed to create a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The cache to invalidate after a successful write.
    pub query_cache: QueryCache,
    /// The user id to record as the owner of the new category.
    pub user_id: String,
}

impl FromRef<AppState> for CreateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_cache: state.query_cache.clone(),
            user_id: state.user_id.clone(),
        }
    }
}

/// The form data for creating a category.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    /// The category name.
    pub name: String,
}

/// A route handler for creating a new category, redirects to the categories
/// view on success.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryState>,
    Form(form): Form<CategoryForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_category(&form, &state.user_id, &connection) {
        Ok(_) => {
            state.query_cache.invalidate(MutationKind::CreateCategory);

            (
                HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::DuplicateCategoryName(_)) => {
            Error::DuplicateCategoryName(form.name).into_alert_response()
        }
        Err(error) => {
            tracing::error!("Could not create category with {form:?}: {error}");
            error.into_alert_response()
        }
    }
}

/// Insert a new category into the database.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyName] if the trimmed name is empty,
/// - or [Error::DuplicateCategoryName] if a category with that name exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_category(
    form: &CategoryForm,
    user_id: &str,
    connection: &Connection,
) -> Result<Category, Error> {
    let name = form.name.trim();

    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    connection.execute(
        "INSERT INTO category (name, user_id) VALUES (?1, ?2)",
        params![name, user_id],
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name: name.to_owned(),
        user_id: user_id.to_owned(),
        plaid_id: None,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Form, extract::State, http::StatusCode};
    use rusqlite::Connection;

    use crate::{
        cache::{CacheKey, QueryCache},
        category::{
            create_category_endpoint,
            create_endpoint::{CategoryForm, CreateCategoryState},
            get_category,
        },
        db::initialize,
        endpoints,
        test_utils::assert_hx_redirect,
    };

    fn get_test_state() -> CreateCategoryState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        CreateCategoryState {
            db_connection: Arc::new(Mutex::new(conn)),
            query_cache: QueryCache::new(),
            user_id: "test_user".to_owned(),
        }
    }

    #[tokio::test]
    async fn creates_category_and_redirects() {
        let state = get_test_state();
        let form = CategoryForm {
            name: "Food".to_owned(),
        };

        let response = create_category_endpoint(State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::CATEGORIES_VIEW);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!("Food", get_category(1, &connection).unwrap().name);
        assert_eq!(
            1,
            state.query_cache.invalidation_count(CacheKey::Categories)
        );
    }

    #[tokio::test]
    async fn duplicate_name_responds_with_error_and_skips_invalidation() {
        let state = get_test_state();
        let form = CategoryForm {
            name: "Food".to_owned(),
        };
        create_category_endpoint(State(state.clone()), Form(form)).await;

        let duplicate = CategoryForm {
            name: "Food".to_owned(),
        };
        let response = create_category_endpoint(State(state.clone()), Form(duplicate)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            1,
            state.query_cache.invalidation_count(CacheKey::Categories)
        );
    }
}
