//! The page for editing or deleting an existing category.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::Response,
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{Category, get_category},
    database_id::CategoryId,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, base, render,
    },
    internal_server_error::render_internal_server_error,
    navigation::NavBar,
    not_found::get_404_not_found_response,
};

/// The state needed for the edit category page.
#[derive(Debug, Clone)]
pub struct EditCategoryPageState {
    /// The database connection for reading categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditCategoryPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing a category.
pub async fn get_edit_category_page(
    State(state): State<EditCategoryPageState>,
    Path(category_id): Path<CategoryId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return render_internal_server_error(Default::default());
        }
    };

    let category = match get_category(category_id, &connection) {
        Ok(category) => category,
        Err(Error::NotFound) => {
            return get_404_not_found_response();
        }
        Err(error) => {
            tracing::error!("Failed to retrieve category {category_id}: {error}");
            return render_internal_server_error(Default::default());
        }
    };

    render(StatusCode::OK, edit_category_view(&category))
}

fn edit_category_view(category: &Category) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_CATEGORY_VIEW).into_html();
    let edit_url = format_endpoint(endpoints::PUT_CATEGORY, category.id);
    let delete_url = format_endpoint(endpoints::DELETE_CATEGORY, category.id);

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold py-4" { "Edit Category" }

            form
                class="w-full space-y-4"
                hx-put=(edit_url)
                hx-target-error="#alert-container"
            {
                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                    input
                        name="name"
                        id="name"
                        type="text"
                        value=(category.name)
                        required
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save Changes" }
            }

            button
                type="button"
                hx-delete=(delete_url)
                hx-confirm=(format!(
                    "Are you sure you want to delete the category '{}'? \
                    Its transactions will become uncategorised. This cannot be undone.",
                    category.name
                ))
                hx-target-error="#alert-container"
                class=(BUTTON_DELETE_STYLE)
            {
                "Delete Category"
            }
        }
    );

    base("Edit Category", &[], &content)
}
