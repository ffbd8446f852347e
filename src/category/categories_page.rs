//! Displays the list of categories.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    cache::{CacheKey, QueryCache},
    category::{Category, get_all_categories},
    endpoints::{self, format_endpoint},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links, render,
    },
    navigation::NavBar,
};

/// The state needed for the categories page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    /// The database connection for reading categories.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The cache that the category listing is read through.
    pub query_cache: QueryCache,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_cache: state.query_cache.clone(),
        }
    }
}

/// A route handler that renders the categories page.
pub async fn get_categories_page(State(state): State<CategoriesPageState>) -> Response {
    let categories = match state.query_cache.get::<Vec<Category>>(CacheKey::Categories) {
        Some(categories) => categories,
        None => {
            let connection = match state.db_connection.lock() {
                Ok(connection) => connection,
                Err(error) => {
                    tracing::error!("could not acquire database lock: {error}");
                    return Error::DatabaseLockError.into_response();
                }
            };

            match get_all_categories(&connection) {
                Ok(categories) => {
                    state.query_cache.put(CacheKey::Categories, &categories);
                    categories
                }
                Err(error) => {
                    tracing::error!("Failed to retrieve categories: {error}");
                    return error.into_response();
                }
            }
        }
    };

    render(StatusCode::OK, categories_view(&categories))
}

fn categories_view(categories: &[Category]) -> Markup {
    let create_category_page_url = endpoints::NEW_CATEGORY_VIEW;
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let table_row = |category: &Category| {
        let edit_url = format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category.id);
        let delete_url = format_endpoint(endpoints::DELETE_CATEGORY, category.id);
        let action_links = edit_delete_action_links(
            &edit_url,
            &delete_url,
            &format!(
                "Are you sure you want to delete the category '{}'? \
                Its transactions will become uncategorised. This cannot be undone.",
                category.name
            ),
            "closest tr",
            "delete",
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (category.name)
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (action_links)
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Categories" }

                    a href=(create_category_page_url) class=(LINK_STYLE)
                    {
                        "Add Category"
                    }
                }

                section class="w-full overflow-x-auto dark:bg-gray-800 lg:max-w-5xl lg:mx-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Name"
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Actions"
                                }
                            }
                        }

                        tbody
                        {
                            @for category in categories {
                                (table_row(category))
                            }

                            @if categories.is_empty() {
                                tr
                                {
                                    td
                                        colspan="2"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No categories found. Create a category "
                                        a href=(create_category_page_url) class=(LINK_STYLE)
                                        {
                                            "here"
                                        }
                                        "."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Categories", &[], &content)
}
