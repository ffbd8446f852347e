//! Defines the route handler for the page for creating a category.

use axum::{http::StatusCode, response::Response};
use maud::{Markup, html};

use crate::{
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        render,
    },
    navigation::NavBar,
};

/// Renders the page for creating a category.
pub async fn get_create_category_page() -> Response {
    render(StatusCode::OK, create_category_view())
}

fn create_category_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_CATEGORY_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold py-4" { "New Category" }

            form
                class="w-full space-y-4"
                hx-post=(endpoints::CATEGORIES_API)
                hx-target-error="#alert-container"
            {
                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                    input
                        name="name"
                        id="name"
                        type="text"
                        placeholder="e.g. Food"
                        required
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Category" }
            }
        }
    );

    base("New Category", &[], &content)
}
