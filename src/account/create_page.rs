//! Defines the route handler for the page for creating an account.

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

/// Renders the page for creating an account.
pub async fn get_create_account_page() -> Response {
    render(StatusCode::OK, create_account_view())
}

fn create_account_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_ACCOUNT_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold py-4" { "New Account" }

            form
                class="w-full space-y-4"
                hx-post=(endpoints::ACCOUNTS_API)
                hx-target-error="#alert-container"
            {
                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                    input
                        name="name"
                        id="name"
                        type="text"
                        placeholder="e.g. Checking"
                        required
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Account" }
            }
        }
    );

    base("New Account", &[], &content)
}

#[cfg(test)]
mod view_tests {
    use scraper::Selector;

    use crate::{
        endpoints,
        test_utils::{assert_status_ok, assert_valid_html, parse_html_document},
    };

    use super::get_create_account_page;

    #[tokio::test]
    async fn renders_form_posting_to_accounts_api() {
        let response = get_create_account_page().await;

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form_selector = Selector::parse("form").unwrap();
        let form = html
            .select(&form_selector)
            .next()
            .expect("page should contain a form");
        assert_eq!(Some(endpoints::ACCOUNTS_API), form.attr("hx-post"));

        let name_input_selector = Selector::parse("input[name=name]").unwrap();
        assert!(html.select(&name_input_selector).next().is_some());
    }
}
