//! Defines the templates and route handlers for the page to display for an internal server error.
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

pub struct InternalServerErrorPageTemplate<'a> {
    pub description: &'a str,
    pub fix: &'a str,
}

impl Default for InternalServerErrorPageTemplate<'_> {
    fn default() -> Self {
        Self {
            description: "Sorry, something went wrong.",
            fix: "Try again later or check the server logs",
        }
    }
}

impl InternalServerErrorPageTemplate<'_> {
    pub fn into_html(self) -> Html<String> {
        Html(error_view("Internal Server Error", "500", self.description, self.fix).into_string())
    }
}

pub fn render_internal_server_error(template: InternalServerErrorPageTemplate) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, template.into_html()).into_response()
}

pub async fn get_internal_server_error_page() -> Response {
    render_internal_server_error(Default::default())
}
