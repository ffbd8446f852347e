//! Helpers for reading rendered HTML out of handler responses.

use axum::{body::Body, response::Response};
use scraper::Html;

async fn response_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not read response body");

    String::from_utf8_lossy(&body).to_string()
}

/// Parse the body of a full page response.
pub(crate) async fn parse_html_document(response: Response<Body>) -> Html {
    Html::parse_document(&response_text(response).await)
}

/// Parse the body of a partial response, such as an alert fragment.
pub(crate) async fn parse_html_fragment(response: Response<Body>) -> Html {
    Html::parse_fragment(&response_text(response).await)
}

/// Assert that `html` parsed without errors.
#[track_caller]
pub(crate) fn assert_valid_html(html: &Html) {
    assert!(
        html.errors.is_empty(),
        "Got HTML parsing errors: {:?}",
        html.errors
    );
}
