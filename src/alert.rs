//! Alerts for displaying success and error messages to users.
//!
//! Alerts are rendered as HTML fragments swapped out-of-band into the
//! `#alert-container` element that [crate::html::base] places on every page,
//! which makes them the server-side equivalent of toast notifications.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

/// A message shown to the user after an operation completes.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// The operation succeeded.
    Success {
        message: String,
        details: String,
    },
    /// The operation succeeded, no details necessary.
    SuccessSimple {
        message: String,
    },
    /// The operation failed.
    Error {
        message: String,
        details: String,
    },
    /// The operation failed, no details necessary.
    ErrorSimple {
        message: String,
    },
}

impl Alert {
    /// Render the alert as an out-of-band fragment for `#alert-container`.
    pub fn into_html(self) -> Markup {
        let (message, details, is_error) = match self {
            Alert::Success { message, details } => (message, details, false),
            Alert::SuccessSimple { message } => (message, String::new(), false),
            Alert::Error { message, details } => (message, details, true),
            Alert::ErrorSimple { message } => (message, String::new(), true),
        };

        let container_style = if is_error {
            "flex items-start gap-3 rounded border border-red-300 bg-red-50 \
            px-4 py-3 text-sm text-red-800 shadow-lg dark:border-red-800 \
            dark:bg-gray-800 dark:text-red-400"
        } else {
            "flex items-start gap-3 rounded border border-green-300 bg-green-50 \
            px-4 py-3 text-sm text-green-800 shadow-lg dark:border-green-800 \
            dark:bg-gray-800 dark:text-green-400"
        };

        html!(
            div id="alert-container" hx-swap-oob="true"
            {
                div class=(container_style) role="alert"
                {
                    div class="flex-1"
                    {
                        p class="font-medium" { (message) }

                        @if !details.is_empty() {
                            p class="mt-1" { (details) }
                        }
                    }

                    button
                        type="button"
                        class="font-bold"
                        aria-label="Dismiss"
                        onclick="this.closest('#alert-container').classList.add('hidden')"
                    {
                        "✕"
                    }
                }
            }
        )
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        crate::html::render(axum::http::StatusCode::OK, self.into_html())
    }
}
