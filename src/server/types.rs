use crate::Error;
use axum::{
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::any::Any;
use tracing::error;

/// Body of every 500 response. The failure itself only goes to the log.
pub const ERROR_PAGE: &str = "<h1>Error 500</h1><p>Internal Server Error</p>";

#[derive(Debug, Deserialize)]
pub struct FetchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

pub fn error_page() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(CONTENT_TYPE, "text/html")],
        ERROR_PAGE,
    )
        .into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        error!("Exception: {}", self);
        error_page()
    }
}

pub fn panic_page(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {}", message);
    error_page()
}
