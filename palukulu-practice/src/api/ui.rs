//! Practice page
//!
//! Static HTML and JS are compiled into the binary.

use axum::{
    http::header,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::AppState;

const PRACTICE_HTML: &str = include_str!("../../static/practice.html");
const PRACTICE_JS: &str = include_str!("../../static/practice.js");

pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(practice_page))
        .route("/static/practice.js", get(practice_script))
}

async fn practice_page() -> impl IntoResponse {
    Html(PRACTICE_HTML)
}

async fn practice_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        PRACTICE_JS,
    )
}
