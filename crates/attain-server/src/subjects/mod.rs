pub mod handlers;
pub mod responses;

use axum::routing::{get, post};
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/results/:subject", get(handlers::get_results))
        .route("/list_subjects", get(handlers::list_subjects))
        .route("/clear_results", post(handlers::clear_results))
}
