use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/act/generate", post(handlers::generate_form))
        .route("/act/complete", post(handlers::complete_form))
        .route("/act/reload", post(handlers::reload_form))
        .route("/share", get(handlers::share_redirect))
        .route("/donate", get(handlers::donate_redirect))
        .route("/api/progress", get(handlers::get_progress))
        .route("/api/acts", get(handlers::get_acts))
        .route("/api/acts/reload", post(handlers::reload_acts))
        .route("/api/acts/random", post(handlers::random_act))
        .route("/api/current", get(handlers::get_current))
        .route("/api/complete", post(handlers::complete))
        .route("/api/share", get(handlers::get_share))
        .route("/api/donate", get(handlers::get_donate))
        .with_state(state)
}
