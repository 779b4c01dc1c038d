pub mod base_url;
pub mod health;
pub mod media;

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};

use crate::resumes::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        // Résumé API
        .route(
            "/api/v1/resumes",
            get(handlers::list_resumes).post(handlers::create_resume),
        )
        .route("/api/v1/resumes/choices", get(handlers::resume_choices))
        .route(
            "/api/v1/resumes/:id",
            get(handlers::get_resume)
                .put(handlers::update_resume)
                .patch(handlers::update_resume)
                .delete(handlers::delete_resume),
        )
        // Stored files
        .route("/media/*key", get(media::serve_media))
        .layer(body_limit)
        .with_state(state)
}
