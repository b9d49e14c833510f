use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Interview lifecycle
        .route("/start_interview", post(handlers::start_interview))
        .route("/check_questions", get(handlers::check_questions))
        // Question progression
        .route("/get_current_question", get(handlers::get_current_question))
        .route("/next_question", get(handlers::next_question))
        // Answers
        .route("/process_audio", post(handlers::process_audio))
        .route("/end_interview", get(handlers::end_interview))
        // Request logging, and let a page on another origin call us
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
