use crate::config::SessionLayer;
use crate::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};

/// Build the HTTP surface: one route per credential operation, sessions
/// layered underneath. Rate limiting and request tracing are added by the
/// binary because they need connect-info / subscriber setup.
pub fn build_router(state: AppState, session_layer: SessionLayer) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/signup", post(handlers::signup_handler))
        .route("/verify-email", post(handlers::verify_email_handler))
        .route("/login", post(handlers::login_handler))
        .route("/logout", post(handlers::logout_handler))
        .route("/forgot-password", post(handlers::forgot_password_handler))
        .route(
            "/reset-password/{token}",
            post(handlers::reset_password_handler),
        )
        .layer(session_layer)
        .with_state(state)
}
