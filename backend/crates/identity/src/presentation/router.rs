//! Identity Router

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

use crate::application::config::IdentityConfig;
use crate::domain::repository::{
    AccountRepository, CodeDelivery, SessionRepository, VerificationStore,
};
use crate::infra::delivery::TracingCodeDelivery;
use crate::infra::postgres::PgIdentityRepository;
use crate::presentation::handlers::{self, IdentityAppState};
use crate::presentation::middleware::{IdentityMiddlewareState, require_identity};

/// Create the identity router with PostgreSQL repository
pub fn identity_router(repo: PgIdentityRepository, config: IdentityConfig) -> Router {
    identity_router_generic(repo, TracingCodeDelivery, config)
}

/// Create a generic identity router for any repository implementation
pub fn identity_router_generic<R, D>(repo: R, delivery: D, config: IdentityConfig) -> Router
where
    R: AccountRepository + SessionRepository + VerificationStore + Send + Sync + 'static,
    D: CodeDelivery + Send + Sync + 'static,
{
    let repo = Arc::new(repo);
    let config = Arc::new(config);

    let state = IdentityAppState {
        repo: repo.clone(),
        delivery: Arc::new(delivery),
        config: config.clone(),
    };

    let mw_state = IdentityMiddlewareState {
        sessions: repo,
        config,
    };

    let protected = Router::new()
        .route("/me", get(handlers::me::<R, D>))
        .route("/email-change", post(handlers::email_change::<R, D>))
        .route(
            "/email-change/verify",
            post(handlers::email_change_verify::<R, D>),
        )
        .route("/accounts/{id}/role", post(handlers::change_role::<R, D>))
        .route("/accounts/{id}/lock", post(handlers::set_lock::<R, D>))
        .layer(middleware::from_fn(move |req, next| {
            require_identity(mw_state.clone(), req, next)
        }));

    Router::new()
        .route("/register", post(handlers::register::<R, D>))
        .route("/register/verify", post(handlers::register_verify::<R, D>))
        .route("/login", post(handlers::login::<R, D>))
        .route("/logout", post(handlers::logout::<R, D>))
        .route("/password-reset", post(handlers::password_reset::<R, D>))
        .route(
            "/password-reset/confirm",
            post(handlers::password_reset_confirm::<R, D>),
        )
        .merge(protected)
        .with_state(state)
}
