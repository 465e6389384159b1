//! Identity Middleware
//!
//! Middleware gating protected routes on the two-layer token check.

use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::application::AuthorizeRequestUseCase;
use crate::application::config::IdentityConfig;
use crate::domain::repository::SessionRepository;
use crate::presentation::handlers::extract_bearer;

/// Middleware state
pub struct IdentityMiddlewareState<S>
where
    S: SessionRepository + Send + Sync + 'static,
{
    pub sessions: Arc<S>,
    pub config: Arc<IdentityConfig>,
}

impl<S> Clone for IdentityMiddlewareState<S>
where
    S: SessionRepository + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            config: Arc::clone(&self.config),
        }
    }
}

/// Middleware that requires a token backed by a live session
///
/// On success the resolved `AuthorizedIdentity` is stored in the request
/// extensions for downstream handlers. Rejections carry the gateway's
/// distinct reason codes in the response body.
pub async fn require_identity<S>(
    state: IdentityMiddlewareState<S>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    S: SessionRepository + Send + Sync + 'static,
{
    let token = extract_bearer(req.headers());

    let use_case = AuthorizeRequestUseCase::new(state.sessions.clone(), state.config.clone());

    match use_case.execute(token.as_deref()).await {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            Ok(next.run(req).await)
        }
        Err(e) => Err(e.into_response()),
    }
}
