//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::config::IdentityConfig;
use crate::application::{
    AccountAdminUseCase, AuthorizedIdentity, EmailChangeUseCase, PasswordResetUseCase,
    RegisterUseCase, SignInUseCase, SignOutUseCase, StartRegistrationInput,
};
use crate::domain::repository::{
    AccountRepository, CodeDelivery, SessionRepository, VerificationStore,
};
use crate::domain::value_object::AccountRole;
use crate::error::{IdentityError, IdentityResult};
use crate::presentation::dto::{
    AccountResponse, EmailChangeRequest, EmailChangeVerifyRequest, EmailChangeVerifyResponse,
    LockRequest, LoginRequest, LoginResponse, PasswordResetConfirmRequest, PasswordResetRequest,
    RegisterRequest, RegisterVerifyRequest, RoleChangeRequest,
};

/// Shared state for identity handlers
pub struct IdentityAppState<R, D>
where
    R: AccountRepository + SessionRepository + VerificationStore + Send + Sync + 'static,
    D: CodeDelivery + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub delivery: Arc<D>,
    pub config: Arc<IdentityConfig>,
}

impl<R, D> Clone for IdentityAppState<R, D>
where
    R: AccountRepository + SessionRepository + VerificationStore + Send + Sync + 'static,
    D: CodeDelivery + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            delivery: Arc::clone(&self.delivery),
            config: Arc::clone(&self.config),
        }
    }
}

/// Extract a bearer token from the Authorization header
pub(crate) fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string())
}

// ============================================================================
// Registration
// ============================================================================

/// POST /api/identity/register
pub async fn register<R, D>(
    State(state): State<IdentityAppState<R, D>>,
    Json(req): Json<RegisterRequest>,
) -> IdentityResult<StatusCode>
where
    R: AccountRepository + SessionRepository + VerificationStore + Send + Sync + 'static,
    D: CodeDelivery + Send + Sync + 'static,
{
    let use_case = RegisterUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.delivery.clone(),
        state.config.clone(),
    );

    use_case
        .start(StartRegistrationInput {
            email: req.email,
            password: req.password,
            display_name: req.name,
            phone: req.phone,
        })
        .await?;

    Ok(StatusCode::ACCEPTED)
}

/// POST /api/identity/register/verify
pub async fn register_verify<R, D>(
    State(state): State<IdentityAppState<R, D>>,
    Json(req): Json<RegisterVerifyRequest>,
) -> IdentityResult<(StatusCode, Json<AccountResponse>)>
where
    R: AccountRepository + SessionRepository + VerificationStore + Send + Sync + 'static,
    D: CodeDelivery + Send + Sync + 'static,
{
    let use_case = RegisterUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.delivery.clone(),
        state.config.clone(),
    );

    let account = use_case.verify(req.email, req.code).await?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(&account))))
}

// ============================================================================
// Login / Logout
// ============================================================================

/// POST /api/identity/login
pub async fn login<R, D>(
    State(state): State<IdentityAppState<R, D>>,
    Json(req): Json<LoginRequest>,
) -> IdentityResult<Json<LoginResponse>>
where
    R: AccountRepository + SessionRepository + VerificationStore + Send + Sync + 'static,
    D: CodeDelivery + Send + Sync + 'static,
{
    let use_case = SignInUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let output = use_case.execute(req.email, req.password).await?;

    Ok(Json(LoginResponse {
        token: output.token,
        account: AccountResponse::from(&output.account),
    }))
}

/// POST /api/identity/logout
pub async fn logout<R, D>(
    State(state): State<IdentityAppState<R, D>>,
    headers: HeaderMap,
) -> IdentityResult<StatusCode>
where
    R: AccountRepository + SessionRepository + VerificationStore + Send + Sync + 'static,
    D: CodeDelivery + Send + Sync + 'static,
{
    let token = extract_bearer(&headers).ok_or(IdentityError::MissingToken)?;

    let use_case = SignOutUseCase::new(state.repo.clone(), state.config.clone());
    use_case.execute(&token).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Current Account
// ============================================================================

/// GET /api/identity/me
pub async fn me<R, D>(
    State(state): State<IdentityAppState<R, D>>,
    axum::Extension(identity): axum::Extension<AuthorizedIdentity>,
) -> IdentityResult<Json<AccountResponse>>
where
    R: AccountRepository + SessionRepository + VerificationStore + Send + Sync + 'static,
    D: CodeDelivery + Send + Sync + 'static,
{
    let account = state
        .repo
        .find_by_id(&identity.account_id)
        .await?
        .ok_or(IdentityError::AccountNotFound)?;

    Ok(Json(AccountResponse::from(&account)))
}

// ============================================================================
// Email Change
// ============================================================================

/// POST /api/identity/email-change
pub async fn email_change<R, D>(
    State(state): State<IdentityAppState<R, D>>,
    axum::Extension(identity): axum::Extension<AuthorizedIdentity>,
    Json(req): Json<EmailChangeRequest>,
) -> IdentityResult<StatusCode>
where
    R: AccountRepository + SessionRepository + VerificationStore + Send + Sync + 'static,
    D: CodeDelivery + Send + Sync + 'static,
{
    let use_case = EmailChangeUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.delivery.clone(),
        state.config.clone(),
    );

    use_case.start(&identity.account_id, req.new_email).await?;

    Ok(StatusCode::ACCEPTED)
}

/// POST /api/identity/email-change/verify
pub async fn email_change_verify<R, D>(
    State(state): State<IdentityAppState<R, D>>,
    axum::Extension(identity): axum::Extension<AuthorizedIdentity>,
    Json(req): Json<EmailChangeVerifyRequest>,
) -> IdentityResult<Json<EmailChangeVerifyResponse>>
where
    R: AccountRepository + SessionRepository + VerificationStore + Send + Sync + 'static,
    D: CodeDelivery + Send + Sync + 'static,
{
    let use_case = EmailChangeUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.delivery.clone(),
        state.config.clone(),
    );

    let email = use_case.verify(&identity.account_id, req.code).await?;

    Ok(Json(EmailChangeVerifyResponse {
        email: email.as_str().to_string(),
    }))
}

// ============================================================================
// Password Reset
// ============================================================================

/// POST /api/identity/password-reset
pub async fn password_reset<R, D>(
    State(state): State<IdentityAppState<R, D>>,
    Json(req): Json<PasswordResetRequest>,
) -> IdentityResult<StatusCode>
where
    R: AccountRepository + SessionRepository + VerificationStore + Send + Sync + 'static,
    D: CodeDelivery + Send + Sync + 'static,
{
    let use_case = PasswordResetUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.delivery.clone(),
        state.config.clone(),
    );

    use_case.start(req.email).await?;

    Ok(StatusCode::ACCEPTED)
}

/// POST /api/identity/password-reset/confirm
pub async fn password_reset_confirm<R, D>(
    State(state): State<IdentityAppState<R, D>>,
    Json(req): Json<PasswordResetConfirmRequest>,
) -> IdentityResult<StatusCode>
where
    R: AccountRepository + SessionRepository + VerificationStore + Send + Sync + 'static,
    D: CodeDelivery + Send + Sync + 'static,
{
    let use_case = PasswordResetUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.delivery.clone(),
        state.config.clone(),
    );

    use_case.confirm(req.email, req.code, req.new_password).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Administrative Operations
// ============================================================================

/// POST /api/identity/accounts/{id}/role
pub async fn change_role<R, D>(
    State(state): State<IdentityAppState<R, D>>,
    axum::Extension(identity): axum::Extension<AuthorizedIdentity>,
    Path(target_id): Path<Uuid>,
    Json(req): Json<RoleChangeRequest>,
) -> IdentityResult<StatusCode>
where
    R: AccountRepository + SessionRepository + VerificationStore + Send + Sync + 'static,
    D: CodeDelivery + Send + Sync + 'static,
{
    let role = AccountRole::from_code(&req.role)?;

    let use_case = AccountAdminUseCase::new(state.repo.clone(), state.repo.clone());
    use_case
        .update_role(&identity.account_id, identity.role, &target_id.into(), role)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/identity/accounts/{id}/lock
pub async fn set_lock<R, D>(
    State(state): State<IdentityAppState<R, D>>,
    axum::Extension(identity): axum::Extension<AuthorizedIdentity>,
    Path(target_id): Path<Uuid>,
    Json(req): Json<LockRequest>,
) -> IdentityResult<StatusCode>
where
    R: AccountRepository + SessionRepository + VerificationStore + Send + Sync + 'static,
    D: CodeDelivery + Send + Sync + 'static,
{
    let use_case = AccountAdminUseCase::new(state.repo.clone(), state.repo.clone());
    use_case
        .set_locked(&identity.account_id, identity.role, &target_id.into(), req.locked)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
