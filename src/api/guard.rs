//! Role gate and request extractors

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{Identity, RoleSet},
    services::credentials::TokenService,
};

/// Middleware state for one route group
#[derive(Clone)]
pub struct Gate {
    tokens: TokenService,
    roles: RoleSet,
}

impl Gate {
    pub fn new(tokens: TokenService, roles: RoleSet) -> Self {
        Self { tokens, roles }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Authentication("Authorization header required".to_string()))?
        .to_str()
        .map_err(|_| AppError::Authentication("Invalid authorization header format".to_string()))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() && !token.starts_with(' ') => Ok(token),
        _ => Err(AppError::Authentication("Invalid authorization header format".to_string())),
    }
}

/// Reject requests without a valid token carrying one of the gate's roles
pub async fn authorize(
    State(gate): State<Gate>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;

    let identity = gate.tokens.validate(token).map_err(|e| {
        tracing::debug!(reason = %e, "Token rejected");
        AppError::Authentication("Invalid or expired token".to_string())
    })?;

    if !gate.roles.contains(identity.role) {
        tracing::warn!(
            user_id = identity.user_id,
            role = %identity.role,
            required = %gate.roles,
            path = %request.uri().path(),
            "Access denied"
        );
        return Err(AppError::Forbidden {
            required: gate.roles,
            actual: identity.role,
        });
    }

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Caller identity placed in the request by [`authorize`]
pub struct AuthenticatedUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .map(AuthenticatedUser)
            .ok_or_else(|| AppError::Authentication("Authentication required".to_string()))
    }
}

/// JSON body that is deserialized and validated before the handler runs
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;

        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Path parameters whose parse failures answer with the JSON error body
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Query string whose parse failures answer with the JSON error body
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
