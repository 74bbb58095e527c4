//! 认证中间件
//!
//! Resolves the [`Actor`] from `Authorization: Bearer <token>` and stores it
//! in the request extensions. Handlers pull it back out with the `Actor`
//! extractor.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use shared::error::{AppError, ErrorCode};

use super::jwt::{JwtError, JwtService};
use super::scope::Actor;
use crate::core::ServerState;
use crate::security_log;

/// Routes that authenticate some other way (signature, query token) or not at all
fn is_public(path: &str) -> bool {
    !path.starts_with("/api/") || path == "/api/payments/webhook" || path == "/api/live/ws"
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::ExpiredToken => AppError::new(ErrorCode::TokenExpired),
            JwtError::InvalidPrincipal(guard) => guard.into(),
            other => AppError::invalid_token(other.to_string()),
        }
    }
}

fn authenticate_header(jwt: &JwtService, header: Option<&str>, uri: &str) -> Result<Actor, AppError> {
    let Some(header) = header else {
        security_log!(WARN, "auth_missing", uri = %uri);
        return Err(AppError::not_authenticated());
    };
    let token = JwtService::extract_from_header(header)
        .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

    jwt.authenticate(token).map_err(|e| {
        security_log!(WARN, "auth_failed", error = %e, uri = %uri);
        AppError::from(e)
    })
}

/// 认证中间件 - 所有非公开 `/api/` 路由都需要令牌
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS || is_public(req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let actor = authenticate_header(&state.jwt, header, &req.uri().to_string())?;

    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}

impl FromRequestParts<ServerState> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(actor) = parts.extensions.get::<Actor>() {
            return Ok(*actor);
        }

        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());
        let actor = authenticate_header(&state.jwt, header, &parts.uri.to_string())?;
        parts.extensions.insert(actor);
        Ok(actor)
    }
}
