// src/auth/mod.rs

pub mod jwt;

pub use jwt::{create_token, verify_token, Claims};

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::state::AppState;

/// The authenticated caller's user id, resolved from the `Authorization:
/// Bearer <jwt>` header. Every endpoint in spec §6 requires this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub i64);

#[derive(Debug)]
pub struct AuthRejection(String);

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": self.0 })),
        )
            .into_response()
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AuthRejection("missing bearer token".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AuthRejection("malformed authorization header".to_string()))?;

        let claims = verify_token(&state.config.auth.jwt_signing_key, token)
            .map_err(|e| AuthRejection(e.to_string()))?;

        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AuthRejection("token subject is not a user id".to_string()))?;

        Ok(AuthUser(user_id))
    }
}
