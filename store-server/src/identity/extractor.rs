//! Shopper identity extractor
//!
//! Validates the `Authorization: Bearer <token>` header against the token
//! service on every request; handlers receive the resolved shopper id and
//! never see the raw token.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use super::TokenError;
use crate::core::ServerState;
use crate::utils::AppError;

/// The authenticated (possibly anonymous) shopper of the current request
#[derive(Debug, Clone)]
pub struct CurrentShopper {
    pub id: i64,
    pub anon: bool,
}

impl FromRequestParts<ServerState> for CurrentShopper {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(AppError::InvalidToken)?;

        let claims = state.tokens.verify(token).map_err(|e| match e {
            TokenError::ExpiredToken => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })?;

        let id: i64 = claims.sub.parse().map_err(|_| AppError::InvalidToken)?;
        Ok(CurrentShopper {
            id,
            anon: claims.anon,
        })
    }
}
