//! Caller identity extractor
//!
//! The authorization gateway in front of this service authenticates the
//! request and injects the verified identity as headers; handlers trust
//! those headers and never re-derive permissions.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::catalog::UserRole;
use crate::utils::AppError;

/// Header set by the gateway: the authenticated user id
pub const HEADER_USER_ID: &str = "x-user-id";
/// Header set by the gateway: the authenticated role (`user` | `admin`)
pub const HEADER_USER_ROLE: &str = "x-user-role";

/// Verified caller identity, as supplied by the gateway
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: String,
    pub role: UserRole,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin role required".to_string()))
        }
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(HEADER_USER_ID)
            .and_then(|h| h.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or(AppError::Unauthorized)?
            .to_string();

        let role = match parts
            .headers
            .get(HEADER_USER_ROLE)
            .and_then(|h| h.to_str().ok())
        {
            Some("admin") => UserRole::Admin,
            Some("user") | None => UserRole::User,
            Some(other) => {
                tracing::warn!(role = other, "Unknown role header, treating as user");
                UserRole::User
            }
        };

        Ok(Caller { user_id, role })
    }
}
