//! External collaborator seams
//!
//! The settlement core consumes, and never reimplements, the platform's
//! catalog, identity, and media services. Each seam is a trait; production
//! wiring uses the HTTP clients in [`http`], tests and local development use
//! the in-memory implementations in [`memory`].

pub mod http;
pub mod memory;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::utils::ServiceError;

/// Collaborator transport/protocol failure
///
/// Not-found is modeled as `Ok(None)` on the lookup traits; this error is
/// reserved for the service being unreachable or speaking garbage.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<CollaboratorError> for ServiceError {
    fn from(err: CollaboratorError) -> Self {
        ServiceError::Collaborator(err.to_string())
    }
}

/// Product as the catalog service reports it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInfo {
    pub id: String,
    pub title: String,
    pub price: Decimal,
    pub seller_id: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Platform role as the identity service reports it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

/// User as the identity service reports it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub role: UserRole,
    pub is_kyc_verified: bool,
}

/// Product catalog lookup
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn product_by_id(
        &self,
        product_id: &str,
    ) -> Result<Option<ProductInfo>, CollaboratorError>;
}

/// User identity lookup
#[async_trait]
pub trait Identity: Send + Sync {
    async fn user_by_id(&self, user_id: &str) -> Result<Option<UserInfo>, CollaboratorError>;
}

/// Object storage for payment proof images; only the returned URL is kept
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload_image(&self, local_path: &Path) -> Result<String, CollaboratorError>;
}
