//! In-memory collaborator implementations
//!
//! Back the unit/integration tests and local development when no catalog /
//! identity / media service URL is configured.

use async_trait::async_trait;
use dashmap::DashMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use super::{Catalog, CollaboratorError, Identity, MediaStore, ProductInfo, UserInfo};

/// DashMap-backed catalog
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    products: Arc<DashMap<String, ProductInfo>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: ProductInfo) {
        self.products.insert(product.id.clone(), product);
    }

    pub fn remove(&self, product_id: &str) {
        self.products.remove(product_id);
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn product_by_id(
        &self,
        product_id: &str,
    ) -> Result<Option<ProductInfo>, CollaboratorError> {
        Ok(self.products.get(product_id).map(|p| p.clone()))
    }
}

/// DashMap-backed identity directory
#[derive(Clone, Default)]
pub struct MemoryIdentity {
    users: Arc<DashMap<String, UserInfo>>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: UserInfo) {
        self.users.insert(user.id.clone(), user);
    }
}

#[async_trait]
impl Identity for MemoryIdentity {
    async fn user_by_id(&self, user_id: &str) -> Result<Option<UserInfo>, CollaboratorError> {
        Ok(self.users.get(user_id).map(|u| u.clone()))
    }
}

/// Media store that mints stable fake URLs without storing bytes
#[derive(Clone, Default)]
pub struct MemoryMediaStore;

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn upload_image(&self, local_path: &Path) -> Result<String, CollaboratorError> {
        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        Ok(format!("mem://uploads/{}-{}", Uuid::new_v4(), file_name))
    }
}
