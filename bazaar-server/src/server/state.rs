//! Application state (the dependency-injection root)
//!
//! The store and every collaborator client are constructed once here and
//! handed to each service explicitly. No lazy singletons, no hidden globals:
//! the process owns exactly one `MarketStore` and one client per
//! collaborator.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cart::CartService;
use crate::catalog::http::{HttpCatalog, HttpIdentity, HttpMediaStore};
use crate::catalog::memory::{MemoryCatalog, MemoryIdentity, MemoryMediaStore};
use crate::catalog::{Catalog, Identity, MediaStore};
use crate::ledger::AccountService;
use crate::orders::OrderService;
use crate::payments::PaymentService;
use crate::server::Config;
use crate::settlement::SettlementService;
use crate::store::MarketStore;
use crate::utils::ServiceResult;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<MarketStore>,
    pub carts: CartService,
    pub orders: OrderService,
    pub payments: PaymentService,
    pub settlement: SettlementService,
    pub accounts: AccountService,
}

impl AppState {
    pub fn initialize(config: &Config) -> ServiceResult<Self> {
        let db_path = PathBuf::from(&config.work_dir).join("bazaar.db");
        let store = Arc::new(MarketStore::open(&db_path)?);
        tracing::info!(path = %db_path.display(), "Market store opened");

        let timeout = config.collaborator_timeout_ms;
        let catalog: Arc<dyn Catalog> = match &config.catalog_url {
            Some(url) => Arc::new(
                HttpCatalog::new(url.clone(), timeout)
                    .map_err(crate::utils::ServiceError::from)?,
            ),
            None => {
                tracing::warn!("CATALOG_URL not set, using in-memory catalog");
                Arc::new(MemoryCatalog::new())
            }
        };
        let identity: Arc<dyn Identity> = match &config.identity_url {
            Some(url) => Arc::new(
                HttpIdentity::new(url.clone(), timeout)
                    .map_err(crate::utils::ServiceError::from)?,
            ),
            None => {
                tracing::warn!("IDENTITY_URL not set, using in-memory identity directory");
                Arc::new(MemoryIdentity::new())
            }
        };
        let media: Arc<dyn MediaStore> = match &config.media_url {
            Some(url) => Arc::new(
                HttpMediaStore::new(url.clone(), timeout)
                    .map_err(crate::utils::ServiceError::from)?,
            ),
            None => {
                tracing::warn!("MEDIA_URL not set, using in-memory media store");
                Arc::new(MemoryMediaStore::new())
            }
        };

        Ok(Self {
            config: config.clone(),
            carts: CartService::new(store.clone(), catalog.clone()),
            orders: OrderService::new(store.clone(), catalog),
            payments: PaymentService::new(store.clone(), media),
            settlement: SettlementService::new(store.clone()),
            accounts: AccountService::new(store.clone(), identity),
            store,
        })
    }

    /// Directory for buffering multipart uploads before the media store call
    pub fn upload_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.work_dir).join("uploads")
    }
}
