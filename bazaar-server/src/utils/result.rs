//! Unified Result Types
//!
//! Provides type aliases for commonly used Result types across the application

use crate::utils::{AppError, ServiceError};

/// Application-level Result type
///
/// Used in HTTP handlers
pub type AppResult<T> = Result<T, AppError>;

/// Service-level Result type
///
/// Used in domain services (cart, orders, settlement, ledger)
pub type ServiceResult<T> = Result<T, ServiceError>;
