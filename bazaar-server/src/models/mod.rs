//! Domain models
//!
//! Entities are plain data with factory constructors; business rules live
//! here (and in the services), never in persistence hooks.

pub mod account;
pub mod cart;
pub mod order;

pub use account::{Account, EntryDirection, EntryStatus, LedgerEntry, PayoutDestination};
pub use cart::CartLine;
pub use order::{
    DeliveryAddress, ItemStatus, Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus,
};
