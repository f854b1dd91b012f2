//! Database module for the ProConnect account service
//!
//! This module holds the account model, the `AccountStore` persistence
//! interface and its PostgreSQL and in-memory implementations.

pub mod memory;
pub mod models;
pub mod operations;

pub use memory::MemoryAccountStore;
pub use models::{Account, AccountCategory, AccountProjection};
pub use operations::{AccountStore, DbOperations};
