//! Database layer
//!
//! Embedded redb storage for orders, the sequence counter, advisory locks,
//! customer profiles, stock levels and the mail outbox.

pub mod store;

pub use store::{
    EmailKind, LAST_SEQUENTIAL_NUMBER, LockRecord, OrderStore, OutboxEmail, StoreError,
    StoreResult,
};
