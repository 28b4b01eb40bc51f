//! redb-based storage layer
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` | Order records |
//! | `order_numbers` | `order_id` | `SequenceAssignment` | Per-order number (written once) |
//! | `options` | name | `u64` | Scalar settings, incl. the sequence counter |
//! | `locks` | name | `LockRecord` | Named advisory locks |
//! | `customers` | `customer_id` | `CustomerProfile` | Customer notes |
//! | `stock_levels` | `product_id` | `i64` | Stock ledger |
//! | `outbox` | `message_id` | `OutboxEmail` | Actually-sent order mail |
//!
//! # Durability
//!
//! redb commits are persistent as soon as `commit()` returns (copy-on-write
//! with atomic pointer swap), so the counter and the per-order assignment
//! survive power loss independently. No transaction spans both writes; a
//! crash between them leaves a gap in the numbering, never a duplicate.
//!
//! # Mutual exclusion
//!
//! Advisory locks are acquired by compare-and-set inside a single write
//! transaction. redb serializes write transactions, which is what makes the
//! check-then-insert atomic across processes sharing the database file.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use shared::order::{CustomerProfile, Order, SequenceAssignment};
use shared::now_millis;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for order records: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Table for order numbers: key = order_id, value = JSON-serialized SequenceAssignment
const ORDER_NUMBERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("order_numbers");

/// Table for scalar options: key = option name, value = u64
const OPTIONS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("options");

/// Table for advisory locks: key = lock name, value = JSON-serialized LockRecord
const LOCKS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("locks");

/// Table for customer profiles: key = customer_id, value = JSON-serialized CustomerProfile
const CUSTOMERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("customers");

/// Table for stock levels: key = product_id, value = units on hand
const STOCK_TABLE: TableDefinition<&str, i64> = TableDefinition::new("stock_levels");

/// Table for the mail outbox: key = message_id, value = JSON-serialized OutboxEmail
const OUTBOX_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("outbox");

/// Option name for the sequence counter
pub const LAST_SEQUENTIAL_NUMBER: &str = "last_sequential_number";

/// Advisory lock record
///
/// `expires_at_ms` is the staleness bound: a holder that crashed without
/// releasing cannot wedge the lock past its TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRecord {
    /// Holder token (UUID, unique per acquisition)
    pub holder: String,
    /// Expiry (Unix millis)
    pub expires_at_ms: i64,
}

/// Kind of order email
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailKind {
    NewOrder,
    ProcessingOrder,
}

/// Outbox entry - one per email actually queued for delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEmail {
    pub id: String,
    pub order_id: String,
    pub kind: EmailKind,
    pub subject: String,
    pub queued_at: i64,
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Order store backed by redb
#[derive(Clone)]
pub struct OrderStore {
    db: Arc<Database>,
}

impl OrderStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::initialize(db)
    }

    /// Open an in-memory database (tests)
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::initialize(db)
    }

    fn initialize(db: Database) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            // Create all tables if they don't exist
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_NUMBERS_TABLE)?;
            let _ = write_txn.open_table(LOCKS_TABLE)?;
            let _ = write_txn.open_table(CUSTOMERS_TABLE)?;
            let _ = write_txn.open_table(STOCK_TABLE)?;
            let _ = write_txn.open_table(OUTBOX_TABLE)?;

            // Initialize the sequence counter if not present. The typed u64
            // column also guarantees the counter can never hold a negative or
            // non-numeric value that would need resetting later.
            let mut options = write_txn.open_table(OPTIONS_TABLE)?;
            if options.get(LAST_SEQUENTIAL_NUMBER)?.is_none() {
                options.insert(LAST_SEQUENTIAL_NUMBER, 0u64)?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    // ========== Sequence counter ==========

    /// Current value of the sequence counter
    pub fn get_counter(&self) -> StoreResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OPTIONS_TABLE)?;
        Ok(table
            .get(LAST_SEQUENTIAL_NUMBER)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Persist a new counter value
    ///
    /// Only meaningful while holding the counter's advisory lock; the store
    /// itself does not enforce that.
    pub fn set_counter(&self, value: u64) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(OPTIONS_TABLE)?;
            table.insert(LAST_SEQUENTIAL_NUMBER, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    // ========== Order numbers ==========

    /// Look up the sequence assignment for an order, if any
    pub fn get_assignment(&self, order_id: &str) -> StoreResult<Option<SequenceAssignment>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDER_NUMBERS_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Record the sequence assignment for an order
    ///
    /// An unconditional insert: callers check for an existing assignment
    /// before writing. Two racing first-time callers can both get here and
    /// the later write wins - a known gap, kept as-is.
    pub fn put_assignment(
        &self,
        order_id: &str,
        assignment: &SequenceAssignment,
    ) -> StoreResult<()> {
        let bytes = serde_json::to_vec(assignment)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ORDER_NUMBERS_TABLE)?;
            table.insert(order_id, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    // ========== Advisory locks ==========

    /// Try to acquire a named lock for `holder`, with the given TTL
    ///
    /// Returns `true` when the lock was free (or held by an expired record)
    /// and is now owned by `holder`. Check-then-insert runs inside one write
    /// transaction, so concurrent acquirers are serialized by redb.
    pub fn try_acquire_lock(&self, name: &str, holder: &str, ttl_ms: i64) -> StoreResult<bool> {
        let now = now_millis();
        let txn = self.db.begin_write()?;
        let acquired = {
            let mut table = txn.open_table(LOCKS_TABLE)?;
            let current: Option<LockRecord> = match table.get(name)? {
                Some(guard) => Some(serde_json::from_slice(guard.value())?),
                None => None,
            };

            match current {
                Some(record) if record.expires_at_ms > now => false,
                _ => {
                    let record = LockRecord {
                        holder: holder.to_string(),
                        expires_at_ms: now + ttl_ms,
                    };
                    let bytes = serde_json::to_vec(&record)?;
                    table.insert(name, bytes.as_slice())?;
                    true
                }
            }
        };

        if acquired {
            txn.commit()?;
        } else {
            txn.abort()?;
        }
        Ok(acquired)
    }

    /// Release a named lock, but only if `holder` still owns it
    ///
    /// Returns `true` when the lock was released. A holder whose record
    /// expired and was taken over by someone else gets `false` and must not
    /// touch the new owner's lock.
    pub fn release_lock(&self, name: &str, holder: &str) -> StoreResult<bool> {
        let txn = self.db.begin_write()?;
        let released = {
            let mut table = txn.open_table(LOCKS_TABLE)?;
            let current: Option<LockRecord> = match table.get(name)? {
                Some(guard) => Some(serde_json::from_slice(guard.value())?),
                None => None,
            };

            match current {
                Some(record) if record.holder == holder => {
                    table.remove(name)?;
                    true
                }
                _ => false,
            }
        };

        if released {
            txn.commit()?;
        } else {
            txn.abort()?;
        }
        Ok(released)
    }

    /// Inspect a named lock without touching it
    pub fn peek_lock(&self, name: &str) -> StoreResult<Option<LockRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LOCKS_TABLE)?;
        match table.get(name)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    // ========== Orders ==========

    /// Insert or update an order record
    pub fn put_order(&self, order: &Order) -> StoreResult<()> {
        let bytes = serde_json::to_vec(order)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            table.insert(order.id.as_str(), bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Fetch an order by id
    pub fn get_order(&self, order_id: &str) -> StoreResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All orders (the merchant's volume is small; listing loads everything
    /// and paginates in memory)
    pub fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            orders.push(serde_json::from_slice(value.value())?);
        }
        Ok(orders)
    }

    // ========== Customers ==========

    /// Insert or update a customer profile
    pub fn put_customer(&self, customer: &CustomerProfile) -> StoreResult<()> {
        let bytes = serde_json::to_vec(customer)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(CUSTOMERS_TABLE)?;
            table.insert(customer.id.as_str(), bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Fetch a customer profile by id
    pub fn get_customer(&self, customer_id: &str) -> StoreResult<Option<CustomerProfile>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CUSTOMERS_TABLE)?;
        match table.get(customer_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    // ========== Stock ==========

    /// Set the absolute stock level for a product
    pub fn set_stock(&self, product_id: &str, level: i64) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(STOCK_TABLE)?;
            table.insert(product_id, level)?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Current stock level (missing products read as 0)
    pub fn get_stock(&self, product_id: &str) -> StoreResult<i64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STOCK_TABLE)?;
        Ok(table.get(product_id)?.map(|g| g.value()).unwrap_or(0))
    }

    /// Adjust stock by a signed delta and return the new level
    ///
    /// Read-modify-write inside one transaction. Levels may go negative;
    /// that is surfaced to the operator rather than rejected.
    pub fn adjust_stock(&self, product_id: &str, delta: i64) -> StoreResult<i64> {
        let txn = self.db.begin_write()?;
        let new_level = {
            let mut table = txn.open_table(STOCK_TABLE)?;
            let current = table.get(product_id)?.map(|g| g.value()).unwrap_or(0);
            let new_level = current + delta;
            table.insert(product_id, new_level)?;
            new_level
        };
        txn.commit()?;
        Ok(new_level)
    }

    // ========== Mail outbox ==========

    /// Queue an email in the outbox
    pub fn push_outbox(&self, email: &OutboxEmail) -> StoreResult<()> {
        let bytes = serde_json::to_vec(email)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(OUTBOX_TABLE)?;
            table.insert(email.id.as_str(), bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// All queued emails (tests and operator inspection)
    pub fn list_outbox(&self) -> StoreResult<Vec<OutboxEmail>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OUTBOX_TABLE)?;
        let mut emails = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            emails.push(serde_json::from_slice(value.value())?);
        }
        Ok(emails)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::OrderStatus;

    fn store() -> OrderStore {
        OrderStore::open_in_memory().unwrap()
    }

    #[test]
    fn counter_starts_at_zero() {
        let store = store();
        assert_eq!(store.get_counter().unwrap(), 0);
    }

    #[test]
    fn counter_round_trip() {
        let store = store();
        store.set_counter(41).unwrap();
        assert_eq!(store.get_counter().unwrap(), 41);
    }

    #[test]
    fn assignment_round_trip() {
        let store = store();
        assert!(store.get_assignment("o-1").unwrap().is_none());

        let assignment = SequenceAssignment {
            number: 42,
            fallback: false,
            assigned_at: now_millis(),
        };
        store.put_assignment("o-1", &assignment).unwrap();

        let read = store.get_assignment("o-1").unwrap().unwrap();
        assert_eq!(read.number, 42);
        assert!(!read.fallback);
    }

    #[test]
    fn lock_is_exclusive_until_released() {
        let store = store();
        assert!(store.try_acquire_lock("lk", "holder-a", 60_000).unwrap());
        assert!(!store.try_acquire_lock("lk", "holder-b", 60_000).unwrap());

        assert!(store.release_lock("lk", "holder-a").unwrap());
        assert!(store.try_acquire_lock("lk", "holder-b", 60_000).unwrap());
    }

    #[test]
    fn expired_lock_is_reclaimable() {
        let store = store();
        // TTL already in the past
        assert!(store.try_acquire_lock("lk", "holder-a", -1).unwrap());
        assert!(store.try_acquire_lock("lk", "holder-b", 60_000).unwrap());
    }

    #[test]
    fn release_by_non_holder_is_refused() {
        let store = store();
        assert!(store.try_acquire_lock("lk", "holder-a", 60_000).unwrap());
        assert!(!store.release_lock("lk", "holder-b").unwrap());
        // still held by a
        let record = store.peek_lock("lk").unwrap().unwrap();
        assert_eq!(record.holder, "holder-a");
    }

    #[test]
    fn order_round_trip() {
        let store = store();
        let mut order = Order::new(Some("cust-1".into()), vec![], Some("gift wrap".into()));
        order.status = OrderStatus::Shipped;
        store.put_order(&order).unwrap();

        let read = store.get_order(&order.id).unwrap().unwrap();
        assert_eq!(read.status, OrderStatus::Shipped);
        assert_eq!(read.customer_id.as_deref(), Some("cust-1"));
        assert!(store.get_order("missing").unwrap().is_none());
    }

    #[test]
    fn stock_adjusts_and_may_go_negative() {
        let store = store();
        store.set_stock("p-1", 5).unwrap();
        assert_eq!(store.adjust_stock("p-1", -3).unwrap(), 2);
        assert_eq!(store.adjust_stock("p-1", -4).unwrap(), -2);
        assert_eq!(store.get_stock("p-1").unwrap(), -2);
        // unknown products read as zero
        assert_eq!(store.get_stock("p-unknown").unwrap(), 0);
    }
}
