//! Background-ish services: order mail and the stock ledger
//!
//! Both honor the import safety toggles: during a bulk import the merchant
//! disables customer email and stock reduction so re-imported history does
//! not spam customers or drain inventory.

pub mod inventory;
pub mod notifications;

pub use inventory::InventoryService;
pub use notifications::Notifier;
