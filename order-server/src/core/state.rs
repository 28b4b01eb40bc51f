//! Server state - shared handles to the store and services
//!
//! Every field is cheap to clone (the store is an `Arc` over the database),
//! so handlers receive the whole state by value.

use crate::core::Config;
use crate::db::OrderStore;
use crate::sequence::SequenceAssigner;
use crate::services::{InventoryService, Notifier};

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Config,
    /// Embedded store
    pub store: OrderStore,
    /// Sequential order number assigner
    pub sequencer: SequenceAssigner,
    /// Order email notifier
    pub notifier: Notifier,
    /// Stock ledger
    pub inventory: InventoryService,
}

impl ServerState {
    /// Initialize the state: create the working directory, open the store
    /// and wire up the services
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let store = OrderStore::open(config.db_path())?;

        let counter = store.get_counter()?;
        tracing::info!(
            work_dir = %config.work_dir,
            counter,
            suppress_order_emails = config.suppress_order_emails,
            suppress_stock_reduction = config.suppress_stock_reduction,
            "server state initialized"
        );

        Ok(Self::with_store(config.clone(), store))
    }

    /// Build state around an existing store (tests use an in-memory store)
    pub fn with_store(config: Config, store: OrderStore) -> Self {
        let sequencer = SequenceAssigner::new(store.clone(), config.sequencer.clone());
        let notifier = Notifier::new(store.clone(), config.suppress_order_emails);
        let inventory = InventoryService::new(store.clone(), config.suppress_stock_reduction);

        Self {
            config,
            store,
            sequencer,
            notifier,
            inventory,
        }
    }
}
