//! Stock ledger updates for order creation
//!
//! Each line item's quantity is subtracted from its product's stock level.
//! Negative levels are allowed and left for the operator to see; the ledger
//! is informational, not an oversell guard.

use shared::order::Order;

use crate::db::{OrderStore, StoreResult};

/// Stock reducer
#[derive(Clone)]
pub struct InventoryService {
    store: OrderStore,
    suppress: bool,
}

impl InventoryService {
    pub fn new(store: OrderStore, suppress: bool) -> Self {
        Self { store, suppress }
    }

    /// Reduce stock for every line on the order
    ///
    /// A no-op when stock reduction is suppressed (import mode).
    pub fn reduce_for_order(&self, order: &Order) -> StoreResult<()> {
        if self.suppress {
            tracing::debug!(
                order_id = %order.id,
                "stock reduction suppressed (import mode)"
            );
            return Ok(());
        }

        for item in &order.items {
            let new_level = self
                .store
                .adjust_stock(&item.product_id, -i64::from(item.quantity))?;
            tracing::debug!(
                order_id = %order.id,
                product_id = %item.product_id,
                reduced_by = item.quantity,
                new_level,
                "stock reduced"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::order::LineItem;

    fn order_with_items() -> Order {
        Order::new(
            None,
            vec![
                LineItem {
                    product_id: "p-1".into(),
                    name: "Widget".into(),
                    quantity: 3,
                    unit_price: Decimal::ONE,
                },
                LineItem {
                    product_id: "p-2".into(),
                    name: "Gadget".into(),
                    quantity: 1,
                    unit_price: Decimal::TEN,
                },
            ],
            None,
        )
    }

    #[test]
    fn reduces_each_line() {
        let store = OrderStore::open_in_memory().unwrap();
        store.set_stock("p-1", 10).unwrap();
        store.set_stock("p-2", 5).unwrap();

        let inventory = InventoryService::new(store.clone(), false);
        inventory.reduce_for_order(&order_with_items()).unwrap();

        assert_eq!(store.get_stock("p-1").unwrap(), 7);
        assert_eq!(store.get_stock("p-2").unwrap(), 4);
    }

    #[test]
    fn suppression_leaves_stock_untouched() {
        let store = OrderStore::open_in_memory().unwrap();
        store.set_stock("p-1", 10).unwrap();

        let inventory = InventoryService::new(store.clone(), true);
        inventory.reduce_for_order(&order_with_items()).unwrap();

        assert_eq!(store.get_stock("p-1").unwrap(), 10);
    }
}
