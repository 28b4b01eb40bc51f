//! Order email notifications
//!
//! Delivery itself is out of scope for this service; "sending" an email
//! means writing an [`OutboxEmail`] record that a downstream mailer drains.
//! When suppression is on (import mode), every email is logged to the
//! `mail` target and dropped - nothing reaches the outbox.

use shared::now_millis;
use shared::order::Order;

use crate::db::{EmailKind, OrderStore, OutboxEmail, StoreResult};

/// Order email notifier
#[derive(Clone)]
pub struct Notifier {
    store: OrderStore,
    suppress: bool,
}

impl Notifier {
    pub fn new(store: OrderStore, suppress: bool) -> Self {
        Self { store, suppress }
    }

    /// Emit the emails for a newly created order
    ///
    /// New-order (merchant copy) and processing-order (customer copy), the
    /// same pair the storefront platform sends on order creation.
    pub fn order_created(&self, order: &Order) -> StoreResult<()> {
        self.emit(order, EmailKind::NewOrder)?;
        self.emit(order, EmailKind::ProcessingOrder)?;
        Ok(())
    }

    fn emit(&self, order: &Order, kind: EmailKind) -> StoreResult<()> {
        let subject = match kind {
            EmailKind::NewOrder => format!("New order {}", order.id),
            EmailKind::ProcessingOrder => format!("Your order {} is being processed", order.id),
        };

        if self.suppress {
            tracing::info!(
                target: "mail",
                order_id = %order.id,
                kind = ?kind,
                subject = %subject,
                "email suppressed (import mode)"
            );
            return Ok(());
        }

        let email = OutboxEmail {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            kind,
            subject,
            queued_at: now_millis(),
        };
        self.store.push_outbox(&email)?;

        tracing::info!(target: "mail", order_id = %order.id, kind = ?kind, "email queued");
        Ok(())
    }
}
