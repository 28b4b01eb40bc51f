//! Order API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use shared::order::{LineItem, Order, OrderStatus, SequenceAssignment};
use shared::{ApiResponse, Pagination};

use crate::core::ServerState;
use crate::utils::time::{millis_to_rfc3339, parse_backdate};
use crate::utils::{AppError, AppResult, ok, ok_with_message};

/// Create order payload
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub customer_id: Option<String>,
    #[validate(length(min = 1, message = "order must have at least one item"), nested)]
    pub items: Vec<LineItemInput>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LineItemInput {
    #[validate(length(min = 1))]
    pub product_id: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 1))]
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl From<LineItemInput> for LineItem {
    fn from(input: LineItemInput) -> Self {
        Self {
            product_id: input.product_id,
            name: input.name,
            quantity: input.quantity,
            unit_price: input.unit_price,
        }
    }
}

/// Order detail: the record plus its number and the customer's notes
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    /// Sequence assignment, if the order has been numbered
    pub number: Option<SequenceAssignment>,
    /// Operator notes on the order's customer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_notes: Option<String>,
}

/// Create an order
///
/// Mirrors the storefront's order-created pipeline: persist the record,
/// assign the sequential number, reduce stock, emit order emails. The last
/// two honor the import suppression toggles.
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    payload.validate()?;

    let items: Vec<LineItem> = payload.items.into_iter().map(Into::into).collect();
    let order = Order::new(payload.customer_id, items, payload.note);

    state.store.put_order(&order)?;
    let assignment = state.sequencer.assign(&order.id).await?;
    state.inventory.reduce_for_order(&order)?;
    state.notifier.order_created(&order)?;

    Ok(ok(OrderDetail {
        order,
        number: Some(assignment),
        customer_notes: None,
    }))
}

/// Sort direction for the order number column
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// Query params for listing orders
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Sort by assigned order number
    #[serde(default)]
    pub sort: SortDir,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    50
}

/// One row of the order listing
#[derive(Debug, Serialize)]
pub struct OrderSummary {
    pub id: String,
    pub customer_id: Option<String>,
    pub status: OrderStatus,
    pub total: Decimal,
    pub created_at: i64,
    /// Assigned order number, if numbered
    pub number: Option<u64>,
    /// True when the number is a timestamp fallback
    pub fallback: bool,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub orders: Vec<OrderSummary>,
    pub pagination: Pagination,
}

/// List orders, sorted by assigned number (unnumbered orders last)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<ListResponse>>> {
    let orders = state.store.list_orders()?;

    let mut rows = Vec::with_capacity(orders.len());
    for order in orders {
        let assignment = state.store.get_assignment(&order.id)?;
        rows.push(OrderSummary {
            id: order.id.clone(),
            customer_id: order.customer_id.clone(),
            status: order.status,
            total: order.total(),
            created_at: order.created_at,
            number: assignment.as_ref().map(|a| a.number),
            fallback: assignment.map(|a| a.fallback).unwrap_or(false),
        });
    }

    rows.sort_by(|a, b| match query.sort {
        // None (unnumbered) sorts after any Some in both directions
        SortDir::Asc => match (a.number, b.number) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.created_at.cmp(&b.created_at),
        },
        SortDir::Desc => match (a.number, b.number) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => b.created_at.cmp(&a.created_at),
        },
    });

    let total = rows.len() as u64;
    let page = query.page.max(1);
    let per_page = query.per_page.clamp(1, 200);
    let start = (page as usize - 1) * per_page as usize;
    let orders: Vec<OrderSummary> = rows
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .collect();

    Ok(ok(ListResponse {
        orders,
        pagination: Pagination::new(page, per_page, total),
    }))
}

/// Order detail by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let order = state
        .store
        .get_order(&id)?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", id)))?;

    let number = state.store.get_assignment(&id)?;

    let customer_notes = match &order.customer_id {
        Some(customer_id) => state
            .store
            .get_customer(customer_id)?
            .and_then(|c| c.notes),
        None => None,
    };

    Ok(ok(OrderDetail {
        order,
        number,
        customer_notes,
    }))
}

/// Backdate payload
#[derive(Debug, Deserialize)]
pub struct BackdateRequest {
    /// Date string: RFC 3339, `Y-m-d H:M:S`, or `Y-m-d`
    pub date: String,
}

/// Backdate response, echoing the stored values for verification
#[derive(Debug, Serialize)]
pub struct BackdateResponse {
    pub order_id: String,
    pub date: String,
    pub verified_created_at: String,
    pub verified_paid_at: String,
}

/// Rewrite an order's created and paid dates (data migration)
pub async fn backdate(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<BackdateRequest>,
) -> AppResult<Json<ApiResponse<BackdateResponse>>> {
    let mut order = state
        .store
        .get_order(&id)?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", id)))?;

    let date = parse_backdate(&payload.date)?;
    let millis = date.timestamp_millis();

    order.created_at = millis;
    order.paid_at = Some(millis);
    state.store.put_order(&order)?;

    // Read back what was actually stored; the caller uses these to verify
    // the migration landed.
    let verified = state
        .store
        .get_order(&id)?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", id)))?;

    tracing::info!(order_id = %id, date = %payload.date, "order backdated");

    Ok(ok_with_message(
        BackdateResponse {
            order_id: id,
            date: date.to_rfc3339(),
            verified_created_at: millis_to_rfc3339(verified.created_at),
            verified_paid_at: verified
                .paid_at
                .map(millis_to_rfc3339)
                .unwrap_or_default(),
        },
        "Order date and paid date updated successfully",
    ))
}

/// Status update payload
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Set an order's status
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let mut order = state
        .store
        .get_order(&id)?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", id)))?;

    let previous = order.status;
    order.status = payload.status;
    state.store.put_order(&order)?;

    tracing::info!(
        order_id = %id,
        from = %previous,
        to = %order.status,
        "order status updated"
    );

    Ok(ok(order))
}
