//! Market order value object (spec §3 "Order (market)").

use super::types::{InstrumentDescriptor, OrderStatus, Side, SessionHandle, TimeInForce};
use crate::ids::ExecutionIdGenerator;
use crate::party::Party;
use chrono::{DateTime, Utc};

/// A market order: same shape as [`crate::order::LimitOrder`] without a
/// price, implicitly treated as IOC after accept. Market orders are never
/// resting — they either trade immediately or are cancelled.
#[derive(Debug, Clone)]
pub struct MarketOrder {
    /// Unique, monotonic order id, assigned at accept time.
    pub order_id: u64,
    /// Order side.
    pub side: Side,
    /// Total (original) quantity.
    pub total_quantity: u64,
    /// Cumulative executed quantity.
    pub cumulative_quantity: u64,
    /// Current status.
    pub status: OrderStatus,
    /// Client-assigned order id, if the client supplied one.
    pub client_order_id: Option<String>,
    /// Parties attached to this order, in submission order.
    pub parties: Vec<Party>,
    /// The session that owns this order.
    pub session: SessionHandle,
    /// The instrument this order was placed against.
    pub instrument: InstrumentDescriptor,
    /// The time this order was accepted.
    pub order_time: DateTime<Utc>,
    /// Per-order execution-id generator, seeded from `order_id`.
    pub execution_ids: ExecutionIdGenerator,
}

impl MarketOrder {
    /// Market orders are always IOC once accepted (spec §3).
    pub const TIME_IN_FORCE: TimeInForce = TimeInForce::Ioc;

    /// Leaves quantity: `max(total - executed, 0)`.
    pub fn leaves(&self) -> u64 {
        self.total_quantity.saturating_sub(self.cumulative_quantity)
    }

    /// Applies an execution of `quantity` against this order.
    pub fn apply_execution(&mut self, quantity: u64) {
        let new_cumulative = self.cumulative_quantity + quantity;
        debug_assert!(new_cumulative <= self.total_quantity);
        self.cumulative_quantity = new_cumulative.min(self.total_quantity);
        self.status = if self.leaves() == 0 {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
    }

    /// Allocates the next execution id for this order.
    pub fn next_execution_id(&mut self) -> String {
        self.execution_ids.next_execution_id()
    }
}
