//! Limit order value object (spec §3 "Order (limit)").

use super::types::{InstrumentDescriptor, OrderStatus, Side, SessionHandle, TimeInForce};
use crate::ids::ExecutionIdGenerator;
use crate::party::Party;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A resting or in-flight limit order.
///
/// `executed <= total` holds after every mutation (spec §8 invariant);
/// `leaves()` is derived, never stored independently, so the invariant
/// cannot drift out of sync with the stored fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitOrder {
    /// Unique, monotonic order id, assigned at accept time.
    pub order_id: u64,
    /// Order side.
    pub side: Side,
    /// Limit price.
    pub price: u128,
    /// Total (original) quantity.
    pub total_quantity: u64,
    /// Cumulative executed quantity.
    pub cumulative_quantity: u64,
    /// Current status.
    pub status: OrderStatus,
    /// Time-in-force. Immutable once accepted (amend cannot change it).
    pub time_in_force: TimeInForce,
    /// Absolute expiry instant, for GTD orders that specify one.
    pub expire_time: Option<DateTime<Utc>>,
    /// Local calendar expiry date, for GTD orders that specify one
    /// instead of (or in addition to) `expire_time`.
    pub expire_date: Option<NaiveDate>,
    /// Reason code for a short sale exempt from uptick restrictions.
    pub short_sale_exempt_reason: Option<String>,
    /// Client-assigned order id, if the client supplied one.
    pub client_order_id: Option<String>,
    /// Parties attached to this order, in submission order.
    pub parties: Vec<Party>,
    /// The session that owns this order.
    pub session: SessionHandle,
    /// The instrument this order was placed against.
    pub instrument: InstrumentDescriptor,
    /// The time used for price-time priority. Assigned on accept;
    /// re-assigned on amend only when price changes or quantity
    /// increases (spec §9, kept verbatim: an equal-price,
    /// non-increasing-quantity amend does not lose queue priority).
    pub order_time: DateTime<Utc>,
    /// Per-order execution-id generator, seeded from `order_id`.
    #[serde(skip)]
    pub execution_ids: Option<ExecutionIdGenerator>,
}

impl LimitOrder {
    /// Leaves quantity: `max(total - executed, 0)`.
    pub fn leaves(&self) -> u64 {
        self.total_quantity.saturating_sub(self.cumulative_quantity)
    }

    /// Whether this order still has quantity to trade.
    pub fn is_resting_eligible(&self) -> bool {
        self.leaves() > 0
            && !matches!(
                self.status,
                OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
            )
    }

    /// Allocates the next execution id for this order, lazily creating
    /// the generator on first use (orders built via `Default`-ish paths
    /// in tests may not have one pre-seeded).
    pub fn next_execution_id(&mut self) -> String {
        self.execution_ids
            .get_or_insert_with(|| ExecutionIdGenerator::seeded_from(self.order_id))
            .next_execution_id()
    }

    /// Applies an execution of `quantity` against this order, updating
    /// cumulative quantity and status. Panics (logic error, not a
    /// `Result`) if `quantity` would push `cumulative_quantity` above
    /// `total_quantity` — callers are expected to clamp to `leaves()`
    /// before calling.
    pub fn apply_execution(&mut self, quantity: u64) {
        let new_cumulative = self.cumulative_quantity + quantity;
        debug_assert!(
            new_cumulative <= self.total_quantity,
            "execution overfilled order {}",
            self.order_id
        );
        self.cumulative_quantity = new_cumulative.min(self.total_quantity);
        self.status = if self.leaves() == 0 {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
    }

    /// Applies an amendment's price/quantity update (spec §4.4 "Amend
    /// limit"). The caller is responsible for having already verified
    /// `new_total_quantity > self.cumulative_quantity` and that
    /// time-in-force is unchanged — this method only applies the update
    /// and decides whether `order_time` is refreshed.
    ///
    /// `order_time` is refreshed when the price changes or the quantity
    /// increases; an equal-price, non-increasing-quantity amend keeps the
    /// original time and therefore the original queue priority.
    pub fn apply_amend(&mut self, new_price: u128, new_total_quantity: u64, now: DateTime<Utc>) {
        let price_changed = new_price != self.price;
        let quantity_increased = new_total_quantity > self.total_quantity;

        self.price = new_price;
        self.total_quantity = new_total_quantity;
        self.status = OrderStatus::Modified;

        if price_changed || quantity_increased {
            self.order_time = now;
        }
    }
}
