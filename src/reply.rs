//! External message surface and reply builders (spec §6 "External
//! interfaces", §9 "Builder pattern for messages").
//!
//! Reply construction is naturally a builder in this domain: every
//! confirmation/report/reject is assembled from an [`OrderView`] (a
//! read-only borrow of just the fields a reply needs) plus a small
//! options value, mirroring the reference crate's
//! `TradeResult::with_fees(symbol, match_result, fee_schedule)`
//! constructor-with-options idiom.

use crate::order::{InstrumentDescriptor, LimitOrder, OrderStatus, SessionHandle, Side, TimeInForce};
use crate::party::Party;
use serde::{Deserialize, Serialize};

/// A read-only view of the order fields a reply needs, so builders don't
/// have to take a full mutable order just to describe it.
#[derive(Debug, Clone)]
pub struct OrderView {
    /// The venue order id.
    pub order_id: u64,
    /// Order side.
    pub side: Side,
    /// Order price; `None` for market orders.
    pub price: Option<u128>,
    /// Total (original) quantity.
    pub total_quantity: u64,
    /// Cumulative executed quantity.
    pub cumulative_quantity: u64,
    /// Current status.
    pub status: OrderStatus,
    /// Time-in-force.
    pub time_in_force: TimeInForce,
    /// Client-assigned order id, if any.
    pub client_order_id: Option<String>,
    /// The session that owns the order.
    pub session: SessionHandle,
    /// The instrument the order was placed against.
    pub instrument: InstrumentDescriptor,
    /// Parties attached to the order.
    pub parties: Vec<Party>,
}

impl OrderView {
    /// Leaves quantity.
    pub fn leaves(&self) -> u64 {
        self.total_quantity.saturating_sub(self.cumulative_quantity)
    }
}

impl From<&LimitOrder> for OrderView {
    fn from(order: &LimitOrder) -> Self {
        Self {
            order_id: order.order_id,
            side: order.side,
            price: Some(order.price),
            total_quantity: order.total_quantity,
            cumulative_quantity: order.cumulative_quantity,
            status: order.status,
            time_in_force: order.time_in_force,
            client_order_id: order.client_order_id.clone(),
            session: order.session.clone(),
            instrument: order.instrument.clone(),
            parties: order.parties.clone(),
        }
    }
}

impl From<&crate::order::MarketOrder> for OrderView {
    fn from(order: &crate::order::MarketOrder) -> Self {
        Self {
            order_id: order.order_id,
            side: order.side,
            price: None,
            total_quantity: order.total_quantity,
            cumulative_quantity: order.cumulative_quantity,
            status: order.status,
            time_in_force: crate::order::MarketOrder::TIME_IN_FORCE,
            client_order_id: order.client_order_id.clone(),
            session: order.session.clone(),
            instrument: order.instrument.clone(),
            parties: order.parties.clone(),
        }
    }
}

/// `OrderPlacementRequest` → confirmation (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacementConfirmation {
    /// The venue order id assigned at accept time.
    pub order_id: u64,
    /// The auxiliary execution id seeded from `order_id`.
    pub execution_id: String,
    /// Session the confirmation is addressed to.
    pub session: SessionHandle,
    /// Client-assigned order id echoed back, if any.
    pub client_order_id: Option<String>,
    /// Instrument the order was placed against.
    pub instrument: InstrumentDescriptor,
}

/// `OrderPlacementRequest` → reject (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacementReject {
    /// The venue order id assigned even on reject (spec §6, §9).
    pub order_id: u64,
    /// The auxiliary execution id seeded from `order_id`.
    pub execution_id: String,
    /// Session the reject is addressed to.
    pub session: SessionHandle,
    /// Client-assigned order id echoed back, if any.
    pub client_order_id: Option<String>,
    /// Human-readable rejection reason.
    pub reason: String,
}

/// `OrderModificationRequest` → confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderModificationConfirmation {
    /// The venue order id affected.
    pub order_id: u64,
    /// Session the confirmation is addressed to.
    pub session: SessionHandle,
    /// Client-assigned order id echoed back, if any.
    pub client_order_id: Option<String>,
    /// New price after the amend.
    pub price: u128,
    /// New total quantity after the amend.
    pub total_quantity: u64,
}

/// `OrderModificationRequest` → reject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderModificationReject {
    /// Session the reject is addressed to.
    pub session: SessionHandle,
    /// Client-assigned order id echoed back, if any.
    pub client_order_id: Option<String>,
    /// Venue order id, if the request named one.
    pub order_id: Option<u64>,
    /// Human-readable rejection reason.
    pub reason: String,
}

/// `OrderCancellationRequest` → confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancellationConfirmation {
    /// The venue order id cancelled.
    pub order_id: u64,
    /// Session the confirmation is addressed to.
    pub session: SessionHandle,
    /// Client-assigned order id echoed back, if any.
    pub client_order_id: Option<String>,
}

/// `OrderCancellationRequest` → reject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancellationReject {
    /// Session the reject is addressed to.
    pub session: SessionHandle,
    /// Client-assigned order id echoed back, if any.
    pub client_order_id: Option<String>,
    /// Venue order id, if the request named one.
    pub order_id: Option<u64>,
    /// Human-readable rejection reason.
    pub reason: String,
}

/// Execution type of an [`ExecutionReport`]. Only `OrderTraded` is
/// produced by this engine (spec §6); the enum stays open for future
/// execution types a gateway might synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionType {
    /// A trade occurred against this order.
    OrderTraded,
}

/// Per-trade, per-side execution report (spec §6 "ExecutionReport").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Execution type; always `OrderTraded` from this engine.
    pub execution_type: ExecutionType,
    /// The venue order id this report describes.
    pub order_id: u64,
    /// The execution id for this specific fill.
    pub execution_id: String,
    /// Session the report is addressed to.
    pub session: SessionHandle,
    /// Client-assigned order id echoed back, if any.
    pub client_order_id: Option<String>,
    /// Execution price.
    pub execution_price: u128,
    /// Execution quantity.
    pub execution_quantity: u64,
    /// Order status after this execution.
    pub status: OrderStatus,
    /// Leaves quantity after this execution.
    pub leaves_quantity: u64,
    /// Cumulative executed quantity after this execution.
    pub cumulative_quantity: u64,
    /// Parties on the order, with the counterparty appended as
    /// `ContraFirm` when known (spec §4.3).
    pub parties: Vec<Party>,
}

/// `SecurityStatusRequest` → `SecurityStatus` (spec §4.6, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityStatus {
    /// Instrument the status applies to.
    pub instrument: InstrumentDescriptor,
    /// Current trading phase.
    pub trading_phase: crate::phase::TradingPhase,
    /// Current trading status.
    pub trading_status: crate::phase::TradingStatus,
}

/// An unclassifiable protocol error (spec §6 "BusinessMessageReject").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessMessageReject {
    /// Session the reject is addressed to, if known.
    pub session: Option<SessionHandle>,
    /// Human-readable rejection reason.
    pub reason: String,
}

/// Builds an [`OrderPlacementConfirmation`] from an order view and a
/// freshly-minted execution id.
pub fn build_placement_confirmation(
    view: &OrderView,
    execution_id: String,
) -> OrderPlacementConfirmation {
    OrderPlacementConfirmation {
        order_id: view.order_id,
        execution_id,
        session: view.session.clone(),
        client_order_id: view.client_order_id.clone(),
        instrument: view.instrument.clone(),
    }
}

/// Builds an [`OrderPlacementReject`] for an order id that was still
/// allocated before the reject decision (spec §9).
pub fn build_placement_reject(
    order_id: u64,
    execution_id: String,
    session: SessionHandle,
    client_order_id: Option<String>,
    reason: impl Into<String>,
) -> OrderPlacementReject {
    OrderPlacementReject {
        order_id,
        execution_id,
        session,
        client_order_id,
        reason: reason.into(),
    }
}

/// Builds a pair of per-side [`ExecutionReport`]s for one match, with the
/// counterparty appended as `ContraFirm` when its party id is known.
pub fn build_execution_report(
    view: &OrderView,
    execution_id: String,
    execution_price: u128,
    execution_quantity: u64,
    counterparty: Option<Party>,
) -> ExecutionReport {
    let mut parties = view.parties.clone();
    if let Some(counterparty) = counterparty {
        parties.push(Party {
            role: crate::party::PartyRole::ContraFirm,
            ..counterparty
        });
    }
    ExecutionReport {
        execution_type: ExecutionType::OrderTraded,
        order_id: view.order_id,
        execution_id,
        session: view.session.clone(),
        client_order_id: view.client_order_id.clone(),
        execution_price,
        execution_quantity,
        status: view.status,
        leaves_quantity: view.leaves(),
        cumulative_quantity: view.cumulative_quantity,
        parties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderStatus;

    fn sample_view() -> OrderView {
        OrderView {
            order_id: 1,
            side: Side::Buy,
            price: Some(100),
            total_quantity: 10,
            cumulative_quantity: 4,
            status: OrderStatus::PartiallyFilled,
            time_in_force: TimeInForce::Day,
            client_order_id: Some("cid".to_string()),
            session: SessionHandle::new("s"),
            instrument: InstrumentDescriptor::new("X"),
            parties: vec![],
        }
    }

    #[test]
    fn execution_report_carries_leaves_and_cumulative() {
        let view = sample_view();
        let report = build_execution_report(&view, "1-1".to_string(), 100, 4, None);
        assert_eq!(report.leaves_quantity, 6);
        assert_eq!(report.cumulative_quantity, 4);
    }

    #[test]
    fn execution_report_appends_counterparty_as_contra_firm() {
        let view = sample_view();
        let counterparty = Party::new("other-acct", "FIX", crate::party::PartyRole::EnteringFirm);
        let report = build_execution_report(&view, "1-1".to_string(), 100, 4, Some(counterparty));
        let contra = report
            .parties
            .iter()
            .find(|p| p.role == crate::party::PartyRole::ContraFirm)
            .expect("contra firm present");
        assert_eq!(contra.id, "other-acct");
    }

    #[test]
    fn placement_reject_keeps_the_allocated_order_id() {
        let reject = build_placement_reject(
            7,
            "7-1".to_string(),
            SessionHandle::new("s"),
            None,
            "quantity must be greater than zero",
        );
        assert_eq!(reject.order_id, 7);
        assert_eq!(reject.execution_id, "7-1");
    }
}
