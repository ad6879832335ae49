//! The typed event union every engine operation emits (spec §3 "Event",
//! §4.11 "Event dispatcher").
//!
//! Every outward-facing effect of the engine — a reply to the session
//! that sent a request, or a notification for the order book / market
//! data side — is represented as one [`Event`] and collected in emission
//! order. The dispatcher (`dispatcher.rs`) is the only thing that knows
//! how to route each variant; everything upstream just appends to a
//! `Vec<Event>`.

use crate::order::{InstrumentDescriptor, Side};
use crate::reply::{
    BusinessMessageReject, ExecutionReport, OrderCancellationConfirmation, OrderCancellationReject,
    OrderModificationConfirmation, OrderModificationReject, OrderPlacementConfirmation,
    OrderPlacementReject, SecurityStatus,
};
use crate::subscription::{MarketDataReject, MarketDataSnapshot, MarketDataUpdate};
use crate::trade_cache::TradeRecord;

/// A reply addressed to a single client session.
#[derive(Debug, Clone)]
pub enum ClientNotification {
    /// `OrderPlacementRequest` accepted.
    PlacementConfirmation(OrderPlacementConfirmation),
    /// `OrderPlacementRequest` rejected.
    PlacementReject(OrderPlacementReject),
    /// `OrderModificationRequest` accepted.
    ModificationConfirmation(OrderModificationConfirmation),
    /// `OrderModificationRequest` rejected.
    ModificationReject(OrderModificationReject),
    /// `OrderCancellationRequest` accepted.
    CancellationConfirmation(OrderCancellationConfirmation),
    /// `OrderCancellationRequest` rejected.
    CancellationReject(OrderCancellationReject),
    /// A fill against one of the session's orders.
    ExecutionReport(ExecutionReport),
    /// A market-data snapshot delivered in response to a subscribe or
    /// snapshot request.
    MarketDataSnapshot(MarketDataSnapshot),
    /// An incremental market-data update delivered to a subscriber.
    MarketDataUpdate(MarketDataUpdate),
    /// A market-data request rejected.
    MarketDataReject(MarketDataReject),
    /// A `SecurityStatusRequest` answered.
    SecurityStatus(SecurityStatus),
    /// A request that could not even be classified well enough for a
    /// specific reject type.
    BusinessMessageReject(BusinessMessageReject),
}

/// A single resting-order lifecycle change, used to drive depth/top
/// recomputation (spec §4.7). Carries only what the depth cache needs —
/// the full order lives in the book.
#[derive(Debug, Clone)]
pub enum OrderBookNotification {
    /// A new order started resting.
    OrderAdded {
        /// Instrument the order rests on.
        instrument: InstrumentDescriptor,
        /// Venue order id.
        order_id: u64,
        /// Order side.
        side: Side,
        /// Limit price.
        price: u128,
        /// Leaves quantity at the moment of insertion.
        leaves_quantity: u64,
    },
    /// A resting order's leaves quantity changed (partial fill or
    /// amend) without leaving the book.
    OrderReduced {
        /// Instrument the order rests on.
        instrument: InstrumentDescriptor,
        /// Venue order id.
        order_id: u64,
        /// Order side.
        side: Side,
        /// Price the order rests at (unchanged by a quantity-only
        /// reduction; a price amend is reported as remove+add).
        price: u128,
        /// Leaves quantity after the change.
        leaves_quantity: u64,
    },
    /// A resting order left the book (filled, cancelled, eliminated, or
    /// amended with a price change).
    OrderRemoved {
        /// Instrument the order rested on.
        instrument: InstrumentDescriptor,
        /// Venue order id.
        order_id: u64,
        /// Order side.
        side: Side,
        /// Price the order rested at.
        price: u128,
    },
    /// A trade occurred.
    Trade {
        /// Instrument the trade occurred on.
        instrument: InstrumentDescriptor,
        /// Trade id, unique per instrument.
        trade_id: u64,
        /// Trade price.
        price: u128,
        /// Trade quantity.
        quantity: u64,
        /// The side of the aggressor (taker).
        aggressor_side: Side,
    },
    /// The trade cache was recovered from an external value (spec
    /// §4.8): `Some(trade)` resets retained history to that single
    /// trade; `None` clears it entirely.
    LastTradeRecover {
        /// Instrument the recovery applies to.
        instrument: InstrumentDescriptor,
        /// The trade to install as the sole retained entry, if any.
        trade: Option<TradeRecord>,
    },
    /// The instrument-info cache was recovered from an external value
    /// (spec §4.9): `Some((low, high))` replaces both bounds; `None`
    /// marks them for deletion on the next publish cycle.
    InstrumentInfoRecover {
        /// Instrument the recovery applies to.
        instrument: InstrumentDescriptor,
        /// The `(low, high)` pair to install, if any.
        value: Option<(u128, u128)>,
    },
}

/// The full event union a single engine operation can emit.
#[derive(Debug, Clone)]
pub enum Event {
    /// A reply addressed to a client session.
    Client(ClientNotification),
    /// A notification for order-book/market-data consumers.
    Book(OrderBookNotification),
}

impl From<ClientNotification> for Event {
    fn from(notification: ClientNotification) -> Self {
        Event::Client(notification)
    }
}

impl From<OrderBookNotification> for Event {
    fn from(notification: OrderBookNotification) -> Self {
        Event::Book(notification)
    }
}
