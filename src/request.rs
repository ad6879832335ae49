//! Protocol request shapes and the interpreter that turns each one into a
//! typed, already-validated intent or a [`RequestError`] (spec §4.2
//! "Request interpreter").
//!
//! Requests arrive as loosely-typed wire messages — optional fields,
//! string-encoded enums — because a missing or garbled field is exactly
//! the shape of mistake a reject message needs to describe. The
//! interpreter's job is to narrow that into a strict internal type once,
//! at the edge, so nothing downstream has to re-check for `None`.

use crate::order::{InstrumentDescriptor, Side, SessionHandle, TimeInForce};
use crate::party::Party;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-fatal request-interpretation failure (spec §4.2): every variant
/// becomes a reject message, never a panic.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RequestError {
    /// `order_type` was not present on a placement request.
    OrderTypeMissing,
    /// `order_type` was present but not a recognized value.
    OrderTypeInvalid(String),
    /// `side` was not present.
    SideMissing,
    /// `side` was present but not a recognized value.
    SideInvalid(String),
    /// `time_in_force` was present but not a recognized value.
    TimeInForceInvalid(String),
    /// A limit placement had no `price`.
    PriceMissing,
    /// A placement had no `quantity`.
    QuantityMissing,
    /// An `order_id` was present but doesn't parse/resolve.
    OrderIdInvalid,
    /// Neither `order_id` nor `client_order_id` was present, and the
    /// request kind requires one to identify its target order.
    OrderIdentifierMissing,
    /// `(session, client_order_id)` did not resolve to exactly one
    /// resting order — either none, or more than one (a uniqueness
    /// violation that should never arise but is guarded defensively).
    OrderNotUniquelyIdentified,
    /// An amend request named no field to change.
    AmendHasNoChanges,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::OrderTypeMissing => write!(f, "order_type is required"),
            RequestError::OrderTypeInvalid(raw) => write!(f, "order_type '{raw}' is not recognized"),
            RequestError::SideMissing => write!(f, "side is required"),
            RequestError::SideInvalid(raw) => write!(f, "side '{raw}' is not recognized"),
            RequestError::TimeInForceInvalid(raw) => {
                write!(f, "time_in_force '{raw}' is not recognized")
            }
            RequestError::PriceMissing => write!(f, "price is required for a limit order"),
            RequestError::QuantityMissing => write!(f, "quantity is required"),
            RequestError::OrderIdInvalid => write!(f, "order_id does not resolve to a known order"),
            RequestError::OrderIdentifierMissing => {
                write!(f, "either order_id or client_order_id is required")
            }
            RequestError::OrderNotUniquelyIdentified => {
                write!(f, "(session, client_order_id) did not resolve to exactly one order")
            }
            RequestError::AmendHasNoChanges => write!(f, "amend request named no field to change"),
        }
    }
}

impl std::error::Error for RequestError {}

/// The two order types a placement request can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderType {
    /// A priced, potentially resting order.
    Limit,
    /// An unpriced, always-IOC order.
    Market,
}

fn parse_order_type(raw: Option<&str>) -> Result<OrderType, RequestError> {
    match raw {
        None => Err(RequestError::OrderTypeMissing),
        Some("LIMIT") => Ok(OrderType::Limit),
        Some("MARKET") => Ok(OrderType::Market),
        Some(other) => Err(RequestError::OrderTypeInvalid(other.to_string())),
    }
}

fn parse_side(raw: Option<&str>) -> Result<Side, RequestError> {
    match raw {
        None => Err(RequestError::SideMissing),
        Some("BUY") => Ok(Side::Buy),
        Some("SELL") => Ok(Side::Sell),
        Some("SELL_SHORT") => Ok(Side::SellShort),
        Some("SELL_SHORT_EXEMPT") => Ok(Side::SellShortExempt),
        Some(other) => Err(RequestError::SideInvalid(other.to_string())),
    }
}

fn parse_time_in_force(raw: &str) -> Result<TimeInForce, RequestError> {
    match raw {
        "DAY" => Ok(TimeInForce::Day),
        "IOC" => Ok(TimeInForce::Ioc),
        "FOK" => Ok(TimeInForce::Fok),
        "GTD" => Ok(TimeInForce::Gtd),
        "GTC" => Ok(TimeInForce::Gtc),
        other => Err(RequestError::TimeInForceInvalid(other.to_string())),
    }
}

/// The wire shape of an order placement request (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacementRequest {
    /// Session submitting the request.
    pub session: SessionHandle,
    /// Instrument the order targets.
    pub instrument: InstrumentDescriptor,
    /// Client-assigned order id, echoed back on every reply.
    pub client_order_id: Option<String>,
    /// Raw order type string: `"LIMIT"` or `"MARKET"`.
    pub order_type: Option<String>,
    /// Raw side string.
    pub side: Option<String>,
    /// Limit price; required for `LIMIT`, ignored for `MARKET`.
    pub price: Option<u128>,
    /// Order quantity.
    pub quantity: Option<u64>,
    /// Raw time-in-force string; defaults to `"DAY"` when absent.
    pub time_in_force: Option<String>,
    /// Absolute GTD expiry instant.
    pub expire_time: Option<DateTime<Utc>>,
    /// Local-date GTD expiry.
    pub expire_date: Option<NaiveDate>,
    /// Short-sale-exempt reason code, if applicable.
    pub short_sale_exempt_reason: Option<String>,
    /// Parties attached to the order.
    #[serde(default)]
    pub parties: Vec<Party>,
}

/// A limit placement, fully parsed and ready for validation.
#[derive(Debug, Clone)]
pub struct LimitPlacement {
    /// Order side.
    pub side: Side,
    /// Limit price.
    pub price: u128,
    /// Order quantity.
    pub quantity: u64,
    /// Time-in-force.
    pub time_in_force: TimeInForce,
    /// Absolute GTD expiry instant.
    pub expire_time: Option<DateTime<Utc>>,
    /// Local-date GTD expiry.
    pub expire_date: Option<NaiveDate>,
    /// Short-sale-exempt reason code, if applicable.
    pub short_sale_exempt_reason: Option<String>,
}

/// A market placement, fully parsed and ready for validation.
#[derive(Debug, Clone)]
pub struct MarketPlacement {
    /// Order side.
    pub side: Side,
    /// Order quantity.
    pub quantity: u64,
}

/// The interpreted intent of an [`OrderPlacementRequest`].
#[derive(Debug, Clone)]
pub enum PlacementIntent {
    /// A limit placement.
    Limit(LimitPlacement),
    /// A market placement.
    Market(MarketPlacement),
}

/// Interprets a placement request, narrowing its optional wire fields
/// into a strict intent or the first [`RequestError`] encountered (spec
/// §4.2: "Placement: requires order_type, side, and (for limit) price;
/// quantity is always required.").
pub fn interpret_placement(req: &OrderPlacementRequest) -> Result<PlacementIntent, RequestError> {
    let order_type = parse_order_type(req.order_type.as_deref())?;
    let side = parse_side(req.side.as_deref())?;
    let quantity = req.quantity.ok_or(RequestError::QuantityMissing)?;

    match order_type {
        OrderType::Limit => {
            let price = req.price.ok_or(RequestError::PriceMissing)?;
            let time_in_force = match req.time_in_force.as_deref() {
                None => TimeInForce::Day,
                Some(raw) => parse_time_in_force(raw)?,
            };
            Ok(PlacementIntent::Limit(LimitPlacement {
                side,
                price,
                quantity,
                time_in_force,
                expire_time: req.expire_time,
                expire_date: req.expire_date,
                short_sale_exempt_reason: req.short_sale_exempt_reason.clone(),
            }))
        }
        OrderType::Market => Ok(PlacementIntent::Market(MarketPlacement { side, quantity })),
    }
}

/// The wire shape of an order modification (amend) request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderModificationRequest {
    /// Session submitting the request.
    pub session: SessionHandle,
    /// Venue order id, if known to the client.
    pub order_id: Option<u64>,
    /// Client-assigned order id, used to resolve the order when
    /// `order_id` is absent.
    pub client_order_id: Option<String>,
    /// New price, if changing.
    pub new_price: Option<u128>,
    /// New total quantity, if changing.
    pub new_quantity: Option<u64>,
}

/// An interpreted amend intent: at least one of price/quantity is set.
#[derive(Debug, Clone)]
pub struct ModificationIntent {
    /// New price, if the request changes it.
    pub new_price: Option<u128>,
    /// New total quantity, if the request changes it.
    pub new_quantity: Option<u64>,
}

/// Interprets a modification request (spec §4.2: "Modification: requires
/// an identifier (order_id or client_order_id) and at least one field to
/// change.").
pub fn interpret_modification(
    req: &OrderModificationRequest,
) -> Result<ModificationIntent, RequestError> {
    if req.order_id.is_none() && req.client_order_id.is_none() {
        return Err(RequestError::OrderIdentifierMissing);
    }
    if req.new_price.is_none() && req.new_quantity.is_none() {
        return Err(RequestError::AmendHasNoChanges);
    }
    Ok(ModificationIntent {
        new_price: req.new_price,
        new_quantity: req.new_quantity,
    })
}

/// The wire shape of an order cancellation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancellationRequest {
    /// Session submitting the request.
    pub session: SessionHandle,
    /// Venue order id, if known to the client.
    pub order_id: Option<u64>,
    /// Client-assigned order id, used to resolve the order when
    /// `order_id` is absent.
    pub client_order_id: Option<String>,
}

/// Interprets a cancellation request (spec §4.2: "Cancellation: requires
/// an identifier; no other fields are read.").
pub fn interpret_cancellation(req: &OrderCancellationRequest) -> Result<(), RequestError> {
    if req.order_id.is_none() && req.client_order_id.is_none() {
        return Err(RequestError::OrderIdentifierMissing);
    }
    Ok(())
}

/// The action a market data request names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketDataAction {
    /// Subscribe to incremental updates.
    Subscribe,
    /// Unsubscribe from updates previously subscribed to.
    Unsubscribe,
    /// Request a one-shot snapshot with no ongoing subscription.
    Snapshot,
}

/// The wire shape of a market data request (spec §4.10, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataRequest {
    /// Caller-assigned identifier for this request, the key a
    /// `Subscribe`/`Unsubscribe` pair is indexed and matched by (spec
    /// §4.10: "must have request-id... index by (request-id,
    /// session)").
    pub request_id: String,
    /// Session submitting the request.
    pub session: SessionHandle,
    /// Instrument to subscribe/unsubscribe/snapshot.
    pub instrument: InstrumentDescriptor,
    /// The action requested.
    pub action: MarketDataAction,
    /// Raw streaming-setting tokens, interpreted by the subscription
    /// manager (e.g. `"DEPTH"`, `"TRADES"`, `"TOP"`).
    #[serde(default)]
    pub settings: Vec<String>,
    /// Requested depth of book. Only `None` (full depth) and `Some(1)`
    /// (top-of-book only) are supported (spec §4.10: "market_depth ∈
    /// {unset, 1}").
    #[serde(default)]
    pub market_depth: Option<u8>,
    /// When set, every publish cycle re-sends this subscriber a full
    /// snapshot instead of an incremental update.
    #[serde(default)]
    pub full_updates: bool,
}

/// The wire shape of a security status request (spec §4.6, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityStatusRequest {
    /// Session submitting the request.
    pub session: SessionHandle,
    /// Instrument to report status for.
    pub instrument: InstrumentDescriptor,
}
