//! Core order enums (spec §3 "Order (limit)").

use serde::{Deserialize, Serialize};
use std::fmt;

/// The side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Standard buy.
    Buy,
    /// Standard sell, from a long position.
    Sell,
    /// Sell from a borrowed position.
    SellShort,
    /// Short sale exempt from the uptick/locate restrictions that
    /// ordinarily apply to `SellShort`.
    SellShortExempt,
}

impl Side {
    /// The opposite side, used to pick which page an aggressor scans.
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell | Side::SellShort | Side::SellShortExempt => Side::Buy,
        }
    }

    /// Whether this side is a buy for matching/comparator purposes. All
    /// three sell flavors behave identically in the book.
    pub fn is_buy(self) -> bool {
        matches!(self, Side::Buy)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
            Side::SellShort => "SellShort",
            Side::SellShortExempt => "SellShortExempt",
        };
        write!(f, "{s}")
    }
}

/// Time-in-force flavors (GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Expires at local-date rollover.
    Day,
    /// Immediate-or-cancel.
    Ioc,
    /// Fill-or-kill.
    Fok,
    /// Good-till-date.
    Gtd,
    /// Good-till-cancel.
    Gtc,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeInForce::Day => "Day",
            TimeInForce::Ioc => "IOC",
            TimeInForce::Fok => "FOK",
            TimeInForce::Gtd => "GTD",
            TimeInForce::Gtc => "GTC",
        };
        write!(f, "{s}")
    }
}

/// Order status lifecycle (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Freshly accepted, no executions yet.
    New,
    /// At least one execution, leaves remain.
    PartiallyFilled,
    /// Fully executed.
    Filled,
    /// Cancelled (explicitly or via elimination).
    Cancelled,
    /// Amended since acceptance.
    Modified,
    /// Rejected at entry; never rested.
    Rejected,
}

/// A session handle: an opaque identifier for the client session owning
/// an order. The matching core never interprets this value beyond
/// equality comparisons (spec §9 "Cycles / back-references": "Orders
/// reference their owning session... never the book").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionHandle(pub String);

impl SessionHandle {
    /// Wraps a raw session identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An opaque instrument descriptor, validated against the engine's own
/// instrument by identity comparison only — the engine never resolves
/// instrument metadata itself (spec §1 "Out of scope: the reference-data
/// store").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstrumentDescriptor(pub String);

impl InstrumentDescriptor {
    /// Wraps a raw instrument identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}
