//! Fatal logic-error layer (spec §7, layer 2).
//!
//! These errors represent violations of internal invariants, never a
//! client problem. They are not meant to be handled and recovered from
//! in the normal sense: a caller that observes one has a bug in the
//! surrounding orchestration (double-dispatch, a corrupted snapshot fed
//! back in, an exhaustive switch that somehow missed a variant). They are
//! kept as an ordinary `Result` error type rather than a panic so the
//! process boundary can choose how to fail (log and restart the engine
//! instance, abort, etc.).

use std::fmt;

/// A violation of an internal invariant of the matching core.
///
/// Request-level problems (bad price, unknown order, insufficient FOK
/// liquidity) are never represented here — see [`crate::request::RequestError`]
/// and [`crate::validator::Conclusion`] for those.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LogicError {
    /// Two components at the same price level in a depth sheet carry the
    /// same order id.
    DuplicateOrderInDepthNode {
        /// The price the duplicate was found at.
        price: u128,
        /// The order id that appeared twice.
        order_id: u64,
    },

    /// A reduce/remove notification referenced a price that has no node
    /// in the depth sheet.
    DepthNodeMissing {
        /// The price the notification targeted.
        price: Option<u128>,
    },

    /// An IOC taker reached the matching loop with no facing orders after
    /// its precondition check reported that facing orders exist.
    NoFacingOrdersAfterPrecondition {
        /// The taker order id.
        taker_order_id: u64,
    },

    /// An exhaustive enum switch reached a branch that should be
    /// statically unreachable. Reaching this is a hard failure — the
    /// contract spec §9 "Enum exhaustiveness" describes.
    Unreachable {
        /// Where in the code this was raised, for diagnostics.
        location: &'static str,
    },
}

impl fmt::Display for LogicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicError::DuplicateOrderInDepthNode { price, order_id } => write!(
                f,
                "duplicate order {order_id} in depth node at price {price}"
            ),
            LogicError::DepthNodeMissing { price } => match price {
                Some(price) => write!(f, "depth node missing for price {price}"),
                None => write!(f, "depth node missing for sentinel (market) price"),
            },
            LogicError::NoFacingOrdersAfterPrecondition { taker_order_id } => write!(
                f,
                "IOC taker {taker_order_id} had no facing orders after precondition passed"
            ),
            LogicError::Unreachable { location } => {
                write!(f, "unreachable branch reached at {location}")
            }
        }
    }
}

impl std::error::Error for LogicError {}
