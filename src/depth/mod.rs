//! Aggregated market depth: folding the book into price levels and
//! building full/incremental updates from the result (spec §4.7).

mod builder;
mod sheet;

pub use builder::{
    build_full_depth_update, build_incremental_depth_update, DepthLevelReport, FullDepthUpdate,
    IncrementalDepthUpdate, LevelStatus,
};
pub use sheet::{fold, DepthLevel, DepthSheet};

use crate::book::OrderBook;
use serde::{Deserialize, Serialize};

/// A snapshot of top-of-book state, supplementing the spec's depth
/// levels with the derived best-bid/best-ask/spread/mid-price view a
/// consumer typically wants without building a full depth update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BookTop {
    /// Best bid price, if any.
    pub best_bid: Option<u128>,
    /// Best offer price, if any.
    pub best_offer: Option<u128>,
}

impl BookTop {
    /// Captures top-of-book from the order book directly (spec §B: no
    /// dependency on a previously-folded [`DepthSheet`]).
    pub fn capture(book: &OrderBook) -> Self {
        Self {
            best_bid: book.best_bid_price(),
            best_offer: book.best_offer_price(),
        }
    }

    /// `best_offer - best_bid`, when both sides have resting orders.
    pub fn spread(&self) -> Option<u128> {
        match (self.best_bid, self.best_offer) {
            (Some(bid), Some(offer)) if offer >= bid => Some(offer - bid),
            _ => None,
        }
    }

    /// `(best_bid + best_offer) / 2`, truncated — this engine carries no
    /// tick-rounding rule for a derived mid-price (spec §B, open
    /// question resolved in favor of exposing the raw average).
    pub fn mid_price(&self) -> Option<u128> {
        match (self.best_bid, self.best_offer) {
            (Some(bid), Some(offer)) => Some((bid + offer) / 2),
            _ => None,
        }
    }
}
