//! Recent-trade cache (spec §4.8 "Trade cache"), used to answer
//! recovery requests with the last trade without replaying the whole
//! day's tape.

use crate::order::Side;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One recorded trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Trade id, unique per instrument.
    pub trade_id: u64,
    /// Trade price.
    pub price: u128,
    /// Trade quantity.
    pub quantity: u64,
    /// The side of the aggressor (taker).
    pub aggressor_side: Side,
    /// When the trade occurred.
    pub timestamp: DateTime<Utc>,
}

/// Keeps the most recent trades up to a fixed capacity, with the single
/// most recent one accessible in O(1) for recovery replies.
#[derive(Debug, Clone)]
pub struct TradeCache {
    recent: VecDeque<TradeRecord>,
    capacity: usize,
}

impl TradeCache {
    /// Creates a cache retaining at most `capacity` trades.
    pub fn new(capacity: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records a trade, evicting the oldest entry if at capacity.
    pub fn record(&mut self, trade: TradeRecord) {
        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(trade);
    }

    /// The most recently recorded trade, if any (spec §4.8
    /// "LastTradeRecover").
    pub fn last(&self) -> Option<TradeRecord> {
        self.recent.back().copied()
    }

    /// Applies a `LastTradeRecover` event (spec §4.8): `Some(trade)`
    /// resets retained history to that single trade; `None` clears it
    /// entirely.
    pub fn recover(&mut self, trade: Option<TradeRecord>) {
        self.recent.clear();
        if let Some(trade) = trade {
            self.recent.push_back(trade);
        }
    }

    /// The retained trades, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &TradeRecord> {
        self.recent.iter()
    }

    /// Number of trades currently retained.
    pub fn len(&self) -> usize {
        self.recent.len()
    }

    /// Whether no trades have been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }
}
