//! A single side of the order book: a price-time-ordered sequence of
//! resting limit orders (spec §3 "Order book").

use super::comparator::{BookSide, PriceTimeKey};
use crate::order::LimitOrder;
use chrono::{DateTime, Utc};

impl PriceTimeKey for LimitOrder {
    fn key_price(&self) -> Option<u128> {
        Some(self.price)
    }

    fn key_time(&self) -> DateTime<Utc> {
        self.order_time
    }
}

/// One side (bid or offer) of an order book: resting limit orders kept
/// sorted best-first by the better-order comparator.
///
/// Insertion is an upper-bound binary search placement (`O(log n)`
/// comparisons, `O(n)` for the underlying shift — matching the spec's
/// complexity note, which describes the comparison cost, not a claim
/// about a tree-backed structure). Erase is a contiguous prefix erase,
/// used for filled-order cleanup after matching (spec §4.3: "filled
/// makers are erased from the opposite page as a contiguous prefix").
#[derive(Debug, Clone, Default)]
pub struct Page {
    side: Option<BookSide>,
    orders: Vec<LimitOrder>,
}

impl Page {
    /// Creates an empty page for the given book side.
    pub fn new(side: BookSide) -> Self {
        Self {
            side: Some(side),
            orders: Vec::new(),
        }
    }

    /// The book side this page represents.
    pub fn side(&self) -> BookSide {
        self.side.expect("page side is always set after construction")
    }

    /// The number of resting orders.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Whether the page has no resting orders.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Iterates orders best-first.
    pub fn iter(&self) -> impl Iterator<Item = &LimitOrder> {
        self.orders.iter()
    }

    /// Returns the best (first) resting order, if any.
    pub fn best(&self) -> Option<&LimitOrder> {
        self.orders.first()
    }

    /// Returns the best (first) resting order, mutably — used by the
    /// matcher to apply executions in place before erasing the
    /// now-filled contiguous prefix (spec §4.3).
    pub fn best_mut(&mut self) -> Option<&mut LimitOrder> {
        self.orders.first_mut()
    }

    /// Finds the index of a resting order by id.
    pub fn find_index(&self, order_id: u64) -> Option<usize> {
        self.orders.iter().position(|o| o.order_id == order_id)
    }

    /// Finds a resting order by id.
    pub fn find(&self, order_id: u64) -> Option<&LimitOrder> {
        self.orders.iter().find(|o| o.order_id == order_id)
    }

    /// Finds a resting order by id, mutably.
    pub fn find_mut(&mut self, order_id: u64) -> Option<&mut LimitOrder> {
        self.orders.iter_mut().find(|o| o.order_id == order_id)
    }

    /// Finds the unique resting order owned by `session` whose
    /// client-order-id equals `client_order_id`. Returns `None` if no
    /// match exists; callers that need to reject on ambiguity should
    /// check `count_matching` separately (spec §4.4 requires
    /// uniqueness for this lookup).
    pub fn find_by_session_and_client_order_id(
        &self,
        session: &crate::order::SessionHandle,
        client_order_id: &str,
    ) -> Option<&LimitOrder> {
        self.orders.iter().find(|o| {
            &o.session == session && o.client_order_id.as_deref() == Some(client_order_id)
        })
    }

    /// Inserts a resting order at its upper-bound position under the
    /// page's comparator.
    pub fn insert(&mut self, order: LimitOrder) {
        let side = self.side();
        let pos = self
            .orders
            .partition_point(|existing| side.is_better_or_equal(existing, &order));
        self.orders.insert(pos, order);
    }

    /// Removes and returns the resting order at `index`.
    pub fn remove_at(&mut self, index: usize) -> LimitOrder {
        self.orders.remove(index)
    }

    /// Removes and returns the resting order with the given id, if
    /// present.
    pub fn remove_by_id(&mut self, order_id: u64) -> Option<LimitOrder> {
        let idx = self.find_index(order_id)?;
        Some(self.remove_at(idx))
    }

    /// Erases the contiguous prefix `[0, count)` and returns the removed
    /// orders in price-time order (spec §4.3: "erase(begin,
    /// first-non-filled)").
    pub fn erase_prefix(&mut self, count: usize) -> Vec<LimitOrder> {
        let count = count.min(self.orders.len());
        self.orders.drain(0..count).collect()
    }

    /// Removes every resting order matching `predicate`, preserving the
    /// relative order of the remainder. Used by the elimination
    /// subsystems (spec §4.5), which sweep for conditions other than
    /// "filled" (expiry, disconnect, closed-phase).
    pub fn remove_matching(&mut self, mut predicate: impl FnMut(&LimitOrder) -> bool) -> Vec<LimitOrder> {
        let mut removed = Vec::new();
        let mut i = 0;
        while i < self.orders.len() {
            if predicate(&self.orders[i]) {
                removed.push(self.orders.remove(i));
            } else {
                i += 1;
            }
        }
        removed
    }
}
