//! The order book: two price-time-ordered pages (spec §3 "Order book").

mod comparator;
mod page;

pub use comparator::BookSide;
pub use page::Page;

use crate::order::{LimitOrder, SessionHandle, Side};

/// The order book for one instrument: a bid page and an offer page.
/// Market orders are never stored here — they are resolved entirely
/// within the matcher (spec §3: "Market orders are never resting").
#[derive(Debug, Clone)]
pub struct OrderBook {
    bids: Page,
    offers: Page,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderBook {
    /// Creates an empty order book.
    pub fn new() -> Self {
        Self {
            bids: Page::new(BookSide::Bid),
            offers: Page::new(BookSide::Offer),
        }
    }

    /// The bid page.
    pub fn bids(&self) -> &Page {
        &self.bids
    }

    /// The offer page.
    pub fn offers(&self) -> &Page {
        &self.offers
    }

    /// The page a given order side rests on.
    pub fn page_for(&self, side: Side) -> &Page {
        match BookSide::from(side) {
            BookSide::Bid => &self.bids,
            BookSide::Offer => &self.offers,
        }
    }

    /// The page a given order side rests on, mutably.
    pub fn page_for_mut(&mut self, side: Side) -> &mut Page {
        match BookSide::from(side) {
            BookSide::Bid => &mut self.bids,
            BookSide::Offer => &mut self.offers,
        }
    }

    /// The page opposite a given aggressor side — what the matcher scans.
    pub fn opposite_page(&self, aggressor_side: Side) -> &Page {
        self.page_for(aggressor_side.opposite())
    }

    /// The page opposite a given aggressor side, mutably.
    pub fn opposite_page_mut(&mut self, aggressor_side: Side) -> &mut Page {
        self.page_for_mut(aggressor_side.opposite())
    }

    /// Inserts a resting order into the page matching its side.
    pub fn insert(&mut self, order: LimitOrder) {
        self.page_for_mut(order.side).insert(order);
    }

    /// Finds a resting order by venue order id, searching both pages.
    pub fn find_by_order_id(&self, order_id: u64) -> Option<&LimitOrder> {
        self.bids.find(order_id).or_else(|| self.offers.find(order_id))
    }

    /// Removes a resting order by venue order id, searching both pages.
    pub fn remove_by_order_id(&mut self, order_id: u64) -> Option<LimitOrder> {
        if let Some(order) = self.bids.remove_by_id(order_id) {
            return Some(order);
        }
        self.offers.remove_by_id(order_id)
    }

    /// Finds the resting order uniquely identified by `(session,
    /// client_order_id)`, searching both pages. Returns `None` both when
    /// there is no match and when the caller should treat ambiguity
    /// (more than one hit) as not-found; `count_by_session_and_client_order_id`
    /// lets the caller distinguish those cases (spec §4.4: "uniqueness
    /// required").
    pub fn find_by_session_and_client_order_id(
        &self,
        session: &SessionHandle,
        client_order_id: &str,
    ) -> Option<&LimitOrder> {
        self.bids
            .find_by_session_and_client_order_id(session, client_order_id)
            .or_else(|| {
                self.offers
                    .find_by_session_and_client_order_id(session, client_order_id)
            })
    }

    /// Counts resting orders matching `(session, client_order_id)` across
    /// both pages, used to enforce the uniqueness precondition in spec
    /// §4.4.
    pub fn count_by_session_and_client_order_id(
        &self,
        session: &SessionHandle,
        client_order_id: &str,
    ) -> usize {
        self.bids
            .iter()
            .chain(self.offers.iter())
            .filter(|o| &o.session == session && o.client_order_id.as_deref() == Some(client_order_id))
            .count()
    }

    /// The best bid price, if any.
    pub fn best_bid_price(&self) -> Option<u128> {
        self.bids.best().map(|o| o.price)
    }

    /// The best offer price, if any.
    pub fn best_offer_price(&self) -> Option<u128> {
        self.offers.best().map(|o| o.price)
    }

    /// Removes every resting order on either side matching `predicate`,
    /// preserving each page's relative order among survivors. Used by
    /// the elimination subsystems to sweep for expiry/disconnect/closed
    /// conditions across the whole book in one call.
    pub fn remove_matching(&mut self, mut predicate: impl FnMut(&LimitOrder) -> bool) -> Vec<LimitOrder> {
        let mut removed = self.bids.remove_matching(&mut predicate);
        removed.extend(self.offers.remove_matching(&mut predicate));
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{InstrumentDescriptor, OrderStatus, TimeInForce};
    use chrono::{DateTime, Utc};

    fn order(id: u64, side: Side, price: u128) -> LimitOrder {
        LimitOrder {
            order_id: id,
            side,
            price,
            total_quantity: 10,
            cumulative_quantity: 0,
            status: OrderStatus::New,
            time_in_force: TimeInForce::Day,
            expire_time: None,
            expire_date: None,
            short_sale_exempt_reason: None,
            client_order_id: Some(format!("cid-{id}")),
            parties: vec![],
            session: SessionHandle::new("sess"),
            instrument: InstrumentDescriptor::new("X"),
            order_time: DateTime::<Utc>::from_timestamp(id as i64, 0).unwrap(),
            execution_ids: None,
        }
    }

    #[test]
    fn buy_orders_rest_on_bid_page_sells_on_offer_page() {
        let mut book = OrderBook::new();
        book.insert(order(1, Side::Buy, 100));
        book.insert(order(2, Side::SellShort, 101));
        assert_eq!(book.bids().len(), 1);
        assert_eq!(book.offers().len(), 1);
    }

    #[test]
    fn find_by_order_id_searches_both_pages() {
        let mut book = OrderBook::new();
        book.insert(order(1, Side::Buy, 100));
        book.insert(order(2, Side::Sell, 101));
        assert!(book.find_by_order_id(1).is_some());
        assert!(book.find_by_order_id(2).is_some());
        assert!(book.find_by_order_id(3).is_none());
    }

    #[test]
    fn client_order_id_lookup_is_scoped_to_session() {
        let mut book = OrderBook::new();
        book.insert(order(1, Side::Buy, 100));
        let other_session = SessionHandle::new("other");
        assert!(
            book.find_by_session_and_client_order_id(&other_session, "cid-1")
                .is_none()
        );
        let sess = SessionHandle::new("sess");
        assert!(
            book.find_by_session_and_client_order_id(&sess, "cid-1")
                .is_some()
        );
    }
}
