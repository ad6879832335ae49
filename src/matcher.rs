//! Price-time crossing logic (spec §4.3 "Matcher").
//!
//! The matcher only ever touches the page opposite the taker's side. It
//! walks that page best-first — which is exactly the order the page is
//! already kept in — accumulating fills until either the taker is
//! satisfied or the next resting order no longer crosses the taker's
//! limit (market takers cross unconditionally). Fully-filled makers sit
//! at the front of the page by construction, so they come off as one
//! contiguous prefix erase; at most one maker per call is left
//! partially filled, and it is always the new front.

use crate::book::{BookSide, OrderBook, Page};
use crate::order::{OrderStatus, Side, SessionHandle, TimeInForce};
use crate::party::Party;

/// One maker fill produced by a single taker's match. Carries enough of
/// the maker's own state to build its execution report without a
/// separate book lookup — the maker may already have been erased from
/// the page by the time the caller builds replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
    /// The resting (maker) order that was filled, in whole or in part.
    pub maker_order_id: u64,
    /// Trade price — always the maker's resting price (spec §4.3: "the
    /// trade executes at the resting order's price").
    pub price: u128,
    /// Quantity traded against this maker.
    pub quantity: u64,
    /// The maker's owning session.
    pub maker_session: SessionHandle,
    /// The maker's client-assigned order id, if any.
    pub maker_client_order_id: Option<String>,
    /// The maker's attached parties.
    pub maker_parties: Vec<Party>,
    /// The maker's status immediately after this fill.
    pub maker_status: OrderStatus,
    /// The maker's leaves quantity immediately after this fill.
    pub maker_leaves: u64,
    /// The maker's cumulative quantity immediately after this fill.
    pub maker_cumulative: u64,
}

/// The outcome of matching one taker against the book.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchOutcome {
    /// Fills against resting makers, in the order they were applied
    /// (best price/time first).
    pub fills: Vec<Fill>,
    /// Taker quantity left unfilled after this match.
    pub remaining: u64,
}

impl MatchOutcome {
    /// Total quantity traded across all fills.
    pub fn traded_quantity(&self) -> u64 {
        self.fills.iter().map(|f| f.quantity).sum()
    }
}

fn crosses(taker_side: Side, taker_price: Option<u128>, maker_price: u128) -> bool {
    match taker_price {
        None => true,
        Some(limit) => match BookSide::from(taker_side) {
            BookSide::Bid => maker_price <= limit,
            BookSide::Offer => maker_price >= limit,
        },
    }
}

/// Sums resting quantity that would cross a taker's limit, stopping
/// early once `needed` is reached — used only to decide an FOK
/// all-or-none precondition, never to drive the actual fill.
fn available_to_match(page: &Page, taker_side: Side, taker_price: Option<u128>, needed: u64) -> u64 {
    let mut total = 0u64;
    for maker in page.iter() {
        if !crosses(taker_side, taker_price, maker.price) {
            break;
        }
        total = total.saturating_add(maker.leaves());
        if total >= needed {
            break;
        }
    }
    total
}

/// Walks `page` best-first, applying executions in place, until the
/// taker is satisfied or the next maker no longer crosses. Returns the
/// fills produced and the taker's unfilled remainder.
fn execute_against_page(
    page: &mut Page,
    taker_side: Side,
    taker_price: Option<u128>,
    mut remaining: u64,
) -> (Vec<Fill>, u64) {
    let mut fills = Vec::new();
    let mut fully_filled_prefix = 0usize;

    while remaining > 0 {
        let Some(maker) = page.best() else { break };
        if !crosses(taker_side, taker_price, maker.price) {
            break;
        }
        let maker_order_id = maker.order_id;
        let maker_price = maker.price;
        let trade_quantity = remaining.min(maker.leaves());

        let maker_mut = page.best_mut().expect("just observed a best order above");
        maker_mut.apply_execution(trade_quantity);
        let maker_filled = maker_mut.leaves() == 0;

        fills.push(Fill {
            maker_order_id,
            price: maker_price,
            quantity: trade_quantity,
            maker_session: maker_mut.session.clone(),
            maker_client_order_id: maker_mut.client_order_id.clone(),
            maker_parties: maker_mut.parties.clone(),
            maker_status: maker_mut.status,
            maker_leaves: maker_mut.leaves(),
            maker_cumulative: maker_mut.cumulative_quantity,
        });
        remaining -= trade_quantity;

        if maker_filled {
            fully_filled_prefix += 1;
        } else {
            // A partial fill only happens when the taker is now
            // exhausted (otherwise it would have kept consuming this
            // maker). It stays at the front of the page, not erased.
            break;
        }
    }

    if fully_filled_prefix > 0 {
        page.erase_prefix(fully_filled_prefix);
    }

    (fills, remaining)
}

/// Whether any resting order on the opposite page would cross a
/// taker's limit, without mutating the book. `taker_price` of `None`
/// (a market taker) crosses as soon as the opposite page is non-empty
/// (spec §4.3: mandatory facing-orders precondition for market/IOC
/// placements, checked before the order is even confirmed).
pub fn has_facing_orders(book: &OrderBook, taker_side: Side, taker_price: Option<u128>) -> bool {
    match book.opposite_page(taker_side).best() {
        Some(maker) => crosses(taker_side, taker_price, maker.price),
        None => false,
    }
}

/// Matches a taker (limit or market) against the book (spec §4.3).
///
/// `taker_price` is `None` for a market taker. For `TimeInForce::Fok`,
/// the book is left completely untouched unless the full `taker_quantity`
/// can be filled in one pass (spec §4.3: "FOK: compute fill feasibility
/// before mutating the book; if infeasible, no state changes.").
pub fn match_order(
    book: &mut OrderBook,
    taker_side: Side,
    taker_price: Option<u128>,
    taker_quantity: u64,
    time_in_force: TimeInForce,
) -> MatchOutcome {
    let page = book.opposite_page_mut(taker_side);

    if time_in_force == TimeInForce::Fok {
        let available = available_to_match(page, taker_side, taker_price, taker_quantity);
        if available < taker_quantity {
            return MatchOutcome {
                fills: Vec::new(),
                remaining: taker_quantity,
            };
        }
    }

    let (fills, remaining) = execute_against_page(page, taker_side, taker_price, taker_quantity);
    MatchOutcome { fills, remaining }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{InstrumentDescriptor, LimitOrder, OrderStatus, SessionHandle};
    use chrono::{DateTime, Utc};

    fn maker(id: u64, side: Side, price: u128, qty: u64, secs: i64) -> LimitOrder {
        LimitOrder {
            order_id: id,
            side,
            price,
            total_quantity: qty,
            cumulative_quantity: 0,
            status: OrderStatus::New,
            time_in_force: TimeInForce::Gtc,
            expire_time: None,
            expire_date: None,
            short_sale_exempt_reason: None,
            client_order_id: None,
            parties: vec![],
            session: SessionHandle::new("maker-session"),
            instrument: InstrumentDescriptor::new("X"),
            order_time: DateTime::<Utc>::from_timestamp(secs, 0).unwrap(),
            execution_ids: None,
        }
    }

    #[test]
    fn limit_taker_fills_against_best_offer_first() {
        let mut book = OrderBook::new();
        book.insert(maker(1, Side::Sell, 100, 5, 1));
        book.insert(maker(2, Side::Sell, 101, 5, 2));

        let outcome = match_order(&mut book, Side::Buy, Some(101), 7, TimeInForce::Day);

        assert_eq!(outcome.traded_quantity(), 7);
        assert_eq!(outcome.fills[0].maker_order_id, 1);
        assert_eq!(outcome.fills[0].quantity, 5);
        assert_eq!(outcome.fills[1].maker_order_id, 2);
        assert_eq!(outcome.fills[1].quantity, 2);
        assert_eq!(outcome.remaining, 0);
        assert_eq!(book.offers().len(), 1);
        assert_eq!(book.offers().best().unwrap().leaves(), 3);
    }

    #[test]
    fn limit_taker_stops_at_its_price() {
        let mut book = OrderBook::new();
        book.insert(maker(1, Side::Sell, 100, 5, 1));
        book.insert(maker(2, Side::Sell, 105, 5, 2));

        let outcome = match_order(&mut book, Side::Buy, Some(100), 10, TimeInForce::Day);

        assert_eq!(outcome.traded_quantity(), 5);
        assert_eq!(outcome.remaining, 5);
        assert_eq!(book.offers().len(), 1);
    }

    #[test]
    fn market_taker_crosses_regardless_of_price() {
        let mut book = OrderBook::new();
        book.insert(maker(1, Side::Sell, 1_000_000, 3, 1));

        let outcome = match_order(&mut book, Side::Buy, None, 3, TimeInForce::Ioc);

        assert_eq!(outcome.traded_quantity(), 3);
        assert!(book.offers().is_empty());
    }

    #[test]
    fn fok_leaves_the_book_untouched_when_infeasible() {
        let mut book = OrderBook::new();
        book.insert(maker(1, Side::Sell, 100, 3, 1));

        let outcome = match_order(&mut book, Side::Buy, Some(100), 10, TimeInForce::Fok);

        assert_eq!(outcome.fills.len(), 0);
        assert_eq!(outcome.remaining, 10);
        assert_eq!(book.offers().best().unwrap().leaves(), 3);
    }

    #[test]
    fn fok_fills_completely_when_feasible() {
        let mut book = OrderBook::new();
        book.insert(maker(1, Side::Sell, 100, 3, 1));
        book.insert(maker(2, Side::Sell, 100, 7, 2));

        let outcome = match_order(&mut book, Side::Buy, Some(100), 10, TimeInForce::Fok);

        assert_eq!(outcome.traded_quantity(), 10);
        assert_eq!(outcome.remaining, 0);
        assert!(book.offers().is_empty());
    }

    #[test]
    fn has_facing_orders_is_false_against_an_empty_page() {
        let book = OrderBook::new();
        assert!(!has_facing_orders(&book, Side::Buy, Some(100)));
        assert!(!has_facing_orders(&book, Side::Buy, None));
    }

    #[test]
    fn has_facing_orders_for_a_market_taker_ignores_price() {
        let mut book = OrderBook::new();
        book.insert(maker(1, Side::Sell, 1_000_000, 3, 1));
        assert!(has_facing_orders(&book, Side::Buy, None));
    }

    #[test]
    fn has_facing_orders_for_a_limit_taker_requires_an_actual_cross() {
        let mut book = OrderBook::new();
        book.insert(maker(1, Side::Sell, 110, 3, 1));
        assert!(!has_facing_orders(&book, Side::Buy, Some(100)));
        assert!(has_facing_orders(&book, Side::Buy, Some(110)));
    }
}
