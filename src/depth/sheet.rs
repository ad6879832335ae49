//! Aggregating the order book into per-price depth levels (spec §4.7
//! "Depth cache").

use crate::book::{OrderBook, Page};
use crate::order::LimitOrder;
use crate::party::{OwnerHash, PartyRole};
use serde::{Deserialize, Serialize};

/// One aggregated price level: the sum of resting quantity at a price,
/// and how many orders contribute to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLevel {
    /// The level's price.
    pub price: u128,
    /// Aggregate resting quantity at this price.
    pub quantity: u64,
    /// Number of orders contributing to this level.
    pub order_count: usize,
}

/// A full two-sided snapshot of aggregated depth, the fold's output and
/// the unit the incremental builder diffs between two instants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepthSheet {
    /// Bid-side levels, best (highest) price first.
    pub bids: Vec<DepthLevel>,
    /// Offer-side levels, best (lowest) price first.
    pub offers: Vec<DepthLevel>,
}

fn primary_owner_hash(order: &LimitOrder) -> Option<OwnerHash> {
    order
        .parties
        .iter()
        .find(|p| p.role == PartyRole::EnteringFirm)
        .map(|p| OwnerHash::of(&p.id))
}

fn fold_side(page: &Page, exclude: Option<OwnerHash>) -> Vec<DepthLevel> {
    let mut levels: Vec<DepthLevel> = Vec::new();
    for order in page.iter() {
        if let Some(excluded) = exclude {
            if primary_owner_hash(order) == Some(excluded) {
                continue;
            }
        }
        let quantity = order.leaves();
        if quantity == 0 {
            continue;
        }
        match levels.last_mut() {
            Some(level) if level.price == order.price => {
                level.quantity += quantity;
                level.order_count += 1;
            }
            _ => levels.push(DepthLevel {
                price: order.price,
                quantity,
                order_count: 1,
            }),
        }
    }
    levels
}

/// Aggregates an order book into a [`DepthSheet`], optionally excluding
/// one owner's own resting quantity from every level (spec §4.7
/// "Owner-exclusion mode"). The book's pages are already price-time
/// sorted, so this is a single linear pass per side with no re-sort.
pub fn fold(book: &OrderBook, exclude_owner: Option<OwnerHash>) -> DepthSheet {
    DepthSheet {
        bids: fold_side(book.bids(), exclude_owner),
        offers: fold_side(book.offers(), exclude_owner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{InstrumentDescriptor, OrderStatus, Side, SessionHandle, TimeInForce};
    use crate::party::Party;
    use chrono::{DateTime, Utc};

    fn order(id: u64, side: Side, price: u128, qty: u64, owner: Option<&str>) -> LimitOrder {
        let parties = owner
            .map(|id| vec![Party::new(id, "FIX", PartyRole::EnteringFirm)])
            .unwrap_or_default();
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
            parties,
            session: SessionHandle::new("s"),
            instrument: InstrumentDescriptor::new("X"),
            order_time: DateTime::<Utc>::from_timestamp(id as i64, 0).unwrap(),
            execution_ids: None,
        }
    }

    #[test]
    fn orders_at_the_same_price_fold_into_one_level() {
        let mut book = OrderBook::new();
        book.insert(order(1, Side::Buy, 100, 5, None));
        book.insert(order(2, Side::Buy, 100, 7, None));
        let sheet = fold(&book, None);
        assert_eq!(sheet.bids.len(), 1);
        assert_eq!(sheet.bids[0].quantity, 12);
        assert_eq!(sheet.bids[0].order_count, 2);
    }

    #[test]
    fn owner_exclusion_removes_only_that_owners_contribution() {
        let mut book = OrderBook::new();
        book.insert(order(1, Side::Buy, 100, 5, Some("owner-a")));
        book.insert(order(2, Side::Buy, 100, 7, Some("owner-b")));
        let excluded = OwnerHash::of("owner-a");
        let sheet = fold(&book, Some(excluded));
        assert_eq!(sheet.bids[0].quantity, 7);
        assert_eq!(sheet.bids[0].order_count, 1);
    }
}
