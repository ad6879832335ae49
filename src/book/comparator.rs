//! Better-order comparator (spec §3 "Order book", §9 "Better-order
//! comparator": "Implement via side-parameterized strategy (Bid and Offer
//! variants); null prices sort worst.").

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// The two book pages a resting limit order can live on. Note this is
/// coarser than [`crate::order::Side`]: `SellShort` and
/// `SellShortExempt` both resolve to `Offer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSide {
    /// Buy-side page (bids).
    Bid,
    /// Sell-side page (offers), covering `Sell`, `SellShort`, and
    /// `SellShortExempt`.
    Offer,
}

impl From<crate::order::Side> for BookSide {
    fn from(side: crate::order::Side) -> Self {
        match side {
            crate::order::Side::Buy => BookSide::Bid,
            crate::order::Side::Sell
            | crate::order::Side::SellShort
            | crate::order::Side::SellShortExempt => BookSide::Offer,
        }
    }
}

/// The fields the comparator needs from a resting entry: price and
/// order-time. Depth sheets key nodes on `Option<u128>` (`None` is the
/// sentinel for missing-price / market); book pages always have `Some`.
pub trait PriceTimeKey {
    /// The entry's price, or `None` for the missing-price sentinel.
    fn key_price(&self) -> Option<u128>;
    /// The entry's order-time, used to break price ties.
    fn key_time(&self) -> DateTime<Utc>;
}

impl BookSide {
    /// Compares two entries under this side's better-order rule.
    /// `Ordering::Less` means `a` is strictly better (ranks first).
    /// Null prices always sort worst, regardless of side.
    pub fn compare<A: PriceTimeKey, B: PriceTimeKey>(self, a: &A, b: &B) -> Ordering {
        match (a.key_price(), b.key_price()) {
            (None, None) => a.key_time().cmp(&b.key_time()),
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(pa), Some(pb)) => {
                let price_order = match self {
                    BookSide::Bid => pb.cmp(&pa), // higher price first
                    BookSide::Offer => pa.cmp(&pb), // lower price first
                };
                match price_order {
                    Ordering::Equal => a.key_time().cmp(&b.key_time()),
                    other => other,
                }
            }
        }
    }

    /// `true` when `a` is strictly better than, or equal in priority to,
    /// `b`. Used to find the upper-bound insertion point for a new
    /// entry: the new entry is inserted just after the last existing
    /// entry for which this returns `true`.
    pub fn is_better_or_equal<A: PriceTimeKey, B: PriceTimeKey>(self, a: &A, b: &B) -> bool {
        self.compare(a, b) != Ordering::Greater
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Entry {
        price: Option<u128>,
        time: i64,
    }

    impl PriceTimeKey for Entry {
        fn key_price(&self) -> Option<u128> {
            self.price
        }
        fn key_time(&self) -> DateTime<Utc> {
            DateTime::<Utc>::from_timestamp(self.time, 0).unwrap()
        }
    }

    #[test]
    fn bid_side_ranks_higher_price_first() {
        let higher = Entry { price: Some(101), time: 5 };
        let lower = Entry { price: Some(100), time: 1 };
        assert_eq!(BookSide::Bid.compare(&higher, &lower), Ordering::Less);
    }

    #[test]
    fn offer_side_ranks_lower_price_first() {
        let higher = Entry { price: Some(101), time: 1 };
        let lower = Entry { price: Some(100), time: 5 };
        assert_eq!(BookSide::Offer.compare(&lower, &higher), Ordering::Less);
    }

    #[test]
    fn ties_broken_by_earlier_time() {
        let earlier = Entry { price: Some(100), time: 1 };
        let later = Entry { price: Some(100), time: 2 };
        assert_eq!(BookSide::Bid.compare(&earlier, &later), Ordering::Less);
        assert_eq!(BookSide::Offer.compare(&earlier, &later), Ordering::Less);
    }

    #[test]
    fn null_price_sorts_worst_on_both_sides() {
        let priced = Entry { price: Some(100), time: 1 };
        let null = Entry { price: None, time: 0 };
        assert_eq!(BookSide::Bid.compare(&priced, &null), Ordering::Less);
        assert_eq!(BookSide::Offer.compare(&priced, &null), Ordering::Less);
    }
}
