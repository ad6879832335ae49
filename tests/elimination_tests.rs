//! Elimination sweeps exercised together against a multi-order book
//! (spec §4.5): each sweep leaves survivors in their original relative
//! order, and sweeps compose (a closed-phase sweep followed by a
//! disconnect sweep only removes what each one actually targets).

use chrono::{DateTime, NaiveDate, Utc};
use venue_matching_core::book::OrderBook;
use venue_matching_core::elimination;
use venue_matching_core::order::{InstrumentDescriptor, LimitOrder, OrderStatus, Side, SessionHandle, TimeInForce};

fn order(id: u64, side: Side, tif: TimeInForce, session: &str, order_time: DateTime<Utc>) -> LimitOrder {
    LimitOrder {
        order_id: id,
        side,
        price: 100,
        total_quantity: 10,
        cumulative_quantity: 0,
        status: OrderStatus::New,
        time_in_force: tif,
        expire_time: None,
        expire_date: None,
        short_sale_exempt_reason: None,
        client_order_id: None,
        parties: vec![],
        session: SessionHandle::new(session),
        instrument: InstrumentDescriptor::new("ACME"),
        order_time,
        execution_ids: None,
    }
}

#[test]
fn system_elimination_leaves_surviving_orders_in_their_original_relative_order() {
    let mut book = OrderBook::new();
    let yesterday = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
    book.insert(order(1, Side::Buy, TimeInForce::Gtc, "s1", yesterday));
    book.insert(order(2, Side::Buy, TimeInForce::Day, "s1", yesterday));
    book.insert(order(3, Side::Buy, TimeInForce::Gtc, "s1", yesterday));

    let today = DateTime::<Utc>::from_timestamp(86_400 * 2, 0).unwrap();
    elimination::system_elimination(&mut book, today, today.date_naive());

    let surviving_ids: Vec<u64> = book.bids().iter().map(|o| o.order_id).collect();
    assert_eq!(surviving_ids, vec![1, 3]);
}

#[test]
fn gtd_order_expires_when_only_the_expire_date_field_has_passed() {
    let mut book = OrderBook::new();
    let placed = DateTime::<Utc>::from_timestamp(0, 0).unwrap();

    let mut gtd = order(1, Side::Buy, TimeInForce::Gtd, "s1", placed);
    gtd.expire_time = Some(DateTime::<Utc>::from_timestamp(1_000_000, 0).unwrap());
    gtd.expire_date = Some(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    book.insert(gtd);

    // expire_time is far in the future, but expire_date has already passed —
    // the two fields are checked independently, so either one expiring is enough.
    let now = DateTime::<Utc>::from_timestamp(500, 0).unwrap();
    let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let events = elimination::system_elimination(&mut book, now, today);

    assert_eq!(events.len(), 2);
    assert!(book.bids().is_empty());
}

#[test]
fn gtd_order_with_no_expiry_fields_never_expires() {
    let mut book = OrderBook::new();
    let placed = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
    book.insert(order(1, Side::Buy, TimeInForce::Gtd, "s1", placed));

    let far_future = DateTime::<Utc>::from_timestamp(10_000_000_000, 0).unwrap();
    let events = elimination::system_elimination(&mut book, far_future, far_future.date_naive());

    assert!(events.is_empty());
    assert_eq!(book.bids().len(), 1);
}

#[test]
fn closed_phase_then_disconnect_sweeps_compose_without_double_counting() {
    let mut book = OrderBook::new();
    let t = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
    book.insert(order(1, Side::Buy, TimeInForce::Day, "s1", t));
    book.insert(order(2, Side::Buy, TimeInForce::Gtc, "s1", t));
    book.insert(order(3, Side::Sell, TimeInForce::Gtc, "s2", t));

    let closed_events = elimination::closed_phase_elimination(&mut book, t.date_naive());
    assert_eq!(closed_events.len(), 2);
    assert!(book.find_by_order_id(1).is_none());

    let disconnect_events = elimination::on_disconnect_elimination(&mut book, &SessionHandle::new("s1"));
    assert_eq!(disconnect_events.len(), 2);
    assert!(book.find_by_order_id(2).is_none());
    assert!(book.find_by_order_id(3).is_some(), "s2's order is untouched by either sweep");
}

#[test]
fn all_orders_elimination_is_a_superset_of_every_other_sweep() {
    let mut book = OrderBook::new();
    let t = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
    for (id, side, tif) in [
        (1, Side::Buy, TimeInForce::Day),
        (2, Side::Buy, TimeInForce::Gtc),
        (3, Side::Sell, TimeInForce::Gtd),
        (4, Side::Sell, TimeInForce::Gtc),
    ] {
        book.insert(order(id, side, tif, "s1", t));
    }

    let events = elimination::all_orders_elimination(&mut book);
    assert_eq!(events.len(), 4);
    assert!(book.bids().is_empty());
    assert!(book.offers().is_empty());
}
