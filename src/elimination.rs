//! Elimination subsystems (spec §4.5): the sweeps that remove resting
//! orders for reasons other than a fill or an explicit cancel request —
//! day rollover, GTD expiry, a closed-phase transition, a session
//! disconnect, or a full-book wipe.

use crate::book::OrderBook;
use crate::events::{ClientNotification, Event, OrderBookNotification};
use crate::order::{LimitOrder, OrderStatus, SessionHandle, TimeInForce};
use crate::reply::OrderCancellationConfirmation;
use chrono::{DateTime, NaiveDate, Utc};

/// Emits `OrderRemoved` for each swept order, paired with a client-facing
/// cancellation confirmation (spec §4.5: "mark cancelled, emit
/// `OrderRemoved` and cancellation confirmation").
fn emit_removals_with_confirmation(removed: Vec<LimitOrder>) -> Vec<Event> {
    let mut events = Vec::with_capacity(removed.len() * 2);
    for mut order in removed {
        order.status = OrderStatus::Cancelled;
        events.push(Event::Book(OrderBookNotification::OrderRemoved {
            instrument: order.instrument.clone(),
            order_id: order.order_id,
            side: order.side,
            price: order.price,
        }));
        events.push(Event::Client(ClientNotification::CancellationConfirmation(
            OrderCancellationConfirmation {
                order_id: order.order_id,
                session: order.session,
                client_order_id: order.client_order_id,
            },
        )));
    }
    events
}

/// Emits only `OrderRemoved`, no client notification (used by
/// [`all_orders_elimination`], spec §4.5).
fn emit_removals(removed: Vec<LimitOrder>) -> Vec<Event> {
    removed
        .into_iter()
        .map(|order| {
            Event::Book(OrderBookNotification::OrderRemoved {
                instrument: order.instrument,
                order_id: order.order_id,
                side: order.side,
                price: order.price,
            })
        })
        .collect()
}

fn is_stale_day_order(order: &LimitOrder, today: NaiveDate) -> bool {
    order.time_in_force == TimeInForce::Day && order.order_time.date_naive() != today
}

fn is_expired_gtd_order(order: &LimitOrder, now: DateTime<Utc>, today: NaiveDate) -> bool {
    if order.time_in_force != TimeInForce::Gtd {
        return false;
    }
    if let Some(expire_time) = order.expire_time {
        if now >= expire_time {
            return true;
        }
    }
    if let Some(expire_date) = order.expire_date {
        if today > expire_date {
            return true;
        }
    }
    false
}

/// Sweeps the book for Day orders stale from a prior trading date and
/// GTD orders past their expiry, at day rollover (spec §4.5 "System
/// elimination").
pub fn system_elimination(book: &mut OrderBook, now: DateTime<Utc>, today: NaiveDate) -> Vec<Event> {
    let removed = book.remove_matching(|order| {
        is_stale_day_order(order, today) || is_expired_gtd_order(order, now, today)
    });
    emit_removals_with_confirmation(removed)
}

/// Removes every Day order, plus every GTD-with-expire-date order whose
/// expiry has already passed the phase's start date, from the book. Triggered
/// when the instrument transitions into the `Closed` phase (spec §4.5
/// "Closed-phase elimination": "All Day orders expire; GTD-with-expire-date
/// orders expire iff phase_start_date ≥ expire_date"). GTC orders, and GTD
/// orders with only an expire-time, are left resting across the close.
pub fn closed_phase_elimination(book: &mut OrderBook, phase_start_date: NaiveDate) -> Vec<Event> {
    let removed = book.remove_matching(|order| {
        order.time_in_force == TimeInForce::Day
            || (order.time_in_force == TimeInForce::Gtd
                && order
                    .expire_date
                    .is_some_and(|expire_date| phase_start_date >= expire_date))
    });
    emit_removals_with_confirmation(removed)
}

/// Removes every resting order owned by one session, triggered on
/// disconnect when `EngineConfig::enable_cancel_on_disconnect` is set
/// (spec §4.5 "On-disconnect elimination").
pub fn on_disconnect_elimination(book: &mut OrderBook, session: &SessionHandle) -> Vec<Event> {
    let removed = book.remove_matching(|order| &order.session == session);
    emit_removals_with_confirmation(removed)
}

/// Removes every resting order in the book, regardless of time-in-force
/// or owner (spec §4.5 "All-orders elimination").
pub fn all_orders_elimination(book: &mut OrderBook) -> Vec<Event> {
    let removed = book.remove_matching(|_| true);
    emit_removals(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{InstrumentDescriptor, OrderStatus, Side};

    fn order(id: u64, tif: TimeInForce, order_time: DateTime<Utc>, session: &str) -> LimitOrder {
        LimitOrder {
            order_id: id,
            side: Side::Buy,
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
            instrument: InstrumentDescriptor::new("X"),
            order_time,
            execution_ids: None,
        }
    }

    #[test]
    fn system_elimination_removes_day_orders_from_a_prior_date() {
        let mut book = OrderBook::new();
        let yesterday = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        book.insert(order(1, TimeInForce::Day, yesterday, "s"));
        book.insert(order(2, TimeInForce::Gtc, yesterday, "s"));

        let today = DateTime::<Utc>::from_timestamp(86_400 * 3, 0).unwrap();
        let events = system_elimination(&mut book, today, today.date_naive());

        assert_eq!(events.len(), 2);
        assert!(book.find_by_order_id(1).is_none());
        assert!(book.find_by_order_id(2).is_some());
    }

    #[test]
    fn system_elimination_removes_gtd_orders_past_expire_time() {
        let mut book = OrderBook::new();
        let placed = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        let mut gtd = order(1, TimeInForce::Gtd, placed, "s");
        gtd.expire_time = Some(DateTime::<Utc>::from_timestamp(100, 0).unwrap());
        book.insert(gtd);

        let now = DateTime::<Utc>::from_timestamp(200, 0).unwrap();
        let events = system_elimination(&mut book, now, now.date_naive());

        assert_eq!(events.len(), 2);
        assert!(book.find_by_order_id(1).is_none());
    }

    #[test]
    fn closed_phase_elimination_keeps_gtc_orders() {
        let mut book = OrderBook::new();
        let t = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        book.insert(order(1, TimeInForce::Day, t, "s"));
        book.insert(order(2, TimeInForce::Gtc, t, "s"));

        let events = closed_phase_elimination(&mut book, t.date_naive());

        assert_eq!(events.len(), 2);
        assert!(book.find_by_order_id(1).is_none());
        assert!(book.find_by_order_id(2).is_some());
    }

    #[test]
    fn closed_phase_elimination_expires_gtd_orders_past_expire_date() {
        let mut book = OrderBook::new();
        let t = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        let mut gtd = order(1, TimeInForce::Gtd, t, "s");
        gtd.expire_date = Some(t.date_naive());
        book.insert(gtd);
        let mut gtd_future = order(2, TimeInForce::Gtd, t, "s");
        gtd_future.expire_date = Some(t.date_naive().succ_opt().unwrap());
        book.insert(gtd_future);

        let events = closed_phase_elimination(&mut book, t.date_naive());

        assert_eq!(events.len(), 2);
        assert!(book.find_by_order_id(1).is_none());
        assert!(book.find_by_order_id(2).is_some());
    }

    #[test]
    fn on_disconnect_elimination_only_removes_that_sessions_orders() {
        let mut book = OrderBook::new();
        let t = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        book.insert(order(1, TimeInForce::Gtc, t, "s1"));
        book.insert(order(2, TimeInForce::Gtc, t, "s2"));

        let events = on_disconnect_elimination(&mut book, &SessionHandle::new("s1"));

        assert_eq!(events.len(), 2);
        assert!(book.find_by_order_id(1).is_none());
        assert!(book.find_by_order_id(2).is_some());
    }

    #[test]
    fn all_orders_elimination_wipes_the_book() {
        let mut book = OrderBook::new();
        let t = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        book.insert(order(1, TimeInForce::Gtc, t, "s1"));
        book.insert(order(2, TimeInForce::Day, t, "s2"));

        let events = all_orders_elimination(&mut book);

        assert_eq!(events.len(), 2);
        assert!(book.bids().is_empty());
        assert!(book.offers().is_empty());
    }
}
