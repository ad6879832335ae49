//! `store_state`/`recover_state` round-trip equivalence (spec §6
//! "Persisted state layout", §8 "round-trip... leaves the observable
//! book... same orders in the same price-time order").

use chrono::{DateTime, Utc};
use venue_matching_core::clock::FixedClock;
use venue_matching_core::config::EngineConfig;
use venue_matching_core::engine::Engine;
use venue_matching_core::events::{ClientNotification, Event};
use venue_matching_core::order::{InstrumentDescriptor, SessionHandle};
use venue_matching_core::request::OrderPlacementRequest;
use venue_matching_core::state::EngineSnapshotPackage;

fn engine() -> Engine {
    let instant = DateTime::<Utc>::from_timestamp(1_000, 0).unwrap();
    let clock = FixedClock::new(instant, chrono_tz::UTC);
    Engine::new(InstrumentDescriptor::new("ACME"), EngineConfig::default(), Box::new(clock))
}

fn limit(side: &str, price: u128, qty: u64, cid: &str) -> OrderPlacementRequest {
    OrderPlacementRequest {
        session: SessionHandle::new("s1"),
        instrument: InstrumentDescriptor::new("ACME"),
        client_order_id: Some(cid.to_string()),
        order_type: Some("LIMIT".to_string()),
        side: Some(side.to_string()),
        price: Some(price),
        quantity: Some(qty),
        time_in_force: Some("GTC".to_string()),
        expire_time: None,
        expire_date: None,
        short_sale_exempt_reason: None,
        parties: vec![],
    }
}

#[test]
fn restored_book_has_the_same_resting_orders_in_the_same_price_time_order() {
    let mut original = engine();
    original.place_order(&limit("BUY", 100, 10, "cid-1"));
    original.place_order(&limit("BUY", 101, 5, "cid-2"));
    original.place_order(&limit("SELL", 105, 8, "cid-3"));

    let snapshot = original.store_state();
    let mut restored = engine();
    restored.recover_state(snapshot);

    let original_bid_ids: Vec<u64> = original.book().bids().iter().map(|o| o.order_id).collect();
    let restored_bid_ids: Vec<u64> = restored.book().bids().iter().map(|o| o.order_id).collect();
    assert_eq!(original_bid_ids, restored_bid_ids);

    let original_offer_ids: Vec<u64> = original.book().offers().iter().map(|o| o.order_id).collect();
    let restored_offer_ids: Vec<u64> = restored.book().offers().iter().map(|o| o.order_id).collect();
    assert_eq!(original_offer_ids, restored_offer_ids);

    // Best bid is the highest price, so 101 must still lead 100 after restore.
    assert_eq!(restored.book().bids().best().unwrap().price, 101);
}

#[test]
fn id_generators_resume_past_the_snapshot_point_after_restore() {
    let mut original = engine();
    original.place_order(&limit("BUY", 100, 10, "cid-1"));
    original.place_order(&limit("SELL", 105, 8, "cid-2"));

    let snapshot = original.store_state();
    assert_eq!(snapshot.next_order_id, 3);

    let mut restored = engine();
    restored.recover_state(snapshot);

    let events = restored.place_order(&limit("BUY", 90, 1, "cid-3"));
    match &events[0] {
        Event::Client(ClientNotification::PlacementConfirmation(confirmation)) => {
            assert_eq!(confirmation.order_id, 3, "restored generator must not reissue ids 1 or 2");
        }
        _ => panic!("expected a PlacementConfirmation event"),
    }
}

#[test]
fn recover_state_wipes_whatever_was_resting_before_it_ran() {
    let mut engine = engine();
    engine.place_order(&limit("BUY", 100, 10, "cid-1"));

    let empty_snapshot = engine().store_state();
    let removed = engine.recover_state(empty_snapshot);
    assert_eq!(removed.len(), 1, "the pre-existing resting order must be reported removed");
    assert!(engine.book().bids().is_empty());
}

#[test]
fn last_trade_and_instrument_info_survive_the_round_trip() {
    let mut original = engine();
    original.place_order(&limit("SELL", 100, 10, "cid-1"));
    original.place_order(&limit("BUY", 100, 10, "cid-2"));

    let snapshot = original.store_state();
    assert!(snapshot.last_trade.is_some());
    assert_eq!(original.instrument_info().high, Some(100));

    let mut restored = engine();
    let events = restored.recover_state(snapshot);
    assert!(events.is_empty(), "nothing was resting on the fresh engine before recovery");
    assert_eq!(restored.instrument_info().high, Some(100));
}

#[test]
fn integrity_checked_package_detects_tampering() {
    let mut engine = engine();
    engine.place_order(&limit("BUY", 100, 10, "cid-1"));

    let package = EngineSnapshotPackage::new(engine.store_state()).unwrap();
    let json = package.to_json().unwrap();

    let mut tampered: serde_json::Value = serde_json::from_str(&json).unwrap();
    tampered["snapshot"]["next_order_id"] = serde_json::json!(9999);
    let tampered_json = tampered.to_string();

    let reloaded = EngineSnapshotPackage::from_json(&tampered_json).unwrap();
    assert!(reloaded.validate().is_err());
}
