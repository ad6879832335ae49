//! The top-level per-instrument orchestrator (spec §2 "System overview"):
//! ties the order book, matcher, validator, phase handler, elimination
//! sweeps, caches, and subscription manager into the single-threaded,
//! cooperative pipeline spec §5 describes — every externally visible
//! step runs to completion before the next, with no internal suspension
//! points.
//!
//! `Engine` owns its [`Clock`] directly rather than through
//! [`EngineConfig`]: `EngineConfig` is `Serialize`/`Deserialize` so a
//! restored engine can be rebuilt from persisted configuration, but a
//! `dyn Clock` trait object cannot round-trip through serde. The clock
//! is a capability handed in at construction instead, matching the
//! reference crate's pluggable-callback idiom (see `clock.rs`).

use crate::actions;
use crate::book::OrderBook;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::depth::{self, BookTop, DepthSheet};
use crate::elimination;
use crate::events::{ClientNotification, Event, OrderBookNotification};
use crate::ids::{MarketEntryIdGenerator, OrderIdGenerator};
use crate::instrument_info::InstrumentInfo;
use crate::order::{InstrumentDescriptor, LimitOrder, SessionHandle};
use crate::phase::{PhaseHandler, PhaseState};
use crate::reply::SecurityStatus;
use crate::request::{
    MarketDataAction, MarketDataRequest, OrderCancellationRequest, OrderModificationRequest,
    OrderPlacementRequest, SecurityStatusRequest,
};
use crate::state::EngineSnapshot;
use crate::subscription::{
    MarketDataReject, MarketDataSnapshot, MarketDataUpdate, StreamingSettings, Subscription,
    SubscriptionManager,
};
use crate::trade_cache::{TradeCache, TradeRecord};
use crate::validator::Validator;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Number of recent trades retained for [`crate::trade_cache::TradeCache::last`]
/// recovery replies. Not part of spec §6's enumerated configuration —
/// the spec names no capacity, so a fixed implementation constant stands
/// in, the same way the reference crate hardcodes ring-buffer sizes that
/// its own config surface leaves unspecified.
const TRADE_CACHE_CAPACITY: usize = 256;

/// Turns the raw wire tokens on a [`MarketDataRequest`] (`"DEPTH"`,
/// `"TOP"`, `"TRADES"`) into a [`StreamingSettings`] bitset (spec §4.10:
/// "non-empty data-types").
fn parse_streaming_settings(raw: &[String]) -> Result<StreamingSettings, String> {
    if raw.is_empty() {
        return Err("at least one streaming data type is required".to_string());
    }
    let mut settings = StreamingSettings::empty();
    for token in raw {
        let flag = match token.as_str() {
            "DEPTH" => StreamingSettings::DEPTH,
            "TOP" => StreamingSettings::TOP,
            "TRADES" => StreamingSettings::TRADES,
            "INFO" => StreamingSettings::INFO,
            other => return Err(format!("unrecognized streaming data type '{other}'")),
        };
        settings |= flag;
    }
    Ok(settings)
}

fn reject(session: SessionHandle, instrument: InstrumentDescriptor, reason: impl Into<String>) -> Vec<Event> {
    vec![Event::Client(ClientNotification::MarketDataReject(MarketDataReject {
        session,
        instrument,
        reason: reason.into(),
        reason_code: None,
    }))]
}

fn reject_with_code(
    session: SessionHandle,
    instrument: InstrumentDescriptor,
    reason: impl Into<String>,
    reason_code: crate::subscription::MarketDataRejectReason,
) -> Vec<Event> {
    vec![Event::Client(ClientNotification::MarketDataReject(MarketDataReject {
        session,
        instrument,
        reason: reason.into(),
        reason_code: Some(reason_code),
    }))]
}

fn extract_trade_records(events: &[Event], now: DateTime<Utc>) -> Vec<TradeRecord> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Book(OrderBookNotification::Trade {
                trade_id,
                price,
                quantity,
                aggressor_side,
                ..
            }) => Some(TradeRecord {
                trade_id: *trade_id,
                price: *price,
                quantity: *quantity,
                aggressor_side: *aggressor_side,
                timestamp: now,
            }),
            _ => None,
        })
        .collect()
}

/// The matching core for a single instrument.
pub struct Engine {
    instrument: InstrumentDescriptor,
    book: OrderBook,
    order_ids: OrderIdGenerator,
    trade_ids: MarketEntryIdGenerator,
    config: EngineConfig,
    phase: PhaseHandler,
    trade_cache: TradeCache,
    instrument_info: InstrumentInfo,
    subscriptions: SubscriptionManager,
    clock: Box<dyn Clock>,
    /// Trades recorded since the last [`Engine::publish_market_data`]
    /// call, consumed by trade-streaming subscribers (spec §4.8:
    /// "keeps... a list of trades recorded since the last publish").
    pending_trades: Vec<TradeRecord>,
    /// Each subscriber's last-folded depth sheet, the basis incremental
    /// updates diff against (spec §4.7 "fold"), keyed by `(session,
    /// request_id)` since one session may hold several concurrent
    /// subscriptions (spec §4.10: "index by (request-id, session)"). Not
    /// part of [`EngineSnapshot`]: it is live per-session publish state,
    /// not persisted book content.
    previous_depth: HashMap<(SessionHandle, String), DepthSheet>,
    /// Each subscriber's last-published top-of-book, used to suppress
    /// a `top` field that hasn't changed since the prior cycle.
    previous_top: HashMap<(SessionHandle, String), BookTop>,
    /// Each subscriber's last-published low/mid/high, the basis
    /// `InstrumentInfo::compose_update`'s New/Change/Delete tagging
    /// diffs against (spec §4.9).
    previous_instrument_info: HashMap<(SessionHandle, String), crate::instrument_info::InstrumentInfoSnapshot>,
}

impl Engine {
    /// Builds a fresh engine for `instrument`, with an empty book, phase
    /// `Open`/`Resume`, and no subscriptions.
    pub fn new(instrument: InstrumentDescriptor, config: EngineConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            instrument,
            book: OrderBook::new(),
            order_ids: OrderIdGenerator::new(),
            trade_ids: MarketEntryIdGenerator::new(),
            config,
            phase: PhaseHandler::new(),
            trade_cache: TradeCache::new(TRADE_CACHE_CAPACITY),
            instrument_info: InstrumentInfo::new(),
            subscriptions: SubscriptionManager::new(),
            clock,
            pending_trades: Vec::new(),
            previous_depth: HashMap::new(),
            previous_top: HashMap::new(),
            previous_instrument_info: HashMap::new(),
        }
    }

    /// The instrument this engine serves.
    pub fn instrument(&self) -> &InstrumentDescriptor {
        &self.instrument
    }

    /// The current resting order book.
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// The current phase state.
    pub fn phase(&self) -> PhaseState {
        self.phase.state()
    }

    /// The current low/high traded-price bounds.
    pub fn instrument_info(&self) -> InstrumentInfo {
        self.instrument_info
    }

    /// Places an order (spec §4.4 "Place limit"/"Place market").
    pub fn place_order(&mut self, req: &OrderPlacementRequest) -> Vec<Event> {
        let now = self.clock.now();
        let events = actions::place_order(
            &mut self.book,
            &self.order_ids,
            &self.trade_ids,
            &self.config,
            &self.phase,
            &mut self.trade_cache,
            &mut self.instrument_info,
            now,
            req,
        );
        self.pending_trades.extend(extract_trade_records(&events, now));
        events
    }

    /// Amends a resting limit order (spec §4.4 "Amend limit").
    pub fn amend_order(&mut self, req: &OrderModificationRequest) -> Vec<Event> {
        let now = self.clock.now();
        let events = actions::amend_order(
            &mut self.book,
            &self.config,
            &self.phase,
            &self.trade_ids,
            &mut self.trade_cache,
            &mut self.instrument_info,
            now,
            req,
        );
        self.pending_trades.extend(extract_trade_records(&events, now));
        events
    }

    /// Cancels a resting limit order (spec §4.4 "Cancel").
    pub fn cancel_order(&mut self, req: &OrderCancellationRequest) -> Vec<Event> {
        actions::cancel_order(&mut self.book, &self.phase, req)
    }

    /// Restores one previously-persisted resting order directly into the
    /// book (spec §4.4 "Recover limit order").
    pub fn recover_limit_order(&mut self, order: LimitOrder) -> Result<(), String> {
        let validator = Validator::new(&self.config);
        let now = self.clock.now();
        let today = self.clock.local_date();
        actions::recover_limit_order(&mut self.book, &validator, &self.phase, order, now, today)
    }

    /// Applies a `LastTradeRecover` event (spec §4.8): `Some(trade)`
    /// resets retained history to that single trade; `None` clears it
    /// entirely. Emits the corresponding `OrderBookNotification` rather
    /// than mutating the cache silently, so market-data consumers that
    /// mirror the cache can follow along.
    pub fn recover_last_trade(&mut self, trade: Option<TradeRecord>) -> Vec<Event> {
        self.trade_cache.recover(trade);
        vec![Event::Book(OrderBookNotification::LastTradeRecover {
            instrument: self.instrument.clone(),
            trade,
        })]
    }

    /// Applies an `InstrumentInfoRecover` event (spec §4.9): `Some((low,
    /// high))` replaces both bounds, validated against tick/min/max and
    /// `low <= high` (spec §4.1 "For instrument-info recovery"); `None`
    /// marks them for deletion on the next publish cycle. Rejects an
    /// invalid pair without mutating the cache.
    pub fn recover_instrument_info(&mut self, value: Option<(u128, u128)>) -> Result<Vec<Event>, String> {
        if let Some((low, high)) = value {
            let validator = Validator::new(&self.config);
            let conclusion = validator.validate_info_recovery(low, high);
            if !conclusion.is_success() {
                return Err(conclusion.reason().unwrap_or_default().to_string());
            }
        }
        self.instrument_info.recover(value);
        Ok(vec![Event::Book(OrderBookNotification::InstrumentInfoRecover {
            instrument: self.instrument.clone(),
            value,
        })])
    }

    /// Runs the day-rollover / GTD-expiry sweep (spec §4.5 "System
    /// elimination"), driven by an external tick.
    pub fn tick(&mut self) -> Vec<Event> {
        let now = self.clock.now();
        let today = self.clock.local_date();
        elimination::system_elimination(&mut self.book, now, today)
    }

    /// Transitions the instrument to a new phase/status, triggering
    /// closed-phase elimination when the new phase is `Closed` (spec
    /// §4.6).
    pub fn transition_phase(&mut self, new_state: PhaseState) -> Vec<Event> {
        if self.phase.transition(new_state) {
            let phase_start_date = self.clock.local_date();
            elimination::closed_phase_elimination(&mut self.book, phase_start_date)
        } else {
            Vec::new()
        }
    }

    /// Handles a session disconnecting: removes its subscriptions and,
    /// when `enable_cancel_on_disconnect` is set, its Day orders (spec
    /// §4.5 "OnDisconnectElimination", §4.10 "Session termination removes
    /// all subscriptions").
    pub fn disconnect_session(&mut self, session: &SessionHandle) -> Vec<Event> {
        self.subscriptions.remove_session(session);
        self.previous_depth.retain(|(s, _), _| s != session);
        self.previous_top.retain(|(s, _), _| s != session);
        self.previous_instrument_info.retain(|(s, _), _| s != session);
        if self.config.enable_cancel_on_disconnect {
            elimination::on_disconnect_elimination(&mut self.book, session)
        } else {
            Vec::new()
        }
    }

    /// Answers a [`SecurityStatusRequest`] with the current phase (spec
    /// §4.6: "Serves SecurityStatusRequest by publishing the current
    /// phase as a SecurityStatus client notification.").
    pub fn handle_security_status_request(&self, req: &SecurityStatusRequest) -> Vec<Event> {
        let state = self.phase.state();
        vec![Event::Client(ClientNotification::SecurityStatus(SecurityStatus {
            instrument: req.instrument.clone(),
            trading_phase: state.trading_phase,
            trading_status: state.trading_status,
        }))]
    }

    /// Handles a `Subscribe`/`Unsubscribe`/`Snapshot` request (spec
    /// §4.10). The wire shape of [`MarketDataRequest`] carries no
    /// `depth_window`/`exclude_owner` fields, so subscriptions built
    /// here default both to unset/none; windowing and owner-exclusion
    /// remain available to callers that construct a [`Subscription`]
    /// directly.
    pub fn handle_market_data_request(&mut self, req: &MarketDataRequest) -> Vec<Event> {
        if req.request_id.is_empty() {
            return reject(req.session.clone(), req.instrument.clone(), "request_id is required");
        }
        let settings = match parse_streaming_settings(&req.settings) {
            Ok(settings) => settings,
            Err(reason) => return reject(req.session.clone(), req.instrument.clone(), reason),
        };
        if settings.contains(StreamingSettings::TRADES) && !self.config.enable_trades_streaming {
            return reject(
                req.session.clone(),
                req.instrument.clone(),
                "trade streaming is not enabled for this instrument",
            );
        }
        if !matches!(req.market_depth, None | Some(1)) {
            return reject(
                req.session.clone(),
                req.instrument.clone(),
                "only market_depth unset (full depth) or 1 (top-of-book) is supported",
            );
        }
        let depth_window = (req.market_depth == Some(1)).then_some(1);

        match req.action {
            MarketDataAction::Subscribe => {
                let subscription = Subscription {
                    request_id: req.request_id.clone(),
                    session: req.session.clone(),
                    instrument: req.instrument.clone(),
                    settings,
                    depth_window,
                    exclude_owner: None,
                    full_updates: req.full_updates,
                };
                if let Err(reason_code) = self.subscriptions.subscribe(subscription) {
                    return reject_with_code(
                        req.session.clone(),
                        req.instrument.clone(),
                        "a subscription with this request_id is already active",
                        reason_code,
                    );
                }
                let snapshot = self.compose_initial(&req.session, settings, depth_window, None);
                vec![Event::Client(ClientNotification::MarketDataSnapshot(snapshot))]
            }
            MarketDataAction::Unsubscribe => {
                if !self.subscriptions.unsubscribe(&req.session, &req.request_id) {
                    return reject(req.session.clone(), req.instrument.clone(), "no matching subscription to remove");
                }
                let key = (req.session.clone(), req.request_id.clone());
                self.previous_depth.remove(&key);
                self.previous_top.remove(&key);
                self.previous_instrument_info.remove(&key);
                Vec::new()
            }
            MarketDataAction::Snapshot => {
                let snapshot = self.compose_initial(&req.session, settings, depth_window, None);
                vec![Event::Client(ClientNotification::MarketDataSnapshot(snapshot))]
            }
        }
    }

    fn compose_initial(
        &self,
        session: &SessionHandle,
        settings: StreamingSettings,
        depth_window: Option<usize>,
        exclude_owner: Option<crate::party::OwnerHash>,
    ) -> MarketDataSnapshot {
        let depth = if settings.contains(StreamingSettings::DEPTH) {
            let sheet = depth::fold(&self.book, exclude_owner);
            Some(depth::build_full_depth_update(&sheet, depth_window))
        } else {
            None
        };
        let top = settings
            .contains(StreamingSettings::TOP)
            .then(|| BookTop::capture(&self.book));
        let trades = if settings.contains(StreamingSettings::TRADES) {
            self.trade_cache.last().into_iter().collect()
        } else {
            Vec::new()
        };
        let info = settings.contains(StreamingSettings::INFO).then(|| self.instrument_info.compose_initial());
        MarketDataSnapshot {
            session: session.clone(),
            instrument: self.instrument.clone(),
            depth,
            top,
            trades,
            info,
        }
    }

    /// Runs one publish cycle: folds the book once per distinct
    /// `(exclude_owner)` requirement, diffs against each subscriber's
    /// previous sheet, and emits an incremental [`MarketDataUpdate`] per
    /// subscription with a non-empty change set (spec §4.10: "emit...
    /// incremental MarketDataUpdate (empty updates are suppressed)").
    pub fn publish_market_data(&mut self) -> Vec<Event> {
        let subscriptions: Vec<Subscription> = self.subscriptions.subscriptions().to_vec();
        let mut events = Vec::with_capacity(subscriptions.len());

        for subscription in &subscriptions {
            let key = (subscription.session.clone(), subscription.request_id.clone());
            let current_sheet = depth::fold(&self.book, subscription.exclude_owner);
            let current_top = BookTop::capture(&self.book);
            let trades = if subscription.settings.contains(StreamingSettings::TRADES) {
                self.pending_trades.clone()
            } else {
                Vec::new()
            };

            if subscription.full_updates {
                // Full-update subscribers get a fresh snapshot every
                // cycle (spec §4.10), never a suppressed/empty one.
                let depth = subscription
                    .settings
                    .contains(StreamingSettings::DEPTH)
                    .then(|| depth::build_full_depth_update(&current_sheet, subscription.depth_window));
                let top = subscription.settings.contains(StreamingSettings::TOP).then_some(current_top);
                let info = subscription
                    .settings
                    .contains(StreamingSettings::INFO)
                    .then(|| self.instrument_info.compose_initial());
                self.previous_depth.insert(key.clone(), current_sheet);
                self.previous_top.insert(key.clone(), current_top);
                if let Some(info) = info {
                    self.previous_instrument_info.insert(key, info);
                }
                events.push(Event::Client(ClientNotification::MarketDataSnapshot(MarketDataSnapshot {
                    session: subscription.session.clone(),
                    instrument: self.instrument.clone(),
                    depth,
                    top,
                    trades,
                    info,
                })));
                continue;
            }

            let depth_update = if subscription.settings.contains(StreamingSettings::DEPTH) {
                let previous_sheet = self.previous_depth.get(&key).cloned().unwrap_or_default();
                Some(depth::build_incremental_depth_update(
                    &previous_sheet,
                    &current_sheet,
                    subscription.depth_window,
                ))
            } else {
                None
            };
            self.previous_depth.insert(key.clone(), current_sheet);

            let top_changed = self.previous_top.get(&key) != Some(&current_top);
            let top = if subscription.settings.contains(StreamingSettings::TOP) && top_changed {
                Some(current_top)
            } else {
                None
            };
            self.previous_top.insert(key.clone(), current_top);

            let info = if subscription.settings.contains(StreamingSettings::INFO) {
                let previous_info = self.previous_instrument_info.get(&key).copied().unwrap_or_default();
                let entries = self.instrument_info.compose_update(&previous_info);
                self.previous_instrument_info.insert(key, self.instrument_info.compose_initial());
                entries
            } else {
                Vec::new()
            };

            let depth_is_empty = depth_update.as_ref().is_none_or(|d| d.is_empty());
            if depth_is_empty && top.is_none() && trades.is_empty() && info.is_empty() {
                continue;
            }

            events.push(Event::Client(ClientNotification::MarketDataUpdate(MarketDataUpdate {
                instrument: self.instrument.clone(),
                depth: depth_update,
                top,
                trades,
                info,
            })));
        }

        self.pending_trades.clear();
        events
    }

    /// Captures everything [`EngineSnapshot`] carries (spec §6
    /// "Persisted state layout").
    pub fn store_state(&self) -> EngineSnapshot {
        EngineSnapshot {
            instrument: self.instrument.clone(),
            bids: self.book.bids().iter().cloned().collect(),
            offers: self.book.offers().iter().cloned().collect(),
            last_trade: self.trade_cache.last(),
            instrument_info: self.instrument_info,
            next_order_id: self.order_ids.peek_next(),
            next_trade_id: self.trade_ids.peek_next(),
        }
    }

    /// Wholesale-replaces the book and caches from `snapshot` (spec §6,
    /// §4.4 "Recover limit order"). The existing book is wiped via
    /// [`elimination::all_orders_elimination`] first, matching spec
    /// §4.5's description of that sweep as the tool for "replacing the
    /// book wholesale from a recovery snapshot"; the returned events are
    /// the `OrderRemoved` notifications for whatever was resting before
    /// recovery.
    pub fn recover_state(&mut self, snapshot: EngineSnapshot) -> Vec<Event> {
        let removed = elimination::all_orders_elimination(&mut self.book);

        self.instrument = snapshot.instrument;
        for order in snapshot.bids {
            self.book.insert(order);
        }
        for order in snapshot.offers {
            self.book.insert(order);
        }
        self.instrument_info = snapshot.instrument_info;
        if let Some(trade) = snapshot.last_trade {
            self.trade_cache.record(trade);
        }
        self.order_ids = OrderIdGenerator::resume_from(snapshot.next_order_id);
        self.trade_ids = MarketEntryIdGenerator::resume_from(snapshot.next_trade_id);

        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::order::SessionHandle;
    use chrono::TimeZone;

    fn engine() -> Engine {
        let instant = Utc.with_ymd_and_hms(2026, 7, 30, 12, 0, 0).unwrap();
        let clock = FixedClock::new(instant, chrono_tz::UTC);
        Engine::new(InstrumentDescriptor::new("X"), EngineConfig::default(), Box::new(clock))
    }

    fn placement(side: &str, price: u128, qty: u64, cid: &str) -> OrderPlacementRequest {
        OrderPlacementRequest {
            session: SessionHandle::new("s1"),
            instrument: InstrumentDescriptor::new("X"),
            client_order_id: Some(cid.to_string()),
            order_type: Some("LIMIT".to_string()),
            side: Some(side.to_string()),
            price: Some(price),
            quantity: Some(qty),
            time_in_force: None,
            expire_time: None,
            expire_date: None,
            short_sale_exempt_reason: None,
            parties: vec![],
        }
    }

    #[test]
    fn resting_limit_order_lands_on_the_book() {
        let mut engine = engine();
        let events = engine.place_order(&placement("BUY", 100, 10, "cid-1"));
        assert!(matches!(
            events[0],
            Event::Client(ClientNotification::PlacementConfirmation(_))
        ));
        assert_eq!(engine.book().bids().len(), 1);
    }

    #[test]
    fn closed_phase_transition_clears_day_orders_but_keeps_gtc() {
        let mut engine = engine();
        engine.place_order(&placement("BUY", 100, 10, "cid-1"));
        let mut gtc_req = placement("SELL", 101, 5, "cid-2");
        gtc_req.time_in_force = Some("GTC".to_string());
        engine.place_order(&gtc_req);

        let events = engine.transition_phase(PhaseState {
            trading_phase: crate::phase::TradingPhase::Closed,
            trading_status: crate::phase::TradingStatus::Resume,
            settings: crate::phase::PhaseSettings::default(),
        });

        assert_eq!(events.len(), 2);
        assert!(engine.book().bids().is_empty());
        assert!(!engine.book().offers().is_empty());
    }

    #[test]
    fn security_status_reflects_current_phase() {
        let mut engine = engine();
        engine.transition_phase(PhaseState {
            trading_phase: crate::phase::TradingPhase::Closed,
            trading_status: crate::phase::TradingStatus::Resume,
            settings: crate::phase::PhaseSettings::default(),
        });
        let events = engine.handle_security_status_request(&SecurityStatusRequest {
            session: SessionHandle::new("s1"),
            instrument: InstrumentDescriptor::new("X"),
        });
        match &events[0] {
            Event::Client(ClientNotification::SecurityStatus(status)) => {
                assert_eq!(status.trading_phase, crate::phase::TradingPhase::Closed);
            }
            _ => panic!("expected a SecurityStatus event"),
        }
    }

    #[test]
    fn subscribe_with_unknown_setting_is_rejected() {
        let mut engine = engine();
        let req = MarketDataRequest {
            request_id: "r1".to_string(),
            session: SessionHandle::new("s1"),
            instrument: InstrumentDescriptor::new("X"),
            action: MarketDataAction::Subscribe,
            settings: vec!["BOGUS".to_string()],
            market_depth: None,
            full_updates: false,
        };
        let events = engine.handle_market_data_request(&req);
        assert!(matches!(
            events[0],
            Event::Client(ClientNotification::MarketDataReject(_))
        ));
    }

    #[test]
    fn subscribe_then_snapshot_sees_the_resting_order() {
        let mut engine = engine();
        engine.place_order(&placement("BUY", 100, 10, "cid-1"));

        let req = MarketDataRequest {
            request_id: "r1".to_string(),
            session: SessionHandle::new("s1"),
            instrument: InstrumentDescriptor::new("X"),
            action: MarketDataAction::Subscribe,
            settings: vec!["DEPTH".to_string(), "TOP".to_string()],
            market_depth: None,
            full_updates: false,
        };
        let events = engine.handle_market_data_request(&req);
        match &events[0] {
            Event::Client(ClientNotification::MarketDataSnapshot(snapshot)) => {
                assert_eq!(snapshot.depth.as_ref().unwrap().bids.len(), 1);
                assert_eq!(snapshot.top.unwrap().best_bid, Some(100));
            }
            _ => panic!("expected a MarketDataSnapshot event"),
        }
    }

    #[test]
    fn publish_cycle_is_suppressed_when_nothing_changed() {
        let mut engine = engine();
        engine.place_order(&placement("BUY", 100, 10, "cid-1"));
        let req = MarketDataRequest {
            request_id: "r1".to_string(),
            session: SessionHandle::new("s1"),
            instrument: InstrumentDescriptor::new("X"),
            action: MarketDataAction::Subscribe,
            settings: vec!["DEPTH".to_string()],
            market_depth: None,
            full_updates: false,
        };
        engine.handle_market_data_request(&req);

        let first = engine.publish_market_data();
        assert!(first.is_empty());
    }

    #[test]
    fn publish_cycle_reports_a_new_order_as_added() {
        let mut engine = engine();
        let req = MarketDataRequest {
            request_id: "r1".to_string(),
            session: SessionHandle::new("s1"),
            instrument: InstrumentDescriptor::new("X"),
            action: MarketDataAction::Subscribe,
            settings: vec!["DEPTH".to_string()],
            market_depth: None,
            full_updates: false,
        };
        engine.handle_market_data_request(&req);

        engine.place_order(&placement("BUY", 100, 10, "cid-1"));
        let updates = engine.publish_market_data();
        assert_eq!(updates.len(), 1);
    }

    #[test]
    fn snapshot_round_trip_restores_the_book_and_id_continuity() {
        let mut engine = engine();
        engine.place_order(&placement("BUY", 100, 10, "cid-1"));
        engine.place_order(&placement("SELL", 105, 5, "cid-2"));

        let snapshot = engine.store_state();

        let mut restored = engine();
        restored.recover_state(snapshot);

        assert_eq!(restored.book().bids().len(), 1);
        assert_eq!(restored.book().offers().len(), 1);

        let events = restored.place_order(&placement("BUY", 90, 1, "cid-3"));
        match &events[0] {
            Event::Client(ClientNotification::PlacementConfirmation(confirmation)) => {
                assert_eq!(confirmation.order_id, 3);
            }
            _ => panic!("expected a PlacementConfirmation event"),
        }
    }

    #[test]
    fn disconnect_with_cancel_on_disconnect_removes_the_sessions_orders() {
        let instant = Utc.with_ymd_and_hms(2026, 7, 30, 12, 0, 0).unwrap();
        let clock = FixedClock::new(instant, chrono_tz::UTC);
        let config = EngineConfig {
            enable_cancel_on_disconnect: true,
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(InstrumentDescriptor::new("X"), config, Box::new(clock));
        engine.place_order(&placement("BUY", 100, 10, "cid-1"));

        let events = engine.disconnect_session(&SessionHandle::new("s1"));
        assert_eq!(events.len(), 2);
        assert!(engine.book().bids().is_empty());
    }

    #[test]
    fn recover_last_trade_replaces_cache_and_emits_the_event() {
        let mut engine = engine();
        let trade = TradeRecord {
            trade_id: 9,
            price: 500,
            quantity: 3,
            aggressor_side: crate::order::Side::Buy,
            timestamp: Utc.with_ymd_and_hms(2026, 7, 30, 12, 0, 0).unwrap(),
        };
        let events = engine.recover_last_trade(Some(trade));
        assert!(matches!(
            events[0],
            Event::Book(OrderBookNotification::LastTradeRecover { trade: Some(_), .. })
        ));
        assert_eq!(engine.trade_cache.last(), Some(trade));
    }

    #[test]
    fn recover_instrument_info_rejects_low_greater_than_high() {
        let mut engine = engine();
        let result = engine.recover_instrument_info(Some((120, 80)));
        assert!(result.is_err());
        assert_eq!(engine.instrument_info().low, None);
    }

    #[test]
    fn recover_instrument_info_with_a_valid_pair_installs_both_bounds() {
        let mut engine = engine();
        let events = engine.recover_instrument_info(Some((80, 120))).unwrap();
        assert!(matches!(
            events[0],
            Event::Book(OrderBookNotification::InstrumentInfoRecover { value: Some((80, 120)), .. })
        ));
        assert_eq!(engine.instrument_info().low, Some(80));
        assert_eq!(engine.instrument_info().high, Some(120));
    }
}
