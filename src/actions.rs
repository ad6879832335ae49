//! Top-level order actions (spec §4.4 "Actions"): placement,
//! modification, cancellation, and recovery, each gated by phase and
//! validated before touching the book.

use crate::book::OrderBook;
use crate::config::EngineConfig;
use crate::events::{ClientNotification, Event, OrderBookNotification};
use crate::ids::{ExecutionIdGenerator, OrderIdGenerator};
use crate::instrument_info::InstrumentInfo;
use crate::matcher::{self, MatchOutcome};
use crate::order::{LimitOrder, MarketOrder, OrderStatus, TimeInForce};
use crate::phase::{GatedRequestKind, PhaseHandler};
use crate::party::Party;
use crate::reply::{self, OrderView};
use crate::request::{
    interpret_cancellation, interpret_modification, interpret_placement, LimitPlacement,
    MarketPlacement, OrderCancellationRequest, OrderModificationRequest, OrderPlacementRequest,
    PlacementIntent,
};
use crate::trade_cache::{TradeCache, TradeRecord};
use crate::validator::{Conclusion, Validator};
use chrono::{DateTime, NaiveDate, Utc};

fn placement_reject(
    order_id: u64,
    req: &OrderPlacementRequest,
    reason: impl Into<String>,
) -> Vec<Event> {
    let execution_id = ExecutionIdGenerator::seeded_from(order_id).next_execution_id();
    let reject = reply::build_placement_reject(
        order_id,
        execution_id,
        req.session.clone(),
        req.client_order_id.clone(),
        reason,
    );
    vec![Event::Client(ClientNotification::PlacementReject(reject))]
}

/// Emits the confirmation plus, for each fill, a paired execution
/// report (taker and maker), a trade notification, and book notifications
/// for the maker side. Does not emit anything for the taker's own
/// resting/remove state — callers append that afterwards, since it
/// differs between limit and market placements.
#[allow(clippy::too_many_arguments)]
fn emit_match_events(
    taker_view: &OrderView,
    taker_execution_ids: &mut ExecutionIdGenerator,
    outcome: &MatchOutcome,
    instrument: &crate::order::InstrumentDescriptor,
    trade_ids: &crate::ids::MarketEntryIdGenerator,
    trade_cache: &mut TradeCache,
    instrument_info: &mut InstrumentInfo,
    now: DateTime<Utc>,
    events: &mut Vec<Event>,
) {
    for fill in &outcome.fills {
        let taker_counterparty = primary_party(&fill.maker_parties);
        let taker_report = reply::build_execution_report(
            taker_view,
            taker_execution_ids.next_execution_id(),
            fill.price,
            fill.quantity,
            taker_counterparty,
        );
        events.push(Event::Client(ClientNotification::ExecutionReport(taker_report)));

        let maker_view = OrderView {
            order_id: fill.maker_order_id,
            side: taker_view.side.opposite(),
            price: Some(fill.price),
            total_quantity: fill.maker_cumulative + fill.maker_leaves,
            cumulative_quantity: fill.maker_cumulative,
            status: fill.maker_status,
            time_in_force: TimeInForce::Gtc,
            client_order_id: fill.maker_client_order_id.clone(),
            session: fill.maker_session.clone(),
            instrument: instrument.clone(),
            parties: fill.maker_parties.clone(),
        };
        let maker_counterparty = primary_party(&taker_view.parties);
        let maker_report = reply::build_execution_report(
            &maker_view,
            ExecutionIdGenerator::seeded_from(fill.maker_order_id).next_execution_id(),
            fill.price,
            fill.quantity,
            maker_counterparty,
        );
        events.push(Event::Client(ClientNotification::ExecutionReport(maker_report)));

        let trade_id = trade_ids.next_id();
        trade_cache.record(TradeRecord {
            trade_id,
            price: fill.price,
            quantity: fill.quantity,
            aggressor_side: taker_view.side,
            timestamp: now,
        });
        instrument_info.record_trade_price(fill.price);
        events.push(Event::Book(OrderBookNotification::Trade {
            instrument: instrument.clone(),
            trade_id,
            price: fill.price,
            quantity: fill.quantity,
            aggressor_side: taker_view.side,
        }));

        if fill.maker_leaves == 0 {
            events.push(Event::Book(OrderBookNotification::OrderRemoved {
                instrument: instrument.clone(),
                order_id: fill.maker_order_id,
                side: taker_view.side.opposite(),
                price: fill.price,
            }));
        } else {
            events.push(Event::Book(OrderBookNotification::OrderReduced {
                instrument: instrument.clone(),
                order_id: fill.maker_order_id,
                side: taker_view.side.opposite(),
                price: fill.price,
                leaves_quantity: fill.maker_leaves,
            }));
        }
    }
}

fn primary_party(parties: &[Party]) -> Option<Party> {
    parties.first().cloned()
}

/// Places an order (limit or market), fully orchestrating interpretation,
/// phase gating, validation, matching, and reply/notification emission
/// (spec §4.4 "Place order").
///
/// Order ids (and their auxiliary execution-id seed) are allocated
/// before any validation runs, so a rejected placement still consumes
/// both (spec §9, "Open questions").
#[allow(clippy::too_many_arguments)]
pub fn place_order(
    book: &mut OrderBook,
    order_ids: &OrderIdGenerator,
    trade_ids: &crate::ids::MarketEntryIdGenerator,
    config: &EngineConfig,
    phase: &PhaseHandler,
    trade_cache: &mut TradeCache,
    instrument_info: &mut InstrumentInfo,
    now: DateTime<Utc>,
    req: &OrderPlacementRequest,
) -> Vec<Event> {
    let order_id = order_ids.next_id();

    let intent = match interpret_placement(req) {
        Ok(intent) => intent,
        Err(e) => return placement_reject(order_id, req, e.to_string()),
    };

    if let Err(rejection) = phase.gate(GatedRequestKind::Action) {
        return placement_reject(order_id, req, rejection.reason);
    }

    let validator = Validator::new(config);

    match intent {
        PlacementIntent::Limit(limit) => place_limit(
            book, order_id, trade_ids, &validator, trade_cache, instrument_info, now, req, limit,
        ),
        PlacementIntent::Market(market) => place_market(
            book, order_id, trade_ids, &validator, trade_cache, instrument_info, now, req, market,
        ),
    }
}

#[allow(clippy::too_many_arguments)]
fn place_limit(
    book: &mut OrderBook,
    order_id: u64,
    trade_ids: &crate::ids::MarketEntryIdGenerator,
    validator: &Validator<'_>,
    trade_cache: &mut TradeCache,
    instrument_info: &mut InstrumentInfo,
    now: DateTime<Utc>,
    req: &OrderPlacementRequest,
    placement: LimitPlacement,
) -> Vec<Event> {
    if let Conclusion::Failure(reason) = validator.validate_price(placement.price) {
        return placement_reject(order_id, req, reason);
    }
    if let Conclusion::Failure(reason) = validator.validate_quantity(placement.quantity) {
        return placement_reject(order_id, req, reason);
    }
    if let Some(cid) = &req.client_order_id {
        if book.count_by_session_and_client_order_id(&req.session, cid) > 0 {
            return placement_reject(order_id, req, format!("duplicate client_order_id '{cid}'"));
        }
    }

    // FOK feasibility is a precondition of acceptance itself: an
    // infeasible FOK order is rejected outright rather than confirmed
    // and then cancelled. `match_order` makes no book mutation when it
    // returns infeasible, so probing it first is safe.
    if placement.time_in_force == TimeInForce::Fok {
        let probe = matcher::match_order(
            book,
            placement.side,
            Some(placement.price),
            placement.quantity,
            TimeInForce::Fok,
        );
        if probe.fills.is_empty() {
            return placement_reject(order_id, req, "order cannot be filled in full (FOK)");
        }
        return finish_limit_placement(
            book, order_id, trade_ids, trade_cache, instrument_info, now, req, placement, probe,
        );
    }

    // IOC, like FOK, has mandatory facing orders as a precondition of
    // acceptance itself: an IOC with nothing crossing it is rejected
    // outright, never confirmed-then-silently-dropped (spec §4.3 Limit
    // IOC: "mandatory facing orders (precondition checked before
    // match)").
    if placement.time_in_force == TimeInForce::Ioc
        && !matcher::has_facing_orders(book, placement.side, Some(placement.price))
    {
        return placement_reject(order_id, req, "no facing orders found");
    }

    let mut events = Vec::new();
    let mut execution_ids = ExecutionIdGenerator::seeded_from(order_id);
    let confirmation_view = OrderView {
        order_id,
        side: placement.side,
        price: Some(placement.price),
        total_quantity: placement.quantity,
        cumulative_quantity: 0,
        status: OrderStatus::New,
        time_in_force: placement.time_in_force,
        client_order_id: req.client_order_id.clone(),
        session: req.session.clone(),
        instrument: req.instrument.clone(),
        parties: req.parties.clone(),
    };
    let confirmation = reply::build_placement_confirmation(&confirmation_view, execution_ids.next_execution_id());
    events.push(Event::Client(ClientNotification::PlacementConfirmation(confirmation)));

    let outcome = matcher::match_order(
        book,
        placement.side,
        Some(placement.price),
        placement.quantity,
        placement.time_in_force,
    );

    apply_limit_outcome(
        book, order_id, trade_ids, trade_cache, instrument_info, now, req, placement, outcome, events,
        execution_ids,
    )
}

#[allow(clippy::too_many_arguments)]
fn finish_limit_placement(
    book: &mut OrderBook,
    order_id: u64,
    trade_ids: &crate::ids::MarketEntryIdGenerator,
    trade_cache: &mut TradeCache,
    instrument_info: &mut InstrumentInfo,
    now: DateTime<Utc>,
    req: &OrderPlacementRequest,
    placement: LimitPlacement,
    outcome: MatchOutcome,
) -> Vec<Event> {
    let mut execution_ids = ExecutionIdGenerator::seeded_from(order_id);
    let confirmation_view = OrderView {
        order_id,
        side: placement.side,
        price: Some(placement.price),
        total_quantity: placement.quantity,
        cumulative_quantity: 0,
        status: OrderStatus::New,
        time_in_force: placement.time_in_force,
        client_order_id: req.client_order_id.clone(),
        session: req.session.clone(),
        instrument: req.instrument.clone(),
        parties: req.parties.clone(),
    };
    let confirmation = reply::build_placement_confirmation(&confirmation_view, execution_ids.next_execution_id());
    let events = vec![Event::Client(ClientNotification::PlacementConfirmation(confirmation))];

    apply_limit_outcome(
        book, order_id, trade_ids, trade_cache, instrument_info, now, req, placement, outcome, events,
        execution_ids,
    )
}

#[allow(clippy::too_many_arguments)]
fn apply_limit_outcome(
    book: &mut OrderBook,
    order_id: u64,
    trade_ids: &crate::ids::MarketEntryIdGenerator,
    trade_cache: &mut TradeCache,
    instrument_info: &mut InstrumentInfo,
    now: DateTime<Utc>,
    req: &OrderPlacementRequest,
    placement: LimitPlacement,
    outcome: MatchOutcome,
    mut events: Vec<Event>,
    mut execution_ids: ExecutionIdGenerator,
) -> Vec<Event> {
    let traded = outcome.traded_quantity();

    let taker_view = OrderView {
        order_id,
        side: placement.side,
        price: Some(placement.price),
        total_quantity: placement.quantity,
        cumulative_quantity: traded,
        status: if traded == 0 {
            OrderStatus::New
        } else if traded == placement.quantity {
            OrderStatus::Filled
        } else if placement.time_in_force == TimeInForce::Ioc {
            // An IOC taker left with leaves after exhausting every
            // crossing maker is implicitly cancelled, not left
            // PartiallyFilled (spec §4.3 Limit IOC: "if taker is still
            // not executed, it is cancelled").
            OrderStatus::Cancelled
        } else {
            OrderStatus::PartiallyFilled
        },
        time_in_force: placement.time_in_force,
        client_order_id: req.client_order_id.clone(),
        session: req.session.clone(),
        instrument: req.instrument.clone(),
        parties: req.parties.clone(),
    };

    emit_match_events(
        &taker_view,
        &mut execution_ids,
        &outcome,
        &req.instrument,
        trade_ids,
        trade_cache,
        instrument_info,
        now,
        &mut events,
    );

    let rests = matches!(
        placement.time_in_force,
        TimeInForce::Day | TimeInForce::Gtc | TimeInForce::Gtd
    );

    if rests && outcome.remaining > 0 {
        let order = LimitOrder {
            order_id,
            side: placement.side,
            price: placement.price,
            total_quantity: placement.quantity,
            cumulative_quantity: traded,
            status: taker_view.status,
            time_in_force: placement.time_in_force,
            expire_time: placement.expire_time,
            expire_date: placement.expire_date,
            short_sale_exempt_reason: placement.short_sale_exempt_reason,
            client_order_id: req.client_order_id.clone(),
            parties: req.parties.clone(),
            session: req.session.clone(),
            instrument: req.instrument.clone(),
            order_time: now,
            execution_ids: Some(execution_ids),
        };
        events.push(Event::Book(OrderBookNotification::OrderAdded {
            instrument: req.instrument.clone(),
            order_id,
            side: placement.side,
            price: placement.price,
            leaves_quantity: order.leaves(),
        }));
        book.insert(order);
    }

    events
}

#[allow(clippy::too_many_arguments)]
fn place_market(
    book: &mut OrderBook,
    order_id: u64,
    trade_ids: &crate::ids::MarketEntryIdGenerator,
    validator: &Validator<'_>,
    trade_cache: &mut TradeCache,
    instrument_info: &mut InstrumentInfo,
    now: DateTime<Utc>,
    req: &OrderPlacementRequest,
    placement: MarketPlacement,
) -> Vec<Event> {
    if let Conclusion::Failure(reason) = validator.validate_quantity(placement.quantity) {
        return placement_reject(order_id, req, reason);
    }
    // A market order with no facing orders at all is rejected outright,
    // never confirmed (spec §4.3 Market: "If page was empty, reject
    // ('no facing orders')").
    if !matcher::has_facing_orders(book, placement.side, None) {
        return placement_reject(order_id, req, "no facing orders found");
    }

    let mut execution_ids = ExecutionIdGenerator::seeded_from(order_id);
    let confirmation_view = OrderView {
        order_id,
        side: placement.side,
        price: None,
        total_quantity: placement.quantity,
        cumulative_quantity: 0,
        status: OrderStatus::New,
        time_in_force: MarketOrder::TIME_IN_FORCE,
        client_order_id: req.client_order_id.clone(),
        session: req.session.clone(),
        instrument: req.instrument.clone(),
        parties: req.parties.clone(),
    };
    // Market-order confirmation precedes matching (spec §9, "Open
    // questions"): the client sees its order accepted before any
    // execution reports, regardless of how quickly it fills.
    let confirmation = reply::build_placement_confirmation(&confirmation_view, execution_ids.next_execution_id());
    let mut events = vec![Event::Client(ClientNotification::PlacementConfirmation(confirmation))];

    let outcome = matcher::match_order(book, placement.side, None, placement.quantity, MarketOrder::TIME_IN_FORCE);
    let traded = outcome.traded_quantity();

    let taker_view = OrderView {
        order_id,
        side: placement.side,
        price: None,
        total_quantity: placement.quantity,
        cumulative_quantity: traded,
        status: if traded == placement.quantity {
            OrderStatus::Filled
        } else {
            // Market orders are implicitly IOC (spec §3: "implicitly
            // treated as IOC after accept"): any unfilled remainder,
            // whether the taker traded nothing or only part of its
            // quantity, ends in Cancelled rather than PartiallyFilled.
            OrderStatus::Cancelled
        },
        time_in_force: MarketOrder::TIME_IN_FORCE,
        client_order_id: req.client_order_id.clone(),
        session: req.session.clone(),
        instrument: req.instrument.clone(),
        parties: req.parties.clone(),
    };

    emit_match_events(
        &taker_view,
        &mut execution_ids,
        &outcome,
        &req.instrument,
        trade_ids,
        trade_cache,
        instrument_info,
        now,
        &mut events,
    );

    // Market orders never rest; any unfilled remainder is simply
    // discarded (spec §3: "Market orders are never resting").
    events
}

/// Modifies a resting limit order's price and/or quantity, then re-runs it
/// through the matcher in case the amendment newly crosses the book (spec
/// §4.4 "Amend limit": "...emit modification confirmation, then re-match;
/// if not executed, re-insert and emit OrderAdded").
#[allow(clippy::too_many_arguments)]
pub fn amend_order(
    book: &mut OrderBook,
    config: &EngineConfig,
    phase: &PhaseHandler,
    trade_ids: &crate::ids::MarketEntryIdGenerator,
    trade_cache: &mut TradeCache,
    instrument_info: &mut InstrumentInfo,
    now: DateTime<Utc>,
    req: &OrderModificationRequest,
) -> Vec<Event> {
    let intent = match interpret_modification(req) {
        Ok(intent) => intent,
        Err(e) => return modification_reject(req, e.to_string()),
    };

    if let Err(rejection) = phase.gate(GatedRequestKind::Action) {
        return modification_reject(req, rejection.reason);
    }

    let Some(existing_order_id) = resolve_order_id(book, req.order_id, req.client_order_id.as_deref(), &req.session)
    else {
        return modification_reject(req, "order not found");
    };

    let Some(existing) = book.find_by_order_id(existing_order_id) else {
        return modification_reject(req, "order not found");
    };
    let new_price = intent.new_price.unwrap_or(existing.price);
    let new_quantity = intent.new_quantity.unwrap_or(existing.total_quantity);

    let validator = Validator::new(config);
    if let Conclusion::Failure(reason) = validator.validate_price(new_price) {
        return modification_reject(req, reason);
    }
    if let Conclusion::Failure(reason) = validator.validate_quantity(new_quantity) {
        return modification_reject(req, reason);
    }
    if new_quantity <= existing.cumulative_quantity {
        return modification_reject(
            req,
            "new quantity must exceed the quantity already executed",
        );
    }

    let mut order = book.remove_by_order_id(existing_order_id).expect("order located above");
    let side = order.side;
    let old_price = order.price;
    let instrument = order.instrument.clone();
    order.apply_amend(new_price, new_quantity, now);

    let confirmation = crate::reply::OrderModificationConfirmation {
        order_id: existing_order_id,
        session: req.session.clone(),
        client_order_id: req.client_order_id.clone(),
        price: new_price,
        total_quantity: new_quantity,
    };

    let mut events = vec![
        Event::Book(OrderBookNotification::OrderRemoved {
            instrument: instrument.clone(),
            order_id: existing_order_id,
            side,
            price: old_price,
        }),
        Event::Client(ClientNotification::ModificationConfirmation(confirmation)),
    ];

    let outcome = matcher::match_order(book, side, Some(new_price), order.leaves(), order.time_in_force);
    let traded = outcome.traded_quantity();
    if traded > 0 {
        order.apply_execution(traded);
    }

    let mut execution_ids = order
        .execution_ids
        .take()
        .unwrap_or_else(|| ExecutionIdGenerator::seeded_from(existing_order_id));
    let taker_view = OrderView {
        order_id: existing_order_id,
        side,
        price: Some(new_price),
        total_quantity: order.total_quantity,
        cumulative_quantity: order.cumulative_quantity,
        status: order.status,
        time_in_force: order.time_in_force,
        client_order_id: order.client_order_id.clone(),
        session: order.session.clone(),
        instrument: instrument.clone(),
        parties: order.parties.clone(),
    };

    emit_match_events(
        &taker_view,
        &mut execution_ids,
        &outcome,
        &instrument,
        trade_ids,
        trade_cache,
        instrument_info,
        now,
        &mut events,
    );
    order.execution_ids = Some(execution_ids);

    if order.leaves() > 0 {
        events.push(Event::Book(OrderBookNotification::OrderAdded {
            instrument,
            order_id: existing_order_id,
            side,
            price: new_price,
            leaves_quantity: order.leaves(),
        }));
        book.insert(order);
    }

    events
}

fn modification_reject(req: &OrderModificationRequest, reason: impl Into<String>) -> Vec<Event> {
    let reject = crate::reply::OrderModificationReject {
        session: req.session.clone(),
        client_order_id: req.client_order_id.clone(),
        order_id: req.order_id,
        reason: reason.into(),
    };
    vec![Event::Client(ClientNotification::ModificationReject(reject))]
}

fn resolve_order_id(
    book: &OrderBook,
    order_id: Option<u64>,
    client_order_id: Option<&str>,
    session: &crate::order::SessionHandle,
) -> Option<u64> {
    if let Some(id) = order_id {
        return book.find_by_order_id(id).map(|_| id);
    }
    let cid = client_order_id?;
    if book.count_by_session_and_client_order_id(session, cid) != 1 {
        return None;
    }
    book.find_by_session_and_client_order_id(session, cid).map(|o| o.order_id)
}

/// Cancels a resting limit order (spec §4.4 "Cancel").
pub fn cancel_order(
    book: &mut OrderBook,
    phase: &PhaseHandler,
    req: &OrderCancellationRequest,
) -> Vec<Event> {
    if let Err(e) = interpret_cancellation(req) {
        return cancellation_reject(req, e.to_string());
    }

    if let Err(rejection) = phase.gate(GatedRequestKind::Cancellation) {
        return cancellation_reject(req, rejection.reason);
    }

    let Some(order_id) = resolve_order_id(book, req.order_id, req.client_order_id.as_deref(), &req.session)
    else {
        return cancellation_reject(req, "order not found");
    };

    let order = book.remove_by_order_id(order_id).expect("order located above");

    let confirmation = crate::reply::OrderCancellationConfirmation {
        order_id,
        session: req.session.clone(),
        client_order_id: req.client_order_id.clone(),
    };

    vec![
        Event::Client(ClientNotification::CancellationConfirmation(confirmation)),
        Event::Book(OrderBookNotification::OrderRemoved {
            instrument: order.instrument,
            order_id,
            side: order.side,
            price: order.price,
        }),
    ]
}

fn cancellation_reject(req: &OrderCancellationRequest, reason: impl Into<String>) -> Vec<Event> {
    let reject = crate::reply::OrderCancellationReject {
        session: req.session.clone(),
        client_order_id: req.client_order_id.clone(),
        order_id: req.order_id,
        reason: reason.into(),
    };
    vec![Event::Client(ClientNotification::CancellationReject(reject))]
}

/// Restores a previously-persisted resting order directly into the book
/// (spec §4.4 "Recover limit order"), validating it is still consistent
/// with the current phase and, for GTD orders, not already expired.
/// Recovery never emits client replies — it is a bulk reload, not a
/// live request.
pub fn recover_limit_order(
    book: &mut OrderBook,
    validator: &Validator<'_>,
    phase: &PhaseHandler,
    order: LimitOrder,
    now: DateTime<Utc>,
    today: NaiveDate,
) -> Result<(), String> {
    if let Conclusion::Failure(reason) =
        validator.validate_recovery_phase_consistency(order.time_in_force, phase)
    {
        return Err(reason);
    }
    if order.time_in_force == TimeInForce::Gtd {
        if let Conclusion::Failure(reason) =
            validator.validate_gtd_not_already_expired(order.expire_time, order.expire_date, now, today)
        {
            return Err(reason);
        }
    }
    book.insert(order);
    Ok(())
}
