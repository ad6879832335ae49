//! Event dispatch (spec §4.11 "Event dispatcher"): every event an
//! operation produces is routed to exactly one of two sinks — a
//! client-reply sink or an order-book/market-data sink — in the order
//! the operation emitted them. Routing itself never reorders; only the
//! sink implementation decides what happens to a notification next
//! (e.g. handing it to a transport, out of scope here).

use crate::events::{ClientNotification, Event, OrderBookNotification};

/// Receives replies addressed to client sessions.
pub trait ClientSink {
    /// Delivers one client notification.
    fn send(&mut self, notification: ClientNotification);
}

/// Receives order-book/market-data notifications.
pub trait MarketDataSink {
    /// Delivers one order-book notification.
    fn send(&mut self, notification: OrderBookNotification);
}

/// Routes a batch of [`Event`]s to the two sinks, preserving emission
/// order within each sink.
pub struct EventDispatcher<'a> {
    client_sink: &'a mut dyn ClientSink,
    market_sink: &'a mut dyn MarketDataSink,
}

impl<'a> EventDispatcher<'a> {
    /// Builds a dispatcher over the given sinks.
    pub fn new(client_sink: &'a mut dyn ClientSink, market_sink: &'a mut dyn MarketDataSink) -> Self {
        Self { client_sink, market_sink }
    }

    /// Dispatches every event, in order, to its sink.
    pub fn dispatch(&mut self, events: Vec<Event>) {
        for event in events {
            match event {
                Event::Client(notification) => self.client_sink.send(notification),
                Event::Book(notification) => self.market_sink.send(notification),
            }
        }
    }
}

/// A client sink that simply records notifications in arrival order,
/// useful for tests and for a single-consumer embedding of the engine.
#[derive(Debug, Default)]
pub struct RecordingClientSink {
    /// Notifications received so far, oldest first.
    pub received: Vec<ClientNotification>,
}

impl ClientSink for RecordingClientSink {
    fn send(&mut self, notification: ClientNotification) {
        self.received.push(notification);
    }
}

/// A market-data sink that simply records notifications in arrival
/// order.
#[derive(Debug, Default)]
pub struct RecordingMarketDataSink {
    /// Notifications received so far, oldest first.
    pub received: Vec<OrderBookNotification>,
}

impl MarketDataSink for RecordingMarketDataSink {
    fn send(&mut self, notification: OrderBookNotification) {
        self.received.push(notification);
    }
}
