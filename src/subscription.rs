//! Market data subscriptions (spec §4.10 "Subscription manager").
//!
//! Streaming settings are a bitset, the same way the reference crate
//! models order-book feature flags: a subscriber asks for any
//! combination of depth/top-of-book/trades, optionally windowed and
//! optionally excluding its own resting quantity from depth.

use crate::depth::{BookTop, FullDepthUpdate, IncrementalDepthUpdate};
use crate::instrument_info::{InstrumentInfoEntry, InstrumentInfoSnapshot};
use crate::order::{InstrumentDescriptor, SessionHandle};
use crate::party::OwnerHash;
use crate::trade_cache::TradeRecord;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Which market-data streams a subscription wants.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct StreamingSettings: u8 {
        /// Aggregated price-level depth.
        const DEPTH = 0b0000_0001;
        /// Top-of-book (best bid/offer, spread, mid).
        const TOP = 0b0000_0010;
        /// Trade prints.
        const TRADES = 0b0000_0100;
        /// Instrument-info (low/mid/high traded price).
        const INFO = 0b0000_1000;
    }
}

/// One session's subscription to one instrument's market data.
#[derive(Debug, Clone)]
pub struct Subscription {
    /// The request-id this subscription was opened under (spec §4.10:
    /// subscriptions are indexed by `(request_id, session)`, so the same
    /// session may hold several concurrent subscriptions distinguished
    /// only by request-id).
    pub request_id: String,
    /// The subscribing session.
    pub session: SessionHandle,
    /// The instrument subscribed to.
    pub instrument: InstrumentDescriptor,
    /// Which streams were requested.
    pub settings: StreamingSettings,
    /// Maximum depth levels per side, if the subscriber asked for a
    /// capped window; `None` means unwindowed.
    pub depth_window: Option<usize>,
    /// When set, the subscriber's own resting quantity is excluded from
    /// every depth level it receives (spec §4.7 "Owner-exclusion mode").
    pub exclude_owner: Option<OwnerHash>,
    /// When set, every publish cycle sends this subscriber a full
    /// `MarketDataSnapshot` instead of an incremental `MarketDataUpdate`
    /// (spec §4.10: "emit... `MarketDataUpdate`... or a
    /// `MarketDataSnapshot` if the subscription requested full
    /// updates").
    pub full_updates: bool,
}

/// A reject reason a market-data request can carry beyond the free-text
/// `reason` string, for callers that need to branch on it (spec §4.10:
/// "a typed reject reason (`DuplicateMdReqId` on subscribe collision)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketDataRejectReason {
    /// The `(request_id, session)` pair already has an active subscription.
    DuplicateMdReqId,
}

/// A rejected market data request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataReject {
    /// The session whose request was rejected.
    pub session: SessionHandle,
    /// The instrument the request named.
    pub instrument: InstrumentDescriptor,
    /// Human-readable rejection reason.
    pub reason: String,
    /// Typed reason, when the rejection maps to a recognized code.
    #[serde(default)]
    pub reason_code: Option<MarketDataRejectReason>,
}

/// A one-shot or subscribe-time snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataSnapshot {
    /// The session the snapshot is addressed to.
    pub session: SessionHandle,
    /// The instrument the snapshot describes.
    pub instrument: InstrumentDescriptor,
    /// Full depth, if the subscription requested it.
    pub depth: Option<FullDepthUpdate>,
    /// Top-of-book, if the subscription requested it.
    pub top: Option<BookTop>,
    /// The last trade, if the subscription requested trade streaming and
    /// one has occurred (spec §4.8: "Initial compose emits at most one
    /// entry, the last trade, if any").
    #[serde(default)]
    pub trades: Vec<TradeRecord>,
    /// Present values of low/mid/high, if the subscription requested
    /// instrument-info streaming (spec §4.9: "Initial compose emits
    /// only present values, no action").
    #[serde(default)]
    pub info: Option<InstrumentInfoSnapshot>,
}

/// An incremental update pushed to an existing subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataUpdate {
    /// The instrument the update describes.
    pub instrument: InstrumentDescriptor,
    /// Depth-level changes, if the subscription requested depth and any
    /// level changed.
    pub depth: Option<IncrementalDepthUpdate>,
    /// New top-of-book, if the subscription requested it and it changed.
    pub top: Option<BookTop>,
    /// Trades recorded since the previous publish cycle, if the
    /// subscription requested trade streaming (spec §4.8: "Update compose
    /// emits each per-cycle trade as a New market-data entry").
    #[serde(default)]
    pub trades: Vec<TradeRecord>,
    /// Low/mid/high fields that changed this cycle, each tagged with how
    /// (spec §4.9 "update compose").
    #[serde(default)]
    pub info: Vec<InstrumentInfoEntry>,
}

/// Tracks every session's market-data subscriptions for the instrument.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionManager {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionManager {
    /// Creates an empty subscription manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// All current subscriptions.
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Subscribes a session to an instrument. Subscriptions are indexed
    /// by `(request_id, session)`; a second `Subscribe` for the same
    /// pair is rejected rather than silently replacing the first (spec
    /// §4.10: "index by (request-id, session); reject duplicate").
    pub fn subscribe(&mut self, subscription: Subscription) -> Result<(), MarketDataRejectReason> {
        let already_subscribed = self.subscriptions.iter().any(|s| {
            s.request_id == subscription.request_id && s.session == subscription.session
        });
        if already_subscribed {
            return Err(MarketDataRejectReason::DuplicateMdReqId);
        }
        self.subscriptions.push(subscription);
        Ok(())
    }

    /// Removes a session's subscription identified by `request_id`, if
    /// present (spec §4.10: "Unsubscribe: remove by key; reject if
    /// absent").
    pub fn unsubscribe(&mut self, session: &SessionHandle, request_id: &str) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions
            .retain(|s| !(&s.session == session && s.request_id == request_id));
        self.subscriptions.len() != before
    }

    /// Removes every subscription held by a session, e.g. on disconnect.
    pub fn remove_session(&mut self, session: &SessionHandle) {
        self.subscriptions.retain(|s| &s.session != session);
    }

    /// Iterates subscriptions for a given instrument, for broadcasting
    /// an incremental update.
    pub fn for_instrument<'a>(
        &'a self,
        instrument: &'a InstrumentDescriptor,
    ) -> impl Iterator<Item = &'a Subscription> + 'a {
        self.subscriptions.iter().filter(move |s| &s.instrument == instrument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(request_id: &str, session: &str, instrument: &str) -> Subscription {
        Subscription {
            request_id: request_id.to_string(),
            session: SessionHandle::new(session),
            instrument: InstrumentDescriptor::new(instrument),
            settings: StreamingSettings::DEPTH | StreamingSettings::TRADES,
            depth_window: Some(5),
            exclude_owner: None,
            full_updates: false,
        }
    }

    #[test]
    fn duplicate_subscription_is_rejected() {
        let mut manager = SubscriptionManager::new();
        assert!(manager.subscribe(subscription("r1", "s1", "X")).is_ok());
        assert_eq!(
            manager.subscribe(subscription("r1", "s1", "X")),
            Err(MarketDataRejectReason::DuplicateMdReqId)
        );
    }

    #[test]
    fn same_session_can_hold_multiple_request_ids() {
        let mut manager = SubscriptionManager::new();
        assert!(manager.subscribe(subscription("r1", "s1", "X")).is_ok());
        assert!(manager.subscribe(subscription("r2", "s1", "X")).is_ok());
    }

    #[test]
    fn unsubscribe_removes_only_the_matching_request_id() {
        let mut manager = SubscriptionManager::new();
        manager.subscribe(subscription("r1", "s1", "X")).unwrap();
        manager.subscribe(subscription("r2", "s1", "Y")).unwrap();
        let removed = manager.unsubscribe(&SessionHandle::new("s1"), "r1");
        assert!(removed);
        assert_eq!(manager.subscriptions().len(), 1);
        assert_eq!(manager.subscriptions()[0].request_id, "r2");
    }

    #[test]
    fn disconnect_clears_every_subscription_for_the_session() {
        let mut manager = SubscriptionManager::new();
        manager.subscribe(subscription("r1", "s1", "X")).unwrap();
        manager.subscribe(subscription("r2", "s1", "Y")).unwrap();
        manager.subscribe(subscription("r1", "s2", "X")).unwrap();
        manager.remove_session(&SessionHandle::new("s1"));
        assert_eq!(manager.subscriptions().len(), 1);
        assert_eq!(manager.subscriptions()[0].session, SessionHandle::new("s2"));
    }

    #[test]
    fn streaming_settings_combine_as_bits() {
        let settings = StreamingSettings::DEPTH | StreamingSettings::TOP;
        assert!(settings.contains(StreamingSettings::DEPTH));
        assert!(settings.contains(StreamingSettings::TOP));
        assert!(!settings.contains(StreamingSettings::TRADES));
    }
}
