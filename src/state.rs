//! Snapshot/restore of engine-owned state (spec §6 "Persisted state
//! layout"): the order book's resting orders, the last trade, and the
//! instrument-info bounds, plus the two id-generator counters needed so a
//! restored engine never reissues an id handed out before the snapshot was
//! taken (spec §3: order ids are "unique per engine instance, monotonic" —
//! a property that round-tripping through a snapshot must preserve).
//!
//! Subscriptions and per-subscriber depth-diff state are deliberately not
//! part of this snapshot: spec §6 enumerates exactly order book + last
//! trade + instrument info as what `store_state`/`recover_state` carry,
//! and live subscriptions belong to client sessions that re-subscribe
//! after reconnecting, not to the book's persisted content.

use crate::instrument_info::InstrumentInfo;
use crate::order::{InstrumentDescriptor, LimitOrder};
use crate::trade_cache::TradeRecord;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A snapshot of everything an [`crate::engine::Engine`] needs to resume
/// exactly where it left off: resting orders on both sides, the last
/// trade, and the instrument's recorded low/high, plus the next id each
/// generator will hand out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// The instrument this snapshot was taken for.
    pub instrument: InstrumentDescriptor,
    /// Resting bid-side orders, best first.
    pub bids: Vec<LimitOrder>,
    /// Resting offer-side orders, best first.
    pub offers: Vec<LimitOrder>,
    /// The last trade recorded before the snapshot, if any.
    pub last_trade: Option<TradeRecord>,
    /// Recorded low/high traded price bounds.
    pub instrument_info: InstrumentInfo,
    /// The order id the `OrderIdGenerator` will hand out next.
    pub next_order_id: u64,
    /// The market-entry id the trade-id generator will hand out next.
    pub next_trade_id: u64,
}

/// A non-fatal failure decoding or validating a persisted snapshot (spec
/// §7 layer 1: these are deserialization/integrity problems a caller
/// handles, never a panic).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The stored format version is newer/older than this build supports.
    InvalidOperation {
        /// Description of the mismatch.
        message: String,
    },
    /// The package's checksum does not match its recomputed payload hash.
    ChecksumMismatch {
        /// The checksum stored in the package.
        expected: String,
        /// The checksum recomputed from the payload.
        actual: String,
    },
    /// `serde_json` failed to encode or decode the payload.
    SerializationError {
        /// Underlying error message.
        message: String,
    },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::InvalidOperation { message } => write!(f, "invalid operation: {message}"),
            StateError::ChecksumMismatch { expected, actual } => {
                write!(f, "checksum mismatch: expected {expected}, but computed {actual}")
            }
            StateError::SerializationError { message } => write!(f, "serialization error: {message}"),
        }
    }
}

impl std::error::Error for StateError {}

/// The format version of [`EngineSnapshotPackage`]'s payload.
pub const ENGINE_SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// An integrity-checked wrapper around an [`EngineSnapshot`], mirroring the
/// reference crate's `OrderBookSnapshotPackage` (version + payload + hex
/// checksum). Used only when a caller opts into integrity-checked
/// persistence; the bare `EngineSnapshot` does not require it (spec §B).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshotPackage {
    version: u32,
    snapshot: EngineSnapshot,
    checksum: String,
}

impl EngineSnapshotPackage {
    /// Wraps `snapshot`, computing and storing its checksum.
    pub fn new(snapshot: EngineSnapshot) -> Result<Self, StateError> {
        let checksum = compute_checksum(&snapshot)?;
        Ok(Self {
            version: ENGINE_SNAPSHOT_FORMAT_VERSION,
            snapshot,
            checksum,
        })
    }

    /// Serializes the package to a JSON string.
    pub fn to_json(&self) -> Result<String, StateError> {
        serde_json::to_string(self).map_err(|e| StateError::SerializationError { message: e.to_string() })
    }

    /// Deserializes a package from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, StateError> {
        serde_json::from_str(json).map_err(|e| StateError::SerializationError { message: e.to_string() })
    }

    /// Validates the package's version and checksum against its payload.
    pub fn validate(&self) -> Result<(), StateError> {
        if self.version != ENGINE_SNAPSHOT_FORMAT_VERSION {
            return Err(StateError::InvalidOperation {
                message: format!(
                    "unsupported snapshot format version {} (expected {})",
                    self.version, ENGINE_SNAPSHOT_FORMAT_VERSION
                ),
            });
        }
        let actual = compute_checksum(&self.snapshot)?;
        if actual != self.checksum {
            return Err(StateError::ChecksumMismatch {
                expected: self.checksum.clone(),
                actual,
            });
        }
        Ok(())
    }

    /// Validates the package, then consumes it into its snapshot.
    pub fn into_snapshot(self) -> Result<EngineSnapshot, StateError> {
        self.validate()?;
        Ok(self.snapshot)
    }
}

fn compute_checksum(snapshot: &EngineSnapshot) -> Result<String, StateError> {
    let bytes = serde_json::to_vec(snapshot).map_err(|e| StateError::SerializationError { message: e.to_string() })?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{OrderStatus, Side, SessionHandle, TimeInForce};
    use chrono::{DateTime, Utc};

    fn order(id: u64, side: Side, price: u128) -> LimitOrder {
        LimitOrder {
            order_id: id,
            side,
            price,
            total_quantity: 10,
            cumulative_quantity: 0,
            status: OrderStatus::New,
            time_in_force: TimeInForce::Gtc,
            expire_time: None,
            expire_date: None,
            short_sale_exempt_reason: None,
            client_order_id: None,
            parties: vec![],
            session: SessionHandle::new("s"),
            instrument: InstrumentDescriptor::new("X"),
            order_time: DateTime::<Utc>::from_timestamp(id as i64, 0).unwrap(),
            execution_ids: None,
        }
    }

    fn sample_snapshot() -> EngineSnapshot {
        EngineSnapshot {
            instrument: InstrumentDescriptor::new("X"),
            bids: vec![order(1, Side::Buy, 100)],
            offers: vec![order(2, Side::Sell, 101)],
            last_trade: None,
            instrument_info: InstrumentInfo::new(),
            next_order_id: 3,
            next_trade_id: 1,
        }
    }

    #[test]
    fn package_round_trips_through_json() {
        let package = EngineSnapshotPackage::new(sample_snapshot()).unwrap();
        let json = package.to_json().unwrap();
        let restored = EngineSnapshotPackage::from_json(&json).unwrap();
        let snapshot = restored.into_snapshot().unwrap();
        assert_eq!(snapshot.bids.len(), 1);
        assert_eq!(snapshot.next_order_id, 3);
    }

    #[test]
    fn tampered_payload_fails_checksum_validation() {
        let package = EngineSnapshotPackage::new(sample_snapshot()).unwrap();
        let mut tampered = package;
        tampered.snapshot.next_order_id = 999;
        assert!(matches!(
            tampered.validate(),
            Err(StateError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let mut package = EngineSnapshotPackage::new(sample_snapshot()).unwrap();
        package.version = ENGINE_SNAPSHOT_FORMAT_VERSION + 1;
        assert!(matches!(
            package.validate(),
            Err(StateError::InvalidOperation { .. })
        ));
    }
}
