//! Order parties and the owner-hash used by the depth cache's
//! owner-exclusion filter (spec §3 "Ownership", §4.7 "Owner-exclusion
//! mode", §9 "Depth node ownership filter").
//!
//! The owner-hash is stored per depth-quantity-list component instead of
//! the party-id string itself, so the partial-quantity computation stays
//! allocation-free and independent of the party string's lifetime — the
//! same rationale the reference crate applies to its `user_id: Hash32`
//! field on `PriceLevel` components.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The role a party plays on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartyRole {
    /// The party that submitted the order.
    EnteringFirm,
    /// The clearing firm for the order.
    ClearingFirm,
    /// The beneficial owner of the resulting position.
    BeneficialOwner,
    /// The counterparty on a completed trade (populated on execution
    /// reports only, never on resting orders).
    ContraFirm,
}

/// A single party reference attached to an order (spec §3: "ordered list
/// of parties (each a triple id/source/role)").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// The party identifier, in whatever namespace `source` defines.
    pub id: String,
    /// The identifier source / namespace the id is drawn from.
    pub source: String,
    /// The role this party plays on the order.
    pub role: PartyRole,
}

impl Party {
    /// Builds a new party triple.
    pub fn new(id: impl Into<String>, source: impl Into<String>, role: PartyRole) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            role,
        }
    }
}

/// A stable, fixed-size hash of a party id string, used to test ownership
/// without retaining the string itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerHash([u8; 32]);

impl OwnerHash {
    /// Hashes a party id string into a stable [`OwnerHash`].
    ///
    /// Two calls with the same input always produce the same hash; this
    /// is a plain content hash, not a keyed/salted one, because its only
    /// use is equality comparison within a single engine instance.
    pub fn of(party_id: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(party_id.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        OwnerHash(bytes)
    }
}
