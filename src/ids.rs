//! Opaque monotonic id generators (spec §6 "Venue order-id format", §9
//! "ID generators").
//!
//! Order ids are an ASCII decimal rendering of an unsigned 64-bit
//! monotonic counter allocated at accept time. Execution ids are seeded
//! from the owning order's id via a per-order sub-counter, so that
//! execution ids stay globally unique without any shared state beyond the
//! order id itself — the first execution of order `7` is `"7-1"`, the
//! second `"7-2"`, and so on.
//!
//! Rejected placements still consume an order id and an auxiliary
//! execution id (spec §9, "Open questions"): the reject path allocates an
//! order id for the rejected order and then seeds (but does not need to
//! increment further) an [`ExecutionIdGenerator`] from it to produce the
//! auxiliary execution id used on the reject message.

use std::sync::atomic::{AtomicU64, Ordering};

/// Generates unique, monotonically increasing order ids.
#[derive(Debug, Default)]
pub struct OrderIdGenerator {
    next: AtomicU64,
}

impl OrderIdGenerator {
    /// Creates a generator that will hand out `1, 2, 3, ...`.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Resumes a generator that will hand out `next, next + 1, ...`, used
    /// to restore id continuity after `recover_state` so a restored engine
    /// never reissues an id already assigned before the snapshot was taken.
    pub fn resume_from(next: u64) -> Self {
        Self {
            next: AtomicU64::new(next),
        }
    }

    /// Allocates and returns the next order id.
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// The id that would be handed out by the next call to
    /// [`OrderIdGenerator::next_id`], without consuming it. Used to
    /// capture generator continuity into an [`crate::state::EngineSnapshot`].
    pub fn peek_next(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

/// Generates execution ids for a single order, in the `"{order_id}-{n}"`
/// form.
#[derive(Debug, Clone)]
pub struct ExecutionIdGenerator {
    order_id: u64,
    next_seq: u64,
}

impl ExecutionIdGenerator {
    /// Seeds a new execution-id generator from an order id.
    pub fn seeded_from(order_id: u64) -> Self {
        Self {
            order_id,
            next_seq: 1,
        }
    }

    /// Allocates and returns the next execution id for this order, e.g.
    /// `"42-1"`, then `"42-2"`.
    pub fn next_execution_id(&mut self) -> String {
        let id = format!("{}-{}", self.order_id, self.next_seq);
        self.next_seq += 1;
        id
    }
}

/// Generates unique, monotonically increasing market-entry ids, used to
/// stamp market-data entries emitted by the depth, trade, and
/// instrument-info caches.
#[derive(Debug, Default)]
pub struct MarketEntryIdGenerator {
    next: AtomicU64,
}

impl MarketEntryIdGenerator {
    /// Creates a generator that will hand out `1, 2, 3, ...`.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Resumes a generator that will hand out `next, next + 1, ...`, used
    /// to restore id continuity after `recover_state`.
    pub fn resume_from(next: u64) -> Self {
        Self {
            next: AtomicU64::new(next),
        }
    }

    /// Allocates and returns the next market-entry id.
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// The id that would be handed out by the next call to
    /// [`MarketEntryIdGenerator::next_id`], without consuming it.
    pub fn peek_next(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}
