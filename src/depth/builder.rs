//! Full and incremental depth update builders (spec §4.7: "Full depth
//! builder... Incremental depth builder... window correction factor").

use super::sheet::{DepthLevel, DepthSheet};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How a level changed between two folds (spec §4.7 glossary: "Added /
/// Changed / Unchanged / Removed / Invisible, derived from previous-vs-
/// current aggregated quantity at a price"). The incremental builder only
/// ever emits `Added`/`Changed`/`Removed` (never `Unchanged`, never
/// `Invisible` — spec §4.7); `Unchanged` is part of this vocabulary for
/// the full builder's conceptual model, and `Invisible` (previous and
/// current quantity both zero) describes a node `fold()` discards before
/// either builder ever sees it, so neither is constructed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelStatus {
    /// Previous quantity zero, current quantity positive.
    Added,
    /// Previous and current quantity both positive but unequal.
    Changed,
    /// Previous and current quantity positive and equal.
    Unchanged,
    /// Previous quantity positive, current quantity zero.
    Removed,
    /// Previous and current quantity both zero — the node never carried
    /// anything a subscriber could see.
    Invisible,
}

/// One reported level in an incremental update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLevelReport {
    /// The level's price.
    pub price: u128,
    /// Aggregate quantity, `0` when the status is `Removed`.
    pub quantity: u64,
    /// How this level changed since the previous build.
    pub status: LevelStatus,
}

/// A full (non-differential) depth snapshot, windowed to at most `depth`
/// levels per side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FullDepthUpdate {
    /// Visible bid levels, best first.
    pub bids: Vec<DepthLevel>,
    /// Visible offer levels, best first.
    pub offers: Vec<DepthLevel>,
}

/// Builds a full depth snapshot, truncating each side to `window` levels
/// (spec §4.7: "Full depth builder: windowed snapshot of the current
/// sheet.").
pub fn build_full_depth_update(sheet: &DepthSheet, window: Option<usize>) -> FullDepthUpdate {
    let truncate = |levels: &[DepthLevel]| -> Vec<DepthLevel> {
        match window {
            Some(n) => levels.iter().take(n).copied().collect(),
            None => levels.to_vec(),
        }
    };
    FullDepthUpdate {
        bids: truncate(&sheet.bids),
        offers: truncate(&sheet.offers),
    }
}

/// An incremental depth update: one [`DepthLevelReport`] per level that
/// changed status since the previous build, on each side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncrementalDepthUpdate {
    /// Bid-side level reports.
    pub bids: Vec<DepthLevelReport>,
    /// Offer-side level reports.
    pub offers: Vec<DepthLevelReport>,
}

impl IncrementalDepthUpdate {
    /// Whether this update carries no changes at all.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.offers.is_empty()
    }
}

/// Diffs one side with no window limit: every level is either brand new
/// (`Added`), changed quantity (`Changed`), gone from the book (`Removed`),
/// or unchanged — and unchanged levels are never reported (spec §4.7:
/// IncrementalDepthUpdate "not Unchanged, not Invisible").
fn diff_unwindowed(previous: &[DepthLevel], current: &[DepthLevel]) -> Vec<DepthLevelReport> {
    let prev_by_price: HashMap<u128, u64> = previous.iter().map(|l| (l.price, l.quantity)).collect();
    let cur_by_price: HashSet<u128> = current.iter().map(|l| l.price).collect();

    let mut reports = Vec::new();
    for level in current {
        match prev_by_price.get(&level.price) {
            Some(&prev_qty) if prev_qty == level.quantity => {}
            Some(_) => reports.push(DepthLevelReport {
                price: level.price,
                quantity: level.quantity,
                status: LevelStatus::Changed,
            }),
            None => reports.push(DepthLevelReport {
                price: level.price,
                quantity: level.quantity,
                status: LevelStatus::Added,
            }),
        }
    }
    for level in previous {
        if !cur_by_price.contains(&level.price) {
            reports.push(DepthLevelReport {
                price: level.price,
                quantity: 0,
                status: LevelStatus::Removed,
            });
        }
    }
    reports
}

/// Diffs one side under a top-`k` window (spec §4.7's "subtle invariant"):
/// inside the window, levels report their natural Added/Changed status
/// (Unchanged is dropped, never emitted); a signed `window_correction`
/// tracks net Added minus Removed produced so far, and once the in-window
/// pass is done, compensating entries are pulled from *outside* the window
/// — a `Removed` for a level the window pass didn't already account for
/// when more came in than left (a level was pushed out of view, not
/// cancelled), or an `Added` backfilled from just beyond the window when
/// fewer came in than left — until the correction nets to zero and the
/// visible set is exactly `k` again.
fn diff_windowed(previous: &[DepthLevel], current: &[DepthLevel], k: usize) -> Vec<DepthLevelReport> {
    // Classification of an in-window level is relative to what the
    // subscriber actually saw last cycle — the previously *visible* top-k
    // — not the whole previous book; a level that existed beyond the old
    // window is new to this subscriber even if its price was already
    // resting.
    let prev_visible_by_price: HashMap<u128, u64> =
        previous.iter().take(k).map(|l| (l.price, l.quantity)).collect();
    let cur_by_price: HashMap<u128, u64> = current.iter().map(|l| (l.price, l.quantity)).collect();

    let mut reports = Vec::new();
    let mut correction: i64 = 0;

    for level in current.iter().take(k) {
        match prev_visible_by_price.get(&level.price) {
            Some(&prev_qty) if prev_qty == level.quantity => {}
            Some(_) => reports.push(DepthLevelReport {
                price: level.price,
                quantity: level.quantity,
                status: LevelStatus::Changed,
            }),
            None => {
                reports.push(DepthLevelReport {
                    price: level.price,
                    quantity: level.quantity,
                    status: LevelStatus::Added,
                });
                correction += 1;
            }
        }
    }

    for level in previous.iter().take(k) {
        if !cur_by_price.contains_key(&level.price) {
            reports.push(DepthLevelReport {
                price: level.price,
                quantity: 0,
                status: LevelStatus::Removed,
            });
            correction -= 1;
        }
    }

    if correction > 0 {
        let cur_visible: HashSet<u128> = current.iter().take(k).map(|l| l.price).collect();
        for level in previous.iter().take(k) {
            if correction == 0 {
                break;
            }
            if cur_visible.contains(&level.price) || !cur_by_price.contains_key(&level.price) {
                continue;
            }
            reports.push(DepthLevelReport {
                price: level.price,
                quantity: 0,
                status: LevelStatus::Removed,
            });
            correction -= 1;
        }
    } else if correction < 0 {
        let prev_visible: HashSet<u128> = previous.iter().take(k).map(|l| l.price).collect();
        for level in current.iter().skip(k) {
            if correction == 0 {
                break;
            }
            if prev_visible.contains(&level.price) {
                continue;
            }
            reports.push(DepthLevelReport {
                price: level.price,
                quantity: level.quantity,
                status: LevelStatus::Added,
            });
            correction += 1;
        }
    }

    reports
}

fn diff_side(previous: &[DepthLevel], current: &[DepthLevel], window: Option<usize>) -> Vec<DepthLevelReport> {
    match window {
        Some(k) => diff_windowed(previous, current, k),
        None => diff_unwindowed(previous, current),
    }
}

/// Builds an incremental update by diffing `previous` against `current`,
/// windowed to `window` levels per side (spec §4.7).
pub fn build_incremental_depth_update(
    previous: &DepthSheet,
    current: &DepthSheet,
    window: Option<usize>,
) -> IncrementalDepthUpdate {
    IncrementalDepthUpdate {
        bids: diff_side(&previous.bids, &current.bids, window),
        offers: diff_side(&previous.offers, &current.offers, window),
    }
}
