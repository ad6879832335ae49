//! Instrument price-bound tracking (spec §4.9 "Instrument-info cache"):
//! the running low/mid/high of traded prices for the instrument, with
//! New/Change/Delete tagged output for market-data subscribers and a
//! recover operation for restoring from an external value.

use serde::{Deserialize, Serialize};

/// How a field's value changed between two publish cycles (spec §4.9:
/// "tagged with their action (New if previously unset, Change
/// otherwise, Delete on nulling)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfoAction {
    /// The field had no previous value.
    New,
    /// The field had a different previous value.
    Change,
    /// The field is being cleared (a null recover took effect).
    Delete,
}

/// Which of the three tracked fields an entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfoField {
    /// Lowest traded price.
    Low,
    /// `(low + high) / 2`, only present once both bounds exist.
    Mid,
    /// Highest traded price.
    High,
}

/// One tagged field change, as emitted by [`InstrumentInfo::compose_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentInfoEntry {
    /// Which field changed.
    pub field: InfoField,
    /// The field's value. Unused for a `Delete`-tagged entry beyond
    /// identifying what was cleared; callers should not rely on it.
    pub value: u128,
    /// How the field changed this cycle.
    pub action: InfoAction,
}

/// A full, untagged snapshot of the currently known bounds (spec §4.9:
/// "Initial compose emits only present values, no action").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentInfoSnapshot {
    /// Lowest traded price seen so far, if any.
    pub low: Option<u128>,
    /// `(low + high) / 2`, if both bounds are known.
    pub mid: Option<u128>,
    /// Highest traded price seen so far, if any.
    pub high: Option<u128>,
}

/// The running low/high of traded prices for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InstrumentInfo {
    /// Lowest traded price seen so far, if any.
    pub low: Option<u128>,
    /// Highest traded price seen so far, if any.
    pub high: Option<u128>,
    /// Set by a null [`InstrumentInfo::recover`]; consumed (and the
    /// bounds cleared) the next time [`InstrumentInfo::compose_update`]
    /// runs (spec §4.9: "with null, marks all three as Delete on the
    /// next update").
    #[serde(default)]
    pending_delete: bool,
}

impl InstrumentInfo {
    /// An instrument with no recorded trades yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// `(low + high) / 2`, once both bounds exist (spec §4.9: "Mid =
    /// (low+high)/2 when both exist").
    pub fn mid(&self) -> Option<u128> {
        match (self.low, self.high) {
            (Some(low), Some(high)) => Some((low + high) / 2),
            _ => None,
        }
    }

    /// An untagged snapshot of the currently known bounds, for an
    /// initial compose (e.g. a subscribe-time `MarketDataSnapshot`).
    pub fn compose_initial(&self) -> InstrumentInfoSnapshot {
        InstrumentInfoSnapshot {
            low: self.low,
            mid: self.mid(),
            high: self.high,
        }
    }

    /// Widens the bounds (or sets them, if this is the first trade) to
    /// include a newly traded price.
    pub fn record_trade_price(&mut self, price: u128) {
        self.low = Some(self.low.map_or(price, |low| low.min(price)));
        self.high = Some(self.high.map_or(price, |high| high.max(price)));
    }

    /// Applies an `InstrumentInfoRecover` event: `Some((low, high))`
    /// replaces both bounds immediately (spec §4.9: "updates low/high
    /// (and thence mid) iff different"); `None` defers clearing to the
    /// next `compose_update`, so that cycle can still report the
    /// deletion.
    pub fn recover(&mut self, value: Option<(u128, u128)>) {
        match value {
            Some((low, high)) => {
                self.low = Some(low);
                self.high = Some(high);
                self.pending_delete = false;
            }
            None => {
                self.pending_delete = true;
            }
        }
    }

    /// Diffs `self` (the current cycle's state) against `previous` (the
    /// last state a subscriber was shown), returning only the fields
    /// that changed, each tagged with how (spec §4.9 "update compose").
    /// If a null recover is pending, every currently-present field is
    /// reported `Delete` and the bounds are cleared.
    pub fn compose_update(&mut self, previous: &InstrumentInfoSnapshot) -> Vec<InstrumentInfoEntry> {
        if self.pending_delete {
            let mut entries = Vec::new();
            if let Some(low) = previous.low {
                entries.push(InstrumentInfoEntry { field: InfoField::Low, value: low, action: InfoAction::Delete });
            }
            if let Some(mid) = previous.mid {
                entries.push(InstrumentInfoEntry { field: InfoField::Mid, value: mid, action: InfoAction::Delete });
            }
            if let Some(high) = previous.high {
                entries.push(InstrumentInfoEntry { field: InfoField::High, value: high, action: InfoAction::Delete });
            }
            self.low = None;
            self.high = None;
            self.pending_delete = false;
            return entries;
        }

        let mut entries = Vec::new();
        let mid = self.mid();
        for (field, prev, cur) in [
            (InfoField::Low, previous.low, self.low),
            (InfoField::Mid, previous.mid, mid),
            (InfoField::High, previous.high, self.high),
        ] {
            match (prev, cur) {
                (None, Some(value)) => entries.push(InstrumentInfoEntry { field, value, action: InfoAction::New }),
                (Some(prev_value), Some(value)) if prev_value != value => {
                    entries.push(InstrumentInfoEntry { field, value, action: InfoAction::Change })
                }
                _ => {}
            }
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_trade_sets_both_bounds() {
        let mut info = InstrumentInfo::new();
        info.record_trade_price(100);
        assert_eq!(info.low, Some(100));
        assert_eq!(info.high, Some(100));
    }

    #[test]
    fn subsequent_trades_widen_the_bounds() {
        let mut info = InstrumentInfo::new();
        info.record_trade_price(100);
        info.record_trade_price(90);
        info.record_trade_price(110);
        assert_eq!(info.low, Some(90));
        assert_eq!(info.high, Some(110));
    }

    #[test]
    fn a_price_inside_the_bounds_does_not_change_them() {
        let mut info = InstrumentInfo::new();
        info.record_trade_price(90);
        info.record_trade_price(110);
        info.record_trade_price(100);
        assert_eq!(info.low, Some(90));
        assert_eq!(info.high, Some(110));
    }

    #[test]
    fn mid_is_unset_until_both_bounds_exist() {
        let mut info = InstrumentInfo::new();
        assert_eq!(info.mid(), None);
        info.record_trade_price(100);
        assert_eq!(info.mid(), Some(100));
        info.record_trade_price(120);
        assert_eq!(info.mid(), Some(110));
    }

    #[test]
    fn recover_with_value_seeds_both_bounds_directly() {
        let mut info = InstrumentInfo::new();
        info.recover(Some((80, 120)));
        assert_eq!(info.low, Some(80));
        assert_eq!(info.high, Some(120));
    }

    #[test]
    fn compose_update_tags_new_then_change() {
        let mut info = InstrumentInfo::new();
        let mut previous = InstrumentInfoSnapshot::default();

        info.record_trade_price(100);
        let entries = info.compose_update(&previous);
        assert_eq!(entries.len(), 3, "low, mid, and high all newly set");
        assert!(entries.iter().all(|e| e.action == InfoAction::New));
        previous = info.compose_initial();

        info.record_trade_price(90);
        let entries = info.compose_update(&previous);
        // low drops to 90 and mid recomputes; high is unchanged.
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.action == InfoAction::Change));
    }

    #[test]
    fn null_recover_reports_delete_then_clears() {
        let mut info = InstrumentInfo::new();
        info.record_trade_price(100);
        let previous = info.compose_initial();

        info.recover(None);
        let entries = info.compose_update(&previous);
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.action == InfoAction::Delete));
        assert_eq!(info.low, None);
        assert_eq!(info.high, None);
    }
}
