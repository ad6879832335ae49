//! Engine configuration (spec §6 "Configuration (enumerated)").

use serde::{Deserialize, Serialize};

/// Static, read-only-after-setup configuration for one engine instance.
///
/// Mirrors the reference crate's per-book builder fields
/// (`OrderBook::with_tick_size`, `with_lot_size`, min/max order size)
/// collapsed into a single struct, plus the streaming/STP-shaped boolean
/// switches this spec calls for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum price increment. `None` disables tick validation.
    pub price_tick: Option<u128>,
    /// Minimum quantity increment. `None` disables tick validation.
    pub quantity_tick: Option<u64>,
    /// Minimum order quantity. `None` means only the implicit "qty > 0"
    /// rule applies.
    pub min_quantity: Option<u64>,
    /// Maximum order quantity. `None` disables the maximum check.
    pub max_quantity: Option<u64>,
    /// Whether Day orders belonging to a disconnecting session are
    /// eliminated automatically (spec §4.5 "OnDisconnectElimination").
    pub enable_cancel_on_disconnect: bool,
    /// Whether trade streaming is offered to subscribers at all; a
    /// subscription requesting the `trade` data type when this is `false`
    /// is rejected (spec §4.10).
    pub enable_trades_streaming: bool,
    /// Whether trade market-data entries carry a volume field.
    pub report_trade_volume: bool,
    /// Whether trade market-data entries carry party information.
    pub report_trade_parties: bool,
    /// Whether trade market-data entries carry the aggressor side.
    pub report_trade_aggressor_side: bool,
    /// Whether the depth cache supports the owner-exclusion partial view
    /// (spec §4.7 "Owner-exclusion mode").
    pub support_market_data_orders_exclusion: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            price_tick: None,
            quantity_tick: None,
            min_quantity: None,
            max_quantity: None,
            enable_cancel_on_disconnect: false,
            enable_trades_streaming: true,
            report_trade_volume: true,
            report_trade_parties: false,
            report_trade_aggressor_side: true,
            support_market_data_orders_exclusion: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_price_or_quantity_limits() {
        let cfg = EngineConfig::default();
        assert!(cfg.price_tick.is_none());
        assert!(cfg.quantity_tick.is_none());
        assert!(cfg.min_quantity.is_none());
        assert!(cfg.max_quantity.is_none());
    }

    #[test]
    fn default_config_enables_trade_streaming_but_not_party_reporting() {
        let cfg = EngineConfig::default();
        assert!(cfg.enable_trades_streaming);
        assert!(!cfg.report_trade_parties);
    }
}
