//! Request validation (spec §4.1 "Validator").

use crate::config::EngineConfig;
use crate::phase::{PhaseHandler, TradingPhase};
use chrono::{DateTime, NaiveDate, Utc};

/// The outcome of a validation chain: success, or failure with a
/// human-readable reason surfaced as a reject message (spec §4.1:
/// "Errors are surfaced as reject messages, not as fatal exceptions.").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conclusion {
    /// All checks passed.
    Success,
    /// A check failed, with a human-readable reason.
    Failure(String),
}

impl Conclusion {
    /// `true` for `Success`.
    pub fn is_success(&self) -> bool {
        matches!(self, Conclusion::Success)
    }

    /// The failure reason, if this is a `Failure`.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Conclusion::Success => None,
            Conclusion::Failure(reason) => Some(reason),
        }
    }
}

/// Runs the short-circuiting checker chain from spec §4.1 against a
/// configured [`EngineConfig`].
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    config: &'a EngineConfig,
}

impl<'a> Validator<'a> {
    /// Builds a validator against the given configuration.
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Validates a price against the configured tick, when one is set.
    /// A tick of zero or negative is itself a violation once a tick is
    /// configured at all.
    pub fn validate_price(&self, price: u128) -> Conclusion {
        match self.config.price_tick {
            None => Conclusion::Success,
            Some(tick) if tick == 0 => {
                Conclusion::Failure("configured price tick is non-positive".to_string())
            }
            Some(tick) => {
                if price == 0 {
                    return Conclusion::Failure("price must be a positive multiple of the tick".to_string());
                }
                if price % tick == 0 {
                    Conclusion::Success
                } else {
                    Conclusion::Failure(format!("price {price} is not a multiple of tick {tick}"))
                }
            }
        }
    }

    /// Validates a quantity: tick, minimum (the implicit `qty > 0` rule
    /// applies even with no minimum configured), and maximum.
    pub fn validate_quantity(&self, quantity: u64) -> Conclusion {
        if quantity == 0 {
            return Conclusion::Failure("quantity must be greater than zero".to_string());
        }
        if let Some(tick) = self.config.quantity_tick {
            if tick == 0 || quantity % tick != 0 {
                return Conclusion::Failure(format!(
                    "quantity {quantity} is not a multiple of quantity tick {tick}"
                ));
            }
        }
        if let Some(min) = self.config.min_quantity {
            if quantity < min {
                return Conclusion::Failure(format!("quantity {quantity} is below minimum {min}"));
            }
        }
        if let Some(max) = self.config.max_quantity {
            if quantity > max {
                return Conclusion::Failure(format!("quantity {quantity} exceeds maximum {max}"));
            }
        }
        Conclusion::Success
    }

    /// Validates an instrument-info recovery pair: both prices respect
    /// tick, and `low <= high`.
    pub fn validate_info_recovery(&self, low: u128, high: u128) -> Conclusion {
        if let Conclusion::Failure(reason) = self.validate_price(low) {
            return Conclusion::Failure(format!("low price invalid: {reason}"));
        }
        if let Conclusion::Failure(reason) = self.validate_price(high) {
            return Conclusion::Failure(format!("high price invalid: {reason}"));
        }
        if low > high {
            return Conclusion::Failure(format!("low price {low} exceeds high price {high}"));
        }
        Conclusion::Success
    }

    /// Validates that an order's expire-time/expire-date is consistent
    /// with the current phase, for orders arriving through recovery
    /// (spec §4.1, §4.4 "Recover limit order"): a Day order cannot be
    /// recovered into a Closed phase.
    pub fn validate_recovery_phase_consistency(
        &self,
        time_in_force: crate::order::TimeInForce,
        phase: &PhaseHandler,
    ) -> Conclusion {
        use crate::order::TimeInForce;
        if time_in_force == TimeInForce::Day && phase.state().trading_phase == TradingPhase::Closed
        {
            return Conclusion::Failure(
                "a Day order cannot be recovered into a Closed phase".to_string(),
            );
        }
        Conclusion::Success
    }

    /// Validates a GTD order's expiry is still in the future relative to
    /// `now`/`today`, used on recovery.
    pub fn validate_gtd_not_already_expired(
        &self,
        expire_time: Option<DateTime<Utc>>,
        expire_date: Option<NaiveDate>,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Conclusion {
        if let Some(expire_time) = expire_time {
            if now >= expire_time {
                return Conclusion::Failure("GTD order's expire_time is already in the past".to_string());
            }
        }
        if let Some(expire_date) = expire_date {
            if today > expire_date {
                return Conclusion::Failure("GTD order's expire_date is already in the past".to_string());
            }
        }
        Conclusion::Success
    }
}
