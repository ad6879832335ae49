//! Prelude module that re-exports the most commonly used types and traits.
//!
//! ```rust
//! use venue_matching_core::prelude::*;
//! ```

pub use crate::book::{OrderBook, Page};
pub use crate::clock::{Clock, SystemClock};
pub use crate::config::EngineConfig;
pub use crate::engine::Engine;
pub use crate::error::LogicError;
pub use crate::events::{ClientNotification, Event, OrderBookNotification};
pub use crate::ids::{ExecutionIdGenerator, OrderIdGenerator};
pub use crate::order::{LimitOrder, MarketOrder, OrderStatus, Side, TimeInForce};
pub use crate::party::{OwnerHash, Party, PartyRole};
pub use crate::phase::{PhaseHandler, TradingPhase, TradingStatus};
pub use crate::request::RequestError;
pub use crate::state::EngineSnapshot;
pub use crate::subscription::{Subscription, SubscriptionManager};
pub use crate::validator::{Conclusion, Validator};
