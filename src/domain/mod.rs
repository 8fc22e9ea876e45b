//! Domain types and determinism layer for the trade ledger.
//!
//! This module provides:
//! - Lossless numeric handling via the Decimal wrapper
//! - Domain primitives: TimeMs, TradeId, AccountId, Symbol, Side
//! - Instrument identity and the canonical PositionKey
//! - Trade records, tag metadata and the stable ordering key

pub mod decimal;
pub mod ordering;
pub mod position_key;
pub mod primitives;
pub mod tag;
pub mod trade;

pub use decimal::Decimal;
pub use ordering::{sort_trades_deterministic, SequencedTrade, TradeOrderingKey};
pub use position_key::{InstrumentId, PositionKey};
pub use primitives::{AccountId, InstrumentKind, OptionRight, Side, Symbol, TagId, TimeMs, TradeId};
pub use tag::{TagCategory, TagDefinition, TagMeta};
pub use trade::{SplitRatio, Trade, TradeAction};
