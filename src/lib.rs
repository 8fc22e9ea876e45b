pub mod api;
pub mod compile;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;

pub use compile::{match_and_aggregate, AnalyticsFilter, LedgerReport};
pub use config::{Config, PnlMode};
pub use domain::{
    AccountId, Decimal, InstrumentId, InstrumentKind, PositionKey, Side, TimeMs, Trade,
    TradeAction, TradeId,
};
pub use engine::{ClosedTrade, LedgerError, OpenPosition, OrphanedClose};
pub use error::AppError;
