use crate::domain::{Decimal, InstrumentKind, PositionKey, TimeMs, TradeId};
use thiserror::Error;

/// Errors that abort matching for a single position key.
///
/// Contract errors name the offending trade. Structural errors mean the
/// matcher reached a state its own rules should make impossible.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("trade {trade_id}: {reason}")]
    InvalidTrade { trade_id: TradeId, reason: String },
    #[error("trade {trade_id}: contract multiplier {multiplier} is not valid for {kind:?}")]
    MalformedMultiplier {
        trade_id: TradeId,
        multiplier: Decimal,
        kind: InstrumentKind,
    },
    #[error("trade {trade_id}: timestamp {} is out of range", .time_ms.as_ms())]
    InvalidTimestamp { trade_id: TradeId, time_ms: TimeMs },
    #[error("trade {trade_id}: SPLIT record has no usable ratio")]
    MissingSplitRatio { trade_id: TradeId },
    #[error("trade {trade_id}: multiplier {found} differs from {expected} for {position_key}")]
    MultiplierMismatch {
        trade_id: TradeId,
        position_key: PositionKey,
        expected: Decimal,
        found: Decimal,
    },
    #[error("position {position_key}: trade {trade_id} found long and short lots in one queue")]
    MixedSideQueue {
        position_key: PositionKey,
        trade_id: TradeId,
    },
    #[error("position {position_key}: trade {trade_id} over-consumed lot {lot_trade_id}")]
    OverConsumedLot {
        position_key: PositionKey,
        trade_id: TradeId,
        lot_trade_id: TradeId,
    },
}

impl LedgerError {
    /// True for matcher defects, false for bad input.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            LedgerError::MixedSideQueue { .. } | LedgerError::OverConsumedLot { .. }
        )
    }

    pub fn trade_id(&self) -> &TradeId {
        match self {
            LedgerError::InvalidTrade { trade_id, .. }
            | LedgerError::MalformedMultiplier { trade_id, .. }
            | LedgerError::InvalidTimestamp { trade_id, .. }
            | LedgerError::MissingSplitRatio { trade_id }
            | LedgerError::MultiplierMismatch { trade_id, .. }
            | LedgerError::MixedSideQueue { trade_id, .. }
            | LedgerError::OverConsumedLot { trade_id, .. } => trade_id,
        }
    }
}
