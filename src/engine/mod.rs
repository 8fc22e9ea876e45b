//! Pure computation engine for FIFO lot matching and P&L analytics.

use crate::config::PnlMode;
use crate::domain::{
    AccountId, Decimal, InstrumentKind, PositionKey, Side, Symbol, TagId, TimeMs, TradeId,
};
use serde::{Deserialize, Serialize};

pub mod aggregator;
pub mod error;
pub mod lot_matcher;
pub mod normalizer;
pub mod split;
pub mod tags;

pub use aggregator::{AggregateMetrics, DateRange};
pub use error::LedgerError;
pub use lot_matcher::{LotMatcher, MatchOutput, QuantityTotals};
pub use normalizer::{normalize, Effect, IgnoreReason, NormalizedTrade};
pub use tags::{BehaviorSummary, TagJoin, TagSummary};

/// An open quantity acquired by one trade, tracked until fully closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    pub source_trade_id: TradeId,
    pub opened_at: TimeMs,
    /// Per-share price, split-adjusted.
    pub price: Decimal,
    pub remaining_quantity: Decimal,
    pub original_quantity: Decimal,
    pub side: Side,
    /// Entry cost (`quantity × price`, before the multiplier) of the
    /// remaining quantity. Unchanged by splits.
    pub remaining_cost: Decimal,
    /// Entry fees not yet released to a closed trade.
    pub remaining_fees: Decimal,
}

/// Cost and fees released by consuming part of a lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LotRelease {
    pub cost: Decimal,
    pub fees: Decimal,
}

impl Lot {
    /// `None` when `quantity × price` is out of range.
    pub fn open(
        source_trade_id: TradeId,
        opened_at: TimeMs,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        fees: Decimal,
    ) -> Option<Lot> {
        Some(Lot {
            source_trade_id,
            opened_at,
            price,
            remaining_quantity: quantity,
            original_quantity: quantity,
            side,
            remaining_cost: quantity.checked_mul(price)?,
            remaining_fees: fees,
        })
    }

    /// Remove `qty` units, releasing their pro-rata share of cost and fees.
    ///
    /// Consuming the whole remainder releases everything left, so a lot's
    /// releases always add up to its entry cost exactly. `None` on overflow,
    /// with the lot untouched.
    pub(crate) fn consume(&mut self, qty: Decimal) -> Option<LotRelease> {
        if qty >= self.remaining_quantity {
            let release = LotRelease {
                cost: self.remaining_cost,
                fees: self.remaining_fees,
            };
            self.remaining_quantity = Decimal::zero();
            self.remaining_cost = Decimal::zero();
            self.remaining_fees = Decimal::zero();
            return Some(release);
        }
        let share = |total: Decimal| {
            total
                .checked_mul(qty)?
                .checked_div(self.remaining_quantity)
        };
        let release = LotRelease {
            cost: share(self.remaining_cost)?,
            fees: share(self.remaining_fees)?,
        };
        self.remaining_quantity -= qty;
        self.remaining_cost -= release.cost;
        self.remaining_fees -= release.fees;
        Some(release)
    }
}

/// Realized result of one closing trade, coalesced over every lot it consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedTrade {
    pub position_key: PositionKey,
    pub symbol: Symbol,
    pub account_id: AccountId,
    pub instrument_kind: InstrumentKind,
    pub side: Side,
    pub quantity: Decimal,
    /// Quantity-weighted average of the consumed lots.
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    /// Earliest open time among the consumed lots.
    pub opened_at: TimeMs,
    pub closed_at: TimeMs,
    pub realized_pnl: Decimal,
    pub fees: Decimal,
    pub net_pnl: Decimal,
    /// Entry notional including the contract multiplier.
    pub cost_basis: Decimal,
    /// Gross return on cost basis, in percent.
    pub return_pct: Option<Decimal>,
    pub contract_multiplier: Decimal,
    pub closing_trade_id: TradeId,
    pub opening_trade_ids: Vec<TradeId>,
    #[serde(default)]
    pub tags: Vec<TagId>,
    #[serde(skip)]
    pub(crate) seq: usize,
}

impl ClosedTrade {
    pub fn pnl(&self, mode: PnlMode) -> Decimal {
        match mode {
            PnlMode::Gross => self.realized_pnl,
            PnlMode::Net => self.net_pnl,
        }
    }

    pub fn return_pct_for(&self, mode: PnlMode) -> Option<Decimal> {
        self.pnl(mode).percent_of(self.cost_basis)
    }
}

/// Excess closing quantity with no open lot to match against.
///
/// The opening happened outside the synced history, so the entry price is
/// unknown and no P&L is realized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanedClose {
    pub position_key: PositionKey,
    pub symbol: Symbol,
    pub account_id: AccountId,
    pub instrument_kind: InstrumentKind,
    pub trade_id: TradeId,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    pub closed_at: TimeMs,
    #[serde(skip)]
    pub(crate) seq: usize,
}

/// Residual open lots for one position key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPosition {
    pub position_key: PositionKey,
    pub symbol: Symbol,
    pub account_id: AccountId,
    pub instrument_kind: InstrumentKind,
    pub side: Side,
    pub quantity: Decimal,
    pub average_price: Decimal,
    pub cost_basis: Decimal,
    pub opened_at: TimeMs,
    pub contract_multiplier: Decimal,
    pub lots: Vec<Lot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unrealized_pnl: Option<Decimal>,
    #[serde(default)]
    pub tags: Vec<TagId>,
}

/// Data-quality findings; reported, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnomalyKind {
    ZeroQuantity,
    ZeroPrice,
    NonLedgerAction,
    OrphanedClose,
    SplitWithoutPosition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub trade_id: TradeId,
    pub position_key: PositionKey,
    pub detail: String,
}

/// A position key whose computation was aborted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionFailure {
    pub position_key: PositionKey,
    pub trade_id: TradeId,
    pub structural: bool,
    pub error: String,
}

impl PositionFailure {
    pub fn new(position_key: PositionKey, err: &LedgerError) -> Self {
        PositionFailure {
            position_key,
            trade_id: err.trade_id().clone(),
            structural: err.is_structural(),
            error: err.to_string(),
        }
    }
}
