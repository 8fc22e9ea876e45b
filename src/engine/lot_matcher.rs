//! FIFO lot matching for a single position key.
//!
//! State per key is Flat → Long → Flat or Flat → Short → Flat, re-entered
//! any number of times. The queue never holds long and short lots at once:
//! an opening trade against an opposite-side queue closes it first and only
//! the remainder opens new lots.

use super::split::apply_split;
use super::{
    normalize, Anomaly, AnomalyKind, ClosedTrade, Effect, LedgerError, Lot, NormalizedTrade,
    OrphanedClose,
};
use crate::domain::{
    sort_trades_deterministic, Decimal, PositionKey, SequencedTrade, Side, SplitRatio, TimeMs,
    TradeId,
};
use std::collections::VecDeque;

/// Quantity bookkeeping used to check conservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuantityTotals {
    /// Quantity pushed onto the queue as new lots.
    pub opened: Decimal,
    /// Quantity consumed from lots by closing matches.
    pub closed: Decimal,
    /// Closing quantity with no lot to match.
    pub orphaned: Decimal,
    /// Net quantity added by split adjustments.
    pub split_adjustment: Decimal,
}

impl QuantityTotals {
    /// `opened + split_adjustment - closed`, which must equal the open quantity.
    pub fn expected_open(&self) -> Decimal {
        self.opened + self.split_adjustment - self.closed
    }
}

/// Everything a matcher run produced for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutput {
    pub position_key: PositionKey,
    pub multiplier: Option<Decimal>,
    pub closed: Vec<ClosedTrade>,
    pub open_lots: Vec<Lot>,
    pub orphans: Vec<OrphanedClose>,
    pub anomalies: Vec<Anomaly>,
    pub totals: QuantityTotals,
}

impl MatchOutput {
    pub fn open_quantity(&self) -> Decimal {
        self.open_lots.iter().map(|l| l.remaining_quantity).sum()
    }

    pub fn is_conserved(&self) -> bool {
        self.totals.expected_open() == self.open_quantity()
    }
}

/// Running FIFO state for one position key.
pub struct LotMatcher {
    key: PositionKey,
    queue: VecDeque<Lot>,
    multiplier: Option<Decimal>,
    totals: QuantityTotals,

    // Outputs accumulated during processing.
    closed: Vec<ClosedTrade>,
    orphans: Vec<OrphanedClose>,
    anomalies: Vec<Anomaly>,
}

/// Accumulates the lot matches of one closing trade.
struct MatchAccumulator {
    side: Side,
    quantity: Decimal,
    entry_cost: Decimal,
    realized: Decimal,
    entry_fees: Decimal,
    opened_at: Option<TimeMs>,
    opening_trade_ids: Vec<TradeId>,
}

impl LotMatcher {
    pub fn new(key: PositionKey) -> Self {
        Self {
            key,
            queue: VecDeque::new(),
            multiplier: None,
            totals: QuantityTotals::default(),
            closed: Vec::new(),
            orphans: Vec::new(),
            anomalies: Vec::new(),
        }
    }

    /// Normalize, order and match every trade of one key.
    ///
    /// # Errors
    /// Returns the first contract or structural error; the caller drops the
    /// key's partial results.
    pub fn run(
        key: PositionKey,
        mut trades: Vec<SequencedTrade<'_>>,
    ) -> Result<MatchOutput, LedgerError> {
        sort_trades_deterministic(&mut trades);
        let mut matcher = LotMatcher::new(key);
        for t in &trades {
            let normalized = normalize(t.trade, t.seq)?;
            matcher.process(&normalized)?;
        }
        Ok(matcher.into_outputs())
    }

    /// Side of the open position, `None` when flat.
    pub fn side(&self) -> Option<Side> {
        self.queue.front().map(|lot| lot.side)
    }

    /// Apply one normalized trade. Trades must arrive in ordering-key order.
    pub fn process(&mut self, n: &NormalizedTrade<'_>) -> Result<(), LedgerError> {
        if let Some(anomaly) = &n.diagnostic {
            self.anomalies.push(anomaly.clone());
        }
        if n.affects_lots() {
            self.check_multiplier(n)?;
        }

        match n.effect {
            Effect::Ignore(_) => Ok(()),
            Effect::SplitAdjust(ratio) => self.handle_split(n, ratio),
            Effect::OpenLong => self.handle_open(n, Side::Long),
            Effect::OpenShort => self.handle_open(n, Side::Short),
            Effect::CloseLong => self.handle_close(n, Side::Long),
            Effect::CloseShort => self.handle_close(n, Side::Short),
            Effect::CloseAtPosition { fallback } => {
                let side = self.side().unwrap_or(fallback);
                self.handle_close(n, side)
            }
        }
    }

    /// The multiplier is fixed by the first lot-affecting trade of the key.
    fn check_multiplier(&mut self, n: &NormalizedTrade<'_>) -> Result<(), LedgerError> {
        match self.multiplier {
            Some(expected) if expected != n.multiplier => Err(LedgerError::MultiplierMismatch {
                trade_id: n.trade.id.clone(),
                position_key: self.key.clone(),
                expected,
                found: n.multiplier,
            }),
            Some(_) => Ok(()),
            None => {
                self.multiplier = Some(n.multiplier);
                Ok(())
            }
        }
    }

    fn handle_split(
        &mut self,
        n: &NormalizedTrade<'_>,
        ratio: SplitRatio,
    ) -> Result<(), LedgerError> {
        if self.queue.is_empty() {
            self.anomalies.push(Anomaly {
                kind: AnomalyKind::SplitWithoutPosition,
                trade_id: n.trade.id.clone(),
                position_key: self.key.clone(),
                detail: format!("split {}:{} with no open lots", ratio.from, ratio.to),
            });
            return Ok(());
        }
        let adjustment = apply_split(&mut self.queue, ratio).ok_or_else(|| out_of_range(n))?;
        self.totals.split_adjustment = self
            .totals
            .split_adjustment
            .checked_add(adjustment.quantity_delta)
            .ok_or_else(|| out_of_range(n))?;
        tracing::debug!(
            position_key = %self.key,
            trade_id = %n.trade.id,
            lots = adjustment.lots_adjusted,
            ratio = %format!("{}:{}", ratio.from, ratio.to),
            "split applied to open lots"
        );
        Ok(())
    }

    /// Opening trade. Against an opposite-side queue it first closes, then
    /// opens the remainder on its own side.
    fn handle_open(&mut self, n: &NormalizedTrade<'_>, side: Side) -> Result<(), LedgerError> {
        let mut remaining = n.quantity;

        if self.side() == Some(side.opposite()) {
            let consumed = self.match_against(n, side.opposite(), remaining)?;
            remaining -= consumed;
        }

        if remaining.is_positive() {
            if self.side().is_some_and(|s| s != side) {
                return Err(LedgerError::MixedSideQueue {
                    position_key: self.key.clone(),
                    trade_id: n.trade.id.clone(),
                });
            }
            let fees = pro_rata(n.fees, remaining, n.quantity).ok_or_else(|| out_of_range(n))?;
            let lot = Lot::open(n.trade.id.clone(), n.trade.time_ms, side, remaining, n.price, fees)
                .ok_or_else(|| out_of_range(n))?;
            self.queue.push_back(lot);
            self.totals.opened = self
                .totals
                .opened
                .checked_add(remaining)
                .ok_or_else(|| out_of_range(n))?;
        }
        Ok(())
    }

    /// Closing trade for lots of `side`; any excess becomes an orphaned close.
    fn handle_close(&mut self, n: &NormalizedTrade<'_>, side: Side) -> Result<(), LedgerError> {
        let consumed = if self.side() == Some(side) {
            self.match_against(n, side, n.quantity)?
        } else {
            Decimal::zero()
        };

        let excess = n.quantity - consumed;
        if excess.is_positive() {
            self.record_orphan(n, side, excess)?;
        }
        Ok(())
    }

    /// Consume up to `qty` from the front of the queue, emitting one
    /// coalesced closed trade. Returns the quantity matched.
    fn match_against(
        &mut self,
        n: &NormalizedTrade<'_>,
        side: Side,
        qty: Decimal,
    ) -> Result<Decimal, LedgerError> {
        let multiplier = self.multiplier.unwrap_or(n.multiplier);
        let sign = Decimal::from(i64::from(side.sign()));
        let mut acc = MatchAccumulator {
            side,
            quantity: Decimal::zero(),
            entry_cost: Decimal::zero(),
            realized: Decimal::zero(),
            entry_fees: Decimal::zero(),
            opened_at: None,
            opening_trade_ids: Vec::new(),
        };
        let mut remaining = qty;

        while remaining.is_positive() {
            let Some(front) = self.queue.front_mut() else {
                break;
            };
            if front.side != side {
                return Err(LedgerError::MixedSideQueue {
                    position_key: self.key.clone(),
                    trade_id: n.trade.id.clone(),
                });
            }

            let take = remaining.min(front.remaining_quantity);
            if take > front.remaining_quantity {
                return Err(LedgerError::OverConsumedLot {
                    position_key: self.key.clone(),
                    trade_id: n.trade.id.clone(),
                    lot_trade_id: front.source_trade_id.clone(),
                });
            }
            let release = front.consume(take).ok_or_else(|| out_of_range(n))?;

            // (exit × qty − entry cost) × multiplier, signed by side
            let realized = n
                .price
                .checked_mul(take)
                .and_then(|exit| exit.checked_sub(release.cost))
                .and_then(|gain| gain.checked_mul(multiplier))
                .and_then(|gain| gain.checked_mul(sign))
                .ok_or_else(|| out_of_range(n))?;
            acc.realized = acc.realized.checked_add(realized).ok_or_else(|| out_of_range(n))?;
            acc.entry_cost = acc
                .entry_cost
                .checked_add(release.cost)
                .ok_or_else(|| out_of_range(n))?;
            acc.entry_fees = acc
                .entry_fees
                .checked_add(release.fees)
                .ok_or_else(|| out_of_range(n))?;
            acc.quantity += take;
            acc.opened_at = Some(acc.opened_at.map_or(front.opened_at, |t| t.min(front.opened_at)));
            if !acc.opening_trade_ids.contains(&front.source_trade_id) {
                acc.opening_trade_ids.push(front.source_trade_id.clone());
            }
            remaining -= take;

            if front.remaining_quantity.is_zero() {
                self.queue.pop_front();
            }
        }

        let matched = acc.quantity;
        if matched.is_positive() {
            self.totals.closed = self
                .totals
                .closed
                .checked_add(matched)
                .ok_or_else(|| out_of_range(n))?;
            self.emit_closed(n, acc, multiplier)?;
        }
        Ok(matched)
    }

    fn emit_closed(
        &mut self,
        n: &NormalizedTrade<'_>,
        acc: MatchAccumulator,
        multiplier: Decimal,
    ) -> Result<(), LedgerError> {
        let exit_fees = pro_rata(n.fees, acc.quantity, n.quantity).ok_or_else(|| out_of_range(n))?;
        let fees = acc
            .entry_fees
            .checked_add(exit_fees)
            .ok_or_else(|| out_of_range(n))?;
        let net_pnl = acc.realized.checked_sub(fees).ok_or_else(|| out_of_range(n))?;
        let entry_price = acc.entry_cost.checked_div(acc.quantity).unwrap_or_default();
        let cost_basis = acc
            .entry_cost
            .checked_mul(multiplier)
            .ok_or_else(|| out_of_range(n))?;

        self.closed.push(ClosedTrade {
            position_key: self.key.clone(),
            symbol: self.key.symbol().clone(),
            account_id: self.key.account_id.clone(),
            instrument_kind: self.key.kind(),
            side: acc.side,
            quantity: acc.quantity,
            entry_price,
            exit_price: n.price,
            opened_at: acc.opened_at.unwrap_or(n.trade.time_ms),
            closed_at: n.trade.time_ms,
            realized_pnl: acc.realized,
            fees,
            net_pnl,
            cost_basis,
            return_pct: acc.realized.percent_of(cost_basis),
            contract_multiplier: multiplier,
            closing_trade_id: n.trade.id.clone(),
            opening_trade_ids: acc.opening_trade_ids,
            tags: Vec::new(),
            seq: n.seq,
        });
        Ok(())
    }

    fn record_orphan(
        &mut self,
        n: &NormalizedTrade<'_>,
        side: Side,
        quantity: Decimal,
    ) -> Result<(), LedgerError> {
        tracing::debug!(
            position_key = %self.key,
            trade_id = %n.trade.id,
            quantity = %quantity,
            "closing quantity exceeds open lots"
        );
        self.totals.orphaned = self
            .totals
            .orphaned
            .checked_add(quantity)
            .ok_or_else(|| out_of_range(n))?;
        self.anomalies.push(Anomaly {
            kind: AnomalyKind::OrphanedClose,
            trade_id: n.trade.id.clone(),
            position_key: self.key.clone(),
            detail: format!(
                "{} {} units closed with no open {} lot",
                n.trade.action, quantity, side
            ),
        });
        self.orphans.push(OrphanedClose {
            position_key: self.key.clone(),
            symbol: self.key.symbol().clone(),
            account_id: self.key.account_id.clone(),
            instrument_kind: self.key.kind(),
            trade_id: n.trade.id.clone(),
            side,
            quantity,
            price: n.price,
            closed_at: n.trade.time_ms,
            seq: n.seq,
        });
        Ok(())
    }

    pub fn into_outputs(self) -> MatchOutput {
        MatchOutput {
            position_key: self.key,
            multiplier: self.multiplier,
            closed: self.closed,
            open_lots: self.queue.into_iter().collect(),
            orphans: self.orphans,
            anomalies: self.anomalies,
            totals: self.totals,
        }
    }
}

/// `total × part / whole`; zero when `whole` is zero, `None` on overflow.
fn pro_rata(total: Decimal, part: Decimal, whole: Decimal) -> Option<Decimal> {
    if part == whole {
        return Some(total);
    }
    Some(total.checked_mul(part)?.checked_div(whole).unwrap_or_default())
}

fn out_of_range(n: &NormalizedTrade<'_>) -> LedgerError {
    LedgerError::InvalidTrade {
        trade_id: n.trade.id.clone(),
        reason: "amount out of range".to_string(),
    }
}
