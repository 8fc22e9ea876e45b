//! Output-stage filtering and summary metrics.
//!
//! Everything here runs after matching over the full history, so a position
//! opened before the requested range and closed inside it keeps its true
//! cost basis.

use super::{
    BehaviorSummary, ClosedTrade, LedgerError, Lot, OpenPosition, OrphanedClose, TagSummary,
};
use crate::config::PnlMode;
use crate::domain::{
    AccountId, Decimal, InstrumentId, InstrumentKind, PositionKey, Symbol, TimeMs, TradeId,
};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inclusive UTC date range; a missing bound is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateRange { start, end }
    }

    pub fn contains(&self, time: TimeMs) -> bool {
        let Some(date) = time.utc_date() else {
            return false;
        };
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }

    pub fn on_or_before_end(&self, time: TimeMs) -> bool {
        match (self.end, time.utc_date()) {
            (None, _) => true,
            (Some(end), Some(date)) => date <= end,
            (Some(_), None) => false,
        }
    }
}

/// The caller's view restrictions, applied after matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputFilter {
    pub range: DateRange,
    pub account_id: Option<AccountId>,
    pub asset_type: Option<InstrumentKind>,
}

impl OutputFilter {
    pub fn includes_key(&self, key: &PositionKey) -> bool {
        self.account_id
            .as_ref()
            .map_or(true, |a| a.as_str().trim() == key.account_id.as_str())
            && self.asset_type.map_or(true, |k| k == key.kind())
    }

    pub fn includes_closed(&self, trade: &ClosedTrade) -> bool {
        self.includes_key(&trade.position_key) && self.range.contains(trade.closed_at)
    }

    pub fn includes_orphan(&self, orphan: &OrphanedClose) -> bool {
        self.includes_key(&orphan.position_key) && self.range.contains(orphan.closed_at)
    }

    pub fn includes_lot(&self, lot: &Lot) -> bool {
        self.range.on_or_before_end(lot.opened_at)
    }
}

/// Coalesce a key's residual lots into one open position.
///
/// Lots opened after the range end are dropped; `Ok(None)` if nothing remains.
///
/// # Errors
/// `InvalidTrade` naming the first lot when cost or unrealized P&L is out of
/// range.
pub fn build_open_position(
    key: &PositionKey,
    multiplier: Decimal,
    lots: &[Lot],
    filter: &OutputFilter,
    marks: &BTreeMap<InstrumentId, Decimal>,
) -> Result<Option<OpenPosition>, LedgerError> {
    if !filter.includes_key(key) {
        return Ok(None);
    }
    let lots: Vec<Lot> = lots.iter().filter(|l| filter.includes_lot(l)).cloned().collect();
    let Some(first) = lots.first() else {
        return Ok(None);
    };
    let side = first.side;
    let out_of_range = || LedgerError::InvalidTrade {
        trade_id: first.source_trade_id.clone(),
        reason: "amount out of range".to_string(),
    };

    let quantity = Decimal::checked_sum(lots.iter().map(|l| l.remaining_quantity))
        .ok_or_else(out_of_range)?;
    let cost = Decimal::checked_sum(lots.iter().map(|l| l.remaining_cost))
        .ok_or_else(out_of_range)?;
    let opened_at = lots.iter().map(|l| l.opened_at).min().unwrap_or(first.opened_at);
    let average_price = cost.checked_div(quantity).unwrap_or_default();
    let cost_basis = cost.checked_mul(multiplier).ok_or_else(out_of_range)?;

    // (mark × qty − cost) × multiplier, signed by side
    let mark_price = marks.get(&key.instrument).copied();
    let unrealized_pnl = match mark_price {
        Some(mark) => {
            let sign = Decimal::from(i64::from(side.sign()));
            let pnl = mark
                .checked_mul(quantity)
                .and_then(|value| value.checked_sub(cost))
                .and_then(|gain| gain.checked_mul(multiplier))
                .and_then(|gain| gain.checked_mul(sign))
                .ok_or_else(out_of_range)?;
            Some(pnl)
        }
        None => None,
    };

    Ok(Some(OpenPosition {
        position_key: key.clone(),
        symbol: key.symbol().clone(),
        account_id: key.account_id.clone(),
        instrument_kind: key.kind(),
        side,
        quantity,
        average_price,
        cost_basis,
        opened_at,
        contract_multiplier: multiplier,
        lots,
        mark_price,
        unrealized_pnl,
        tags: Vec::new(),
    }))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolSummary {
    pub symbol: Symbol,
    pub total_pnl: Decimal,
    pub trade_count: u64,
    pub win_count: u64,
    pub loss_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodPnl {
    /// `YYYY-MM` for monthly buckets, `Mon`..`Sun` for weekdays.
    pub period: String,
    pub pnl: Decimal,
    pub trade_count: u64,
}

/// One step of the cumulative P&L curve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityPoint {
    pub time_ms: TimeMs,
    pub trade_id: TradeId,
    pub pnl: Decimal,
    pub cumulative_pnl: Decimal,
    /// Distance below the running peak (peak starts at zero).
    pub drawdown: Decimal,
}

/// Summary metrics over the filtered closed trades.
///
/// Loss figures (`grossLoss`, `averageLoss`, `largestLoss`) are negative.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateMetrics {
    pub pnl_mode: PnlMode,
    pub total_pnl: Decimal,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub total_fees: Decimal,
    pub trade_count: u64,
    pub win_count: u64,
    pub loss_count: u64,
    pub breakeven_count: u64,
    /// Percent of all closed trades; `null` with no trades.
    pub win_rate: Option<Decimal>,
    pub average_win: Decimal,
    pub average_loss: Decimal,
    pub average_win_pct: Option<Decimal>,
    pub average_loss_pct: Option<Decimal>,
    pub largest_win: Decimal,
    pub largest_loss: Decimal,
    /// `grossProfit / |grossLoss|`; `null` when there is no loss.
    pub profit_factor: Option<Decimal>,
    pub max_win_streak: u32,
    pub max_loss_streak: u32,
    /// Positive for a running win streak, negative for losses.
    pub current_streak: i64,
    pub by_symbol: Vec<SymbolSummary>,
    pub monthly: Vec<PeriodPnl>,
    pub day_of_week: Vec<PeriodPnl>,
    pub equity_curve: Vec<EquityPoint>,
    pub max_drawdown: Decimal,
    pub open_position_count: u64,
    pub open_cost_basis: Decimal,
    pub unrealized_pnl: Option<Decimal>,
    pub orphaned_close_count: u64,
    pub by_tag: Vec<TagSummary>,
    pub behavior: BehaviorSummary,
}

const PCT_DP: u32 = 4;

/// Compute metrics over already-filtered outputs.
pub fn compute_metrics(
    closed: &[ClosedTrade],
    open: &[OpenPosition],
    orphans: &[OrphanedClose],
    mode: PnlMode,
) -> AggregateMetrics {
    let mut ordered: Vec<&ClosedTrade> = closed.iter().collect();
    ordered.sort_by_key(|t| (t.closed_at, t.seq));

    let mut m = AggregateMetrics {
        pnl_mode: mode,
        trade_count: closed.len() as u64,
        orphaned_close_count: orphans.len() as u64,
        ..Default::default()
    };

    let mut win_pcts = Vec::new();
    let mut loss_pcts = Vec::new();
    for trade in &ordered {
        let pnl = trade.pnl(mode);
        m.total_pnl += pnl;
        m.total_fees += trade.fees;
        if pnl.is_positive() {
            m.win_count += 1;
            m.gross_profit += pnl;
            m.largest_win = m.largest_win.max(pnl);
            win_pcts.extend(trade.return_pct_for(mode));
        } else if pnl.is_negative() {
            m.loss_count += 1;
            m.gross_loss += pnl;
            m.largest_loss = m.largest_loss.min(pnl);
            loss_pcts.extend(trade.return_pct_for(mode));
        } else {
            m.breakeven_count += 1;
        }
    }

    m.win_rate = Decimal::from(m.win_count as i64)
        .percent_of(Decimal::from(m.trade_count as i64))
        .map(|r| r.round_dp(PCT_DP));
    m.average_win = mean(m.gross_profit, m.win_count).unwrap_or_default();
    m.average_loss = mean(m.gross_loss, m.loss_count).unwrap_or_default();
    m.average_win_pct = mean_pct(&win_pcts);
    m.average_loss_pct = mean_pct(&loss_pcts);
    m.profit_factor = m.gross_profit.checked_div(m.gross_loss.abs());

    apply_streaks(&mut m, &ordered, mode);
    m.by_symbol = by_symbol(&ordered, mode);
    m.monthly = monthly(&ordered, mode);
    m.day_of_week = day_of_week(&ordered, mode);
    m.equity_curve = equity_curve(&ordered, mode);
    m.max_drawdown = m
        .equity_curve
        .iter()
        .map(|p| p.drawdown)
        .max()
        .unwrap_or_default();

    m.open_position_count = open.len() as u64;
    m.open_cost_basis = open.iter().map(|p| p.cost_basis).sum();
    let marked: Vec<Decimal> = open.iter().filter_map(|p| p.unrealized_pnl).collect();
    if !marked.is_empty() {
        m.unrealized_pnl = Some(marked.iter().sum());
    }

    m
}

fn mean(total: Decimal, count: u64) -> Option<Decimal> {
    total.checked_div(Decimal::from(count as i64))
}

/// Percentages are unbounded by the report budget, so their sum is checked.
fn mean_pct(pcts: &[Decimal]) -> Option<Decimal> {
    let total = Decimal::checked_sum(pcts.iter().copied())?;
    mean(total, pcts.len() as u64).map(|r| r.round_dp(PCT_DP))
}

fn apply_streaks(m: &mut AggregateMetrics, ordered: &[&ClosedTrade], mode: PnlMode) {
    let mut current: i64 = 0;
    for trade in ordered {
        let pnl = trade.pnl(mode);
        current = if pnl.is_positive() {
            current.max(0) + 1
        } else if pnl.is_negative() {
            current.min(0) - 1
        } else {
            0
        };
        if current > 0 {
            m.max_win_streak = m.max_win_streak.max(current as u32);
        } else if current < 0 {
            m.max_loss_streak = m.max_loss_streak.max(current.unsigned_abs() as u32);
        }
    }
    m.current_streak = current;
}

fn by_symbol(ordered: &[&ClosedTrade], mode: PnlMode) -> Vec<SymbolSummary> {
    let mut rollup: BTreeMap<&Symbol, SymbolSummary> = BTreeMap::new();
    for trade in ordered {
        let pnl = trade.pnl(mode);
        let entry = rollup.entry(&trade.symbol).or_insert_with(|| SymbolSummary {
            symbol: trade.symbol.clone(),
            total_pnl: Decimal::zero(),
            trade_count: 0,
            win_count: 0,
            loss_count: 0,
        });
        entry.total_pnl += pnl;
        entry.trade_count += 1;
        if pnl.is_positive() {
            entry.win_count += 1;
        } else if pnl.is_negative() {
            entry.loss_count += 1;
        }
    }
    rollup.into_values().collect()
}

fn monthly(ordered: &[&ClosedTrade], mode: PnlMode) -> Vec<PeriodPnl> {
    let mut buckets: BTreeMap<String, (Decimal, u64)> = BTreeMap::new();
    for trade in ordered {
        let Some(closed_at) = trade.closed_at.to_utc() else {
            continue;
        };
        let bucket = buckets
            .entry(closed_at.format("%Y-%m").to_string())
            .or_default();
        bucket.0 += trade.pnl(mode);
        bucket.1 += 1;
    }
    buckets
        .into_iter()
        .map(|(period, (pnl, trade_count))| PeriodPnl {
            period,
            pnl,
            trade_count,
        })
        .collect()
}

/// Always seven buckets, Monday first.
fn day_of_week(ordered: &[&ClosedTrade], mode: PnlMode) -> Vec<PeriodPnl> {
    let mut days = [(Decimal::zero(), 0u64); 7];
    for trade in ordered {
        let Some(closed_at) = trade.closed_at.to_utc() else {
            continue;
        };
        let slot = &mut days[closed_at.weekday().num_days_from_monday() as usize];
        slot.0 += trade.pnl(mode);
        slot.1 += 1;
    }

    let mut weekday = Weekday::Mon;
    let mut out = Vec::with_capacity(7);
    for (pnl, trade_count) in days {
        out.push(PeriodPnl {
            period: weekday.to_string(),
            pnl,
            trade_count,
        });
        weekday = weekday.succ();
    }
    out
}

fn equity_curve(ordered: &[&ClosedTrade], mode: PnlMode) -> Vec<EquityPoint> {
    let mut cumulative = Decimal::zero();
    let mut peak = Decimal::zero();
    ordered
        .iter()
        .map(|trade| {
            let pnl = trade.pnl(mode);
            cumulative += pnl;
            peak = peak.max(cumulative);
            EquityPoint {
                time_ms: trade.closed_at,
                trade_id: trade.closing_trade_id.clone(),
                pnl,
                cumulative_pnl: cumulative,
                drawdown: peak - cumulative,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Side, TradeId};
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn closed(
        id: &str,
        symbol: &str,
        pnl: &str,
        cost: &str,
        closed_at: NaiveDate,
        seq: usize,
    ) -> ClosedTrade {
        let key = PositionKey::new(&AccountId::new("acct-1"), &InstrumentId::equity(symbol));
        ClosedTrade {
            symbol: key.symbol().clone(),
            account_id: key.account_id.clone(),
            instrument_kind: key.kind(),
            position_key: key,
            side: Side::Long,
            quantity: d("1"),
            entry_price: d(cost),
            exit_price: d(cost) + d(pnl),
            opened_at: TimeMs::new(0),
            closed_at: TimeMs::start_of_day(closed_at),
            realized_pnl: d(pnl),
            fees: d("1"),
            net_pnl: d(pnl) - d("1"),
            cost_basis: d(cost),
            return_pct: d(pnl).percent_of(d(cost)),
            contract_multiplier: d("1"),
            closing_trade_id: TradeId::new(id),
            opening_trade_ids: vec![],
            tags: vec![],
            seq,
        }
    }

    #[test]
    fn test_date_range_inclusive_bounds() {
        let range = DateRange::new(Some(date(2024, 5, 1)), Some(date(2024, 6, 30)));
        assert!(range.contains(TimeMs::start_of_day(date(2024, 5, 1))));
        assert!(range.contains(TimeMs::start_of_day(date(2024, 6, 30))));
        assert!(!range.contains(TimeMs::start_of_day(date(2024, 7, 1))));
        assert!(!range.contains(TimeMs::start_of_day(date(2024, 4, 30))));
        assert!(range.on_or_before_end(TimeMs::start_of_day(date(2023, 1, 1))));
        assert!(!range.on_or_before_end(TimeMs::start_of_day(date(2024, 7, 1))));
        assert!(DateRange::default().contains(TimeMs::new(0)));
    }

    #[test]
    fn test_basic_metrics() {
        let trades = vec![
            closed("A", "AAPL", "100", "1000", date(2024, 1, 2), 0),
            closed("B", "AAPL", "-50", "500", date(2024, 1, 3), 1),
            closed("C", "MSFT", "200", "1000", date(2024, 2, 5), 2),
            closed("D", "MSFT", "0", "100", date(2024, 2, 6), 3),
        ];
        let m = compute_metrics(&trades, &[], &[], PnlMode::Gross);

        assert_eq!(m.total_pnl, d("250"));
        assert_eq!(m.gross_profit, d("300"));
        assert_eq!(m.gross_loss, d("-50"));
        assert_eq!(m.win_count, 2);
        assert_eq!(m.loss_count, 1);
        assert_eq!(m.breakeven_count, 1);
        assert_eq!(m.win_rate, Some(d("50")));
        assert_eq!(m.average_win, d("150"));
        assert_eq!(m.average_loss, d("-50"));
        assert_eq!(m.average_win_pct, Some(d("15")));
        assert_eq!(m.average_loss_pct, Some(d("-10")));
        assert_eq!(m.largest_win, d("200"));
        assert_eq!(m.largest_loss, d("-50"));
        assert_eq!(m.profit_factor, Some(d("6")));
    }

    #[test]
    fn test_profit_factor_null_without_losses() {
        let trades = vec![closed("A", "AAPL", "100", "1000", date(2024, 1, 2), 0)];
        let m = compute_metrics(&trades, &[], &[], PnlMode::Gross);
        assert_eq!(m.profit_factor, None);
    }

    #[test]
    fn test_empty_input_metrics() {
        let m = compute_metrics(&[], &[], &[], PnlMode::Gross);
        assert_eq!(m.trade_count, 0);
        assert_eq!(m.win_rate, None);
        assert_eq!(m.profit_factor, None);
        assert_eq!(m.max_drawdown, Decimal::zero());
        assert_eq!(m.day_of_week.len(), 7);
    }

    #[test]
    fn test_net_mode_uses_fees() {
        let trades = vec![closed("A", "AAPL", "100", "1000", date(2024, 1, 2), 0)];
        let m = compute_metrics(&trades, &[], &[], PnlMode::Net);
        assert_eq!(m.total_pnl, d("99"));
        assert_eq!(m.total_fees, d("1"));
    }

    #[test]
    fn test_streaks() {
        let trades = vec![
            closed("A", "X", "1", "10", date(2024, 1, 1), 0),
            closed("B", "X", "1", "10", date(2024, 1, 2), 1),
            closed("C", "X", "1", "10", date(2024, 1, 3), 2),
            closed("D", "X", "-1", "10", date(2024, 1, 4), 3),
            closed("E", "X", "-1", "10", date(2024, 1, 5), 4),
        ];
        let m = compute_metrics(&trades, &[], &[], PnlMode::Gross);
        assert_eq!(m.max_win_streak, 3);
        assert_eq!(m.max_loss_streak, 2);
        assert_eq!(m.current_streak, -2);
    }

    #[test]
    fn test_equity_curve_and_drawdown() {
        let trades = vec![
            closed("C", "X", "-300", "1000", date(2024, 1, 3), 2),
            closed("A", "X", "500", "1000", date(2024, 1, 1), 0),
            closed("B", "X", "-200", "1000", date(2024, 1, 2), 1),
            closed("D", "X", "400", "1000", date(2024, 1, 4), 3),
        ];
        let m = compute_metrics(&trades, &[], &[], PnlMode::Gross);
        let cumulative: Vec<_> = m.equity_curve.iter().map(|p| p.cumulative_pnl).collect();
        assert_eq!(cumulative, vec![d("500"), d("300"), d("0"), d("400")]);
        assert_eq!(m.equity_curve[2].drawdown, d("500"));
        assert_eq!(m.max_drawdown, d("500"));
        assert_eq!(m.equity_curve[3].drawdown, d("100"));
    }

    #[test]
    fn test_monthly_weekday_and_symbol_buckets() {
        // 2024-01-01 is a Monday, 2024-02-06 a Tuesday.
        let trades = vec![
            closed("A", "AAPL", "100", "1000", date(2024, 1, 1), 0),
            closed("B", "MSFT", "-40", "1000", date(2024, 1, 1), 1),
            closed("C", "AAPL", "10", "1000", date(2024, 2, 6), 2),
        ];
        let m = compute_metrics(&trades, &[], &[], PnlMode::Gross);

        assert_eq!(m.monthly.len(), 2);
        assert_eq!(m.monthly[0].period, "2024-01");
        assert_eq!(m.monthly[0].pnl, d("60"));
        assert_eq!(m.monthly[1].period, "2024-02");

        assert_eq!(m.day_of_week[0].period, "Mon");
        assert_eq!(m.day_of_week[0].trade_count, 2);
        assert_eq!(m.day_of_week[1].period, "Tue");
        assert_eq!(m.day_of_week[1].pnl, d("10"));
        assert_eq!(m.day_of_week[6].period, "Sun");

        assert_eq!(m.by_symbol.len(), 2);
        assert_eq!(m.by_symbol[0].symbol.as_str(), "AAPL");
        assert_eq!(m.by_symbol[0].total_pnl, d("110"));
        assert_eq!(m.by_symbol[0].win_count, 2);
        assert_eq!(m.by_symbol[1].loss_count, 1);
    }

    #[test]
    fn test_open_position_filters_lots_after_range_end() {
        let key = PositionKey::new(&AccountId::new("acct-1"), &InstrumentId::equity("AAPL"));
        let lot = |id: &str, day: NaiveDate, qty: &str, px: &str| {
            let opened_at = TimeMs::start_of_day(day);
            Lot::open(TradeId::new(id), opened_at, Side::Long, d(qty), d(px), Decimal::zero())
                .unwrap()
        };
        let lots = vec![
            lot("A", date(2024, 1, 1), "10", "10"),
            lot("B", date(2024, 2, 1), "30", "20"),
            lot("C", date(2024, 8, 1), "5", "30"),
        ];
        let filter = OutputFilter {
            range: DateRange::new(None, Some(date(2024, 6, 30))),
            ..Default::default()
        };
        let marks = BTreeMap::from([(key.instrument.clone(), d("25"))]);

        let pos = build_open_position(&key, d("1"), &lots, &filter, &marks)
            .unwrap()
            .unwrap();
        assert_eq!(pos.lots.len(), 2);
        assert_eq!(pos.quantity, d("40"));
        assert_eq!(pos.average_price, d("17.5"));
        assert_eq!(pos.cost_basis, d("700"));
        assert_eq!(pos.opened_at, TimeMs::start_of_day(date(2024, 1, 1)));
        // (25-10)*10 + (25-20)*30
        assert_eq!(pos.unrealized_pnl, Some(d("300")));

        let early = OutputFilter {
            range: DateRange::new(None, Some(date(2023, 12, 31))),
            ..Default::default()
        };
        assert!(build_open_position(&key, d("1"), &lots, &early, &marks)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_open_position_short_unrealized_and_overflow() {
        let key = PositionKey::new(&AccountId::new("acct-1"), &InstrumentId::equity("AAPL"));
        let short = Lot::open(
            TradeId::new("S"),
            TimeMs::new(0),
            Side::Short,
            d("10"),
            d("50"),
            Decimal::zero(),
        )
        .unwrap();
        let marks = BTreeMap::from([(key.instrument.clone(), d("40"))]);
        let filter = OutputFilter::default();
        let pos = build_open_position(&key, d("100"), &[short.clone()], &filter, &marks)
            .unwrap()
            .unwrap();
        assert_eq!(pos.cost_basis, d("50000"));
        assert_eq!(pos.unrealized_pnl, Some(d("10000")));

        let huge_mark = d("1000000000000000000000000000");
        let marks = BTreeMap::from([(key.instrument.clone(), huge_mark)]);
        match build_open_position(&key, d("100"), &[short], &filter, &marks) {
            Err(LedgerError::InvalidTrade { trade_id, .. }) => assert_eq!(trade_id.as_str(), "S"),
            other => panic!("expected InvalidTrade, got {:?}", other),
        }
    }

    #[test]
    fn test_output_filter_account_and_asset_type() {
        let stock = PositionKey::new(&AccountId::new("acct-1"), &InstrumentId::equity("AAPL"));
        let filter = OutputFilter {
            account_id: Some(AccountId::new("acct-2")),
            ..Default::default()
        };
        assert!(!filter.includes_key(&stock));

        let filter = OutputFilter {
            asset_type: Some(InstrumentKind::Option),
            ..Default::default()
        };
        assert!(!filter.includes_key(&stock));
        assert!(OutputFilter::default().includes_key(&stock));

        let padded = OutputFilter {
            account_id: Some(AccountId::new(" acct-1 ")),
            ..Default::default()
        };
        assert!(padded.includes_key(&stock));
    }
}
