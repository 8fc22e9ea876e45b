//! Full-history compile pipeline from raw trades to a ledger report.
//!
//! This module provides:
//! - Deny-list removal and grouping of trades by position key
//! - Per-key FIFO matching with failure isolation
//! - Output-stage filtering, tag join and summary metrics
//! - A content fingerprint for idempotence checks

use crate::config::PnlMode;
use crate::domain::{
    AccountId, Decimal, InstrumentId, InstrumentKind, PositionKey, SequencedTrade, TagId, TagMeta,
    Trade, TradeId,
};
use crate::engine::aggregator::{build_open_position, compute_metrics, OutputFilter};
use crate::engine::{
    AggregateMetrics, Anomaly, ClosedTrade, DateRange, LedgerError, LotMatcher, OpenPosition,
    OrphanedClose, PositionFailure, TagJoin,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

/// Caller-side view restrictions and side inputs.
///
/// Every field defaults to "no restriction". Date bounds are inclusive UTC
/// calendar dates and are applied only after matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyticsFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub account_id: Option<AccountId>,
    pub asset_type: Option<InstrumentKind>,
    pub position_tags: BTreeMap<PositionKey, Vec<TagId>>,
    pub tag_definitions: BTreeMap<TagId, TagMeta>,
    /// Trades removed before matching (confirmed broker corruption).
    pub excluded_trade_ids: BTreeSet<TradeId>,
    pub pnl_mode: PnlMode,
    /// Mark prices for unrealized P&L on open positions.
    pub marks: BTreeMap<InstrumentId, Decimal>,
}

impl AnalyticsFilter {
    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    fn output_filter(&self) -> OutputFilter {
        OutputFilter {
            range: self.date_range(),
            account_id: self.account_id.clone(),
            asset_type: self.asset_type,
        }
    }
}

/// Outputs of one compile.
///
/// `closed_trades`, `orphaned_closes` and `open_positions` honor the date
/// range. `anomalies` cover the whole history of every key that passes the
/// account and asset-type filters, since a data problem before the range can
/// still shape the cost basis inside it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReport {
    pub closed_trades: Vec<ClosedTrade>,
    pub open_positions: Vec<OpenPosition>,
    pub orphaned_closes: Vec<OrphanedClose>,
    pub metrics: AggregateMetrics,
    pub anomalies: Vec<Anomaly>,
    pub failures: Vec<PositionFailure>,
    pub excluded_trade_count: u64,
}

impl LedgerReport {
    /// Hex SHA-256 of the JSON encoding. All collections in the report are
    /// built in a fixed order, so equal input yields an equal fingerprint.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

/// Match the full trade history and aggregate it under `filter`.
///
/// Matching always sees every non-excluded trade; the date, account and
/// asset filters only select which outputs are reported. A key whose trades
/// violate a contract is reported in `failures` and contributes nothing else.
pub fn match_and_aggregate(trades: &[Trade], filter: &AnalyticsFilter) -> LedgerReport {
    let mut report = LedgerReport::default();

    let mut by_key: BTreeMap<PositionKey, Vec<SequencedTrade<'_>>> = BTreeMap::new();
    for (seq, trade) in trades.iter().enumerate() {
        if filter.excluded_trade_ids.contains(&trade.id) {
            report.excluded_trade_count += 1;
            continue;
        }
        by_key
            .entry(trade.position_key())
            .or_default()
            .push(SequencedTrade { seq, trade });
    }

    let output = filter.output_filter();
    let key_count = by_key.len();
    // Running bound on every report-wide sum; a key that would push it out
    // of range fails instead of overflowing the metrics.
    let mut budget = Decimal::zero();
    for (key, key_trades) in by_key {
        let matched = match LotMatcher::run(key.clone(), key_trades) {
            Ok(matched) => matched,
            Err(e) => {
                report_failure(&mut report, key, &e);
                continue;
            }
        };
        if !matched.is_conserved() {
            tracing::warn!(
                position_key = %key,
                expected = %matched.totals.expected_open(),
                open = %matched.open_quantity(),
                "open quantity does not reconcile with matched totals"
            );
        }

        if !output.includes_key(&key) {
            continue;
        }
        let open = match matched.multiplier {
            Some(multiplier) => build_open_position(
                &key,
                multiplier,
                &matched.open_lots,
                &output,
                &filter.marks,
            ),
            None => Ok(None),
        };
        let open = match open {
            Ok(open) => open,
            Err(e) => {
                report_failure(&mut report, key, &e);
                continue;
            }
        };

        let closed: Vec<ClosedTrade> = matched
            .closed
            .into_iter()
            .filter(|t| output.includes_closed(t))
            .collect();
        match report_weight(&closed, open.as_ref()).and_then(|w| budget.checked_add(w)) {
            Some(total) => budget = total,
            None => {
                let trade_id = closed
                    .first()
                    .map(|t| t.closing_trade_id.clone())
                    .or_else(|| open_trade_id(open.as_ref()))
                    .unwrap_or_else(|| TradeId::new(key.to_string()));
                let e = LedgerError::InvalidTrade {
                    trade_id,
                    reason: "amount out of range".to_string(),
                };
                report_failure(&mut report, key, &e);
                continue;
            }
        }

        report.anomalies.extend(matched.anomalies);
        report.closed_trades.extend(closed);
        report
            .orphaned_closes
            .extend(matched.orphans.into_iter().filter(|o| output.includes_orphan(o)));
        report.open_positions.extend(open);
    }

    report.closed_trades.sort_by_key(|t| (t.closed_at, t.seq));
    report.orphaned_closes.sort_by_key(|o| (o.closed_at, o.seq));

    let join = TagJoin::new(&filter.position_tags, &filter.tag_definitions);
    if !join.is_empty() {
        join.attach_closed(&mut report.closed_trades);
        join.attach_open(&mut report.open_positions);
    }

    let mode = filter.pnl_mode;
    let mut metrics = compute_metrics(
        &report.closed_trades,
        &report.open_positions,
        &report.orphaned_closes,
        mode,
    );
    metrics.by_tag = join.summarize(&report.closed_trades, mode);
    metrics.behavior = join.behavior(&report.closed_trades, metrics.total_pnl, mode);
    report.metrics = metrics;

    tracing::debug!(
        trades = trades.len(),
        keys = key_count,
        failed_keys = report.failures.len(),
        closed = report.closed_trades.len(),
        open = report.open_positions.len(),
        "ledger compiled"
    );
    report
}

/// Upper bound on what one key adds to any metric sum. Doubled so running
/// differences such as drawdown (peak minus cumulative) stay in range too.
fn report_weight(closed: &[ClosedTrade], open: Option<&OpenPosition>) -> Option<Decimal> {
    let closed_terms = closed
        .iter()
        .flat_map(|t| [t.realized_pnl.abs(), t.net_pnl.abs(), t.fees, t.cost_basis]);
    let open_terms = open
        .into_iter()
        .flat_map(|p| [p.cost_basis, p.unrealized_pnl.unwrap_or_default().abs()]);
    Decimal::checked_sum(closed_terms.chain(open_terms))?.checked_mul(Decimal::from(2))
}

fn open_trade_id(open: Option<&OpenPosition>) -> Option<TradeId> {
    open.and_then(|p| p.lots.first()).map(|l| l.source_trade_id.clone())
}

fn report_failure(report: &mut LedgerReport, key: PositionKey, e: &LedgerError) {
    tracing::warn!(
        position_key = %key,
        trade_id = %e.trade_id(),
        structural = e.is_structural(),
        error = %e,
        "position key failed, skipping"
    );
    report.failures.push(PositionFailure::new(key, e));
}
