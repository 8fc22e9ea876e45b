//! Journal tag join and per-tag rollups.

use super::{ClosedTrade, OpenPosition};
use crate::config::PnlMode;
use crate::domain::{Decimal, PositionKey, TagId, TagMeta};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Rollup of every closed trade carrying one tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSummary {
    pub tag_id: TagId,
    /// `None` when the tag has no definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<TagMeta>,
    pub total_pnl: Decimal,
    pub trade_count: u64,
    pub win_count: u64,
    pub loss_count: u64,
    pub average_pnl: Decimal,
    pub win_rate: Option<Decimal>,
}

/// What trades tagged as mistakes cost.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorSummary {
    /// Sum of losing P&L on mistake-tagged trades; zero or negative.
    pub cost_of_mistakes: Decimal,
    pub mistake_trade_count: u64,
    pub pnl_if_mistakes_avoided: Decimal,
}

/// Position tag associations plus tag definitions.
///
/// Keys are canonicalized on construction and each key's tag list is sorted
/// and de-duplicated, so lookup and output do not depend on input order.
pub struct TagJoin<'a> {
    position_tags: BTreeMap<PositionKey, Vec<TagId>>,
    definitions: &'a BTreeMap<TagId, TagMeta>,
}

impl<'a> TagJoin<'a> {
    pub fn new(
        position_tags: &BTreeMap<PositionKey, Vec<TagId>>,
        definitions: &'a BTreeMap<TagId, TagMeta>,
    ) -> Self {
        let mut merged: BTreeMap<PositionKey, BTreeSet<TagId>> = BTreeMap::new();
        for (key, tags) in position_tags {
            let key = PositionKey::new(&key.account_id, &key.instrument);
            merged.entry(key).or_default().extend(tags.iter().cloned());
        }
        Self {
            position_tags: merged
                .into_iter()
                .map(|(key, tags)| (key, tags.into_iter().collect()))
                .collect(),
            definitions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.position_tags.is_empty()
    }

    pub fn tags_for(&self, key: &PositionKey) -> &[TagId] {
        self.position_tags.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn attach_closed(&self, trades: &mut [ClosedTrade]) {
        for trade in trades {
            trade.tags = self.tags_for(&trade.position_key).to_vec();
        }
    }

    pub fn attach_open(&self, positions: &mut [OpenPosition]) {
        for position in positions {
            position.tags = self.tags_for(&position.position_key).to_vec();
        }
    }

    fn is_mistake(&self, tag: &TagId) -> bool {
        self.definitions.get(tag).is_some_and(TagMeta::is_mistake)
    }

    /// Per-tag rollups over tagged closed trades, ordered by tag id.
    pub fn summarize(&self, trades: &[ClosedTrade], mode: PnlMode) -> Vec<TagSummary> {
        let mut rollup: BTreeMap<&TagId, TagSummary> = BTreeMap::new();
        for trade in trades {
            let pnl = trade.pnl(mode);
            for tag in &trade.tags {
                let entry = rollup.entry(tag).or_insert_with(|| TagSummary {
                    tag_id: tag.clone(),
                    meta: self.definitions.get(tag).cloned(),
                    total_pnl: Decimal::zero(),
                    trade_count: 0,
                    win_count: 0,
                    loss_count: 0,
                    average_pnl: Decimal::zero(),
                    win_rate: None,
                });
                entry.total_pnl += pnl;
                entry.trade_count += 1;
                if pnl.is_positive() {
                    entry.win_count += 1;
                } else if pnl.is_negative() {
                    entry.loss_count += 1;
                }
            }
        }

        rollup
            .into_values()
            .map(|mut s| {
                let count = Decimal::from(s.trade_count as i64);
                s.average_pnl = s.total_pnl.checked_div(count).unwrap_or_default();
                s.win_rate = Decimal::from(s.win_count as i64)
                    .percent_of(count)
                    .map(|r| r.round_dp(4));
                s
            })
            .collect()
    }

    /// Each mistake-tagged trade counts once, however many mistake tags it has.
    pub fn behavior(
        &self,
        trades: &[ClosedTrade],
        total_pnl: Decimal,
        mode: PnlMode,
    ) -> BehaviorSummary {
        let mut summary = BehaviorSummary::default();
        for trade in trades {
            if !trade.tags.iter().any(|t| self.is_mistake(t)) {
                continue;
            }
            summary.mistake_trade_count += 1;
            let pnl = trade.pnl(mode);
            if pnl.is_negative() {
                summary.cost_of_mistakes += pnl;
            }
        }
        summary.pnl_if_mistakes_avoided = total_pnl - summary.cost_of_mistakes;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountId, InstrumentId, Side, TagCategory, TimeMs, TradeId};
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn key(symbol: &str) -> PositionKey {
        PositionKey::new(&AccountId::new("acct-1"), &InstrumentId::equity(symbol))
    }

    fn closed(symbol: &str, pnl: &str) -> ClosedTrade {
        let key = key(symbol);
        ClosedTrade {
            symbol: key.symbol().clone(),
            account_id: key.account_id.clone(),
            instrument_kind: key.kind(),
            position_key: key,
            side: Side::Long,
            quantity: d("1"),
            entry_price: d("10"),
            exit_price: d("10") + d(pnl),
            opened_at: TimeMs::new(0),
            closed_at: TimeMs::new(1000),
            realized_pnl: d(pnl),
            fees: Decimal::zero(),
            net_pnl: d(pnl),
            cost_basis: d("10"),
            return_pct: None,
            contract_multiplier: d("1"),
            closing_trade_id: TradeId::new(format!("{}-close", symbol)),
            opening_trade_ids: vec![],
            tags: vec![],
            seq: 0,
        }
    }

    fn definitions() -> BTreeMap<TagId, TagMeta> {
        BTreeMap::from([
            (TagId::new("fomo"), TagMeta::new("FOMO", TagCategory::Mistake)),
            (TagId::new("late"), TagMeta::new("Late exit", TagCategory::Mistake)),
            (TagId::new("breakout"), TagMeta::new("Breakout", TagCategory::Setup)),
        ])
    }

    #[test]
    fn test_tags_sorted_deduped_and_canonical() {
        let defs = definitions();
        let raw_key = PositionKey {
            account_id: AccountId::new("acct-1"),
            instrument: InstrumentId::equity(" aapl "),
        };
        let tags = BTreeMap::from([(
            raw_key,
            vec![TagId::new("late"), TagId::new("fomo"), TagId::new("late")],
        )]);
        let join = TagJoin::new(&tags, &defs);

        let ids: Vec<_> = join.tags_for(&key("AAPL")).iter().map(|t| t.as_str()).collect();
        assert_eq!(ids, vec!["fomo", "late"]);
        assert!(join.tags_for(&key("MSFT")).is_empty());
    }

    #[test]
    fn test_summaries_include_undefined_tags() {
        let defs = definitions();
        let tags = BTreeMap::from([
            (key("AAPL"), vec![TagId::new("breakout"), TagId::new("untracked")]),
            (key("MSFT"), vec![TagId::new("breakout")]),
        ]);
        let join = TagJoin::new(&tags, &defs);
        let mut trades = vec![closed("AAPL", "100"), closed("MSFT", "-40"), closed("TSLA", "5")];
        join.attach_closed(&mut trades);

        let summaries = join.summarize(&trades, PnlMode::Gross);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].tag_id.as_str(), "breakout");
        assert_eq!(summaries[0].trade_count, 2);
        assert_eq!(summaries[0].total_pnl, d("60"));
        assert_eq!(summaries[0].average_pnl, d("30"));
        assert_eq!(summaries[0].win_rate, Some(d("50")));
        assert_eq!(summaries[0].meta.as_ref().map(|m| m.name.as_str()), Some("Breakout"));
        assert_eq!(summaries[1].tag_id.as_str(), "untracked");
        assert!(summaries[1].meta.is_none());
    }

    #[test]
    fn test_behavior_counts_each_mistake_trade_once() {
        let defs = definitions();
        let tags = BTreeMap::from([
            (key("AAPL"), vec![TagId::new("fomo"), TagId::new("late")]),
            (key("MSFT"), vec![TagId::new("fomo")]),
            (key("TSLA"), vec![TagId::new("breakout")]),
        ]);
        let join = TagJoin::new(&tags, &defs);
        let mut trades = vec![closed("AAPL", "-300"), closed("MSFT", "50"), closed("TSLA", "-20")];
        join.attach_closed(&mut trades);

        let behavior = join.behavior(&trades, d("-270"), PnlMode::Gross);
        assert_eq!(behavior.mistake_trade_count, 2);
        assert_eq!(behavior.cost_of_mistakes, d("-300"));
        assert_eq!(behavior.pnl_if_mistakes_avoided, d("30"));
    }
}
