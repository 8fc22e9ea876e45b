//! Stable trade ordering for deterministic matching.

use crate::domain::{TimeMs, Trade};

/// Ordering key: timestamp first, then position in the caller's input.
///
/// Same-timestamp trades keep input order because brokers report them in
/// execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TradeOrderingKey {
    pub time_ms: TimeMs,
    pub seq: usize,
}

impl TradeOrderingKey {
    pub fn new(trade: &Trade, seq: usize) -> Self {
        TradeOrderingKey {
            time_ms: trade.time_ms,
            seq,
        }
    }
}

/// A trade paired with its input position.
#[derive(Debug, Clone, Copy)]
pub struct SequencedTrade<'a> {
    pub seq: usize,
    pub trade: &'a Trade,
}

impl<'a> SequencedTrade<'a> {
    pub fn ordering_key(&self) -> TradeOrderingKey {
        TradeOrderingKey::new(self.trade, self.seq)
    }
}

/// Sort trades by `(time_ms, seq)`.
pub fn sort_trades_deterministic(trades: &mut [SequencedTrade<'_>]) {
    trades.sort_by_key(|t| t.ordering_key());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decimal, TradeAction};

    fn make_trade(id: &str, time_ms: i64) -> Trade {
        Trade::stock(
            id,
            "acct-1",
            "AAPL",
            TradeAction::Buy,
            Decimal::one(),
            Decimal::from(10),
            TimeMs::new(time_ms),
        )
    }

    #[test]
    fn test_sort_by_time() {
        let a = make_trade("late", 2000);
        let b = make_trade("early", 1000);
        let mut seq = vec![
            SequencedTrade { seq: 0, trade: &a },
            SequencedTrade { seq: 1, trade: &b },
        ];
        sort_trades_deterministic(&mut seq);
        assert_eq!(seq[0].trade.id.as_str(), "early");
        assert_eq!(seq[1].trade.id.as_str(), "late");
    }

    #[test]
    fn test_same_time_keeps_input_order_not_id_order() {
        let a = make_trade("z-first", 1000);
        let b = make_trade("a-second", 1000);
        let c = make_trade("m-third", 1000);
        let mut seq = vec![
            SequencedTrade { seq: 2, trade: &c },
            SequencedTrade { seq: 0, trade: &a },
            SequencedTrade { seq: 1, trade: &b },
        ];
        sort_trades_deterministic(&mut seq);
        let ids: Vec<_> = seq.iter().map(|t| t.trade.id.as_str()).collect();
        assert_eq!(ids, vec!["z-first", "a-second", "m-third"]);
    }
}
