//! Trade record: a single broker execution or corporate action.

use crate::domain::{AccountId, Decimal, InstrumentId, InstrumentKind, PositionKey, TimeMs, TradeId};
use serde::{Deserialize, Serialize};

/// Broker action string, parsed case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TradeAction {
    Buy,
    Sell,
    BuyToOpen,
    SellToClose,
    SellToOpen,
    BuyToClose,
    Assignment,
    Exercises,
    OptionExpiration,
    Split,
    Dividend,
    /// Any action that does not touch the ledger (cash, transfers, fees...).
    Other(String),
}

impl TradeAction {
    pub fn as_str(&self) -> &str {
        match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
            TradeAction::BuyToOpen => "BUY_TO_OPEN",
            TradeAction::SellToClose => "SELL_TO_CLOSE",
            TradeAction::SellToOpen => "SELL_TO_OPEN",
            TradeAction::BuyToClose => "BUY_TO_CLOSE",
            TradeAction::Assignment => "ASSIGNMENT",
            TradeAction::Exercises => "EXERCISES",
            TradeAction::OptionExpiration => "OPTIONEXPIRATION",
            TradeAction::Split => "SPLIT",
            TradeAction::Dividend => "DIVIDEND",
            TradeAction::Other(raw) => raw,
        }
    }
}

impl From<String> for TradeAction {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "BUY" => TradeAction::Buy,
            "SELL" => TradeAction::Sell,
            "BUY_TO_OPEN" => TradeAction::BuyToOpen,
            "SELL_TO_CLOSE" => TradeAction::SellToClose,
            "SELL_TO_OPEN" => TradeAction::SellToOpen,
            "BUY_TO_CLOSE" => TradeAction::BuyToClose,
            "ASSIGNMENT" => TradeAction::Assignment,
            "EXERCISES" => TradeAction::Exercises,
            "OPTIONEXPIRATION" => TradeAction::OptionExpiration,
            "SPLIT" => TradeAction::Split,
            "DIVIDEND" => TradeAction::Dividend,
            _ => TradeAction::Other(raw),
        }
    }
}

impl From<&str> for TradeAction {
    fn from(raw: &str) -> Self {
        TradeAction::from(raw.to_string())
    }
}

impl From<TradeAction> for String {
    fn from(action: TradeAction) -> Self {
        action.as_str().to_string()
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split terms: `from` old shares become `to` new shares (2-for-1 is from=1, to=2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitRatio {
    pub from: Decimal,
    pub to: Decimal,
}

impl SplitRatio {
    pub fn new(from: Decimal, to: Decimal) -> Self {
        SplitRatio { from, to }
    }

    /// `to / from`, `None` unless both sides are positive.
    pub fn factor(&self) -> Option<Decimal> {
        if !self.from.is_positive() || !self.to.is_positive() {
            return None;
        }
        self.to.checked_div(self.from)
    }
}

/// A raw trade record as synced from a brokerage account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: TradeId,
    pub account_id: AccountId,
    pub instrument: InstrumentId,
    pub action: TradeAction,
    /// Direction comes from `action`; the sign is ignored.
    pub quantity: Decimal,
    /// Per-share price, also for options.
    pub price: Decimal,
    pub time_ms: TimeMs,
    /// 1 for stock, 100 for standard options, 10 for mini options.
    pub contract_multiplier: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<Decimal>,
    /// Present only on `SPLIT` records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitRatio>,
}

impl Trade {
    /// Stock trade with multiplier 1.
    #[allow(clippy::too_many_arguments)]
    pub fn stock(
        id: impl Into<String>,
        account_id: impl Into<String>,
        symbol: impl Into<String>,
        action: TradeAction,
        quantity: Decimal,
        price: Decimal,
        time_ms: TimeMs,
    ) -> Self {
        Trade {
            id: TradeId::new(id),
            account_id: AccountId::new(account_id),
            instrument: InstrumentId::equity(symbol),
            action,
            quantity,
            price,
            time_ms,
            contract_multiplier: Decimal::one(),
            fees: None,
            split: None,
        }
    }

    pub fn with_fees(mut self, fees: Decimal) -> Self {
        self.fees = Some(fees);
        self
    }

    pub fn with_split(mut self, ratio: SplitRatio) -> Self {
        self.split = Some(ratio);
        self
    }

    pub fn position_key(&self) -> PositionKey {
        PositionKey::new(&self.account_id, &self.instrument)
    }

    pub fn kind(&self) -> InstrumentKind {
        self.instrument.kind()
    }
}
