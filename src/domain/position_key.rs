//! Instrument identity and the position key that groups lots.
//!
//! Lots never cross a [`PositionKey`]: a transfer-in on one account can never
//! net against a sale of the same symbol on another.

use crate::domain::{AccountId, Decimal, InstrumentKind, OptionRight, Symbol};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a tradable instrument.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InstrumentId {
    /// An equity, identified by ticker.
    #[serde(rename = "stock")]
    Equity { symbol: Symbol },
    /// A listed option contract.
    #[serde(rename = "option", rename_all = "camelCase")]
    Option {
        underlying: Symbol,
        expiry: NaiveDate,
        strike: Decimal,
        right: OptionRight,
    },
}

impl InstrumentId {
    pub fn equity(symbol: impl Into<String>) -> Self {
        InstrumentId::Equity {
            symbol: Symbol::new(symbol),
        }
    }

    pub fn option(
        underlying: impl Into<String>,
        expiry: NaiveDate,
        strike: Decimal,
        right: OptionRight,
    ) -> Self {
        InstrumentId::Option {
            underlying: Symbol::new(underlying),
            expiry,
            strike,
            right,
        }
    }

    pub fn kind(&self) -> InstrumentKind {
        match self {
            InstrumentId::Equity { .. } => InstrumentKind::Stock,
            InstrumentId::Option { .. } => InstrumentKind::Option,
        }
    }

    /// Ticker used for per-symbol grouping; the underlying for options.
    pub fn symbol(&self) -> &Symbol {
        match self {
            InstrumentId::Equity { symbol } => symbol,
            InstrumentId::Option { underlying, .. } => underlying,
        }
    }

    /// Canonical form: trimmed upper-case tickers, strike without trailing zeros.
    pub fn canonical(&self) -> InstrumentId {
        match self {
            InstrumentId::Equity { symbol } => InstrumentId::Equity {
                symbol: symbol.canonical(),
            },
            InstrumentId::Option {
                underlying,
                expiry,
                strike,
                right,
            } => InstrumentId::Option {
                underlying: underlying.canonical(),
                expiry: *expiry,
                strike: strike.normalized(),
                right: *right,
            },
        }
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstrumentId::Equity { symbol } => write!(f, "{}", symbol),
            InstrumentId::Option {
                underlying,
                expiry,
                strike,
                right,
            } => write!(f, "{} {} {}{}", underlying, expiry, strike, right),
        }
    }
}

/// Canonical grouping key: one account, one instrument.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionKey {
    pub account_id: AccountId,
    pub instrument: InstrumentId,
}

impl PositionKey {
    /// Derive the key for a trade's account and instrument.
    ///
    /// Stable across runs: identical inputs always produce identical keys.
    pub fn new(account_id: &AccountId, instrument: &InstrumentId) -> Self {
        PositionKey {
            account_id: AccountId::new(account_id.as_str().trim()),
            instrument: instrument.canonical(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        self.instrument.symbol()
    }

    pub fn kind(&self) -> InstrumentKind {
        self.instrument.kind()
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.account_id, self.instrument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 21).unwrap()
    }

    #[test]
    fn test_equity_key_canonicalizes_ticker() {
        let a = PositionKey::new(&AccountId::new("acct-1"), &InstrumentId::equity("aapl"));
        let b = PositionKey::new(&AccountId::new("acct-1"), &InstrumentId::equity(" AAPL"));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "acct-1:AAPL");
    }

    #[test]
    fn test_keys_differ_across_accounts() {
        let instrument = InstrumentId::equity("AAPL");
        let a = PositionKey::new(&AccountId::new("acct-1"), &instrument);
        let b = PositionKey::new(&AccountId::new("acct-2"), &instrument);
        assert_ne!(a, b);
    }

    #[test]
    fn test_option_key_disambiguates_strike_and_right() {
        let account = AccountId::new("acct-1");
        let strike = Decimal::from_str("150").unwrap();
        let call = InstrumentId::option("AAPL", expiry(), strike, OptionRight::Call);
        let put = InstrumentId::option("AAPL", expiry(), strike, OptionRight::Put);
        let other_strike = InstrumentId::option(
            "AAPL",
            expiry(),
            Decimal::from_str("155").unwrap(),
            OptionRight::Call,
        );

        let call_key = PositionKey::new(&account, &call);
        assert_ne!(call_key, PositionKey::new(&account, &put));
        assert_ne!(call_key, PositionKey::new(&account, &other_strike));
        assert_ne!(call_key, PositionKey::new(&account, &InstrumentId::equity("AAPL")));
        assert_eq!(call_key.symbol().as_str(), "AAPL");
        assert_eq!(call_key.kind(), InstrumentKind::Option);
    }

    #[test]
    fn test_option_strike_scale_does_not_split_key() {
        let account = AccountId::new("acct-1");
        let a = InstrumentId::option(
            "spy",
            expiry(),
            Decimal::from_str("450.00").unwrap(),
            OptionRight::Put,
        );
        let b = InstrumentId::option(
            "SPY",
            expiry(),
            Decimal::from_str("450").unwrap(),
            OptionRight::Put,
        );
        let key = PositionKey::new(&account, &a);
        assert_eq!(key, PositionKey::new(&account, &b));
        assert_eq!(key.to_string(), "acct-1:SPY 2024-06-21 450P");
    }

    #[test]
    fn test_instrument_json_shape() {
        let json = serde_json::to_value(InstrumentId::equity("AAPL")).unwrap();
        assert_eq!(json["kind"], "stock");
        assert_eq!(json["symbol"], "AAPL");

        let option: InstrumentId = serde_json::from_value(serde_json::json!({
            "kind": "option",
            "underlying": "AAPL",
            "expiry": "2024-06-21",
            "strike": 150,
            "right": "call"
        }))
        .unwrap();
        assert_eq!(option.kind(), InstrumentKind::Option);
    }
}
