//! Domain primitives: TimeMs, TradeId, AccountId, Symbol, Side, InstrumentKind.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    pub fn as_ms(&self) -> i64 {
        self.0
    }

    /// UTC instant, `None` if the value is outside chrono's range.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }

    /// Calendar date in UTC.
    pub fn utc_date(&self) -> Option<NaiveDate> {
        self.to_utc().map(|t| t.date_naive())
    }

    /// Midnight UTC of `date`.
    pub fn start_of_day(date: NaiveDate) -> Self {
        let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
        TimeMs(midnight.and_utc().timestamp_millis())
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                $name(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                $name(value.to_string())
            }
        }
    };
}

string_id!(
    /// Broker-assigned trade identifier; unique within a user's history.
    TradeId
);
string_id!(
    /// Brokerage account identifier.
    AccountId
);
string_id!(
    /// Ticker symbol (e.g. "AAPL").
    Symbol
);
string_id!(
    /// Identifier of a user-defined journal tag.
    TagId
);

impl Symbol {
    /// Upper-cased, whitespace-trimmed ticker.
    pub fn canonical(&self) -> Symbol {
        Symbol(self.0.trim().to_ascii_uppercase())
    }
}

/// Direction of a lot or position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short.
    pub fn sign(&self) -> i32 {
        match self {
            Side::Long => 1,
            Side::Short => -1,
        }
    }

    pub fn opposite(&self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

/// Asset class of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentKind {
    Stock,
    Option,
}

/// Option right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionRight {
    Call,
    Put,
}

impl std::fmt::Display for OptionRight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionRight::Call => write!(f, "C"),
            OptionRight::Put => write!(f, "P"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_sign_and_opposite() {
        assert_eq!(Side::Long.sign(), 1);
        assert_eq!(Side::Short.sign(), -1);
        assert_eq!(Side::Long.opposite(), Side::Short);
    }

    #[test]
    fn test_side_serialization() {
        assert_eq!(serde_json::to_string(&Side::Long).unwrap(), "\"long\"");
        assert_eq!(serde_json::to_string(&Side::Short).unwrap(), "\"short\"");
    }

    #[test]
    fn test_utc_date_from_millis() {
        // 2024-06-01T15:30:00Z
        let t = TimeMs::new(1_717_255_800_000);
        assert_eq!(t.utc_date(), NaiveDate::from_ymd_opt(2024, 6, 1));
    }

    #[test]
    fn test_start_of_day_roundtrips_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let t = TimeMs::start_of_day(date);
        assert_eq!(t.as_ms(), 1_704_067_200_000);
        assert_eq!(t.utc_date(), Some(date));
    }

    #[test]
    fn test_out_of_range_millis_has_no_date() {
        assert_eq!(TimeMs::new(i64::MAX).utc_date(), None);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = TradeId::new("T-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"T-1\"");
        assert_eq!(id.to_string(), "T-1");
    }

    #[test]
    fn test_symbol_canonical() {
        assert_eq!(Symbol::new(" aapl ").canonical(), Symbol::new("AAPL"));
    }
}
