//! Classifies raw trade records into lot-affecting effects.

use super::{Anomaly, AnomalyKind, LedgerError};
use crate::domain::{Decimal, InstrumentId, Side, SplitRatio, Trade, TradeAction};

/// What a trade does to the lot queue of its position key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    OpenLong,
    CloseLong,
    OpenShort,
    CloseShort,
    /// Closes whichever side is open when the trade is matched. `fallback` is
    /// the side reported if the position is flat by then.
    CloseAtPosition { fallback: Side },
    SplitAdjust(SplitRatio),
    Ignore(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    ZeroQuantity,
    NonLedgerAction,
}

/// A trade with its effect and resolved quantities.
#[derive(Debug, Clone)]
pub struct NormalizedTrade<'a> {
    pub trade: &'a Trade,
    pub seq: usize,
    pub effect: Effect,
    /// Absolute quantity.
    pub quantity: Decimal,
    pub price: Decimal,
    pub multiplier: Decimal,
    pub fees: Decimal,
    /// Flag raised while normalizing (ignored or suspicious record).
    pub diagnostic: Option<Anomaly>,
}

impl NormalizedTrade<'_> {
    /// True when the record participates in lot matching.
    pub fn affects_lots(&self) -> bool {
        !matches!(self.effect, Effect::Ignore(_) | Effect::SplitAdjust(_))
    }
}

/// Normalize one trade.
///
/// # Errors
/// Returns [`LedgerError`] naming the trade when it violates the input
/// contract (missing ids, bad timestamp, malformed multiplier, negative
/// price or fees, SPLIT without a ratio).
pub fn normalize(trade: &Trade, seq: usize) -> Result<NormalizedTrade<'_>, LedgerError> {
    validate_identity(trade)?;

    let mut normalized = NormalizedTrade {
        trade,
        seq,
        effect: Effect::Ignore(IgnoreReason::NonLedgerAction),
        quantity: trade.quantity.abs(),
        price: trade.price,
        multiplier: trade.contract_multiplier,
        fees: trade.fees.unwrap_or_default(),
        diagnostic: None,
    };

    let effect = match &trade.action {
        TradeAction::Buy | TradeAction::BuyToOpen | TradeAction::Assignment => Effect::OpenLong,
        TradeAction::Sell | TradeAction::SellToClose => Effect::CloseLong,
        TradeAction::SellToOpen => Effect::OpenShort,
        TradeAction::BuyToClose => Effect::CloseAtPosition {
            fallback: Side::Short,
        },
        TradeAction::Exercises | TradeAction::OptionExpiration => Effect::CloseAtPosition {
            fallback: Side::Long,
        },
        TradeAction::Split => {
            let ratio = trade
                .split
                .filter(|r| r.factor().is_some())
                .ok_or_else(|| LedgerError::MissingSplitRatio {
                    trade_id: trade.id.clone(),
                })?;
            normalized.effect = Effect::SplitAdjust(ratio);
            return Ok(normalized);
        }
        TradeAction::Dividend | TradeAction::Other(_) => {
            normalized.diagnostic = Some(anomaly(
                trade,
                AnomalyKind::NonLedgerAction,
                format!("action {} does not affect lots", trade.action),
            ));
            return Ok(normalized);
        }
    };

    validate_multiplier(trade)?;
    validate_amounts(trade)?;

    if normalized.quantity.is_zero() {
        normalized.effect = Effect::Ignore(IgnoreReason::ZeroQuantity);
        normalized.diagnostic = Some(anomaly(
            trade,
            AnomalyKind::ZeroQuantity,
            format!("{} with zero quantity ignored", trade.action),
        ));
        return Ok(normalized);
    }

    if trade.price.is_zero() && !zero_price_expected(&trade.action) {
        normalized.diagnostic = Some(anomaly(
            trade,
            AnomalyKind::ZeroPrice,
            format!("{} at zero price processed as recorded", trade.action),
        ));
    }

    normalized.effect = effect;
    Ok(normalized)
}

/// Expirations, exercises and assignments legitimately settle at zero.
fn zero_price_expected(action: &TradeAction) -> bool {
    matches!(
        action,
        TradeAction::OptionExpiration | TradeAction::Exercises | TradeAction::Assignment
    )
}

fn validate_identity(trade: &Trade) -> Result<(), LedgerError> {
    let invalid = |reason: &str| LedgerError::InvalidTrade {
        trade_id: trade.id.clone(),
        reason: reason.to_string(),
    };

    if trade.id.as_str().trim().is_empty() {
        return Err(invalid("missing trade id"));
    }
    if trade.account_id.as_str().trim().is_empty() {
        return Err(invalid("missing account id"));
    }
    if trade.instrument.symbol().as_str().trim().is_empty() {
        return Err(invalid("missing symbol"));
    }
    if trade.time_ms.utc_date().is_none() {
        return Err(LedgerError::InvalidTimestamp {
            trade_id: trade.id.clone(),
            time_ms: trade.time_ms,
        });
    }
    Ok(())
}

fn validate_multiplier(trade: &Trade) -> Result<(), LedgerError> {
    let m = trade.contract_multiplier;
    let valid = match &trade.instrument {
        InstrumentId::Equity { .. } => m == Decimal::one(),
        InstrumentId::Option { .. } => m == Decimal::from(100) || m == Decimal::from(10),
    };
    if valid {
        Ok(())
    } else {
        Err(LedgerError::MalformedMultiplier {
            trade_id: trade.id.clone(),
            multiplier: m,
            kind: trade.kind(),
        })
    }
}

fn validate_amounts(trade: &Trade) -> Result<(), LedgerError> {
    if trade.price.is_negative() {
        return Err(LedgerError::InvalidTrade {
            trade_id: trade.id.clone(),
            reason: format!("negative price {}", trade.price),
        });
    }
    if trade.fees.is_some_and(|f| f.is_negative()) {
        return Err(LedgerError::InvalidTrade {
            trade_id: trade.id.clone(),
            reason: "negative fees".to_string(),
        });
    }
    if let InstrumentId::Option { strike, .. } = &trade.instrument {
        if !strike.is_positive() {
            return Err(LedgerError::InvalidTrade {
                trade_id: trade.id.clone(),
                reason: format!("option strike {} must be positive", strike),
            });
        }
    }
    Ok(())
}

fn anomaly(trade: &Trade, kind: AnomalyKind, detail: String) -> Anomaly {
    Anomaly {
        kind,
        trade_id: trade.id.clone(),
        position_key: trade.position_key(),
        detail,
    }
}
