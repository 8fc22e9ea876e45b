use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::compile::{match_and_aggregate, AnalyticsFilter, LedgerReport};
use crate::config::{Config, PnlMode};
use crate::domain::{
    AccountId, Decimal, InstrumentId, InstrumentKind, PositionKey, TagDefinition, TagId, Trade,
    TradeId,
};
use crate::error::AppError;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionTags {
    pub position_key: PositionKey,
    pub tag_ids: Vec<TagId>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPrice {
    pub instrument: InstrumentId,
    pub price: Decimal,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRequest {
    pub trades: Vec<Trade>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub account_id: Option<AccountId>,
    pub asset_type: Option<InstrumentKind>,
    #[serde(default)]
    pub position_tags: Vec<PositionTags>,
    #[serde(default)]
    pub tag_definitions: Vec<TagDefinition>,
    #[serde(default)]
    pub excluded_trade_ids: Vec<TradeId>,
    /// Falls back to the server's `PNL_MODE`.
    pub pnl_mode: Option<PnlMode>,
    #[serde(default)]
    pub marks: Vec<MarkPrice>,
}

impl AnalyticsRequest {
    pub fn into_filter(self, config: &Config) -> Result<(Vec<Trade>, AnalyticsFilter), AppError> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(AppError::BadRequest(
                    "startDate must be <= endDate".to_string(),
                ));
            }
        }
        if let Some(mark) = self.marks.iter().find(|m| m.price.is_negative()) {
            return Err(AppError::BadRequest(format!(
                "negative mark price for {}",
                mark.instrument
            )));
        }

        let mut position_tags = std::collections::BTreeMap::new();
        for entry in self.position_tags {
            position_tags
                .entry(entry.position_key)
                .or_insert_with(Vec::new)
                .extend(entry.tag_ids);
        }

        let mut excluded_trade_ids = config.excluded_trade_ids.clone();
        excluded_trade_ids.extend(self.excluded_trade_ids);

        let filter = AnalyticsFilter {
            start_date: self.start_date,
            end_date: self.end_date,
            account_id: self.account_id,
            asset_type: self.asset_type,
            position_tags,
            tag_definitions: self
                .tag_definitions
                .into_iter()
                .map(|def| (def.id, def.meta))
                .collect(),
            excluded_trade_ids,
            pnl_mode: self.pnl_mode.unwrap_or(config.pnl_mode),
            marks: self
                .marks
                .into_iter()
                .map(|m| (m.instrument.canonical(), m.price))
                .collect(),
        };
        Ok((self.trades, filter))
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub fingerprint: String,
    pub report: LedgerReport,
}

pub async fn post_analytics(
    State(state): State<AppState>,
    Json(request): Json<AnalyticsRequest>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    let (trades, filter) = request.into_filter(&state.config)?;
    let trade_count = trades.len();

    let (report, fingerprint) = tokio::task::spawn_blocking(move || {
        let report = match_and_aggregate(&trades, &filter);
        let fingerprint = report.fingerprint();
        (report, fingerprint)
    })
    .await?;
    let fingerprint = fingerprint?;

    tracing::info!(
        trades = trade_count,
        closed = report.closed_trades.len(),
        failures = report.failures.len(),
        fingerprint = %fingerprint,
        "analytics computed"
    );

    Ok(Json(AnalyticsResponse {
        fingerprint,
        report,
    }))
}
