//! Stats and analytics API handlers.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{Duration, Local};
use serde::Deserialize;
use serde_json::json;

use crate::dates;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const DEFAULT_ANALYTICS_DAYS: i64 = 30;

/// Ten years; caps the per-request series length.
const MAX_ANALYTICS_DAYS: i64 = 3650;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub user_id: Option<String>,
    pub days: Option<i64>,
    pub group_by: Option<String>,
}

/// GET /api/stats
///
/// Day/week/month totals, per-mantra breakdown, and the current streak.
pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<super::StatsReport>> {
    let user_id = query.user_id.ok_or_else(|| ApiError::missing("user_id is"))?;

    let as_of = Local::now().date_naive();
    let records = state.records.list(&user_id, None, None);
    let mantras = state.mantras.list();

    Ok(Json(super::compute_stats(&records, &mantras, as_of)))
}

/// GET /api/analytics
///
/// Chronological zero-filled daily series over the trailing window plus
/// per-mantra totals. Only daily grouping is computed; `group_by` is echoed
/// back in the response.
pub async fn get_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = query.user_id.ok_or_else(|| ApiError::missing("user_id is"))?;
    let days = query
        .days
        .unwrap_or(DEFAULT_ANALYTICS_DAYS)
        .clamp(1, MAX_ANALYTICS_DAYS);
    let group_by = query.group_by.unwrap_or_else(|| "day".to_string());

    let end = Local::now().date_naive();
    let start = end - Duration::days(days - 1);
    let start_str = dates::day_string(start);
    let end_str = dates::day_string(end);

    let records = state.records.in_range(&user_id, &start_str, &end_str);
    let mantras = state.mantras.list();

    let chart_data = super::analytics_series(&records, &mantras, start, end);
    let mantra_chart_data = super::mantra_totals(&records, &mantras);

    Ok(Json(json!({
        "chartData": chart_data,
        "mantraChartData": mantra_chart_data,
        "dateRange": {
            "start": start_str,
            "end": end_str,
            "days": days,
            "groupBy": group_by,
        },
    })))
}
