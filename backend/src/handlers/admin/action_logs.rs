use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppError,
    models::action_log::ActionLog,
    repositories::action_log::ActionLogFilters,
    services::action_log_history::{ActionLogHistoryService, ActionLogPage},
    state::AppState,
    types::{ActionLogId, UserId},
};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PER_PAGE: i64 = 25;
const MAX_PER_PAGE: i64 = 100;
const MAX_PAGE: i64 = 1_000;

#[derive(Debug, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct ActionLogListQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub user_id: Option<String>,
    pub action_name: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActionLogResponse {
    pub id: String,
    pub action_name: String,
    pub description: String,
    pub user_id: Option<String>,
    pub payload: Option<Value>,
    pub executed_at: DateTime<Utc>,
}

impl From<ActionLog> for ActionLogResponse {
    fn from(log: ActionLog) -> Self {
        Self {
            id: log.id.to_string(),
            action_name: log.action_name,
            description: log.description,
            user_id: log.user_id.map(|id| id.to_string()),
            payload: log.payload.map(|value| value.0),
            executed_at: log.executed_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActionLogListResponse {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
    pub items: Vec<ActionLogResponse>,
}

impl From<ActionLogPage> for ActionLogListResponse {
    fn from(page: ActionLogPage) -> Self {
        Self {
            page: page.page,
            per_page: page.per_page,
            total: page.total,
            total_pages: page.total_pages,
            items: page.items.into_iter().map(ActionLogResponse::from).collect(),
        }
    }
}

pub async fn list_action_logs(
    State(state): State<AppState>,
    Query(q): Query<ActionLogListQuery>,
) -> Result<Json<ActionLogListResponse>, AppError> {
    let (page, per_page, filters) = validate_list_query(q)?;
    let history = ActionLogHistoryService::new(state.pool.clone())
        .get_history(&filters, page, per_page)
        .await
        .map_err(|e| AppError::InternalServerError(e.into()))?;
    Ok(Json(ActionLogListResponse::from(history)))
}

pub async fn get_action_log_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ActionLogResponse>, AppError> {
    let action_log_id = ActionLogId::from_str(&id)
        .map_err(|_| AppError::BadRequest("Invalid action log ID".into()))?;

    let log = ActionLogHistoryService::new(state.pool.clone())
        .fetch(action_log_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.into()))?
        .ok_or_else(|| AppError::NotFound("Not found".into()))?;

    Ok(Json(ActionLogResponse::from(log)))
}

fn validate_list_query(q: ActionLogListQuery) -> Result<(i64, i64, ActionLogFilters), AppError> {
    let page = q.page.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE);
    let per_page = q
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    let start_date = parse_start_datetime(q.start_date.as_deref())
        .map_err(|e| AppError::BadRequest(e.into()))?;
    let end_date =
        parse_end_datetime(q.end_date.as_deref()).map_err(|e| AppError::BadRequest(e.into()))?;

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(AppError::BadRequest(
                "`start_date` must be before or equal to `end_date`".into(),
            ));
        }
    }

    let user_id = q
        .user_id
        .filter(|s| !s.trim().is_empty())
        .map(|s| UserId::from_str(s.trim()))
        .transpose()
        .map_err(|_| AppError::BadRequest("Invalid user ID".into()))?;

    Ok((
        page,
        per_page,
        ActionLogFilters {
            start_date,
            end_date,
            user_id,
            action_name: normalize_filter(q.action_name),
        },
    ))
}

fn normalize_filter(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_start_datetime(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, &'static str> {
    match raw {
        Some(value) => parse_datetime_value(value, true)
            .ok_or("`start_date` must be a valid datetime (RFC3339 or YYYY-MM-DD)")
            .map(Some),
        None => Ok(None),
    }
}

fn parse_end_datetime(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, &'static str> {
    match raw {
        Some(value) => parse_datetime_value(value, false)
            .ok_or("`end_date` must be a valid datetime (RFC3339 or YYYY-MM-DD)")
            .map(Some),
        None => Ok(None),
    }
}

fn parse_datetime_value(value: &str, is_start: bool) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let time = if is_start {
            NaiveTime::from_hms_opt(0, 0, 0)
        } else {
            NaiveTime::from_hms_opt(23, 59, 59)
        }?;
        return Some(DateTime::<Utc>::from_naive_utc_and_offset(
            NaiveDateTime::new(date, time),
            Utc,
        ));
    }
    None
}
