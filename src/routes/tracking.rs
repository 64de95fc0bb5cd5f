// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Entry logging, daily intake and calendar routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{DailyIntake, NewEntry, NutritionEntry};
use crate::services::tracking::{client_today, parse_day, CalendarMonth, DayView};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Interval between SSE keep-alive comments.
const KEEP_ALIVE_SECS: u64 = 15;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/entries", post(log_entry).get(list_entries))
        .route("/api/entries/{id}", delete(delete_entry))
        .route("/api/intake/today", get(get_today))
        .route("/api/intake/{date}", get(get_day))
        .route("/api/intake/{date}/stream", get(stream_day))
        .route("/api/calendar", get(get_calendar))
}

// ─── Entries ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct LogEntryResponse {
    pub entry: NutritionEntry,
    pub intake: DailyIntake,
}

async fn log_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<NewEntry>,
) -> Result<(StatusCode, Json<LogEntryResponse>)> {
    let (entry, intake) = state.tracking.log_entry(&user.user_id, request).await?;

    tracing::info!(
        user_id = %user.user_id,
        entry_id = %entry.entry_id,
        date = %entry.date,
        "Entry logged"
    );

    Ok((StatusCode::CREATED, Json(LogEntryResponse { entry, intake })))
}

#[derive(Deserialize)]
struct EntriesQuery {
    from: String,
    /// Defaults to `from`
    to: Option<String>,
}

async fn list_entries(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<EntriesQuery>,
) -> Result<Json<Vec<NutritionEntry>>> {
    let from = parse_day(&params.from)?;
    let to = match params.to.as_deref() {
        Some(raw) => parse_day(raw)?,
        None => from,
    };
    Ok(Json(state.tracking.entries(&user.user_id, from, to).await?))
}

async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(entry_id): Path<String>,
) -> Result<StatusCode> {
    state.tracking.delete_entry(&user.user_id, &entry_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Daily intake ────────────────────────────────────────────

/// Which calendar day is "today" for the caller.
#[derive(Deserialize)]
struct ClientDayQuery {
    /// Minutes east of UTC; UTC when absent
    utc_offset_minutes: Option<i32>,
}

async fn get_today(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ClientDayQuery>,
) -> Result<Json<DayView>> {
    let today = client_today(params.utc_offset_minutes)?;
    Ok(Json(state.tracking.day(&user.user_id, today).await?))
}

async fn get_day(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(date): Path<String>,
) -> Result<Json<DayView>> {
    let date = parse_day(&date)?;
    Ok(Json(state.tracking.day(&user.user_id, date).await?))
}

/// Server-sent events: the day's intake now, then after every change.
async fn stream_day(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(date): Path<String>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>>> {
    let date = parse_day(&date)?;
    let subscription = state.tracking.subscribe(&user.user_id, date).await?;

    let events = subscription
        .into_stream()
        .map(|intake| Event::default().event("intake").json_data(&intake));

    Ok(Sse::new(events)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(KEEP_ALIVE_SECS))))
}

// ─── Calendar ────────────────────────────────────────────────

#[derive(Deserialize)]
struct CalendarQuery {
    /// "YYYY-MM"; defaults to the current month
    month: Option<String>,
    utc_offset_minutes: Option<i32>,
}

async fn get_calendar(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<CalendarQuery>,
) -> Result<Json<CalendarMonth>> {
    let today = client_today(params.utc_offset_minutes)?;
    let month = params
        .month
        .unwrap_or_else(|| today.format("%Y-%m").to_string());

    Ok(Json(
        state.tracking.calendar(&user.user_id, &month, today).await?,
    ))
}
