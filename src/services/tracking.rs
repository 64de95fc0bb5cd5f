// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Intake tracking: logging entries, daily views and calendar history.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::badge::{current_streak, DaySummary};
use crate::models::{DailyIntake, NewEntry, NutritionEntry, Progress, Targets, User};
use crate::services::feed::{IntakeFeed, Subscription};
use crate::time_utils::{date_key, local_date, month_bounds, parse_date_key};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use validator::Validate;

/// Longest entry listing served in one request.
const MAX_RANGE_DAYS: i64 = 62;

/// One day as shown on the tracking screen.
#[derive(Debug, Clone, Serialize)]
pub struct DayView {
    pub intake: DailyIntake,
    pub entries: Vec<NutritionEntry>,
    pub progress: Progress,
}

/// One day cell on the calendar screen.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    pub date: String,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub entry_count: usize,
    pub goal_met: bool,
}

/// A month of calendar history.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarMonth {
    pub month: String,
    /// Only days with an intake document, oldest first
    pub days: Vec<CalendarDay>,
    pub goal_days: u32,
    pub current_streak: u32,
}

/// Logs entries and assembles intake views.
#[derive(Clone)]
pub struct TrackingService {
    db: FirestoreDb,
    feed: IntakeFeed,
}

impl TrackingService {
    pub fn new(db: FirestoreDb, feed: IntakeFeed) -> Self {
        Self { db, feed }
    }

    pub fn feed(&self) -> &IntakeFeed {
        &self.feed
    }

    async fn require_user(&self, user_id: &str) -> Result<User> {
        self.db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    /// Validate and log a new entry, then notify subscribers of the day.
    pub async fn log_entry(
        &self,
        user_id: &str,
        request: NewEntry,
    ) -> Result<(NutritionEntry, DailyIntake)> {
        request.validate()?;
        if request.food_name.trim().is_empty() {
            return Err(AppError::BadRequest("food_name must not be blank".to_string()));
        }

        let now = Utc::now();
        if request.logged_at.is_some_and(|t| t > now) {
            return Err(AppError::BadRequest(
                "logged_at must not be in the future".to_string(),
            ));
        }

        let entry = request.into_entry(user_id, now);
        let intake = self.db.log_entry_atomic(&entry).await?;

        let delivered = self.feed.publish(&intake);
        tracing::debug!(
            user_id,
            entry_id = %entry.entry_id,
            delivered,
            "Published intake update"
        );

        Ok((entry, intake))
    }

    /// Delete one of the user's entries.
    pub async fn delete_entry(&self, user_id: &str, entry_id: &str) -> Result<Option<DailyIntake>> {
        let entry = self
            .db
            .get_entry(entry_id)
            .await?
            // Don't reveal other users' entries.
            .filter(|e| e.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("Entry {} not found", entry_id)))?;

        let intake = self.db.delete_entry_atomic(&entry).await?;
        if let Some(intake) = &intake {
            self.feed.publish(intake);
        }
        Ok(intake)
    }

    /// Intake, entries and progress for one day.
    pub async fn day(&self, user_id: &str, date: NaiveDate) -> Result<DayView> {
        let user = self.require_user(user_id).await?;
        let key = date_key(date);

        let intake = self
            .db
            .get_intake(user_id, &key)
            .await?
            .unwrap_or_else(|| DailyIntake::empty(user_id, &key, ""));
        let entries = self.db.get_entries_for_day(user_id, &key).await?;
        let progress = Progress::compute(&intake, &user.targets);

        Ok(DayView {
            intake,
            entries,
            progress,
        })
    }

    /// Entries logged between two days (inclusive).
    pub async fn entries(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NutritionEntry>> {
        if to < from {
            return Err(AppError::BadRequest("'to' must not be before 'from'".to_string()));
        }
        if (to - from).num_days() >= MAX_RANGE_DAYS {
            return Err(AppError::BadRequest(format!(
                "Range must not exceed {} days",
                MAX_RANGE_DAYS
            )));
        }
        self.db
            .get_entries_in_range(user_id, &date_key(from), &date_key(to))
            .await
    }

    /// Per-day totals for a "YYYY-MM" month, with the streak as of `today`.
    pub async fn calendar(
        &self,
        user_id: &str,
        month: &str,
        today: NaiveDate,
    ) -> Result<CalendarMonth> {
        let (first, last) = month_bounds(month).ok_or_else(|| {
            AppError::BadRequest("Invalid 'month' parameter: expected YYYY-MM".to_string())
        })?;

        let user = self.require_user(user_id).await?;
        let intakes = self
            .db
            .get_intakes_in_range(user_id, &date_key(first), &date_key(last))
            .await?;

        // The streak may run back past the start of the month.
        let history = self.db.get_all_intakes(user_id).await?;
        let summaries = summarize(&history, &user.targets);
        let streak = current_streak(&summaries, today);

        Ok(build_calendar(month, &intakes, &user.targets, streak))
    }

    /// Subscribe to a day's intake, starting from its stored state.
    pub async fn subscribe(&self, user_id: &str, date: NaiveDate) -> Result<Subscription> {
        let key = date_key(date);
        let (db, day) = (&self.db, key.as_str());
        self.feed
            .subscribe_with(user_id, day, move || async move {
                let stored = db.get_intake(user_id, day).await?;
                Ok::<_, AppError>(stored.unwrap_or_else(|| DailyIntake::empty(user_id, day, "")))
            })
            .await
    }
}

/// Parse a "YYYY-MM-DD" path segment.
pub fn parse_day(raw: &str) -> Result<NaiveDate> {
    parse_date_key(raw)
        .ok_or_else(|| AppError::BadRequest("Invalid date: expected YYYY-MM-DD".to_string()))
}

/// The client's current calendar day, given its offset east of UTC.
pub fn client_today(utc_offset_minutes: Option<i32>) -> Result<NaiveDate> {
    local_date(Utc::now(), utc_offset_minutes.unwrap_or(0)).ok_or_else(|| {
        AppError::BadRequest("utc_offset_minutes must be within -840..=840".to_string())
    })
}

/// Badge/streak summaries for a set of intakes.
pub fn summarize(intakes: &[DailyIntake], targets: &Targets) -> Vec<DaySummary> {
    intakes
        .iter()
        .filter_map(|i| DaySummary::from_intake(i, targets))
        .collect()
}

fn build_calendar(
    month: &str,
    intakes: &[DailyIntake],
    targets: &Targets,
    current_streak: u32,
) -> CalendarMonth {
    let days: Vec<CalendarDay> = intakes
        .iter()
        .map(|i| CalendarDay {
            date: i.date.clone(),
            calories: i.total_calories,
            protein: i.total_protein,
            fat: i.total_fat,
            carbs: i.total_carbs,
            entry_count: i.entry_count(),
            goal_met: i.entry_count() > 0 && i.recorded_goal_met(targets),
        })
        .collect();

    let goal_days = days.iter().filter(|d| d.goal_met).count() as u32;

    CalendarMonth {
        month: month.to_string(),
        days,
        goal_days,
        current_streak,
    }
}
