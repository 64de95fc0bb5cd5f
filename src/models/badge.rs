// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Badges and coin rewards.
//!
//! Badges are derived from intake history rather than stored; only the set
//! of claimed badges is persisted (in `rewards/{user_id}`), which makes a
//! claim idempotent.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::intake::DailyIntake;
use crate::models::user::Targets;
use crate::time_utils::parse_date_key;

/// A badge definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeDef {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub coins: u32,
}

/// Every badge a user can earn.
pub const BADGES: &[BadgeDef] = &[
    BadgeDef {
        id: "first_log",
        title: "First Bite",
        description: "Log your first food or drink",
        coins: 10,
    },
    BadgeDef {
        id: "streak_3",
        title: "On a Roll",
        description: "Log something three days in a row",
        coins: 20,
    },
    BadgeDef {
        id: "streak_7",
        title: "Week Warrior",
        description: "Log something seven days in a row",
        coins: 50,
    },
    BadgeDef {
        id: "goal_day",
        title: "Bullseye",
        description: "Finish a day within 10% of your calorie target",
        coins: 15,
    },
    BadgeDef {
        id: "goal_week",
        title: "Dialed In",
        description: "Hit your calorie target on seven days",
        coins: 75,
    },
    BadgeDef {
        id: "hydrated",
        title: "Hydrated",
        description: "Log ten drinks",
        coins: 10,
    },
];

const GOAL_WEEK_DAYS: usize = 7;
const HYDRATED_DRINKS: u32 = 10;

pub fn find_badge(id: &str) -> Option<&'static BadgeDef> {
    BADGES.iter().find(|b| b.id == id)
}

/// What badge evaluation needs to know about one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub entry_count: usize,
    pub drink_count: u32,
    pub goal_met: bool,
}

impl DaySummary {
    /// Summarize an intake document. Returns `None` if its date is malformed.
    pub fn from_intake(intake: &DailyIntake, targets: &Targets) -> Option<Self> {
        Some(Self {
            date: parse_date_key(&intake.date)?,
            entry_count: intake.entry_count(),
            drink_count: intake.drink_count,
            goal_met: intake.entry_count() > 0 && intake.recorded_goal_met(targets),
        })
    }
}

/// Logged days, sorted and deduplicated.
fn logged_days(days: &[DaySummary]) -> Vec<NaiveDate> {
    let set: BTreeSet<NaiveDate> = days
        .iter()
        .filter(|d| d.entry_count > 0)
        .map(|d| d.date)
        .collect();
    set.into_iter().collect()
}

/// Longest run of consecutive logged days.
pub fn longest_streak(days: &[DaySummary]) -> u32 {
    let dates = logged_days(days);
    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;

    for date in dates {
        run = match prev {
            Some(p) if p.succ_opt() == Some(date) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(date);
    }
    best
}

/// Consecutive logged days ending today, or yesterday if nothing is
/// logged yet today.
pub fn current_streak(days: &[DaySummary], today: NaiveDate) -> u32 {
    let dates: BTreeSet<NaiveDate> = logged_days(days).into_iter().collect();

    let mut cursor = if dates.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if dates.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    while dates.contains(&cursor) {
        streak += 1;
        match cursor.pred_opt() {
            Some(p) => cursor = p,
            None => break,
        }
    }
    streak
}

/// IDs of all badges earned by a history.
pub fn evaluate(days: &[DaySummary]) -> BTreeSet<&'static str> {
    let mut earned = BTreeSet::new();

    if days.iter().any(|d| d.entry_count > 0) {
        earned.insert("first_log");
    }

    let streak = longest_streak(days);
    if streak >= 3 {
        earned.insert("streak_3");
    }
    if streak >= 7 {
        earned.insert("streak_7");
    }

    let goal_days = days.iter().filter(|d| d.goal_met).count();
    if goal_days >= 1 {
        earned.insert("goal_day");
    }
    if goal_days >= GOAL_WEEK_DAYS {
        earned.insert("goal_week");
    }

    let drinks: u32 = days.iter().map(|d| d.drink_count).sum();
    if drinks >= HYDRATED_DRINKS {
        earned.insert("hydrated");
    }

    earned
}

/// Claimed badges for a user, stored in `rewards`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewardLedger {
    pub user_id: String,
    #[serde(default)]
    pub claimed: BTreeSet<String>,
    #[serde(default)]
    pub updated_at: String,
}

/// Badge state for API responses.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BadgeStatus {
    pub id: String,
    pub title: String,
    pub description: String,
    pub coins: u32,
    pub earned: bool,
    pub claimed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(date: &str, entries: usize, drinks: u32, goal_met: bool) -> DaySummary {
        DaySummary {
            date: parse_date_key(date).unwrap(),
            entry_count: entries,
            drink_count: drinks,
            goal_met,
        }
    }

    #[test]
    fn test_catalogue_ids_unique() {
        let ids: BTreeSet<_> = BADGES.iter().map(|b| b.id).collect();
        assert_eq!(ids.len(), BADGES.len());
    }

    #[test]
    fn test_no_history_no_badges() {
        assert!(evaluate(&[]).is_empty());
        // Empty intake documents (created at registration) don't count.
        assert!(evaluate(&[day("2026-01-01", 0, 0, false)]).is_empty());
    }

    #[test]
    fn test_longest_streak_across_gap() {
        let days = vec![
            day("2026-01-01", 1, 0, false),
            day("2026-01-02", 2, 0, false),
            day("2026-01-04", 1, 0, false),
            day("2026-01-05", 1, 0, false),
            day("2026-01-06", 1, 0, false),
            day("2026-01-07", 1, 0, false),
        ];
        assert_eq!(longest_streak(&days), 4);
        let earned = evaluate(&days);
        assert!(earned.contains("first_log"));
        assert!(earned.contains("streak_3"));
        assert!(!earned.contains("streak_7"));
    }

    #[test]
    fn test_streak_across_month_boundary() {
        let days = vec![
            day("2026-01-30", 1, 0, false),
            day("2026-01-31", 1, 0, false),
            day("2026-02-01", 1, 0, false),
        ];
        assert_eq!(longest_streak(&days), 3);
    }

    #[test]
    fn test_current_streak_allows_today_empty() {
        let days = vec![
            day("2026-03-01", 1, 0, false),
            day("2026-03-02", 1, 0, false),
            day("2026-03-03", 1, 0, false),
        ];
        let today = parse_date_key("2026-03-04").unwrap();
        assert_eq!(current_streak(&days, today), 3);

        let later = parse_date_key("2026-03-05").unwrap();
        assert_eq!(current_streak(&days, later), 0);
    }

    #[test]
    fn test_goal_and_hydration_badges() {
        let days: Vec<DaySummary> = (1..=7)
            .map(|d| day(&format!("2026-05-{:02}", d * 2), 1, 2, true))
            .collect();

        let earned = evaluate(&days);
        assert!(earned.contains("goal_day"));
        assert!(earned.contains("goal_week"));
        assert!(earned.contains("hydrated"));
        assert!(!earned.contains("streak_3"));
    }

    #[test]
    fn test_goal_badge_kept_after_target_change() {
        let mut intake = DailyIntake::empty("uid-1", "2026-05-02", "t0");
        intake.entry_ids.insert("e1".to_string());
        intake.total_calories = 1500.0;
        intake.record_targets(&Targets {
            calories: 1500.0,
            ..Targets::default()
        });

        let raised = Targets {
            calories: 3000.0,
            ..Targets::default()
        };
        let summary = DaySummary::from_intake(&intake, &raised).unwrap();
        assert!(summary.goal_met);
        assert!(evaluate(&[summary]).contains("goal_day"));
    }
}
