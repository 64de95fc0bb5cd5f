// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user, per-day intake aggregates.
//!
//! One document per user per day, keyed `{user_id}-{date}`. Totals are
//! maintained incrementally as entries are logged or removed, so the
//! tracking screen reads a single document.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::entry::{Macros, NutritionEntry};
use crate::models::user::Targets;

/// Fraction of the calorie target that counts as meeting it.
const GOAL_LOWER_BOUND: f64 = 0.9;
const GOAL_UPPER_BOUND: f64 = 1.1;

/// Totals for one named food within a day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FoodTotals {
    pub servings: u32,
    pub macros: Macros,
}

/// Aggregate intake for one user on one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyIntake {
    pub user_id: String,
    /// "YYYY-MM-DD"
    pub date: String,
    #[serde(default)]
    pub total_calories: f64,
    #[serde(default)]
    pub total_protein: f64,
    #[serde(default)]
    pub total_fat: f64,
    #[serde(default)]
    pub total_carbs: f64,
    /// Totals by food name
    #[serde(default)]
    pub foods: BTreeMap<String, FoodTotals>,
    /// Entries already folded into the totals
    #[serde(default)]
    pub entry_ids: BTreeSet<String>,
    /// Number of drink entries (for hydration badges)
    #[serde(default)]
    pub drink_count: u32,
    /// Calorie target in effect when the totals last changed
    #[serde(default)]
    pub calorie_target: Option<f64>,
    #[serde(default)]
    pub updated_at: String,
}

impl DailyIntake {
    /// Empty intake for a user and day.
    pub fn empty(user_id: &str, date: &str, now: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            date: date.to_string(),
            updated_at: now.to_string(),
            ..Default::default()
        }
    }

    /// Document ID for a user's intake on `date`.
    pub fn doc_id(user_id: &str, date: &str) -> String {
        format!("{}-{}", urlencoding::encode(user_id), date)
    }

    pub fn id(&self) -> String {
        Self::doc_id(&self.user_id, &self.date)
    }

    pub fn totals(&self) -> Macros {
        Macros {
            calories: self.total_calories,
            protein: self.total_protein,
            fat: self.total_fat,
            carbs: self.total_carbs,
        }
    }

    fn set_totals(&mut self, totals: Macros) {
        self.total_calories = totals.calories;
        self.total_protein = totals.protein;
        self.total_fat = totals.fat;
        self.total_carbs = totals.carbs;
    }

    pub fn entry_count(&self) -> usize {
        self.entry_ids.len()
    }

    /// Fold an entry into the totals.
    ///
    /// Returns `false` (and changes nothing) if the entry was already applied.
    pub fn apply_entry(&mut self, entry: &NutritionEntry, now: &str) -> bool {
        if !self.entry_ids.insert(entry.entry_id.clone()) {
            return false;
        }

        let macros = entry.macros();
        let mut totals = self.totals();
        totals.add(&macros);
        self.set_totals(totals);

        let food = self.foods.entry(entry.food_name.clone()).or_default();
        food.servings += 1;
        food.macros.add(&macros);

        if entry.kind == crate::models::entry::EntryKind::Drink {
            self.drink_count += 1;
        }

        self.updated_at = now.to_string();
        true
    }

    /// Remove a previously applied entry.
    ///
    /// Returns `false` if the entry was never applied.
    pub fn remove_entry(&mut self, entry: &NutritionEntry, now: &str) -> bool {
        if !self.entry_ids.remove(&entry.entry_id) {
            return false;
        }

        let macros = entry.macros();
        let mut totals = self.totals();
        totals.subtract(&macros);
        // No float residue once the day is empty again.
        if self.entry_ids.is_empty() {
            totals = Macros::default();
        }
        self.set_totals(totals);

        if let Some(food) = self.foods.get_mut(&entry.food_name) {
            food.servings = food.servings.saturating_sub(1);
            food.macros.subtract(&macros);
            if food.servings == 0 {
                self.foods.remove(&entry.food_name);
            }
        }

        if entry.kind == crate::models::entry::EntryKind::Drink {
            self.drink_count = self.drink_count.saturating_sub(1);
        }

        self.updated_at = now.to_string();
        true
    }

    /// Pin the day's goal to the user's current calorie target.
    pub fn record_targets(&mut self, targets: &Targets) {
        self.calorie_target = Some(targets.calories);
    }

    /// Whether calories landed within the goal band of `targets`.
    pub fn goal_met(&self, targets: &Targets) -> bool {
        within_goal_band(self.total_calories, targets.calories)
    }

    /// Goal check against the target recorded with the day, falling back to
    /// `current` for documents written before targets were recorded.
    pub fn recorded_goal_met(&self, current: &Targets) -> bool {
        let target = self.calorie_target.unwrap_or(current.calories);
        within_goal_band(self.total_calories, target)
    }
}

fn within_goal_band(calories: f64, target: f64) -> bool {
    if target <= 0.0 {
        return false;
    }
    let ratio = calories / target;
    (GOAL_LOWER_BOUND..=GOAL_UPPER_BOUND).contains(&ratio)
}

/// Progress of one nutrient against its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NutrientProgress {
    pub consumed: f64,
    pub target: f64,
    pub remaining: f64,
    /// Percent of target consumed (0 when the target is 0)
    pub percent: f64,
}

impl NutrientProgress {
    fn new(consumed: f64, target: f64) -> Self {
        let percent = if target > 0.0 {
            consumed / target * 100.0
        } else {
            0.0
        };
        Self {
            consumed,
            target,
            remaining: (target - consumed).max(0.0),
            percent,
        }
    }
}

/// Daily progress against targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Progress {
    pub calories: NutrientProgress,
    pub protein: NutrientProgress,
    pub fat: NutrientProgress,
    pub carbs: NutrientProgress,
    pub goal_met: bool,
}

impl Progress {
    pub fn compute(intake: &DailyIntake, targets: &Targets) -> Self {
        Self {
            calories: NutrientProgress::new(intake.total_calories, targets.calories),
            protein: NutrientProgress::new(intake.total_protein, targets.protein),
            fat: NutrientProgress::new(intake.total_fat, targets.fat),
            carbs: NutrientProgress::new(intake.total_carbs, targets.carbs),
            goal_met: intake.goal_met(targets),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entry::EntryKind;
    use chrono::{TimeZone, Utc};

    fn make_entry(id: &str, name: &str, kind: EntryKind, calories: f64) -> NutritionEntry {
        NutritionEntry {
            entry_id: id.to_string(),
            user_id: "uid-1".to_string(),
            food_name: name.to_string(),
            kind,
            calories,
            protein: 10.0,
            fat: 5.0,
            carbs: 20.0,
            logged_at: Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap(),
            date: "2026-01-15".to_string(),
            classified_label: None,
        }
    }

    #[test]
    fn test_doc_id_format() {
        assert_eq!(DailyIntake::doc_id("abc123", "2026-01-15"), "abc123-2026-01-15");
        assert_eq!(
            DailyIntake::doc_id("a/b", "2026-01-15"),
            "a%2Fb-2026-01-15"
        );
    }

    #[test]
    fn test_apply_entry_accumulates() {
        let mut intake = DailyIntake::empty("uid-1", "2026-01-15", "t0");
        intake.apply_entry(&make_entry("e1", "Apple", EntryKind::Food, 95.0), "t1");
        intake.apply_entry(&make_entry("e2", "Apple", EntryKind::Food, 95.0), "t2");
        intake.apply_entry(&make_entry("e3", "Milk", EntryKind::Drink, 120.0), "t3");

        assert_eq!(intake.total_calories, 310.0);
        assert_eq!(intake.total_protein, 30.0);
        assert_eq!(intake.foods["Apple"].servings, 2);
        assert_eq!(intake.foods["Apple"].macros.calories, 190.0);
        assert_eq!(intake.drink_count, 1);
        assert_eq!(intake.entry_count(), 3);
        assert_eq!(intake.updated_at, "t3");
    }

    #[test]
    fn test_apply_entry_is_idempotent() {
        let mut intake = DailyIntake::empty("uid-1", "2026-01-15", "t0");
        let entry = make_entry("e1", "Apple", EntryKind::Food, 95.0);

        assert!(intake.apply_entry(&entry, "t1"));
        assert!(!intake.apply_entry(&entry, "t2"));
        assert_eq!(intake.total_calories, 95.0);
        assert_eq!(intake.updated_at, "t1");
    }

    #[test]
    fn test_remove_entry_reverses_apply() {
        let mut intake = DailyIntake::empty("uid-1", "2026-01-15", "t0");
        let entry = make_entry("e1", "Soup", EntryKind::Food, 250.0);

        intake.apply_entry(&entry, "t1");
        assert!(intake.remove_entry(&entry, "t2"));
        assert!(!intake.remove_entry(&entry, "t3"));

        assert_eq!(intake.total_calories, 0.0);
        assert!(intake.foods.is_empty());
        assert_eq!(intake.entry_count(), 0);
    }

    #[test]
    fn test_emptied_day_has_exact_zero_totals() {
        let mut intake = DailyIntake::empty("uid-1", "2026-01-15", "t0");
        let a = make_entry("e1", "Tea", EntryKind::Drink, 0.1);
        let b = make_entry("e2", "Toast", EntryKind::Food, 0.2);

        intake.apply_entry(&a, "t1");
        intake.apply_entry(&b, "t2");
        intake.remove_entry(&b, "t3");
        intake.remove_entry(&a, "t4");

        assert_eq!(intake.totals(), Macros::default());
        assert_eq!(intake.drink_count, 0);
    }

    #[test]
    fn test_goal_band() {
        let targets = Targets::default();
        let mut intake = DailyIntake::empty("uid-1", "2026-01-15", "t0");

        intake.total_calories = 1700.0;
        assert!(!intake.goal_met(&targets));
        intake.total_calories = 1800.0;
        assert!(intake.goal_met(&targets));
        intake.total_calories = 2200.0;
        assert!(intake.goal_met(&targets));
        intake.total_calories = 2300.0;
        assert!(!intake.goal_met(&targets));
    }

    #[test]
    fn test_recorded_target_survives_target_change() {
        let mut intake = DailyIntake::empty("uid-1", "2026-01-15", "t0");
        intake.total_calories = 1500.0;

        let old = Targets {
            calories: 1500.0,
            ..Targets::default()
        };
        let new = Targets {
            calories: 2500.0,
            ..Targets::default()
        };

        // Older documents are judged by whatever the targets are now.
        assert!(!intake.recorded_goal_met(&new));

        intake.record_targets(&old);
        assert!(intake.recorded_goal_met(&new));
        assert!(!intake.goal_met(&new));
    }

    #[test]
    fn test_progress_remaining_never_negative() {
        let targets = Targets::default();
        let mut intake = DailyIntake::empty("uid-1", "2026-01-15", "t0");
        intake.total_calories = 2500.0;
        intake.total_protein = 25.0;

        let progress = Progress::compute(&intake, &targets);
        assert_eq!(progress.calories.remaining, 0.0);
        assert_eq!(progress.calories.percent, 125.0);
        assert_eq!(progress.protein.remaining, 25.0);
        assert_eq!(progress.protein.percent, 50.0);
        assert!(!progress.goal_met);
    }
}
