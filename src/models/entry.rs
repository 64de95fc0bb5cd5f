// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Logged food/drink events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::time_utils::{date_key, local_date};

/// Whether a logged item was eaten or drunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    #[default]
    Food,
    Drink,
}

/// Macronutrient amounts for one item or an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Macros {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl Macros {
    pub fn add(&mut self, other: &Macros) {
        self.calories += other.calories;
        self.protein += other.protein;
        self.fat += other.fat;
        self.carbs += other.carbs;
    }

    /// Subtract, clamping each field at zero.
    pub fn subtract(&mut self, other: &Macros) {
        self.calories = (self.calories - other.calories).max(0.0);
        self.protein = (self.protein - other.protein).max(0.0);
        self.fat = (self.fat - other.fat).max(0.0);
        self.carbs = (self.carbs - other.carbs).max(0.0);
    }
}

/// One logged food or drink, stored in `nutrition_entries`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionEntry {
    /// UUID (also used as document ID)
    pub entry_id: String,
    pub user_id: String,
    pub food_name: String,
    #[serde(default)]
    pub kind: EntryKind,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    /// When the item was consumed
    pub logged_at: DateTime<Utc>,
    /// Calendar day ("YYYY-MM-DD"), denormalized for queries
    pub date: String,
    /// Label suggested by the photo classifier, if one was used
    #[serde(default)]
    pub classified_label: Option<String>,
}

impl NutritionEntry {
    pub fn macros(&self) -> Macros {
        Macros {
            calories: self.calories,
            protein: self.protein,
            fat: self.fat,
            carbs: self.carbs,
        }
    }
}

/// Request body for logging an entry.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewEntry {
    #[validate(length(min = 1, max = 100))]
    pub food_name: String,
    #[serde(default)]
    pub kind: EntryKind,
    #[validate(range(min = 0.0, max = 10000.0))]
    pub calories: f64,
    #[validate(range(min = 0.0, max = 1000.0))]
    #[serde(default)]
    pub protein: f64,
    #[validate(range(min = 0.0, max = 1000.0))]
    #[serde(default)]
    pub fat: f64,
    #[validate(range(min = 0.0, max = 1000.0))]
    #[serde(default)]
    pub carbs: f64,
    /// Defaults to now
    pub logged_at: Option<DateTime<Utc>>,
    /// Client offset east of UTC; picks the calendar day the entry counts
    /// towards. UTC when absent.
    #[validate(range(min = -840, max = 840))]
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
    #[validate(length(max = 100))]
    pub classified_label: Option<String>,
}

impl NewEntry {
    /// Build the stored entry with a fresh ID.
    pub fn into_entry(self, user_id: &str, now: DateTime<Utc>) -> NutritionEntry {
        let logged_at = self.logged_at.unwrap_or(now);
        let date = local_date(logged_at, self.utc_offset_minutes.unwrap_or(0))
            .unwrap_or_else(|| logged_at.date_naive());
        NutritionEntry {
            entry_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            food_name: self.food_name.trim().to_string(),
            kind: self.kind,
            calories: self.calories,
            protein: self.protein,
            fat: self.fat,
            carbs: self.carbs,
            logged_at,
            date: date_key(date),
            classified_label: self.classified_label,
        }
    }
}
