// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile and daily targets.

use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Gender as recorded on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Unspecified,
}

/// Daily nutrition goals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Targets {
    /// Calories (kcal)
    #[validate(range(min = 0.0, max = 20000.0))]
    pub calories: f64,
    /// Fat (g)
    #[validate(range(min = 0.0, max = 2000.0))]
    pub fat: f64,
    /// Protein (g)
    #[validate(range(min = 0.0, max = 2000.0))]
    pub protein: f64,
    /// Carbohydrates (g)
    #[validate(range(min = 0.0, max = 2000.0))]
    pub carbs: f64,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            calories: 2000.0,
            fat: 70.0,
            protein: 50.0,
            carbs: 260.0,
        }
    }
}

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Account ID from the identity provider (also used as document ID)
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Gender,
    /// Reward coin balance
    #[serde(default)]
    pub coins: u32,
    /// Minutes between logging reminders (0 disables reminders)
    #[serde(default)]
    pub reminder_interval_minutes: u32,
    #[serde(default)]
    pub targets: Targets,
    /// When the profile was created (RFC 3339)
    pub created_at: String,
    /// Last profile change (RFC 3339)
    pub updated_at: String,
}

/// Registration request body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewProfile {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(range(min = 1, max = 130))]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Gender,
    #[validate(range(max = 1440))]
    #[serde(default)]
    pub reminder_interval_minutes: u32,
    #[validate(nested)]
    pub targets: Option<Targets>,
}

impl NewProfile {
    /// Build the stored profile for `user_id`.
    pub fn into_user(self, user_id: &str, now: &str) -> User {
        User {
            user_id: user_id.to_string(),
            name: self.name,
            email: self.email,
            age: self.age,
            gender: self.gender,
            coins: 0,
            reminder_interval_minutes: self.reminder_interval_minutes,
            targets: self.targets.unwrap_or_default(),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }
}

/// Partial profile update; only provided fields change.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(range(min = 1, max = 130))]
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    #[validate(range(max = 1440))]
    pub reminder_interval_minutes: Option<u32>,
    #[validate(nested)]
    pub targets: Option<Targets>,
}

impl ProfileUpdate {
    /// Apply to `user`. Returns `true` if anything changed.
    pub fn apply(self, user: &mut User, now: &str) -> bool {
        let mut changed = false;

        if let Some(name) = self.name {
            changed |= user.name != name;
            user.name = name;
        }
        if let Some(email) = self.email {
            changed |= user.email.as_deref() != Some(email.as_str());
            user.email = Some(email);
        }
        if let Some(age) = self.age {
            changed |= user.age != Some(age);
            user.age = Some(age);
        }
        if let Some(gender) = self.gender {
            changed |= user.gender != gender;
            user.gender = gender;
        }
        if let Some(interval) = self.reminder_interval_minutes {
            changed |= user.reminder_interval_minutes != interval;
            user.reminder_interval_minutes = interval;
        }
        if let Some(targets) = self.targets {
            changed |= user.targets != targets;
            user.targets = targets;
        }

        if changed {
            user.updated_at = now.to_string();
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        NewProfile {
            name: "Ada".to_string(),
            email: Some("ada@example.com".to_string()),
            age: Some(36),
            gender: Gender::Female,
            reminder_interval_minutes: 120,
            targets: None,
        }
        .into_user("uid-1", "2026-01-01T00:00:00Z")
    }

    #[test]
    fn test_new_profile_defaults_targets() {
        let user = sample_user();
        assert_eq!(user.user_id, "uid-1");
        assert_eq!(user.coins, 0);
        assert_eq!(user.targets, Targets::default());
    }

    #[test]
    fn test_partial_update_only_touches_given_fields() {
        let mut user = sample_user();
        let update = ProfileUpdate {
            age: Some(37),
            ..Default::default()
        };

        assert!(update.apply(&mut user, "2026-02-01T00:00:00Z"));
        assert_eq!(user.age, Some(37));
        assert_eq!(user.name, "Ada");
        assert_eq!(user.updated_at, "2026-02-01T00:00:00Z");
    }

    #[test]
    fn test_noop_update_keeps_timestamp() {
        let mut user = sample_user();
        let update = ProfileUpdate {
            name: Some("Ada".to_string()),
            ..Default::default()
        };

        assert!(!update.apply(&mut user, "2026-02-01T00:00:00Z"));
        assert_eq!(user.updated_at, "2026-01-01T00:00:00Z");
    }

    #[test]
    fn test_profile_validation() {
        let bad = ProfileUpdate {
            email: Some("not-an-email".to_string()),
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad_targets = ProfileUpdate {
            targets: Some(Targets {
                calories: -5.0,
                ..Targets::default()
            }),
            ..Default::default()
        };
        assert!(bad_targets.validate().is_err());
    }

    #[test]
    fn test_gender_wire_format() {
        let json = serde_json::to_string(&Gender::Unspecified).unwrap();
        assert_eq!(json, "\"unspecified\"");
        let parsed: Gender = serde_json::from_str("\"female\"").unwrap();
        assert_eq!(parsed, Gender::Female);
    }
}
