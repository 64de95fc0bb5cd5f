// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod badge;
pub mod entry;
pub mod intake;
pub mod user;

pub use badge::{BadgeStatus, RewardLedger};
pub use entry::{EntryKind, Macros, NewEntry, NutritionEntry};
pub use intake::{DailyIntake, Progress};
pub use user::{Gender, NewProfile, ProfileUpdate, Targets, User};
