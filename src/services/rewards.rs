// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Badge evaluation and coin rewards.

use crate::db::{ClaimOutcome, FirestoreDb};
use crate::error::{AppError, Result};
use crate::models::badge::{evaluate, find_badge, BADGES};
use crate::models::{BadgeStatus, RewardLedger};
use crate::services::tracking::summarize;
use std::collections::BTreeSet;

/// Computes earned badges and credits claimed rewards.
#[derive(Clone)]
pub struct RewardService {
    db: FirestoreDb,
}

impl RewardService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    async fn earned(&self, user_id: &str) -> Result<BTreeSet<&'static str>> {
        let user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        let history = self.db.get_all_intakes(user_id).await?;
        Ok(evaluate(&summarize(&history, &user.targets)))
    }

    /// Every badge with its earned/claimed state.
    pub async fn badges(&self, user_id: &str) -> Result<Vec<BadgeStatus>> {
        let earned = self.earned(user_id).await?;
        let ledger = self.db.get_rewards(user_id).await?.unwrap_or_default();
        Ok(badge_statuses(&earned, &ledger))
    }

    /// Claim the coins for an earned badge.
    pub async fn claim(&self, user_id: &str, badge_id: &str) -> Result<ClaimOutcome> {
        let badge = find_badge(badge_id)
            .ok_or_else(|| AppError::NotFound(format!("Badge {} not found", badge_id)))?;

        if !self.earned(user_id).await?.contains(badge.id) {
            // A claimed badge stays claimed even if history no longer earns it.
            let ledger = self.db.get_rewards(user_id).await?.unwrap_or_default();
            if !ledger.claimed.contains(badge.id) {
                return Err(AppError::Conflict(format!(
                    "Badge {} has not been earned",
                    badge.id
                )));
            }
        }

        self.db.claim_reward_atomic(user_id, badge).await
    }
}

fn badge_statuses(earned: &BTreeSet<&'static str>, ledger: &RewardLedger) -> Vec<BadgeStatus> {
    BADGES
        .iter()
        .map(|b| BadgeStatus {
            id: b.id.to_string(),
            title: b.title.to_string(),
            description: b.description.to_string(),
            coins: b.coins,
            earned: earned.contains(b.id) || ledger.claimed.contains(b.id),
            claimed: ledger.claimed.contains(b.id),
        })
        .collect()
}
