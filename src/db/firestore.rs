// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile and targets)
//! - Daily intake aggregates (one document per user per day)
//! - Nutrition entries (individual logged items)
//! - Rewards (claimed badges)

use crate::db::collections;
use crate::error::AppError;
use crate::models::badge::BadgeDef;
use crate::models::{DailyIntake, NutritionEntry, RewardLedger, User};
use firestore::errors::{BackoffError, FirestoreError};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Result of a reward claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Coins were credited; carries the new balance.
    Claimed { coins: u32 },
    /// The badge had already been claimed; balance unchanged.
    AlreadyClaimed { coins: u32 },
}

/// What a transactional read-modify-write found.
enum TxOutcome<T> {
    /// A document the write depends on does not exist.
    Missing,
    /// Nothing needed writing.
    Unchanged(T),
    Written(T),
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by account ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or overwrite a user profile.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.user_id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Atomically create a profile and its first (empty) intake document.
    pub async fn create_profile(&self, user: &User, intake: &DailyIntake) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.user_id)
            .object(user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add user to transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::DAILY_INTAKE)
            .document_id(intake.id())
            .object(intake)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add intake to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(user_id = %user.user_id, "Profile created");
        Ok(())
    }

    // ─── Intake Operations ───────────────────────────────────────

    /// Get a user's intake for one day.
    pub async fn get_intake(
        &self,
        user_id: &str,
        date: &str,
    ) -> Result<Option<DailyIntake>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::DAILY_INTAKE)
            .obj()
            .one(&DailyIntake::doc_id(user_id, date))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Overwrite an intake document.
    pub async fn set_intake(&self, intake: &DailyIntake) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::DAILY_INTAKE)
            .document_id(intake.id())
            .object(intake)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get a user's intakes between two day keys (inclusive), oldest first.
    pub async fn get_intakes_in_range(
        &self,
        user_id: &str,
        from: &str,
        to: &str,
    ) -> Result<Vec<DailyIntake>, AppError> {
        let user_id = user_id.to_string();
        let from = from.to_string();
        let to = to.to_string();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::DAILY_INTAKE)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("date").greater_than_or_equal(from.clone()),
                    q.field("date").less_than_or_equal(to.clone()),
                ])
            })
            .order_by([("date", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get every intake document for a user, oldest first.
    pub async fn get_all_intakes(&self, user_id: &str) -> Result<Vec<DailyIntake>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::DAILY_INTAKE)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .order_by([("date", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Entry Operations ────────────────────────────────────────

    /// Get an entry by ID.
    pub async fn get_entry(&self, entry_id: &str) -> Result<Option<NutritionEntry>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::NUTRITION_ENTRIES)
            .obj()
            .one(entry_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user's entries for one day, in the order they were consumed.
    pub async fn get_entries_for_day(
        &self,
        user_id: &str,
        date: &str,
    ) -> Result<Vec<NutritionEntry>, AppError> {
        let user_id = user_id.to_string();
        let date = date.to_string();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::NUTRITION_ENTRIES)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("date").eq(date.clone()),
                ])
            })
            .order_by([("logged_at", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user's entries between two day keys (inclusive), oldest first.
    pub async fn get_entries_in_range(
        &self,
        user_id: &str,
        from: &str,
        to: &str,
    ) -> Result<Vec<NutritionEntry>, AppError> {
        let user_id = user_id.to_string();
        let from = from.to_string();
        let to = to.to_string();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::NUTRITION_ENTRIES)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("date").greater_than_or_equal(from.clone()),
                    q.field("date").less_than_or_equal(to.clone()),
                ])
            })
            .order_by([
                ("date", firestore::FirestoreQueryDirection::Ascending),
                ("logged_at", firestore::FirestoreQueryDirection::Ascending),
            ])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Atomically store an entry and fold it into that day's intake.
    ///
    /// The intake is created if it does not exist yet. Reads happen inside
    /// the transaction, so concurrent writers to the same day are retried
    /// rather than overwriting each other. Returns the updated intake.
    pub async fn log_entry_atomic(&self, entry: &NutritionEntry) -> Result<DailyIntake, AppError> {
        let outcome = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let entry = entry.clone();
                Box::pin(async move {
                    let now = chrono::Utc::now().to_rfc3339();

                    // Don't write entries for an account whose profile is gone.
                    let user: Option<User> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(&entry.user_id)
                        .await?;
                    let Some(user) = user else {
                        return Ok(TxOutcome::Missing);
                    };

                    let stored: Option<DailyIntake> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::DAILY_INTAKE)
                        .obj()
                        .one(&DailyIntake::doc_id(&entry.user_id, &entry.date))
                        .await?;
                    let mut intake = stored
                        .unwrap_or_else(|| DailyIntake::empty(&entry.user_id, &entry.date, &now));

                    if !intake.apply_entry(&entry, &now) {
                        return Ok(TxOutcome::Unchanged(intake));
                    }
                    intake.record_targets(&user.targets);

                    db.fluent()
                        .update()
                        .in_col(collections::NUTRITION_ENTRIES)
                        .document_id(&entry.entry_id)
                        .object(&entry)
                        .add_to_transaction(transaction)?;

                    db.fluent()
                        .update()
                        .in_col(collections::DAILY_INTAKE)
                        .document_id(intake.id())
                        .object(&intake)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(TxOutcome::Written(intake))
                })
            })
            .await
            .map_err(|e| AppError::Database(format!("Entry transaction failed: {}", e)))?;

        match outcome {
            TxOutcome::Missing => {
                tracing::warn!(user_id = %entry.user_id, "User not found, refusing to log entry");
                Err(AppError::NotFound(format!("User {} not found", entry.user_id)))
            }
            TxOutcome::Unchanged(intake) => {
                tracing::debug!(entry_id = %entry.entry_id, "Entry already applied (idempotent skip)");
                Ok(intake)
            }
            TxOutcome::Written(intake) => {
                tracing::info!(
                    user_id = %entry.user_id,
                    entry_id = %entry.entry_id,
                    date = %entry.date,
                    calories = entry.calories,
                    "Entry logged"
                );
                Ok(intake)
            }
        }
    }

    /// Atomically delete an entry and subtract it from its day's intake.
    pub async fn delete_entry_atomic(
        &self,
        entry: &NutritionEntry,
    ) -> Result<Option<DailyIntake>, AppError> {
        let intake = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let entry = entry.clone();
                Box::pin(async move {
                    let now = chrono::Utc::now().to_rfc3339();

                    let user: Option<User> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(&entry.user_id)
                        .await?;
                    let mut intake: Option<DailyIntake> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::DAILY_INTAKE)
                        .obj()
                        .one(&DailyIntake::doc_id(&entry.user_id, &entry.date))
                        .await?;

                    db.fluent()
                        .delete()
                        .from(collections::NUTRITION_ENTRIES)
                        .document_id(&entry.entry_id)
                        .add_to_transaction(transaction)?;

                    if let Some(intake) = intake.as_mut() {
                        if intake.remove_entry(&entry, &now) {
                            if let Some(user) = &user {
                                intake.record_targets(&user.targets);
                            }
                            db.fluent()
                                .update()
                                .in_col(collections::DAILY_INTAKE)
                                .document_id(intake.id())
                                .object(&*intake)
                                .add_to_transaction(transaction)?;
                        }
                    }

                    Ok::<_, BackoffError<FirestoreError>>(intake)
                })
            })
            .await
            .map_err(|e| AppError::Database(format!("Entry deletion failed: {}", e)))?;

        tracing::info!(
            user_id = %entry.user_id,
            entry_id = %entry.entry_id,
            "Entry deleted"
        );

        Ok(intake)
    }

    // ─── Reward Operations ───────────────────────────────────────

    /// Get the reward ledger for a user.
    pub async fn get_rewards(&self, user_id: &str) -> Result<Option<RewardLedger>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::REWARDS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Atomically mark a badge claimed and credit its coins.
    ///
    /// The caller must have checked that the badge is earned. The ledger is
    /// read inside the transaction, so racing claims credit the coins once.
    pub async fn claim_reward_atomic(
        &self,
        user_id: &str,
        badge: &BadgeDef,
    ) -> Result<ClaimOutcome, AppError> {
        let outcome = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let user_id = user_id.to_string();
                let badge = *badge;
                Box::pin(async move {
                    let now = chrono::Utc::now().to_rfc3339();

                    let user: Option<User> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(&user_id)
                        .await?;
                    let Some(mut user) = user else {
                        return Ok(TxOutcome::Missing);
                    };

                    let stored: Option<RewardLedger> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::REWARDS)
                        .obj()
                        .one(&user_id)
                        .await?;
                    let mut ledger = stored.unwrap_or_else(|| RewardLedger {
                        user_id: user_id.clone(),
                        ..Default::default()
                    });

                    if !ledger.claimed.insert(badge.id.to_string()) {
                        return Ok(TxOutcome::Unchanged(user.coins));
                    }
                    ledger.updated_at = now.clone();

                    user.coins = user.coins.saturating_add(badge.coins);
                    user.updated_at = now;

                    db.fluent()
                        .update()
                        .in_col(collections::REWARDS)
                        .document_id(&user_id)
                        .object(&ledger)
                        .add_to_transaction(transaction)?;

                    db.fluent()
                        .update()
                        .in_col(collections::USERS)
                        .document_id(&user_id)
                        .object(&user)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(TxOutcome::Written(user.coins))
                })
            })
            .await
            .map_err(|e| AppError::Database(format!("Reward transaction failed: {}", e)))?;

        match outcome {
            TxOutcome::Missing => Err(AppError::NotFound(format!("User {} not found", user_id))),
            TxOutcome::Unchanged(coins) => Ok(ClaimOutcome::AlreadyClaimed { coins }),
            TxOutcome::Written(coins) => {
                tracing::info!(user_id, badge = badge.id, coins, "Reward claimed");
                Ok(ClaimOutcome::Claimed { coins })
            }
        }
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    // ─── Account Deletion ─────────────────────────────────────────

    /// Delete ALL data for a user.
    ///
    /// Deletes from all collections:
    /// - `nutrition_entries` (query by user_id)
    /// - `daily_intake` (query by user_id)
    /// - `rewards/{user_id}`
    /// - `users/{user_id}`
    ///
    /// Returns the number of documents deleted.
    pub async fn delete_user_data(&self, user_id: &str) -> Result<usize, AppError> {
        let mut deleted_count = 0;
        let owner = user_id.to_string();

        // 1. Delete all entries
        let entries: Vec<NutritionEntry> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::NUTRITION_ENTRIES)
            .filter(move |q| q.for_all([q.field("user_id").eq(owner.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let count = entries.len();
        self.batch_delete(
            &entries,
            collections::NUTRITION_ENTRIES,
            |entry: &NutritionEntry| entry.entry_id.clone(),
        )
        .await?;

        deleted_count += count;
        tracing::debug!(user_id, count, "Deleted nutrition entries");

        // 2. Delete all daily intakes
        let intakes = self.get_all_intakes(user_id).await?;
        let count = intakes.len();
        self.batch_delete(&intakes, collections::DAILY_INTAKE, |intake: &DailyIntake| {
            intake.id()
        })
        .await?;

        deleted_count += count;
        tracing::debug!(user_id, count, "Deleted daily intakes");

        // 3. Delete reward ledger
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::REWARDS)
            .document_id(user_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        deleted_count += 1;
        tracing::debug!(user_id, "Deleted reward ledger");

        // 4. Delete user profile
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(user_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        deleted_count += 1;
        tracing::debug!(user_id, "Deleted user profile");

        tracing::info!(user_id, deleted_count, "User data deletion complete");

        Ok(deleted_count)
    }
}
