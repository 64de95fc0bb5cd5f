//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{ClaimOutcome, FirestoreDb};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Per-day aggregates (keyed `{user_id}-{date}`)
    pub const DAILY_INTAKE: &str = "daily_intake";
    pub const NUTRITION_ENTRIES: &str = "nutrition_entries";
    /// Claimed badges (keyed by user_id)
    pub const REWARDS: &str = "rewards";
}
