// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod feed;
pub mod rewards;
pub mod tracking;

pub use feed::{IntakeFeed, Subscription};
pub use rewards::RewardService;
pub use tracking::TrackingService;
