// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live intake updates.
//!
//! A subscription delivers the current state of one intake document and
//! then every state written after it, until it is dropped. Channels are
//! keyed by intake document ID and removed once no subscriber is left.

use crate::models::DailyIntake;
use dashmap::DashMap;
use futures_util::Stream;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Updates buffered per intake before slow subscribers start skipping.
const CHANNEL_CAPACITY: usize = 16;

type Channels = Arc<DashMap<String, broadcast::Sender<DailyIntake>>>;

/// Publish/subscribe hub for intake documents.
#[derive(Clone, Default)]
pub struct IntakeFeed {
    channels: Channels,
}

impl IntakeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a user's intake for one day.
    ///
    /// `initial` is delivered first, if given.
    pub fn subscribe(&self, user_id: &str, date: &str, initial: Option<DailyIntake>) -> Subscription {
        let key = DailyIntake::doc_id(user_id, date);
        let receiver = self
            .channels
            .entry(key.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe();

        tracing::debug!(key = %key, "Intake subscription opened");

        Subscription {
            key,
            initial,
            receiver,
            channels: self.channels.clone(),
        }
    }

    /// Join a day's channel, then load its current state with `load`.
    ///
    /// Anything published while `load` runs is still delivered after the
    /// loaded state.
    pub async fn subscribe_with<F, Fut, E>(
        &self,
        user_id: &str,
        date: &str,
        load: F,
    ) -> Result<Subscription, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<DailyIntake, E>>,
    {
        let mut subscription = self.subscribe(user_id, date, None);
        subscription.initial = Some(load().await?);
        Ok(subscription)
    }

    /// Deliver a new intake state to its subscribers.
    ///
    /// Returns the number of subscribers reached.
    pub fn publish(&self, intake: &DailyIntake) -> usize {
        let key = intake.id();
        let Some(sender) = self.channels.get(&key).map(|s| s.value().clone()) else {
            return 0;
        };

        match sender.send(intake.clone()) {
            Ok(count) => count,
            Err(_) => {
                // Everyone left between lookup and send.
                self.channels
                    .remove_if(&key, |_, tx| tx.receiver_count() == 0);
                0
            }
        }
    }

    /// Number of intake documents with live subscribers.
    pub fn active_channels(&self) -> usize {
        self.channels.len()
    }
}

/// A live view of one intake document.
pub struct Subscription {
    key: String,
    initial: Option<DailyIntake>,
    receiver: broadcast::Receiver<DailyIntake>,
    channels: Channels,
}

impl Subscription {
    /// Next intake state, or `None` once the feed is gone.
    ///
    /// A subscriber that falls behind skips straight to newer states.
    pub async fn next(&mut self) -> Option<DailyIntake> {
        if let Some(initial) = self.initial.take() {
            return Some(initial);
        }

        loop {
            match self.receiver.recv().await {
                Ok(intake) => return Some(intake),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(key = %self.key, skipped, "Subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// End the subscription.
    pub fn unsubscribe(self) {}

    /// Convert into a stream of intake states.
    pub fn into_stream(self) -> impl Stream<Item = DailyIntake> + Send {
        futures_util::stream::unfold(self, |mut sub| async move {
            sub.next().await.map(|intake| (intake, sub))
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Our own receiver is still alive here.
        self.channels
            .remove_if(&self.key, |_, tx| tx.receiver_count() <= 1);
        tracing::debug!(key = %self.key, "Intake subscription closed");
    }
}
