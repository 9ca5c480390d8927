//! Loopback Router
//!
//! Hands phase outputs to a late-bound consumer. Each channel holds at
//! most one callback and at most one pending payload:
//! - with a callback registered, `send` invokes it
//! - without one, or when the callback fails, the payload waits in the
//!   pending slot until `retrieve` takes it
//!
//! Channel ids are plain strings. Use [`channel_id`] to scope them by run
//! so concurrent executions do not read each other's payloads.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use log::{debug, error, info};
use serde_json::Value;

use crate::error::BoxError;

pub type CallbackResult = Result<(), BoxError>;

/// Consumer of payloads sent on a channel.
///
/// Implemented for any `Fn(Value) -> impl Future<Output = CallbackResult>`.
#[async_trait]
pub trait LoopbackCallback: Send + Sync {
    async fn on_response(&self, payload: Value) -> CallbackResult;
}

#[async_trait]
impl<F, Fut> LoopbackCallback for F
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CallbackResult> + Send + 'static,
{
    async fn on_response(&self, payload: Value) -> CallbackResult {
        (self)(payload).await
    }
}

/// Outcome of [`LoopbackRouter::send`].
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// The registered callback accepted the payload
    Delivered,
    /// No callback; payload stored in the pending slot
    Queued,
    /// The callback failed; payload stored in the pending slot
    QueuedAfterFailure(String),
}

/// Builds the channel id for `stage` within one run.
pub fn channel_id(run_id: &str, stage: &str) -> String {
    format!("{}:{}", run_id, stage)
}

#[derive(Default)]
struct Channels {
    callbacks: HashMap<String, Arc<dyn LoopbackCallback>>,
    pending: HashMap<String, Value>,
}

/// Routes payloads to callbacks or pending slots, keyed by channel id.
#[derive(Default)]
pub struct LoopbackRouter {
    channels: Mutex<Channels>,
}

impl LoopbackRouter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Channels> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers the consumer for `channel`, replacing any previous one.
    pub fn register_callback<C>(&self, channel: impl Into<String>, callback: C)
    where
        C: LoopbackCallback + 'static,
    {
        let channel = channel.into();
        self.lock()
            .callbacks
            .insert(channel.clone(), Arc::new(callback));
        info!("Callback registered for channel: {}", channel);
    }

    /// Removes the consumer for `channel`, if any.
    pub fn clear_callback(&self, channel: &str) {
        if self.lock().callbacks.remove(channel).is_some() {
            info!("Callback cleared for channel: {}", channel);
        }
    }

    pub fn has_callback(&self, channel: &str) -> bool {
        self.lock().callbacks.contains_key(channel)
    }

    /// Delivers `payload` on `channel`.
    ///
    /// Never fails: if the callback returns an error the payload is kept
    /// in the pending slot instead. A pending payload that was never
    /// retrieved is overwritten.
    pub async fn send(&self, channel: &str, payload: Value) -> Delivery {
        let callback = self.lock().callbacks.get(channel).cloned();

        let Some(callback) = callback else {
            info!("No callback registered for channel {}; queueing response", channel);
            self.store(channel, payload);
            return Delivery::Queued;
        };

        match callback.on_response(payload.clone()).await {
            Ok(()) => {
                debug!("Response processed for channel: {}", channel);
                Delivery::Delivered
            }
            Err(e) => {
                error!("Error processing response for channel {}: {}", channel, e);
                self.store(channel, payload);
                Delivery::QueuedAfterFailure(e.to_string())
            }
        }
    }

    fn store(&self, channel: &str, payload: Value) {
        if self
            .lock()
            .pending
            .insert(channel.to_string(), payload)
            .is_some()
        {
            debug!("Overwrote unclaimed response on channel: {}", channel);
        }
    }

    /// Takes the pending payload for `channel`. A second call returns
    /// `None` until something new is queued.
    pub fn retrieve(&self, channel: &str) -> Option<Value> {
        self.lock().pending.remove(channel)
    }

    /// Drops every pending payload and callback scoped to `run_id`.
    ///
    /// Returns the number of pending payloads discarded.
    pub fn clear_run(&self, run_id: &str) -> usize {
        let prefix = channel_id(run_id, "");
        let mut channels = self.lock();

        let before = channels.pending.len();
        channels.pending.retain(|channel, _| !channel.starts_with(&prefix));
        channels.callbacks.retain(|channel, _| !channel.starts_with(&prefix));
        let dropped = before - channels.pending.len();

        if dropped > 0 {
            debug!("Dropped {} unclaimed response(s) for run {}", dropped, run_id);
        }
        dropped
    }

    /// Channels that currently hold a pending payload, sorted.
    pub fn pending_channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self.lock().pending.keys().cloned().collect();
        channels.sort();
        channels
    }
}

impl std::fmt::Debug for LoopbackRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let channels = self.lock();
        f.debug_struct("LoopbackRouter")
            .field("callbacks", &channels.callbacks.len())
            .field("pending", &channels.pending.len())
            .finish()
    }
}
