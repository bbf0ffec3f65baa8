//! Callback delivery configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::poll;

/// When the clearing flag set by `clear_storage` is lowered again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClearingPolicy {
    /// Lower the flag on the worker right after the completion is posted.
    /// A `get` issued before the clear callback runs may already succeed.
    #[default]
    AfterPost,
    /// Keep the flag raised until the clear callback is delivered on the
    /// main context.
    UntilDelivered,
}

/// Configuration for mailbox polling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Interval requested from the host scheduler
    pub tick_interval: Duration,
    /// Cancel the host schedule whenever no operation is pending.
    /// Off by default: once started, polling stays on as a cheap idle tick.
    pub stop_when_idle: bool,
    /// Clearing flag lifecycle
    pub clearing_policy: ClearingPolicy,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            tick_interval: poll::DEFAULT_TICK_INTERVAL,
            stop_when_idle: false,
            clearing_policy: ClearingPolicy::AfterPost,
        }
    }
}
