//! Main-context callback delivery
//!
//! Completions produced on worker tasks travel through the [`Mailbox`] and
//! are invoked only when the host ticks the coordinator. The
//! [`PollController`] counts outstanding completions and asks the host's
//! [`TickScheduler`] to start ticking when the first one appears.
//!
//! # Module Organization
//!
//! - [`config`] - polling and clearing-flag settings
//! - [`mailbox`] - the cross-thread completion queue
//! - [`poll`] - pending-operation counter
//! - [`scheduler`] - host scheduler capability

pub mod config;
pub mod mailbox;
pub mod poll;
pub mod scheduler;

pub use config::{ClearingPolicy, PollConfig};
pub use mailbox::{Callback, Mailbox, MailboxEntry};
pub use poll::PollController;
pub use scheduler::{ManualScheduler, TickScheduler};
