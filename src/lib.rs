//! # Scoreboard placement monitor
//!
//! Polls a competition scoreboard on a fixed delay, ranks every watched
//! team within its peer group, and notifies the subscribed channels when a
//! team's peer-relative placement changes.
//!
//! ## Module Organization
//!
//! - `scoreboard` - Snapshot model, peer filters, rank computation, provider
//! - `registry` - Subscription registry (guild → channel → teams)
//! - `scheduler` - Cancellable fixed-delay task driver with state threading
//! - `monitor` - Placement change task body and tick state
//! - `notify` - Announcement text, detail payload, delivery
//! - `status` - Status line refresh task
//! - `config` - Environment configuration

pub mod config;
pub mod error;
pub mod monitor;
pub mod notify;
pub mod registry;
pub mod scheduler;
pub mod scoreboard;
pub mod status;

pub use error::MonitorError;
pub use monitor::{PlacementMonitor, TickReport, TickState};
pub use scheduler::{PeriodicTask, Shutdown, TaskHandle, TaskStats, TickTask};
