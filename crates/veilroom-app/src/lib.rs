//! Application layer for Veilroom
//!
//! A generic runtime that connects a [`SyncSession`](veilroom_client::SyncSession)
//! to a platform frontend, so the same orchestration runs in the terminal
//! client and in deterministic simulation.
//!
//! # Components
//!
//! - [`Timeline`]: view model of the message list (what a frontend renders)
//! - [`Driver`]: trait for platform-specific I/O
//! - [`DriverEvent`]: input from the frontend and the transport
//! - [`Runtime`]: single-writer orchestration loop using Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod driver;
mod event;
mod runtime;
mod timeline;

pub use driver::Driver;
pub use event::DriverEvent;
pub use runtime::Runtime;
pub use timeline::{ConnectionStatus, Timeline, TimelineEntry};
