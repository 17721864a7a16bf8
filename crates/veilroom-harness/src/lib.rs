//! Deterministic simulation harness for the Veilroom sync engine.
//!
//! Seeded, virtual-time implementations of the engine's I/O seams so that the
//! production [`Runtime`](veilroom_app::Runtime) and
//! [`SyncSession`](veilroom_client::SyncSession) run unchanged and
//! reproducibly in tests.
//!
//! - [`SimEnv`]: seeded ChaCha20 randomness and a virtual clock
//! - [`SimServer`]: in-memory message API (id and timestamp assignment,
//!   since-id paging, room clearing, raw row injection)
//! - [`SimDriver`]: scripted [`Driver`](veilroom_app::Driver) with a pixel
//!   viewport model
//!
//! # Invariant Testing
//!
//! The `invariants` module checks properties that must hold after every step,
//! whatever the scenario. Use [`InvariantRegistry::standard()`] for the
//! common set.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod invariants;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_server;

pub use invariants::{
    ConfirmedHaveServerIds, CursorCoversMessages, Invariant, InvariantRegistry, InvariantResult,
    SessionSnapshot, TimelineMatchesIndex, UniqueServerIds, Violation,
};
pub use sim_driver::{SimDriver, SimDriverError};
pub use sim_env::{SimEnv, SimInstant};
pub use sim_server::{SimServer, SimServerError};
