//! Terminal client for Veilroom
//!
//! A thin shell over [`veilroom_app::Driver`] that provides terminal I/O,
//! room links, client state on disk and the production environment. All
//! orchestration lives in the generic [`veilroom_app::Runtime`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod format;
pub mod location;
pub mod storage;
pub mod system_env;
pub mod terminal;

pub use location::UrlLocation;
pub use storage::FileStorage;
pub use system_env::SystemEnv;
pub use terminal::{TerminalDriver, TerminalError};
pub use veilroom_app::{Driver, Runtime};
