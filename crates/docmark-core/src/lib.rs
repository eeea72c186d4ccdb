//! docmark Core — error taxonomy, worker configuration, data directories.

pub mod config;
pub mod error;

pub use config::{DataPaths, WorkerConfig};
pub use error::{Error, Result};
