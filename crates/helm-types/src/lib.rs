//! Foundation types for HELM.
//!
//! This crate contains the types shared by the console engine and the
//! binaries that host it: access levels, the output sink trait, the
//! console configuration, and error types.

pub mod access;
pub mod config;
pub mod error;
pub mod sink;

pub use access::AccessLevel;
pub use config::ConsoleConfig;
pub use error::{HelmError, Result};
pub use sink::{BufferSink, ConsoleSink, StdoutSink};
