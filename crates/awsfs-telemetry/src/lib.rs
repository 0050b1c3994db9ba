//! Log sink wiring for awsfs.
//!
//! Builds a `tracing` subscriber with a stderr layer and an optional file
//! layer, and hands it back as an explicit [`Telemetry`] handle instead of
//! installing a global default. Callers scope work with
//! `tracing::dispatcher::with_default(telemetry.dispatch(), ..)`.
//!
//! # Configuration
//!
//! ```ron
//! (
//!     filter: "info,awsfs_vfs=debug",
//!     log_dir: Some("/var/log/awsfs"),
//!     file_name: "awsfs.log",
//!     stderr: false,
//! )
//! ```
//!
//! `RUST_LOG`, when set, overrides `filter` unless `env_override` is false.

mod capture;
mod sinks;

pub use capture::CaptureWriter;
pub use sinks::{LogConfig, Telemetry, TelemetryError};
