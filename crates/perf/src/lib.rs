// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # bmd-perf - timing, tracing and profiling wrappers
//!
//! Small helpers that measure or record what a single function call does:
//!
//! - [`timed`] / [`timed!`]: wall-clock time of one call, printed as
//!   `label: 1.2 ms`
//! - [`TimedCtx`] / [`timed_scope!`]: wall-clock time of a scoped block
//! - [`viztrace`] / [`viztrace!`]: Chrome execution trace of one call
//! - [`profile`] / [`profile!`]: sampled call-graph profile of one call
//!
//! None of these implement measurement themselves. They start and stop an
//! existing facility (`std::time::Instant`, `tracing-chrome`, `pprof`) around
//! the call and write the result somewhere predictable.
//!
//! ## Output layout
//!
//! ```text
//! <log_root>/viztracer/<host name>/<function>_<unix seconds>.json
//! <log_root>/cprofile/<host stem>/<function>_<unix seconds>.prof
//! ```
//!
//! The host program is named explicitly through [`HostProgram`] and
//! [`LogConfig`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bmd_perf::{HostProgram, LogConfig};
//!
//! fn add(a: i32, b: i32) -> i32 {
//!     a + b
//! }
//!
//! let sum = bmd_perf::timed!(add(2, 3)); // "add: 310.0 ns"
//!
//! let config = LogConfig::new("logs", HostProgram::from_path(file!())?);
//! let sum = bmd_perf::profile!(config, add(2, 3))?;
//! let sum = bmd_perf::viztrace!(config, add(2, 3))?;
//! # Ok::<(), bmd_perf::PerfError>(())
//! ```
//!
//! ## Failure behaviour
//!
//! - The wrapped function's return value, including any `Result`, is passed
//!   back untouched.
//! - Trace and profile sessions are finished exactly once on every exit
//!   path; if the wrapped function panics the output file is still written
//!   before the panic continues.
//! - Errors from the wrappers themselves (directory creation, recorder
//!   start/stop) are reported as [`PerfError`].
//!
//! ## Features
//!
//! - `tracer` (default): [`viztrace`] via `tracing-chrome`
//! - `profiler` (default): [`profile`] via `pprof`
//! - `flamegraph`: SVG flamegraph output for [`profile`]

pub mod config;
pub mod error;
pub mod logging;
pub mod output;
#[cfg(any(feature = "tracer", feature = "profiler"))]
pub(crate) mod session;
pub mod timer;
pub mod units;

#[cfg(feature = "profiler")]
pub mod profiler;
#[cfg(feature = "tracer")]
pub mod tracer;

// Re-exports for convenience
pub use config::{CollisionPolicy, HostProgram, LogConfig};
pub use error::{PerfError, PerfResult};
pub use output::Sink;
pub use timer::{TimedCtx, timed, timed_with};
pub use units::{CompactDuration, format_timing};

#[cfg(feature = "profiler")]
pub use profiler::{ProfileFormat, ProfilerOptions, profile};
#[cfg(feature = "tracer")]
pub use tracer::{TraceMode, TracerOptions, viztrace};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
