// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Execution tracing
//!
//! Records a Chrome trace (viewable in `chrome://tracing` or
//! <https://ui.perfetto.dev>) of everything a wrapped function emits through
//! `tracing` spans and events.
//!
//! The trace layer is installed as the thread-default dispatcher for the
//! duration of the call only, so it never interferes with a global
//! subscriber the host program has set up.
//!
//! ```rust,no_run
//! use bmd_perf::{HostProgram, LogConfig, TracerOptions, viztrace};
//!
//! fn crunch(n: u64) -> u64 {
//!     let _span = tracing::info_span!("crunch", n).entered();
//!     (0..n).sum()
//! }
//!
//! let config = LogConfig::new("logs", HostProgram::named("demo"));
//! let sum = viztrace(&config, "crunch", &TracerOptions::default(), || crunch(1_000))?;
//! # Ok::<(), bmd_perf::PerfError>(())
//! ```

use std::cell::Cell;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Dispatch;
use tracing_chrome::{ChromeLayerBuilder, FlushGuard, TraceStyle};
use tracing_subscriber::Registry;
use tracing_subscriber::prelude::*;

use crate::config::{LogConfig, resolved};
use crate::error::{PerfError, PerfResult};
use crate::output::Sink;
use crate::session::{Recorder, run_recorded};

thread_local! {
    static TRACER_ACTIVE: Cell<bool> = const { Cell::new(false) };
}

/// How spans are laid out in the trace viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceMode {
    /// One track per OS thread
    #[default]
    Threaded,
    /// One track per top-level span, for async code
    Async,
}

impl From<TraceMode> for TraceStyle {
    fn from(mode: TraceMode) -> Self {
        match mode {
            TraceMode::Threaded => TraceStyle::Threaded,
            TraceMode::Async => TraceStyle::Async,
        }
    }
}

/// Options forwarded to the trace recorder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TracerOptions {
    /// Record span and event fields as trace arguments
    pub include_args: bool,
    /// Record source file and line of each span
    pub include_locations: bool,
    /// Track layout
    pub trace_style: TraceMode,
    /// Output file extension
    pub extension: String,
}

impl Default for TracerOptions {
    fn default() -> Self {
        Self {
            include_args: true,
            include_locations: true,
            trace_style: TraceMode::Threaded,
            extension: "json".to_string(),
        }
    }
}

impl TracerOptions {
    /// Decode options from a JSON mapping; missing keys keep their defaults
    pub fn from_value(value: &Value) -> PerfResult<Self> {
        Ok(Self::deserialize(value)?)
    }
}

struct ChromeTrace {
    dispatch: Dispatch,
    flush: FlushGuard,
    function: String,
    path: PathBuf,
    announce: Sink,
}

impl ChromeTrace {
    fn start(config: &LogConfig, function: &str, options: &TracerOptions) -> PerfResult<Self> {
        if TRACER_ACTIVE.with(Cell::get) {
            return Err(PerfError::SessionActive);
        }

        let (path, file) =
            config.create_log_file(&config.trace_dir(), function, &options.extension)?;

        let (layer, flush) = ChromeLayerBuilder::<Registry>::new()
            .writer(file)
            .include_args(options.include_args)
            .include_locations(options.include_locations)
            .trace_style(options.trace_style.into())
            .build();
        let dispatch = Dispatch::new(tracing_subscriber::registry().with(layer));

        TRACER_ACTIVE.with(|active| active.set(true));
        Ok(Self {
            dispatch,
            flush,
            function: function.to_string(),
            path,
            announce: config.announce.clone(),
        })
    }
}

impl Recorder for ChromeTrace {
    fn enter<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        tracing::dispatcher::with_default(&self.dispatch, || {
            tracing::info_span!("viztrace", function = %self.function).in_scope(f)
        })
    }

    fn finish(self) -> PerfResult<()> {
        let ChromeTrace {
            dispatch,
            flush,
            path,
            announce,
            ..
        } = self;

        // stop, then save and terminate the writer thread
        drop(dispatch);
        flush.flush();
        drop(flush);
        TRACER_ACTIVE.with(|active| active.set(false));

        let path = resolved(&path);
        tracing::info!(path = %path.display(), "trace saved");
        announce.emit(&format!("trace saved to {}", path.display()));
        Ok(())
    }
}

/// Record an execution trace of `f`
///
/// The trace is written to
/// `<log_root>/viztracer/<host name>/<function>_<unix seconds>.<ext>`.
/// The file is saved whether `f` returns or panics, and `f`'s value is
/// returned unchanged.
///
/// # Errors
///
/// Fails if the log directory or file cannot be created, or with
/// [`PerfError::SessionActive`] if a trace is already running on this thread.
pub fn viztrace<F, R>(
    config: &LogConfig,
    function: &str,
    options: &TracerOptions,
    f: F,
) -> PerfResult<R>
where
    F: FnOnce() -> R,
{
    let trace = ChromeTrace::start(config, function, options)?;
    run_recorded("viztrace", trace, f)
}

/// Trace a function call, naming the output after the function
///
/// ```rust,no_run
/// use bmd_perf::{HostProgram, LogConfig, TracerOptions};
///
/// fn add(a: i32, b: i32) -> i32 {
///     a + b
/// }
///
/// let config = LogConfig::new("logs", HostProgram::named("demo"));
/// let sum = bmd_perf::viztrace!(config, add(2, 3))?;
///
/// let options = TracerOptions { include_args: false, ..Default::default() };
/// let sum = bmd_perf::viztrace!(config, options, add(2, 3))?;
/// # Ok::<(), bmd_perf::PerfError>(())
/// ```
#[macro_export]
macro_rules! viztrace {
    ($config:expr, $($func:ident)::+ ( $($arg:expr),* $(,)? )) => {
        $crate::tracer::viztrace(
            &$config,
            $crate::timer::function_label(stringify!($($func)::+)),
            &$crate::tracer::TracerOptions::default(),
            || $($func)::+($($arg),*),
        )
    };
    ($config:expr, $options:expr, $($func:ident)::+ ( $($arg:expr),* $(,)? )) => {
        $crate::tracer::viztrace(
            &$config,
            $crate::timer::function_label(stringify!($($func)::+)),
            &$options,
            || $($func)::+($($arg),*),
        )
    };
}
