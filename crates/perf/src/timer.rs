// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Wall-clock timing of single calls and scoped blocks
//!
//! # Example
//!
//! ```
//! use bmd_perf::{Sink, TimedCtx};
//!
//! fn add(a: i32, b: i32) -> i32 {
//!     a + b
//! }
//!
//! // prints "add: 1.2 µs" (or similar)
//! assert_eq!(bmd_perf::timed!(add(2, 3)), 5);
//!
//! {
//!     let _ctx = TimedCtx::new("setup").with_sink(Sink::Null);
//!     // ... do work ...
//! } // reported when dropped
//! ```

use std::time::{Duration, Instant};

use crate::output::Sink;
use crate::units::format_timing;

/// Time a single call to `f` and print `label: <duration>` to stdout
///
/// The return value passes through unchanged. If `f` panics nothing is
/// reported.
pub fn timed<F, R>(label: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    timed_with(label, &Sink::default(), f)
}

/// Like [`timed`], reporting to `sink`
pub fn timed_with<F, R>(label: &str, sink: &Sink, f: F) -> R
where
    F: FnOnce() -> R,
{
    let start = Instant::now();
    let value = f();
    let elapsed = start.elapsed();

    sink.emit(&format_timing(label, elapsed));
    value
}

/// A scoped timer that reports the time spent inside its scope
///
/// Reports when dropped, including while unwinding from a panic. The panic
/// itself is never caught.
#[derive(Debug)]
pub struct TimedCtx {
    label: String,
    sink: Sink,
    verbose: bool,
    armed: bool,
    start: Instant,
}

impl TimedCtx {
    /// Start a new scoped timer reporting to stdout
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            sink: Sink::Stdout,
            verbose: true,
            armed: true,
            start: Instant::now(),
        }
    }

    /// Report to `sink` instead of stdout
    pub fn with_sink(mut self, sink: Sink) -> Self {
        self.sink = sink;
        self
    }

    /// Enable or disable reporting
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Label used in the report line
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Time elapsed since the timer started
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer now, report once and return the elapsed time
    pub fn finish(mut self) -> Duration {
        let elapsed = self.elapsed();
        self.report(elapsed);
        self.armed = false;
        elapsed
    }

    fn report(&self, elapsed: Duration) {
        if !self.verbose || self.sink.is_null() {
            return;
        }
        self.sink.emit(&format_timing(&self.label, elapsed));
    }
}

impl Drop for TimedCtx {
    fn drop(&mut self) {
        if self.armed {
            self.report(self.elapsed());
        }
    }
}

/// Last segment of a stringified function path (`"inner :: work"` -> `"work"`)
#[doc(hidden)]
pub fn function_label(path: &'static str) -> &'static str {
    path.rsplit("::").next().unwrap_or(path).trim()
}

/// Time a function call, labelled with the function's name
///
/// An optional `sink =>` prefix reports somewhere other than stdout.
///
/// ```
/// use bmd_perf::Sink;
///
/// fn add(a: i32, b: i32) -> i32 {
///     a + b
/// }
///
/// let sum = bmd_perf::timed!(add(2, 3)); // prints "add: ..."
/// assert_eq!(sum, 5);
///
/// let sum = bmd_perf::timed!(Sink::Stderr => add(2, 3));
/// assert_eq!(sum, 5);
/// ```
#[macro_export]
macro_rules! timed {
    ($($func:ident)::+ ( $($arg:expr),* $(,)? )) => {
        $crate::timer::timed(
            $crate::timer::function_label(stringify!($($func)::+)),
            || $($func)::+($($arg),*),
        )
    };
    ($sink:expr => $($func:ident)::+ ( $($arg:expr),* $(,)? )) => {
        $crate::timer::timed_with(
            $crate::timer::function_label(stringify!($($func)::+)),
            &$sink,
            || $($func)::+($($arg),*),
        )
    };
}

/// Time the rest of the enclosing scope
///
/// ```
/// fn load() {
///     bmd_perf::timed_scope!("load");
///     // ... code ...
/// } // "load: ..." printed here
/// # load();
/// ```
#[macro_export]
macro_rules! timed_scope {
    ($label:expr) => {
        let _timed_ctx = $crate::timer::TimedCtx::new($label);
    };
    ($label:expr, $sink:expr) => {
        let _timed_ctx = $crate::timer::TimedCtx::new($label).with_sink($sink);
    };
}
