// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Output sinks
//!
//! Where report lines (timings, saved-file notices) go. Emitting never fails;
//! a [`Sink::Null`] simply drops the line.

use std::fmt;
use std::sync::Arc;

/// Callback type for [`Sink::Custom`]
pub type SinkFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Destination for human-readable report lines
#[derive(Clone, Default)]
pub enum Sink {
    /// Print to standard output
    #[default]
    Stdout,
    /// Print to standard error
    Stderr,
    /// Emit an INFO-level `tracing` event with target `bmd_perf`
    Log,
    /// Discard all output
    Null,
    /// Hand each line to a user callback
    Custom(SinkFn),
}

impl Sink {
    /// Create a sink from a callback
    pub fn custom(f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Sink::Custom(Arc::new(f))
    }

    /// Whether this sink discards everything
    pub fn is_null(&self) -> bool {
        matches!(self, Sink::Null)
    }

    /// Write one line to the sink
    pub fn emit(&self, line: &str) {
        match self {
            Sink::Stdout => println!("{line}"),
            Sink::Stderr => eprintln!("{line}"),
            Sink::Log => tracing::info!(target: "bmd_perf", "{line}"),
            Sink::Null => {}
            Sink::Custom(f) => f(line),
        }
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::Stdout => f.write_str("Stdout"),
            Sink::Stderr => f.write_str("Stderr"),
            Sink::Log => f.write_str("Log"),
            Sink::Null => f.write_str("Null"),
            Sink::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
