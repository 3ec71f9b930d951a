// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Capturing output sink

use std::sync::{Arc, Mutex};

use bmd_perf::Sink;

/// Collects every line emitted through its [`Sink`]
#[derive(Debug, Clone, Default)]
pub struct CapturedSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl CapturedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that appends to this capture
    pub fn sink(&self) -> Sink {
        let lines = Arc::clone(&self.lines);
        Sink::custom(move |line| lines.lock().unwrap().push(line.to_string()))
    }

    /// Snapshot of the captured lines
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().unwrap().is_empty()
    }
}
