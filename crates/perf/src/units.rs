// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Compact duration rendering
//!
//! Renders a [`Duration`] with the SI prefix that keeps the magnitude in
//! `[1, 1000)`, one decimal place and a thousands separator:
//!
//! ```text
//! 850ns        -> 850.0 ns
//! 1.234ms      -> 1.2 ms
//! 3.4s         -> 3.4 s
//! 999.96ms     -> 1,000.0 ms   (rounding happens after the unit is picked)
//! ```

use std::fmt;
use std::time::Duration;

/// (upper bound in nanoseconds, nanoseconds per unit, symbol)
const SCALES: [(u128, u128, &str); 6] = [
    (1_000, 1, "ns"),
    (1_000_000, 1_000, "µs"),
    (1_000_000_000, 1_000_000, "ms"),
    (1_000_000_000_000, 1_000_000_000, "s"),
    (1_000_000_000_000_000, 1_000_000_000_000, "ks"),
    (u128::MAX, 1_000_000_000_000_000, "Ms"),
];

/// A duration displayed in compact, auto-scaled form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CompactDuration(pub Duration);

impl CompactDuration {
    /// Magnitude and unit symbol this duration renders with
    pub fn scaled(&self) -> (f64, &'static str) {
        let nanos = self.0.as_nanos();
        if nanos == 0 {
            return (0.0, "s");
        }

        let (_, per_unit, symbol) = SCALES
            .iter()
            .copied()
            .find(|(bound, _, _)| nanos < *bound)
            .unwrap_or(SCALES[SCALES.len() - 1]);

        (nanos as f64 / per_unit as f64, symbol)
    }
}

impl From<Duration> for CompactDuration {
    fn from(duration: Duration) -> Self {
        CompactDuration(duration)
    }
}

impl fmt::Display for CompactDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (value, symbol) = self.scaled();
        write!(f, "{} {}", group_thousands(&format!("{value:.1}")), symbol)
    }
}

/// Format a timing report line: `<label>: <compact duration>`
pub fn format_timing(label: &str, elapsed: Duration) -> String {
    format!("{label}: {}", CompactDuration(elapsed))
}

fn group_thousands(number: &str) -> String {
    let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));

    let digits = int_part.len();
    let mut grouped = String::with_capacity(digits + digits / 3 + frac_part.len() + 1);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if !frac_part.is_empty() {
        grouped.push('.');
        grouped.push_str(frac_part);
    }
    grouped
}
