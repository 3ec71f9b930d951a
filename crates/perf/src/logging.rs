// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Opt-in `tracing` subscriber setup for host programs
//!
//! The library itself only emits events; installing a subscriber is up to the
//! host program. These helpers cover the common case.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install a formatting subscriber filtered by `RUST_LOG`
///
/// Returns `false` if a global subscriber was already installed.
pub fn init() -> bool {
    install(EnvFilter::from_default_env())
}

/// Install a formatting subscriber with an explicit filter directive
/// (e.g. `"bmd_perf=debug"`)
pub fn init_with_filter(directives: &str) -> bool {
    install(EnvFilter::new(directives))
}

fn install(filter: EnvFilter) -> bool {
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).is_ok()
}
