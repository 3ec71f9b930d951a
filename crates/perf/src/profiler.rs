// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Call-graph profiling
//!
//! Wraps a function in a `pprof` sampling session and dumps the collected
//! call stacks when it returns. The default output is the protobuf profile
//! format read by `go tool pprof` and most profile viewers:
//!
//! ```bash
//! go tool pprof -http=:8080 logs/cprofile/report/crunch_1700000000.prof
//! ```
//!
//! The sampler is process-global: only one profiling session can run at a
//! time, and starting a second one fails with [`PerfError::Profiler`].

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use pprof::protos::Message;
use pprof::{ProfilerGuard, ProfilerGuardBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{LogConfig, resolved};
use crate::error::{PerfError, PerfResult};
use crate::output::Sink;
use crate::session::{Recorder, run_recorded};

/// Output format of a profile dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileFormat {
    /// Protobuf call-graph profile (`.prof`)
    #[default]
    Pprof,
    /// SVG flamegraph (`.svg`), requires the `flamegraph` feature
    Flamegraph,
}

impl ProfileFormat {
    /// File extension written for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ProfileFormat::Pprof => "prof",
            ProfileFormat::Flamegraph => "svg",
        }
    }

    fn ensure_supported(&self) -> PerfResult<()> {
        match self {
            ProfileFormat::Pprof => Ok(()),
            ProfileFormat::Flamegraph if cfg!(feature = "flamegraph") => Ok(()),
            ProfileFormat::Flamegraph => Err(PerfError::UnsupportedFormat("flamegraph")),
        }
    }
}

/// Options forwarded to the sampling profiler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfilerOptions {
    /// Sampling frequency in Hz
    pub frequency: i32,
    /// Shared libraries whose frames are skipped while unwinding
    pub blocklist: Vec<String>,
    /// Dump format
    pub format: ProfileFormat,
}

impl Default for ProfilerOptions {
    fn default() -> Self {
        Self {
            frequency: 1000,
            blocklist: ["libc", "libgcc", "pthread", "vdso"]
                .into_iter()
                .map(String::from)
                .collect(),
            format: ProfileFormat::Pprof,
        }
    }
}

impl ProfilerOptions {
    /// Decode options from a JSON mapping; missing keys keep their defaults
    pub fn from_value(value: &Value) -> PerfResult<Self> {
        Ok(Self::deserialize(value)?)
    }
}

struct SampledProfile {
    guard: ProfilerGuard<'static>,
    file: File,
    path: PathBuf,
    format: ProfileFormat,
    announce: Sink,
}

impl SampledProfile {
    fn start(config: &LogConfig, function: &str, options: &ProfilerOptions) -> PerfResult<Self> {
        options.format.ensure_supported()?;

        let (path, file) =
            config.create_log_file(&config.profile_dir(), function, options.format.extension())?;

        let guard = match ProfilerGuardBuilder::default()
            .frequency(options.frequency)
            .blocklist(&options.blocklist)
            .build()
        {
            Ok(guard) => guard,
            Err(e) => {
                // nothing will ever be written to the reserved file
                let _ = fs::remove_file(&path);
                return Err(e.into());
            }
        };

        Ok(Self {
            guard,
            file,
            path,
            format: options.format,
            announce: config.announce.clone(),
        })
    }
}

impl Recorder for SampledProfile {
    fn finish(self) -> PerfResult<()> {
        let SampledProfile {
            guard,
            mut file,
            path,
            format,
            announce,
        } = self;

        let report = guard.report().build()?;
        // sampling stops here, before the dump is written
        drop(guard);

        match format {
            ProfileFormat::Pprof => {
                let profile = report.pprof()?;
                let mut content = Vec::new();
                profile
                    .encode(&mut content)
                    .map_err(|e| PerfError::Encode(e.to_string()))?;
                file.write_all(&content)
                    .map_err(|e| PerfError::io(&path, e))?;
            }
            #[cfg(feature = "flamegraph")]
            ProfileFormat::Flamegraph => report.flamegraph(&mut file)?,
            #[cfg(not(feature = "flamegraph"))]
            ProfileFormat::Flamegraph => return Err(PerfError::UnsupportedFormat("flamegraph")),
        }
        file.flush().map_err(|e| PerfError::io(&path, e))?;

        let path = resolved(&path);
        tracing::info!(path = %path.display(), samples = report.data.len(), "profile saved");
        announce.emit(&format!("pprof profile saved to {}", path.display()));
        Ok(())
    }
}

/// Profile `f` with the sampling profiler
///
/// The profile is written to
/// `<log_root>/cprofile/<host stem>/<function>_<unix seconds>.prof` (or
/// `.svg` for flamegraphs). It is dumped whether `f` returns or panics, and
/// `f`'s value is returned unchanged.
///
/// ```rust,no_run
/// use bmd_perf::{HostProgram, LogConfig, ProfilerOptions, profile};
///
/// let config = LogConfig::new("logs", HostProgram::from_path("src/bin/report.rs")?);
/// let total: u64 = profile(&config, "crunch", &ProfilerOptions::default(), || {
///     (0..10_000_000u64).sum()
/// })?;
/// # Ok::<(), bmd_perf::PerfError>(())
/// ```
pub fn profile<F, R>(
    config: &LogConfig,
    function: &str,
    options: &ProfilerOptions,
    f: F,
) -> PerfResult<R>
where
    F: FnOnce() -> R,
{
    let session = SampledProfile::start(config, function, options)?;
    run_recorded("profile", session, f)
}

/// Profile a function call, naming the output after the function
///
/// ```rust,no_run
/// use bmd_perf::{HostProgram, LogConfig};
///
/// fn fib(n: u64) -> u64 {
///     if n < 2 { n } else { fib(n - 1) + fib(n - 2) }
/// }
///
/// let config = LogConfig::new("logs", HostProgram::named("demo"));
/// let value = bmd_perf::profile!(config, fib(30))?;
/// # Ok::<(), bmd_perf::PerfError>(())
/// ```
#[macro_export]
macro_rules! profile {
    ($config:expr, $($func:ident)::+ ( $($arg:expr),* $(,)? )) => {
        $crate::profiler::profile(
            &$config,
            $crate::timer::function_label(stringify!($($func)::+)),
            &$crate::profiler::ProfilerOptions::default(),
            || $($func)::+($($arg),*),
        )
    };
    ($config:expr, $options:expr, $($func:ident)::+ ( $($arg:expr),* $(,)? )) => {
        $crate::profiler::profile(
            &$config,
            $crate::timer::function_label(stringify!($($func)::+)),
            &$options,
            || $($func)::+($($arg),*),
        )
    };
}
