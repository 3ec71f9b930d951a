// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Log layout configuration
//!
//! The host program's identity and the log root are passed in explicitly
//! rather than discovered from process globals.
//!
//! ## Layout
//!
//! ```text
//! <log_root>/
//! ├── viztracer/<host name>/<function>_<unix seconds>.json
//! └── cprofile/<host stem>/<function>_<unix seconds>.prof
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use bmd_perf::{CollisionPolicy, HostProgram, LogConfig};
//!
//! let config = LogConfig::new("logs", HostProgram::from_path("src/bin/report.rs")?)
//!     .with_collision(CollisionPolicy::Error);
//! assert!(config.profile_dir().ends_with("cprofile/report"));
//! # Ok::<(), bmd_perf::PerfError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{PerfError, PerfResult};
use crate::output::Sink;

/// Directory under the log root holding execution traces
pub const TRACE_DIR: &str = "viztracer";

/// Directory under the log root holding profiles
pub const PROFILE_DIR: &str = "cprofile";

/// Default log root, relative to the working directory
pub const DEFAULT_LOG_ROOT: &str = "logs";

/// Identity of the program whose functions are being recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostProgram {
    /// Full file name (e.g. `report.rs`), used for trace directories
    pub name: String,
    /// File name without extension (e.g. `report`), used for profile directories
    pub stem: String,
}

impl HostProgram {
    /// Derive the identity from the program's file path
    pub fn from_path(path: impl AsRef<Path>) -> PerfResult<Self> {
        let path = path.as_ref();
        let invalid = || PerfError::InvalidHostProgram(path.to_path_buf());

        let name = path.file_name().ok_or_else(invalid)?;
        let stem = path.file_stem().ok_or_else(invalid)?;

        Ok(Self {
            name: name.to_string_lossy().into_owned(),
            stem: stem.to_string_lossy().into_owned(),
        })
    }

    /// Use a plain name for both the name and the stem
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            stem: name.clone(),
            name,
        }
    }

    /// Identity of the running executable
    pub fn current() -> PerfResult<Self> {
        let exe = std::env::current_exe().map_err(|e| PerfError::io("<current exe>", e))?;
        Self::from_path(exe)
    }
}

/// What to do when the computed log file already exists
///
/// Timestamps have one-second granularity, so repeated calls within the same
/// second compute the same path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Append `-1`, `-2`, ... to the file stem until a free name is found
    #[default]
    Suffix,
    /// Truncate and reuse the existing file
    Overwrite,
    /// Fail with [`PerfError::LogFileExists`]
    Error,
}

/// Where and how tracer and profiler output is written
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Root directory for all log output
    pub log_root: PathBuf,

    /// Program whose functions are being recorded
    pub host: HostProgram,

    /// Behaviour when two invocations compute the same path
    pub collision: CollisionPolicy,

    /// Sink for "saved to <path>" notices
    pub announce: Sink,
}

impl LogConfig {
    /// Create a new log configuration
    pub fn new(log_root: impl Into<PathBuf>, host: HostProgram) -> Self {
        Self {
            log_root: log_root.into(),
            host,
            collision: CollisionPolicy::default(),
            announce: Sink::default(),
        }
    }

    /// Log under [`DEFAULT_LOG_ROOT`]
    pub fn with_default_root(host: HostProgram) -> Self {
        Self::new(DEFAULT_LOG_ROOT, host)
    }

    /// Set the collision policy
    pub fn with_collision(mut self, collision: CollisionPolicy) -> Self {
        self.collision = collision;
        self
    }

    /// Set the sink for saved-file notices
    pub fn with_announce(mut self, announce: Sink) -> Self {
        self.announce = announce;
        self
    }

    /// `<log_root>/viztracer/<host name>`
    pub fn trace_dir(&self) -> PathBuf {
        self.log_root.join(TRACE_DIR).join(&self.host.name)
    }

    /// `<log_root>/cprofile/<host stem>`
    pub fn profile_dir(&self) -> PathBuf {
        self.log_root.join(PROFILE_DIR).join(&self.host.stem)
    }

    /// Create the directories and open a fresh log file for `function`
    pub fn create_log_file(
        &self,
        dir: &Path,
        function: &str,
        extension: &str,
    ) -> PerfResult<(PathBuf, File)> {
        create_log_file(dir, function, extension, unix_timestamp(), self.collision)
    }
}

/// Seconds since the Unix epoch
pub fn unix_timestamp() -> u64 {
    seconds_since_epoch(SystemTime::now())
}

/// Seconds from the Unix epoch to `time`, clamped to 0 for earlier clocks
pub fn seconds_since_epoch(time: SystemTime) -> u64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs(),
        Err(e) => {
            tracing::warn!(
                behind = ?e.duration(),
                "system clock is before the Unix epoch, using timestamp 0"
            );
            0
        }
    }
}

/// File name for one invocation: `<function>_<timestamp>[-<n>].<ext>`
pub fn log_file_name(function: &str, timestamp: u64, attempt: u32, extension: &str) -> String {
    if attempt == 0 {
        format!("{function}_{timestamp}.{extension}")
    } else {
        format!("{function}_{timestamp}-{attempt}.{extension}")
    }
}

/// Ensure `dir` exists and create a new log file inside it
///
/// Existing directories are fine. With [`CollisionPolicy::Suffix`] the file is
/// created with `create_new`, so two invocations never share a file.
pub fn create_log_file(
    dir: &Path,
    function: &str,
    extension: &str,
    timestamp: u64,
    collision: CollisionPolicy,
) -> PerfResult<(PathBuf, File)> {
    fs::create_dir_all(dir).map_err(|source| PerfError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut attempt = 0;
    loop {
        let path = dir.join(log_file_name(function, timestamp, attempt, extension));

        let opened = match collision {
            CollisionPolicy::Overwrite => File::create(&path),
            CollisionPolicy::Suffix | CollisionPolicy::Error => {
                OpenOptions::new().write(true).create_new(true).open(&path)
            }
        };

        match opened {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => match collision {
                CollisionPolicy::Suffix => attempt += 1,
                _ => return Err(PerfError::LogFileExists(path)),
            },
            Err(e) => return Err(PerfError::io(path, e)),
        }
    }
}

/// Absolute form of `path` for notices, falling back to the path as given
pub(crate) fn resolved(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
