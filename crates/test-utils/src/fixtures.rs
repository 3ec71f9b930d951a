// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Temporary log roots

use std::fs;
use std::path::{Path, PathBuf};

use bmd_perf::{HostProgram, LogConfig, Sink};
use tempfile::TempDir;

/// A log root that is removed when dropped
pub struct TempLogRoot {
    dir: TempDir,
}

impl TempLogRoot {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temporary log root"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Config rooted here for `host`, with notices discarded
    pub fn config(&self, host: &str) -> LogConfig {
        LogConfig::new(self.path(), HostProgram::from_path(host).expect("valid host path"))
            .with_announce(Sink::Null)
    }

    /// Sorted list of files directly inside `dir`, empty if it does not exist
    pub fn files_in(&self, dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = match fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file())
                .collect(),
            Err(_) => Vec::new(),
        };
        files.sort();
        files
    }
}

impl Default for TempLogRoot {
    fn default() -> Self {
        Self::new()
    }
}
