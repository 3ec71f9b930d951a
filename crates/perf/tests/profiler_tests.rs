// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Integration tests for call-graph profiling
//!
//! The sampling profiler is process-global, so every test here is serialised.

#![cfg(feature = "profiler")]

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use bmd_perf::{PerfError, ProfilerOptions, profile};
use bmd_perf_test_utils::{CapturedSink, TempLogRoot};
use pprof::protos::Message;
use serial_test::serial;

#[derive(Debug, PartialEq)]
struct ValueError(String);

fn fib(n: u64) -> u64 {
    if n < 2 { n } else { fib(n - 1) + fib(n - 2) }
}

mod inner {
    pub fn work(n: u64) -> u64 {
        (0..n).sum()
    }
}

fn raises() -> Result<u64, ValueError> {
    fib(15);
    Err(ValueError("x".to_string()))
}

fn assert_valid_profile(path: &Path) {
    let bytes = fs::read(path).expect("profile readable");
    let decoded = pprof::protos::Profile::decode(bytes.as_slice()).expect("valid pprof protobuf");
    assert!(!decoded.sample_type.is_empty());
}

#[test]
#[serial]
fn test_profile_written_to_expected_path() -> anyhow::Result<()> {
    let root = TempLogRoot::new();
    let config = root.config("src/bin/report.rs");

    let value = profile(&config, "fib", &ProfilerOptions::default(), || fib(20))?;

    assert_eq!(value, 6765);

    let dir = root.path().join("cprofile").join("report");
    let files = root.files_in(&dir);
    assert_eq!(files.len(), 1);

    let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("fib_"));
    assert!(name.ends_with(".prof"));
    assert_valid_profile(&files[0]);
    Ok(())
}

#[test]
#[serial]
fn test_raised_error_surfaces_and_profile_exists() -> anyhow::Result<()> {
    let root = TempLogRoot::new();
    let capture = CapturedSink::new();
    let config = root.config("app.py").with_announce(capture.sink());

    let result = bmd_perf::profile!(config, raises())?;

    assert_eq!(result, Err(ValueError("x".to_string())));

    let files = root.files_in(&config.profile_dir());
    assert_eq!(files.len(), 1);
    assert!(files[0].file_name().unwrap().to_string_lossy().starts_with("raises_"));

    let lines = capture.lines();
    assert_eq!(lines.len(), 1);
    let announced = lines[0].strip_prefix("pprof profile saved to ").unwrap();
    assert!(Path::new(announced).is_absolute());
    assert_eq!(fs::canonicalize(&files[0])?, Path::new(announced));
    Ok(())
}

#[test]
#[serial]
fn test_profile_saved_when_function_panics() {
    let root = TempLogRoot::new();
    let config = root.config("app");

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        profile(&config, "explodes", &ProfilerOptions::default(), || -> u64 {
            fib(15);
            panic!("ValueError: x")
        })
    }));

    let payload = result.expect_err("panic must propagate");
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"ValueError: x"));

    let files = root.files_in(&config.profile_dir());
    assert_eq!(files.len(), 1);
    assert_valid_profile(&files[0]);

    // the profiler was released, so another session can start
    let again = profile(&config, "again", &ProfilerOptions::default(), || 1);
    assert!(again.is_ok());
}

#[test]
#[serial]
fn test_nested_session_fails_without_leaving_a_file() -> anyhow::Result<()> {
    let root = TempLogRoot::new();
    let config = root.config("app");
    let options = ProfilerOptions::default();

    let inner = profile(&config, "outer", &options, || {
        profile(&config, "inner", &options, || fib(10))
    })?;

    assert!(matches!(inner, Err(PerfError::Profiler(_))));

    let files = root.files_in(&config.profile_dir());
    assert_eq!(files.len(), 1);
    assert!(files[0].file_name().unwrap().to_string_lossy().starts_with("outer_"));
    Ok(())
}

#[test]
#[serial]
fn test_same_second_calls_get_distinct_files() -> anyhow::Result<()> {
    let root = TempLogRoot::new();
    let config = root.config("app");
    let options = ProfilerOptions::from_value(&serde_json::json!({ "frequency": 100 }))?;

    for _ in 0..3 {
        bmd_perf::profile!(config, options, fib(5))?;
    }

    // calls may straddle a second boundary, but never share a file
    let files = root.files_in(&config.profile_dir());
    assert_eq!(files.len(), 3);
    Ok(())
}

#[test]
#[serial]
fn test_trivially_short_call_writes_valid_profile() -> anyhow::Result<()> {
    let root = TempLogRoot::new();
    let config = root.config("app");

    let value = profile(&config, "instant", &ProfilerOptions::default(), || 1)?;

    assert_eq!(value, 1);
    let files = root.files_in(&config.profile_dir());
    assert_eq!(files.len(), 1);
    assert!(files[0].to_string_lossy().ends_with(".prof"));
    assert_valid_profile(&files[0]);
    Ok(())
}

#[test]
#[serial]
fn test_instant_panic_still_writes_valid_profile() {
    let root = TempLogRoot::new();
    let config = root.config("app");

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        profile(&config, "instant_panic", &ProfilerOptions::default(), || -> u64 {
            panic!("ValueError: x")
        })
    }));

    let payload = result.expect_err("panic must propagate");
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"ValueError: x"));

    let files = root.files_in(&config.profile_dir());
    assert_eq!(files.len(), 1);
    assert_valid_profile(&files[0]);
}

#[test]
#[serial]
fn test_profile_macro_names_file_after_last_path_segment() -> anyhow::Result<()> {
    let root = TempLogRoot::new();
    let config = root.config("app");

    let total = bmd_perf::profile!(config, inner::work(10))?;

    assert_eq!(total, 45);
    let files = root.files_in(&config.profile_dir());
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("work_"), "unexpected file name {name}");
    assert!(!name.contains(' '));
    assert_valid_profile(&files[0]);
    Ok(())
}

#[cfg(not(feature = "flamegraph"))]
#[test]
#[serial]
fn test_flamegraph_rejected_without_feature() {
    let root = TempLogRoot::new();
    let config = root.config("app");
    let options = ProfilerOptions {
        format: bmd_perf::ProfileFormat::Flamegraph,
        ..Default::default()
    };

    let result = profile(&config, "fib", &options, || fib(5));

    assert!(matches!(result, Err(PerfError::UnsupportedFormat(_))));
    assert!(root.files_in(&config.profile_dir()).is_empty());
}

#[cfg(feature = "flamegraph")]
#[test]
#[serial]
fn test_flamegraph_output() -> anyhow::Result<()> {
    let root = TempLogRoot::new();
    let config = root.config("app");
    let options = ProfilerOptions {
        format: bmd_perf::ProfileFormat::Flamegraph,
        ..Default::default()
    };

    profile(&config, "fib", &options, || fib(32))?;

    let files = root.files_in(&config.profile_dir());
    assert_eq!(files.len(), 1);
    assert!(files[0].to_string_lossy().ends_with(".svg"));
    assert!(fs::read_to_string(&files[0])?.contains("<svg"));
    Ok(())
}
