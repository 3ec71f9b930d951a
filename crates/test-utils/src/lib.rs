// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Testing utilities for bmd-perf
//!
//! This crate provides common testing components including:
//! - A sink that captures report lines for assertions
//! - Temporary log roots with helpers to inspect what was written

pub mod capture;
pub mod fixtures;

// Re-exports for convenience
pub use capture::CapturedSink;
pub use fixtures::TempLogRoot;
