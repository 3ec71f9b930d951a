// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Recording session lifecycle shared by the tracer and the profiler
//!
//! ```text
//! idle ──start──> started ──run f──> stopped/saved ──> idle
//!                      └── f panics ──> Drop finishes ──┘
//! ```
//!
//! A started recorder is owned by a [`SessionGuard`], which finishes it
//! exactly once: explicitly after a normal return, or from `Drop` while
//! unwinding.

use crate::error::PerfResult;

/// An external recording facility that has already been started
pub(crate) trait Recorder {
    /// Run user code inside the recording context
    fn enter<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        f()
    }

    /// Stop recording, persist the output and release the facility
    fn finish(self) -> PerfResult<()>;
}

/// Owns a started recorder until it has been finished
pub(crate) struct SessionGuard<Rec: Recorder> {
    recorder: Option<Rec>,
    label: &'static str,
}

impl<Rec: Recorder> SessionGuard<Rec> {
    pub(crate) fn new(label: &'static str, recorder: Rec) -> Self {
        tracing::debug!(session = label, "recording session started");
        Self {
            recorder: Some(recorder),
            label,
        }
    }

    pub(crate) fn enter<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        match &self.recorder {
            Some(recorder) => recorder.enter(f),
            None => f(),
        }
    }

    /// Finish the session. Later calls and the eventual drop are no-ops.
    pub(crate) fn finish(&mut self) -> PerfResult<()> {
        match self.recorder.take() {
            Some(recorder) => {
                let result = recorder.finish();
                tracing::debug!(session = self.label, ok = result.is_ok(), "recording session stopped");
                result
            }
            None => Ok(()),
        }
    }
}

impl<Rec: Recorder> Drop for SessionGuard<Rec> {
    fn drop(&mut self) {
        if self.recorder.is_some() {
            if let Err(e) = self.finish() {
                tracing::error!(session = self.label, error = %e, "failed to finish recording session");
            }
        }
    }
}

/// Run `f` inside a started recorder and finish it on every exit path
///
/// Returns `f`'s value once the recording has been persisted. If `f` panics
/// the recording is still persisted before the panic continues.
pub(crate) fn run_recorded<Rec, F, R>(label: &'static str, recorder: Rec, f: F) -> PerfResult<R>
where
    Rec: Recorder,
    F: FnOnce() -> R,
{
    let mut guard = SessionGuard::new(label, recorder);
    let value = guard.enter(f);
    guard.finish()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PerfError;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRecorder {
        finished: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Recorder for CountingRecorder {
        fn finish(self) -> PerfResult<()> {
            self.finished.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(PerfError::Encode("boom".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn recorder(fail: bool) -> (CountingRecorder, Arc<AtomicUsize>) {
        let finished = Arc::new(AtomicUsize::new(0));
        (
            CountingRecorder {
                finished: Arc::clone(&finished),
                fail,
            },
            finished,
        )
    }

    #[test]
    fn test_finishes_once_on_success() {
        let (rec, finished) = recorder(false);

        let value = run_recorded("test", rec, || "done").unwrap();

        assert_eq!(value, "done");
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_user_error_passes_through() {
        let (rec, finished) = recorder(false);

        let value: Result<(), String> =
            run_recorded("test", rec, || Err("x".to_string())).unwrap();

        assert_eq!(value, Err("x".to_string()));
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_finishes_once_on_panic() {
        let (rec, finished) = recorder(false);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            run_recorded::<_, _, ()>("test", rec, || panic!("user panic"))
        }));

        assert!(result.is_err());
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_finish_failure_propagates() {
        let (rec, finished) = recorder(true);

        let result = run_recorded("test", rec, || 1);

        assert!(matches!(result, Err(PerfError::Encode(_))));
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_double_finish_is_noop() {
        let (rec, finished) = recorder(false);

        let mut guard = SessionGuard::new("test", rec);
        guard.finish().unwrap();
        guard.finish().unwrap();
        drop(guard);

        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }
}
