use indicatif::ProgressBar;
use std::sync::Arc;
use std::sync::atomic::{
    AtomicBool,
    AtomicUsize,
    Ordering,
};

/// Shared flag used to stop a running fill.
///
/// Clones share the same flag, so one can be handed to the worker and the
/// other kept by whoever may want to cancel.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// How a cancellable task ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome<T> {
    Finished(T),
    Cancelled,
}

impl<T> TaskOutcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskOutcome::Cancelled)
    }

    pub fn finished(self) -> Option<T> {
        match self {
            TaskOutcome::Finished(x) => Some(x),
            TaskOutcome::Cancelled => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TaskOutcome<U> {
        match self {
            TaskOutcome::Finished(x) => TaskOutcome::Finished(f(x)),
            TaskOutcome::Cancelled => TaskOutcome::Cancelled,
        }
    }
}

/// Scan-level progress of a fill.
///
/// Counters only ever grow and can be read from any thread while the fill
/// runs. An attached progress bar is advanced in step.
#[derive(Default)]
pub struct FillProgress {
    processed: AtomicUsize,
    total: AtomicUsize,
    bar: Option<ProgressBar>,
}

impl FillProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress_bar(bar: ProgressBar) -> Self {
        Self {
            bar: Some(bar),
            ..Self::default()
        }
    }

    pub fn set_total(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        if let Some(bar) = &self.bar {
            bar.set_length(total as u64);
        }
    }

    pub fn advance(&self, n: usize) {
        self.processed.fetch_add(n, Ordering::Relaxed);
        if let Some(bar) = &self.bar {
            bar.inc(n as u64);
        }
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Fraction of scans processed, `0.0` while the total is unknown.
    pub fn fraction(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.processed() as f64 / total as f64).min(1.0)
    }

    pub(crate) fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish();
        }
    }
}
