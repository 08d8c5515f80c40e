//! Bencher - The Benchmark Context
//!
//! A `Bencher` is handed to every workload. It tells the workload how many
//! iterations to run (`n()`), accepts skip/fail requests, records declared
//! throughput bytes, and spawns named sub-benchmarks.
//!
//! A bencher is either a leaf that owns a [`Measurement`], or a grouping
//! node whose children own theirs. Calling [`Bencher::run`] turns it into a
//! grouping node for good.

use crate::calibrate::run_bench;
use crate::config::{BenchTime, RunConfig};
use crate::error::{Abort, Failure, Outcome};
use crate::measure::Timer;
use crate::sample::Measurement;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Lifecycle of a benchmark. Exactly one terminal state is ever reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BenchState {
    /// Not finished yet
    Running,
    /// Completed without failure
    Passed,
    /// Failed; no measurement is reported
    Failed(Failure),
    /// Skipped, with an optional reason; no measurement is reported
    Skipped(Option<String>),
}

impl BenchState {
    /// Whether a terminal state has been reached
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BenchState::Running)
    }
}

/// The benchmark context passed to workloads.
pub struct Bencher {
    name: String,
    config: RunConfig,
    n: u64,
    pub(crate) timer: Timer,
    bytes_per_iteration: u64,
    state: BenchState,
    pending_abort: Option<Abort>,
    children: Vec<BenchNode>,
    has_children: bool,
    measurement: Option<Measurement>,
    cancel: Arc<AtomicBool>,
}

impl Bencher {
    /// Create a fresh context. The root of a suite uses an empty name.
    pub fn new(name: impl Into<String>, config: RunConfig) -> Self {
        let track = config.track_allocations;
        Self {
            name: name.into(),
            config,
            n: 0,
            timer: Timer::new(track),
            bytes_per_iteration: 0,
            state: BenchState::Running,
            pending_abort: None,
            children: Vec::new(),
            has_children: false,
            measurement: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Iterations the workload must perform in this call
    #[inline]
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Fully-qualified name (`parent:child`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bench time in effect for this context
    pub fn bench_time(&self) -> BenchTime {
        self.config.bench_time
    }

    /// Configuration in effect for this context
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Mark the benchmark skipped. Return the result from the workload.
    ///
    /// ```ignore
    /// if !has_avx2() {
    ///     return b.skip("needs avx2");
    /// }
    /// ```
    pub fn skip(&mut self, reason: impl Into<String>) -> Outcome {
        let abort = Abort::skip(reason);
        self.pending_abort.get_or_insert(abort.clone());
        Err(abort)
    }

    /// Mark the benchmark failed. Return the result from the workload.
    pub fn fail(&mut self, reason: impl Into<String>) -> Outcome {
        let abort = Abort::fail(reason);
        self.pending_abort.get_or_insert(abort.clone());
        Err(abort)
    }

    /// Declare payload bytes handled per iteration (for MB/s only)
    pub fn set_bytes_per_iteration(&mut self, bytes: u64) {
        self.bytes_per_iteration = bytes;
    }

    /// Declared payload bytes per iteration
    pub fn bytes_per_iteration(&self) -> u64 {
        self.bytes_per_iteration
    }

    /// Resume timing after [`stop_timer`](Self::stop_timer)
    pub fn start_timer(&mut self) {
        self.timer.start();
    }

    /// Pause timing, e.g. around per-call setup
    pub fn stop_timer(&mut self) {
        self.timer.stop();
    }

    /// Discard time and allocations recorded so far in this call
    pub fn reset_timer(&mut self) {
        self.timer.reset();
    }

    /// Whether the controller has given up waiting for this call
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Cooperative cancellation point for long-running workloads.
    ///
    /// ```ignore
    /// for _ in 0..b.n() {
    ///     b.check_deadline()?;
    ///     slow_operation();
    /// }
    /// ```
    #[inline]
    pub fn check_deadline(&self) -> Outcome {
        if self.is_cancelled() {
            Err(Abort::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Run a named sub-benchmark with the inherited bench time.
    ///
    /// Returns `true` unless the sub-benchmark failed (a skip counts as success).
    pub fn run<F>(&mut self, name: &str, workload: F) -> bool
    where
        F: FnMut(&mut Bencher) -> Outcome + Send,
    {
        let bench_time = self.config.bench_time;
        self.run_with(name, bench_time, workload)
    }

    /// Run a named sub-benchmark with its own bench time.
    pub fn run_with<F>(&mut self, name: &str, bench_time: BenchTime, workload: F) -> bool
    where
        F: FnMut(&mut Bencher) -> Outcome + Send,
    {
        self.has_children = true;

        let mut child = Bencher::new(self.child_name(name), self.config.with_bench_time(bench_time));
        run_bench(&mut child, workload);

        let ok = !child.is_failed();
        self.children.push(child.into_node());
        ok
    }

    /// Current state
    pub fn state(&self) -> &BenchState {
        &self.state
    }

    /// Whether the benchmark failed
    pub fn is_failed(&self) -> bool {
        matches!(self.state, BenchState::Failed(_))
    }

    /// Whether the benchmark was skipped
    pub fn is_skipped(&self) -> bool {
        matches!(self.state, BenchState::Skipped(_))
    }

    /// Failure or skip reason, if any
    pub fn reason(&self) -> Option<String> {
        match &self.state {
            BenchState::Failed(failure) => Some(failure.to_string()),
            BenchState::Skipped(reason) => reason.clone(),
            _ => None,
        }
    }

    /// Measurement of a passed leaf
    pub fn measurement(&self) -> Option<&Measurement> {
        self.measurement.as_ref()
    }

    /// Finished sub-benchmarks, in the order they ran
    pub fn children(&self) -> &[BenchNode] {
        &self.children
    }

    /// Whether [`run`](Self::run) was ever called on this context
    pub fn has_children(&self) -> bool {
        self.has_children
    }

    /// Freeze into a tree node
    pub fn into_node(self) -> BenchNode {
        BenchNode {
            name: self.name,
            bench_time: self.config.bench_time,
            state: self.state,
            measurement: self.measurement,
            children: self.children,
        }
    }

    fn child_name(&self, name: &str) -> String {
        if self.name.is_empty() {
            name.to_string()
        } else {
            format!("{}:{}", self.name, name)
        }
    }

    // === Controller hooks ===

    /// Reset per-call state before a measurement call
    pub(crate) fn prepare_call(&mut self, n: u64) {
        self.n = n;
        self.timer.stop();
        self.timer.reset();
        self.pending_abort = None;
        self.cancel.store(false, Ordering::Relaxed);
    }

    pub(crate) fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub(crate) fn take_pending_abort(&mut self) -> Option<Abort> {
        self.pending_abort.take()
    }

    /// Enter a terminal state. Later calls are ignored.
    pub(crate) fn finish(&mut self, state: BenchState) {
        if !self.state.is_terminal() {
            self.state = state;
        }
    }

    pub(crate) fn complete(&mut self, measurement: Measurement) {
        if !self.state.is_terminal() {
            self.measurement = Some(measurement);
            self.state = BenchState::Passed;
        }
    }

    /// Derive a grouping node's state from its children.
    pub(crate) fn finish_group(&mut self) {
        let state = group_state(&self.children);
        self.finish(state);
    }
}

fn group_state(children: &[BenchNode]) -> BenchState {
    if let Some(failed) = children.iter().find(|c| c.is_failed()) {
        return BenchState::Failed(Failure::Failed(Some(format!(
            "sub-benchmark failed: {}",
            failed.name
        ))));
    }
    if !children.is_empty() && children.iter().all(|c| c.is_skipped()) {
        return BenchState::Skipped(Some("all sub-benchmarks skipped".to_string()));
    }
    BenchState::Passed
}

/// A finished benchmark and its finished sub-benchmarks.
#[derive(Debug, Clone)]
pub struct BenchNode {
    /// Fully-qualified name
    pub name: String,
    /// Bench time the node ran with
    pub bench_time: BenchTime,
    /// Terminal state
    pub state: BenchState,
    /// Present only for passed leaves
    pub measurement: Option<Measurement>,
    /// Sub-benchmarks in execution order
    pub children: Vec<BenchNode>,
}

impl BenchNode {
    /// Whether the node failed
    pub fn is_failed(&self) -> bool {
        matches!(self.state, BenchState::Failed(_))
    }

    /// Whether the node was skipped
    pub fn is_skipped(&self) -> bool {
        matches!(self.state, BenchState::Skipped(_))
    }

    /// Whether the node is a grouping node
    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }

    /// Failure or skip reason, if any
    pub fn reason(&self) -> Option<String> {
        match &self.state {
            BenchState::Failed(failure) => Some(failure.to_string()),
            BenchState::Skipped(reason) => reason.clone(),
            _ => None,
        }
    }

    /// Depth-first, pre-order walk as `(depth, node)`, starting at `self` with depth 0.
    pub fn walk(&self) -> Vec<(usize, &BenchNode)> {
        let mut out = Vec::new();
        let mut stack = vec![(0usize, self)];
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            for child in node.children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }
}
