//! Timing
//!
//! A start/stop timer that accumulates wall-clock time and allocation
//! deltas only while it is running. Workloads can pause it around setup
//! work through [`Bencher::stop_timer`](crate::Bencher::stop_timer).

use crate::allocator::AllocSnapshot;
use std::time::{Duration, Instant};

/// What the timer has accumulated so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerReading {
    /// Elapsed nanoseconds while running
    pub duration_nanos: u64,
    /// Net bytes allocated while running (may be negative)
    pub net_bytes: i64,
    /// Allocation calls while running
    pub alloc_count: u64,
}

/// Accumulating timer for one measurement call.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    started: Option<(Instant, AllocSnapshot)>,
    track_allocations: bool,
    total: TimerReading,
}

impl Timer {
    /// Create a stopped timer
    pub fn new(track_allocations: bool) -> Self {
        Self {
            started: None,
            track_allocations,
            total: TimerReading::default(),
        }
    }

    /// Whether the timer is currently running
    #[inline]
    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Start accumulating. No-op if already running.
    #[inline]
    pub fn start(&mut self) {
        if self.started.is_none() {
            let snap = if self.track_allocations {
                AllocSnapshot::now()
            } else {
                AllocSnapshot::default()
            };
            self.started = Some((Instant::now(), snap));
        }
    }

    /// Stop accumulating. No-op if already stopped.
    #[inline]
    pub fn stop(&mut self) {
        if let Some((start, snap)) = self.started.take() {
            let elapsed = start.elapsed().as_nanos() as u64;
            self.total.duration_nanos = self.total.duration_nanos.saturating_add(elapsed);
            if self.track_allocations {
                let (net, count) = AllocSnapshot::now().delta_since(&snap);
                self.total.net_bytes += net;
                self.total.alloc_count += count;
            }
        }
    }

    /// Zero the accumulators; a running timer restarts its baseline.
    pub fn reset(&mut self) {
        let running = self.is_running();
        self.started = None;
        self.total = TimerReading::default();
        if running {
            self.start();
        }
    }

    /// Accumulated reading (excludes an in-progress interval)
    pub fn reading(&self) -> TimerReading {
        self.total
    }

    /// Elapsed time including any in-progress interval
    pub fn elapsed(&self) -> Duration {
        let running = self
            .started
            .map(|(start, _)| start.elapsed())
            .unwrap_or_default();
        Duration::from_nanos(self.total.duration_nanos) + running
    }
}

/// Pin the current thread to a specific core.
///
/// Keeps a measurement call from migrating between cores mid-step.
#[cfg(target_os = "linux")]
pub fn pin_to_cpu(cpu: usize) -> Result<(), std::io::Error> {
    use std::mem::MaybeUninit;

    // SAFETY: cpu_set_t is plain data; zeroed is a valid empty set and the
    // CPU_* helpers only touch that local value.
    unsafe {
        let mut set = MaybeUninit::<libc::cpu_set_t>::zeroed();
        let set_ref = set.assume_init_mut();

        libc::CPU_ZERO(set_ref);
        libc::CPU_SET(cpu, set_ref);

        let result = libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), set_ref);

        if result == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }
}

/// CPU pinning is a no-op off Linux.
#[cfg(not(target_os = "linux"))]
pub fn pin_to_cpu(_cpu: usize) -> Result<(), std::io::Error> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_accumulates_only_while_running() {
        let mut timer = Timer::new(false);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(timer.reading().duration_nanos, 0);

        timer.start();
        std::thread::sleep(Duration::from_millis(5));
        timer.stop();
        let first = timer.reading().duration_nanos;
        assert!(first >= 4_000_000);

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(timer.reading().duration_nanos, first);
    }

    #[test]
    fn test_timer_reset_restarts_baseline() {
        let mut timer = Timer::new(false);
        timer.start();
        std::thread::sleep(Duration::from_millis(5));
        timer.reset();
        assert!(timer.is_running());
        timer.stop();
        assert!(timer.reading().duration_nanos < 5_000_000);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut timer = Timer::new(false);
        timer.start();
        std::thread::sleep(Duration::from_millis(2));
        timer.start();
        timer.stop();
        assert!(timer.reading().duration_nanos >= 1_500_000);
    }
}
