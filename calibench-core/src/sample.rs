//! Samples and measurements

use serde::{Deserialize, Serialize};

/// One calibration step: the workload run once at a fixed N.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Iteration count for this step
    pub iterations: u64,
    /// Timed nanoseconds for this step
    pub duration_nanos: u64,
    /// Net bytes allocated while timed
    pub net_bytes: i64,
    /// Allocation calls while timed
    pub alloc_count: u64,
    /// Declared payload bytes per iteration at the end of the step
    pub bytes_per_iteration: u64,
}

/// Terminal snapshot of a leaf benchmark.
///
/// Totals accumulate over every recorded step; `samples` keeps the steps in
/// the order they ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Cumulative iterations across steps
    pub iterations: u64,
    /// Cumulative timed nanoseconds across steps
    pub duration_nanos: u64,
    /// Cumulative net allocated bytes
    pub net_bytes: i64,
    /// Cumulative allocation calls
    pub alloc_count: u64,
    /// Declared payload bytes per iteration
    pub bytes_per_iteration: u64,
    /// Steps in calibration order
    pub samples: Vec<Sample>,
}

impl Measurement {
    /// Append a step and fold it into the totals
    pub fn push(&mut self, sample: Sample) {
        self.iterations = self.iterations.saturating_add(sample.iterations);
        self.duration_nanos = self.duration_nanos.saturating_add(sample.duration_nanos);
        self.net_bytes += sample.net_bytes;
        self.alloc_count += sample.alloc_count;
        self.bytes_per_iteration = sample.bytes_per_iteration;
        self.samples.push(sample);
    }

    /// Iteration count of the most recent step
    pub fn last_iterations(&self) -> u64 {
        self.samples.last().map(|s| s.iterations).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(iterations: u64, duration_nanos: u64, net_bytes: i64) -> Sample {
        Sample {
            iterations,
            duration_nanos,
            net_bytes,
            alloc_count: 1,
            bytes_per_iteration: 8,
        }
    }

    #[test]
    fn test_push_accumulates_in_order() {
        let mut m = Measurement::default();
        m.push(sample(1, 100, 16));
        m.push(sample(50, 4_000, -8));

        assert_eq!(m.iterations, 51);
        assert_eq!(m.duration_nanos, 4_100);
        assert_eq!(m.net_bytes, 8);
        assert_eq!(m.alloc_count, 2);
        assert_eq!(m.bytes_per_iteration, 8);
        assert_eq!(m.last_iterations(), 50);
        assert_eq!(m.samples[0].iterations, 1);
    }
}
