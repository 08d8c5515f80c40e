//! Integration tests for Calibench
//!
//! These tests verify the end-to-end behavior of the engine: calibration,
//! skip/fail handling, sub-benchmark trees, statistics and reporting.

use calibench::prelude::*;
use calibench::{
    BenchState, BenchmarkDef, BenchmarkStatus, Failure, Headline, MAX_ITERATIONS,
    Measurement, Sample, Suite, build_report, compute_trimmed, format_human_output,
    generate_compact_json, run_suite,
};
use std::sync::Mutex;
use std::time::Duration;

fn fixed(n: u64) -> RunConfig {
    RunConfig {
        bench_time: BenchTime::Iterations(n),
        settle_heap: false,
        ..RunConfig::default()
    }
}

fn target(ms: u64) -> RunConfig {
    RunConfig {
        bench_time: BenchTime::Target(Duration::from_millis(ms)),
        settle_heap: false,
        ..RunConfig::default()
    }
}

fn spin(b: &mut Bencher) -> Outcome {
    for i in 0..b.n() {
        black_box((0..20u64).fold(i, |acc, x| acc.wrapping_mul(31).wrapping_add(x)));
    }
    Ok(())
}

/// A fixed count above one runs the workload exactly once at that count
#[test]
fn test_fixed_count_invoked_once_at_n() {
    for n in [2u64, 17, 1_000] {
        let calls = Mutex::new(Vec::new());
        let (bencher, measurement) = run_suite(
            "fixed",
            |b: &mut Bencher| {
                calls.lock().unwrap().push(b.n());
                Ok(())
            },
            &fixed(n),
        );

        let calls = calls.into_inner().unwrap();
        assert_eq!(calls.iter().filter(|&&c| c == n).count(), 1, "n = {n}");
        assert!(calls.iter().all(|&c| c == 1 || c == n));
        assert_eq!(bencher.state(), &BenchState::Passed);
        assert_eq!(measurement.map(|m| m.iterations), Some(n));
    }
}

/// Calibration terminates and N strictly increases between steps
#[test]
fn test_calibration_terminates_with_growing_n() {
    let (bencher, measurement) = run_suite("spin", spin, &target(30));
    assert!(!bencher.is_failed(), "{:?}", bencher.reason());

    let m = measurement.expect("passed leaf has a measurement");
    assert_eq!(m.samples[0].iterations, 1);
    assert!(m.samples.windows(2).all(|w| w[1].iterations > w[0].iterations));
    assert!(m.duration_nanos >= 30_000_000 || m.last_iterations() >= MAX_ITERATIONS);
    assert_eq!(m.iterations, m.samples.iter().map(|s| s.iterations).sum::<u64>());
}

/// Growth per step is capped at 100x even for an instantaneous workload
#[test]
fn test_growth_is_capped() {
    let (_, measurement) = run_suite("empty", |_: &mut Bencher| Ok(()), &target(5));
    let m = measurement.expect("measurement");
    assert!(
        m.samples
            .windows(2)
            .all(|w| w[1].iterations <= w[0].iterations * 100)
    );
}

/// A skipped benchmark has no result and never runs again
#[test]
fn test_skip_produces_no_result() {
    let calls = Mutex::new(0u32);
    let (bencher, measurement) = run_suite(
        "skipper",
        |b: &mut Bencher| {
            *calls.lock().unwrap() += 1;
            b.skip("needs a GPU")
        },
        &target(50),
    );

    assert!(bencher.is_skipped());
    assert!(!bencher.is_failed());
    assert_eq!(bencher.reason().as_deref(), Some("needs a GPU"));
    assert!(measurement.is_none());
    assert_eq!(calls.into_inner().unwrap(), 1);
}

/// A failure stays local: later benchmarks in the suite still run
#[test]
fn test_fail_does_not_stop_siblings() {
    let mut suite = Suite::new(fixed(10));
    assert!(!suite.run("broken", |b: &mut Bencher| b.fail("checksum mismatch")));
    assert!(suite.run("after", spin));
    let outcome = suite.finish();

    let broken = &outcome.root.children[0];
    assert!(broken.is_failed());
    assert!(broken.measurement.is_none());
    assert_eq!(broken.reason().as_deref(), Some("checksum mismatch"));

    let after = &outcome.root.children[1];
    assert_eq!(after.state, BenchState::Passed);
    assert_eq!(after.measurement.as_ref().map(|m| m.iterations), Some(10));
}

/// A panicking workload fails its benchmark without taking the engine down
#[test]
fn test_panic_is_contained() {
    let (bencher, measurement) = run_suite(
        "explodes",
        |b: &mut Bencher| -> Outcome {
            if b.n() > 1 {
                panic!("index out of range");
            }
            Ok(())
        },
        &fixed(5),
    );

    assert!(measurement.is_none());
    match bencher.state() {
        BenchState::Failed(Failure::Crashed(message)) => {
            assert!(message.contains("index out of range"))
        }
        other => panic!("unexpected state: {other:?}"),
    }
}

/// A call that overruns its budget and honours cancellation fails with a timeout
#[test]
fn test_overrun_is_timeout() {
    let config = RunConfig {
        timeout: Duration::from_millis(40),
        ..fixed(1)
    };
    let (bencher, measurement) = run_suite(
        "hangs",
        |b: &mut Bencher| -> Outcome {
            loop {
                b.check_deadline()?;
                std::thread::sleep(Duration::from_millis(1));
            }
        },
        &config,
    );

    assert!(measurement.is_none());
    assert!(matches!(
        bencher.state(),
        BenchState::Failed(Failure::Timeout { .. })
    ));
}

/// A parent that spawns sub-benchmarks has no result of its own
#[test]
fn test_parent_with_children_has_no_result() {
    let (parent, measurement) = run_suite(
        "codec",
        |b: &mut Bencher| {
            b.run("encode", spin);
            b.run("decode", spin);
            Ok(())
        },
        &fixed(8),
    );

    assert!(measurement.is_none());
    assert_eq!(parent.state(), &BenchState::Passed);

    let names: Vec<_> = parent.children().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["codec:encode", "codec:decode"]);
    assert!(
        parent
            .children()
            .iter()
            .all(|c| c.measurement.as_ref().map(|m| m.iterations) == Some(8))
    );
}

/// Sub-benchmarks spawned only on a later step still make a grouping node
#[test]
fn test_late_sub_benchmark_makes_group() {
    let workload = |b: &mut Bencher| -> Outcome {
        if b.n() > 1 {
            b.run("child", spin);
        }
        spin(b)
    };

    for config in [fixed(5), target(10)] {
        let (parent, measurement) = run_suite("late", workload, &config);

        assert!(measurement.is_none());
        assert!(parent.measurement().is_none());
        assert_eq!(parent.state(), &BenchState::Passed);
        assert_eq!(parent.children().len(), 1);
        assert_eq!(parent.children()[0].name, "late:child");
        assert!(parent.children()[0].measurement.is_some());

        let node = parent.into_node();
        assert!(node.is_group());
        assert!(node.measurement.is_none());
    }
}

/// Children inherit bench time unless they override it, and nest their names
#[test]
fn test_nested_names_and_overrides() {
    let (parent, _) = run_suite(
        "outer",
        |b: &mut Bencher| {
            b.run("mid", |b: &mut Bencher| {
                b.run_with("inner", BenchTime::Iterations(3), spin);
                Ok(())
            });
            Ok(())
        },
        &fixed(50),
    );

    let mid = &parent.children()[0];
    assert_eq!(mid.name, "outer:mid");
    let inner = &mid.children[0];
    assert_eq!(inner.name, "outer:mid:inner");
    assert_eq!(inner.bench_time, BenchTime::Iterations(3));
    assert_eq!(inner.measurement.as_ref().map(|m| m.iterations), Some(3));
}

/// A failing child marks its parent failed; all-skipped children skip the parent
#[test]
fn test_child_states_propagate() {
    let (parent, _) = run_suite(
        "group",
        |b: &mut Bencher| {
            b.run("ok", spin);
            b.run("bad", |b: &mut Bencher| b.fail("nope"));
            Ok(())
        },
        &fixed(4),
    );
    assert!(parent.is_failed());
    assert_eq!(
        parent.reason().as_deref(),
        Some("sub-benchmark failed: group:bad")
    );

    let (parent, _) = run_suite(
        "optional",
        |b: &mut Bencher| {
            b.run("a", |b: &mut Bencher| b.skip("no"));
            b.run("b", |b: &mut Bencher| b.skip("no"));
            Ok(())
        },
        &fixed(4),
    );
    assert!(parent.is_skipped());
}

/// Trimmed statistics over 1..=10 keep 2..=9
#[test]
fn test_trimmed_stats_one_through_ten() {
    let values: Vec<f64> = (1..=10).map(f64::from).collect();
    let s = compute_trimmed(&values);
    assert_eq!(s.values.len(), 8);
    assert_eq!(s.min, 2.0);
    assert_eq!(s.max, 9.0);
    assert!((s.average - 5.5).abs() < 1e-12);
}

/// 100 declared bytes over 1000 iterations in 0.1s is exactly 1 MB/s
#[test]
fn test_megabytes_per_second() {
    let mut m = Measurement::default();
    m.push(Sample {
        iterations: 1_000,
        duration_nanos: 100_000_000,
        net_bytes: 0,
        alloc_count: 0,
        bytes_per_iteration: 100,
    });
    assert_eq!(Headline::from_measurement(&m).megabytes_per_sec, 1.0);
}

/// Declared bytes flow from the workload into the measurement
#[test]
fn test_declared_bytes_reach_measurement() {
    let (_, measurement) = run_suite(
        "copy",
        |b: &mut Bencher| {
            b.set_bytes_per_iteration(4096);
            spin(b)
        },
        &fixed(100),
    );
    let m = measurement.expect("measurement");
    assert_eq!(m.bytes_per_iteration, 4096);
    assert!(Headline::from_measurement(&m).megabytes_per_sec > 0.0);
}

/// One finished tree renders both ways without re-running anything
#[test]
fn test_report_renders_human_and_compact() {
    let runs = Mutex::new(0u32);
    let config = fixed(16);
    let mut suite = Suite::new(config.clone());
    suite.run("hash", |b: &mut Bencher| {
        *runs.lock().unwrap() += 1;
        spin(b)
    });
    suite.run("parse", |b: &mut Bencher| {
        b.run("small", spin);
        b.run("huge", |b: &mut Bencher| b.skip("fixture missing"));
        Ok(())
    });
    let outcome = suite.finish();
    let runs_before = *runs.lock().unwrap();

    let report = build_report(&outcome, &config);
    let human = format_human_output(&report);
    let compact = generate_compact_json(&report).unwrap();
    assert_eq!(*runs.lock().unwrap(), runs_before);

    assert!(human.contains("✓ hash"));
    assert!(human.contains("  ⊘ parse:huge  (fixture missing)"));

    let value: serde_json::Value = serde_json::from_str(&compact).unwrap();
    assert_eq!(value["hash"]["iterations"], 16);
    assert_eq!(value["parse:small"]["iterations"], 16);
    assert!(value.get("parse").is_none());
    assert!(value.get("parse:huge").is_none());

    assert_eq!(
        report.entry("parse:huge").map(|e| e.status),
        Some(BenchmarkStatus::Skipped)
    );
}

// ============================================================================
// Registration via attribute macros
// ============================================================================

#[calibench::bench(iterations = 7, tags = "smoke")]
fn registered_unit(b: &mut Bencher) {
    for i in 0..b.n() {
        black_box(i);
    }
}

#[calibench::bench(name = "registered/outcome", time = "5ms")]
fn registered_outcome(b: &mut Bencher) -> Outcome {
    spin(b)
}

#[calibench::trigger(before)]
fn registered_trigger() {}

/// Macros submit definitions that the registry can find and run
#[test]
fn test_macros_register_definitions() {
    let defs: Vec<&BenchmarkDef> = calibench::internal::inventory::iter::<BenchmarkDef>
        .into_iter()
        .collect();

    let unit = defs
        .iter()
        .find(|d| d.name == "registered_unit")
        .expect("registered_unit");
    assert_eq!(unit.bench_time(), Some(BenchTime::Iterations(7)));
    assert_eq!(unit.tags, &["smoke"]);

    let outcome = defs
        .iter()
        .find(|d| d.name == "registered/outcome")
        .expect("registered/outcome");
    assert_eq!(
        outcome.bench_time(),
        Some(BenchTime::Target(Duration::from_millis(5)))
    );

    let mut suite = Suite::new(fixed(1));
    assert!(suite.run_def(unit));
    let finished = suite.finish();
    assert_eq!(
        finished.root.children[0]
            .measurement
            .as_ref()
            .map(|m| m.iterations),
        Some(7)
    );

    assert!(
        calibench::internal::inventory::iter::<calibench::TriggerDef>
            .into_iter()
            .any(|t| t.name == "registered_trigger")
    );
}
