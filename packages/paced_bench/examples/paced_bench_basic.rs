//! Compares a few ways of building a collection, printing throughput as each workload finishes.
//!
//! Set `RUST_LOG=paced_bench=debug` to see the suite lifecycle in the log output.
//!
//! Run with: `cargo run --example paced_bench_basic`.

use std::collections::BTreeMap;
use std::error::Error;
use std::hint::black_box;
use std::time::Duration;

use new_zealand::nz;
use paced_bench::{Measure, Suite, SuiteEvent, SuiteOptions};
use tracing_subscriber::EnvFilter;

const ITEMS: usize = 256;

fn main() -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let options = SuiteOptions::new()
        .with_interval(Duration::from_millis(250))
        .with_run_budget(Duration::from_millis(500))
        .with_test_runs(nz!(4));

    let mut suite = Suite::with_options(options)?;

    suite.add("vec push", |_| {
        let mut items = Vec::new();
        for i in 0..ITEMS {
            items.push(black_box(i));
        }
        black_box(items);
    })?;

    suite.add("vec with capacity", |_| {
        let mut items = Vec::with_capacity(ITEMS);
        for i in 0..ITEMS {
            items.push(black_box(i));
        }
        black_box(items);
    })?;

    // The map is built once in the scratch state and then reused by every invocation.
    suite
        .add("btree lookup", |scratch| {
            let map = scratch
                .get::<BTreeMap<usize, usize>>("map")
                .expect("seeded before the suite starts");

            for i in 0..ITEMS {
                black_box(map.get(&black_box(i)));
            }
        })?
        .scratch_mut()
        .insert("map", (0..ITEMS).map(|i| (i, i)).collect::<BTreeMap<_, _>>());

    suite.on(SuiteEvent::Calibrated, |_event, subject| {
        if let Some(metrics) = subject.suite().and_then(|s| s.calibration_metrics()) {
            println!("{:<20} {metrics}", "(empty workload)");
        }
    });

    suite.on(SuiteEvent::Tested, |_event, subject| {
        if let Some(workload) = subject.workload() {
            let metrics = workload.metrics();

            println!(
                "{:<20} {} (per operation: {:?})",
                workload.name(),
                metrics.to_formatted_string(Measure::Average, ",", "."),
                metrics.operation_time(Measure::Average).unwrap_or_default()
            );
        }
    });

    suite.on(SuiteEvent::Error, |_event, subject| {
        if let Some(error) = subject.error() {
            eprintln!("benchmark failed: {error}");
        }
    });

    suite.run()?;

    Ok(())
}
