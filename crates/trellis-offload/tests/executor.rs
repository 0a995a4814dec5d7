// File: crates/trellis-offload/tests/executor.rs
// Purpose: Both executors return bit-identical responses; failures surface as
//          the error variant, never a panic.

use trellis_core::protocol::{OffloadRequest, OffloadResponse, SampleMethod};
use trellis_core::record::{record, Value};
use trellis_core::series::Point;
use trellis_offload::{default_executor, BackgroundExecutor, Executor, InProcessExecutor};

fn sample_request(n: usize, threshold: usize) -> OffloadRequest {
    let points: Vec<Point> =
        (0..n).map(|i| Point::new(i as f64, (i as f64 * 0.1).sin())).collect();
    OffloadRequest::Sample { points, threshold, method: SampleMethod::Lttb }
}

#[test]
fn background_and_in_process_agree() {
    let background = BackgroundExecutor::spawn().expect("worker thread");
    let in_process = InProcessExecutor;

    for request in [
        sample_request(1000, 100),
        OffloadRequest::Percentiles { values: vec![5.0, 1.0, 3.0], percentiles: vec![50.0, 99.0] },
        OffloadRequest::GrowthRate {
            rows: vec![record([("v", 10.0)]), record([("v", 20.0)])],
            field: "v".to_string(),
        },
    ] {
        assert_eq!(background.execute(request.clone()), in_process.execute(request));
    }
}

#[test]
fn background_worker_handles_many_sequential_requests() {
    let background = BackgroundExecutor::spawn().expect("worker thread");
    for threshold in 3..40 {
        let response = background.execute(sample_request(200, threshold));
        assert!(matches!(response, OffloadResponse::Success { .. }));
    }
}

#[test]
fn contract_violations_surface_as_error_variant() {
    let executor = default_executor();
    let response = executor.execute(OffloadRequest::BinData {
        rows: vec![record([("v", Value::Number(1.0))])],
        field: "v".to_string(),
        bin_count: 0,
    });
    assert!(matches!(response, OffloadResponse::Error { .. }));
}

#[test]
fn default_executor_runs_requests() {
    let executor = default_executor();
    let response = executor.execute(sample_request(50, 10));
    assert!(matches!(response, OffloadResponse::Success { .. }));
}

#[test]
fn executors_are_shareable_across_threads() {
    use std::sync::Arc;
    let executor: Arc<dyn Executor> = Arc::from(default_executor());
    let mut handles = Vec::new();
    for _ in 0..4 {
        let executor = Arc::clone(&executor);
        handles.push(std::thread::spawn(move || executor.execute(sample_request(500, 50))));
    }
    let first = InProcessExecutor.execute(sample_request(500, 50));
    for handle in handles {
        assert_eq!(handle.join().unwrap(), first);
    }
}
