use std::sync::{Arc, Mutex};

use sheet_intake::intake::{
    CompositeObserver, IntakeContext, IntakeObserver, IntakeSeverity, TracingObserver,
};
use sheet_intake::pipeline::{IntakeOptions, IntakePipeline};
use sheet_intake::store::MemoryStore;
use sheet_intake::types::CandidateFile;
use sheet_intake::IntakeError;

#[derive(Default)]
struct RecordingObserver {
    failures: Mutex<Vec<IntakeSeverity>>,
    alerts: Mutex<Vec<IntakeSeverity>>,
}

impl IntakeObserver for RecordingObserver {
    fn on_failure(&self, _ctx: &IntakeContext, severity: IntakeSeverity, _error: &IntakeError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &IntakeContext, severity: IntakeSeverity, _error: &IntakeError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("sheet_intake=debug")
        .with_test_writer()
        .try_init();
}

#[tokio::test]
async fn store_failure_is_critical_and_alerts() {
    init_tracing();
    let obs = Arc::new(RecordingObserver::default());
    let store = Arc::new(MemoryStore::new().reject_name("a.csv"));
    let pipeline = IntakePipeline::new(store).with_observer(obs.clone());

    pipeline
        .upload_batch(vec![CandidateFile::from_bytes("a.csv", &b"x\n1"[..])])
        .await
        .unwrap();

    assert_eq!(*obs.failures.lock().unwrap(), vec![IntakeSeverity::Critical]);
    assert_eq!(*obs.alerts.lock().unwrap(), vec![IntakeSeverity::Critical]);
}

/// Shows a toast per failure and nothing else.
#[derive(Default)]
struct ToastObserver {
    toasts: Mutex<Vec<String>>,
}

impl IntakeObserver for ToastObserver {
    fn on_failure(&self, ctx: &IntakeContext, _severity: IntakeSeverity, _error: &IntakeError) {
        self.toasts.lock().unwrap().push(ctx.file_name.clone());
    }
}

#[tokio::test]
async fn alerting_failure_reaches_on_failure_once() {
    let obs = Arc::new(ToastObserver::default());
    let store = Arc::new(MemoryStore::new().reject_name("a.csv"));
    let pipeline = IntakePipeline::new(store).with_observer(obs.clone());

    pipeline
        .upload_batch(vec![CandidateFile::from_bytes("a.csv", &b"x\n1"[..])])
        .await
        .unwrap();

    assert_eq!(*obs.toasts.lock().unwrap(), vec!["a.csv".to_string()]);
}

#[tokio::test]
async fn decode_failure_is_error_without_alert_at_default_threshold() {
    init_tracing();
    let obs = Arc::new(RecordingObserver::default());
    let pipeline = IntakePipeline::new(Arc::new(MemoryStore::new())).with_observer(obs.clone());

    pipeline
        .upload_batch(vec![CandidateFile::from_bytes("empty.csv", &b""[..])])
        .await
        .unwrap();

    assert_eq!(*obs.failures.lock().unwrap(), vec![IntakeSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn lower_threshold_alerts_on_decode_failure() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IntakeOptions {
        alert_at_or_above: IntakeSeverity::Error,
        ..Default::default()
    };
    let pipeline =
        IntakePipeline::with_options(Arc::new(MemoryStore::new()), opts).with_observer(obs.clone());

    pipeline
        .upload_batch(vec![CandidateFile::from_bytes("empty.csv", &b""[..])])
        .await
        .unwrap();

    assert_eq!(*obs.alerts.lock().unwrap(), vec![IntakeSeverity::Error]);
}

#[tokio::test]
async fn composite_observer_fans_out() {
    init_tracing();
    let a = Arc::new(RecordingObserver::default());
    let b = Arc::new(RecordingObserver::default());
    let observers: Vec<Arc<dyn IntakeObserver>> = vec![a.clone(), b.clone(), Arc::new(TracingObserver)];
    let composite = CompositeObserver::new(observers);
    let pipeline = IntakePipeline::new(Arc::new(MemoryStore::new())).with_observer(Arc::new(composite));

    pipeline
        .upload_batch(vec![
            CandidateFile::from_bytes("bad.csv", &b""[..]),
            CandidateFile::from_bytes("good.csv", &b"x\n1"[..]),
        ])
        .await
        .unwrap();

    assert_eq!(*a.failures.lock().unwrap(), vec![IntakeSeverity::Error]);
    assert_eq!(*b.failures.lock().unwrap(), vec![IntakeSeverity::Error]);
}

#[test]
fn severity_orders_by_impact() {
    assert!(IntakeSeverity::Info < IntakeSeverity::Warning);
    assert!(IntakeSeverity::Warning < IntakeSeverity::Error);
    assert!(IntakeSeverity::Error < IntakeSeverity::Critical);

    let err = IntakeError::EmptyBatch {
        rejections: Vec::new(),
    };
    assert_eq!(err.severity(), IntakeSeverity::Warning);
    assert_eq!(err.to_string(), "no valid files in batch (0 rejected)");
}
