//! Controller state-machine tests: start/stop/status transitions,
//! idempotent refusals, and concurrent start arbitration.

use std::sync::Arc;

use ondemand_agent::capability::ExportPipeline;
use ondemand_agent::session::SessionControllerBuilder;
use ondemand_agent::AppError;

use super::support::{armed_controller, MockExporter};

#[test]
fn builder_without_exporter_is_refused() {
    let err = SessionControllerBuilder::new().build().unwrap_err();
    assert!(matches!(err, AppError::NotInitialized(_)));
}

#[tokio::test]
async fn start_before_arming_is_refused() {
    let exporter = Arc::new(MockExporter::default());
    let controller = SessionControllerBuilder::new()
        .exporter(exporter.clone() as Arc<dyn ExportPipeline>)
        .build()
        .expect("build with exporter");

    let result = controller.start(30).await;
    assert!(!result.success);
    assert_eq!(result.message, "Profiler not initialized");
    assert!(!controller.status());
    assert_eq!(exporter.export_count(), 0);
}

#[tokio::test]
async fn start_activates_and_stop_idles() {
    let (controller, profiler, exporter) = armed_controller(0);

    let started = controller.start(30).await;
    assert!(started.success);
    assert_eq!(started.message, "Profiling started for 30 seconds");
    assert!(controller.status());
    assert!(profiler.is_running());

    let stopped = controller.stop().await;
    assert!(stopped.success);
    assert_eq!(stopped.message, "Profiling stopped and data sent");
    assert!(!controller.status());
    assert!(!profiler.is_running());
    assert_eq!(exporter.export_count(), 1);
}

#[tokio::test]
async fn zero_duration_runs_indefinitely() {
    let (controller, _profiler, _exporter) = armed_controller(0);

    let result = controller.start(0).await;
    assert!(result.success);
    assert_eq!(result.message, "Profiling started for an indefinite period");
    assert!(controller.status());

    controller.stop().await;
}

#[tokio::test]
async fn second_start_is_refused_without_side_effects() {
    let (controller, profiler, _exporter) = armed_controller(0);

    assert!(controller.start(0).await.success);
    let second = controller.start(0).await;
    assert!(!second.success);
    assert_eq!(second.message, "Profiling session already active");
    assert_eq!(profiler.starts(), 1);

    controller.stop().await;
}

#[tokio::test]
async fn stop_when_idle_touches_no_collaborator() {
    let (controller, profiler, exporter) = armed_controller(0);

    let result = controller.stop().await;
    assert!(!result.success);
    assert_eq!(result.message, "No active profiling session");
    assert_eq!(profiler.starts(), 0);
    assert_eq!(profiler.stops(), 0);
    assert_eq!(exporter.export_count(), 0);
}

#[tokio::test]
async fn concurrent_starts_grant_exactly_one() {
    let (controller, profiler, _exporter) = armed_controller(0);

    let a = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.start(0).await })
    };
    let b = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.start(0).await })
    };

    let (a, b) = tokio::join!(a, b);
    let (a, b) = (a.expect("task a"), b.expect("task b"));

    assert_eq!(
        usize::from(a.success) + usize::from(b.success),
        1,
        "exactly one start wins: {a:?} / {b:?}"
    );
    assert_eq!(profiler.starts(), 1, "loser caused no profiler invocation");

    controller.stop().await;
}

#[tokio::test]
async fn export_failure_on_stop_still_transitions_to_idle() {
    let (controller, _profiler, exporter) = armed_controller(0);

    assert!(controller.start(0).await.success);
    exporter.set_failing(true);

    let result = controller.stop().await;
    assert!(!result.success);
    assert!(
        result.message.starts_with("Failed to stop profiling:"),
        "unexpected message: {}",
        result.message
    );
    assert!(!controller.status(), "controller never wedges active");
    assert_eq!(controller.export_failures(), 1);

    // A fresh session is possible immediately.
    exporter.set_failing(false);
    assert!(controller.start(0).await.success);
    assert!(controller.stop().await.success);
}

#[tokio::test]
async fn shutdown_stops_an_active_session() {
    let (controller, profiler, exporter) = armed_controller(0);

    assert!(controller.start(0).await.success);
    controller.shutdown().await;

    assert!(!controller.status());
    assert!(!profiler.is_running());
    assert_eq!(exporter.export_count(), 1, "final window exported");
}

#[tokio::test]
async fn shutdown_when_idle_is_a_no_op() {
    let (controller, profiler, exporter) = armed_controller(0);
    controller.shutdown().await;
    assert_eq!(profiler.stops(), 0);
    assert_eq!(exporter.export_count(), 0);
}

#[tokio::test]
async fn final_window_covers_the_whole_session() {
    let (controller, profiler, _exporter) = armed_controller(0);

    let before = chrono::Utc::now();
    assert!(controller.start(0).await.success);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(controller.stop().await.success);
    let after = chrono::Utc::now();

    let windows = profiler.dumped_windows();
    assert_eq!(windows.len(), 1);
    assert!(windows[0].start >= before && windows[0].start <= after);
    assert!(windows[0].end >= windows[0].start && windows[0].end <= after);
}
