use chrono::Utc;

use ondemand_agent::capability::cputime::{parse_stat_line, CpuTimeProfiler};
use ondemand_agent::capability::{ProfileWindow, ProfilerCapability};

#[test]
fn parses_plain_stat_line() {
    // state=S, then fields 4..13, utime=250 (field 14), stime=75 (15)
    let line = "1234 (agent) S 1 1234 1234 0 -1 4194304 500 0 0 0 250 75 0 0 20 0 4 0 100 0 0";
    let ticks = parse_stat_line(line).expect("valid stat line");
    assert_eq!(ticks.utime, 250);
    assert_eq!(ticks.stime, 75);
}

#[test]
fn comm_with_spaces_and_parens_is_tolerated() {
    let line =
        "42 (tricky (comm) x) R 1 42 42 0 -1 4194304 500 0 0 0 11 7 0 0 20 0 4 0 100 0 0";
    let ticks = parse_stat_line(line).expect("fields counted from the closing paren");
    assert_eq!(ticks.utime, 11);
    assert_eq!(ticks.stime, 7);
}

#[test]
fn truncated_line_returns_none() {
    assert!(parse_stat_line("1234 (agent) S 1 1234").is_none());
    assert!(parse_stat_line("no closing paren here").is_none());
}

#[test]
fn non_numeric_fields_return_none() {
    let line = "1234 (agent) S 1 1234 1234 0 -1 4194304 500 0 0 0 abc 75 0 0 20 0 4 0 100 0 0";
    assert!(parse_stat_line(line).is_none());
}

#[cfg(target_os = "linux")]
#[test]
fn dump_after_start_produces_a_snapshot() {
    let profiler = CpuTimeProfiler::new();
    profiler.start();

    // Burn a little CPU so the deltas have a chance to be non-zero.
    let mut acc = 0u64;
    for i in 0..2_000_000u64 {
        acc = acc.wrapping_add(i);
    }
    assert!(acc > 0);

    let start = Utc::now() - chrono::Duration::milliseconds(10);
    let window = ProfileWindow::new(start, Utc::now());
    let snapshot = profiler.dump_profile(window).expect("snapshot on linux");
    assert_eq!(snapshot.window, window);

    let report: serde_json::Value =
        serde_json::from_slice(&snapshot.payload).expect("payload is json");
    assert!(report.get("utime_ticks").is_some());
    assert!(report.get("stime_ticks").is_some());
}

#[cfg(target_os = "linux")]
#[test]
fn dump_without_start_returns_none() {
    let profiler = CpuTimeProfiler::new();
    let now = Utc::now();
    assert!(profiler.dump_profile(ProfileWindow::new(now, now)).is_none());
}

#[cfg(target_os = "linux")]
#[test]
fn start_is_idempotent_for_the_baseline() {
    let profiler = CpuTimeProfiler::new();
    profiler.start();
    profiler.start(); // keeps the first baseline
    let now = Utc::now();
    assert!(profiler.dump_profile(ProfileWindow::new(now, now)).is_some());
    // Baseline consumed; the next window needs a fresh start.
    assert!(profiler.dump_profile(ProfileWindow::new(now, now)).is_none());
}
