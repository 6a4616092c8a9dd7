// tests/driver_retry.rs
#![cfg(unix)]

use std::error::Error;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use watchrun::driver::RetryDriver;
use watchrun::driver::report::{EXIT_CANCELLED, EXIT_START_FAILED, EXIT_TIMED_OUT};
use watchrun::exec::{CommandDescriptor, Outcome};
use watchrun_test_utils::builders::{sh, RetryOptionsBuilder};
use watchrun_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn success_needs_a_single_attempt() -> TestResult {
    init_tracing();

    let driver = RetryDriver::new(RetryOptionsBuilder::new().build());
    let report = with_timeout(driver.run(&sh("echo ok"))).await;

    assert!(report.succeeded());
    assert_eq!(report.attempts, 1);
    assert!(!report.verbose_rerun);
    assert!(!report.cancelled);
    assert_eq!(report.exit_code(), 0);
    Ok(())
}

#[tokio::test]
async fn failures_are_retried_once_per_backoff_delay() -> TestResult {
    init_tracing();

    // 1ms, 2ms, 4ms -> three retries after the first attempt.
    let driver = RetryDriver::new(RetryOptionsBuilder::new().build());
    let report = with_timeout(driver.run(&sh("echo failing; exit 3"))).await;

    assert!(!report.succeeded());
    assert_eq!(report.attempts, 4);
    assert_eq!(report.last.exit_code(), Some(3));
    assert_eq!(report.exit_code(), 3);
    Ok(())
}

#[tokio::test]
async fn a_later_attempt_can_succeed() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let marker = dir.path().join("attempts");
    // Fails until this is the third run.
    let script = format!(
        r#"echo x >> "{0}"; [ $(wc -l < "{0}") -ge 3 ] && echo done"#,
        marker.display()
    );

    let driver = RetryDriver::new(RetryOptionsBuilder::new().build());
    let report = with_timeout(driver.run(&sh(&script))).await;

    assert!(report.succeeded(), "{:?}", report.last.outcome);
    assert_eq!(report.attempts, 3);
    assert_eq!(report.last.stdout_lossy(), "done\n");
    Ok(())
}

#[tokio::test]
async fn start_failures_are_not_retried() -> TestResult {
    init_tracing();

    let driver = RetryDriver::new(RetryOptionsBuilder::new().build());
    let report = with_timeout(driver.run(&CommandDescriptor::new("/no/such/tool"))).await;

    assert!(matches!(report.last.outcome, Outcome::StartFailed(_)));
    assert_eq!(report.attempts, 1);
    assert_eq!(report.exit_code(), EXIT_START_FAILED);
    Ok(())
}

#[tokio::test]
async fn timeouts_are_retried_and_reported() -> TestResult {
    init_tracing();

    let options = RetryOptionsBuilder::new()
        .timeout(Duration::from_millis(100))
        .backoff(Duration::from_millis(1), Duration::from_millis(1), 2.0)
        .build();
    let driver = RetryDriver::new(options);
    let report = with_timeout(driver.run(&CommandDescriptor::new("sleep").arg("5"))).await;

    assert!(report.last.is_timed_out());
    assert_eq!(report.attempts, 2);
    assert_eq!(report.exit_code(), EXIT_TIMED_OUT);
    Ok(())
}

#[tokio::test]
async fn silent_failure_triggers_one_verbose_rerun() -> TestResult {
    init_tracing();

    let options = RetryOptionsBuilder::new()
        .retry(false)
        .verbose_rerun_arg("-v")
        .build();
    let driver = RetryDriver::new(options);
    let script = r#"if [ "$1" = "-v" ]; then echo "verbose details"; fi; exit 1"#;

    let report = with_timeout(driver.run(&sh(script))).await;

    assert!(report.verbose_rerun);
    assert_eq!(report.attempts, 2);
    assert_eq!(report.last.stdout_lossy(), "verbose details\n");
    assert_eq!(report.last.exit_code(), Some(1));
    Ok(())
}

#[tokio::test]
async fn verbose_rerun_fires_at_most_once() -> TestResult {
    init_tracing();

    let options = RetryOptionsBuilder::new().verbose_rerun_arg("-v").build();
    let driver = RetryDriver::new(options);

    let report = with_timeout(driver.run(&sh("exit 2"))).await;

    // first attempt + verbose rerun + three backoff retries
    assert!(report.verbose_rerun);
    assert_eq!(report.attempts, 5);
    Ok(())
}

#[tokio::test]
async fn failure_with_output_skips_verbose_rerun() -> TestResult {
    init_tracing();

    let options = RetryOptionsBuilder::new()
        .retry(false)
        .verbose_rerun_arg("-v")
        .build();
    let driver = RetryDriver::new(options);

    let report = with_timeout(driver.run(&sh("echo something; exit 1"))).await;

    assert!(!report.verbose_rerun);
    assert_eq!(report.attempts, 1);
    Ok(())
}

#[tokio::test]
async fn cancellation_interrupts_the_backoff_wait() -> TestResult {
    init_tracing();

    let options = RetryOptionsBuilder::new()
        .backoff(Duration::from_secs(30), Duration::from_secs(60), 2.0)
        .build();
    let cancel = CancellationToken::new();
    let driver = RetryDriver::with_cancellation(options, cancel.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        cancel.cancel();
    });

    let started = Instant::now();
    let report = with_timeout(driver.run(&sh("exit 1"))).await;

    assert!(report.cancelled);
    assert_eq!(report.attempts, 1);
    assert_eq!(report.exit_code(), EXIT_CANCELLED);
    assert!(started.elapsed() < Duration::from_secs(5));
    Ok(())
}
