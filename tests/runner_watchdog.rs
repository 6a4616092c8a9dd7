// tests/runner_watchdog.rs
#![cfg(unix)]

use std::error::Error;
use std::io::ErrorKind;
use std::time::Duration;

use watchrun::exec::{AbortSignal, CommandDescriptor, Outcome, Runner};
use watchrun_test_utils::builders::sh;
use watchrun_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn fast_command_completes_without_abort() -> TestResult {
    init_tracing();

    let result = with_timeout(
        Runner::new(sh("echo hello; echo oops >&2")).run(Duration::from_secs(1)),
    )
    .await;

    assert!(matches!(result.outcome, Outcome::Completed(0)), "{:?}", result.outcome);
    assert!(result.is_success());
    assert_eq!(result.abort_signal, None, "watchdog must not fire");
    assert_eq!(result.stdout_lossy(), "hello\n");
    assert_eq!(result.stderr_lossy(), "oops\n");
    assert!(result.elapsed < Duration::from_secs(1));
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_is_completed_with_its_code() -> TestResult {
    init_tracing();

    let result = with_timeout(
        Runner::new(sh("echo partial; exit 7")).run(Duration::from_secs(2)),
    )
    .await;

    assert_eq!(result.exit_code(), Some(7));
    assert!(!result.is_success());
    assert!(!result.is_ambiguous_failure(), "stdout was not empty");
    assert_eq!(result.stdout_lossy(), "partial\n");
    assert_eq!(result.abort_signal, None);
    Ok(())
}

#[tokio::test]
async fn large_output_is_captured_completely() -> TestResult {
    init_tracing();

    // Well past the OS pipe buffer, so the child blocks unless we drain
    // while waiting.
    let result = with_timeout(
        Runner::new(sh("i=0; while [ $i -lt 20000 ]; do echo 0123456789; i=$((i+1)); done"))
            .run(Duration::from_secs(5)),
    )
    .await;

    assert!(result.is_success(), "{:?}", result.outcome);
    assert_eq!(result.stdout.len(), 20000 * 11);
    Ok(())
}

#[tokio::test]
async fn sleeping_command_times_out_and_is_aborted() -> TestResult {
    init_tracing();

    let result = with_timeout(
        Runner::new(CommandDescriptor::new("sleep").arg("5")).run(Duration::from_millis(200)),
    )
    .await;

    assert!(result.is_timed_out(), "{:?}", result.outcome);
    assert_eq!(result.abort_signal, Some(AbortSignal::Abort));
    assert_eq!(result.exit_code(), None);
    assert!(result.elapsed >= Duration::from_millis(200));
    assert!(result.elapsed < Duration::from_secs(5));
    Ok(())
}

#[tokio::test]
async fn output_before_the_abort_is_kept() -> TestResult {
    init_tracing();

    let result = with_timeout(
        Runner::new(sh("echo started; echo warming >&2; exec sleep 5"))
            .run(Duration::from_millis(300)),
    )
    .await;

    assert!(result.is_timed_out());
    assert_eq!(result.stdout_lossy(), "started\n");
    assert_eq!(result.stderr_lossy(), "warming\n");
    Ok(())
}

#[tokio::test]
async fn process_ignoring_abort_is_killed_after_grace() -> TestResult {
    init_tracing();

    let result = with_timeout(
        Runner::new(sh("trap '' ABRT; echo ready; while :; do sleep 0.05; done"))
            .with_abort_grace(Duration::from_millis(300))
            .run(Duration::from_millis(200)),
    )
    .await;

    assert!(result.is_timed_out());
    assert_eq!(result.abort_signal, Some(AbortSignal::Kill));
    assert_eq!(result.stdout_lossy(), "ready\n");
    Ok(())
}

#[tokio::test]
async fn grandchild_holding_pipes_does_not_outlive_the_deadline() -> TestResult {
    init_tracing();

    // The trailing `:` keeps the shell from exec'ing sleep, so the sleep is
    // a grandchild that inherits the pipes and survives the abort.
    let result = with_timeout(
        Runner::new(sh("echo hi; sleep 30; :"))
            .with_abort_grace(Duration::from_millis(300))
            .run(Duration::from_millis(200)),
    )
    .await;

    assert!(result.is_timed_out(), "{:?}", result.outcome);
    assert_eq!(result.stdout_lossy(), "hi\n");
    assert!(
        result.elapsed < Duration::from_secs(2),
        "drain outlived the abort grace: {:?}",
        result.elapsed
    );
    Ok(())
}

#[tokio::test]
async fn missing_executable_fails_to_start() -> TestResult {
    init_tracing();

    let result = with_timeout(
        Runner::new(CommandDescriptor::new("/definitely/not/a/real/binary"))
            .run(Duration::from_millis(50)),
    )
    .await;

    match &result.outcome {
        Outcome::StartFailed(err) => assert_eq!(err.kind(), ErrorKind::NotFound),
        other => panic!("expected StartFailed, got {other:?}"),
    }
    assert_eq!(result.abort_signal, None);
    assert!(result.stdout.is_empty());
    assert!(result.stderr.is_empty());
    assert_eq!(result.elapsed, Duration::ZERO);
    Ok(())
}

#[tokio::test]
async fn invalid_working_directory_fails_to_start() -> TestResult {
    init_tracing();

    let descriptor = sh("pwd").current_dir("/definitely/not/a/real/dir");
    let result = with_timeout(Runner::new(descriptor).run(Duration::from_secs(1))).await;

    assert!(result.is_start_failure(), "{:?}", result.outcome);
    Ok(())
}

#[tokio::test]
async fn working_directory_is_applied() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let expected = dir.path().canonicalize()?;

    let result = with_timeout(
        Runner::new(sh("pwd -P").current_dir(dir.path())).run(Duration::from_secs(2)),
    )
    .await;

    assert!(result.is_success());
    assert_eq!(result.stdout_lossy().trim(), expected.to_string_lossy());
    Ok(())
}

#[tokio::test]
async fn env_overrides_reach_the_child_only() -> TestResult {
    init_tracing();

    let descriptor = sh(r#"printf '%s|%s|%s' "$HOME" "$WATCHRUN_CHILD_ONLY" "${PATH:+has-path}""#)
        .env("HOME", "/override/home")
        .env("WATCHRUN_CHILD_ONLY", "child")
        .env("", "ignored");

    let result = with_timeout(Runner::new(descriptor).run(Duration::from_secs(2))).await;

    assert!(result.is_success(), "{:?}", result.outcome);
    assert_eq!(result.stdout_lossy(), "/override/home|child|has-path");
    assert!(
        std::env::var_os("WATCHRUN_CHILD_ONLY").is_none(),
        "our own environment must not change"
    );
    Ok(())
}
