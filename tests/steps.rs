#![cfg(feature = "int_test")]

use serial_test::serial;
use std::fs;
use std::path::Path;
use steptrace::debugger::process::Child;
use steptrace::debugger::{self, SessionEnd, SessionReport, StepSession, StopReason, Syntax};
use steptrace::plot;

const TRUE_APP: &str = "/bin/true";
const SLEEP_APP: &str = "/bin/sleep";

fn trace(program: &str, args: &[&str], log: &Path, syntax: Syntax, limit: Option<u64>) -> SessionReport {
    let process = Child::new(program, args.iter().copied(), None::<&str>);
    let session = StepSession::new().with_step_limit(limit);
    debugger::log_instructions(process, log, syntax, &session).unwrap()
}

fn log_lines(log: &Path) -> Vec<String> {
    fs::read_to_string(log)
        .unwrap()
        .lines()
        .map(ToString::to_string)
        .collect()
}

#[test]
#[serial]
fn test_log_until_exit() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("instructions.txt");

    let report = trace(TRUE_APP, &[], &log, Syntax::Att, None);
    assert_eq!(report.end, SessionEnd::Finished(StopReason::Exited(0)));

    let lines = log_lines(&log);
    assert_eq!(lines.len() as u64, report.steps);
    assert!(report.steps > 1000);
    assert!(lines.iter().all(|l| l.starts_with("0x")));
    assert!(lines.iter().all(|l| plot::mnemonic(l).is_some()));
    assert!(lines.iter().any(|l| plot::mnemonic(l) == Some("syscall")));
}

#[test]
#[serial]
fn test_step_limit() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("instructions.txt");

    let report = trace(SLEEP_APP, &["10"], &log, Syntax::Intel, Some(500));
    assert_eq!(report.end, SessionEnd::StepLimit);
    assert_eq!(report.steps, 500);
    assert_eq!(log_lines(&log).len(), 500);
}

#[test]
#[serial]
fn test_log_is_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("instructions.txt");

    trace(TRUE_APP, &[], &log, Syntax::Att, Some(300));
    trace(TRUE_APP, &[], &log, Syntax::Att, Some(100));
    assert_eq!(log_lines(&log).len(), 100);
}

#[test]
#[serial]
fn test_missing_program() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("instructions.txt");

    let process = Child::new("/not/exists", Vec::<String>::new(), None::<&str>);
    let result = debugger::log_instructions(process, &log, Syntax::Att, &StepSession::new());
    assert!(matches!(result, Err(debugger::Error::ProcessExit(127))));
    assert!(!log.exists());
}
