// Tests for the TeamCity reporter - public API only

use teamcity_reporter::config::{ReportDesign, ReporterOptions};
use teamcity_reporter::model::{
    Attachment, FullResult, MetadataObject, MetadataValue, ProjectConfig, RunConfig, RunStatus,
    SuiteTree, TestError, TestId, TestResult, TestStatus,
};
use teamcity_reporter::report::{ConsoleLine, MemoryConsole, Reporter, ReporterMode};
use teamcity_reporter::{ReporterError, TeamcityReporter, escape};

/// root -> projectSuite -> fileSuiteA -> storySuiteA -> testFromSuiteA
///                      -> fileSuiteB -> storySuiteB -> testFromSuiteB
struct Fixture {
    tree: SuiteTree,
    test_a: TestId,
    test_b: TestId,
}

fn fixture() -> Fixture {
    let mut tree = SuiteTree::new();
    let project = tree.add_suite(tree.root(), "projectSuite").unwrap();
    let file_a = tree.add_suite(project, "fileSuiteA").unwrap();
    let story_a = tree.add_suite(file_a, "storySuiteA").unwrap();
    let test_a = tree.add_test(story_a, "testFromSuiteA", 30_000).unwrap();
    let file_b = tree.add_suite(project, "fileSuiteB").unwrap();
    let story_b = tree.add_suite(file_b, "storySuiteB").unwrap();
    let test_b = tree.add_test(story_b, "testFromSuiteB", 30_000).unwrap();
    Fixture {
        tree,
        test_a,
        test_b,
    }
}

fn reporter(design: ReportDesign) -> TeamcityReporter<MemoryConsole> {
    let options = ReporterOptions {
        design,
        test_metadata_artifacts: "artifacts".to_string(),
        ..ReporterOptions::default()
    };
    TeamcityReporter::with_console(options, MemoryConsole::new())
}

fn logged(reporter: &TeamcityReporter<MemoryConsole>) -> Vec<String> {
    reporter
        .console()
        .logged()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Message name of a service message line
fn message_name(line: &str) -> &str {
    let body = line
        .strip_prefix("##teamcity[")
        .expect("not a service message");
    body.split([' ', ']']).next().unwrap_or_default()
}

/// Escaped value of attribute `key`, if present
fn attr<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let marker = format!(" {}='", key);
    let start = line.find(&marker)? + marker.len();
    let rest = &line[start..];
    let mut escaped = false;
    for (index, c) in rest.char_indices() {
        match c {
            '|' if !escaped => escaped = true,
            '\'' if !escaped => return Some(&rest[..index]),
            _ => escaped = false,
        }
    }
    None
}

fn summary(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|line| match attr(line, "name") {
            Some(name) => format!("{}({})", message_name(line), name),
            None => message_name(line).to_string(),
        })
        .collect()
}

fn config_with_workers(workers: usize) -> RunConfig {
    RunConfig::with_workers(workers)
}

fn passed(duration_ms: u64) -> TestResult {
    TestResult::passed(duration_ms)
}

// Flow-keyed design

#[test]
fn test_flow_single_passed_test() {
    // Arrange
    let f = fixture();
    let mut reporter = reporter(ReportDesign::FlowKeyed);
    reporter.on_begin(&config_with_workers(1), &f.tree).unwrap();

    // Act
    reporter.on_test_begin(&f.tree, f.test_a).unwrap();
    reporter.on_test_end(&f.tree, f.test_a, &passed(1)).unwrap();

    // Assert
    let lines = logged(&reporter);
    assert_eq!(lines.len(), 2);
    let flow = attr(&lines[0], "flowId").expect("flow id");
    assert_eq!(
        lines[0],
        format!(
            "##teamcity[testStarted name='projectSuite: fileSuiteA: storySuiteA: testFromSuiteA' flowId='{}']",
            flow
        )
    );
    assert_eq!(
        lines[1],
        format!(
            "##teamcity[testFinished name='projectSuite: fileSuiteA: storySuiteA: testFromSuiteA' duration='1' flowId='{}']",
            flow
        )
    );
    assert!(lines.iter().all(|l| message_name(l) != "testFailed"));
}

#[test]
fn test_flow_retry_reports_each_attempt() {
    // Arrange
    let f = fixture();
    let mut reporter = reporter(ReportDesign::FlowKeyed);
    let config = RunConfig {
        projects: vec![ProjectConfig {
            name: "chromium".to_string(),
            retries: 1,
        }],
        ..config_with_workers(2)
    };

    // Act
    reporter.on_begin(&config, &f.tree).unwrap();
    let begin_lines = logged(&reporter);
    reporter.console_mut().clear();

    reporter.on_test_begin(&f.tree, f.test_a).unwrap();
    reporter
        .on_test_end(&f.tree, f.test_a, &TestResult::failed("boom", "at a.ts:1", 1))
        .unwrap();
    reporter.on_test_begin(&f.tree, f.test_a).unwrap();
    reporter.on_test_end(&f.tree, f.test_a, &passed(1)).unwrap();

    // Assert
    assert_eq!(begin_lines, vec!["##teamcity[testRetrySupport enabled='true']"]);
    let lines = logged(&reporter);
    let names: Vec<&str> = lines.iter().map(|l| message_name(l)).collect();
    assert_eq!(
        names,
        vec![
            "testStarted",
            "testFailed",
            "testFinished",
            "testStarted",
            "testFinished"
        ]
    );
    assert_eq!(attr(&lines[1], "message"), Some("boom"));
    let flow = attr(&lines[0], "flowId");
    assert!(lines.iter().all(|l| attr(l, "flowId") == flow));
}

#[test]
fn test_flow_concurrent_tests_keep_separate_flows() {
    // Arrange
    let f = fixture();
    let mut reporter = reporter(ReportDesign::FlowKeyed);
    reporter.on_begin(&config_with_workers(2), &f.tree).unwrap();

    // Act
    reporter.on_test_begin(&f.tree, f.test_a).unwrap();
    reporter.on_test_begin(&f.tree, f.test_b).unwrap();
    reporter
        .on_std_out(&f.tree, "from a\n", Some(f.test_a))
        .unwrap();
    reporter
        .on_std_err(&f.tree, "from b\n", Some(f.test_b))
        .unwrap();
    reporter.on_test_end(&f.tree, f.test_b, &passed(2)).unwrap();
    reporter.on_test_end(&f.tree, f.test_a, &passed(1)).unwrap();

    // Assert
    let lines = logged(&reporter);
    let flow_a = attr(&lines[0], "flowId").unwrap();
    let flow_b = attr(&lines[1], "flowId").unwrap();
    assert_ne!(flow_a, flow_b);
    assert_eq!(message_name(&lines[2]), "testStdOut");
    assert_eq!(attr(&lines[2], "out"), Some("from a|n"));
    assert_eq!(attr(&lines[2], "flowId"), Some(flow_a));
    assert_eq!(message_name(&lines[3]), "testStdErr");
    assert_eq!(attr(&lines[3], "flowId"), Some(flow_b));
    assert_eq!(attr(&lines[4], "flowId"), Some(flow_b));
    assert_eq!(attr(&lines[5], "flowId"), Some(flow_a));
}

#[test]
fn test_run_level_output_passes_through() {
    // Arrange
    let f = fixture();
    let mut reporter = reporter(ReportDesign::FlowKeyed);
    reporter.on_begin(&config_with_workers(1), &f.tree).unwrap();

    // Act
    reporter.on_std_out(&f.tree, "global [setup]\n", None).unwrap();
    reporter.on_std_err(&f.tree, "warning\n", None).unwrap();

    // Assert
    assert!(logged(&reporter).is_empty());
    assert_eq!(
        reporter.console().lines(),
        &[
            ConsoleLine::Stdout("global [setup]\n".to_string()),
            ConsoleLine::Stderr("warning\n".to_string()),
        ]
    );
}

#[test]
fn test_flow_end_emits_no_protocol_lines() {
    // Arrange
    let f = fixture();
    let mut reporter = reporter(ReportDesign::FlowKeyed);
    reporter.on_begin(&config_with_workers(1), &f.tree).unwrap();
    reporter.on_test_begin(&f.tree, f.test_a).unwrap();
    reporter.on_test_end(&f.tree, f.test_a, &passed(1)).unwrap();
    reporter.console_mut().clear();

    // Act
    reporter
        .on_end(&f.tree, &FullResult::new(RunStatus::Passed))
        .unwrap();

    // Assert
    assert!(logged(&reporter).is_empty());
    assert_eq!(
        reporter.console().lines(),
        &[ConsoleLine::Info("Finished the run: passed".to_string())]
    );
}

#[test]
fn test_unsupported_status_is_fatal() {
    // Arrange
    let f = fixture();
    let mut reporter = reporter(ReportDesign::FlowKeyed);
    reporter.on_begin(&config_with_workers(1), &f.tree).unwrap();
    reporter.on_test_begin(&f.tree, f.test_a).unwrap();
    reporter.console_mut().clear();
    let mut result = passed(1);
    result.status = TestStatus::from("flaky");

    // Act
    let err = reporter.on_test_end(&f.tree, f.test_a, &result).unwrap_err();

    // Assert
    assert!(matches!(err, ReporterError::UnsupportedStatus { ref status, .. } if status == "flaky"));
    assert!(err.to_string().contains("isn't supported"));
    assert!(logged(&reporter).is_empty());
}

#[test]
fn test_unsupported_status_is_fatal_in_suite_replay() {
    // Arrange
    let f = fixture();
    let mut reporter = reporter(ReportDesign::SuiteReplay);
    reporter.on_begin(&config_with_workers(1), &f.tree).unwrap();
    reporter.on_test_begin(&f.tree, f.test_a).unwrap();
    let mut result = passed(1);
    result.status = TestStatus::from("unknown");

    // Act
    let err = reporter.on_test_end(&f.tree, f.test_a, &result).unwrap_err();

    // Assert
    assert!(matches!(err, ReporterError::UnsupportedStatus { .. }));
}

#[test]
fn test_failure_statuses() {
    // Arrange
    let f = fixture();
    let mut reporter = reporter(ReportDesign::FlowKeyed);
    reporter.on_begin(&config_with_workers(1), &f.tree).unwrap();
    let mut timed_out = passed(30_001).with_error(TestError {
        message: None,
        stack: Some("at page.click".to_string()),
    });
    timed_out.status = TestStatus::TimedOut;
    let mut skipped = passed(0);
    skipped.status = TestStatus::Skipped;
    let mut interrupted = passed(0);
    interrupted.status = TestStatus::Interrupted;

    // Act
    for result in [&timed_out, &skipped, &interrupted] {
        reporter.on_test_begin(&f.tree, f.test_a).unwrap();
        reporter.on_test_end(&f.tree, f.test_a, result).unwrap();
    }

    // Assert
    let lines = logged(&reporter);
    assert_eq!(message_name(&lines[1]), "testFailed");
    assert_eq!(
        attr(&lines[1], "message"),
        Some("Timeout of 30000ms exceeded.")
    );
    assert_eq!(attr(&lines[1], "details"), Some("at page.click"));
    assert_eq!(message_name(&lines[4]), "testIgnored");
    assert_eq!(attr(&lines[4], "message"), Some("skipped"));
    assert_eq!(message_name(&lines[7]), "testFailed");
    assert_eq!(attr(&lines[7], "message"), Some("Test interrupted"));
    assert_eq!(attr(&lines[7], "details"), None);
}

#[test]
fn test_attachments_become_metadata() {
    // Arrange
    let f = fixture();
    let mut reporter = reporter(ReportDesign::FlowKeyed);
    reporter.on_begin(&config_with_workers(1), &f.tree).unwrap();
    let result = passed(1)
        .with_attachment(Attachment::path(
            "screenshot",
            "image/png",
            "/work/test-results/sub/file.png",
        ))
        .with_attachment(Attachment::bytes("note", "text/plain", b"hi".to_vec()));

    // Act
    reporter.on_test_begin(&f.tree, f.test_a).unwrap();
    reporter.on_test_end(&f.tree, f.test_a, &result).unwrap();

    // Assert
    let lines = logged(&reporter);
    assert_eq!(message_name(&lines[1]), "testMetadata");
    assert_eq!(attr(&lines[1], "type"), Some("artifact"));
    assert_eq!(attr(&lines[1], "value"), Some("artifacts/sub/file.png"));
    assert_eq!(
        attr(&lines[1], "testName"),
        Some("projectSuite: fileSuiteA: storySuiteA: testFromSuiteA")
    );
    assert_eq!(attr(&lines[2], "type"), Some("text"));
    assert_eq!(attr(&lines[2], "value"), Some("aGk="));
    assert_eq!(message_name(&lines[3]), "testFinished");
}

#[test]
fn test_config_not_logged_by_default() {
    // Arrange
    let f = fixture();
    let mut reporter = reporter(ReportDesign::FlowKeyed);

    // Act
    reporter.on_begin(&config_with_workers(4), &f.tree).unwrap();

    // Assert
    assert!(logged(&reporter).iter().all(|l| message_name(l) != "message"));
}

#[test]
fn test_config_logged_when_requested() {
    // Arrange
    let f = fixture();
    let options = ReporterOptions {
        log_config: true,
        ..ReporterOptions::default()
    };
    let mut reporter = TeamcityReporter::with_console(options, MemoryConsole::new());
    let metadata = MetadataObject::new();
    metadata.insert("loop", MetadataValue::object(&metadata));
    metadata.insert("branch", "main".into());
    let config = RunConfig {
        metadata: MetadataValue::object(&metadata),
        ..config_with_workers(4)
    };

    // Act
    reporter.on_begin(&config, &f.tree).unwrap();

    // Assert
    let lines = logged(&reporter);
    assert_eq!(
        lines[0],
        format!(
            "##teamcity[message text='{}']",
            escape(&config.to_message_text())
        )
    );
    assert!(lines[0].contains("|'branch|':|'main|'"));
    assert!(!lines[0].contains("loop"));
}

#[test]
fn test_on_error_goes_to_error_channel() {
    // Arrange
    let mut reporter = reporter(ReportDesign::FlowKeyed);
    let error = TestError {
        message: Some("SomeError message".to_string()),
        stack: None,
    };

    // Act
    reporter.on_error(&error);

    // Assert
    assert_eq!(
        reporter.console().lines(),
        &[ConsoleLine::Error("SomeError message".to_string())]
    );
}

#[test]
fn test_callbacks_out_of_order() {
    // Arrange
    let f = fixture();
    let mut reporter = reporter(ReportDesign::FlowKeyed);

    // Act & Assert
    assert_eq!(
        reporter.on_test_begin(&f.tree, f.test_a).unwrap_err(),
        ReporterError::OutOfOrder {
            event: "on_test_begin",
            state: "idle"
        }
    );
    reporter.on_begin(&config_with_workers(1), &f.tree).unwrap();
    assert!(matches!(
        reporter.on_begin(&config_with_workers(1), &f.tree),
        Err(ReporterError::OutOfOrder { .. })
    ));
    reporter
        .on_end(&f.tree, &FullResult::new(RunStatus::Passed))
        .unwrap();
    assert_eq!(
        reporter
            .on_end(&f.tree, &FullResult::new(RunStatus::Passed))
            .unwrap_err(),
        ReporterError::OutOfOrder {
            event: "on_end",
            state: "finished"
        }
    );
}

#[test]
fn test_instances_do_not_share_flows() {
    // Arrange
    let f = fixture();
    let mut first = reporter(ReportDesign::FlowKeyed);
    let mut second = reporter(ReportDesign::FlowKeyed);
    first.on_begin(&config_with_workers(1), &f.tree).unwrap();
    second.on_begin(&config_with_workers(1), &f.tree).unwrap();

    // Act
    first.on_test_begin(&f.tree, f.test_a).unwrap();
    second.on_test_begin(&f.tree, f.test_a).unwrap();

    // Assert
    let first_lines = logged(&first);
    let second_lines = logged(&second);
    assert_ne!(
        attr(&first_lines[0], "flowId"),
        attr(&second_lines[0], "flowId")
    );
}

// Suite-replay design

#[test]
fn test_replay_continuous_flushes_previous_file_suite() {
    // Arrange
    let f = fixture();
    let mut reporter = reporter(ReportDesign::SuiteReplay);
    reporter.on_begin(&config_with_workers(1), &f.tree).unwrap();
    assert_eq!(reporter.mode(), Some(ReporterMode::Continuous));

    // Act & Assert
    reporter.on_test_begin(&f.tree, f.test_a).unwrap();
    reporter.on_test_end(&f.tree, f.test_a, &passed(1)).unwrap();
    assert!(logged(&reporter).is_empty());

    reporter.on_test_begin(&f.tree, f.test_b).unwrap();
    assert_eq!(
        summary(&logged(&reporter)),
        vec![
            "testSuiteStarted(fileSuiteA)",
            "testSuiteStarted(storySuiteA)",
            "testStarted(testFromSuiteA)",
            "testFinished(testFromSuiteA)",
            "testSuiteFinished(storySuiteA)",
            "testSuiteFinished(fileSuiteA)",
        ]
    );
    reporter.console_mut().clear();

    reporter.on_test_end(&f.tree, f.test_b, &passed(2)).unwrap();
    assert!(logged(&reporter).is_empty());

    reporter
        .on_end(&f.tree, &FullResult::new(RunStatus::Passed))
        .unwrap();
    assert_eq!(
        summary(&logged(&reporter)),
        vec![
            "testSuiteStarted(fileSuiteB)",
            "testSuiteStarted(storySuiteB)",
            "testStarted(testFromSuiteB)",
            "testFinished(testFromSuiteB)",
            "testSuiteFinished(storySuiteB)",
            "testSuiteFinished(fileSuiteB)",
        ]
    );
}

#[test]
fn test_replay_batched_reports_in_tree_order_at_end() {
    // Arrange
    let f = fixture();
    let mut reporter = reporter(ReportDesign::SuiteReplay);
    reporter.on_begin(&config_with_workers(4), &f.tree).unwrap();
    assert_eq!(reporter.mode(), Some(ReporterMode::Batched));

    // Act
    reporter.on_test_begin(&f.tree, f.test_b).unwrap();
    reporter.on_test_begin(&f.tree, f.test_a).unwrap();
    reporter.on_test_end(&f.tree, f.test_b, &passed(2)).unwrap();
    reporter.on_test_end(&f.tree, f.test_a, &passed(1)).unwrap();
    let before_end = logged(&reporter);
    reporter
        .on_end(&f.tree, &FullResult::new(RunStatus::Passed))
        .unwrap();

    // Assert
    assert!(before_end.is_empty());
    let lines = logged(&reporter);
    assert_eq!(
        summary(&lines),
        vec![
            "testSuiteStarted(fileSuiteA)",
            "testSuiteStarted(storySuiteA)",
            "testStarted(testFromSuiteA)",
            "testFinished(testFromSuiteA)",
            "testSuiteFinished(storySuiteA)",
            "testSuiteFinished(fileSuiteA)",
            "testSuiteStarted(fileSuiteB)",
            "testSuiteStarted(storySuiteB)",
            "testStarted(testFromSuiteB)",
            "testFinished(testFromSuiteB)",
            "testSuiteFinished(storySuiteB)",
            "testSuiteFinished(fileSuiteB)",
        ]
    );
    let pid = std::process::id().to_string();
    assert!(lines.iter().all(|l| attr(l, "flowId") == Some(pid.as_str())));
    assert!(reporter
        .console()
        .lines()
        .iter()
        .any(|l| matches!(l, ConsoleLine::Info(text) if text.contains("4 workers"))));
}

#[test]
fn test_replay_emits_retries_and_timestamp() {
    // Arrange
    let f = fixture();
    let mut reporter = reporter(ReportDesign::SuiteReplay);
    reporter.on_begin(&config_with_workers(1), &f.tree).unwrap();

    // Act
    reporter.on_test_begin(&f.tree, f.test_a).unwrap();
    reporter
        .on_test_end(&f.tree, f.test_a, &TestResult::failed("boom", "", 1))
        .unwrap();
    reporter.on_test_begin(&f.tree, f.test_a).unwrap();
    reporter.on_test_end(&f.tree, f.test_a, &passed(1)).unwrap();
    reporter
        .on_end(&f.tree, &FullResult::new(RunStatus::Passed))
        .unwrap();

    // Assert
    let lines = logged(&reporter);
    assert_eq!(
        summary(&lines),
        vec![
            "testSuiteStarted(fileSuiteA)",
            "testSuiteStarted(storySuiteA)",
            "testStarted(testFromSuiteA)",
            "testFailed(testFromSuiteA)",
            "testFinished(testFromSuiteA)",
            "testStarted(testFromSuiteA)",
            "testFinished(testFromSuiteA)",
            "testSuiteFinished(storySuiteA)",
            "testSuiteFinished(fileSuiteA)",
        ]
    );
    let timestamp = attr(&lines[2], "timestamp").expect("timestamp");
    assert_eq!(timestamp.len(), "2024-05-01T10:20:30.123".len());
    assert_eq!(attr(&lines[2], "captureStandardOutput"), Some("true"));
}

#[test]
fn test_replay_missing_result_is_fatal() {
    // Arrange
    let f = fixture();
    let mut reporter = reporter(ReportDesign::SuiteReplay);
    reporter.on_begin(&config_with_workers(1), &f.tree).unwrap();
    reporter.on_test_begin(&f.tree, f.test_a).unwrap();

    // Act: test A never finished before the run moved on
    let err = reporter.on_test_begin(&f.tree, f.test_b).unwrap_err();

    // Assert
    assert_eq!(
        err,
        ReporterError::MissingResult {
            test: "testFromSuiteA".to_string()
        }
    );
}

#[test]
fn test_replay_output_after_test_end() {
    // Arrange
    let f = fixture();
    let mut reporter = reporter(ReportDesign::SuiteReplay);
    reporter.on_begin(&config_with_workers(1), &f.tree).unwrap();
    reporter.on_test_begin(&f.tree, f.test_a).unwrap();
    reporter.on_test_end(&f.tree, f.test_a, &passed(1)).unwrap();

    // Act
    reporter
        .on_std_out(&f.tree, "late\n", Some(f.test_a))
        .unwrap();
    reporter.on_test_begin(&f.tree, f.test_b).unwrap();
    reporter
        .on_std_err(&f.tree, "after flush\n", Some(f.test_a))
        .unwrap();

    // Assert
    let lines = logged(&reporter);
    let names = summary(&lines);
    assert_eq!(
        names[2..5],
        [
            "testStarted(testFromSuiteA)",
            "testStdOut(testFromSuiteA)",
            "testFinished(testFromSuiteA)",
        ]
    );
    assert_eq!(attr(&lines[3], "out"), Some("late|n"));
    assert_eq!(
        reporter.console().lines().last(),
        Some(&ConsoleLine::Stderr("after flush\n".to_string()))
    );
}
