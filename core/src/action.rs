pub mod error {
    #[allow(unused_imports)]
    pub(crate) use anyhow::{anyhow, bail, ensure, Context as _};
    pub use anyhow::{Error, Result};
}

use std::collections::BTreeMap;
use std::path::PathBuf;

use error::*;

use crate::config::GradeConfig;
use crate::gate::{self, BuildOutcome, GlobalsOutcome};
use crate::scoring::{self, GradeReport};
use crate::style;
use crate::suite;
use crate::testing::{TestCase, TestOutcome, TestRunner, TestStatus};

/// Runs the whole grading pipeline: build gate, mutable-global gate, then
/// every registered test case in order, and finally the rubric evaluation.
/// Gate failure skips the test cases but still proceeds to scoring.
pub async fn grade(cfg: &GradeConfig) -> Result<GradeReport> {
    let suite = suite::channel(cfg);
    let mut outcomes = BTreeMap::new();

    let gates_passed = run_gates(cfg).await;
    outcomes.insert("make".to_owned(), gates_passed);

    if gates_passed {
        let runner = TestRunner::new(&cfg.success_marker);
        let mut statuses = Vec::with_capacity(suite.registry.len());
        for testcase in suite.registry.iter() {
            log::debug!(
                "Running {} (timeout: {:?}): {}",
                testcase.name,
                testcase.timeout,
                testcase.argv.join(" "),
            );
            let outcome = runner.run(testcase).await;
            report_outcome(testcase, &outcome, cfg);
            statuses.push(outcome.status);
            outcomes.insert(outcome.name, outcome.status.is_passed());
        }
        style::print_suite_summary(&statuses);
    }

    Ok(scoring::score(&outcomes, &suite.rubric))
}

async fn run_gates(cfg: &GradeConfig) -> bool {
    log::info!("Building: {}", cfg.build.join(" "));
    match gate::build(cfg).await {
        BuildOutcome::Success => {}
        BuildOutcome::Failed { output } => {
            style::print_failed_banner("make");
            println!("{}", output);
            return false;
        }
        BuildOutcome::TimedOut { limit } => {
            style::print_failed_banner("make");
            println!("Failed to compile within {} seconds", limit.as_secs());
            return false;
        }
        BuildOutcome::Interrupted => {
            style::print_failed_banner("make");
            println!("User interrupted compilation");
            return false;
        }
        BuildOutcome::Error { detail } => {
            style::print_failed_banner("make");
            println!("{}", detail);
            return false;
        }
    }

    log::info!("Checking for mutable globals in: {}", cfg.objects.join(", "));
    match gate::check_mutable_globals(cfg).await {
        GlobalsOutcome::Clean => true,
        GlobalsOutcome::Violations(symbols) => {
            style::print_failed_banner("check_global_variables");
            println!("You are not allowed to use global variables in this assignment:");
            for symbol in symbols {
                println!("{}", symbol);
            }
            false
        }
        GlobalsOutcome::ToolError { object, detail } => {
            style::print_failed_banner("check_global_variables");
            println!("Failed to inspect symbols of {}.o: {}", object, detail);
            false
        }
    }
}

fn report_outcome(testcase: &TestCase, outcome: &TestOutcome, cfg: &GradeConfig) {
    if outcome.status.is_passed() {
        style::print_success_banner(&outcome.name);
        return;
    }

    style::print_failed_banner(&outcome.name);
    match outcome.status {
        TestStatus::TimedOut => {
            println!(
                "Failed to complete within {} seconds",
                testcase.timeout.as_secs()
            );
        }
        TestStatus::Signaled(signal) if signal == libc::SIGSEGV => {
            println!("Segmentation fault (core dumped)");
        }
        TestStatus::Signaled(signal) => {
            println!("Died with signal {}", signal);
        }
        TestStatus::Interrupted => {
            println!("User interrupted test");
        }
        TestStatus::InternalError => {
            println!("Unknown error occurred");
        }
        TestStatus::Passed | TestStatus::Failed => {}
    }

    match write_error_log(&outcome.name, &outcome.output, cfg) {
        Ok(path) => println!("See {} for error details", path.display()),
        Err(e) => log::warn!("Failed to persist error log for {}: {}", outcome.name, e),
    }
}

/// One log file per test, named after it, overwritten on rerun.
fn write_error_log(test: &str, output: &str, cfg: &GradeConfig) -> fsutil::Result<PathBuf> {
    let path = cfg.log_dir.join(format!("error_{}.log", test));
    fsutil::write_with_mkdir(&path, output)?;
    Ok(path)
}
