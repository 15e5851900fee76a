use std::{
    os::unix::process::ExitStatusExt,
    process::{ExitStatus, Stdio},
    time::Duration,
};

use tokio::process::{Child, Command};

use super::{result::*, testcase::TestCase};

/// How a single wait on a child process concluded, before any pass/fail
/// policy is applied. Keeping this separate from `TestStatus` lets the
/// classification policy be exercised without spawning real processes.
#[derive(Debug)]
pub(crate) enum Completion {
    Exited(ExitStatus),
    DeadlineExpired,
    CtrlC,
    Error(String),
}

#[derive(Debug, Clone)]
pub struct TestRunner {
    success_marker: String,
}

impl TestRunner {
    pub fn new(success_marker: impl Into<String>) -> Self {
        Self {
            success_marker: success_marker.into(),
        }
    }

    /// Runs one test case to completion or deadline. Never fails: every
    /// way the child can misbehave maps onto a `TestStatus`.
    pub async fn run(&self, testcase: &TestCase) -> TestOutcome {
        let (completion, output) = observe(&testcase.argv, testcase.timeout).await;
        TestOutcome {
            name: testcase.name.clone(),
            status: classify(&completion, &output, &self.success_marker),
            output,
        }
    }
}

/// Spawns `argv` and waits for it under `time_limit`, capturing stdout and
/// stderr merged into one buffer. On deadline expiry or Ctrl-C the whole
/// process group is killed before control returns, so no grandchild
/// survives its own result.
pub(crate) async fn observe(argv: &[String], time_limit: Duration) -> (Completion, String) {
    let Some((program, args)) = argv.split_first() else {
        return (Completion::Error("empty argv".to_owned()), String::new());
    };

    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            return (
                Completion::Error(format!("Failed to spawn '{}': {}", program, e)),
                String::new(),
            )
        }
    };
    let pid = child.id();

    let (Some(mut stdout), Some(mut stderr)) = (child.stdout.take(), child.stderr.take()) else {
        kill_group(&mut child, pid).await;
        return (
            Completion::Error("Failed to capture subprocess output pipes".to_owned()),
            String::new(),
        );
    };

    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();

    let completion = {
        let communicate = async {
            let fut_stdout = tokio::io::copy(&mut stdout, &mut stdout_buf);
            let fut_stderr = tokio::io::copy(&mut stderr, &mut stderr_buf);
            tokio::try_join!(fut_stdout, fut_stderr, child.wait())
        };
        tokio::select! {
            res = communicate => match res {
                Ok((_, _, exit_status)) => Completion::Exited(exit_status),
                Err(e) => Completion::Error(format!("Failed to communicate with subprocess: {}", e)),
            },
            _ = tokio::time::sleep(time_limit) => Completion::DeadlineExpired,
            _ = tokio::signal::ctrl_c() => Completion::CtrlC,
        }
    };

    if matches!(
        completion,
        Completion::DeadlineExpired | Completion::CtrlC
    ) {
        kill_group(&mut child, pid).await;
    }

    let mut output = String::from_utf8_lossy(&stdout_buf).into_owned();
    output.push_str(&String::from_utf8_lossy(&stderr_buf));
    (completion, output)
}

async fn kill_group(child: &mut Child, pid: Option<u32>) {
    // The child was spawned as its own process group leader, so a group
    // kill reaches any grandchildren it forked.
    if let Some(pid) = pid {
        unsafe {
            libc::killpg(pid as libc::pid_t, libc::SIGKILL);
        }
    }
    child
        .kill()
        .await
        .unwrap_or_else(|e| log::warn!("Failed to kill subprocess: {:#}", e));
}

/// Outcome policy, first match wins: deadline, fatal signal, nonzero exit,
/// operator interrupt, launch failure, then the marker check on clean exits.
pub(crate) fn classify(completion: &Completion, output: &str, success_marker: &str) -> TestStatus {
    match completion {
        Completion::DeadlineExpired => TestStatus::TimedOut,
        Completion::Exited(status) => match (status.signal(), status.code()) {
            (Some(signal), _) => TestStatus::Signaled(signal),
            (None, Some(0)) => {
                if output.contains(success_marker) {
                    TestStatus::Passed
                } else {
                    TestStatus::Failed
                }
            }
            (None, Some(_)) => TestStatus::Failed,
            (None, None) => TestStatus::InternalError,
        },
        Completion::CtrlC => TestStatus::Interrupted,
        Completion::Error(_) => TestStatus::InternalError,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const MARKER: &str = "ALL TESTS PASSED";

    async fn run_sh(script: &str, timeout_ms: u64) -> TestOutcome {
        let testcase = TestCase {
            name: "sample".to_owned(),
            argv: vec!["/bin/sh".into(), "-c".into(), script.into()],
            timeout: Duration::from_millis(timeout_ms),
        };
        TestRunner::new(MARKER).run(&testcase).await
    }

    #[tokio::test]
    async fn should_pass_on_marker_and_clean_exit() {
        let res = run_sh("echo 'ALL TESTS PASSED'", 3000).await;
        assert_eq!(res.status, TestStatus::Passed);
        assert!(res.output.contains(MARKER));
    }

    #[tokio::test]
    async fn should_fail_without_marker_even_on_clean_exit() {
        let res = run_sh("echo 'some assertion failed'", 3000).await;
        assert_eq!(res.status, TestStatus::Failed);
    }

    #[tokio::test]
    async fn should_fail_on_nonzero_exit_even_with_marker() {
        let res = run_sh("echo 'ALL TESTS PASSED'; exit 1", 3000).await;
        assert_eq!(res.status, TestStatus::Failed);
        assert!(res.output.contains(MARKER));
    }

    #[tokio::test]
    async fn should_time_out_even_if_marker_was_printed() {
        let res = run_sh("echo 'ALL TESTS PASSED'; sleep 5", 200).await;
        assert_eq!(res.status, TestStatus::TimedOut);
    }

    #[tokio::test]
    async fn should_report_fatal_signal() {
        let res = run_sh("kill -s SEGV $$", 3000).await;
        assert_eq!(res.status, TestStatus::Signaled(libc::SIGSEGV));
    }

    #[tokio::test]
    async fn should_merge_stdout_and_stderr() {
        let res = run_sh("echo on-stdout; echo on-stderr 1>&2; exit 3", 3000).await;
        assert_eq!(res.status, TestStatus::Failed);
        assert!(res.output.contains("on-stdout"));
        assert!(res.output.contains("on-stderr"));
    }

    #[tokio::test]
    async fn should_be_internal_error_when_program_does_not_exist() {
        let testcase = TestCase {
            name: "missing".to_owned(),
            argv: vec!["./no-such-binary".into(), "scenario".into(), "1".into()],
            timeout: Duration::from_secs(1),
        };
        let res = TestRunner::new(MARKER).run(&testcase).await;
        assert_eq!(res.status, TestStatus::InternalError);
    }

    mod classify {
        use super::super::*;

        fn exited(raw: i32) -> Completion {
            Completion::Exited(ExitStatus::from_raw(raw))
        }

        #[test]
        fn deadline_outranks_marker() {
            let status = classify(&Completion::DeadlineExpired, MARKER_OUTPUT, "PASSED");
            assert_eq!(status, TestStatus::TimedOut);
        }

        #[test]
        fn signal_is_reported_with_its_number() {
            assert_eq!(
                classify(&exited(libc::SIGSEGV), "", "PASSED"),
                TestStatus::Signaled(libc::SIGSEGV)
            );
        }

        #[test]
        fn nonzero_exit_outranks_marker() {
            // raw wait status: exit code in the high byte
            assert_eq!(
                classify(&exited(2 << 8), MARKER_OUTPUT, "PASSED"),
                TestStatus::Failed
            );
        }

        #[test]
        fn ctrl_c_maps_to_interrupted() {
            assert_eq!(
                classify(&Completion::CtrlC, "", "PASSED"),
                TestStatus::Interrupted
            );
        }

        #[test]
        fn launch_failure_maps_to_internal_error() {
            let completion = Completion::Error("spawn failed".to_owned());
            assert_eq!(classify(&completion, "", "PASSED"), TestStatus::InternalError);
        }

        #[test]
        fn clean_exit_defers_to_the_marker() {
            assert_eq!(classify(&exited(0), MARKER_OUTPUT, "PASSED"), TestStatus::Passed);
            assert_eq!(classify(&exited(0), "no luck", "PASSED"), TestStatus::Failed);
        }

        const MARKER_OUTPUT: &str = "... PASSED ...";
    }
}
