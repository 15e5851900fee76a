#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum TestStatus {
    /// Clean exit and the success marker appeared in the captured output.
    Passed,
    /// Nonzero exit, or clean exit without the success marker.
    Failed,
    /// Still running when the wall-clock budget expired.
    TimedOut,
    /// Terminated by a fatal signal.
    Signaled(i32),
    /// Operator hit Ctrl-C while the test was in flight.
    Interrupted,
    /// Could not spawn or wait on the child at all.
    InternalError,
}

impl TestStatus {
    pub fn is_passed(self) -> bool {
        self == TestStatus::Passed
    }
}

/// One record per test-case execution. `output` holds stdout and stderr
/// merged into a single capture; it may be empty on timeout or interrupt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    pub name: String,
    pub status: TestStatus,
    pub output: String,
}
