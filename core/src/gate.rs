use std::time::Duration;

use lazy_regex::regex_is_match;

use crate::config::GradeConfig;
use crate::testing::runner::{observe, Completion};

/// Budget for the clean-then-full build, before the timeout multiplier.
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(60);

/// Budget for one symbol-table dump, before the timeout multiplier.
const SYMBOL_DUMP_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    Failed { output: String },
    TimedOut { limit: Duration },
    Interrupted,
    Error { detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalsOutcome {
    Clean,
    /// `object.c: symbol` pairs naming disallowed mutable globals.
    Violations(Vec<String>),
    ToolError { object: String, detail: String },
}

/// Runs the configured clean-then-full build under its timeout budget.
pub async fn build(cfg: &GradeConfig) -> BuildOutcome {
    let limit = cfg.scale_timeout(BUILD_TIMEOUT);
    let (completion, output) = observe(&cfg.build, limit).await;
    match completion {
        Completion::Exited(status) if status.success() => BuildOutcome::Success,
        Completion::Exited(_) => BuildOutcome::Failed { output },
        Completion::DeadlineExpired => BuildOutcome::TimedOut { limit },
        Completion::CtrlC => BuildOutcome::Interrupted,
        Completion::Error(detail) => BuildOutcome::Error { detail },
    }
}

/// Dumps the symbol table of every configured object and flags symbols
/// living in writable storage (data, BSS, common, weak data). Any flagged
/// symbol across any object fails the gate.
pub async fn check_mutable_globals(cfg: &GradeConfig) -> GlobalsOutcome {
    let limit = cfg.scale_timeout(SYMBOL_DUMP_TIMEOUT);
    let mut violations = Vec::new();

    for object in &cfg.objects {
        let argv = vec![
            cfg.nm.clone(),
            "-f".to_owned(),
            "posix".to_owned(),
            format!("{}.o", object),
        ];
        let (completion, output) = observe(&argv, limit).await;
        match completion {
            Completion::Exited(status) if status.success() => {
                violations.extend(scan_symbol_table(object, &output));
            }
            Completion::Exited(_) => {
                return GlobalsOutcome::ToolError {
                    object: object.clone(),
                    detail: output,
                }
            }
            Completion::DeadlineExpired => {
                return GlobalsOutcome::ToolError {
                    object: object.clone(),
                    detail: format!("Symbol dump did not finish within {} seconds", limit.as_secs()),
                }
            }
            Completion::CtrlC => {
                return GlobalsOutcome::ToolError {
                    object: object.clone(),
                    detail: "User interrupted global variable test".to_owned(),
                }
            }
            Completion::Error(detail) => {
                return GlobalsOutcome::ToolError {
                    object: object.clone(),
                    detail,
                }
            }
        }
    }

    if violations.is_empty() {
        GlobalsOutcome::Clean
    } else {
        GlobalsOutcome::Violations(violations)
    }
}

/// `nm -f posix` emits one `name class [value [size]]` row per symbol.
/// Class letters in [BbCcDdGgSsVvWw] mark data/BSS/common/weak storage;
/// code and undefined externals pass. Rows without a class column are
/// ignored rather than treated as errors.
fn scan_symbol_table(object: &str, table: &str) -> Vec<String> {
    let mut flagged = Vec::new();
    for line in table.lines() {
        let mut cols = line.split(' ');
        let (Some(symbol), Some(class)) = (cols.next(), cols.next()) else {
            continue;
        };
        if regex_is_match!("[BbCcDdGgSsVvWw]", class) {
            flagged.push(format!("{}.c: {}", object, symbol));
        }
    }
    flagged
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flags_data_section_symbols() {
        let table = "\
counter D 0000000000000010 8
buffer B 0000000000000020 64
do_work T 0000000000000000 120
malloc U
local_state b 0000000000000030 4
";
        let flagged = scan_symbol_table("channel", table);
        assert_eq!(
            flagged,
            vec![
                "channel.c: counter",
                "channel.c: buffer",
                "channel.c: local_state",
            ]
        );
    }

    #[test]
    fn passes_code_and_undefined_symbols() {
        let table = "main T 0000000000000000 10\nprintf U\nhelper t 0000000000000040 24\n";
        assert!(scan_symbol_table("channel", table).is_empty());
    }

    #[test]
    fn tolerates_rows_without_a_class_column() {
        assert!(scan_symbol_table("channel", "lonely\n\n").is_empty());
    }

    #[tokio::test]
    async fn build_succeeds_on_zero_exit() {
        let cfg = GradeConfig {
            build: vec!["true".into()],
            ..Default::default()
        };
        assert_eq!(build(&cfg).await, BuildOutcome::Success);
    }

    #[tokio::test]
    async fn build_failure_carries_the_compiler_output() {
        let cfg = GradeConfig {
            build: vec!["sh".into(), "-c".into(), "echo 'undefined reference'; exit 2".into()],
            ..Default::default()
        };
        match build(&cfg).await {
            BuildOutcome::Failed { output } => assert!(output.contains("undefined reference")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn build_times_out() {
        let cfg = GradeConfig {
            build: vec!["sleep".into(), "5".into()],
            // 60 s budget becomes 60 ms
            timeout_multiplier: 0.001,
            ..Default::default()
        };
        assert!(matches!(build(&cfg).await, BuildOutcome::TimedOut { .. }));
    }

    #[tokio::test]
    async fn missing_symbol_tool_is_a_tool_error() {
        let cfg = GradeConfig {
            nm: "./no-such-nm".into(),
            ..Default::default()
        };
        match check_mutable_globals(&cfg).await {
            GlobalsOutcome::ToolError { object, .. } => assert_eq!(object, "channel"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
