//! The channel-assignment suite: scenario registrations and the point
//! breakdown. This module is configuration data; the mechanics live in
//! [`crate::testing`] and [`crate::scoring`].

use std::time::Duration;

use crate::config::GradeConfig;
use crate::scoring::RubricEntry;
use crate::testing::{Mode, Registry, Template};

const DIRECT_TIMEOUT: Duration = Duration::from_secs(6);
const SANITIZE_TIMEOUT: Duration = Duration::from_secs(10);
const MEMCHECK_TIMEOUT: Duration = Duration::from_secs(20);
const CPU_UTILIZATION_TIMEOUT: Duration = Duration::from_secs(60);
const RESPONSE_TIME_TIMEOUT: Duration = Duration::from_secs(60);
const WAKEUP_TIMEOUT: Duration = Duration::from_secs(40);
const STRESS_SEND_RECV_TIMEOUT: Duration = Duration::from_secs(20);
const NON_BLOCKING_RECEIVE_TIMEOUT: Duration = Duration::from_secs(10);

const DIRECT_ITERS: u64 = 5000;
const SANITIZE_ITERS: u64 = 1000;
const MEMCHECK_ITERS: u64 = 500;
const SLOW_ITERS: u64 = 30;
const ONE_ITER: u64 = 1;

#[derive(Debug, Clone)]
pub struct Suite {
    pub registry: Registry,
    pub rubric: Vec<RubricEntry>,
}

fn templates(cfg: &GradeConfig) -> Vec<Template> {
    vec![
        Template {
            mode: Mode::Direct,
            prefix: "channel".to_owned(),
            wrapper: vec![],
            program: cfg.program.clone(),
            default_iters: cfg.scale_iters(DIRECT_ITERS),
            default_timeout: cfg.scale_timeout(DIRECT_TIMEOUT),
        },
        Template {
            mode: Mode::Sanitize,
            prefix: "sanitize".to_owned(),
            wrapper: vec![],
            program: cfg.sanitize_program.clone(),
            default_iters: cfg.scale_iters(SANITIZE_ITERS),
            default_timeout: cfg.scale_timeout(SANITIZE_TIMEOUT),
        },
        Template {
            mode: Mode::Memcheck,
            prefix: "valgrind".to_owned(),
            wrapper: vec![
                cfg.valgrind.clone(),
                "-v".to_owned(),
                "--leak-check=full".to_owned(),
                "--errors-for-leak-kinds=all".to_owned(),
                "--error-exitcode=2".to_owned(),
            ],
            program: cfg.program.clone(),
            default_iters: cfg.scale_iters(MEMCHECK_ITERS),
            default_timeout: cfg.scale_timeout(MEMCHECK_TIMEOUT),
        },
    ]
}

pub fn channel(cfg: &GradeConfig) -> Suite {
    let mut reg = Registry::new(templates(cfg));

    let slow = Some(cfg.scale_iters(SLOW_ITERS));
    let one = Some(cfg.scale_iters(ONE_ITER));
    let scale = |t: Duration| Some(cfg.scale_timeout(t));

    reg.register_all("test_initialization", None, None);
    reg.register_all("test_free", None, None);
    reg.register_all("test_send_correctness", slow, None);
    reg.register_all("test_receive_correctness", slow, None);
    reg.register_all("test_non_blocking_send", one, None);
    reg.register_all(
        "test_non_blocking_receive",
        one,
        scale(NON_BLOCKING_RECEIVE_TIMEOUT),
    );
    reg.register_all("test_multiple_channels", None, None);
    reg.register(Mode::Direct, "test_overall_send_receive", one, None);
    reg.register(Mode::Sanitize, "test_overall_send_receive", one, None);
    reg.register(
        Mode::Memcheck,
        "test_overall_send_receive",
        one,
        scale(MEMCHECK_TIMEOUT * 5),
    );
    reg.register_all("test_stress_send_recv", one, scale(STRESS_SEND_RECV_TIMEOUT));
    reg.register_all("test_response_time", one, scale(RESPONSE_TIME_TIMEOUT));
    reg.register_all("test_cpu_utilization_send", one, scale(CPU_UTILIZATION_TIMEOUT));
    reg.register_all(
        "test_cpu_utilization_receive",
        one,
        scale(CPU_UTILIZATION_TIMEOUT),
    );
    reg.register(Mode::Direct, "test_channel_close_with_send", slow, None);
    reg.register(Mode::Sanitize, "test_channel_close_with_send", slow, None);
    reg.register(
        Mode::Memcheck,
        "test_channel_close_with_send",
        slow,
        scale(MEMCHECK_TIMEOUT * 2),
    );
    reg.register(Mode::Direct, "test_channel_close_with_receive", slow, None);
    reg.register(Mode::Sanitize, "test_channel_close_with_receive", slow, None);
    reg.register(
        Mode::Memcheck,
        "test_channel_close_with_receive",
        slow,
        scale(MEMCHECK_TIMEOUT * 2),
    );
    reg.register_all("test_select", slow, None);
    reg.register_all("test_select_close", slow, None);
    reg.register_all("test_select_and_non_blocking_send_size1", slow, None);
    reg.register_all("test_select_and_non_blocking_receive_size1", slow, None);
    reg.register_all("test_select_with_select_size1", slow, None);
    reg.register_all("test_select_with_same_channel_size1", None, None);
    reg.register_all("test_select_with_send_receive_on_same_channel_size1", None, None);
    reg.register_all("test_select_with_duplicate_channel_size1", slow, None);
    reg.register(Mode::Direct, "test_stress", one, scale(DIRECT_TIMEOUT * 5));
    reg.register(Mode::Sanitize, "test_stress", one, scale(SANITIZE_TIMEOUT * 5));
    reg.register(Mode::Memcheck, "test_stress", one, scale(MEMCHECK_TIMEOUT * 5));
    reg.register_all("test_select_response_time", one, scale(RESPONSE_TIME_TIMEOUT));
    reg.register_all(
        "test_cpu_utilization_select",
        one,
        scale(CPU_UTILIZATION_TIMEOUT),
    );
    reg.register_all(
        "test_cpu_utilization_overall",
        one,
        scale(CPU_UTILIZATION_TIMEOUT),
    );
    reg.register_all("test_for_too_many_wakeups", one, scale(WAKEUP_TIMEOUT));

    Suite {
        registry: reg,
        rubric: rubric(),
    }
}

#[rustfmt::skip]
const POINT_BREAKDOWN: &[(u32, &[&str])] = &[
    // Basic (120 pts)
    (1, &["make"]),
    (3, &["channel_test_initialization"]),
    (2, &["sanitize_test_initialization"]),
    (2, &["valgrind_test_initialization"]),
    (3, &["channel_test_free"]),
    (2, &["sanitize_test_free"]),
    (2, &["valgrind_test_free"]),
    (3, &["channel_test_send_correctness"]),
    (2, &["sanitize_test_send_correctness"]),
    (2, &["valgrind_test_send_correctness"]),
    (3, &["channel_test_receive_correctness"]),
    (2, &["sanitize_test_receive_correctness"]),
    (2, &["valgrind_test_receive_correctness"]),
    (3, &["channel_test_non_blocking_send"]),
    (2, &["sanitize_test_non_blocking_send"]),
    (2, &["valgrind_test_non_blocking_send"]),
    (3, &["channel_test_non_blocking_receive"]),
    (2, &["sanitize_test_non_blocking_receive"]),
    (2, &["valgrind_test_non_blocking_receive"]),
    (3, &["channel_test_multiple_channels"]),
    (2, &["sanitize_test_multiple_channels"]),
    (2, &["valgrind_test_multiple_channels"]),
    (3, &["channel_test_overall_send_receive"]),
    (2, &["sanitize_test_overall_send_receive"]),
    (2, &["valgrind_test_overall_send_receive"]),
    (5, &["channel_test_stress_send_recv"]),
    (4, &["sanitize_test_stress_send_recv"]),
    (4, &["valgrind_test_stress_send_recv"]),
    (3, &["channel_test_response_time"]),
    (2, &["sanitize_test_response_time"]),
    (2, &["valgrind_test_response_time"]),
    (3, &["channel_test_cpu_utilization_send"]),
    (2, &["sanitize_test_cpu_utilization_send"]),
    (2, &["valgrind_test_cpu_utilization_send"]),
    (3, &["channel_test_cpu_utilization_receive"]),
    (2, &["sanitize_test_cpu_utilization_receive"]),
    (2, &["valgrind_test_cpu_utilization_receive"]),
    (3, &["channel_test_for_too_many_wakeups"]),
    (2, &["sanitize_test_for_too_many_wakeups"]),
    (2, &["valgrind_test_for_too_many_wakeups"]),
    (5, &["channel_test_channel_close_with_send"]),
    (3, &["channel_test_channel_close_with_receive"]),
    (3, &["sanitize_test_channel_close_with_send"]),
    (5, &["sanitize_test_channel_close_with_receive"]),
    (3, &["valgrind_test_channel_close_with_send"]),
    (3, &["valgrind_test_channel_close_with_receive"]),

    // Select (80 pts)
    (2, &["channel_test_select"]),
    (1, &["sanitize_test_select"]),
    (1, &["valgrind_test_select"]),
    (2, &["channel_test_select_close"]),
    (1, &["sanitize_test_select_close"]),
    (1, &["valgrind_test_select_close"]),
    (2, &["channel_test_select_and_non_blocking_send_size1"]),
    (1, &["sanitize_test_select_and_non_blocking_send_size1"]),
    (1, &["valgrind_test_select_and_non_blocking_send_size1"]),
    (2, &["channel_test_select_and_non_blocking_receive_size1"]),
    (1, &["sanitize_test_select_and_non_blocking_receive_size1"]),
    (1, &["valgrind_test_select_and_non_blocking_receive_size1"]),
    (2, &["channel_test_select_with_select_size1"]),
    (1, &["sanitize_test_select_with_select_size1"]),
    (1, &["valgrind_test_select_with_select_size1"]),
    (2, &["channel_test_select_with_same_channel_size1"]),
    (1, &["sanitize_test_select_with_same_channel_size1"]),
    (1, &["valgrind_test_select_with_same_channel_size1"]),
    (2, &["channel_test_select_with_send_receive_on_same_channel_size1"]),
    (1, &["sanitize_test_select_with_send_receive_on_same_channel_size1"]),
    (1, &["valgrind_test_select_with_send_receive_on_same_channel_size1"]),
    (2, &["channel_test_select_with_duplicate_channel_size1"]),
    (1, &["sanitize_test_select_with_duplicate_channel_size1"]),
    (1, &["valgrind_test_select_with_duplicate_channel_size1"]),
    (12, &["channel_test_stress"]),
    (12, &["sanitize_test_stress"]),
    (12, &["valgrind_test_stress"]),
    (2, &["channel_test_select_response_time"]),
    (1, &["sanitize_test_select_response_time"]),
    (1, &["valgrind_test_select_response_time"]),
    (2, &["channel_test_cpu_utilization_select"]),
    (1, &["sanitize_test_cpu_utilization_select"]),
    (1, &["valgrind_test_cpu_utilization_select"]),
    (2, &["channel_test_cpu_utilization_overall"]),
    (1, &["sanitize_test_cpu_utilization_overall"]),
    (1, &["valgrind_test_cpu_utilization_overall"]),
];

pub fn rubric() -> Vec<RubricEntry> {
    POINT_BREAKDOWN
        .iter()
        .map(|(points, requires)| RubricEntry::new(*points, requires))
        .collect()
}
