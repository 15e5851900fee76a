use std::collections::HashMap;

use colored::{Color, ColoredString, Colorize};
use crossterm::terminal;

use crate::scoring::GradeReport;
use crate::testing::TestStatus;

#[macro_export]
macro_rules! print_success {
    ($fmt:literal, $($e:tt)*) => {
        use ::colored::Colorize as _;
        println!("{}", format!($fmt, $($e)*).green())
    }
}

pub fn is_truecolor_supported() -> bool {
    let Ok(v) = std::env::var("COLORTERM") else {
        return false;
    };
    matches!(v.as_str(), "truecolor" | "24bit")
}

pub trait ColorTheme {
    fn color(&self) -> Color;
}

impl ColorTheme for TestStatus {
    fn color(&self) -> Color {
        use TestStatus::*;
        match self {
            Passed => Color::Green,
            Failed => Color::Yellow,
            TimedOut => Color::Red,
            Signaled(_) => Color::Magenta,
            Interrupted => Color::Cyan,
            InternalError => Color::BrightRed,
        }
    }
}

pub fn status_badge(status: TestStatus) -> ColoredString {
    let fg = if is_truecolor_supported() {
        Color::TrueColor {
            r: 255,
            g: 255,
            b: 255,
        }
    } else {
        Color::BrightBlack
    };
    format!(" {} ", status)
        .on_color(status.color())
        .bold()
        .color(fg)
}

pub fn print_success_banner(test: &str) {
    println!("{}", format!("****SUCCESS: {}****", test).green().bold());
}

pub fn print_failed_banner(test: &str) {
    println!("{}", format!("****FAILED: {}****", test).red().bold());
}

pub fn print_suite_summary(statuses: &[TestStatus]) {
    let bar = "-".repeat(5);
    print!("{} ", bar);

    let count: HashMap<TestStatus, usize> = statuses.iter().fold(HashMap::new(), |mut count, s| {
        *count.entry(*s).or_default() += 1;
        count
    });

    let num_total_test = statuses.len();
    let num_passed = *count.get(&TestStatus::Passed).unwrap_or(&0);
    let num_failed = num_total_test - num_passed;

    if num_passed == num_total_test {
        let msg = format!("All {} tests passed ✨", num_total_test);
        print!("{}", msg.green());
    } else {
        let summary_msg = if num_passed > 0 {
            format!("{}/{} tests failed 💣", num_failed, num_total_test)
        } else {
            format!("All {} tests failed 💀", num_total_test)
        };

        let detail_msg = count
            .iter()
            .filter(|(&status, _)| status != TestStatus::Passed)
            .map(|(&status, &cnt)| {
                format!(
                    "{}{}{}",
                    self::status_badge(status),
                    "x".dimmed(),
                    cnt.to_string().bold().bright_white(),
                )
            })
            .collect::<Vec<String>>()
            .join(", ");

        print!("{} ({})", summary_msg.bright_red(), detail_msg);
    }

    println!(" {}", bar);
}

fn rule() -> String {
    let (cols, _) = terminal::size().unwrap_or((40, 40));
    "━".repeat(cols as usize)
}

pub fn print_score_line(report: &GradeReport) {
    let msg = format!("Score: {} / {}", report.achieved, report.possible);
    let msg = if report.achieved == report.possible {
        msg.green().bold()
    } else if report.achieved == 0 {
        msg.red().bold()
    } else {
        msg.yellow().bold()
    };
    println!("{}", rule().blue().bold());
    println!("{}", msg);
}
