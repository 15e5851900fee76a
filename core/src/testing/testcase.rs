use std::{collections::HashSet, time::Duration};

use strum::IntoEnumIterator;

/// Execution mode of a test invocation. Each mode owns a command template;
/// one logical scenario expands into one concrete case per mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    /// Plain run of the test binary.
    Direct,
    /// Run of the sanitizer-instrumented build of the same binary.
    Sanitize,
    /// Plain binary under the memory checker with full leak detection.
    Memcheck,
}

/// Command template for one mode: how to invoke the program, plus the
/// default iteration count and timeout any registration may override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub mode: Mode,
    /// Name prefix for cases minted from this template.
    pub prefix: String,
    /// Tool and flags placed before the program (empty for direct runs).
    pub wrapper: Vec<String>,
    pub program: String,
    pub default_iters: u64,
    pub default_timeout: Duration,
}

impl Template {
    fn build_case(&self, scenario: &str, iters: Option<u64>, timeout: Option<Duration>) -> TestCase {
        let iters = iters.unwrap_or(self.default_iters);
        let mut argv = self.wrapper.clone();
        argv.push(self.program.clone());
        argv.push(scenario.to_owned());
        argv.push(iters.to_string());
        TestCase {
            name: format!("{}_{}", self.prefix, scenario),
            argv,
            timeout: timeout.unwrap_or(self.default_timeout),
        }
    }
}

/// One concrete invocation: unique name, full argv, wall-clock budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub argv: Vec<String>,
    pub timeout: Duration,
}

/// The full set of registered test cases, in registration order.
/// Names are unique; a collision is a bug in the suite table and panics.
#[derive(Debug, Clone)]
pub struct Registry {
    templates: Vec<Template>,
    cases: Vec<TestCase>,
    names: HashSet<String>,
}

impl Registry {
    pub fn new(templates: Vec<Template>) -> Self {
        Self {
            templates,
            cases: Vec::new(),
            names: HashSet::new(),
        }
    }

    fn template(&self, mode: Mode) -> &Template {
        self.templates
            .iter()
            .find(|t| t.mode == mode)
            .unwrap_or_else(|| panic!("no template registered for mode {}", mode))
    }

    pub fn register(
        &mut self,
        mode: Mode,
        scenario: &str,
        iters: Option<u64>,
        timeout: Option<Duration>,
    ) {
        let case = self.template(mode).build_case(scenario, iters, timeout);
        if !self.names.insert(case.name.clone()) {
            panic!("duplicate test case name: {}", case.name);
        }
        self.cases.push(case);
    }

    /// Registers the scenario under every mode in one call.
    pub fn register_all(&mut self, scenario: &str, iters: Option<u64>, timeout: Option<Duration>) {
        for mode in Mode::iter() {
            self.register(mode, scenario, iters, timeout);
        }
    }

    pub fn get(&self, name: &str) -> Option<&TestCase> {
        self.cases.iter().find(|c| c.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestCase> {
        self.cases.iter()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}
