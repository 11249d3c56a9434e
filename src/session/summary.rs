use crate::model::element::TestElement;
use crate::model::status::{ProgressState, TestResult};

/// Leaf-level counters for a run, recomputed from the tree on demand.
///
/// Counting leaves fresh on every read keeps the numbers honest across
/// reruns, where an incrementally maintained tally would double-count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub ignored: usize,
    pub running: usize,
    pub not_run: usize,
}

impl RunSummary {
    /// Whether the run is free of failures and errors so far.
    pub fn success(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }

    /// Count every case at or below `element`.
    pub fn collect(element: &TestElement) -> Self {
        let mut summary = Self::default();
        summary.visit(element);
        summary
    }

    fn visit(&mut self, element: &TestElement) {
        match element {
            TestElement::Case(case) => {
                self.total += 1;
                match case.result() {
                    TestResult::Passed => self.passed += 1,
                    TestResult::Failed => self.failed += 1,
                    TestResult::Error => self.errors += 1,
                    TestResult::Ignored => self.ignored += 1,
                    TestResult::Undefined => match element.status(false).progress() {
                        ProgressState::Running => self.running += 1,
                        _ => self.not_run += 1,
                    },
                }
            }
            TestElement::Suite(suite) => {
                for child in suite.children() {
                    self.visit(&child);
                }
            }
        }
    }
}
