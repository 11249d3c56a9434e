use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::model::case::CaseElement;
use crate::model::status::{ProgressState, Status, TestResult};
use crate::model::suite::SuiteElement;

/// Opaque identifier the event source assigns to a test element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Execution timing for one element.
///
/// `Running` carries the start instant; `Completed` carries the final
/// elapsed duration. An element and its suite aggregate share one slot.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Timing {
    NotStarted,
    Running { start: Instant },
    Completed { duration: Duration },
}

impl Timing {
    /// Advance for a status transition. Entering running records a start
    /// unless one is already recorded (a rerun continuation keeps the
    /// original start); completing while running finalizes the duration.
    /// Every other transition leaves the slot untouched.
    fn advance(self, progress: ProgressState, now: Instant) -> Timing {
        match progress {
            ProgressState::Running => match self {
                Timing::Running { .. } => self,
                _ => Timing::Running { start: now },
            },
            ProgressState::Completed => match self {
                Timing::Running { start } => Timing::Completed {
                    duration: now.saturating_duration_since(start),
                },
                _ => self,
            },
            ProgressState::NotStarted => self,
        }
    }
}

/// Failure detail reported alongside a failed or errored completion.
///
/// The strings are stored as reported; interpreting them is the reporting
/// collaborator's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureTrace {
    /// Raw failure text (message and/or stack trace).
    pub trace: String,
    /// Expected value, when the failure was a comparison.
    pub expected: Option<String>,
    /// Actual value, when the failure was a comparison.
    pub actual: Option<String>,
}

#[derive(Debug)]
struct OwnState {
    status: Status,
    timing: Timing,
    failure: Option<FailureTrace>,
}

/// Identity, tree links and own state shared by case and suite nodes.
///
/// The parent link is navigational only: suites own their children through
/// `Arc`s, the way back up is a `Weak`, so dropping a subtree never drops
/// an ancestor.
#[derive(Debug)]
pub(crate) struct ElementCore {
    id: ElementId,
    name: String,
    parent: Weak<TestElement>,
    me: Weak<TestElement>,
    state: RwLock<OwnState>,
}

impl ElementCore {
    pub(crate) fn new(
        id: ElementId,
        name: String,
        parent: Weak<TestElement>,
        me: Weak<TestElement>,
    ) -> Self {
        Self {
            id,
            name,
            parent,
            me,
            state: RwLock::new(OwnState {
                status: Status::NOT_RUN,
                timing: Timing::NotStarted,
                failure: None,
            }),
        }
    }

    pub(crate) fn id(&self) -> &ElementId {
        &self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn parent(&self) -> Option<Arc<TestElement>> {
        self.parent.upgrade()
    }

    pub(crate) fn me(&self) -> Option<Arc<TestElement>> {
        self.me.upgrade()
    }

    pub(crate) fn own_status(&self) -> Status {
        self.state.read().status
    }

    pub(crate) fn elapsed(&self) -> Option<Duration> {
        match self.state.read().timing {
            Timing::Completed { duration } => Some(duration),
            _ => None,
        }
    }

    pub(crate) fn failure(&self) -> Option<FailureTrace> {
        self.state.read().failure.clone()
    }

    /// Store a new own status, driving the timing transition under the
    /// same exclusive hold.
    pub(crate) fn set_own_status(&self, status: Status, failure: Option<FailureTrace>) {
        let now = Instant::now();
        let mut state = self.state.write();
        state.timing = state.timing.advance(status.progress(), now);
        state.status = status;
        if failure.is_some() {
            state.failure = failure;
        }
    }

    /// Advance only the timing slot. Suite aggregate transitions reuse the
    /// element's single slot, so a suite is timed from its first running
    /// child to its last completion even without own start/stop events.
    pub(crate) fn advance_timing(&self, progress: ProgressState) {
        let now = Instant::now();
        let mut state = self.state.write();
        state.timing = state.timing.advance(progress, now);
    }
}

/// A node in the test run tree: one test case, or a suite owning an
/// ordered list of children.
#[derive(Debug)]
pub enum TestElement {
    Case(CaseElement),
    Suite(SuiteElement),
}

impl TestElement {
    pub(crate) fn core(&self) -> &ElementCore {
        match self {
            Self::Case(case) => case.core(),
            Self::Suite(suite) => suite.core(),
        }
    }

    /// The identifier assigned by the event source.
    pub fn id(&self) -> &ElementId {
        self.core().id()
    }

    /// Display name as reported by the event source.
    pub fn name(&self) -> &str {
        self.core().name()
    }

    /// The owning suite, or `None` for the root of the tree.
    pub fn parent(&self) -> Option<Arc<TestElement>> {
        self.core().parent()
    }

    /// Current status. For suites, `include_children` selects the combined
    /// view (children aggregate plus the suite's own status) over the own
    /// status alone; cases ignore the flag.
    pub fn status(&self, include_children: bool) -> Status {
        match self {
            Self::Case(_) => self.core().own_status(),
            Self::Suite(suite) => suite.status(include_children),
        }
    }

    /// Externally visible result. An ignored case reads `Ignored` whatever
    /// its recorded status.
    pub fn result(&self, include_children: bool) -> TestResult {
        match self {
            Self::Case(case) => case.result(),
            Self::Suite(_) => self.status(include_children).to_result(),
        }
    }

    /// Final elapsed duration, or `None` while the element is still
    /// running or has never run.
    pub fn elapsed(&self) -> Option<Duration> {
        self.core().elapsed()
    }

    /// Failure detail recorded with the most recent failed or errored
    /// completion, if any.
    pub fn failure(&self) -> Option<FailureTrace> {
        self.core().failure()
    }

    /// Assign a new own status and propagate the change to the parent.
    pub(crate) fn report_status(&self, status: Status, failure: Option<FailureTrace>) {
        self.core().set_own_status(status, failure);
        self.notify_parent();
    }

    /// Upward notification: the parent always receives this element's
    /// *combined* status, so a suite-level failure stays visible to the
    /// grandparent even when no child failed.
    pub(crate) fn notify_parent(&self) {
        let Some(me) = self.core().me() else {
            return;
        };
        let Some(parent) = self.parent() else {
            return;
        };
        if let Self::Suite(suite) = parent.as_ref() {
            suite.child_changed_status(&me, me.status(true));
        }
    }
}

impl fmt::Display for TestElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Case(case) => {
                write!(f, "case {}: {}", case.test_name(), self.status(true))
            }
            Self::Suite(suite) => write!(
                f,
                "suite {}: {} ({})",
                self.name(),
                self.status(true),
                suite.children().len()
            ),
        }
    }
}
