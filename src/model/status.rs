use std::fmt;

/// How far a test element has progressed through execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    NotStarted,
    Running,
    Completed,
}

impl fmt::Display for ProgressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// The outcome recorded for a test element, from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeState {
    None,
    Ok,
    Failure,
    Error,
}

impl OutcomeState {
    /// The more severe of two outcomes: None < Ok < Failure < Error.
    pub fn worst(self, other: OutcomeState) -> OutcomeState {
        match (self, other) {
            (Self::Error, _) | (_, Self::Error) => Self::Error,
            (Self::Failure, _) | (_, Self::Failure) => Self::Failure,
            (Self::Ok, _) | (_, Self::Ok) => Self::Ok,
            (Self::None, Self::None) => Self::None,
        }
    }
}

/// Progress crossed with outcome for one test element.
///
/// Values are constructed only through the named constants and [`combine`],
/// which keeps a failure or error outcome from ever pairing with
/// `NotStarted`.
///
/// [`combine`]: Status::combine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    progress: ProgressState,
    outcome: OutcomeState,
}

impl Status {
    /// Never started.
    pub const NOT_RUN: Status = Status {
        progress: ProgressState::NotStarted,
        outcome: OutcomeState::None,
    };
    /// Started and still executing.
    pub const RUNNING: Status = Status {
        progress: ProgressState::Running,
        outcome: OutcomeState::None,
    };
    /// Still executing, but a failure has already surfaced.
    pub const RUNNING_FAILURE: Status = Status {
        progress: ProgressState::Running,
        outcome: OutcomeState::Failure,
    };
    /// Still executing, but an error has already surfaced.
    pub const RUNNING_ERROR: Status = Status {
        progress: ProgressState::Running,
        outcome: OutcomeState::Error,
    };
    /// Completed successfully.
    pub const OK: Status = Status {
        progress: ProgressState::Completed,
        outcome: OutcomeState::Ok,
    };
    /// Completed with an assertion failure.
    pub const FAILURE: Status = Status {
        progress: ProgressState::Completed,
        outcome: OutcomeState::Failure,
    };
    /// Completed with an unexpected error.
    pub const ERROR: Status = Status {
        progress: ProgressState::Completed,
        outcome: OutcomeState::Error,
    };

    /// The progress component. Failing-while-running statuses read `Running`.
    pub fn progress(self) -> ProgressState {
        self.progress
    }

    /// The outcome component.
    pub fn outcome(self) -> OutcomeState {
        self.outcome
    }

    /// Combine two statuses into the status of the pair, as used when
    /// folding a suite's children into one summary.
    ///
    /// The outcome is the more severe of the two. The progress is `Running`
    /// if either side is running, `NotStarted` if neither side has started,
    /// and `Completed` otherwise. `NOT_RUN` is the identity, and the
    /// operation is commutative and associative, so a fold is insensitive
    /// to grouping.
    pub fn combine(self, other: Status) -> Status {
        Status {
            progress: combine_progress(self.progress, other.progress),
            outcome: self.outcome.worst(other.outcome),
        }
    }

    pub fn is_running(self) -> bool {
        self.progress == ProgressState::Running
    }

    pub fn is_done(self) -> bool {
        self.progress == ProgressState::Completed
    }

    pub fn is_not_run(self) -> bool {
        self.progress == ProgressState::NotStarted
    }

    pub fn is_error_or_failure(self) -> bool {
        matches!(self.outcome, OutcomeState::Failure | OutcomeState::Error)
    }

    pub fn is_failure(self) -> bool {
        self.outcome == OutcomeState::Failure
    }

    pub fn is_error(self) -> bool {
        self.outcome == OutcomeState::Error
    }

    /// The externally visible result. Only completed statuses report a
    /// result; anything still pending or running reads `Undefined`, and
    /// callers wanting a live indicator use [`progress`] instead.
    ///
    /// [`progress`]: Status::progress
    pub fn to_result(self) -> TestResult {
        match (self.progress, self.outcome) {
            (ProgressState::Completed, OutcomeState::Ok) => TestResult::Passed,
            (ProgressState::Completed, OutcomeState::Failure) => TestResult::Failed,
            (ProgressState::Completed, OutcomeState::Error) => TestResult::Error,
            _ => TestResult::Undefined,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.progress, self.outcome) {
            (ProgressState::NotStarted, _) => write!(f, "not run"),
            (ProgressState::Running, OutcomeState::Failure) => write!(f, "running (failure)"),
            (ProgressState::Running, OutcomeState::Error) => write!(f, "running (error)"),
            (ProgressState::Running, _) => write!(f, "running"),
            (ProgressState::Completed, OutcomeState::Failure) => write!(f, "failure"),
            (ProgressState::Completed, OutcomeState::Error) => write!(f, "error"),
            (ProgressState::Completed, _) => write!(f, "ok"),
        }
    }
}

/// `Running` dominates; otherwise the pair is completed unless neither side
/// has started. One completed child keeps a suite with pending siblings
/// readable as done only once nothing is left running.
fn combine_progress(a: ProgressState, b: ProgressState) -> ProgressState {
    match (a, b) {
        (ProgressState::Running, _) | (_, ProgressState::Running) => ProgressState::Running,
        (ProgressState::NotStarted, ProgressState::NotStarted) => ProgressState::NotStarted,
        _ => ProgressState::Completed,
    }
}

/// Result of a test element as reported to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestResult {
    Passed,
    Failed,
    Error,
    Ignored,
    Undefined,
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Error => write!(f, "error"),
            Self::Ignored => write!(f, "ignored"),
            Self::Undefined => write!(f, "undefined"),
        }
    }
}
