//! trst — live status model for hierarchical test runs.
//!
//! Tracks a tree of test cases and suites while outcomes stream in from an
//! executing test process. Every node carries its own status and timing;
//! suites derive an aggregate status incrementally, one child change at a
//! time, and propagate changes up the tree within a single call chain. A
//! consumer (a tree view, a reporter) reads point-in-time snapshots while
//! events keep arriving.
//!
//! Out of scope by design: launching test processes, parsing their output,
//! and rendering. An external collaborator translates the run's wire
//! events into calls on [`TestRunSession`].

pub mod model;
pub mod session;

pub use model::element::{ElementId, FailureTrace, TestElement};
pub use model::status::{OutcomeState, ProgressState, Status, TestResult};
pub use session::run::{ModelError, ModelErrorKind, RunOutcome, TestRunSession};
pub use session::summary::RunSummary;
