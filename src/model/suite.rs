use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::model::element::{ElementCore, ElementId, TestElement};
use crate::model::status::Status;

/// A container node: an ordered child list plus the incremental machinery
/// that keeps the children's combined status current as results stream in.
///
/// The suite also carries an *own* status, separate from the children
/// aggregate: a fixture failure (setup or teardown) is attributed to the
/// suite node itself and survives even when every child passed.
#[derive(Debug)]
pub struct SuiteElement {
    core: ElementCore,
    children: RwLock<Vec<Arc<TestElement>>>,
    children_status: RwLock<Option<Status>>,
}

impl SuiteElement {
    /// Create a suite. `parent` is `None` for the root of a session;
    /// `expected_children` pre-sizes the child list when the event source
    /// announces a count up front.
    pub(crate) fn create(
        parent: Option<&Arc<TestElement>>,
        id: ElementId,
        name: String,
        expected_children: usize,
    ) -> Arc<TestElement> {
        let parent = match parent {
            Some(parent) => Arc::downgrade(parent),
            None => Weak::new(),
        };
        Arc::new_cyclic(|me| {
            TestElement::Suite(SuiteElement {
                core: ElementCore::new(id, name, parent, me.clone()),
                children: RwLock::new(Vec::with_capacity(expected_children)),
                children_status: RwLock::new(None),
            })
        })
    }

    pub(crate) fn core(&self) -> &ElementCore {
        &self.core
    }

    /// Append a child in discovery order. Appending never recomputes the
    /// aggregate; the child's own status events drive that.
    pub fn add_child(&self, child: Arc<TestElement>) {
        self.children.write().push(child);
    }

    /// Ordered snapshot of the child list.
    pub fn children(&self) -> Vec<Arc<TestElement>> {
        self.children.read().clone()
    }

    /// Status attributable to the suite node itself, independent of its
    /// children.
    pub fn suite_status(&self) -> Status {
        self.core.own_status()
    }

    /// Combined status (children aggregate plus own) when
    /// `include_children`, own status alone otherwise. Before any child
    /// has reported, the combined view is just the own status.
    pub fn status(&self, include_children: bool) -> Status {
        let own = self.core.own_status();
        if !include_children {
            return own;
        }
        match *self.children_status.read() {
            Some(aggregate) => aggregate.combine(own),
            None => own,
        }
    }

    /// React to one child's status change, in report order.
    ///
    /// The common cases update the aggregate in O(1); only a completed run
    /// or a detected rerun pays for a full fold over the children:
    ///
    /// 1. first child running: the run begins, adopt its status;
    /// 2. last child done: fold;
    /// 3. non-last child changed while the last child has already run:
    ///    a rerun is in progress, fold (heuristic: discovery order is
    ///    assumed to match execution order);
    /// 4. otherwise surface a newly failing or erroring child as
    ///    RUNNING_FAILURE / RUNNING_ERROR, or absorb the event.
    pub(crate) fn child_changed_status(&self, child: &Arc<TestElement>, child_status: Status) {
        let children = self.children();
        let (Some(first), Some(last)) = (children.first(), children.last()) else {
            // No children registered yet; nothing to aggregate.
            return;
        };

        if Arc::ptr_eq(child, first) && child_status.is_running() {
            self.set_children_status(child_status);
            return;
        }

        if Arc::ptr_eq(child, last) {
            if child_status.is_done() {
                self.set_children_status(self.cumulated_status());
                return;
            }
            // Not done: fall through. A nested suite can report
            // RUNNING_FAILURE long before it completes.
        } else if !last.status(true).is_not_run() {
            self.set_children_status(self.cumulated_status());
            return;
        }

        let current = *self.children_status.read();
        if child_status.is_failure() {
            if current.is_none_or(|status| !status.is_error_or_failure()) {
                self.set_children_status(Status::RUNNING_FAILURE);
            }
        } else if child_status.is_error() && current.is_none_or(|status| !status.is_error()) {
            self.set_children_status(Status::RUNNING_ERROR);
        }
    }

    /// Left-fold `combine` over a point-in-time snapshot of the children,
    /// seeded by the first child's combined status. Zero children fold to
    /// the suite's own status. The snapshot keeps a concurrent reader's
    /// `add_child` from invalidating the iteration.
    fn cumulated_status(&self) -> Status {
        let children = self.children();
        let Some(first) = children.first() else {
            return self.suite_status();
        };
        children[1..]
            .iter()
            .fold(first.status(true), |cumulated, child| {
                cumulated.combine(child.status(true))
            })
    }

    /// Store a changed aggregate: drive the timing transition, record the
    /// value, then propagate the suite's combined status upward. A write
    /// with an unchanged value is absorbed without propagation.
    fn set_children_status(&self, status: Status) {
        {
            let mut aggregate = self.children_status.write();
            if *aggregate == Some(status) {
                return;
            }
            self.core.advance_timing(status.progress());
            *aggregate = Some(status);
        }
        // Locks are released before walking up; the parent reads this
        // suite's status while folding.
        if let Some(me) = self.core.me() {
            me.notify_parent();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::case::CaseElement;
    use crate::model::element::FailureTrace;

    fn suite_named(name: &str) -> Arc<TestElement> {
        SuiteElement::create(None, ElementId::new(name), name.to_owned(), 0)
    }

    fn suite_under(parent: &Arc<TestElement>, name: &str) -> Arc<TestElement> {
        let suite = SuiteElement::create(Some(parent), ElementId::new(name), name.to_owned(), 0);
        as_suite(parent).add_child(Arc::clone(&suite));
        suite
    }

    fn case_under(parent: &Arc<TestElement>, name: &str) -> Arc<TestElement> {
        let case = CaseElement::create(parent, ElementId::new(name), name.to_owned());
        as_suite(parent).add_child(Arc::clone(&case));
        case
    }

    fn as_suite(element: &TestElement) -> &SuiteElement {
        match element {
            TestElement::Suite(suite) => suite,
            TestElement::Case(_) => panic!("expected a suite element"),
        }
    }

    fn start(element: &TestElement) {
        element.report_status(Status::RUNNING, None);
    }

    fn pass(element: &TestElement) {
        element.report_status(Status::OK, None);
    }

    fn fail(element: &TestElement) {
        element.report_status(Status::FAILURE, None);
    }

    fn error(element: &TestElement) {
        element.report_status(Status::ERROR, None);
    }

    #[test]
    fn first_child_running_adopts_status_directly() {
        let suite = suite_named("Suite");
        let a = case_under(&suite, "a");
        let _b = case_under(&suite, "b");
        start(&a);
        assert_eq!(suite.status(true), Status::RUNNING);
    }

    #[test]
    fn non_first_failure_surfaces_as_running_failure() {
        let suite = suite_named("Suite");
        let a = case_under(&suite, "a");
        let b = case_under(&suite, "b");
        let _c = case_under(&suite, "c");
        start(&a);
        fail(&b);
        assert_eq!(suite.status(true), Status::RUNNING_FAILURE);
    }

    #[test]
    fn error_upgrades_a_surfaced_failure() {
        let suite = suite_named("Suite");
        let a = case_under(&suite, "a");
        let b = case_under(&suite, "b");
        let _c = case_under(&suite, "c");
        start(&a);
        fail(&a);
        error(&b);
        assert_eq!(suite.status(true), Status::RUNNING_ERROR);
    }

    #[test]
    fn failure_never_downgrades_a_surfaced_error() {
        let suite = suite_named("Suite");
        let a = case_under(&suite, "a");
        let b = case_under(&suite, "b");
        let _c = case_under(&suite, "c");
        start(&a);
        error(&a);
        fail(&b);
        assert_eq!(suite.status(true), Status::RUNNING_ERROR);
    }

    #[test]
    fn passing_middle_child_is_absorbed() {
        let suite = suite_named("Suite");
        let a = case_under(&suite, "a");
        let b = case_under(&suite, "b");
        let _c = case_under(&suite, "c");
        start(&a);
        pass(&b);
        assert_eq!(suite.status(true), Status::RUNNING);
    }

    #[test]
    fn last_child_done_folds_to_worst_outcome() {
        let suite = suite_named("Suite");
        let a = case_under(&suite, "a");
        let b = case_under(&suite, "b");
        let c = case_under(&suite, "c");
        start(&a);
        pass(&a);
        fail(&b);
        error(&c);
        assert_eq!(suite.status(true), Status::ERROR);
        assert!(suite.status(true).is_done());
    }

    #[test]
    fn streamed_run_walks_running_then_failure_then_fold() {
        // Walk a three-child suite through a full run, event by event.
        let suite = suite_named("Suite");
        let a = case_under(&suite, "a");
        let b = case_under(&suite, "b");
        let c = case_under(&suite, "c");
        start(&a);
        assert_eq!(suite.status(true), Status::RUNNING);
        fail(&b);
        assert_eq!(suite.status(true), Status::RUNNING_FAILURE);
        pass(&a);
        assert_eq!(suite.status(true), Status::RUNNING_FAILURE);
        error(&c);
        assert_eq!(suite.status(true), Status::ERROR);
    }

    #[test]
    fn rerun_of_first_child_recomputes_from_scratch() {
        let suite = suite_named("Suite");
        let a = case_under(&suite, "a");
        let b = case_under(&suite, "b");
        start(&a);
        pass(&a);
        start(&b);
        pass(&b);
        assert_eq!(suite.status(true), Status::OK);

        // Rerun only the first child; the last child's stored status never
        // changes, yet the aggregate must pick up the new failure.
        start(&a);
        assert_eq!(suite.status(true), Status::RUNNING);
        fail(&a);
        assert_eq!(suite.status(true), Status::FAILURE);
        assert_eq!(b.status(true), Status::OK);
    }

    #[test]
    fn repeated_completion_without_restart_is_a_rerun() {
        let suite = suite_named("Suite");
        let a = case_under(&suite, "a");
        let b = case_under(&suite, "b");
        pass(&a);
        pass(&b);
        assert_eq!(suite.status(true), Status::OK);

        // A second completion for a non-last child, with no started event
        // in between, still recomputes instead of crashing or going stale.
        fail(&a);
        assert_eq!(suite.status(true), Status::FAILURE);
    }

    #[test]
    fn zero_child_suite_reads_its_own_status() {
        let suite = suite_named("Suite");
        assert_eq!(suite.status(true), suite.status(false));
        start(&suite);
        assert_eq!(suite.status(true), suite.status(false));
        fail(&suite);
        assert_eq!(suite.status(true), Status::FAILURE);
        assert_eq!(suite.status(true), suite.status(false));
    }

    #[test]
    fn combined_status_includes_suite_own_failure() {
        let suite = suite_named("Suite");
        let a = case_under(&suite, "a");
        let b = case_under(&suite, "b");
        start(&a);
        pass(&a);
        start(&b);
        pass(&b);
        assert_eq!(suite.status(true), Status::OK);

        // Teardown failure attributed to the suite itself.
        suite.report_status(Status::FAILURE, None);
        assert_eq!(suite.status(false), Status::FAILURE);
        assert_eq!(suite.status(true), Status::FAILURE);
    }

    #[test]
    fn combined_equals_aggregate_combined_with_own() {
        let suite = suite_named("Suite");
        let a = case_under(&suite, "a");
        fail(&a);
        suite.report_status(Status::ERROR, None);
        let aggregate = Status::FAILURE;
        assert_eq!(
            suite.status(true),
            aggregate.combine(suite.status(false))
        );
    }

    #[test]
    fn child_failure_propagates_to_grandparent() {
        let root = suite_named("Root");
        let inner = suite_under(&root, "Inner");
        let a = case_under(&inner, "a");
        let _b = case_under(&inner, "b");
        fail(&a);
        assert_eq!(inner.status(true), Status::RUNNING_FAILURE);
        // The inner suite is the root's first child and reports a running
        // status, so the root adopts it directly.
        assert_eq!(root.status(true), Status::RUNNING_FAILURE);
    }

    #[test]
    fn suite_teardown_failure_reaches_grandparent() {
        let root = suite_named("Root");
        let inner = suite_under(&root, "Inner");
        let case = case_under(&inner, "a");
        start(&case);
        pass(&case);
        assert_eq!(root.status(true), Status::OK);

        // The propagated status is the combined one, so the grandparent
        // sees a teardown failure no individual child reported.
        inner.report_status(Status::FAILURE, None);
        assert_eq!(root.status(true), Status::FAILURE);
    }

    #[test]
    fn add_child_does_not_recompute() {
        let suite = suite_named("Suite");
        let a = case_under(&suite, "a");
        start(&a);
        pass(&a);
        assert_eq!(suite.status(true), Status::OK);

        // Discovering a new child leaves the aggregate alone until that
        // child reports.
        let _late = case_under(&suite, "late");
        assert_eq!(suite.status(true), Status::OK);
    }

    #[test]
    fn children_snapshot_preserves_discovery_order() {
        let suite = suite_named("Suite");
        let _a = case_under(&suite, "a");
        let _b = case_under(&suite, "b");
        let _c = case_under(&suite, "c");
        let names: Vec<String> = as_suite(&suite)
            .children()
            .iter()
            .map(|child| child.name().to_owned())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn suite_timing_runs_from_first_start_to_fold() {
        let suite = suite_named("Suite");
        let a = case_under(&suite, "a");
        let b = case_under(&suite, "b");
        start(&a);
        assert!(suite.elapsed().is_none());
        pass(&a);
        pass(&b);
        let elapsed = suite.elapsed().expect("completed suite has a duration");
        assert!(elapsed < std::time::Duration::from_secs(5));
    }

    #[test]
    fn failing_child_keeps_its_trace_through_aggregation() {
        let suite = suite_named("Suite");
        let a = case_under(&suite, "a");
        let _b = case_under(&suite, "b");
        a.report_status(
            Status::FAILURE,
            Some(FailureTrace {
                trace: "boom".into(),
                expected: None,
                actual: None,
            }),
        );
        assert_eq!(suite.status(true), Status::RUNNING_FAILURE);
        assert_eq!(a.failure().unwrap().trace, "boom");
        assert!(suite.failure().is_none());
    }
}
