use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::model::element::{ElementCore, ElementId, TestElement};
use crate::model::status::TestResult;

/// A leaf of the test tree: one test case.
#[derive(Debug)]
pub struct CaseElement {
    core: ElementCore,
    ignored: AtomicBool,
}

impl CaseElement {
    /// Create a case attached to its owning suite. The caller appends it
    /// to the suite's child list.
    pub(crate) fn create(
        parent: &Arc<TestElement>,
        id: ElementId,
        name: String,
    ) -> Arc<TestElement> {
        Arc::new_cyclic(|me| {
            TestElement::Case(CaseElement {
                core: ElementCore::new(id, name, Arc::downgrade(parent), me.clone()),
                ignored: AtomicBool::new(false),
            })
        })
    }

    pub(crate) fn core(&self) -> &ElementCore {
        &self.core
    }

    /// Mark the case ignored. Idempotent; the flag only changes what
    /// subsequent [`result`] calls report.
    ///
    /// [`result`]: CaseElement::result
    pub fn set_ignored(&self, ignored: bool) {
        self.ignored.store(ignored, Ordering::Relaxed);
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored.load(Ordering::Relaxed)
    }

    /// The case's result. An ignored case reads `Ignored` regardless of
    /// any recorded outcome, including one left over from an earlier run.
    pub fn result(&self) -> TestResult {
        if self.is_ignored() {
            TestResult::Ignored
        } else {
            self.core.own_status().to_result()
        }
    }

    /// Full display name as reported by the event source.
    pub fn test_name(&self) -> &str {
        self.core.name()
    }

    /// Display name with a trailing parenthesized class suffix or `@`
    /// disambiguator removed: `"testFoo(com.example.FooTest)"` and
    /// `"testFoo@2"` both read `"testFoo"`. Total: a name with neither
    /// decoration comes back unchanged.
    pub fn method_name(&self) -> &str {
        let name = self.core.name();
        if let Some(index) = name.rfind('(')
            && index > 0
        {
            return &name[..index];
        }
        if let Some(index) = name.find('@')
            && index > 0
        {
            return &name[..index];
        }
        name
    }

    /// The leading identifier prefix of [`method_name`], dropping trailing
    /// decoration such as parameter brackets. Falls back to the method
    /// name unchanged when no identifier prefix exists.
    ///
    /// [`method_name`]: CaseElement::method_name
    pub fn bare_method_name(&self) -> &str {
        let name = self.method_name();
        let end = name
            .find(|c: char| !c.is_alphanumeric() && c != '_')
            .unwrap_or(name.len());
        if end == 0 { name } else { &name[..end] }
    }

    /// Name of the owning suite, or `None` for a detached case.
    pub fn class_name(&self) -> Option<String> {
        self.core.parent().map(|parent| parent.name().to_owned())
    }
}
