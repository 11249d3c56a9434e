use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;

use crate::model::case::CaseElement;
use crate::model::element::{ElementId, FailureTrace, TestElement};
use crate::model::status::Status;
use crate::model::suite::SuiteElement;
use crate::session::summary::RunSummary;

/// Outcome attached to a completion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Passed,
    Failed,
    Errored,
}

impl RunOutcome {
    fn to_status(self) -> Status {
        match self {
            Self::Passed => Status::OK,
            Self::Failed => Status::FAILURE,
            Self::Errored => Status::ERROR,
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Errored => write!(f, "errored"),
        }
    }
}

/// The live model of one test run: the element tree plus the id registry
/// the event source addresses elements through.
///
/// Mutations are expected from a single event-delivery thread, one event
/// at a time, in report order; reads may come from any other thread at any
/// moment and only ever see a fully applied update.
#[derive(Debug)]
pub struct TestRunSession {
    name: String,
    root: Arc<TestElement>,
    elements: RwLock<HashMap<ElementId, Arc<TestElement>>>,
}

impl TestRunSession {
    /// Identifier of the synthetic root suite.
    pub const ROOT_ID: &'static str = "root";

    /// Create a session with an empty root suite named after the session.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let root = SuiteElement::create(None, ElementId::new(Self::ROOT_ID), name.clone(), 0);
        let mut elements = HashMap::new();
        elements.insert(root.id().clone(), Arc::clone(&root));
        Self {
            name,
            root,
            elements: RwLock::new(elements),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The synthetic root suite.
    pub fn root(&self) -> &Arc<TestElement> {
        &self.root
    }

    /// Look up an element by id.
    pub fn element(&self, id: &ElementId) -> Option<Arc<TestElement>> {
        self.elements.read().get(id).cloned()
    }

    /// Current leaf counters over the whole tree.
    pub fn summary(&self) -> RunSummary {
        RunSummary::collect(self.root())
    }

    /// Register a newly discovered suite under `parent_id`.
    /// `expected_children` pre-sizes its child list when the event source
    /// announces a count up front; pass 0 when unknown.
    ///
    /// # Errors
    ///
    /// `UnknownElement` when the parent id is not registered, `NotASuite`
    /// when it names a case, `DuplicateElement` when `id` is taken.
    pub fn discover_suite(
        &self,
        parent_id: &ElementId,
        id: ElementId,
        name: impl Into<String>,
        expected_children: usize,
    ) -> Result<Arc<TestElement>, ModelError> {
        let parent = self.lookup(parent_id)?;
        let TestElement::Suite(parent_suite) = parent.as_ref() else {
            return Err(ModelError::not_a_suite(parent_id));
        };
        let suite = {
            let mut elements = self.elements.write();
            if elements.contains_key(&id) {
                return Err(ModelError::duplicate(&id));
            }
            let suite =
                SuiteElement::create(Some(&parent), id.clone(), name.into(), expected_children);
            elements.insert(id, Arc::clone(&suite));
            suite
        };
        parent_suite.add_child(Arc::clone(&suite));
        debug!("discovered suite {} under {}", suite.name(), parent.name());
        Ok(suite)
    }

    /// Register a newly discovered test case under `parent_id`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`discover_suite`].
    ///
    /// [`discover_suite`]: TestRunSession::discover_suite
    pub fn discover_case(
        &self,
        parent_id: &ElementId,
        id: ElementId,
        name: impl Into<String>,
    ) -> Result<Arc<TestElement>, ModelError> {
        let parent = self.lookup(parent_id)?;
        let TestElement::Suite(parent_suite) = parent.as_ref() else {
            return Err(ModelError::not_a_suite(parent_id));
        };
        let case = {
            let mut elements = self.elements.write();
            if elements.contains_key(&id) {
                return Err(ModelError::duplicate(&id));
            }
            let case = CaseElement::create(&parent, id.clone(), name.into());
            elements.insert(id, Arc::clone(&case));
            case
        };
        parent_suite.add_child(Arc::clone(&case));
        debug!("discovered case {} under {}", case.name(), parent.name());
        Ok(case)
    }

    /// Record that an element started executing.
    ///
    /// # Errors
    ///
    /// `UnknownElement` when the id was never discovered; the model is
    /// left untouched.
    pub fn report_started(&self, id: &ElementId) -> Result<(), ModelError> {
        let element = self.lookup(id)?;
        debug!("started: {}", element.name());
        element.report_status(Status::RUNNING, None);
        Ok(())
    }

    /// Record that an element finished with `outcome`, with optional
    /// failure detail. A repeated completion for the same element is a
    /// rerun, not an error; the aggregate recomputes accordingly.
    ///
    /// # Errors
    ///
    /// `UnknownElement` when the id was never discovered.
    pub fn report_completed(
        &self,
        id: &ElementId,
        outcome: RunOutcome,
        failure: Option<FailureTrace>,
    ) -> Result<(), ModelError> {
        let element = self.lookup(id)?;
        debug!("completed: {} ({outcome})", element.name());
        element.report_status(outcome.to_status(), failure);
        Ok(())
    }

    /// Mark a case ignored. The case completes OK so aggregation moves
    /// past it; its result reads `Ignored` from now on.
    ///
    /// # Errors
    ///
    /// `UnknownElement` for an undiscovered id, `NotACase` when the id
    /// names a suite.
    pub fn report_ignored(&self, id: &ElementId) -> Result<(), ModelError> {
        let element = self.lookup(id)?;
        let TestElement::Case(case) = element.as_ref() else {
            return Err(ModelError::not_a_case(id));
        };
        debug!("ignored: {}", element.name());
        case.set_ignored(true);
        element.report_status(Status::OK, None);
        Ok(())
    }

    fn lookup(&self, id: &ElementId) -> Result<Arc<TestElement>, ModelError> {
        self.element(id).ok_or_else(|| ModelError::unknown(id))
    }
}

/// Error from the session's event-intake surface. A malformed event is a
/// protocol violation by the collaborator layer; it is reported to the
/// caller and never leaves the model half-updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelError {
    pub kind: ModelErrorKind,
    pub message: String,
}

impl ModelError {
    fn unknown(id: &ElementId) -> Self {
        Self {
            kind: ModelErrorKind::UnknownElement,
            message: format!("no element with id \"{id}\""),
        }
    }

    fn duplicate(id: &ElementId) -> Self {
        Self {
            kind: ModelErrorKind::DuplicateElement,
            message: format!("id \"{id}\" is already registered"),
        }
    }

    fn not_a_suite(id: &ElementId) -> Self {
        Self {
            kind: ModelErrorKind::NotASuite,
            message: format!("element \"{id}\" cannot hold children"),
        }
    }

    fn not_a_case(id: &ElementId) -> Self {
        Self {
            kind: ModelErrorKind::NotACase,
            message: format!("element \"{id}\" is not a test case"),
        }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ModelError {}

/// Classification of event-intake errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelErrorKind {
    /// An event named an id that was never discovered.
    UnknownElement,
    /// Discovery reused an already registered id.
    DuplicateElement,
    /// A child was discovered under a case element.
    NotASuite,
    /// A case-only event named a suite.
    NotACase,
}

impl fmt::Display for ModelErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownElement => write!(f, "unknown element"),
            Self::DuplicateElement => write!(f, "duplicate element"),
            Self::NotASuite => write!(f, "not a suite"),
            Self::NotACase => write!(f, "not a case"),
        }
    }
}
