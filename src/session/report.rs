use serde::{Deserialize, Serialize};

use crate::model::element::TestElement;
use crate::session::run::TestRunSession;

/// Serializable point-in-time snapshot of a run session, for the consumer
/// side of the read contract. A snapshot of the in-memory model only; it
/// is not a run-history store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session: String,
    pub summary: SummaryReport,
    pub root: ElementReport,
}

/// Leaf counters in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub ignored: usize,
    pub running: usize,
    pub success: bool,
}

/// One element in the report tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementReport {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub status: String,
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementReport>,
}

/// Failure detail in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureReport {
    pub trace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

/// Convert a session into a serializable [`SessionReport`].
pub fn to_report(session: &TestRunSession) -> SessionReport {
    let summary = session.summary();
    SessionReport {
        session: session.name().to_owned(),
        summary: SummaryReport {
            total: summary.total,
            passed: summary.passed,
            failed: summary.failed,
            errors: summary.errors,
            ignored: summary.ignored,
            running: summary.running,
            success: summary.success(),
        },
        root: element_report(session.root()),
    }
}

fn element_report(element: &TestElement) -> ElementReport {
    let (kind, children) = match element {
        TestElement::Case(_) => ("case", Vec::new()),
        TestElement::Suite(suite) => (
            "suite",
            suite
                .children()
                .iter()
                .map(|child| element_report(child))
                .collect(),
        ),
    };
    ElementReport {
        id: element.id().as_str().to_owned(),
        name: element.name().to_owned(),
        kind: kind.to_owned(),
        status: element.status(true).to_string(),
        result: element.result(true).to_string(),
        duration_ms: element.elapsed().map(|d| d.as_millis() as u64),
        failure: element.failure().map(|f| FailureReport {
            trace: f.trace,
            expected: f.expected,
            actual: f.actual,
        }),
        children,
    }
}

/// Serialize a report as pretty JSON.
///
/// # Errors
///
/// Returns the underlying serializer error.
pub fn to_json(report: &SessionReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
