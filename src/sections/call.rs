use crate::document::{Node, Position};
use crate::fields::Fields;
use crate::issue::Issue;
use crate::model::Ref;
use crate::schema::{exclusive_choice, read_link_details, Choice, DataFlow};
use crate::sections::external::ExternalSystem;
use crate::sections::service::Service;
use crate::sections::technology::{connect_technologies, read_technologies, TechnologyBundle, TechnologySet};
use crate::symbols::SymbolTable;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CallTarget {
    Service(String),
    ExternalSystem(String),
}

const CALL_TARGETS: &[(&str, fn(String) -> CallTarget)] = &[
    ("service", CallTarget::Service),
    ("externalSystem", CallTarget::ExternalSystem),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callee {
    Service(Ref<Service>),
    ExternalSystem(Ref<ExternalSystem>),
}

/// A call from a service or external system to another one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    #[serde(skip)]
    pub position: Position,
    #[serde(flatten)]
    pub target: CallTarget,
    pub description: String,
    pub data_flow: DataFlow,
    #[serde(skip_serializing_if = "TechnologySet::is_empty")]
    pub technologies: TechnologySet,
    #[serde(skip)]
    pub callee: Option<Callee>,
}

/// Reads one element of a `calls` sequence. Calls without a single valid
/// target are reported and left out.
pub fn read_call(node: &Node, issues: &mut Vec<Issue>) -> Option<Call> {
    let fields = match Fields::of(node) {
        Ok(fields) => fields,
        Err(issue) => {
            issues.push(issue);
            return None;
        }
    };
    let target = match exclusive_choice(&fields, CALL_TARGETS, issues) {
        Choice::One(target) => Some(target),
        Choice::Missing => {
            issues.push(Issue::error("One of service or externalSystem is required", node));
            None
        }
        Choice::Conflict => {
            issues.push(Issue::error(
                "A call may be to either a service or to an externalSystem. Split the call into two to call both.",
                node,
            ));
            None
        }
        Choice::Malformed => None,
    };
    let details = read_link_details(&fields, issues);
    let technologies = read_technologies(&fields, "technologies", issues);
    Some(Call {
        position: node.position,
        target: target?,
        description: details.description,
        data_flow: details.data_flow,
        technologies,
        callee: None,
    })
}

/// Links the callee and the technologies of a call.
pub fn connect_call(
    call: &mut Call,
    bundles: &[TechnologyBundle],
    symbols: &SymbolTable,
) -> Vec<Issue> {
    let mut issues = connect_technologies(&mut call.technologies, bundles, symbols);
    let callee = match &call.target {
        CallTarget::Service(id) => symbols
            .service(id)
            .map(Callee::Service)
            .ok_or_else(|| format!("Unknown service '{id}'")),
        CallTarget::ExternalSystem(id) => symbols
            .external_system(id)
            .map(Callee::ExternalSystem)
            .ok_or_else(|| format!("Unknown external system '{id}'")),
    };
    match callee {
        Ok(callee) => call.callee = Some(callee),
        Err(message) => issues.push(Issue::error_at(message, call.position)),
    }
    issues
}
