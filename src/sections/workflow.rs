use crate::document::{Node, Position};
use crate::fields::Fields;
use crate::issue::Issue;
use crate::linter::{Connector, ReadContext, SectionReader};
use crate::model::{ArchitectureModel, FormRef, Ref, ViewRef};
use crate::schema::{exclusive_choice, read_description, Choice};
use crate::sections::external::ExternalSystem;
use crate::sections::persona::Persona;
use crate::sections::service::Service;
use crate::sections::{describable, nameable, read_entities, read_list};
use crate::symbols::SymbolTable;
use log::trace;
use serde::Serialize;

/// A sequence of steps that realizes some use case.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    #[serde(skip)]
    pub position: Position,
    pub id: String,
    pub name: String,
    pub description: String,
    pub steps: Vec<Step>,
    /// False once another workflow includes this one as a step.
    pub top_level: bool,
}

impl Default for Workflow {
    fn default() -> Self {
        Workflow {
            position: Position::default(),
            id: String::new(),
            name: String::new(),
            description: String::new(),
            steps: Vec::new(),
            top_level: true,
        }
    }
}

nameable!(Workflow);
describable!(Workflow);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(skip)]
    pub position: Position,
    pub description: String,
    #[serde(flatten)]
    pub kind: StepKind,
}

describable!(Step);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StepKind {
    /// Includes the steps of another workflow. Gone after linking.
    Workflow(String),
    Action(Action),
}

/// Something a performer does in a step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(rename = "performer")]
    pub performer_id: String,
    #[serde(flatten)]
    pub activity: Activity,
    #[serde(skip)]
    pub performer: Option<Performer>,
    #[serde(skip)]
    pub target: Option<ActionTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Activity {
    Command(String),
    Event(String),
    ExternalSystem(String),
    Form(String),
    Service(String),
    View(String),
}

const ACTIVITIES: &[(&str, fn(String) -> Activity)] = &[
    ("command", Activity::Command),
    ("event", Activity::Event),
    ("externalSystem", Activity::ExternalSystem),
    ("form", Activity::Form),
    ("service", Activity::Service),
    ("view", Activity::View),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Performer {
    Persona(Ref<Persona>),
    Service(Ref<Service>),
    ExternalSystem(Ref<ExternalSystem>),
    Form(FormRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTarget {
    Form(FormRef),
    Service(Ref<Service>),
    ExternalSystem(Ref<ExternalSystem>),
    View(ViewRef),
}

impl Workflow {
    /// The linked actions, once sub-workflows are expanded.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.steps.iter().filter_map(|step| match &step.kind {
            StepKind::Action(action) => Some(action),
            StepKind::Workflow(_) => None,
        })
    }
}

/// Reads one step. Steps that are neither a valid sub-workflow nor a valid
/// action are reported and left out.
fn read_step(node: &Node, issues: &mut Vec<Issue>) -> Option<Step> {
    let fields = match Fields::of(node) {
        Ok(fields) => fields,
        Err(issue) => {
            issues.push(issue);
            return None;
        }
    };
    let mut step = Step {
        position: node.position,
        description: String::new(),
        kind: StepKind::Workflow(String::new()),
    };
    read_description(&fields, &mut step, issues);
    step.kind = if fields.get("workflow").is_some() {
        read_sub_workflow(&fields, node, issues)?
    } else {
        read_action(&fields, node, issues)?
    };
    Some(step)
}

fn read_sub_workflow(fields: &Fields, node: &Node, issues: &mut Vec<Issue>) -> Option<StepKind> {
    let performs = std::iter::once("performer")
        .chain(ACTIVITIES.iter().map(|(field, _)| *field))
        .any(|field| fields.get(field).is_some());
    if performs {
        issues.push(Issue::error(
            "A step may either include a workflow or perform an action, not both",
            node,
        ));
        return None;
    }
    match fields.string("workflow") {
        Ok(workflow) => workflow.map(StepKind::Workflow),
        Err(issue) => {
            issues.push(issue);
            None
        }
    }
}

fn read_action(fields: &Fields, node: &Node, issues: &mut Vec<Issue>) -> Option<StepKind> {
    let performer_id = match fields.string("performer") {
        Ok(Some(performer_id)) => Some(performer_id),
        Ok(None) => {
            issues.push(Issue::error("A step needs a performer", node));
            None
        }
        Err(issue) => {
            issues.push(issue);
            None
        }
    };
    let activity = match exclusive_choice(fields, ACTIVITIES, issues) {
        Choice::One(activity) => Some(activity),
        Choice::Missing => {
            issues.push(Issue::error(
                "Need one of command, event, externalSystem, form, service, or view",
                node,
            ));
            None
        }
        Choice::Conflict => {
            issues.push(Issue::error(
                "Need exactly one of command, event, externalSystem, form, service, or view",
                node,
            ));
            None
        }
        Choice::Malformed => None,
    };
    Some(StepKind::Action(Action {
        performer_id: performer_id?,
        activity: activity?,
        performer: None,
        target: None,
    }))
}

pub struct WorkflowReader;

impl SectionReader for WorkflowReader {
    fn read(
        &self,
        node: Option<&Node>,
        _context: &ReadContext,
        model: &mut ArchitectureModel,
    ) -> Vec<Issue> {
        let mut issues = Vec::new();
        model.workflows =
            read_entities(node, &mut issues, |workflow: &mut Workflow, fields, issues| {
                read_description(fields, workflow, issues);
                workflow.steps = read_list(fields, "steps", issues, read_step);
            });
        issues
    }
}

fn connect_target(action: &mut Action, symbols: &SymbolTable) -> Result<(), String> {
    action.target = match &action.activity {
        Activity::Form(id) => Some(
            symbols
                .form(id)
                .map(ActionTarget::Form)
                .ok_or_else(|| format!("Unknown form '{id}'"))?,
        ),
        Activity::Service(id) => Some(
            symbols
                .service(id)
                .map(ActionTarget::Service)
                .ok_or_else(|| format!("Unknown service '{id}'"))?,
        ),
        Activity::ExternalSystem(id) => Some(
            symbols
                .external_system(id)
                .map(ActionTarget::ExternalSystem)
                .ok_or_else(|| format!("Unknown external system '{id}'"))?,
        ),
        Activity::View(id) => Some(
            symbols
                .view(id)
                .map(ActionTarget::View)
                .ok_or_else(|| format!("Unknown view '{id}'"))?,
        ),
        Activity::Command(_) | Activity::Event(_) => None,
    };
    Ok(())
}

/// Finds the performer among the kinds of entity that can do the activity.
fn find_performer(
    action: &Action,
    model: &ArchitectureModel,
    symbols: &SymbolTable,
) -> Result<Performer, String> {
    let id = action.performer_id.as_str();
    let persona = || symbols.persona(id).map(Performer::Persona);
    let service = || symbols.service(id).map(Performer::Service);
    let external_system = || symbols.external_system(id).map(Performer::ExternalSystem);
    let form = || symbols.form(id).map(Performer::Form);

    match &action.activity {
        Activity::Form(_) => persona().ok_or_else(|| format!("Unknown persona '{id}'")),
        Activity::View(view) => match symbols.service(id) {
            Some(found) => model[found]
                .find_database_view(model, view)
                .map(|_| Performer::Service(found))
                .ok_or_else(|| format!("Service '{id}' doesn't have a database with view '{view}'")),
            None => persona().ok_or_else(|| format!("Unknown service or persona '{id}'")),
        },
        Activity::Command(_) => form()
            .or_else(service)
            .or_else(external_system)
            .ok_or_else(|| format!("Unknown form, service, or external system '{id}'")),
        Activity::Service(_) => service()
            .or_else(external_system)
            .ok_or_else(|| format!("Unknown service or external system '{id}'")),
        Activity::ExternalSystem(_) => persona()
            .or_else(service)
            .ok_or_else(|| format!("Unknown persona or service '{id}'")),
        Activity::Event(_) => service().ok_or_else(|| format!("Unknown service '{id}'")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mark {
    Pending,
    InProgress,
    Done,
}

/// Replaces sub-workflow steps by the steps of the workflows they name,
/// depth first, flattening each workflow once.
struct Flattener<'a> {
    original: Vec<Vec<Step>>,
    ids: Vec<String>,
    symbols: &'a SymbolTable,
    marks: Vec<Mark>,
    flattened: Vec<Vec<Step>>,
    included: Vec<bool>,
    stack: Vec<usize>,
    issues: Vec<Issue>,
}

impl<'a> Flattener<'a> {
    fn new(workflows: &mut [Workflow], symbols: &'a SymbolTable) -> Self {
        let count = workflows.len();
        Flattener {
            original: workflows
                .iter_mut()
                .map(|workflow| std::mem::take(&mut workflow.steps))
                .collect(),
            ids: workflows.iter().map(|workflow| workflow.id.clone()).collect(),
            symbols,
            marks: vec![Mark::Pending; count],
            flattened: vec![Vec::new(); count],
            included: vec![false; count],
            stack: Vec::new(),
            issues: Vec::new(),
        }
    }

    fn flatten(&mut self, index: usize) {
        if self.marks[index] != Mark::Pending {
            return;
        }
        self.marks[index] = Mark::InProgress;
        self.stack.push(index);

        let steps = std::mem::take(&mut self.original[index]);
        let mut flattened = Vec::with_capacity(steps.len());
        for step in steps {
            let StepKind::Workflow(id) = &step.kind else {
                flattened.push(step);
                continue;
            };
            let Some(nested) = self.symbols.workflow(id) else {
                self.issues.push(Issue::error_at(
                    format!("Unknown workflow '{id}'"),
                    step.position,
                ));
                continue;
            };
            let nested = nested.index();
            if self.marks[nested] == Mark::InProgress {
                let message = format!("Circular workflow: {}", self.cycle_through(nested));
                self.issues.push(Issue::error_at(message, step.position));
                continue;
            }
            self.flatten(nested);
            self.included[nested] = true;
            flattened.extend(self.flattened[nested].iter().cloned());
        }
        trace!("Workflow '{}' has {} steps", self.ids[index], flattened.len());

        self.flattened[index] = flattened;
        self.marks[index] = Mark::Done;
        self.stack.pop();
    }

    fn cycle_through(&self, start: usize) -> String {
        let from = self
            .stack
            .iter()
            .position(|&index| index == start)
            .unwrap_or(0);
        self.stack[from..]
            .iter()
            .chain(std::iter::once(&start))
            .map(|&index| self.ids[index].as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

pub struct WorkflowConnector;

impl Connector for WorkflowConnector {
    fn connect(&self, model: &mut ArchitectureModel, symbols: &SymbolTable) -> Vec<Issue> {
        let mut issues = Vec::new();
        let mut workflows = std::mem::take(&mut model.workflows);
        for workflow in &mut workflows {
            for step in &mut workflow.steps {
                let StepKind::Action(action) = &mut step.kind else {
                    continue;
                };
                if let Err(message) = connect_target(action, symbols) {
                    issues.push(Issue::error_at(message, step.position));
                }
                match find_performer(action, model, symbols) {
                    Ok(performer) => action.performer = Some(performer),
                    Err(message) => issues.push(Issue::error_at(message, step.position)),
                }
            }
        }

        let mut flattener = Flattener::new(&mut workflows, symbols);
        for index in 0..workflows.len() {
            flattener.flatten(index);
        }
        let Flattener {
            flattened,
            included,
            issues: flatten_issues,
            ..
        } = flattener;
        for ((workflow, steps), included) in workflows.iter_mut().zip(flattened).zip(included) {
            workflow.steps = steps;
            if included {
                workflow.top_level = false;
            }
        }
        issues.extend(flatten_issues);
        model.workflows = workflows;
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;

    fn read(text: &str) -> (ArchitectureModel, Vec<Issue>) {
        let root = parse_document(text).unwrap().unwrap();
        let mut model = ArchitectureModel::default();
        let issues = WorkflowReader.read(root.get("workflows"), &ReadContext::default(), &mut model);
        (model, issues)
    }

    fn messages(issues: &[Issue]) -> Vec<&str> {
        issues.iter().map(|issue| issue.message.as_str()).collect()
    }

    #[test]
    fn test_read_steps() {
        let (model, issues) = read(
            "workflows:\n  buy:\n    steps:\n      - performer: shopper\n        form: checkout\n        description: Pays\n      - workflow: ship\n",
        );
        assert!(issues.is_empty());
        let workflow = &model.workflows[0];
        assert!(workflow.top_level);
        assert_eq!(workflow.steps.len(), 2);
        assert_eq!(workflow.steps[0].description, "Pays");
        match &workflow.steps[0].kind {
            StepKind::Action(action) => {
                assert_eq!(action.performer_id, "shopper");
                assert_eq!(action.activity, Activity::Form("checkout".into()));
            }
            other => panic!("expected an action, got {other:?}"),
        }
        assert_eq!(workflow.steps[1].kind, StepKind::Workflow("ship".into()));
    }

    #[test]
    fn test_step_errors() {
        let (model, issues) = read(
            "workflows:\n  buy:\n    steps:\n      - form: checkout\n      - performer: shopper\n      - performer: shopper\n        form: a\n        view: b\n      - workflow: ship\n        performer: shopper\n",
        );
        assert_eq!(
            messages(&issues),
            vec![
                "A step needs a performer",
                "Need one of command, event, externalSystem, form, service, or view",
                "Need exactly one of command, event, externalSystem, form, service, or view",
                "A step may either include a workflow or perform an action, not both",
            ]
        );
        assert!(model.workflows[0].steps.is_empty());
    }

    #[test]
    fn test_cycle_is_reported_once() {
        let (mut model, issues) = read(
            "workflows:\n  a:\n    steps:\n      - workflow: b\n  b:\n    steps:\n      - workflow: a\n",
        );
        assert!(issues.is_empty());
        let symbols = SymbolTable::build(&model);
        let issues = WorkflowConnector.connect(&mut model, &symbols);
        assert_eq!(messages(&issues), vec!["Circular workflow: a -> b -> a"]);
        assert_eq!(issues[0].position, Position::new(7, 9));
    }
}
