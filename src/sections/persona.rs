use crate::document::{Node, Position};
use crate::fields::Fields;
use crate::issue::Issue;
use crate::linter::{Connector, ReadContext, SectionReader, Validator};
use crate::model::{ArchitectureModel, FormRef, Ref, ViewRef};
use crate::schema::{exclusive_choice, read_description, read_link_details, Choice, DataFlow};
use crate::sections::external::ExternalSystem;
use crate::sections::{describable, nameable, read_entities, read_list};
use crate::symbols::SymbolTable;
use serde::Serialize;

const MUST_USE: &str = "A persona must use either a form, a view, or an external system";

/// A kind of user of the system.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    #[serde(skip)]
    pub position: Position,
    pub id: String,
    pub name: String,
    pub description: String,
    pub uses: Vec<Use>,
}

nameable!(Persona);
describable!(Persona);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UseTarget {
    ExternalSystem(String),
    Form(String),
    View(String),
}

const USE_TARGETS: &[(&str, fn(String) -> UseTarget)] = &[
    ("externalSystem", UseTarget::ExternalSystem),
    ("form", UseTarget::Form),
    ("view", UseTarget::View),
];

/// What a use resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Used {
    ExternalSystem(Ref<ExternalSystem>),
    Form(FormRef),
    View(ViewRef),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Use {
    #[serde(skip)]
    pub position: Position,
    #[serde(flatten)]
    pub target: UseTarget,
    pub description: String,
    pub data_flow: DataFlow,
    #[serde(skip)]
    pub used: Option<Used>,
}

fn read_use(node: &Node, issues: &mut Vec<Issue>) -> Option<Use> {
    let fields = match Fields::of(node) {
        Ok(fields) => fields,
        Err(issue) => {
            issues.push(issue);
            return None;
        }
    };
    let target = match exclusive_choice(&fields, USE_TARGETS, issues) {
        Choice::One(target) => Some(target),
        Choice::Missing => {
            issues.push(Issue::error(MUST_USE, node));
            None
        }
        Choice::Conflict => {
            issues.push(Issue::error(
                "A persona may use either a form, a view, or an external system. Split the use into several to let the persona use more than one.",
                node,
            ));
            None
        }
        Choice::Malformed => None,
    };
    let details = read_link_details(&fields, issues);
    Some(Use {
        position: node.position,
        target: target?,
        description: details.description,
        data_flow: details.data_flow,
        used: None,
    })
}

pub struct PersonaReader;

impl SectionReader for PersonaReader {
    fn read(
        &self,
        node: Option<&Node>,
        _context: &ReadContext,
        model: &mut ArchitectureModel,
    ) -> Vec<Issue> {
        let mut issues = Vec::new();
        model.personas = read_entities(node, &mut issues, |persona: &mut Persona, fields, issues| {
            read_description(fields, persona, issues);
            if fields.get("uses").is_none() {
                issues.push(Issue::error(MUST_USE, fields.owner()));
            }
            persona.uses = read_list(fields, "uses", issues, read_use);
        });
        issues
    }
}

pub struct PersonaConnector;

impl Connector for PersonaConnector {
    fn connect(&self, model: &mut ArchitectureModel, symbols: &SymbolTable) -> Vec<Issue> {
        let mut issues = Vec::new();
        for persona in &mut model.personas {
            for use_ in &mut persona.uses {
                let used = match &use_.target {
                    UseTarget::ExternalSystem(id) => symbols
                        .external_system(id)
                        .map(Used::ExternalSystem)
                        .ok_or_else(|| format!("Unknown external system '{id}'")),
                    UseTarget::Form(id) => symbols
                        .form(id)
                        .map(Used::Form)
                        .ok_or_else(|| format!("Unknown form '{id}'")),
                    UseTarget::View(id) => symbols
                        .view(id)
                        .map(Used::View)
                        .ok_or_else(|| format!("Unknown view '{id}'")),
                };
                match used {
                    Ok(used) => use_.used = Some(used),
                    Err(message) => issues.push(Issue::error_at(message, use_.position)),
                }
            }
        }
        issues
    }
}

pub struct PersonaValidator;

impl Validator for PersonaValidator {
    fn validate(&self, model: &ArchitectureModel) -> Vec<Issue> {
        if model.personas.is_empty() {
            vec![Issue::warning("At least one persona is required", model.position)]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;

    fn read(text: &str) -> (ArchitectureModel, Vec<Issue>) {
        let root = parse_document(text).unwrap().unwrap();
        let mut model = ArchitectureModel::default();
        let issues = PersonaReader.read(root.get("personas"), &ReadContext::default(), &mut model);
        (model, issues)
    }

    #[test]
    fn test_persona_with_uses() {
        let (model, issues) = read(
            "personas:\n  shopper:\n    description: Buys things\n    uses:\n      - form: checkout\n        dataFlow: send\n      - view: catalog\n",
        );
        assert!(issues.is_empty());
        let persona = &model.personas[0];
        assert_eq!(persona.name, "Shopper");
        assert_eq!(persona.description, "Buys things");
        assert_eq!(persona.uses[0].target, UseTarget::Form("checkout".into()));
        assert_eq!(persona.uses[0].data_flow, DataFlow::Send);
        assert_eq!(persona.uses[1].target, UseTarget::View("catalog".into()));
    }

    #[test]
    fn test_persona_without_uses() {
        let (model, issues) = read("personas:\n  idle:\n    description: Does nothing\n");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, MUST_USE);
        assert_eq!(issues[0].position, Position::new(3, 5));
        assert_eq!(model.personas.len(), 1);
    }

    #[test]
    fn test_use_with_two_targets() {
        let (model, issues) =
            read("personas:\n  shopper:\n    uses:\n      - form: checkout\n        view: catalog\n");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.starts_with("A persona may use either"));
        assert!(model.personas[0].uses.is_empty());
    }

    #[test]
    fn test_use_without_target() {
        let (_, issues) = read("personas:\n  shopper:\n    uses:\n      - description: what?\n");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, MUST_USE);
        assert_eq!(issues[0].position, Position::new(4, 9));
    }
}
