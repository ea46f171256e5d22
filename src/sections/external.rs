use crate::document::{Node, Position};
use crate::issue::Issue;
use crate::linter::{Connector, ReadContext, SectionReader};
use crate::model::ArchitectureModel;
use crate::schema::read_description;
use crate::sections::call::{connect_call, read_call, Call};
use crate::sections::{describable, nameable, read_entities, read_list};
use crate::symbols::SymbolTable;
use serde::Serialize;

/// A system outside the architecture that users or services interact with.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSystem {
    #[serde(skip)]
    pub position: Position,
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub system_type: Option<String>,
    pub calls: Vec<Call>,
}

nameable!(ExternalSystem);
describable!(ExternalSystem);

pub struct ExternalSystemReader;

impl SectionReader for ExternalSystemReader {
    fn read(
        &self,
        node: Option<&Node>,
        _context: &ReadContext,
        model: &mut ArchitectureModel,
    ) -> Vec<Issue> {
        let mut issues = Vec::new();
        model.external_systems =
            read_entities(node, &mut issues, |system: &mut ExternalSystem, fields, issues| {
                read_description(fields, system, issues);
                match fields.string("type") {
                    Ok(system_type) => system.system_type = system_type,
                    Err(issue) => issues.push(issue),
                }
                system.calls = read_list(fields, "calls", issues, read_call);
            });
        issues
    }
}

pub struct ExternalSystemConnector;

impl Connector for ExternalSystemConnector {
    fn connect(&self, model: &mut ArchitectureModel, symbols: &SymbolTable) -> Vec<Issue> {
        let mut issues = Vec::new();
        for system in &mut model.external_systems {
            for call in &mut system.calls {
                issues.extend(connect_call(call, &model.technology_bundles, symbols));
            }
        }
        issues
    }
}
