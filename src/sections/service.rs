use crate::document::{Node, Position};
use crate::fields::Fields;
use crate::issue::Issue;
use crate::linter::{Connector, ReadContext, SectionReader, Validator};
use crate::model::{ArchitectureModel, Ref, ViewRef};
use crate::schema::{
    exclusive_choice, read_description, read_link_details, read_state, Choice, DataFlow, State,
};
use crate::sections::call::{connect_call, read_call, Call};
use crate::sections::datastore::{DataStore, Database};
use crate::sections::technology::{connect_technologies, read_technologies, TechnologySet};
use crate::sections::{
    describable, evolvable, nameable, read_components, read_entities, read_list,
};
use crate::symbols::SymbolTable;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(skip)]
    pub position: Position,
    pub id: String,
    pub name: String,
    pub description: String,
    pub state: State,
    #[serde(skip_serializing_if = "TechnologySet::is_empty")]
    pub technologies: TechnologySet,
    pub data_stores: Vec<DataStoreUse>,
    pub forms: Vec<Form>,
    pub calls: Vec<Call>,
}

nameable!(Service, Form);
describable!(Service);
evolvable!(Service, Form);

/// A user interface a service offers to personas.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    #[serde(skip)]
    pub position: Position,
    pub id: String,
    pub name: String,
    pub state: State,
    /// Id of the service that implements the form.
    pub service_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DataStoreTarget {
    Database(String),
    Queue(String),
}

const DATA_STORE_TARGETS: &[(&str, fn(String) -> DataStoreTarget)] = &[
    ("database", DataStoreTarget::Database),
    ("queue", DataStoreTarget::Queue),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStoreRef {
    Database(Ref<Database>),
    Queue(Ref<DataStore>),
}

/// A service's use of a database or a queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStoreUse {
    #[serde(skip)]
    pub position: Position,
    #[serde(flatten)]
    pub target: DataStoreTarget,
    pub description: String,
    pub data_flow: DataFlow,
    #[serde(skip)]
    pub store: Option<DataStoreRef>,
}

fn read_data_store_use(node: &Node, issues: &mut Vec<Issue>) -> Option<DataStoreUse> {
    let fields = match Fields::of(node) {
        Ok(fields) => fields,
        Err(issue) => {
            issues.push(issue);
            return None;
        }
    };
    let target = match exclusive_choice(&fields, DATA_STORE_TARGETS, issues) {
        Choice::One(target) => Some(target),
        Choice::Missing => {
            issues.push(Issue::error("A dataStore must have either a database or a queue", node));
            None
        }
        Choice::Conflict => {
            issues.push(Issue::error(
                "A dataStore can have either a database or a queue, but not both",
                node,
            ));
            None
        }
        Choice::Malformed => None,
    };
    let details = read_link_details(&fields, issues);
    Some(DataStoreUse {
        position: node.position,
        target: target?,
        description: details.description,
        data_flow: details.data_flow,
        store: None,
    })
}

impl Service {
    /// Finds a view on one of the databases this service writes to or reads
    /// from in both directions. Databases it only receives from don't count.
    pub fn find_database_view(&self, model: &ArchitectureModel, view: &str) -> Option<ViewRef> {
        self.data_stores
            .iter()
            .filter(|data_store| data_store.data_flow != DataFlow::Receive)
            .find_map(|data_store| match data_store.store {
                Some(DataStoreRef::Database(database)) => model[database]
                    .views
                    .iter()
                    .position(|candidate| candidate.id == view)
                    .map(|view| ViewRef { database, view }),
                _ => None,
            })
    }
}

pub struct ServiceReader;

impl SectionReader for ServiceReader {
    fn read(
        &self,
        node: Option<&Node>,
        _context: &ReadContext,
        model: &mut ArchitectureModel,
    ) -> Vec<Issue> {
        let mut issues = Vec::new();
        model.services = read_entities(node, &mut issues, |service: &mut Service, fields, issues| {
            read_description(fields, service, issues);
            read_state(fields, service, issues);
            service.technologies = read_technologies(fields, "technologies", issues);
            service.data_stores = read_list(fields, "dataStores", issues, read_data_store_use);
            service.forms = read_components(fields, "forms", "form", issues);
            for form in &mut service.forms {
                form.service_id = service.id.clone();
            }
            service.calls = read_list(fields, "calls", issues, read_call);
        });
        issues
    }
}

pub struct ServiceConnector;

impl Connector for ServiceConnector {
    fn connect(&self, model: &mut ArchitectureModel, symbols: &SymbolTable) -> Vec<Issue> {
        let mut issues = Vec::new();
        for service in &mut model.services {
            issues.extend(connect_technologies(
                &mut service.technologies,
                &model.technology_bundles,
                symbols,
            ));
            for call in &mut service.calls {
                issues.extend(connect_call(call, &model.technology_bundles, symbols));
            }
            for data_store in &mut service.data_stores {
                let store = match &data_store.target {
                    DataStoreTarget::Database(id) => symbols
                        .database(id)
                        .map(DataStoreRef::Database)
                        .ok_or_else(|| format!("Unknown database '{id}'")),
                    DataStoreTarget::Queue(id) => symbols
                        .queue(id)
                        .map(DataStoreRef::Queue)
                        .ok_or_else(|| format!("Unknown queue '{id}'")),
                };
                match store {
                    Ok(store) => data_store.store = Some(store),
                    Err(message) => issues.push(Issue::error_at(message, data_store.position)),
                }
            }
        }
        issues
    }
}

/// Form ids must be unique across services.
pub struct FormValidator;

impl Validator for FormValidator {
    fn validate(&self, model: &ArchitectureModel) -> Vec<Issue> {
        let mut issues = Vec::new();
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for service in &model.services {
            for form in &service.forms {
                match owners.get(form.id.as_str()) {
                    Some(owner) => issues.push(Issue::error_at(
                        format!("Form '{}' is already defined in service '{owner}'", form.id),
                        form.position,
                    )),
                    None => {
                        owners.insert(&form.id, &service.id);
                    }
                }
            }
        }
        issues
    }
}
