use crate::document::{Node, Position};
use crate::fields::Fields;
use crate::issue::Issue;
use crate::linter::{Connector, ReadContext, SectionReader, Validator};
use crate::model::ArchitectureModel;
use crate::name::Nameable;
use crate::schema::{read_description, read_state, State};
use crate::sections::service::DataStoreTarget;
use crate::sections::technology::{
    connect_technologies, read_technologies, TechnologyBundle, TechnologySet,
};
use crate::sections::{describable, evolvable, nameable, read_components, read_entities};
use crate::symbols::SymbolTable;
use serde::Serialize;
use std::collections::HashMap;

/// A database or a queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStore {
    #[serde(skip)]
    pub position: Position,
    pub id: String,
    pub name: String,
    pub description: String,
    pub state: State,
    #[serde(skip_serializing_if = "TechnologySet::is_empty")]
    pub technologies: TechnologySet,
    #[serde(skip_serializing_if = "TechnologySet::is_empty")]
    pub api_technologies: TechnologySet,
}

nameable!(DataStore, View);
describable!(DataStore);
evolvable!(DataStore, View);

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    #[serde(flatten)]
    pub store: DataStore,
    pub views: Vec<View>,
}

impl Nameable for Database {
    fn identify(&mut self, id: &str, position: Position) {
        self.store.identify(id, position);
    }

    fn set_name(&mut self, name: String) {
        self.store.set_name(name);
    }

    fn name(&self) -> &str {
        self.store.name()
    }
}

/// A read model a database offers to personas and services.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    #[serde(skip)]
    pub position: Position,
    pub id: String,
    pub name: String,
    pub state: State,
    /// Id of the database that holds the view.
    pub database_id: String,
}

fn read_data_store(store: &mut DataStore, fields: &Fields, issues: &mut Vec<Issue>) {
    read_description(fields, store, issues);
    read_state(fields, store, issues);
    store.technologies = read_technologies(fields, "technologies", issues);
    store.api_technologies = read_technologies(fields, "apiTechnologies", issues);
}

fn connect_data_store(
    store: &mut DataStore,
    bundles: &[TechnologyBundle],
    symbols: &SymbolTable,
) -> Vec<Issue> {
    let mut issues = connect_technologies(&mut store.technologies, bundles, symbols);
    issues.extend(connect_technologies(&mut store.api_technologies, bundles, symbols));
    issues
}

pub struct DatabaseReader;

impl SectionReader for DatabaseReader {
    fn read(
        &self,
        node: Option<&Node>,
        _context: &ReadContext,
        model: &mut ArchitectureModel,
    ) -> Vec<Issue> {
        let mut issues = Vec::new();
        model.databases =
            read_entities(node, &mut issues, |database: &mut Database, fields, issues| {
                read_data_store(&mut database.store, fields, issues);
                database.views = read_components(fields, "views", "view", issues);
                for view in &mut database.views {
                    view.database_id = database.store.id.clone();
                }
            });
        issues
    }
}

pub struct QueueReader;

impl SectionReader for QueueReader {
    fn read(
        &self,
        node: Option<&Node>,
        _context: &ReadContext,
        model: &mut ArchitectureModel,
    ) -> Vec<Issue> {
        let mut issues = Vec::new();
        model.queues = read_entities(node, &mut issues, read_data_store);
        issues
    }
}

pub struct DatabaseConnector;

impl Connector for DatabaseConnector {
    fn connect(&self, model: &mut ArchitectureModel, symbols: &SymbolTable) -> Vec<Issue> {
        let mut issues = Vec::new();
        for database in &mut model.databases {
            issues.extend(connect_data_store(
                &mut database.store,
                &model.technology_bundles,
                symbols,
            ));
        }
        issues
    }
}

pub struct QueueConnector;

impl Connector for QueueConnector {
    fn connect(&self, model: &mut ArchitectureModel, symbols: &SymbolTable) -> Vec<Issue> {
        let mut issues = Vec::new();
        for queue in &mut model.queues {
            issues.extend(connect_data_store(queue, &model.technology_bundles, symbols));
        }
        issues
    }
}

/// View ids must be unique across databases.
pub struct ViewValidator;

impl Validator for ViewValidator {
    fn validate(&self, model: &ArchitectureModel) -> Vec<Issue> {
        let mut issues = Vec::new();
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for database in &model.databases {
            for view in &database.views {
                match owners.get(view.id.as_str()) {
                    Some(owner) => issues.push(Issue::error_at(
                        format!("View '{}' is already defined in database '{owner}'", view.id),
                        view.position,
                    )),
                    None => {
                        owners.insert(&view.id, &database.store.id);
                    }
                }
            }
        }
        issues
    }
}

/// Warns about databases and queues that no service uses.
pub struct DataStoreValidator;

impl Validator for DataStoreValidator {
    fn validate(&self, model: &ArchitectureModel) -> Vec<Issue> {
        let targets: Vec<&DataStoreTarget> = model
            .services
            .iter()
            .flat_map(|service| service.data_stores.iter().map(|use_| &use_.target))
            .collect();
        let is_used = |target: DataStoreTarget| targets.iter().any(|&used| *used == target);

        let mut issues = Vec::new();
        for database in &model.databases {
            if !is_used(DataStoreTarget::Database(database.store.id.clone())) {
                issues.push(Issue::warning("Database isn't used", database.store.position));
            }
        }
        for queue in &model.queues {
            if !is_used(DataStoreTarget::Queue(queue.id.clone())) {
                issues.push(Issue::warning("Queue isn't used", queue.position));
            }
        }
        issues
    }
}
