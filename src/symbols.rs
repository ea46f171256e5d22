use crate::model::{ArchitectureModel, FormRef, Ref, ViewRef};
use crate::sections::datastore::{DataStore, Database};
use crate::sections::external::ExternalSystem;
use crate::sections::persona::Persona;
use crate::sections::service::Service;
use crate::sections::technology::{Technology, TechnologyBundle};
use crate::sections::workflow::Workflow;
use std::collections::HashMap;

/// Id to handle lookups over a model whose lists are already sorted.
///
/// Built once between reading and linking. When an id occurs twice in the
/// same kind of entity, the first one in list order wins.
#[derive(Debug, Default)]
pub struct SymbolTable {
    personas: HashMap<String, Ref<Persona>>,
    external_systems: HashMap<String, Ref<ExternalSystem>>,
    services: HashMap<String, Ref<Service>>,
    databases: HashMap<String, Ref<Database>>,
    queues: HashMap<String, Ref<DataStore>>,
    technologies: HashMap<String, Ref<Technology>>,
    technology_bundles: HashMap<String, Ref<TechnologyBundle>>,
    workflows: HashMap<String, Ref<Workflow>>,
    forms: HashMap<String, FormRef>,
    views: HashMap<String, ViewRef>,
}

fn register<'a, T>(table: &mut HashMap<String, Ref<T>>, ids: impl Iterator<Item = &'a str>) {
    for (index, id) in ids.enumerate() {
        table.entry(id.to_string()).or_insert(Ref::new(index));
    }
}

impl SymbolTable {
    pub fn build(model: &ArchitectureModel) -> Self {
        let mut table = SymbolTable::default();
        register(&mut table.personas, model.personas.iter().map(|p| p.id.as_str()));
        register(
            &mut table.external_systems,
            model.external_systems.iter().map(|s| s.id.as_str()),
        );
        register(&mut table.services, model.services.iter().map(|s| s.id.as_str()));
        register(
            &mut table.databases,
            model.databases.iter().map(|d| d.store.id.as_str()),
        );
        register(&mut table.queues, model.queues.iter().map(|q| q.id.as_str()));
        register(
            &mut table.technologies,
            model.technologies.iter().map(|t| t.id.as_str()),
        );
        register(
            &mut table.technology_bundles,
            model.technology_bundles.iter().map(|b| b.id.as_str()),
        );
        register(&mut table.workflows, model.workflows.iter().map(|w| w.id.as_str()));

        for (service, owner) in model.services.iter().enumerate() {
            for (form, candidate) in owner.forms.iter().enumerate() {
                table.forms.entry(candidate.id.clone()).or_insert(FormRef {
                    service: Ref::new(service),
                    form,
                });
            }
        }
        for (database, owner) in model.databases.iter().enumerate() {
            for (view, candidate) in owner.views.iter().enumerate() {
                table.views.entry(candidate.id.clone()).or_insert(ViewRef {
                    database: Ref::new(database),
                    view,
                });
            }
        }
        table
    }

    pub fn persona(&self, id: &str) -> Option<Ref<Persona>> {
        self.personas.get(id).copied()
    }

    pub fn external_system(&self, id: &str) -> Option<Ref<ExternalSystem>> {
        self.external_systems.get(id).copied()
    }

    pub fn service(&self, id: &str) -> Option<Ref<Service>> {
        self.services.get(id).copied()
    }

    pub fn database(&self, id: &str) -> Option<Ref<Database>> {
        self.databases.get(id).copied()
    }

    pub fn queue(&self, id: &str) -> Option<Ref<DataStore>> {
        self.queues.get(id).copied()
    }

    pub fn technology(&self, id: &str) -> Option<Ref<Technology>> {
        self.technologies.get(id).copied()
    }

    pub fn technology_bundle(&self, id: &str) -> Option<Ref<TechnologyBundle>> {
        self.technology_bundles.get(id).copied()
    }

    pub fn workflow(&self, id: &str) -> Option<Ref<Workflow>> {
        self.workflows.get(id).copied()
    }

    pub fn form(&self, id: &str) -> Option<FormRef> {
        self.forms.get(id).copied()
    }

    pub fn view(&self, id: &str) -> Option<ViewRef> {
        self.views.get(id).copied()
    }
}
