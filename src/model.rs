use crate::document::Position;
use crate::sections::datastore::{DataStore, Database, View};
use crate::sections::external::ExternalSystem;
use crate::sections::persona::Persona;
use crate::sections::service::{Form, Service};
use crate::sections::system::System;
use crate::sections::technology::{Technology, TechnologyBundle};
use crate::sections::workflow::Workflow;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::Index;

/// A handle to an entity in one of the model's sorted lists.
///
/// Lists are sorted before any handle is created and never reordered after,
/// so a handle stays valid for the life of the model.
pub struct Ref<T> {
    index: usize,
    kind: PhantomData<fn() -> T>,
}

impl<T> Ref<T> {
    pub(crate) fn new(index: usize) -> Self {
        Ref {
            index,
            kind: PhantomData,
        }
    }

    pub fn index(self) -> usize {
        self.index
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Ref<T> {}

impl<T> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Ref<T> {}

impl<T> PartialOrd for Ref<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Ref<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> Hash for Ref<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ref({})", self.index)
    }
}

/// A form, found through the service that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormRef {
    pub service: Ref<Service>,
    pub form: usize,
}

/// A view, found through the database that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewRef {
    pub database: Ref<Database>,
    pub view: usize,
}

/// Everything read from one architecture document.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchitectureModel {
    #[serde(skip)]
    pub position: Position,
    pub version: String,
    pub system: System,
    pub personas: Vec<Persona>,
    pub external_systems: Vec<ExternalSystem>,
    pub services: Vec<Service>,
    pub databases: Vec<Database>,
    pub queues: Vec<DataStore>,
    pub technologies: Vec<Technology>,
    pub technology_bundles: Vec<TechnologyBundle>,
    pub workflows: Vec<Workflow>,
}

impl ArchitectureModel {
    pub fn find_persona(&self, id: &str) -> Option<&Persona> {
        self.personas.iter().find(|persona| persona.id == id)
    }

    pub fn find_external_system(&self, id: &str) -> Option<&ExternalSystem> {
        self.external_systems.iter().find(|system| system.id == id)
    }

    pub fn find_service(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|service| service.id == id)
    }

    pub fn find_database(&self, id: &str) -> Option<&Database> {
        self.databases.iter().find(|database| database.store.id == id)
    }

    pub fn find_queue(&self, id: &str) -> Option<&DataStore> {
        self.queues.iter().find(|queue| queue.id == id)
    }

    pub fn find_technology(&self, id: &str) -> Option<&Technology> {
        self.technologies.iter().find(|technology| technology.id == id)
    }

    pub fn find_technology_bundle(&self, id: &str) -> Option<&TechnologyBundle> {
        self.technology_bundles.iter().find(|bundle| bundle.id == id)
    }

    pub fn find_workflow(&self, id: &str) -> Option<&Workflow> {
        self.workflows.iter().find(|workflow| workflow.id == id)
    }

    /// The workflows that aren't included as a step of another workflow.
    pub fn top_level_workflows(&self) -> impl Iterator<Item = &Workflow> {
        self.workflows.iter().filter(|workflow| workflow.top_level)
    }
}

macro_rules! index_by_ref {
    ($entity:ty, $list:ident) => {
        impl Index<Ref<$entity>> for ArchitectureModel {
            type Output = $entity;

            fn index(&self, handle: Ref<$entity>) -> &$entity {
                &self.$list[handle.index]
            }
        }
    };
}

index_by_ref!(Persona, personas);
index_by_ref!(ExternalSystem, external_systems);
index_by_ref!(Service, services);
index_by_ref!(Database, databases);
index_by_ref!(DataStore, queues);
index_by_ref!(Technology, technologies);
index_by_ref!(TechnologyBundle, technology_bundles);
index_by_ref!(Workflow, workflows);

impl Index<FormRef> for ArchitectureModel {
    type Output = Form;

    fn index(&self, handle: FormRef) -> &Form {
        &self[handle.service].forms[handle.form]
    }
}

impl Index<ViewRef> for ArchitectureModel {
    type Output = View;

    fn index(&self, handle: ViewRef) -> &View {
        &self[handle.database].views[handle.view]
    }
}
