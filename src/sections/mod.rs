use crate::document::{Node, NodeKind};
use crate::fields::{to_string, Fields};
use crate::issue::Issue;
use crate::name::{named_object, Nameable};
use crate::schema::{read_state, Evolvable};

pub mod call;
pub mod datastore;
pub mod external;
pub mod persona;
pub mod service;
pub mod system;
pub mod technology;
pub mod version;
pub mod workflow;

/// Implements `Nameable` for a struct with `id`, `name` and `position` fields.
macro_rules! nameable {
    ($($entity:ty),+ $(,)?) => {$(
        impl crate::name::Nameable for $entity {
            fn identify(&mut self, id: &str, position: crate::document::Position) {
                self.id = id.to_string();
                self.position = position;
            }

            fn set_name(&mut self, name: String) {
                self.name = name;
            }

            fn name(&self) -> &str {
                &self.name
            }
        }
    )+};
}

macro_rules! describable {
    ($($entity:ty),+ $(,)?) => {$(
        impl crate::schema::Describable for $entity {
            fn set_description(&mut self, description: String) {
                self.description = description;
            }
        }
    )+};
}

macro_rules! evolvable {
    ($($entity:ty),+ $(,)?) => {$(
        impl crate::schema::Evolvable for $entity {
            fn set_state(&mut self, state: crate::schema::State) {
                self.state = state;
            }
        }
    )+};
}

pub(crate) use {describable, evolvable, nameable};

/// Reads an id-keyed section into entities sorted by display name.
///
/// `read` fills in everything beyond id, name and position. An entity whose
/// node isn't a map is still listed, with only those three set.
pub(crate) fn read_entities<T, F>(node: Option<&Node>, issues: &mut Vec<Issue>, read: F) -> Vec<T>
where
    T: Default + Nameable,
    F: Fn(&mut T, &Fields, &mut Vec<Issue>),
{
    let Some(node) = node else {
        return Vec::new();
    };
    let section = match Fields::of(node) {
        Ok(section) => section,
        Err(issue) => {
            issues.push(issue);
            return Vec::new();
        }
    };
    let mut entities = Vec::new();
    for (id, entity_node) in section.iter() {
        let mut entity = T::default();
        if let Some(fields) = named_object(id, entity_node, &mut entity, issues) {
            read(&mut entity, &fields, issues);
        }
        entities.push(entity);
    }
    entities.sort_by(|a, b| a.name().cmp(b.name()));
    entities
}

/// Reads the forms of a service or the views of a database.
///
/// Two shapes are accepted: a map of `id: {name, state}` entries, or a plain
/// sequence of ids.
pub(crate) fn read_components<T>(
    fields: &Fields,
    field: &str,
    element: &str,
    issues: &mut Vec<Issue>,
) -> Vec<T>
where
    T: Default + Nameable + Evolvable,
{
    let Some(node) = fields.get(field) else {
        return Vec::new();
    };
    match &node.kind {
        NodeKind::Mapping(entries) => entries
            .iter()
            .map(|(key, component_node)| {
                let mut component = T::default();
                if let Some(component_fields) =
                    named_object(&key.name, component_node, &mut component, issues)
                {
                    read_state(&component_fields, &mut component, issues);
                }
                component
            })
            .collect(),
        NodeKind::Sequence(items) => items
            .iter()
            .filter_map(|item| match to_string(item, element) {
                Ok(id) => {
                    let mut component = T::default();
                    component.identify(&id, item.position);
                    component.set_name(id);
                    Some(component)
                }
                Err(issue) => {
                    issues.push(issue);
                    None
                }
            })
            .collect(),
        _ => {
            issues.push(Issue::wrong_kind(field, node, "sequence"));
            Vec::new()
        }
    }
}

/// Reads an optional sequence field and hands each element to `read`.
/// Elements for which `read` returns `None` are dropped.
pub(crate) fn read_list<T>(
    fields: &Fields,
    field: &str,
    issues: &mut Vec<Issue>,
    read: impl Fn(&Node, &mut Vec<Issue>) -> Option<T>,
) -> Vec<T> {
    match fields.sequence(field) {
        Ok(Some(items)) => items.iter().filter_map(|item| read(item, issues)).collect(),
        Ok(None) => Vec::new(),
        Err(issue) => {
            issues.push(issue);
            Vec::new()
        }
    }
}
