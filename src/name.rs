use crate::document::{Node, Position};
use crate::fields::Fields;
use crate::issue::Issue;

/// An entity keyed by id in its section, with a display name.
pub trait Nameable {
    fn identify(&mut self, id: &str, position: Position);
    fn set_name(&mut self, name: String);
    fn name(&self) -> &str;
}

/// Records the id and position of an entity and gives it a display name.
///
/// An explicit `name` field wins; otherwise the name is derived from the id.
/// Returns the entity's fields, or `None` when the node isn't a map.
pub fn named_object<'a>(
    id: &str,
    node: &'a Node,
    target: &mut impl Nameable,
    issues: &mut Vec<Issue>,
) -> Option<Fields<'a>> {
    target.identify(id, node.position);
    let fields = match Fields::of(node) {
        Ok(fields) => fields,
        Err(issue) => {
            issues.push(issue);
            target.set_name(friendly_name(id));
            return None;
        }
    };
    match fields.string("name") {
        Ok(Some(name)) => target.set_name(name),
        Ok(None) => target.set_name(friendly_name(id)),
        Err(issue) => {
            issues.push(issue);
            target.set_name(friendly_name(id));
        }
    }
    Some(fields)
}

/// Turns an id like `order-service` or `my-shop.yaml` into `Order service`
/// or `My shop`.
pub fn friendly_name(id: &str) -> String {
    let stem = match id.rfind(|c: char| c == '.' || c == '/') {
        Some(index) if id[index..].starts_with('.') => &id[..index],
        _ => id,
    };
    let spaced = stem.replace('-', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
