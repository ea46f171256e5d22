use crate::document::{Key, Node, NodeKind};
use crate::issue::Issue;
use crate::schema::{quoted_list, EnumField};

/// Typed access to the fields of a map node.
///
/// Accessors return the typed value or the `Issue` describing the mismatch,
/// so readers can record it and carry on with the next field. A field whose
/// value is null counts as absent.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    owner: &'a Node,
    entries: &'a [(Key, Node)],
}

impl<'a> Fields<'a> {
    /// Views `node` as a map. A null node is an empty map.
    ///
    /// # Errors
    ///
    /// Returns `Expected a map` for sequences and scalars.
    pub fn of(node: &'a Node) -> Result<Self, Issue> {
        match &node.kind {
            NodeKind::Mapping(entries) => Ok(Fields {
                owner: node,
                entries,
            }),
            NodeKind::Null => Ok(Fields {
                owner: node,
                entries: &[],
            }),
            _ => Err(Issue::error("Expected a map", node)),
        }
    }

    pub fn owner(&self) -> &'a Node {
        self.owner
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a Key> {
        self.entries.iter().map(|(key, _)| key)
    }

    /// The entries of an id-keyed section, in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Node)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.name.as_str(), value))
    }

    /// The raw node of `field`, if present and not null.
    pub fn get(&self, field: &str) -> Option<&'a Node> {
        self.entries
            .iter()
            .find(|(key, _)| key.name == field)
            .map(|(_, value)| value)
            .filter(|value| !value.is_null())
    }

    pub fn string(&self, field: &str) -> Result<Option<String>, Issue> {
        self.get(field)
            .map(|node| to_string(node, field))
            .transpose()
    }

    pub fn sequence(&self, field: &str) -> Result<Option<&'a [Node]>, Issue> {
        self.get(field)
            .map(|node| to_sequence(node, field))
            .transpose()
    }

    /// Reads the closed enum `E` from its field.
    ///
    /// An absent field takes `E::DEFAULT`, or is an error when `E` has no
    /// default. A value outside `E::VALUES` is an error listing the allowed
    /// values.
    pub fn enumeration<E: EnumField>(&self) -> Result<E, Issue> {
        let Some(value) = self.string(E::FIELD)? else {
            return E::DEFAULT.ok_or_else(|| {
                Issue::error(format!("Missing required field {}", E::FIELD), self.owner)
            });
        };
        E::parse(&value).ok_or_else(|| {
            Issue::error(
                format!(
                    "Invalid {}: must be one of {}",
                    E::FIELD,
                    quoted_list(E::VALUES.iter().map(|(name, _)| *name))
                ),
                self.get(E::FIELD).unwrap_or(self.owner),
            )
        })
    }
}

pub fn to_string(node: &Node, field: &str) -> Result<String, Issue> {
    match &node.kind {
        NodeKind::Scalar(value) => Ok(value.clone()),
        _ => Err(Issue::wrong_kind(field, node, "string")),
    }
}

/// Views `node` as a sequence. A null node is an empty sequence.
pub fn to_sequence<'a>(node: &'a Node, field: &str) -> Result<&'a [Node], Issue> {
    match &node.kind {
        NodeKind::Sequence(items) => Ok(items),
        NodeKind::Null => Ok(&[]),
        _ => Err(Issue::wrong_kind(field, node, "sequence")),
    }
}

/// Reads a sequence of strings, reporting every element that isn't one.
pub fn to_strings(items: &[Node], element: &str, issues: &mut Vec<Issue>) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match to_string(item, element) {
            Ok(value) => Some(value),
            Err(issue) => {
                issues.push(issue);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{parse_document, Position};
    use crate::schema::{Quadrant, Ring};

    fn node(text: &str) -> Node {
        parse_document(text).unwrap().unwrap()
    }

    #[test]
    fn test_of_rejects_non_maps() {
        let sequence = node("- a\n- b\n");
        let issue = Fields::of(&sequence).unwrap_err();
        assert_eq!(issue.message, "Expected a map");
    }

    #[test]
    fn test_null_is_an_empty_map() {
        let null = Node::null(Position::new(1, 1));
        let fields = Fields::of(&null).unwrap();
        assert_eq!(fields.iter().count(), 0);
    }

    #[test]
    fn test_string_field() {
        let root = node("name: Shop\nother:\n  - x\n");
        let fields = Fields::of(&root).unwrap();
        assert_eq!(fields.string("name").unwrap(), Some("Shop".to_string()));
        assert_eq!(fields.string("missing").unwrap(), None);
        assert_eq!(
            fields.string("other").unwrap_err().message,
            "other must be a string, not a sequence"
        );
    }

    #[test]
    fn test_null_field_is_absent() {
        let root = node("description:\n");
        let fields = Fields::of(&root).unwrap();
        assert!(fields.get("description").is_none());
        assert_eq!(fields.string("description").unwrap(), None);
    }

    #[test]
    fn test_sequence_field() {
        let root = node("uses: bar\nlist:\n  - a\n");
        let fields = Fields::of(&root).unwrap();
        assert_eq!(fields.sequence("list").unwrap().unwrap().len(), 1);
        assert_eq!(
            fields.sequence("uses").unwrap_err().message,
            "uses must be a sequence, not a string"
        );
    }

    #[test]
    fn test_enumeration_default() {
        let root = node("name: x\n");
        let fields = Fields::of(&root).unwrap();
        assert_eq!(fields.enumeration::<Ring>().unwrap(), Ring::Adopt);
    }

    #[test]
    fn test_enumeration_required() {
        let root = node("name: x\n");
        let fields = Fields::of(&root).unwrap();
        let issue = fields.enumeration::<Quadrant>().unwrap_err();
        assert_eq!(issue.message, "Missing required field quadrant");
        assert_eq!(issue.position, root.position);
    }

    #[test]
    fn test_enumeration_invalid() {
        let root = node("ring: bogus\n");
        let fields = Fields::of(&root).unwrap();
        let issue = fields.enumeration::<Ring>().unwrap_err();
        assert_eq!(
            issue.message,
            "Invalid ring: must be one of 'trial', 'assess', 'adopt', or 'hold'"
        );
        assert_eq!(issue.position, Position::new(1, 7));
    }

    #[test]
    fn test_to_strings_reports_each_bad_element() {
        let root = node("- java\n- a: b\n- spring\n- [x]\n");
        let mut issues = Vec::new();
        let values = to_strings(root.as_sequence().unwrap(), "technology", &mut issues);
        assert_eq!(values, vec!["java", "spring"]);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].message, "technology must be a string, not a map");
    }
}
