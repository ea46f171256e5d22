use crate::error::DocumentError;
use serde::Serialize;
use std::collections::HashMap;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// A 1-based line and column in the source text. `Position::NONE` marks
/// things that aren't tied to any node, like an unreadable file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const NONE: Position = Position { line: 0, column: 0 };

    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }

    pub fn is_none(&self) -> bool {
        *self == Position::NONE
    }

    // The scanner counts lines from 1 and columns from 0.
    fn from_marker(marker: &Marker) -> Self {
        Position {
            line: marker.line(),
            column: marker.col() + 1,
        }
    }
}

/// Nodes that aliases may copy in one document, counting nested copies.
pub const MAX_ALIAS_NODES: usize = 100_000;

#[derive(Debug, PartialEq, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub position: Position,
}

#[derive(Debug, PartialEq, Clone)]
pub enum NodeKind {
    Null,
    Scalar(String),
    Sequence(Vec<Node>),
    Mapping(Vec<(Key, Node)>),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Key {
    pub name: String,
    pub position: Position,
}

impl NodeKind {
    /// The name used for this kind in type mismatch messages.
    pub fn describe(&self) -> &'static str {
        match self {
            NodeKind::Null => "null",
            NodeKind::Scalar(_) => "string",
            NodeKind::Sequence(_) => "sequence",
            NodeKind::Mapping(_) => "map",
        }
    }
}

impl Node {
    pub fn null(position: Position) -> Self {
        Node {
            kind: NodeKind::Null,
            position,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, NodeKind::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match &self.kind {
            NodeKind::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[(Key, Node)]> {
        match &self.kind {
            NodeKind::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// The number of nodes in this subtree, itself included.
    pub fn size(&self) -> usize {
        1 + match &self.kind {
            NodeKind::Null | NodeKind::Scalar(_) => 0,
            NodeKind::Sequence(items) => items.iter().map(Node::size).sum(),
            NodeKind::Mapping(entries) => entries.iter().map(|(_, value)| value.size()).sum(),
        }
    }

    /// Looks up the value of `key` when this node is a mapping.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping()?
            .iter()
            .find(|(candidate, _)| candidate.name == key)
            .map(|(_, value)| value)
    }
}

/// Decodes YAML text into a positioned node tree.
///
/// Returns `Ok(None)` when the text holds no document at all. Only the first
/// document of a multi-document stream is read.
///
/// # Errors
///
/// Returns a `DocumentError` when the text isn't well-formed YAML, when a
/// mapping uses a non-scalar key, when a mapping repeats a key, or when
/// aliases expand to more than `MAX_ALIAS_NODES` nodes.
pub fn parse_document(text: &str) -> Result<Option<Node>, DocumentError> {
    let mut builder = TreeBuilder::default();
    let mut parser = Parser::new_from_str(text);
    parser
        .load(&mut builder, false)
        .map_err(|err| DocumentError::Syntax {
            message: err.info().to_string(),
            line: err.marker().line(),
            column: err.marker().col() + 1,
        })?;
    match builder.error {
        Some(err) => Err(err),
        None => Ok(builder.root),
    }
}

fn is_null(value: &str) -> bool {
    matches!(value, "" | "~" | "null" | "Null" | "NULL")
}

enum Frame {
    Sequence {
        anchor: usize,
        position: Position,
        items: Vec<Node>,
    },
    Mapping {
        anchor: usize,
        position: Position,
        entries: Vec<(Key, Node)>,
        pending_key: Option<Key>,
    },
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Frame>,
    /// Anchored nodes with their sizes.
    anchors: HashMap<usize, (Node, usize)>,
    expanded: usize,
    root: Option<Node>,
    error: Option<DocumentError>,
}

impl MarkedEventReceiver for TreeBuilder {
    fn on_event(&mut self, event: Event, marker: Marker) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.handle(event, Position::from_marker(&marker)) {
            self.error = Some(err);
        }
    }
}

impl TreeBuilder {
    fn handle(&mut self, event: Event, position: Position) -> Result<(), DocumentError> {
        match event {
            Event::Scalar(value, style, anchor, ..) => {
                if self.take_key(&value, position)? {
                    if anchor > 0 {
                        let key = Node {
                            kind: NodeKind::Scalar(value),
                            position,
                        };
                        self.anchors.insert(anchor, (key, 1));
                    }
                    return Ok(());
                }
                let kind = if style == TScalarStyle::Plain && is_null(&value) {
                    NodeKind::Null
                } else {
                    NodeKind::Scalar(value)
                };
                self.complete(Node { kind, position }, anchor)
            }
            Event::SequenceStart(anchor, ..) => {
                self.reject_complex_key(position)?;
                self.stack.push(Frame::Sequence {
                    anchor,
                    position,
                    items: Vec::new(),
                });
                Ok(())
            }
            Event::MappingStart(anchor, ..) => {
                self.reject_complex_key(position)?;
                self.stack.push(Frame::Mapping {
                    anchor,
                    position,
                    entries: Vec::new(),
                    pending_key: None,
                });
                Ok(())
            }
            Event::SequenceEnd | Event::MappingEnd => match self.stack.pop() {
                Some(Frame::Sequence {
                    anchor,
                    position,
                    items,
                }) => self.complete(
                    Node {
                        kind: NodeKind::Sequence(items),
                        position,
                    },
                    anchor,
                ),
                Some(Frame::Mapping {
                    anchor,
                    position,
                    entries,
                    ..
                }) => self.complete(
                    Node {
                        kind: NodeKind::Mapping(entries),
                        position,
                    },
                    anchor,
                ),
                None => Ok(()),
            },
            Event::Alias(id) => {
                let (node, size) = self.anchors.get(&id).ok_or(DocumentError::UnknownAlias {
                    line: position.line,
                    column: position.column,
                })?;
                self.expanded += size;
                if self.expanded > MAX_ALIAS_NODES {
                    return Err(DocumentError::AliasExpansion {
                        limit: MAX_ALIAS_NODES,
                        line: position.line,
                        column: position.column,
                    });
                }
                let node = node.clone();
                if let NodeKind::Scalar(value) = &node.kind {
                    if self.take_key(value, position)? {
                        return Ok(());
                    }
                } else {
                    self.reject_complex_key(position)?;
                }
                self.complete(node, 0)
            }
            _ => Ok(()),
        }
    }

    /// Records `value` as the pending key when the enclosing mapping expects
    /// a key. Returns whether it did.
    ///
    /// The scanner places a block mapping at its first `:`, so the mapping
    /// moves back to its first key when that key comes earlier.
    fn take_key(&mut self, value: &str, position: Position) -> Result<bool, DocumentError> {
        if let Some(Frame::Mapping {
            position: mapping_position,
            entries,
            pending_key,
            ..
        }) = self.stack.last_mut()
        {
            if pending_key.is_none() {
                if entries.is_empty() && position < *mapping_position {
                    *mapping_position = position;
                }
                if entries.iter().any(|(key, _)| key.name == value) {
                    return Err(DocumentError::DuplicateKey {
                        key: value.to_string(),
                        line: position.line,
                        column: position.column,
                    });
                }
                *pending_key = Some(Key {
                    name: value.to_string(),
                    position,
                });
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn reject_complex_key(&self, position: Position) -> Result<(), DocumentError> {
        match self.stack.last() {
            Some(Frame::Mapping {
                pending_key: None, ..
            }) => Err(DocumentError::ComplexKey {
                line: position.line,
                column: position.column,
            }),
            _ => Ok(()),
        }
    }

    fn complete(&mut self, node: Node, anchor: usize) -> Result<(), DocumentError> {
        if anchor > 0 {
            let size = node.size();
            self.anchors.insert(anchor, (node.clone(), size));
        }
        match self.stack.last_mut() {
            Some(Frame::Sequence { items, .. }) => items.push(node),
            Some(Frame::Mapping {
                entries,
                pending_key,
                ..
            }) => {
                // take_key fills the key before any value reaches this point
                if let Some(key) = pending_key.take() {
                    entries.push((key, node));
                }
            }
            None => {
                if self.root.is_none() {
                    self.root = Some(node);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Node {
        parse_document(text).unwrap().unwrap()
    }

    #[test]
    fn test_empty_text_has_no_root() {
        assert_eq!(parse_document("").unwrap(), None);
        assert_eq!(parse_document("# only a comment\n").unwrap(), None);
    }

    #[test]
    fn test_mapping_keeps_document_order_and_positions() {
        let root = parse("version: 1.0\nsystem:\n  name: Shop\n");
        let entries = root.as_mapping().unwrap();
        assert_eq!(entries[0].0.name, "version");
        assert_eq!(entries[1].0.name, "system");
        assert_eq!(entries[0].0.position, Position::new(1, 1));

        let name = root.get("system").unwrap().get("name").unwrap();
        assert_eq!(name.as_str(), Some("Shop"));
        assert_eq!(name.position, Position::new(3, 9));
    }

    #[test]
    fn test_scalars_stay_text() {
        let root = parse("version: 1.0\ncount: 3\nflag: true\n");
        assert_eq!(root.get("version").unwrap().as_str(), Some("1.0"));
        assert_eq!(root.get("count").unwrap().as_str(), Some("3"));
        assert_eq!(root.get("flag").unwrap().as_str(), Some("true"));
    }

    #[test]
    fn test_plain_nulls_but_not_quoted_ones() {
        let root = parse("a:\nb: ~\nc: null\nd: ''\ne: \"null\"\n");
        assert!(root.get("a").unwrap().is_null());
        assert!(root.get("b").unwrap().is_null());
        assert!(root.get("c").unwrap().is_null());
        assert_eq!(root.get("d").unwrap().as_str(), Some(""));
        assert_eq!(root.get("e").unwrap().as_str(), Some("null"));
    }

    #[test]
    fn test_sequences() {
        let root = parse("technologies:\n  - java\n  - spring\n");
        let items = root.get("technologies").unwrap().as_sequence().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].as_str(), Some("spring"));
        assert_eq!(items[1].position.line, 3);
    }

    #[test]
    fn test_aliases_expand_anchored_nodes() {
        let root = parse("base: &base\n  state: legacy\ncopy: *base\n");
        assert_eq!(root.get("copy"), root.get("base"));
    }

    #[test]
    fn test_block_mappings_start_at_their_first_key() {
        let root = parse("technologies:\n  git:\n    ring: hold\n");
        assert_eq!(root.position, Position::new(1, 1));
        let git = root.get("technologies").unwrap().get("git").unwrap();
        assert_eq!(git.position, Position::new(3, 5));

        let root = parse("uses:\n  - form: bar\n    dataFlow: send\n");
        let uses = root.get("uses").unwrap().as_sequence().unwrap();
        assert_eq!(uses[0].position, Position::new(2, 5));
    }

    #[test]
    fn test_flow_mappings_start_at_their_brace() {
        let root = parse("git: { ring: hold }\n");
        assert_eq!(root.get("git").unwrap().position, Position::new(1, 6));
    }

    #[test]
    fn test_anchored_keys_can_be_aliased() {
        let root = parse("&k shop: one\nother: *k\n");
        assert_eq!(root.get("shop").unwrap().as_str(), Some("one"));
        assert_eq!(root.get("other").unwrap().as_str(), Some("shop"));
    }

    #[test]
    fn test_nested_aliases_stop_at_the_expansion_limit() {
        let mut text = String::from("a0: &a0 [x, x, x, x, x, x, x, x, x, x]\n");
        for level in 1..8 {
            let previous = level - 1;
            let refs = vec![format!("*a{previous}"); 10].join(", ");
            text.push_str(&format!("a{level}: &a{level} [{refs}]\n"));
        }
        let err = parse_document(&text).unwrap_err();
        assert!(matches!(err, DocumentError::AliasExpansion { limit: MAX_ALIAS_NODES, .. }));
        assert_eq!(err.position().line, 5);
    }

    #[test]
    fn test_duplicate_keys_are_rejected() {
        let err = parse_document("a: 1\na: 2\n").unwrap_err();
        assert!(matches!(err, DocumentError::DuplicateKey { ref key, line: 2, .. } if key == "a"));
    }

    #[test]
    fn test_complex_keys_are_rejected() {
        let err = parse_document("? [a, b]\n: c\n").unwrap_err();
        assert!(matches!(err, DocumentError::ComplexKey { .. }));
    }

    #[test]
    fn test_syntax_errors_carry_a_position() {
        let err = parse_document("a: [1, 2\n").unwrap_err();
        assert!(matches!(err, DocumentError::Syntax { .. }));
        assert!(!err.position().is_none());
    }

    #[test]
    fn test_scalar_root() {
        let root = parse("version 1.0");
        assert_eq!(root.as_str(), Some("version 1.0"));
    }
}
