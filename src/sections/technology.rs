use crate::document::{Node, NodeKind, Position};
use crate::fields::{to_sequence, to_strings, Fields};
use crate::issue::Issue;
use crate::linter::{Connector, ReadContext, SectionReader};
use crate::model::{ArchitectureModel, Ref};
use crate::schema::{read_description, Quadrant, Ring};
use crate::sections::{describable, nameable, read_entities};
use crate::symbols::SymbolTable;
use log::trace;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Technology {
    #[serde(skip)]
    pub position: Position,
    pub id: String,
    pub name: String,
    pub description: String,
    /// Unset when the quadrant is missing or invalid.
    pub quadrant: Option<Quadrant>,
    pub ring: Option<Ring>,
}

nameable!(Technology);
describable!(Technology);

/// A named group of technologies and other bundles.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnologyBundle {
    #[serde(skip)]
    pub position: Position,
    pub id: String,
    /// Ids of technologies and bundles, sorted.
    pub technology_ids: Vec<String>,
    /// The flattened set, sorted by name.
    #[serde(skip)]
    pub technologies: Vec<Ref<Technology>>,
}

/// The technologies an entity is built with, as written and as resolved.
///
/// A plain string names a single bundle; a sequence lists technology or
/// bundle ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnologySet {
    #[serde(skip)]
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
    #[serde(skip)]
    pub resolved: Vec<Ref<Technology>>,
}

impl TechnologySet {
    pub fn is_empty(&self) -> bool {
        self.bundle.is_none() && self.ids.is_empty()
    }

    pub fn iter<'a>(
        &'a self,
        model: &'a ArchitectureModel,
    ) -> impl Iterator<Item = &'a Technology> + 'a {
        self.resolved.iter().map(move |&technology| &model[technology])
    }
}

pub fn read_technologies(fields: &Fields, field: &str, issues: &mut Vec<Issue>) -> TechnologySet {
    let Some(node) = fields.get(field) else {
        return TechnologySet::default();
    };
    let mut set = TechnologySet {
        position: node.position,
        ..TechnologySet::default()
    };
    match &node.kind {
        NodeKind::Scalar(bundle) => set.bundle = Some(bundle.clone()),
        NodeKind::Sequence(items) => {
            set.ids = to_strings(items, "technology", issues);
            set.ids.sort();
        }
        _ => issues.push(Issue::wrong_kind(field, node, "sequence")),
    }
    set
}

/// Resolves every id in `set` to a bundle's technologies or to a single
/// technology. Bundles must already be flattened.
pub fn connect_technologies(
    set: &mut TechnologySet,
    bundles: &[TechnologyBundle],
    symbols: &SymbolTable,
) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut resolved = Vec::new();
    for id in set.bundle.iter().chain(set.ids.iter()) {
        if let Some(bundle) = symbols.technology_bundle(id) {
            resolved.extend(bundles[bundle.index()].technologies.iter().copied());
        } else if let Some(technology) = symbols.technology(id) {
            resolved.push(technology);
        } else {
            issues.push(Issue::error_at(
                format!("Unknown technology '{id}'"),
                set.position,
            ));
        }
    }
    resolved.sort();
    resolved.dedup();
    set.resolved = resolved;
    issues
}

pub struct TechnologyReader;

impl SectionReader for TechnologyReader {
    fn read(
        &self,
        node: Option<&Node>,
        _context: &ReadContext,
        model: &mut ArchitectureModel,
    ) -> Vec<Issue> {
        let mut issues = Vec::new();
        model.technologies =
            read_entities(node, &mut issues, |technology: &mut Technology, fields, issues| {
                read_description(fields, technology, issues);
                match fields.enumeration::<Quadrant>() {
                    Ok(quadrant) => technology.quadrant = Some(quadrant),
                    Err(issue) => issues.push(issue),
                }
                match fields.enumeration::<Ring>() {
                    Ok(ring) => technology.ring = Some(ring),
                    Err(issue) => issues.push(issue),
                }
            });
        issues
    }
}

pub struct TechnologyBundleReader;

impl SectionReader for TechnologyBundleReader {
    fn read(
        &self,
        node: Option<&Node>,
        _context: &ReadContext,
        model: &mut ArchitectureModel,
    ) -> Vec<Issue> {
        let Some(node) = node else {
            return Vec::new();
        };
        let section = match Fields::of(node) {
            Ok(section) => section,
            Err(issue) => return vec![issue],
        };
        let mut issues = Vec::new();
        let mut bundles: Vec<TechnologyBundle> = section
            .iter()
            .map(|(id, bundle_node)| {
                let mut bundle = TechnologyBundle {
                    position: bundle_node.position,
                    id: id.to_string(),
                    ..TechnologyBundle::default()
                };
                match to_sequence(bundle_node, "technologies") {
                    Ok(items) => {
                        bundle.technology_ids = to_strings(items, "technology", &mut issues);
                        bundle.technology_ids.sort();
                    }
                    Err(issue) => issues.push(issue),
                }
                bundle
            })
            .collect();
        bundles.sort_by(|a, b| a.id.cmp(&b.id));
        model.technology_bundles = bundles;
        issues
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mark {
    Pending,
    InProgress,
    Done,
}

/// Flattens bundles depth first, remembering finished bundles and tracking
/// the bundles in progress to catch cycles.
struct BundleResolver<'a> {
    bundles: &'a [TechnologyBundle],
    symbols: &'a SymbolTable,
    marks: Vec<Mark>,
    resolved: Vec<Vec<Ref<Technology>>>,
    stack: Vec<usize>,
    issues: Vec<Issue>,
}

impl<'a> BundleResolver<'a> {
    fn new(bundles: &'a [TechnologyBundle], symbols: &'a SymbolTable) -> Self {
        BundleResolver {
            bundles,
            symbols,
            marks: vec![Mark::Pending; bundles.len()],
            resolved: vec![Vec::new(); bundles.len()],
            stack: Vec::new(),
            issues: Vec::new(),
        }
    }

    fn resolve(&mut self, index: usize) {
        if self.marks[index] != Mark::Pending {
            return;
        }
        self.marks[index] = Mark::InProgress;
        self.stack.push(index);

        let bundles = self.bundles;
        let bundle = &bundles[index];
        let mut technologies = Vec::new();
        for id in &bundle.technology_ids {
            if let Some(nested) = self.symbols.technology_bundle(id) {
                let nested = nested.index();
                if self.marks[nested] == Mark::InProgress {
                    let message = format!("Circular technology bundle: {}", self.cycle_through(nested));
                    self.issues.push(Issue::error_at(message, bundle.position));
                    continue;
                }
                self.resolve(nested);
                technologies.extend(self.resolved[nested].iter().copied());
            } else if let Some(technology) = self.symbols.technology(id) {
                technologies.push(technology);
            } else {
                self.issues.push(Issue::error_at(
                    format!("Unknown technology '{id}'"),
                    bundle.position,
                ));
            }
        }
        technologies.sort();
        technologies.dedup();
        trace!("Bundle '{}' has {} technologies", bundle.id, technologies.len());

        self.resolved[index] = technologies;
        self.marks[index] = Mark::Done;
        self.stack.pop();
    }

    /// `a -> b -> a` for the stack from `start` back round to it.
    fn cycle_through(&self, start: usize) -> String {
        let from = self
            .stack
            .iter()
            .position(|&index| index == start)
            .unwrap_or(0);
        self.stack[from..]
            .iter()
            .chain(std::iter::once(&start))
            .map(|&index| self.bundles[index].id.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

pub struct TechnologyBundleConnector;

impl Connector for TechnologyBundleConnector {
    fn connect(&self, model: &mut ArchitectureModel, symbols: &SymbolTable) -> Vec<Issue> {
        let mut resolver = BundleResolver::new(&model.technology_bundles, symbols);
        for index in 0..model.technology_bundles.len() {
            resolver.resolve(index);
        }
        let BundleResolver {
            resolved, issues, ..
        } = resolver;
        for (bundle, technologies) in model.technology_bundles.iter_mut().zip(resolved) {
            bundle.technologies = technologies;
        }
        issues
    }
}
