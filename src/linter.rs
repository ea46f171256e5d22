use crate::api::Analysis;
use crate::document::{parse_document, Node, Position};
use crate::fields::Fields;
use crate::issue::Issue;
use crate::model::ArchitectureModel;
use crate::sections::datastore::{
    DataStoreValidator, DatabaseConnector, DatabaseReader, QueueConnector, QueueReader,
    ViewValidator,
};
use crate::sections::external::{ExternalSystemConnector, ExternalSystemReader};
use crate::sections::persona::{PersonaConnector, PersonaReader, PersonaValidator};
use crate::sections::service::{FormValidator, ServiceConnector, ServiceReader};
use crate::sections::system::SystemReader;
use crate::sections::technology::{
    TechnologyBundleConnector, TechnologyBundleReader, TechnologyReader,
};
use crate::sections::version::VersionReader;
use crate::sections::workflow::{WorkflowConnector, WorkflowReader};
use crate::symbols::SymbolTable;
use log::{debug, trace};

/// What a section reader may know about where the document came from.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadContext<'a> {
    pub file_name: Option<&'a str>,
}

/// Reads one top-level section into the model.
///
/// `node` is `None` when the section is absent or null. Readers create
/// entities but never link them.
pub trait SectionReader: Send + Sync {
    fn read(
        &self,
        node: Option<&Node>,
        context: &ReadContext,
        model: &mut ArchitectureModel,
    ) -> Vec<Issue>;
}

/// Resolves the ids captured by readers into handles.
pub trait Connector: Send + Sync {
    fn connect(&self, model: &mut ArchitectureModel, symbols: &SymbolTable) -> Vec<Issue>;
}

/// Checks an invariant that spans the whole, linked model.
pub trait Validator: Send + Sync {
    fn validate(&self, model: &ArchitectureModel) -> Vec<Issue>;
}

/// The passes a `Linter` runs, in the order it runs them.
#[derive(Default)]
pub struct Registry {
    readers: Vec<(&'static str, Box<dyn SectionReader>)>,
    connectors: Vec<Box<dyn Connector>>,
    validators: Vec<Box<dyn Validator>>,
}

impl Registry {
    /// Every section of an architecture document.
    pub fn standard() -> Self {
        Registry::empty()
            .reader("version", VersionReader)
            .reader("system", SystemReader)
            .reader("personas", PersonaReader)
            .reader("externalSystems", ExternalSystemReader)
            .reader("services", ServiceReader)
            .reader("databases", DatabaseReader)
            .reader("queues", QueueReader)
            .reader("technologies", TechnologyReader)
            .reader("technologyBundles", TechnologyBundleReader)
            .reader("workflows", WorkflowReader)
            .connector(TechnologyBundleConnector)
            .connector(PersonaConnector)
            .connector(ExternalSystemConnector)
            .connector(ServiceConnector)
            .connector(DatabaseConnector)
            .connector(QueueConnector)
            .connector(WorkflowConnector)
            .validator(PersonaValidator)
            .validator(FormValidator)
            .validator(ViewValidator)
            .validator(DataStoreValidator)
    }

    pub fn empty() -> Self {
        Registry::default()
    }

    /// Registers `reader` for the top-level key `section`.
    pub fn reader(mut self, section: &'static str, reader: impl SectionReader + 'static) -> Self {
        self.readers.push((section, Box::new(reader)));
        self
    }

    pub fn connector(mut self, connector: impl Connector + 'static) -> Self {
        self.connectors.push(Box::new(connector));
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn sections(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.readers.iter().map(|(section, _)| *section)
    }

    fn knows(&self, section: &str) -> bool {
        self.sections().any(|known| known == section)
    }
}

/// Turns document text into a linked model and its issues.
pub struct Linter {
    registry: Registry,
}

impl Default for Linter {
    fn default() -> Self {
        Linter::new(Registry::standard())
    }
}

impl Linter {
    pub fn new(registry: Registry) -> Self {
        Linter { registry }
    }

    /// Reads, links and validates `text`.
    ///
    /// Only text that isn't YAML, or whose root isn't a map, fails outright;
    /// every other problem is collected as an issue next to the model.
    pub fn lint(&self, text: &str, file_name: Option<&str>) -> Analysis {
        debug!("Decoding {} bytes", text.len());
        let root = match parse_document(text) {
            Ok(root) => root,
            Err(err) => {
                debug!("Decoding failed: {err}");
                return Analysis::failed(Issue::error_at(
                    format!("Invalid YAML: {err}"),
                    err.position(),
                ));
            }
        };
        let empty = Node::null(Position::NONE);
        let root = root.as_ref().unwrap_or(&empty);
        let sections = match Fields::of(root) {
            Ok(sections) => sections,
            Err(issue) => return Analysis::failed(issue),
        };

        let mut issues = Vec::new();
        for key in sections.keys() {
            if !self.registry.knows(&key.name) {
                issues.push(Issue::warning(
                    format!("Unknown top-level element '{}'", key.name),
                    key.position,
                ));
            }
        }

        let mut model = ArchitectureModel {
            position: root.position,
            ..ArchitectureModel::default()
        };
        let context = ReadContext { file_name };
        for (section, reader) in &self.registry.readers {
            trace!("Reading section '{section}'");
            issues.extend(reader.read(sections.get(section), &context, &mut model));
        }

        debug!("Linking model");
        let symbols = SymbolTable::build(&model);
        for connector in &self.registry.connectors {
            issues.extend(connector.connect(&mut model, &symbols));
        }

        debug!("Validating model");
        for validator in &self.registry.validators {
            issues.extend(validator.validate(&model));
        }

        debug!("Finished with {} issue(s)", issues.len());
        Analysis {
            model: Some(model),
            issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingReader;

    impl SectionReader for CountingReader {
        fn read(
            &self,
            node: Option<&Node>,
            _context: &ReadContext,
            model: &mut ArchitectureModel,
        ) -> Vec<Issue> {
            model.version = format!("seen {}", node.is_some());
            Vec::new()
        }
    }

    #[test]
    fn test_registered_readers_run_even_without_their_section() {
        let linter = Linter::new(Registry::empty().reader("version", CountingReader));
        let analysis = linter.lint("other: 1\n", None);
        let model = analysis.model.unwrap();
        assert_eq!(model.version, "seen false");
        assert_eq!(analysis.issues.len(), 1);
        assert_eq!(analysis.issues[0].message, "Unknown top-level element 'other'");
    }

    #[test]
    fn test_empty_registry_warns_about_every_key() {
        let linter = Linter::new(Registry::empty());
        let analysis = linter.lint("version: 1.0\npersonas: {}\n", None);
        assert_eq!(analysis.warnings().count(), 2);
    }

    #[test]
    fn test_standard_sections() {
        let sections: Vec<_> = Registry::standard().sections().collect();
        assert_eq!(sections.len(), 10);
        assert!(sections.contains(&"technologyBundles"));
    }

    #[test]
    fn test_linter_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Linter>();
    }
}
