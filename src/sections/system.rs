use crate::document::Node;
use crate::fields::Fields;
use crate::issue::Issue;
use crate::linter::{ReadContext, SectionReader};
use crate::model::ArchitectureModel;
use crate::name::friendly_name;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct System {
    pub name: String,
}

pub struct SystemReader;

impl SectionReader for SystemReader {
    fn read(
        &self,
        node: Option<&Node>,
        context: &ReadContext,
        model: &mut ArchitectureModel,
    ) -> Vec<Issue> {
        let mut issues = Vec::new();
        let name = node.and_then(|node| match Fields::of(node) {
            Ok(fields) => fields.string("name").unwrap_or_else(|issue| {
                issues.push(issue);
                None
            }),
            Err(issue) => {
                issues.push(issue);
                None
            }
        });
        model.system.name = name.unwrap_or_else(|| name_from_file(context.file_name));
        issues
    }
}

fn name_from_file(file_name: Option<&str>) -> String {
    file_name
        .and_then(|file_name| Path::new(file_name).file_name())
        .map(|stem| friendly_name(&stem.to_string_lossy()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;

    fn read(text: &str, file_name: Option<&str>) -> (ArchitectureModel, Vec<Issue>) {
        let root = parse_document(text).unwrap().unwrap();
        let mut model = ArchitectureModel::default();
        let context = ReadContext { file_name };
        let issues = SystemReader.read(root.get("system"), &context, &mut model);
        (model, issues)
    }

    #[test]
    fn test_explicit_name() {
        let (model, issues) = read("system:\n  name: Web shop\n", Some("shop.yaml"));
        assert_eq!(model.system.name, "Web shop");
        assert!(issues.is_empty());
    }

    #[test]
    fn test_name_from_file() {
        let (model, _) = read("version: 1.0\n", Some("models/a-system-named-foo.yaml"));
        assert_eq!(model.system.name, "A system named foo");
    }

    #[test]
    fn test_no_name_without_file() {
        let (model, _) = read("version: 1.0\n", None);
        assert_eq!(model.system.name, "");
    }

    #[test]
    fn test_non_map_system() {
        let (model, issues) = read("system: Shop\n", Some("shop.yaml"));
        assert_eq!(issues[0].message, "Expected a map");
        assert_eq!(model.system.name, "Shop");
    }
}
