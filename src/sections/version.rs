use crate::document::Node;
use crate::issue::Issue;
use crate::linter::{ReadContext, SectionReader};
use crate::model::ArchitectureModel;
use regex::Regex;
use std::sync::LazyLock;

/// The newest document version this crate understands.
pub const SUPPORTED_VERSION: &str = "1.0.0";

const SUPPORTED: [&str; 3] = ["1", "0", "0"];

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.(\d+)(?:\.(\d+))?$").expect("valid version regex")
});

pub struct VersionReader;

impl SectionReader for VersionReader {
    fn read(
        &self,
        node: Option<&Node>,
        _context: &ReadContext,
        model: &mut ArchitectureModel,
    ) -> Vec<Issue> {
        let Some(node) = node else {
            model.version = SUPPORTED_VERSION.to_string();
            return Vec::new();
        };
        match check_version(node) {
            Ok(version) => {
                model.version = version;
                Vec::new()
            }
            Err(issue) => vec![issue],
        }
    }
}

fn check_version(node: &Node) -> Result<String, Issue> {
    let invalid =
        || Issue::error("Version must be a semantic version as defined by https://semver.org", node);
    let value = node.as_str().ok_or_else(invalid)?;
    let captures = VERSION_PATTERN.captures(value).ok_or_else(invalid)?;
    let part = |index: usize| captures.get(index).map_or("0", |part| part.as_str());
    let version = [part(1), part(2), part(3)].map(magnitude);
    if version > SUPPORTED.map(magnitude) {
        return Err(Issue::error(format!("Undefined version: {value}"), node));
    }
    Ok(value.to_string())
}

/// Orders digit strings by numeric value, however long they are.
fn magnitude(digits: &str) -> (usize, &str) {
    let digits = digits.trim_start_matches('0');
    (digits.len(), digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{parse_document, Position};

    fn read(text: &str) -> (ArchitectureModel, Vec<Issue>) {
        let root = parse_document(text).unwrap().unwrap();
        let mut model = ArchitectureModel::default();
        let issues = VersionReader.read(
            root.get("version").filter(|node| !node.is_null()),
            &ReadContext::default(),
            &mut model,
        );
        (model, issues)
    }

    #[test]
    fn test_missing_version_defaults() {
        let (model, issues) = read("system:\n  name: x\n");
        assert_eq!(model.version, "1.0.0");
        assert!(issues.is_empty());
    }

    #[test]
    fn test_short_version_is_kept_as_written() {
        let (model, issues) = read("version: 1.0\n");
        assert_eq!(model.version, "1.0");
        assert!(issues.is_empty());
    }

    #[test]
    fn test_older_version_is_accepted() {
        let (model, _) = read("version: 0.9.3\n");
        assert_eq!(model.version, "0.9.3");
    }

    #[test]
    fn test_malformed_versions() {
        for text in ["version: one\n", "version: 1\n", "version: 1.0.0-beta\n", "version: [1]\n"] {
            let (model, issues) = read(text);
            assert_eq!(model.version, "", "{text}");
            assert_eq!(
                issues[0].message,
                "Version must be a semantic version as defined by https://semver.org"
            );
        }
    }

    #[test]
    fn test_newer_version_is_undefined() {
        let (model, issues) = read("version: 1.1\n");
        assert_eq!(model.version, "");
        assert_eq!(issues[0].message, "Undefined version: 1.1");
        assert_eq!(issues[0].position, Position::new(1, 10));
    }

    #[test]
    fn test_huge_version_is_undefined() {
        let (model, issues) = read("version: 99999999999999999999.0\n");
        assert_eq!(model.version, "");
        assert_eq!(issues[0].message, "Undefined version: 99999999999999999999.0");

        let (model, issues) = read("version: 001.000.000\n");
        assert_eq!(model.version, "001.000.000");
        assert!(issues.is_empty());
    }
}
