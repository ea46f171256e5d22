use crate::error::IssueReport;
use crate::issue::{Issue, Level};
use crate::linter::Linter;
use crate::model::ArchitectureModel;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static LINTER: LazyLock<Linter> = LazyLock::new(Linter::default);

/// The outcome of reading an architecture document.
///
/// `model` is `None` only when the document couldn't be decoded at all or
/// its root isn't a map. In every other case the model is present, even when
/// `issues` holds errors, so callers can decide how strict to be.
#[derive(Debug, Serialize)]
pub struct Analysis {
    pub model: Option<ArchitectureModel>,
    pub issues: Vec<Issue>,
}

impl Analysis {
    pub(crate) fn failed(issue: Issue) -> Self {
        Analysis {
            model: None,
            issues: vec![issue],
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|issue| issue.level == Level::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.level == Level::Warning)
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// The issues ordered by line and column. Issues without a position come
    /// first; issues at the same position keep the order they were found in.
    #[must_use]
    pub fn issues_by_position(&self) -> Vec<&Issue> {
        let mut issues: Vec<&Issue> = self.issues.iter().collect();
        issues.sort_by_key(|issue| issue.position);
        issues
    }

    /// Binds every issue, in position order, to the text it was found in.
    #[must_use]
    pub fn reports(&self, file_name: &str, source: &str) -> Vec<IssueReport> {
        self.issues_by_position()
            .into_iter()
            .map(|issue| issue.report(file_name, source))
            .collect()
    }

    /// Serializes the model and issues into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self)
    }

    /// Serializes the model and issues into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self)
    }
}

/// Reads an architecture document from text, with the standard sections.
///
/// Without a file name the system name comes only from `system.name`.
#[must_use]
pub fn read_model(text: &str) -> Analysis {
    LINTER.lint(text, None)
}

/// Reads an architecture document from a file, with the standard sections.
///
/// A file that can't be read yields a single error and no model.
pub fn read_model_file(path: impl AsRef<Path>) -> Analysis {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(text) => LINTER.lint(&text, Some(&path.to_string_lossy())),
        Err(err) => Analysis::failed(Issue::detached(format!(
            "Couldn't read file {}: {err}",
            path.display()
        ))),
    }
}
