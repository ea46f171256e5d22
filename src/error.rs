use crate::document::Position;
use crate::issue::Level;
use miette::{Diagnostic, LabeledSpan, NamedSource, Severity, SourceCode, SourceSpan};
use std::fmt::Display;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum DocumentError {
    #[error("{message}")]
    #[diagnostic(
        code(document::syntax),
        help("The text isn't well-formed YAML.")
    )]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("mapping keys must be strings")]
    #[diagnostic(
        code(document::complex_key),
        help("Use a plain string as the key of every map entry.")
    )]
    ComplexKey { line: usize, column: usize },

    #[error("key '{key}' is defined more than once")]
    #[diagnostic(
        code(document::duplicate_key),
        help("Every key in a map must be unique.")
    )]
    DuplicateKey {
        key: String,
        line: usize,
        column: usize,
    },

    #[error("alias refers to an unknown anchor")]
    #[diagnostic(code(document::unknown_alias))]
    UnknownAlias { line: usize, column: usize },

    #[error("too many alias expansions")]
    #[diagnostic(
        code(document::alias_expansion),
        help("Aliases in this document expand to more than {limit} nodes.")
    )]
    AliasExpansion {
        limit: usize,
        line: usize,
        column: usize,
    },
}

impl DocumentError {
    pub fn position(&self) -> Position {
        match self {
            DocumentError::Syntax { line, column, .. }
            | DocumentError::ComplexKey { line, column }
            | DocumentError::DuplicateKey { line, column, .. }
            | DocumentError::UnknownAlias { line, column }
            | DocumentError::AliasExpansion { line, column, .. } => Position::new(*line, *column),
        }
    }
}

/// An `Issue` bound to the text it was found in, so `miette` can render it
/// with a labelled source snippet.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct IssueReport {
    pub(crate) message: String,
    pub(crate) level: Level,
    pub(crate) src: NamedSource<String>,
    pub(crate) span: Option<SourceSpan>,
}

impl Diagnostic for IssueReport {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new(match self.level {
            Level::Error => "architecture::error",
            Level::Warning => "architecture::warning",
        }))
    }

    fn severity(&self) -> Option<Severity> {
        Some(match self.level {
            Level::Error => Severity::Error,
            Level::Warning => Severity::Warning,
        })
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span?;
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(self.message.clone()),
            span,
        ))))
    }
}
