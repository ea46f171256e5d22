use crate::document::{Node, Position};
use crate::error::IssueReport;
use crate::utils::{offset_of, token_length};
use miette::NamedSource;
use serde::Serialize;
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warning,
}

impl Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic found while reading, linking or validating a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub level: Level,
    pub message: String,
    pub position: Position,
}

impl Issue {
    pub fn error(message: impl Into<String>, node: &Node) -> Self {
        Self::error_at(message, node.position)
    }

    pub fn error_at(message: impl Into<String>, position: Position) -> Self {
        Issue {
            level: Level::Error,
            message: message.into(),
            position,
        }
    }

    pub fn warning(message: impl Into<String>, position: Position) -> Self {
        Issue {
            level: Level::Warning,
            message: message.into(),
            position,
        }
    }

    /// An error that isn't tied to any node, e.g. a file that can't be read.
    pub fn detached(message: impl Into<String>) -> Self {
        Self::error_at(message, Position::NONE)
    }

    /// `<field> must be a <expected>, not a <actual>`
    pub fn wrong_kind(field: &str, node: &Node, expected: &str) -> Self {
        Self::error(
            format!(
                "{field} must be a {expected}, not a {}",
                node.kind.describe()
            ),
            node,
        )
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }

    /// Binds this issue to the text it was found in, for rendering with `miette`.
    pub fn report(&self, file_name: &str, source: &str) -> IssueReport {
        let span = if self.position.is_none() {
            None
        } else {
            let offset = offset_of(source, self.position.line, self.position.column);
            Some((offset, token_length(source, offset)).into())
        };
        IssueReport {
            message: self.message.clone(),
            level: self.level,
            src: NamedSource::new(file_name, source.to_string()),
            span,
        }
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.position.is_none() {
            write!(f, "{}: {}", self.level, self.message)
        } else {
            write!(
                f,
                "{}:{}: {}: {}",
                self.position.line, self.position.column, self.level, self.message
            )
        }
    }
}
