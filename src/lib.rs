pub mod api;
pub mod document;
pub mod error;
pub mod fields;
pub mod issue;
pub mod linter;
pub mod model;
pub mod name;
pub mod schema;
pub mod sections;
pub mod symbols;
pub mod utils;

pub use api::{read_model, read_model_file, Analysis};
pub use issue::{Issue, Level};
pub use linter::{Linter, Registry};
pub use model::ArchitectureModel;
