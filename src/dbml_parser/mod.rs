// DBML parser module: grammar, document model and reference resolution
pub mod document;
pub mod parser;
pub mod resolver;

#[cfg(test)]
mod tests;

pub use document::{ColumnPointer, DbmlColumn, DbmlDocument, DbmlRef, DbmlTable};
pub use parser::DbmlParser;
pub use resolver::ReferenceResolver;
