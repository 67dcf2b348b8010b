// Schema normalizer module: DBML to table definition, back to DBML, and source/target diffing
pub mod converter;
pub mod diff;
pub mod input;
pub mod normalizer;
pub mod renderer;


pub use converter::ConversionResult;
pub use diff::SourceTarget;
pub use input::SchemaInput;
pub use normalizer::SchemaNormalizer;
pub use renderer::{DbmlRenderer, DisplayType};
