pub mod config;
pub mod dbml_parser;
pub mod error;
pub mod monitoring;
pub mod schema_normalizer;
pub mod server;
pub mod types;

pub use error::{TabledefError, TabledefResult};
pub use schema_normalizer::{ConversionResult, SchemaInput, SchemaNormalizer};
pub use types::TableDefinition;
