// Top-level conversion with errors reported as data
use super::diff::SourceTarget;
use super::input::SchemaInput;
use super::normalizer::SchemaNormalizer;
use crate::error::{TabledefError, TabledefResult};
use crate::types::TableDefinition;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::json;
use tracing::{error, info, instrument};

/// Outcome of [`SchemaNormalizer::dbml_to_table_def`].
///
/// Serialized with a `status` tag. The error variant also carries the
/// `parsed_source: {"error": ...}` / `parsed_target: null` pair that clients
/// of the conversion endpoint read.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionResult {
    Success {
        parsed_source: Option<TableDefinition>,
        parsed_target: Option<TableDefinition>,
    },
    Error {
        error: String,
    },
}

impl ConversionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ConversionResult::Success { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ConversionResult::Success { .. } => None,
            ConversionResult::Error { error } => Some(error),
        }
    }

    /// Number of source plus target tables
    pub fn table_count(&self) -> usize {
        match self {
            ConversionResult::Success {
                parsed_source,
                parsed_target,
            } => {
                parsed_source.as_ref().map_or(0, TableDefinition::len)
                    + parsed_target.as_ref().map_or(0, TableDefinition::len)
            }
            ConversionResult::Error { .. } => 0,
        }
    }

    /// Error record for a conversion that failed with `error`
    pub fn from_error(error: &TabledefError) -> Self {
        ConversionResult::Error {
            error: format!("Unable to parse DBML file due to {}", error),
        }
    }

    fn from_result(result: TabledefResult<SourceTarget>) -> Self {
        match result {
            Ok((parsed_source, parsed_target)) => ConversionResult::Success {
                parsed_source,
                parsed_target,
            },
            Err(e) => Self::from_error(&e),
        }
    }
}

impl Serialize for ConversionResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ConversionResult::Success {
                parsed_source,
                parsed_target,
            } => {
                let mut state = serializer.serialize_struct("ConversionResult", 3)?;
                state.serialize_field("status", "success")?;
                state.serialize_field("parsed_source", parsed_source)?;
                state.serialize_field("parsed_target", parsed_target)?;
                state.end()
            }
            ConversionResult::Error { error } => {
                let mut state = serializer.serialize_struct("ConversionResult", 4)?;
                state.serialize_field("status", "error")?;
                state.serialize_field("error", error)?;
                state.serialize_field("parsed_source", &json!({ "error": error }))?;
                state.serialize_field("parsed_target", &Option::<TableDefinition>::None)?;
                state.end()
            }
        }
    }
}

impl SchemaNormalizer {
    /// Converts source (and optionally target) schema input into table definitions.
    ///
    /// Never fails: any error becomes [`ConversionResult::Error`]. Without a
    /// target the parsed target is an empty table definition.
    #[instrument(skip_all, fields(source = source.kind(), has_target = target.is_some(), include_refs = include_refs))]
    pub fn dbml_to_table_def(
        &self,
        source: &SchemaInput,
        target: Option<&SchemaInput>,
        include_refs: bool,
    ) -> ConversionResult {
        let target = target.filter(|target| !target.is_blank());
        let result = match target {
            None => self
                .parse_table_dbml(source, include_refs)
                .map(|parsed_source| (parsed_source, Some(TableDefinition::new()))),
            Some(target) => self.extract_source_target_tables(source, Some(target), include_refs),
        };

        let conversion = ConversionResult::from_result(result);
        match conversion.error_message() {
            Some(message) => error!(error = message, "Schema conversion failed"),
            None => info!(tables = conversion.table_count(), "Schema conversion completed"),
        }
        conversion
    }
}
