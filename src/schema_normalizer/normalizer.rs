//! DBML to table definition normalization.
//!
//! Builds the standard table definition from a parsed DBML document:
//!
//! ```text
//! {
//!     "table_name": {
//!         "description": "table note",
//!         "columns": {
//!             "column_name": {
//!                 "name": "Column_Name",
//!                 "type": "column type",
//!                 "note": "column note",
//!                 "primary_key": false,
//!                 "refs": [{"column_name": "other.id", "dbml_ref_type": ">", "ref_description": "many_to_one"}]
//!             }
//!         },
//!         "refs": ["other"]
//!     }
//! }
//! ```

use super::input::SchemaInput;
use super::renderer::DbmlRenderer;
use crate::dbml_parser::{ColumnPointer, DbmlDocument, DbmlParser};
use crate::error::{TabledefError, TabledefResult};
use crate::types::{ColumnRecord, ColumnRef, RefType, ReferenceRecord, TableDefinition, TableEntry, TableRecord};
use tracing::{debug, info, instrument, warn};

/// Converts schema input into table definitions and back
#[derive(Default)]
pub struct SchemaNormalizer {
    pub(super) parser: DbmlParser,
    pub(super) renderer: DbmlRenderer,
}

impl SchemaNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses schema input into the standard table definition.
    ///
    /// Already parsed definitions are returned unchanged. JSON text that fails to
    /// decode yields `Ok(None)` after a warning. DBML text is parsed and
    /// normalized; with `include_refs` the relationships are attached to their
    /// source columns and tables.
    #[instrument(skip(self, input), fields(kind = input.kind()))]
    pub fn parse_table_dbml(
        &self,
        input: &SchemaInput,
        include_refs: bool,
    ) -> TabledefResult<Option<TableDefinition>> {
        match input {
            SchemaInput::AlreadyParsed(definition) => Ok(Some(definition.clone())),
            SchemaInput::JsonText(text) => match serde_json::from_str::<TableDefinition>(text) {
                Ok(definition) => Ok(Some(definition)),
                Err(e) => {
                    warn!(error = %e, "Failed to parse dbml object");
                    Ok(None)
                }
            },
            SchemaInput::DbmlText(text) => {
                let document = self.parser.parse_document(text)?;
                let definition = self.normalize_document(&document, include_refs)?;
                info!(tables = definition.len(), include_refs, "Normalized DBML schema");
                Ok(Some(definition))
            }
        }
    }

    /// Renders a table definition back into DBML text
    pub fn tabledef_to_dbml(&self, definition: &TableDefinition) -> String {
        self.renderer.render(definition)
    }

    /// Builds the table definition for a parsed document
    pub fn normalize_document(
        &self,
        document: &DbmlDocument,
        include_refs: bool,
    ) -> TabledefResult<TableDefinition> {
        let mut definition = TableDefinition::new();

        for table in &document.tables {
            let mut record = TableRecord::new(table.note.clone());
            for column in &table.columns {
                let mut column_record = ColumnRecord::new(&column.name, &column.column_type);
                column_record.note = column.note.clone();
                column_record.primary_key = column.pk;
                column_record.not_null = column.not_null;
                column_record.autoincrement = column.increment;
                record.columns.insert(column.name.to_lowercase(), column_record);
            }
            definition.insert_table(table.name.to_lowercase(), record);
        }

        if include_refs && !document.refs.is_empty() {
            for reference in &document.refs {
                // Composite references hang off the first left-hand column
                let source = reference.left.first().ok_or_else(|| {
                    TabledefError::reference("Reference without a source column")
                })?;
                for target in &reference.right {
                    attach_reference(&mut definition, source, target, reference.ref_type)?;
                }
            }

            for entry in definition.tables.values_mut() {
                if let TableEntry::Table(record) = entry {
                    for column in record.columns.values_mut() {
                        column.dedup_refs();
                    }
                }
            }
        }

        Ok(definition)
    }
}

fn attach_reference(
    definition: &mut TableDefinition,
    source: &ColumnPointer,
    target: &ColumnPointer,
    ref_type: RefType,
) -> TabledefResult<()> {
    let source_table = source.table.to_lowercase();
    let source_column = source.column.to_lowercase();
    let target_table = target.table.to_lowercase();
    let target_column = format!("{}.{}", target_table, target.column.to_lowercase());

    let record = definition.table_mut(&source_table).ok_or_else(|| {
        TabledefError::reference(format!("Source table '{}' is missing", source_table))
    })?;
    let column = record.columns.get_mut(&source_column).ok_or_else(|| {
        TabledefError::reference(format!(
            "Source column '{}.{}' is missing",
            source_table, source_column
        ))
    })?;

    debug!(
        source = %format!("{}.{}", source_table, source_column),
        target = %target_column,
        ref_type = %ref_type,
        "Attaching reference"
    );
    column
        .refs
        .push(ColumnRef::Record(ReferenceRecord::new(target_column, ref_type)));
    record.refs.insert(target_table);
    Ok(())
}
