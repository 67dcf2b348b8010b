// Source/target schema extraction
use super::input::SchemaInput;
use super::normalizer::SchemaNormalizer;
use crate::error::{TabledefError, TabledefResult};
use crate::types::TableDefinition;
use tracing::{debug, instrument};

/// Source tables and, when a target was requested, target tables
pub type SourceTarget = (Option<TableDefinition>, Option<TableDefinition>);

impl SchemaNormalizer {
    /// Splits source and target schemas into separate table definitions.
    ///
    /// A textual target is parsed together with the source so that target
    /// tables referencing source tables resolve. Every table of the combined
    /// document that is not a source table belongs to the target. Without a
    /// target the second element is `None`.
    #[instrument(skip_all, fields(source = source.kind(), target = target.map(SchemaInput::kind)))]
    pub fn extract_source_target_tables(
        &self,
        source: &SchemaInput,
        target: Option<&SchemaInput>,
        include_source_refs: bool,
    ) -> TabledefResult<SourceTarget> {
        let rendered;
        let source = match source {
            SchemaInput::AlreadyParsed(source_tables) => match target {
                None => return Ok((Some(source_tables.clone()), Some(TableDefinition::new()))),
                Some(target) if target.is_blank() => {
                    return Ok((Some(source_tables.clone()), Some(TableDefinition::new())));
                }
                Some(SchemaInput::AlreadyParsed(target_tables)) => {
                    return Ok((Some(source_tables.clone()), Some(target_tables.clone())));
                }
                Some(_) => {
                    // Textual target: combine it with the source as DBML
                    rendered = SchemaInput::DbmlText(self.tabledef_to_dbml(source_tables));
                    &rendered
                }
            },
            text => text,
        };

        let source_tables = self.parse_table_dbml(source, include_source_refs)?;
        let target = match target {
            None => return Ok((source_tables, None)),
            Some(SchemaInput::AlreadyParsed(target_tables)) => {
                return Ok((source_tables, Some(target_tables.clone())));
            }
            Some(target) => target,
        };

        let source_tables = source_tables
            .ok_or_else(|| TabledefError::schema("Source schema could not be decoded"))?;
        let combined = SchemaInput::classify(format!(
            "{}\n{}",
            source.text().unwrap_or_default(),
            target.text().unwrap_or_default()
        ));
        let all_tables = self
            .parse_table_dbml(&combined, true)?
            .ok_or_else(|| TabledefError::schema("Combined source and target schema could not be decoded"))?;

        let target_tables = TableDefinition {
            tables: all_tables
                .tables
                .into_iter()
                .filter(|(name, _)| !source_tables.contains_table(name))
                .collect(),
        };
        debug!(
            source_tables = source_tables.len(),
            target_tables = target_tables.len(),
            "Extracted source and target tables"
        );
        Ok((Some(source_tables), Some(target_tables)))
    }
}
