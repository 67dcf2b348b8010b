// Relationship resolution against declared tables
use super::document::{ColumnPointer, DbmlRef, DbmlTable, Endpoint, RawRef};
use crate::error::{TabledefError, TabledefResult};
use tracing::debug;

/// Resolves relationship endpoints to declared tables and columns.
///
/// Tables are matched by name or alias, exact case first and ASCII
/// case-insensitively after that. Schema qualifiers are not used for matching.
pub struct ReferenceResolver<'a> {
    tables: &'a [DbmlTable],
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(tables: &'a [DbmlTable]) -> Self {
        Self { tables }
    }

    pub fn resolve_all(&self, raw_refs: Vec<RawRef>) -> TabledefResult<Vec<DbmlRef>> {
        raw_refs.into_iter().map(|raw| self.resolve(raw)).collect()
    }

    pub fn resolve(&self, raw: RawRef) -> TabledefResult<DbmlRef> {
        let left = self.resolve_endpoint(&raw.left)?;
        let right = self.resolve_endpoint(&raw.right)?;

        if left.len() != right.len() {
            return Err(TabledefError::reference(format!(
                "Reference {} {} {} has {} column(s) on the left and {} on the right",
                raw.left,
                raw.ref_type,
                raw.right,
                left.len(),
                right.len()
            )));
        }

        debug!(left = %raw.left, right = %raw.right, ref_type = %raw.ref_type, "Resolved reference");
        Ok(DbmlRef {
            name: raw.name,
            ref_type: raw.ref_type,
            left,
            right,
        })
    }

    fn resolve_endpoint(&self, endpoint: &Endpoint) -> TabledefResult<Vec<ColumnPointer>> {
        let table = self.find_table(&endpoint.table).ok_or_else(|| {
            TabledefError::reference(format!(
                "Table '{}' referenced by {} is not declared",
                endpoint.table, endpoint
            ))
        })?;

        endpoint
            .columns
            .iter()
            .map(|column_name| {
                let column = table.column(column_name).ok_or_else(|| {
                    TabledefError::reference(format!(
                        "Column '{}' referenced by {} is not declared in table '{}'",
                        column_name, endpoint, table.name
                    ))
                })?;
                Ok(ColumnPointer {
                    table: table.name.clone(),
                    column: column.name.clone(),
                })
            })
            .collect()
    }

    fn find_table(&self, name: &str) -> Option<&'a DbmlTable> {
        self.tables
            .iter()
            .find(|table| table.answers_to(name))
            .or_else(|| {
                self.tables.iter().find(|table| {
                    table.name.eq_ignore_ascii_case(name)
                        || table
                            .alias
                            .as_deref()
                            .map(|alias| alias.eq_ignore_ascii_case(name))
                            .unwrap_or(false)
                })
            })
    }
}
