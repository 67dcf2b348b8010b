// Table definition to DBML rendering
use crate::types::{ColumnRecord, TableDefinition, TableEntry};
use std::fmt;
use tracing::debug;

const INDENT: &str = "    ";

/// Coarse column type used when rendering DBML
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayType {
    Timestamp,
    Date,
    Float,
    Int,
    Varchar,
}

impl DisplayType {
    /// Maps a free-text column type by case-insensitive prefix
    pub fn from_column_type(column_type: &str) -> Self {
        let lowered = column_type.to_lowercase();
        if starts_with_any(&lowered, &["datetime", "timestamp"]) {
            DisplayType::Timestamp
        } else if starts_with_any(&lowered, &["date"]) {
            DisplayType::Date
        } else if starts_with_any(&lowered, &["double", "float", "numeric"]) {
            DisplayType::Float
        } else if starts_with_any(&lowered, &["integer", "int"]) {
            DisplayType::Int
        } else {
            DisplayType::Varchar
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayType::Timestamp => "timestamp",
            DisplayType::Date => "date",
            DisplayType::Float => "float",
            DisplayType::Int => "int",
            DisplayType::Varchar => "varchar",
        }
    }
}

impl fmt::Display for DisplayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders table definitions as DBML text
#[derive(Debug, Default, Clone, Copy)]
pub struct DbmlRenderer;

impl DbmlRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Renders every table that has columns, separated by blank lines
    pub fn render(&self, definition: &TableDefinition) -> String {
        definition
            .tables
            .iter()
            .filter_map(|(name, entry)| self.render_table(name, entry))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Renders a single table; `None` for tables without columns
    pub fn render_table(&self, name: &str, entry: &TableEntry) -> Option<String> {
        let columns = entry.columns();
        if columns.is_empty() {
            debug!(table = name, "Skipping table without columns");
            return None;
        }

        let column_lines: Vec<String> = columns
            .iter()
            .map(|(column_name, column)| self.render_column(column_name, column))
            .collect();

        let separator = format!("\n{}", INDENT);
        let mut out = format!("Table {}{{\n{}", dbml_name(name), INDENT);
        out.push_str(&column_lines.join(separator.as_str()));
        if let Some(note) = entry.note() {
            out.push_str(&format!("\n{}Note: '{}'", INDENT, escape_note(note)));
        }
        out.push_str("\n}");
        Some(out)
    }

    /// Renders one column line: `name type [clauses]`
    pub fn render_column(&self, name: &str, column: &ColumnRecord) -> String {
        let mut clauses = Vec::new();
        if column.not_null {
            clauses.push("not null".to_string());
        }
        if column.autoincrement {
            clauses.push("increment".to_string());
        }
        if let Some(note) = column.display_note() {
            clauses.push(format!("note: '{}'", escape_note(note)));
        }
        for reference in &column.refs {
            clauses.push(format!("ref: - {}", dbml_path(reference.target())));
        }

        let mut line = format!(
            "{} {}",
            dbml_name(name),
            DisplayType::from_column_type(&column.column_type)
        );
        if !clauses.is_empty() {
            line.push_str(&format!(" [{}]", clauses.join(", ")));
        }
        line
    }
}

fn starts_with_any(text: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| text.starts_with(prefix))
}

fn escape_note(note: &str) -> String {
    note.replace('\'', "\\'")
}

/// Quotes names that are not plain identifiers
fn dbml_name(name: &str) -> String {
    let plain = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name)
    }
}

fn dbml_path(path: &str) -> String {
    path.split('.').map(dbml_name).collect::<Vec<_>>().join(".")
}
