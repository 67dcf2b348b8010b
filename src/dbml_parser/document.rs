// Parsed DBML document model
use crate::types::RefType;
use indexmap::IndexMap;

/// Everything the parser extracts from a DBML source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbmlDocument {
    pub project: Option<DbmlProject>,
    pub tables: Vec<DbmlTable>,
    /// Relationships with both ends resolved against declared tables
    pub refs: Vec<DbmlRef>,
    pub enums: Vec<DbmlEnum>,
    pub table_groups: Vec<DbmlTableGroup>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbmlProject {
    pub name: Option<String>,
    pub note: Option<String>,
    pub settings: IndexMap<String, String>,
}

/// Table declaration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbmlTable {
    pub schema: Option<String>,
    pub name: String,
    pub alias: Option<String>,
    pub note: Option<String>,
    pub columns: Vec<DbmlColumn>,
}

/// Column declaration with its settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbmlColumn {
    pub name: String,
    pub column_type: String,
    pub note: Option<String>,
    pub pk: bool,
    pub not_null: bool,
    pub unique: bool,
    pub increment: bool,
    pub default: Option<String>,
}

/// Resolved relationship between columns.
///
/// `left` and `right` always have the same length; inline column refs have
/// exactly one column per side.
#[derive(Debug, Clone, PartialEq)]
pub struct DbmlRef {
    pub name: Option<String>,
    pub ref_type: RefType,
    pub left: Vec<ColumnPointer>,
    pub right: Vec<ColumnPointer>,
}

/// Declared table and column names a relationship end points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPointer {
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbmlEnum {
    pub schema: Option<String>,
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbmlTableGroup {
    pub name: String,
    pub tables: Vec<String>,
}

/// Relationship end as written in the source, before resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub schema: Option<String>,
    pub table: String,
    pub columns: Vec<String>,
}

/// Relationship as written in the source, before resolution
#[derive(Debug, Clone, PartialEq)]
pub struct RawRef {
    pub name: Option<String>,
    pub ref_type: RefType,
    pub left: Endpoint,
    pub right: Endpoint,
}

impl DbmlTable {
    pub fn column(&self, name: &str) -> Option<&DbmlColumn> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|column| column.name.eq_ignore_ascii_case(name))
            })
    }

    /// Whether `name` refers to this table by name or alias
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.alias.as_deref() == Some(name)
    }
}

impl DbmlColumn {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            ..Self::default()
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(schema) = &self.schema {
            write!(f, "{}.", schema)?;
        }
        match self.columns.as_slice() {
            [column] => write!(f, "{}.{}", self.table, column),
            columns => write!(f, "{}.({})", self.table, columns.join(", ")),
        }
    }
}
