use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Normalized schema: lowercase table name to table entry, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableDefinition {
    pub tables: IndexMap<String, TableEntry>,
}

/// A table as found in a table definition.
///
/// Tables produced by the parser are always [`TableEntry::Table`]. Hand-written
/// definitions may skip the `columns` wrapper and map column names directly,
/// which is accepted for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TableEntry {
    Table(TableRecord),
    Columns(IndexMap<String, ColumnRecord>),
}

/// Table record of the standard table definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRecord {
    /// Human readable table note
    #[serde(default)]
    pub description: Option<String>,
    /// Fallback note key accepted on input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Columns keyed by lowercase name
    pub columns: IndexMap<String, ColumnRecord>,
    /// Lowercase names of the tables this table references
    #[serde(default)]
    pub refs: BTreeSet<String>,
}

/// Column record of the standard table definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRecord {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default = "default_column_type")]
    pub column_type: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub refs: Vec<ColumnRef>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub not_null: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub autoincrement: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

fn default_column_type() -> String {
    "varchar".to_string()
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Reference attached to a column: a full record or a bare `table.column` target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Record(ReferenceRecord),
    Target(String),
}

/// Reference record describing a relationship to another table's column
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReferenceRecord {
    /// Target in `<table>.<column>` form
    pub column_name: String,
    pub dbml_ref_type: RefType,
    pub ref_description: RefDescription,
}

/// DBML relationship symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RefType {
    #[serde(rename = ">")]
    ManyToOne,
    #[serde(rename = "<")]
    OneToMany,
    #[serde(rename = "-")]
    OneToOne,
    #[serde(rename = "<>")]
    ManyToMany,
}

/// Human readable relationship cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefDescription {
    ManyToOne,
    OneToMany,
    OneToOne,
    ManyToMany,
}

impl TableDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Look up a table record, ignoring bare column mappings
    pub fn table(&self, name: &str) -> Option<&TableRecord> {
        match self.tables.get(name)? {
            TableEntry::Table(record) => Some(record),
            TableEntry::Columns(_) => None,
        }
    }

    /// Mutable table record lookup, ignoring bare column mappings
    pub fn table_mut(&mut self, name: &str) -> Option<&mut TableRecord> {
        match self.tables.get_mut(name)? {
            TableEntry::Table(record) => Some(record),
            TableEntry::Columns(_) => None,
        }
    }

    pub fn insert_table(&mut self, name: impl Into<String>, record: TableRecord) {
        self.tables.insert(name.into(), TableEntry::Table(record));
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}

impl TableEntry {
    pub fn columns(&self) -> &IndexMap<String, ColumnRecord> {
        match self {
            TableEntry::Table(record) => &record.columns,
            TableEntry::Columns(columns) => columns,
        }
    }

    /// Table note used when rendering; bare column mappings have none
    pub fn note(&self) -> Option<&str> {
        match self {
            TableEntry::Table(record) => first_non_empty(&[&record.description, &record.note]),
            TableEntry::Columns(_) => None,
        }
    }
}

impl TableRecord {
    pub fn new(description: Option<String>) -> Self {
        Self {
            description,
            ..Self::default()
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnRecord> {
        self.columns.get(name)
    }
}

impl ColumnRecord {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            note: None,
            primary_key: false,
            refs: Vec::new(),
            not_null: false,
            autoincrement: false,
            description: None,
            desc: None,
        }
    }

    /// Column note used when rendering: `note`, then `description`, then `desc`
    pub fn display_note(&self) -> Option<&str> {
        first_non_empty(&[&self.note, &self.description, &self.desc])
    }

    /// Drop repeated references, keeping the first occurrence
    pub fn dedup_refs(&mut self) {
        let mut seen = HashSet::new();
        self.refs.retain(|reference| seen.insert(reference.clone()));
    }
}

fn first_non_empty<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|candidate| candidate.as_deref())
        .find(|text| !text.is_empty())
}

impl<'de> Deserialize<'de> for TableEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let wrapped = value
            .as_object()
            .map(|object| object.contains_key("columns"))
            .unwrap_or(false);
        if wrapped {
            serde_json::from_value(value)
                .map(TableEntry::Table)
                .map_err(de::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(TableEntry::Columns)
                .map_err(de::Error::custom)
        }
    }
}

impl ColumnRef {
    /// Target column in `<table>.<column>` form
    pub fn target(&self) -> &str {
        match self {
            ColumnRef::Record(record) => &record.column_name,
            ColumnRef::Target(target) => target,
        }
    }
}

impl<'de> Deserialize<'de> for ColumnRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::String(target) => Ok(ColumnRef::Target(target)),
            Value::Object(_) => serde_json::from_value::<ReferenceRecord>(value.clone())
                .map(ColumnRef::Record)
                .map_err(|_| de::Error::custom(format!("Invalid ref found {}", value))),
            other => Err(de::Error::custom(format!("Invalid ref found {}", other))),
        }
    }
}

impl ReferenceRecord {
    pub fn new(column_name: impl Into<String>, ref_type: RefType) -> Self {
        Self {
            column_name: column_name.into(),
            dbml_ref_type: ref_type,
            ref_description: ref_type.description(),
        }
    }
}

impl RefType {
    pub const ALL: [RefType; 4] = [
        RefType::ManyToOne,
        RefType::OneToMany,
        RefType::OneToOne,
        RefType::ManyToMany,
    ];

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">" => Some(RefType::ManyToOne),
            "<" => Some(RefType::OneToMany),
            "-" => Some(RefType::OneToOne),
            "<>" => Some(RefType::ManyToMany),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            RefType::ManyToOne => ">",
            RefType::OneToMany => "<",
            RefType::OneToOne => "-",
            RefType::ManyToMany => "<>",
        }
    }

    pub fn description(&self) -> RefDescription {
        match self {
            RefType::ManyToOne => RefDescription::ManyToOne,
            RefType::OneToMany => RefDescription::OneToMany,
            RefType::OneToOne => RefDescription::OneToOne,
            RefType::ManyToMany => RefDescription::ManyToMany,
        }
    }
}

impl fmt::Display for RefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl RefDescription {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefDescription::ManyToOne => "many_to_one",
            RefDescription::OneToMany => "one_to_many",
            RefDescription::OneToOne => "one_to_one",
            RefDescription::ManyToMany => "many_to_many",
        }
    }
}

impl fmt::Display for RefDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
