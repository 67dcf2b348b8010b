// Classification of raw schema input
use crate::error::{TabledefError, TabledefResult};
use crate::types::TableDefinition;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Schema input, classified once at the boundary
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaInput {
    /// Already in table definition form; passed through untouched
    AlreadyParsed(TableDefinition),
    /// JSON text expected to decode into a table definition
    JsonText(String),
    /// DBML source text
    DbmlText(String),
}

impl SchemaInput {
    /// Text starting with `[` or `{` (after leading whitespace) is JSON, anything else DBML
    pub fn classify(text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            SchemaInput::JsonText(text)
        } else {
            SchemaInput::DbmlText(text)
        }
    }

    /// Source text for text inputs
    pub fn text(&self) -> Option<&str> {
        match self {
            SchemaInput::AlreadyParsed(_) => None,
            SchemaInput::JsonText(text) | SchemaInput::DbmlText(text) => Some(text),
        }
    }

    /// Empty text or an empty table definition
    pub fn is_blank(&self) -> bool {
        match self {
            SchemaInput::AlreadyParsed(definition) => definition.is_empty(),
            SchemaInput::JsonText(text) | SchemaInput::DbmlText(text) => text.is_empty(),
        }
    }

    /// Reads and classifies a schema file
    pub async fn from_file(path: impl AsRef<Path>) -> TabledefResult<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await?;
        debug!(path = %path.display(), bytes = text.len(), "Read schema file");
        Ok(Self::classify(text))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SchemaInput::AlreadyParsed(_) => "already_parsed",
            SchemaInput::JsonText(_) => "json_text",
            SchemaInput::DbmlText(_) => "dbml_text",
        }
    }
}

impl From<TableDefinition> for SchemaInput {
    fn from(definition: TableDefinition) -> Self {
        SchemaInput::AlreadyParsed(definition)
    }
}

impl TryFrom<Value> for SchemaInput {
    type Error = TabledefError;

    /// JSON strings are classified by content, JSON objects are table definitions
    fn try_from(value: Value) -> TabledefResult<Self> {
        match value {
            Value::String(text) => Ok(SchemaInput::classify(text)),
            Value::Object(_) => Ok(SchemaInput::AlreadyParsed(serde_json::from_value(value)?)),
            other => Err(TabledefError::schema(format!(
                "Expected DBML text or a table definition object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
