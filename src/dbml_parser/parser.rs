//! DBML parser.
//!
//! Turns DBML source text into a [`DbmlDocument`] using the PEST grammar in
//! `dbml.pest`. Relationships are collected from both standalone `Ref`
//! declarations and inline `[ref: ...]` column settings, then resolved against
//! the declared tables.

use super::document::{
    DbmlColumn, DbmlDocument, DbmlEnum, DbmlProject, DbmlTable, DbmlTableGroup, Endpoint, RawRef,
};
use super::resolver::ReferenceResolver;
use crate::error::{TabledefError, TabledefResult};
use crate::types::RefType;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use tracing::{debug, instrument};

/// Parser for DBML source text.
#[derive(Parser, Default)]
#[grammar = "dbml_parser/dbml.pest"]
pub struct DbmlParser;

impl DbmlParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        Self
    }

    /// Parses DBML source into a document with resolved relationships.
    #[instrument(skip(self, input), fields(input_len = input.len()))]
    pub fn parse_document(&self, input: &str) -> TabledefResult<DbmlDocument> {
        let schema = Self::parse(Rule::schema, input)
            .map_err(|e| TabledefError::parse(format!("Invalid DBML syntax: {}", e)))?
            .next()
            .ok_or_else(|| TabledefError::parse("No schema found in parse result"))?;

        let mut document = DbmlDocument::default();
        let mut raw_refs = Vec::new();

        for pair in schema.into_inner() {
            match pair.as_rule() {
                Rule::project => document.project = Some(self.build_project(pair)?),
                Rule::table => {
                    let (table, inline_refs) = self.build_table(pair)?;
                    document.tables.push(table);
                    raw_refs.extend(inline_refs);
                }
                Rule::ref_block => raw_refs.push(self.build_ref_block(pair)?),
                Rule::enum_block => document.enums.push(self.build_enum(pair)?),
                Rule::table_group => document.table_groups.push(self.build_table_group(pair)?),
                Rule::EOI => {}
                rule => {
                    return Err(TabledefError::parse(format!("Unexpected rule: {:?}", rule)));
                }
            }
        }

        document.refs = ReferenceResolver::new(&document.tables).resolve_all(raw_refs)?;

        debug!(
            tables = document.tables.len(),
            refs = document.refs.len(),
            enums = document.enums.len(),
            "Parsed DBML document"
        );
        Ok(document)
    }

    fn build_project(&self, pair: Pair<Rule>) -> TabledefResult<DbmlProject> {
        let mut project = DbmlProject::default();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::ident | Rule::quoted_ident => project.name = Some(name_text(inner)),
                Rule::note_block => project.note = Some(self.build_note(inner)?),
                Rule::project_setting => {
                    let mut parts = inner.into_inner();
                    let key = parts.next().map(name_text).unwrap_or_default();
                    let value = parts.next().map(string_text).unwrap_or_default();
                    project.settings.insert(key, value);
                }
                _ => {}
            }
        }
        Ok(project)
    }

    fn build_table(&self, pair: Pair<Rule>) -> TabledefResult<(DbmlTable, Vec<RawRef>)> {
        let mut table = DbmlTable::default();
        let mut column_refs = Vec::new();

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::table_name => {
                    let (schema, name) = qualified_name(inner)?;
                    table.schema = schema;
                    table.name = name;
                }
                Rule::table_alias => {
                    table.alias = inner.into_inner().find(is_name).map(name_text);
                }
                Rule::settings => {
                    for setting in inner.into_inner() {
                        if setting.as_rule() == Rule::setting_note {
                            table.note = Some(self.setting_string(setting)?);
                        }
                    }
                }
                Rule::note_block => table.note = Some(self.build_note(inner)?),
                Rule::column => {
                    let (column, refs) = self.build_column(inner)?;
                    column_refs.extend(refs.into_iter().map(|(ref_type, right)| {
                        (column.name.clone(), ref_type, right)
                    }));
                    table.columns.push(column);
                }
                _ => {}
            }
        }

        let inline_refs = column_refs
            .into_iter()
            .map(|(column, ref_type, right)| RawRef {
                name: None,
                ref_type,
                left: Endpoint {
                    schema: table.schema.clone(),
                    table: table.name.clone(),
                    columns: vec![column],
                },
                right,
            })
            .collect();

        Ok((table, inline_refs))
    }

    fn build_column(&self, pair: Pair<Rule>) -> TabledefResult<(DbmlColumn, Vec<(RefType, Endpoint)>)> {
        let mut inner = pair.into_inner();
        let name = inner
            .next()
            .map(name_text)
            .ok_or_else(|| TabledefError::parse("Column without a name"))?;
        let column_type = inner
            .next()
            .map(type_text)
            .ok_or_else(|| TabledefError::parse(format!("Column '{}' has no type", name)))?;

        let mut column = DbmlColumn::new(name, column_type);
        let mut refs = Vec::new();

        if let Some(settings) = inner.next() {
            for setting in settings.into_inner() {
                match setting.as_rule() {
                    Rule::setting_pk => column.pk = true,
                    Rule::setting_not_null => column.not_null = true,
                    Rule::setting_null => column.not_null = false,
                    Rule::setting_unique => column.unique = true,
                    Rule::setting_increment => column.increment = true,
                    Rule::setting_note => column.note = Some(self.setting_string(setting)?),
                    Rule::setting_default => column.default = Some(self.setting_default(setting)?),
                    Rule::setting_ref => refs.push(self.build_inline_ref(setting)?),
                    _ => {}
                }
            }
        }

        Ok((column, refs))
    }

    fn build_inline_ref(&self, pair: Pair<Rule>) -> TabledefResult<(RefType, Endpoint)> {
        let mut ref_type = None;
        let mut endpoint = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::rel_op => ref_type = Some(rel_op(inner)?),
                Rule::ref_endpoint => endpoint = Some(self.build_endpoint(inner)?),
                _ => {}
            }
        }
        match (ref_type, endpoint) {
            (Some(ref_type), Some(endpoint)) => Ok((ref_type, endpoint)),
            _ => Err(TabledefError::parse("Incomplete inline reference")),
        }
    }

    fn build_ref_block(&self, pair: Pair<Rule>) -> TabledefResult<RawRef> {
        let mut name = None;
        let mut body = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::ref_name => name = inner.into_inner().next().map(name_text),
                Rule::ref_body => body = Some(inner),
                _ => {}
            }
        }
        let body = body.ok_or_else(|| TabledefError::parse("Ref declaration without a body"))?;

        let mut endpoints = Vec::with_capacity(2);
        let mut ref_type = None;
        for inner in body.into_inner() {
            match inner.as_rule() {
                Rule::ref_endpoint => endpoints.push(self.build_endpoint(inner)?),
                Rule::rel_op => ref_type = Some(rel_op(inner)?),
                _ => {}
            }
        }

        let right = endpoints.pop();
        let left = endpoints.pop();
        match (left, right, ref_type) {
            (Some(left), Some(right), Some(ref_type)) => Ok(RawRef {
                name,
                ref_type,
                left,
                right,
            }),
            _ => Err(TabledefError::parse("Ref declaration needs two endpoints and a relationship type")),
        }
    }

    fn build_endpoint(&self, pair: Pair<Rule>) -> TabledefResult<Endpoint> {
        let text = pair.as_str().to_string();
        let mut names = Vec::new();
        let mut composite = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::composite_columns => {
                    composite = Some(inner.into_inner().map(name_text).collect::<Vec<_>>());
                }
                _ => names.push(name_text(inner)),
            }
        }

        let columns = match composite {
            Some(columns) => columns,
            None => names.pop().into_iter().collect(),
        };
        let table = names.pop().ok_or_else(|| {
            TabledefError::parse(format!(
                "Reference endpoint '{}' must name both a table and a column",
                text
            ))
        })?;

        Ok(Endpoint {
            schema: names.pop(),
            table,
            columns,
        })
    }

    fn build_enum(&self, pair: Pair<Rule>) -> TabledefResult<DbmlEnum> {
        let mut dbml_enum = DbmlEnum::default();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::table_name => {
                    let (schema, name) = qualified_name(inner)?;
                    dbml_enum.schema = schema;
                    dbml_enum.name = name;
                }
                Rule::enum_value => {
                    if let Some(value) = inner.into_inner().find(is_name) {
                        dbml_enum.values.push(name_text(value));
                    }
                }
                _ => {}
            }
        }
        Ok(dbml_enum)
    }

    fn build_table_group(&self, pair: Pair<Rule>) -> TabledefResult<DbmlTableGroup> {
        let mut group = DbmlTableGroup::default();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::ident | Rule::quoted_ident => group.name = name_text(inner),
                Rule::table_name => group.tables.push(qualified_name(inner)?.1),
                _ => {}
            }
        }
        Ok(group)
    }

    fn build_note(&self, pair: Pair<Rule>) -> TabledefResult<String> {
        pair.into_inner()
            .find(|inner| inner.as_rule() == Rule::string)
            .map(string_text)
            .ok_or_else(|| TabledefError::parse("Note without text"))
    }

    fn setting_string(&self, pair: Pair<Rule>) -> TabledefResult<String> {
        self.build_note(pair)
    }

    fn setting_default(&self, pair: Pair<Rule>) -> TabledefResult<String> {
        let value = pair
            .into_inner()
            .find(|inner| inner.as_rule() == Rule::default_value)
            .and_then(|inner| inner.into_inner().next())
            .ok_or_else(|| TabledefError::parse("Default setting without a value"))?;
        Ok(match value.as_rule() {
            Rule::string => string_text(value),
            _ => value.as_str().trim().to_string(),
        })
    }
}

fn is_name(pair: &Pair<Rule>) -> bool {
    matches!(pair.as_rule(), Rule::ident | Rule::quoted_ident)
}

fn name_text(pair: Pair<Rule>) -> String {
    match pair.as_rule() {
        Rule::quoted_ident => pair
            .into_inner()
            .next()
            .map(|inner| inner.as_str().to_string())
            .unwrap_or_default(),
        _ => pair.as_str().to_string(),
    }
}

/// Splits `schema.name` into its parts; the schema is optional
fn qualified_name(pair: Pair<Rule>) -> TabledefResult<(Option<String>, String)> {
    let mut names: Vec<String> = pair.into_inner().filter(is_name).map(name_text).collect();
    let name = names
        .pop()
        .ok_or_else(|| TabledefError::parse("Missing name"))?;
    Ok((names.pop(), name))
}

fn type_text(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .map(|part| match part.as_rule() {
            Rule::quoted_ident => name_text(part),
            _ => part.as_str().to_string(),
        })
        .collect()
}

fn rel_op(pair: Pair<Rule>) -> TabledefResult<RefType> {
    RefType::from_symbol(pair.as_str())
        .ok_or_else(|| TabledefError::parse(format!("Unknown relationship type '{}'", pair.as_str())))
}

fn string_text(pair: Pair<Rule>) -> String {
    let Some(quoted) = pair.into_inner().next() else {
        return String::new();
    };
    let rule = quoted.as_rule();
    let raw = quoted.into_inner().next().map(|inner| inner.as_str()).unwrap_or("");
    match rule {
        Rule::triple_string => dedent(raw),
        _ => unescape(raw),
    }
}

pub(crate) fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(escaped @ ('\'' | '"' | '\\')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Strips the indentation shared by all non-blank lines of a multi-line string
pub(crate) fn dedent(raw: &str) -> String {
    let is_indent = |c: char| c == ' ' || c == '\t';
    let indent = raw
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|c| is_indent(*c)).count())
        .min()
        .unwrap_or(0);

    raw.lines()
        .map(|line| {
            let mut rest = line;
            for _ in 0..indent {
                match rest.strip_prefix(is_indent) {
                    Some(stripped) => rest = stripped,
                    None => break,
                }
            }
            rest
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
