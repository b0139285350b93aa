//! Local emulation of Redshift's `COPY ... json` for the SQLite backend.
//!
//! The source is a file or a directory tree of `.json` files. Each file may
//! contain newline-delimited objects, concatenated objects or a top-level
//! array of objects. Records are mapped to columns either by key name
//! (`auto`) or through a JSONPaths document, coerced to the declared column
//! types and inserted under one savepoint, so a failing copy leaves the
//! table untouched.

use super::{CopyDirective, JsonMapping};
use crate::error::{EtlError, EtlResult};
use crate::schema::table::{Column, SqlType, Table};
use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

static NULL: Value = Value::Null;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Key(String),
    Index(usize),
}

/// Where the value of one column comes from.
#[derive(Debug)]
enum ColumnSource {
    Key(&'static str),
    Path(Vec<PathSegment>),
}

pub(super) fn ingest(conn: &mut Connection, directive: &CopyDirective) -> EtlResult<u64> {
    let table = directive.table;
    let bulk_err = |message: String| EtlError::bulk_source(table.name, &directive.source, message);

    let root = Path::new(&directive.source);
    if !root.exists() {
        return Err(bulk_err("source does not exist".to_string()));
    }
    let files = collect_source_files(root).map_err(bulk_err)?;
    if files.is_empty() {
        return Err(bulk_err("no .json files found under source".to_string()));
    }

    let sources = column_sources(table, &directive.mapping).map_err(bulk_err)?;
    let insert_sql = insert_statement(table);
    let statement_name = format!("copy {}", table.name);

    let savepoint = conn
        .savepoint()
        .map_err(|e| EtlError::statement(&statement_name, e))?;
    let mut inserted = 0u64;
    {
        let mut stmt = savepoint
            .prepare(&insert_sql)
            .map_err(|e| EtlError::statement(&statement_name, e))?;

        for file in &files {
            debug!("Reading {}", file.display());
            let records = read_records(file).map_err(bulk_err)?;
            for (position, record) in records.iter().enumerate() {
                let at = || format!("{} record {}", file.display(), position + 1);
                if !record.is_object() {
                    return Err(bulk_err(format!("{}: not a JSON object", at())));
                }
                let values = table
                    .columns
                    .iter()
                    .zip(sources.iter())
                    .map(|(column, source)| {
                        coerce(extract(record, source), column)
                            .map_err(|msg| format!("{}: column {}: {}", at(), column.name, msg))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(bulk_err)?;
                stmt.execute(rusqlite::params_from_iter(values.iter()))
                    .map_err(|e| EtlError::statement(&statement_name, e))?;
                inserted += 1;
            }
        }
    }
    savepoint
        .commit()
        .map_err(|e| EtlError::statement(&statement_name, e))?;

    Ok(inserted)
}

fn insert_statement(table: &Table) -> String {
    let names = table.column_names();
    let placeholders = (1..=names.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name,
        names.join(", "),
        placeholders
    )
}

fn collect_source_files(root: &Path) -> Result<Vec<PathBuf>, String> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| e.to_string())?;
        let is_json = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if entry.file_type().is_file() && is_json {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn read_records(path: &Path) -> Result<Vec<Value>, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("{}: {}", path.display(), e))?;
    let mut records = Vec::new();
    for value in serde_json::Deserializer::from_str(&content).into_iter::<Value>() {
        match value.map_err(|e| format!("{}: invalid JSON: {}", path.display(), e))? {
            Value::Array(items) => records.extend(items),
            other => records.push(other),
        }
    }
    Ok(records)
}

fn column_sources(table: &'static Table, mapping: &JsonMapping) -> Result<Vec<ColumnSource>, String> {
    match mapping {
        JsonMapping::Auto => Ok(table
            .columns
            .iter()
            .map(|c| ColumnSource::Key(c.name))
            .collect()),
        JsonMapping::Paths(location) => {
            let paths = load_json_paths(Path::new(location))?;
            if paths.len() != table.columns.len() {
                return Err(format!(
                    "JSONPaths file {} lists {} paths but {} has {} columns",
                    location,
                    paths.len(),
                    table.name,
                    table.columns.len()
                ));
            }
            paths
                .iter()
                .map(|p| parse_json_path(p).map(ColumnSource::Path))
                .collect()
        }
    }
}

fn load_json_paths(path: &Path) -> Result<Vec<String>, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("JSONPaths file {}: {}", path.display(), e))?;
    let document: Value = serde_json::from_str(&content)
        .map_err(|e| format!("JSONPaths file {}: invalid JSON: {}", path.display(), e))?;
    document
        .get("jsonpaths")
        .and_then(Value::as_array)
        .ok_or_else(|| format!("JSONPaths file {} has no `jsonpaths` array", path.display()))?
        .iter()
        .map(|p| {
            p.as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("JSONPaths file {}: paths must be strings", path.display()))
        })
        .collect()
}

/// Parses the JSONPath subset accepted by COPY: `$.a.b`, `$['a']`,
/// `$["a"]` and `[n]` array indices.
fn parse_json_path(path: &str) -> Result<Vec<PathSegment>, String> {
    let invalid = |why: &str| format!("invalid JSONPath `{}`: {}", path, why);
    let rest = path
        .trim()
        .strip_prefix('$')
        .ok_or_else(|| invalid("must start with `$`"))?;
    let chars: Vec<char> = rest.chars().collect();
    let mut segments = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '.' => {
                i += 1;
                let start = i;
                while i < chars.len() && chars[i] != '.' && chars[i] != '[' {
                    i += 1;
                }
                if start == i {
                    return Err(invalid("empty key"));
                }
                segments.push(PathSegment::Key(chars[start..i].iter().collect()));
            }
            '[' => {
                i += 1;
                if i < chars.len() && (chars[i] == '\'' || chars[i] == '"') {
                    let quote = chars[i];
                    i += 1;
                    let start = i;
                    while i < chars.len() && chars[i] != quote {
                        i += 1;
                    }
                    if i >= chars.len() {
                        return Err(invalid("unterminated quote"));
                    }
                    let key: String = chars[start..i].iter().collect();
                    i += 1;
                    if i >= chars.len() || chars[i] != ']' {
                        return Err(invalid("expected `]`"));
                    }
                    i += 1;
                    segments.push(PathSegment::Key(key));
                } else {
                    let start = i;
                    while i < chars.len() && chars[i] != ']' {
                        i += 1;
                    }
                    if i >= chars.len() {
                        return Err(invalid("expected `]`"));
                    }
                    let index: String = chars[start..i].iter().collect();
                    let index = index
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| invalid("array index must be a non-negative integer"))?;
                    i += 1;
                    segments.push(PathSegment::Index(index));
                }
            }
            other => return Err(invalid(&format!("unexpected character `{}`", other))),
        }
    }

    if segments.is_empty() {
        return Err(invalid("path selects the whole record"));
    }
    Ok(segments)
}

fn extract<'v>(record: &'v Value, source: &ColumnSource) -> &'v Value {
    match source {
        ColumnSource::Key(column) => record
            .as_object()
            .and_then(|obj| {
                obj.iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(column))
                    .map(|(_, value)| value)
            })
            .unwrap_or(&NULL),
        ColumnSource::Path(segments) => {
            let mut current = record;
            for segment in segments {
                let next = match segment {
                    PathSegment::Key(key) => current.get(key.as_str()),
                    PathSegment::Index(index) => current.get(*index),
                };
                match next {
                    Some(value) => current = value,
                    None => return &NULL,
                }
            }
            current
        }
    }
}

fn coerce(value: &Value, column: &Column) -> Result<SqlValue, String> {
    if value.is_null() {
        return Ok(SqlValue::Null);
    }
    match column.sql_type {
        t if t.is_integer() => match value {
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Ok(SqlValue::Integer(i)),
                (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Ok(SqlValue::Integer(f as i64))
                }
                _ => Err(format!("{} is not an integer", n)),
            },
            Value::String(s) if s.trim().is_empty() => Ok(SqlValue::Null),
            Value::String(s) => {
                let s = s.trim();
                if let Ok(i) = s.parse::<i64>() {
                    return Ok(SqlValue::Integer(i));
                }
                match s.parse::<f64>() {
                    Ok(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        Ok(SqlValue::Integer(f as i64))
                    }
                    _ => Err(format!("`{}` is not an integer", s)),
                }
            }
            Value::Bool(b) => Ok(SqlValue::Integer(*b as i64)),
            other => Err(format!("cannot load {} into an integer column", other)),
        },
        SqlType::DoublePrecision => match value {
            Value::Number(n) => n
                .as_f64()
                .map(SqlValue::Real)
                .ok_or_else(|| format!("{} is not a number", n)),
            Value::String(s) if s.trim().is_empty() => Ok(SqlValue::Null),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(SqlValue::Real)
                .map_err(|_| format!("`{}` is not a number", s)),
            other => Err(format!("cannot load {} into a numeric column", other)),
        },
        _ => match value {
            Value::String(s) => Ok(SqlValue::Text(s.clone())),
            other => Ok(SqlValue::Text(other.to_string())),
        },
    }
}
