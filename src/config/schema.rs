//! Structural validation of the raw configuration document.
//!
//! # Responsibilities
//! - Enforce the shape of the four top-level sections (global, servers, misc, web)
//! - Check required keys, field types, and the variable-kind enumeration
//! - Coerce textual ports into integers
//! - Check cross-references (default_server must name a configured server)
//!
//! # Design Decisions
//! - Explicit validation routines over a declarative-schema crate; the
//!   constraint set is small and the error paths stay precise
//! - Fail-fast: the first violated constraint is reported with its dotted path
//! - Every failure is the same `SchemaError` kind; callers branch on
//!   valid vs. invalid, never on a sub-kind
//! - Output is a checked raw document with per-field types already
//!   materialized, so model construction cannot fail

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::fmt;
use thiserror::Error;

/// A document failed a structural check.
///
/// `path` is the dotted location of the offending node (for example
/// `servers.proxysql-eu.dsn.port`), `constraint` the check it violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {constraint}")]
pub struct SchemaError {
    pub path: String,
    pub constraint: String,
}

impl SchemaError {
    fn new(path: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            constraint: constraint.into(),
        }
    }
}

/// Declared type of a user-fillable query variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    String,
    Integer,
    Float,
    Boolean,
}

impl VariableKind {
    const NAMES: [(&'static str, VariableKind); 4] = [
        ("string", VariableKind::String),
        ("integer", VariableKind::Integer),
        ("float", VariableKind::Float),
        ("boolean", VariableKind::Boolean),
    ];

    fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, kind)| *kind)
    }

    pub fn name(self) -> &'static str {
        match self {
            VariableKind::String => "string",
            VariableKind::Integer => "integer",
            VariableKind::Float => "float",
            VariableKind::Boolean => "boolean",
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scalar carried by a variable default.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VariableValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl VariableValue {
    /// Textual form used when substituting into SQL; booleans render as 1/0.
    pub fn to_sql_fragment(&self) -> String {
        match self {
            VariableValue::Str(s) => s.clone(),
            VariableValue::Int(i) => i.to_string(),
            VariableValue::Float(f) => f.to_string(),
            VariableValue::Bool(true) => "1".to_string(),
            VariableValue::Bool(false) => "0".to_string(),
        }
    }
}

/// A document that passed every structural check.
///
/// Sections keep their document order; sorting and set-building happen in
/// model construction.
#[derive(Debug)]
pub struct RawDocument {
    pub global: RawGlobal,
    pub servers: Vec<RawServer>,
    pub misc: Vec<RawCategory>,
    pub web: RawWeb,
}

#[derive(Debug)]
pub struct RawGlobal {
    pub default_server: String,
    pub read_only: bool,
    pub hide_tables: Vec<String>,
}

#[derive(Debug)]
pub struct RawServer {
    pub name: String,
    pub dsn: RawDsn,
    pub read_only: Option<bool>,
    pub hide_tables: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct RawDsn {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub passwd: String,
    pub db: String,
}

#[derive(Debug)]
pub struct RawCategory {
    pub name: String,
    pub queries: Vec<RawQuery>,
}

#[derive(Debug)]
pub struct RawQuery {
    pub title: String,
    pub info: String,
    pub sql: String,
    pub variables: Vec<(String, RawVariable)>,
}

#[derive(Debug)]
pub struct RawVariable {
    pub kind: VariableKind,
    pub label: String,
    pub default: Option<VariableValue>,
}

#[derive(Debug)]
pub struct RawWeb {
    pub secret_key: String,
    pub extra: Vec<(String, Value)>,
}

const TOP_LEVEL_SECTIONS: [&str; 4] = ["global", "servers", "misc", "web"];
const GLOBAL_FIELDS: [&str; 3] = ["default_server", "read_only", "hide_tables"];
const DSN_REQUIRED: [&str; 5] = ["host", "port", "user", "passwd", "db"];
// Tolerated inside dsn for legacy documents; the model ignores them there.
const DSN_OPTIONAL: [&str; 2] = ["read_only", "hide_tables"];
const QUERY_FIELDS: [&str; 4] = ["title", "info", "sql", "variables"];
const VARIABLE_FIELDS: [&str; 3] = ["type", "label", "default"];

/// Validate a parsed YAML document against the configuration schema.
pub fn validate(doc: &Value) -> Result<RawDocument, SchemaError> {
    let root = as_mapping(doc, "config")?;

    for key in root.keys() {
        let name = key_str(key, "config")?;
        if !TOP_LEVEL_SECTIONS.contains(&name) {
            return Err(SchemaError::new(
                format!("config.{}", name),
                "unknown section",
            ));
        }
    }

    let global = validate_global(required(root, "global", "config")?)?;
    let servers = validate_servers(required(root, "servers", "config")?)?;
    let misc = validate_misc(required(root, "misc", "config")?)?;
    let web = validate_web(required(root, "web", "config")?)?;

    // Cross-reference checks need both sections in hand.
    if !servers.iter().any(|s| s.name == global.default_server) {
        return Err(SchemaError::new(
            "global.default_server",
            format!("references unknown server \"{}\"", global.default_server),
        ));
    }

    Ok(RawDocument {
        global,
        servers,
        misc,
        web,
    })
}

fn validate_global(value: &Value) -> Result<RawGlobal, SchemaError> {
    let path = "global";
    let map = as_mapping(value, path)?;

    for key in map.keys() {
        let name = key_str(key, path)?;
        if !GLOBAL_FIELDS.contains(&name) {
            return Err(SchemaError::new(format!("{}.{}", path, name), "unknown field"));
        }
    }

    let default_server =
        as_str(required(map, "default_server", path)?, "global.default_server")?.to_string();
    let read_only = as_bool(required(map, "read_only", path)?, "global.read_only")?;
    let hide_tables = match map.get("hide_tables") {
        Some(value) => as_string_seq(value, "global.hide_tables")?,
        None => Vec::new(),
    };

    Ok(RawGlobal {
        default_server,
        read_only,
        hide_tables,
    })
}

fn validate_servers(value: &Value) -> Result<Vec<RawServer>, SchemaError> {
    let path = "servers";
    let map = as_mapping(value, path)?;

    if map.is_empty() {
        return Err(SchemaError::new(path, "must define at least one server"));
    }

    let mut servers = Vec::with_capacity(map.len());
    for (key, value) in map {
        let name = key_str(key, path)?;
        servers.push(validate_server(name, value)?);
    }
    Ok(servers)
}

fn validate_server(name: &str, value: &Value) -> Result<RawServer, SchemaError> {
    let path = format!("servers.{}", name);
    let map = as_mapping(value, &path)?;

    // The server section is open: anything besides dsn and the two typed
    // overrides passes through unexamined.
    let dsn = validate_dsn(required(map, "dsn", &path)?, &path)?;
    let read_only = match map.get("read_only") {
        Some(value) => Some(as_bool(value, &format!("{}.read_only", path))?),
        None => None,
    };
    let hide_tables = match map.get("hide_tables") {
        Some(value) => Some(as_string_seq(value, &format!("{}.hide_tables", path))?),
        None => None,
    };

    Ok(RawServer {
        name: name.to_string(),
        dsn,
        read_only,
        hide_tables,
    })
}

fn validate_dsn(value: &Value, server_path: &str) -> Result<RawDsn, SchemaError> {
    let path = format!("{}.dsn", server_path);
    let map = as_mapping(value, &path)?;

    for key in map.keys() {
        let name = key_str(key, &path)?;
        if !DSN_REQUIRED.contains(&name) && !DSN_OPTIONAL.contains(&name) {
            return Err(SchemaError::new(format!("{}.{}", path, name), "unknown field"));
        }
    }

    // Legacy documents carry the per-server overrides inside dsn; type-check
    // them when present, the model reads them from the server level only.
    if let Some(value) = map.get("read_only") {
        as_bool(value, &format!("{}.read_only", path))?;
    }
    if let Some(value) = map.get("hide_tables") {
        as_string_seq(value, &format!("{}.hide_tables", path))?;
    }

    Ok(RawDsn {
        host: as_str(required(map, "host", &path)?, &format!("{}.host", path))?.to_string(),
        port: coerce_port(required(map, "port", &path)?, &format!("{}.port", path))?,
        user: as_str(required(map, "user", &path)?, &format!("{}.user", path))?.to_string(),
        passwd: as_str(required(map, "passwd", &path)?, &format!("{}.passwd", path))?.to_string(),
        db: as_str(required(map, "db", &path)?, &format!("{}.db", path))?.to_string(),
    })
}

fn validate_misc(value: &Value) -> Result<Vec<RawCategory>, SchemaError> {
    let path = "misc";
    let map = as_mapping(value, path)?;

    let mut categories = Vec::with_capacity(map.len());
    for (key, value) in map {
        let name = key_str(key, path)?;
        let category_path = format!("misc.{}", name);
        let entries = value.as_sequence().ok_or_else(|| {
            SchemaError::new(category_path.clone(), "expected a sequence of queries")
        })?;

        let mut queries = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            queries.push(validate_query(entry, &format!("{}[{}]", category_path, index))?);
        }
        categories.push(RawCategory {
            name: name.to_string(),
            queries,
        });
    }
    Ok(categories)
}

fn validate_query(value: &Value, path: &str) -> Result<RawQuery, SchemaError> {
    let map = as_mapping(value, path)?;

    for key in map.keys() {
        let name = key_str(key, path)?;
        if !QUERY_FIELDS.contains(&name) {
            return Err(SchemaError::new(format!("{}.{}", path, name), "unknown field"));
        }
    }

    let title = as_str(required(map, "title", path)?, &format!("{}.title", path))?.to_string();
    if title.is_empty() {
        return Err(SchemaError::new(format!("{}.title", path), "must not be empty"));
    }
    let info = as_str(required(map, "info", path)?, &format!("{}.info", path))?.to_string();
    let sql = as_str(required(map, "sql", path)?, &format!("{}.sql", path))?.to_string();
    if sql.is_empty() {
        return Err(SchemaError::new(format!("{}.sql", path), "must not be empty"));
    }

    let variables = match map.get("variables") {
        Some(value) => validate_variables(value, &format!("{}.variables", path))?,
        None => Vec::new(),
    };

    Ok(RawQuery {
        title,
        info,
        sql,
        variables,
    })
}

fn validate_variables(value: &Value, path: &str) -> Result<Vec<(String, RawVariable)>, SchemaError> {
    let map = as_mapping(value, path)?;

    let mut variables = Vec::with_capacity(map.len());
    for (key, value) in map {
        let name = key_str(key, path)?;
        let variable = validate_variable(value, &format!("{}.{}", path, name))?;
        variables.push((name.to_string(), variable));
    }
    Ok(variables)
}

fn validate_variable(value: &Value, path: &str) -> Result<RawVariable, SchemaError> {
    let map = as_mapping(value, path)?;

    for key in map.keys() {
        let name = key_str(key, path)?;
        if !VARIABLE_FIELDS.contains(&name) {
            return Err(SchemaError::new(format!("{}.{}", path, name), "unknown field"));
        }
    }

    let kind_path = format!("{}.type", path);
    let kind_name = as_str(required(map, "type", path)?, &kind_path)?;
    let kind = VariableKind::from_name(kind_name).ok_or_else(|| {
        SchemaError::new(
            kind_path,
            format!(
                "expected one of string, integer, float, boolean; got \"{}\"",
                kind_name
            ),
        )
    })?;

    let label = as_str(required(map, "label", path)?, &format!("{}.label", path))?.to_string();

    let default = match map.get("default") {
        Some(value) => Some(coerce_default(value, kind, &format!("{}.default", path))?),
        None => None,
    };

    Ok(RawVariable {
        kind,
        label,
        default,
    })
}

// A default must already be representable as the declared kind; the only
// widening accepted is integer-for-float.
fn coerce_default(
    value: &Value,
    kind: VariableKind,
    path: &str,
) -> Result<VariableValue, SchemaError> {
    let coerced = match (kind, value) {
        (VariableKind::String, Value::String(s)) => Some(VariableValue::Str(s.clone())),
        (VariableKind::Integer, Value::Number(n)) => n.as_i64().map(VariableValue::Int),
        (VariableKind::Float, Value::Number(n)) => n.as_f64().map(VariableValue::Float),
        (VariableKind::Boolean, Value::Bool(b)) => Some(VariableValue::Bool(*b)),
        _ => None,
    };
    coerced.ok_or_else(|| SchemaError::new(path, format!("not representable as {}", kind)))
}

fn validate_web(value: &Value) -> Result<RawWeb, SchemaError> {
    let path = "web";
    let map = as_mapping(value, path)?;

    let secret_key = as_str(required(map, "secret_key", path)?, "web.secret_key")?.to_string();

    // Everything else passes through to the web layer untouched.
    let mut extra = Vec::new();
    for (key, value) in map {
        let name = key_str(key, path)?;
        if name != "secret_key" {
            extra.push((name.to_string(), value.clone()));
        }
    }

    Ok(RawWeb { secret_key, extra })
}

fn as_mapping<'a>(value: &'a Value, path: &str) -> Result<&'a Mapping, SchemaError> {
    value
        .as_mapping()
        .ok_or_else(|| SchemaError::new(path, "expected a mapping"))
}

fn as_str<'a>(value: &'a Value, path: &str) -> Result<&'a str, SchemaError> {
    value
        .as_str()
        .ok_or_else(|| SchemaError::new(path, "expected a string"))
}

fn as_bool(value: &Value, path: &str) -> Result<bool, SchemaError> {
    value
        .as_bool()
        .ok_or_else(|| SchemaError::new(path, "expected a boolean"))
}

fn as_string_seq(value: &Value, path: &str) -> Result<Vec<String>, SchemaError> {
    let seq = value
        .as_sequence()
        .ok_or_else(|| SchemaError::new(path, "expected a sequence of strings"))?;
    let mut items = Vec::with_capacity(seq.len());
    for (index, item) in seq.iter().enumerate() {
        let item = as_str(item, &format!("{}[{}]", path, index))?;
        items.push(item.to_string());
    }
    Ok(items)
}

fn required<'a>(map: &'a Mapping, key: &str, path: &str) -> Result<&'a Value, SchemaError> {
    map.get(key)
        .ok_or_else(|| SchemaError::new(format!("{}.{}", path, key), "required field is missing"))
}

// All mapping keys we own are plain strings.
fn key_str<'a>(key: &'a Value, path: &str) -> Result<&'a str, SchemaError> {
    key.as_str()
        .ok_or_else(|| SchemaError::new(path, "mapping keys must be strings"))
}

// Ports arrive either as integers or as quoted strings.
fn coerce_port(value: &Value, path: &str) -> Result<u16, SchemaError> {
    let port = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    };
    match port {
        Some(port) if port > 0 => Ok(port),
        _ => Err(SchemaError::new(path, "expected a positive integer port")),
    }
}
