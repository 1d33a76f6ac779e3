//! TOML has no null: null entries of tables are left out when writing.

use ::toml::{Table, Value as TomlValue};
use indexmap::IndexMap;
use tracing::debug;

use super::Format;
use crate::tree::{ConfigTree, Node, Value};
use crate::ConfigError;

pub(super) fn encode(tree: &ConfigTree) -> Result<String, ConfigError> {
    let table = tree_to_table(tree)?;
    ::toml::to_string(&table).map_err(|e| ConfigError::serialize(Format::Toml, e))
}

pub(super) fn decode(contents: &str) -> Result<IndexMap<String, Value>, ConfigError> {
    let table: Table = ::toml::from_str(contents).map_err(|e| ConfigError::parse(Format::Toml, e))?;
    Ok(table_to_mapping(table))
}

fn tree_to_table(tree: &ConfigTree) -> Result<Table, ConfigError> {
    let mut table = Table::new();
    for (key, node) in tree {
        let converted = match node {
            Node::Tree(nested) => Some(TomlValue::Table(tree_to_table(nested)?)),
            Node::Value(value) => to_toml(key, value)?,
        };
        match converted {
            Some(value) => {
                table.insert(key.clone(), value);
            }
            None => debug!(%key, "skipping null entry, TOML has no null"),
        }
    }
    Ok(table)
}

/// Returns `None` for values TOML cannot hold in a table (null).
fn to_toml(key: &str, value: &Value) -> Result<Option<TomlValue>, ConfigError> {
    let converted = match value {
        Value::Null => return Ok(None),
        Value::Bool(b) => TomlValue::Boolean(*b),
        Value::Int(i) => TomlValue::Integer(*i),
        Value::Float(f) => TomlValue::Float(*f),
        Value::String(s) => TomlValue::String(s.clone()),
        Value::List(items) => {
            let mut array = Vec::with_capacity(items.len());
            for item in items {
                let converted = to_toml(key, item)?.ok_or_else(|| {
                    ConfigError::serialize(Format::Toml, format!("null inside array '{key}'"))
                })?;
                array.push(converted);
            }
            TomlValue::Array(array)
        }
        Value::Map(entries) => {
            let mut table = Table::new();
            for (k, v) in entries {
                if let Some(converted) = to_toml(k, v)? {
                    table.insert(k.clone(), converted);
                }
            }
            TomlValue::Table(table)
        }
        Value::Opaque(opaque) => {
            return Err(ConfigError::serialize(
                Format::Toml,
                format!("'{key}' holds a `{}`, which is not serializable", opaque.type_name()),
            ))
        }
    };
    Ok(Some(converted))
}

fn table_to_mapping(table: Table) -> IndexMap<String, Value> {
    table
        .into_iter()
        .map(|(key, value)| (key, from_toml(value)))
        .collect()
}

fn from_toml(value: TomlValue) -> Value {
    match value {
        TomlValue::String(s) => Value::String(s),
        TomlValue::Integer(i) => Value::Int(i),
        TomlValue::Float(f) => Value::Float(f),
        TomlValue::Boolean(b) => Value::Bool(b),
        TomlValue::Datetime(dt) => Value::String(dt.to_string()),
        TomlValue::Array(items) => Value::List(items.into_iter().map(from_toml).collect()),
        TomlValue::Table(table) => Value::Map(table_to_mapping(table)),
    }
}
