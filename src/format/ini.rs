//! INI-family files.
//!
//! Top-level scalars live in the general section; every nested tree becomes
//! a section named by its dotted path, so `{"Test": {"Sub": {"v": 1}}}` is
//! written as `[Test.Sub]` / `v=1`. Values are untyped text and are coerced
//! back to scalars on read. Null is written as an empty value, so an empty
//! value reads back as null.

use ::ini::Ini;
use indexmap::IndexMap;

use super::coerce::coerce_scalar;
use super::Format;
use crate::tree::{ConfigTree, Node, Value, PATH_SEPARATOR};
use crate::ConfigError;

pub(super) fn encode(tree: &ConfigTree) -> Result<String, ConfigError> {
    let mut ini = Ini::new();
    write_section(&mut ini, None, tree)?;

    let mut buf = Vec::new();
    ini.write_to(&mut buf)
        .map_err(|e| ConfigError::serialize(Format::Ini, e))?;
    String::from_utf8(buf).map_err(|e| ConfigError::serialize(Format::Ini, e))
}

fn write_section(
    ini: &mut Ini,
    section: Option<&str>,
    tree: &ConfigTree,
) -> Result<(), ConfigError> {
    for (key, node) in tree {
        if let Node::Value(value) = node {
            let text = value.to_scalar_string().ok_or_else(|| {
                ConfigError::serialize(
                    Format::Ini,
                    format!("'{key}' is a {:?}, INI only holds scalars", value.kind()),
                )
            })?;
            ini.with_section(section).set(key.as_str(), text);
        }
    }
    for (key, node) in tree {
        if let Node::Tree(nested) = node {
            let name = match section {
                Some(parent) => ConfigTree::path_join([parent, key.as_str()]),
                None => key.clone(),
            };
            write_section(ini, Some(&name), nested)?;
        }
    }
    Ok(())
}

pub(super) fn decode(contents: &str) -> Result<IndexMap<String, Value>, ConfigError> {
    let ini = Ini::load_from_str(contents).map_err(|e| ConfigError::parse(Format::Ini, e))?;

    let mut root = IndexMap::new();
    for (section, properties) in ini.iter() {
        let path: Vec<&str> = match section {
            Some(name) => name.split(PATH_SEPARATOR).collect(),
            None => Vec::new(),
        };
        for (key, value) in properties.iter() {
            insert_at(&mut root, &path, key.to_owned(), coerce_scalar(value));
        }
    }
    Ok(root)
}

fn insert_at(map: &mut IndexMap<String, Value>, section: &[&str], key: String, value: Value) {
    let Some((first, rest)) = section.split_first() else {
        map.insert(key, value);
        return;
    };
    let entry = map
        .entry((*first).to_owned())
        .or_insert_with(|| Value::Map(IndexMap::new()));
    if !matches!(entry, Value::Map(_)) {
        *entry = Value::Map(IndexMap::new());
    }
    if let Value::Map(nested) = entry {
        insert_at(nested, rest, key, value);
    }
}
