//! XML files.
//!
//! The tree is wrapped in one root element named after its group (or
//! `config`). Lists are written as repeated sibling elements, null as a
//! self-closing element and an empty string as an open/close pair with
//! nothing inside. Empty maps and lists have no children to show their shape,
//! so they are written self-closing with a `type` attribute. On read the root
//! element is unwrapped, repeated siblings become lists and text is coerced
//! to scalars.

use std::fmt::Display;

use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::coerce::coerce_scalar;
use super::{top_level, Format};
use crate::tree::{ConfigTree, Node, Value};
use crate::ConfigError;

const DEFAULT_ROOT: &str = "config";
const TYPE_ATTR: &str = "type";

fn write_error(e: impl Display) -> ConfigError {
    ConfigError::serialize(Format::Xml, e)
}

fn read_error(e: impl Display) -> ConfigError {
    ConfigError::parse(Format::Xml, e)
}

pub(super) fn encode(tree: &ConfigTree) -> Result<String, ConfigError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(write_error)?;

    let root = tree.group().unwrap_or(DEFAULT_ROOT);
    write_tree(&mut writer, root, tree, true)?;

    String::from_utf8(writer.into_inner()).map_err(write_error)
}

/// Element names must start with a letter or `_` and may go on with
/// letters, digits, `_`, `-` and `.`.
fn check_name(name: &str) -> Result<(), ConfigError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(write_error(format!("'{name}' is not a valid XML element name")))
    }
}

fn write_typed_empty(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    kind: &str,
) -> Result<(), ConfigError> {
    let mut start = BytesStart::new(name);
    start.push_attribute((TYPE_ATTR, kind));
    writer.write_event(Event::Empty(start)).map_err(write_error)
}

fn write_tree(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    tree: &ConfigTree,
    is_root: bool,
) -> Result<(), ConfigError> {
    check_name(name)?;
    if tree.is_empty() && !is_root {
        return write_typed_empty(writer, name, "map");
    }
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(write_error)?;
    for (key, node) in tree {
        match node {
            Node::Tree(nested) => write_tree(writer, key, nested, false)?,
            Node::Value(value) => write_value(writer, key, value, false)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(write_error)
}

fn write_value(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    value: &Value,
    in_list: bool,
) -> Result<(), ConfigError> {
    check_name(name)?;
    match value {
        Value::Null => writer
            .write_event(Event::Empty(BytesStart::new(name)))
            .map_err(write_error),
        Value::List(_) if in_list => Err(write_error(format!(
            "'{name}' is a nested list, which has no XML form"
        ))),
        Value::List(items) if items.is_empty() => write_typed_empty(writer, name, "list"),
        Value::List(items) => {
            for item in items {
                write_value(writer, name, item, true)?;
            }
            Ok(())
        }
        Value::Map(entries) if entries.is_empty() => write_typed_empty(writer, name, "map"),
        Value::Map(entries) => {
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(write_error)?;
            for (key, entry) in entries {
                write_value(writer, key, entry, false)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(write_error)
        }
        Value::Opaque(opaque) => Err(write_error(format!(
            "'{name}' holds a `{}`, which is not serializable",
            opaque.type_name()
        ))),
        scalar => {
            let text = scalar.to_scalar_string().unwrap_or_default();
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(write_error)?;
            writer
                .write_event(Event::Text(BytesText::new(&text)))
                .map_err(write_error)?;
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(write_error)
        }
    }
}

/// An element whose end tag has not been read yet.
struct Frame {
    name: String,
    children: IndexMap<String, Value>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            children: IndexMap::new(),
            text: String::new(),
        }
    }

    /// An open/close pair with nothing inside is the empty string.
    fn into_value(self) -> Value {
        if !self.children.is_empty() {
            Value::Map(self.children)
        } else if self.text.is_empty() {
            Value::String(String::new())
        } else {
            coerce_scalar(&self.text)
        }
    }

    /// Adds a child element; repeated names collect into a list.
    fn push_child(&mut self, name: String, value: Value) {
        match self.children.get_mut(&name) {
            Some(Value::List(items)) => items.push(value),
            Some(existing) => {
                let first = std::mem::take(existing);
                *existing = Value::List(vec![first, value]);
            }
            None => {
                self.children.insert(name, value);
            }
        }
    }
}

/// Value of a self-closing element: null unless it carries a `type`.
fn empty_value(start: &BytesStart<'_>) -> Result<Value, ConfigError> {
    let attr = start
        .try_get_attribute(TYPE_ATTR)
        .map_err(read_error)?;
    match attr.as_ref().map(|a| a.value.as_ref()) {
        None => Ok(Value::Null),
        Some(b"map") => Ok(Value::Map(IndexMap::new())),
        Some(b"list") => Ok(Value::List(Vec::new())),
        Some(other) => Err(read_error(format!(
            "unknown element type '{}'",
            String::from_utf8_lossy(other)
        ))),
    }
}

pub(super) fn decode(contents: &str) -> Result<IndexMap<String, Value>, ConfigError> {
    let mut reader = Reader::from_str(contents);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        match reader.read_event().map_err(read_error)? {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                stack.push(Frame::new(name));
            }
            Event::Empty(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                let value = empty_value(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.push_child(name, value),
                    None => root = Some(value),
                }
            }
            Event::Text(text) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text.unescape().map_err(read_error)?);
                }
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(_) => {
                let Some(frame) = stack.pop() else {
                    return Err(read_error("unexpected closing tag"));
                };
                let name = frame.name.clone();
                match stack.last_mut() {
                    Some(parent) => parent.push_child(name, frame.into_value()),
                    None if frame.children.is_empty() && frame.text.is_empty() => {
                        root = Some(Value::Map(IndexMap::new()));
                    }
                    None => root = Some(frame.into_value()),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(read_error("unexpected end of document"));
    }
    top_level(Format::Xml, root.unwrap_or(Value::Null))
}
