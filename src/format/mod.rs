//! Format adapters: converting trees to and from config file contents.
//!
//! The file extension selects the adapter; there is no content sniffing.

#[cfg(any(feature = "ini", feature = "xml"))]
mod coerce;
mod file;
#[cfg(feature = "ini")]
mod ini;
#[cfg(feature = "json")]
mod json;
#[cfg(feature = "toml")]
mod toml;
#[cfg(feature = "xml")]
mod xml;
#[cfg(feature = "yaml")]
mod yaml;

pub use file::{read_config_file, write_config_file};

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;

use crate::tree::{ConfigTree, Value};
use crate::ConfigError;

/// A supported config file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Ini,
    Json,
    Yaml,
    Toml,
    Xml,
}

impl Format {
    pub const ALL: [Format; 5] = [
        Format::Ini,
        Format::Json,
        Format::Yaml,
        Format::Toml,
        Format::Xml,
    ];

    /// File extensions (without the dot) mapped to this format.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Format::Ini => &["ini", "cfg", "cg", "conf", "cnf", "properties"],
            Format::Json => &["json"],
            Format::Yaml => &["yaml", "yml"],
            Format::Toml => &["toml"],
            Format::Xml => &["xml"],
        }
    }

    /// Cargo feature that enables this format.
    pub fn feature(self) -> &'static str {
        match self {
            Format::Ini => "ini",
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Toml => "toml",
            Format::Xml => "xml",
        }
    }

    pub fn is_enabled(self) -> bool {
        match self {
            Format::Ini => cfg!(feature = "ini"),
            Format::Json => cfg!(feature = "json"),
            Format::Yaml => cfg!(feature = "yaml"),
            Format::Toml => cfg!(feature = "toml"),
            Format::Xml => cfg!(feature = "xml"),
        }
    }

    /// Looks up the format for an extension, with or without a leading dot.
    pub fn from_extension(ext: &str) -> Option<Format> {
        let ext = ext.strip_prefix('.').unwrap_or(ext).to_ascii_lowercase();
        Format::ALL
            .into_iter()
            .find(|format| format.extensions().contains(&ext.as_str()))
    }

    /// Selects the format from a path's extension.
    pub fn from_path(path: &Path) -> Result<Format, ConfigError> {
        let ext = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();
        Format::from_extension(&ext).ok_or_else(|| {
            ConfigError::UnsupportedFormat(if ext.is_empty() {
                ext
            } else {
                format!(".{ext}")
            })
        })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Ini => "INI",
            Format::Json => "JSON",
            Format::Yaml => "YAML",
            Format::Toml => "TOML",
            Format::Xml => "XML",
        })
    }
}

/// Serializes a tree in the given format.
pub fn encode(format: Format, tree: &ConfigTree) -> Result<String, ConfigError> {
    match format {
        #[cfg(feature = "ini")]
        Format::Ini => self::ini::encode(tree),
        #[cfg(feature = "json")]
        Format::Json => self::json::encode(tree),
        #[cfg(feature = "yaml")]
        Format::Yaml => self::yaml::encode(tree),
        #[cfg(feature = "toml")]
        Format::Toml => self::toml::encode(tree),
        #[cfg(feature = "xml")]
        Format::Xml => self::xml::encode(tree),
        #[allow(unreachable_patterns)]
        disabled => Err(ConfigError::FormatNotEnabled(disabled)),
    }
}

/// Parses config contents into a raw nested mapping.
///
/// The result still needs [`ConfigTree::rebuild`] to become a tree.
pub fn decode(format: Format, contents: &str) -> Result<IndexMap<String, Value>, ConfigError> {
    match format {
        #[cfg(feature = "ini")]
        Format::Ini => self::ini::decode(contents),
        #[cfg(feature = "json")]
        Format::Json => self::json::decode(contents),
        #[cfg(feature = "yaml")]
        Format::Yaml => self::yaml::decode(contents),
        #[cfg(feature = "toml")]
        Format::Toml => self::toml::decode(contents),
        #[cfg(feature = "xml")]
        Format::Xml => self::xml::decode(contents),
        #[allow(unreachable_patterns)]
        disabled => Err(ConfigError::FormatNotEnabled(disabled)),
    }
}

/// Unwraps the top level of a parsed document, which must be a mapping.
///
/// An empty document counts as an empty mapping.
#[cfg(any(feature = "json", feature = "yaml", feature = "xml"))]
fn top_level(format: Format, value: Value) -> Result<IndexMap<String, Value>, ConfigError> {
    match value {
        Value::Map(entries) => Ok(entries),
        Value::Null => Ok(IndexMap::new()),
        other => Err(ConfigError::parse(
            format,
            format!("top level must be a mapping, found {:?}", other.kind()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_dispatch() {
        for (name, format) in [
            ("a.ini", Format::Ini),
            ("a.properties", Format::Ini),
            ("a.cnf", Format::Ini),
            ("a.json", Format::Json),
            ("a.yml", Format::Yaml),
            ("a.YAML", Format::Yaml),
            ("a.toml", Format::Toml),
            ("a.xml", Format::Xml),
        ] {
            assert_eq!(Format::from_path(Path::new(name)).unwrap(), format, "{name}");
        }
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            Format::from_path(Path::new("config.txt")),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == ".txt"
        ));
        assert!(matches!(
            Format::from_path(Path::new("config")),
            Err(ConfigError::UnsupportedFormat(ext)) if ext.is_empty()
        ));
    }

    #[test]
    fn test_disabled_formats_are_reported() {
        for format in Format::ALL {
            let result = encode(format, &ConfigTree::new());
            assert_eq!(
                matches!(result, Err(ConfigError::FormatNotEnabled(f)) if f == format),
                !format.is_enabled(),
                "{format}"
            );
        }
        assert_eq!(Format::from_extension(".JSON"), Some(Format::Json));
    }
}
