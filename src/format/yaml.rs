use indexmap::IndexMap;

use super::{top_level, Format};
use crate::tree::{ConfigTree, Value};
use crate::ConfigError;

pub(super) fn encode(tree: &ConfigTree) -> Result<String, ConfigError> {
    serde_yaml::to_string(tree).map_err(|e| ConfigError::serialize(Format::Yaml, e))
}

pub(super) fn decode(contents: &str) -> Result<IndexMap<String, Value>, ConfigError> {
    if contents.trim().is_empty() {
        return Ok(IndexMap::new());
    }
    let value: Value =
        serde_yaml::from_str(contents).map_err(|e| ConfigError::parse(Format::Yaml, e))?;
    top_level(Format::Yaml, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_types() {
        let mut tree = ConfigTree::new();
        tree.insert_path("app.name", "demo");
        tree.insert_path("app.ratio", 0.5);
        tree.insert_path("app.workers", 4);
        tree.insert_path("app.tags", vec!["a", "b"]);
        tree.insert_path("app.parent", Value::Null);

        let yaml = encode(&tree).unwrap();
        assert!(yaml.contains("workers: 4"));
        let decoded = ConfigTree::rebuild(decode(&yaml).unwrap(), None);
        assert_eq!(decoded, tree);
    }

    #[test]
    fn test_empty_document_is_empty_mapping() {
        assert!(decode("").unwrap().is_empty());
    }

    #[test]
    fn test_scalar_document_is_rejected() {
        assert!(matches!(
            decode("just a string"),
            Err(ConfigError::ParseError { format: Format::Yaml, .. })
        ));
    }
}
