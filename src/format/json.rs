use indexmap::IndexMap;

use super::{top_level, Format};
use crate::tree::{ConfigTree, Value};
use crate::ConfigError;

pub(super) fn encode(tree: &ConfigTree) -> Result<String, ConfigError> {
    serde_json::to_string_pretty(tree).map_err(|e| ConfigError::serialize(Format::Json, e))
}

pub(super) fn decode(contents: &str) -> Result<IndexMap<String, Value>, ConfigError> {
    let value: Value =
        serde_json::from_str(contents).map_err(|e| ConfigError::parse(Format::Json, e))?;
    top_level(Format::Json, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Node, Opaque};

    #[test]
    fn test_encode_keeps_order_and_nesting() {
        let mut tree = ConfigTree::new();
        tree.insert_path("Test.TestSub.default_value1_of_sub", "TestSub");
        tree.insert_path("Test.default_value1", "Test");

        let json = encode(&tree).unwrap();
        let sub = json.find("TestSub").unwrap();
        let value = json.find("default_value1\"").unwrap();
        assert!(sub < value);

        let decoded = ConfigTree::rebuild(decode(&json).unwrap(), None);
        assert_eq!(decoded, tree);
    }

    #[test]
    fn test_opaque_values_do_not_serialize() {
        let tree: ConfigTree = [("object", Node::from(Opaque::new(())))].into_iter().collect();
        assert!(matches!(
            encode(&tree),
            Err(ConfigError::SerializeError { format: Format::Json, .. })
        ));
    }

    #[test]
    fn test_top_level_must_be_object() {
        assert!(matches!(
            decode("[1, 2]"),
            Err(ConfigError::ParseError { format: Format::Json, .. })
        ));
        assert!(decode("null").unwrap().is_empty());
    }

    #[test]
    fn test_large_unsigned_becomes_float() {
        let raw = decode(r#"{"big": 18446744073709551615, "small": 7}"#).unwrap();
        assert!(matches!(raw["big"], Value::Float(_)));
        assert_eq!(raw["small"], Value::Int(7));
    }
}
