//! The ordered configuration tree.

mod filter;
mod value;

pub use filter::Inspect;
pub use value::{Opaque, Value, ValueKind, JSON_SERIALIZABLE};

use indexmap::map::{IntoIter, Iter};
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Separator between segments of a configuration path.
pub const PATH_SEPARATOR: char = '.';

/// A node of a [`ConfigTree`]: either a nested tree or a leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Tree(ConfigTree),
    Value(Value),
}

impl Node {
    pub fn as_tree(&self) -> Option<&ConfigTree> {
        match self {
            Node::Tree(tree) => Some(tree),
            Node::Value(_) => None,
        }
    }

    pub fn as_tree_mut(&mut self) -> Option<&mut ConfigTree> {
        match self {
            Node::Tree(tree) => Some(tree),
            Node::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Node::Value(value) => Some(value),
            Node::Tree(_) => None,
        }
    }

    /// Flattens the node into a plain value; nested trees become [`Value::Map`].
    pub fn into_value(self) -> Value {
        match self {
            Node::Value(value) => value,
            Node::Tree(tree) => Value::Map(tree.into_mapping()),
        }
    }
}

impl From<ConfigTree> for Node {
    fn from(tree: ConfigTree) -> Self {
        Node::Tree(tree)
    }
}

impl<T: Into<Value>> From<T> for Node {
    fn from(value: T) -> Self {
        Node::Value(value.into())
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Tree(tree) => tree.serialize(serializer),
            Node::Value(value) => value.serialize(serializer),
        }
    }
}

/// An ordered mapping from attribute name to [`Node`].
///
/// Keys are unique within a node and keep insertion order. A tree may be
/// tagged with the name of the group that produced it; the tag takes no part
/// in equality.
#[derive(Debug, Clone, Default)]
pub struct ConfigTree {
    entries: IndexMap<String, Node>,
    group: Option<String>,
}

impl PartialEq for ConfigTree {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl ConfigTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty tree tagged with a group name.
    pub fn for_group(group: impl Into<String>) -> Self {
        Self {
            entries: IndexMap::new(),
            group: Some(group.into()),
        }
    }

    /// Normalizes a raw parsed mapping into a tree: every nested
    /// [`Value::Map`] becomes a nested `ConfigTree`.
    pub fn rebuild(raw: IndexMap<String, Value>, group: Option<&str>) -> Self {
        let mut tree = Self {
            entries: IndexMap::with_capacity(raw.len()),
            group: group.map(str::to_owned),
        };
        for (key, value) in raw {
            let node = match value {
                Value::Map(nested) => Node::Tree(Self::rebuild(nested, group)),
                other => Node::Value(other),
            };
            tree.entries.insert(key, node);
        }
        tree
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Returns a copy of this tree tagged with another group.
    ///
    /// Nested trees are copied; leaf values share opaque payloads.
    pub fn copy_for(&self, group: Option<&str>) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|(key, node)| {
                let node = match node {
                    Node::Tree(tree) => Node::Tree(tree.copy_for(group)),
                    Node::Value(value) => Node::Value(value.clone()),
                };
                (key.clone(), node)
            })
            .collect();
        Self {
            entries,
            group: group.map(str::to_owned),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.entries.get_mut(key)
    }

    /// Returns the nested tree under `key`, if that entry is a tree.
    pub fn subtree(&self, key: &str) -> Option<&ConfigTree> {
        self.entries.get(key).and_then(Node::as_tree)
    }

    pub fn subtree_mut(&mut self, key: &str) -> Option<&mut ConfigTree> {
        self.entries.get_mut(key).and_then(Node::as_tree_mut)
    }

    /// Returns the leaf value under `key`, if that entry is a value.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).and_then(Node::as_value)
    }

    /// Inserts or replaces an entry, returning the previous node.
    ///
    /// A replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, node: impl Into<Node>) -> Option<Node> {
        self.entries.insert(key.into(), node.into())
    }

    /// Removes an entry, preserving the order of the others.
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.entries.shift_remove(key)
    }

    pub fn iter(&self) -> Iter<'_, String, Node> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn retain(&mut self, keep: impl FnMut(&String, &mut Node) -> bool) {
        self.entries.retain(keep);
    }

    /// Converts the tree into a plain nested mapping.
    pub fn into_mapping(self) -> IndexMap<String, Value> {
        self.entries
            .into_iter()
            .map(|(key, node)| (key, node.into_value()))
            .collect()
    }

    /// Joins path segments with [`PATH_SEPARATOR`].
    pub fn path_join<I, S>(segments: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = String::new();
        for segment in segments {
            if !path.is_empty() {
                path.push(PATH_SEPARATOR);
            }
            path.push_str(segment.as_ref());
        }
        path
    }

    pub fn path_split(path: &str) -> Vec<&str> {
        path.split(PATH_SEPARATOR).collect()
    }

    /// Looks up a node by dotted path relative to this tree.
    pub fn get_path(&self, path: &str) -> Option<&Node> {
        let segments = Self::path_split(path);
        let (last, parents) = segments.split_last()?;
        let mut current = self;
        for segment in parents {
            current = current.subtree(segment)?;
        }
        current.get(last)
    }

    pub fn get_path_mut(&mut self, path: &str) -> Option<&mut Node> {
        let segments = Self::path_split(path);
        let (last, parents) = segments.split_last()?;
        let mut current = self;
        for segment in parents {
            current = current.subtree_mut(segment)?;
        }
        current.get_mut(last)
    }

    /// Inserts a node at a dotted path, creating missing intermediate trees.
    ///
    /// An intermediate entry that holds a value is replaced by a tree.
    pub fn insert_path(&mut self, path: &str, node: impl Into<Node>) -> Option<Node> {
        let segments = Self::path_split(path);
        let (last, parents) = segments.split_last()?;
        let group = self.group.clone();
        let mut current = self;
        for segment in parents {
            if !matches!(current.entries.get(*segment), Some(Node::Tree(_))) {
                let fresh = ConfigTree {
                    entries: IndexMap::new(),
                    group: group.clone(),
                };
                current.entries.insert((*segment).to_owned(), Node::Tree(fresh));
            }
            current = match current.entries.get_mut(*segment) {
                Some(Node::Tree(tree)) => tree,
                _ => return None,
            };
        }
        current.insert(*last, node)
    }
}

impl<'a> IntoIterator for &'a ConfigTree {
    type Item = (&'a String, &'a Node);
    type IntoIter = Iter<'a, String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for ConfigTree {
    type Item = (String, Node);
    type IntoIter = IntoIter<String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, N: Into<Node>> FromIterator<(K, N)> for ConfigTree {
    fn from_iter<I: IntoIterator<Item = (K, N)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, node)| (key.into(), node.into()))
                .collect(),
            group: None,
        }
    }
}

impl std::ops::Index<&str> for ConfigTree {
    type Output = Node;

    fn index(&self, key: &str) -> &Node {
        match self.entries.get(key) {
            Some(node) => node,
            None => panic!("no entry `{key}` in config tree"),
        }
    }
}

impl std::ops::Index<&str> for Node {
    type Output = Node;

    fn index(&self, key: &str) -> &Node {
        match self {
            Node::Tree(tree) => &tree[key],
            Node::Value(_) => panic!("cannot index into a leaf value with `{key}`"),
        }
    }
}

impl Serialize for ConfigTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, node) in &self.entries {
            map.serialize_entry(key, node)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConfigTree {
        let sub: ConfigTree = [("default_value1_of_sub", "TestSub")].into_iter().collect();
        let mut test = ConfigTree::new();
        test.insert("TestSub", sub);
        test.insert("default_value1", "Test");
        [("Test", test)].into_iter().collect()
    }

    #[test]
    fn test_rebuild_nests_maps() {
        let mut inner = IndexMap::new();
        inner.insert("port".to_string(), Value::Int(80));
        let mut raw = IndexMap::new();
        raw.insert("server".to_string(), Value::Map(inner));
        raw.insert("debug".to_string(), Value::Bool(true));

        let tree = ConfigTree::rebuild(raw, Some("app"));
        assert_eq!(tree.group(), Some("app"));
        let server = tree.subtree("server").unwrap();
        assert_eq!(server.group(), Some("app"));
        assert_eq!(server.value("port"), Some(&Value::Int(80)));
        assert_eq!(tree.value("debug"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_into_mapping_then_rebuild_is_identity() {
        let tree = sample();
        let rebuilt = ConfigTree::rebuild(tree.clone().into_mapping(), None);
        assert_eq!(rebuilt, tree);
        assert_eq!(rebuilt.keys().collect::<Vec<_>>(), vec!["Test"]);
    }

    #[test]
    fn test_path_lookup() {
        let tree = sample();
        assert_eq!(
            tree.get_path("Test.TestSub.default_value1_of_sub"),
            Some(&Node::Value(Value::from("TestSub")))
        );
        assert!(tree.get_path("Test.missing").is_none());
        assert!(tree.get_path("Test.default_value1.deeper").is_none());
    }

    #[test]
    fn test_insert_path_creates_parents() {
        let mut tree = ConfigTree::for_group("g");
        tree.insert("leaf", 1);
        tree.insert_path("leaf.a.b", "x");
        assert_eq!(tree["leaf"]["a"]["b"], Node::from("x"));
        assert_eq!(tree.subtree("leaf").unwrap().group(), Some("g"));

        if let Some(Node::Value(v)) = tree.get_path_mut("leaf.a.b") {
            *v = Value::from("y");
        }
        assert_eq!(tree.get_path("leaf.a.b"), Some(&Node::from("y")));
    }

    #[test]
    fn test_path_join_split() {
        assert_eq!(ConfigTree::path_join(["group", "Test", "Sub"]), "group.Test.Sub");
        assert_eq!(ConfigTree::path_split("a.b"), vec!["a", "b"]);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut tree: ConfigTree = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        tree.remove("b");
        assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["a", "c"]);
    }
}
