//! Writing loaded trees back onto live objects.

use indexmap::IndexMap;
use tracing::warn;

use super::Group;
use crate::error::FieldError;
use crate::object::{Configurable, Field, Root};
use crate::tree::{ConfigTree, Node, Value};
use crate::ConfigError;

impl Group {
    /// Replaces the group tree with `raw` and applies it to `root`.
    ///
    /// A top-level key whose subtree matches an object in `root` is applied
    /// to that object. A plain value never replaces an object. Any other key
    /// overwrites the root entry; keys missing from `root` are logged and
    /// inserted.
    pub fn load_from_mapping(
        &mut self,
        raw: IndexMap<String, Value>,
        root: &mut Root,
    ) -> Result<(), ConfigError> {
        self.tree = self.rebuild_tree(raw);

        for (name, node) in &self.tree {
            let path = ConfigTree::path_join([self.name.as_str(), name]);
            let target = root.get(name).and_then(Field::as_object).cloned();
            match (target, node) {
                (Some(handle), Node::Tree(subtree)) => {
                    let mut object = handle
                        .try_borrow_mut()
                        .map_err(|_| ConfigError::CycleDetected(path.clone()))?;
                    self.apply_at(subtree, &mut *object, &path)?;
                }
                (Some(_), Node::Value(_)) => self.warn_kept_object(&path),
                (None, node) => {
                    if !root.contains_key(name) {
                        self.warn_missing(&path, "root");
                    }
                    root.insert(name.clone(), Field::Value(node.clone().into_value()));
                }
            }
        }
        Ok(())
    }

    /// Writes every value of `tree` onto `target`, recursing into nested
    /// objects.
    ///
    /// Missing attributes are logged and assigned anyway. A plain value over
    /// a nested object and an attribute the target refuses to create are
    /// logged and skipped; any other rejected assignment fails the call.
    pub fn apply(
        &self,
        tree: &ConfigTree,
        target: &mut dyn Configurable,
    ) -> Result<(), ConfigError> {
        let path = self.name.clone();
        self.apply_at(tree, target, &path)
    }

    fn apply_at(
        &self,
        tree: &ConfigTree,
        target: &mut dyn Configurable,
        path: &str,
    ) -> Result<(), ConfigError> {
        for (key, node) in tree {
            let key_path = ConfigTree::path_join([path, key.as_str()]);

            if let Some(Field::Object(child)) = target.get_field(key) {
                match node {
                    Node::Tree(subtree) => {
                        let mut child = child
                            .try_borrow_mut()
                            .map_err(|_| ConfigError::CycleDetected(key_path.clone()))?;
                        self.apply_at(subtree, &mut *child, &key_path)?;
                    }
                    Node::Value(_) => self.warn_kept_object(&key_path),
                }
                continue;
            }

            if !target.has_field(key) {
                self.warn_missing(&key_path, target.type_name());
            }
            match target.set_field(key, node.clone().into_value()) {
                Ok(()) => {}
                Err(FieldError::Unknown(_)) => {
                    warn!(
                        group = %self.name,
                        path = %key_path,
                        "target refused new attribute, skipping"
                    );
                }
                Err(source) => {
                    return Err(ConfigError::Field {
                        path: key_path,
                        source,
                    })
                }
            }
        }
        Ok(())
    }

    fn warn_kept_object(&self, path: &str) {
        warn!(
            group = %self.name,
            %path,
            "loaded a plain value where a nested object lives, keeping the object"
        );
    }
}
