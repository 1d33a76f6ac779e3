//! Walking registered objects into a [`ConfigTree`].

use std::collections::HashSet;

use tracing::debug;

use super::Group;
use crate::object::{Field, Handle, ObjectId, Root};
use crate::tree::{ConfigTree, Node, Opaque, Value, PATH_SEPARATOR};
use crate::ConfigError;

impl Group {
    /// Builds the group tree from the objects in `root`.
    ///
    /// Every root entry that is a registered, enabled object becomes a subtree
    /// under its root key. Registered objects not reachable from `root` that
    /// were declared with a fixed path are placed at that path. The previous
    /// tree is discarded.
    ///
    /// Object graphs that refer back to an object already being walked are
    /// rejected with [`ConfigError::CycleDetected`].
    pub fn build_tree(&mut self, root: &Root) -> Result<&ConfigTree, ConfigError> {
        let mut tree = ConfigTree::for_group(&self.name);
        let mut visited = HashSet::new();

        for (name, field) in root {
            let Field::Object(handle) = field else {
                continue;
            };
            if !self.is_member(handle) {
                continue;
            }
            let path = self.assign_path(handle, name, None);
            let local = self.walk(handle, &path, &mut Vec::new(), &mut visited)?;
            tree.insert(name.clone(), local);
        }

        self.place_unreached(&mut tree, &mut visited)?;
        self.tree = tree;
        Ok(&self.tree)
    }

    /// Builds the subtree of a single object.
    ///
    /// Returns `None` if the object is not a registered, enabled member of
    /// this group. The object keeps the path assigned by the last build; one
    /// that was never built gets `"{group}.{type name}"`.
    pub fn build_local_tree(&mut self, handle: &Handle) -> Result<Option<ConfigTree>, ConfigError> {
        if !self.is_member(handle) {
            return Ok(None);
        }
        let path = match self.declaration(handle).and_then(|d| d.path.clone()) {
            Some(path) => path,
            None => {
                let type_name = handle
                    .try_borrow()
                    .map_err(|_| ConfigError::CycleDetected(self.name.clone()))?
                    .type_name()
                    .to_owned();
                self.assign_path(handle, &type_name, None)
            }
        };
        let tree = self.walk(handle, &path, &mut Vec::new(), &mut HashSet::new())?;
        Ok(Some(tree))
    }

    /// Records the object's path for this build and returns it.
    fn assign_path(&mut self, handle: &Handle, attr: &str, parent: Option<&str>) -> String {
        let group = self.name.clone();
        let Some(declaration) = self.registered.get_mut(&ObjectId::of(handle)) else {
            return ConfigTree::path_join([parent.unwrap_or(&group), attr]);
        };
        if let Some(fixed) = &declaration.fixed_path {
            return fixed.clone();
        }
        let segment = declaration.name.as_deref().unwrap_or(attr);
        let path = ConfigTree::path_join([parent.unwrap_or(&group), segment]);
        debug!(%group, %path, "assigned config path");
        declaration.path = Some(path.clone());
        path
    }

    fn walk(
        &mut self,
        handle: &Handle,
        path: &str,
        stack: &mut Vec<ObjectId>,
        visited: &mut HashSet<ObjectId>,
    ) -> Result<ConfigTree, ConfigError> {
        let id = ObjectId::of(handle);
        if stack.contains(&id) {
            return Err(ConfigError::CycleDetected(path.to_owned()));
        }
        stack.push(id);
        visited.insert(id);

        let (include, exclude) = match self.registered.get(&id) {
            Some(declaration) => (declaration.include.clone(), declaration.exclude.clone()),
            None => (None, Vec::new()),
        };
        let object = handle
            .try_borrow()
            .map_err(|_| ConfigError::CycleDetected(path.to_owned()))?;
        let names = match &include {
            Some(names) => names.clone(),
            None => object.field_names(),
        };

        let mut tree = ConfigTree::for_group(&self.name);
        for attr in names {
            if exclude.contains(&attr) {
                continue;
            }
            if include.is_none() && (self.exclude_attr)(&attr) {
                continue;
            }
            let node = match object.get_field(&attr) {
                None => Node::Value(Value::Null),
                Some(Field::Value(value)) => Node::Value(value),
                Some(Field::Object(child)) if self.is_member(&child) => {
                    let child_path = self.assign_path(&child, &attr, Some(path));
                    Node::Tree(self.walk(&child, &child_path, stack, visited)?)
                }
                Some(Field::Object(child)) => Node::Value(Value::Opaque(Opaque::new(child))),
            };
            tree.insert(attr, node);
        }

        stack.pop();
        Ok(tree)
    }

    fn place_unreached(
        &mut self,
        tree: &mut ConfigTree,
        visited: &mut HashSet<ObjectId>,
    ) -> Result<(), ConfigError> {
        let mut pending = Vec::new();
        for (id, declaration) in &self.registered {
            if visited.contains(id) || !declaration.enabled {
                continue;
            }
            let Some(object) = declaration.object() else {
                continue;
            };
            match &declaration.fixed_path {
                Some(path) => pending.push((*id, object, path.clone())),
                None => debug!(
                    group = %self.name,
                    object = object.borrow().type_name(),
                    "registered object not reachable from root and has no fixed path"
                ),
            }
        }

        let prefix = format!("{}{}", self.name, PATH_SEPARATOR);
        for (id, object, path) in pending {
            if visited.contains(&id) {
                continue;
            }
            let local = self.walk(&object, &path, &mut Vec::new(), visited)?;
            let relative = path.strip_prefix(&prefix).unwrap_or(&path);
            debug!(group = %self.name, path = relative, "placing object at fixed path");
            tree.insert_path(relative, local);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::group::Declare;
    use crate::object::{handle, Settings};

    fn root_of(entries: &[(&str, &Handle)]) -> Root {
        entries
            .iter()
            .map(|(name, handle)| (name.to_string(), Field::Object((*handle).clone())))
            .collect()
    }

    #[test]
    fn test_init_config_tree() {
        let mut group = Group::new("test_group");
        let test_class = group.add(handle(
            Settings::new("TestClass")
                .with("default_value", "Default")
                .with("_private", 1),
        ));
        let mut root = root_of(&[("TestClass", &test_class)]);
        root.insert("plain".into(), Field::from(3));

        let tree = group.build_tree(&root).unwrap();
        assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["TestClass"]);
        let local = tree.subtree("TestClass").unwrap();
        assert_eq!(local.value("default_value"), Some(&Value::from("Default")));
        assert!(!local.contains_key("_private"));
        assert_eq!(
            group.declaration(&test_class).unwrap().path(),
            Some("test_group.TestClass")
        );
    }

    #[test]
    fn test_tree_walk_nested() {
        let mut group = Group::new("test_group");
        let sub_of_sub = group.add(handle(
            Settings::new("TestClassSubOfSub")
                .with("default_value_sub_of_sub", "DefaultInSubOfSub"),
        ));
        let sub = group.add(handle(
            Settings::new("TestClassSub")
                .with("default_value_sub", "DefaultInSub")
                .with_object("TestClassSubOfSub", sub_of_sub.clone()),
        ));
        let unregistered = handle(Settings::new("TestClassSubIgnore"));
        let test_class = group.add(handle(
            Settings::new("TestClass")
                .with("default_value", "Default")
                .with_object("TestClassSub", sub.clone())
                .with_object("TestClassSubIgnore", unregistered),
        ));

        let tree = group
            .build_tree(&root_of(&[("TestClass", &test_class)]))
            .unwrap()
            .clone();
        assert_eq!(
            tree.get_path("TestClass.TestClassSub.default_value_sub"),
            Some(&Node::from("DefaultInSub"))
        );
        assert_eq!(
            tree.get_path("TestClass.TestClassSub.TestClassSubOfSub.default_value_sub_of_sub"),
            Some(&Node::from("DefaultInSubOfSub"))
        );
        assert!(matches!(
            tree.get_path("TestClass.TestClassSubIgnore"),
            Some(Node::Value(Value::Opaque(_)))
        ));
        assert_eq!(
            group.declaration(&sub_of_sub).unwrap().path(),
            Some("test_group.TestClass.TestClassSub.TestClassSubOfSub")
        );
    }

    #[test]
    fn test_build_replaces_previous_tree() {
        let mut group = Group::new("g");
        let a = group.add(handle(Settings::new("A").with("x", 1)));
        let b = group.add(handle(Settings::new("B").with("y", 2)));
        group.build_tree(&root_of(&[("A", &a)])).unwrap();
        let tree = group.build_tree(&root_of(&[("B", &b)])).unwrap();
        assert!(!tree.contains_key("A"));
        assert!(tree.contains_key("B"));
    }

    #[test]
    fn test_include_and_exclude_lists() {
        let mut group = Group::new("g");
        let object = group.add_with(
            handle(
                Settings::new("A")
                    .with("a", 1)
                    .with("b", 2)
                    .with("_c", 3),
            ),
            Declare::new().include(["_c", "a", "missing"]).exclude(["a"]),
        );
        let tree = group.build_tree(&root_of(&[("A", &object)])).unwrap();
        let local = tree.subtree("A").unwrap();
        assert_eq!(local.keys().collect::<Vec<_>>(), vec!["_c", "missing"]);
        assert_eq!(local.value("missing"), Some(&Value::Null));
    }

    #[test]
    fn test_disabled_objects_are_skipped() {
        let mut group = Group::new("g");
        let child = group.add_with(
            handle(Settings::new("Child").with("v", 1)),
            Declare::new().disabled(),
        );
        let parent = group.add(handle(Settings::new("Parent").with_object("Child", child.clone())));
        let tree = group
            .build_tree(&root_of(&[("Parent", &parent), ("Child", &child)]))
            .unwrap();
        assert!(!tree.contains_key("Child"));
        assert!(matches!(
            tree.get_path("Parent.Child"),
            Some(Node::Value(Value::Opaque(_)))
        ));
    }

    #[test]
    fn test_objects_from_other_groups_are_not_walked() {
        let mut first = Group::new("first");
        let mut second = Group::new("second");
        let foreign = second.add(handle(Settings::new("Foreign").with("v", 1)));
        let own = first.add(handle(Settings::new("Own").with_object("Foreign", foreign.clone())));
        let root = root_of(&[("Own", &own), ("Foreign", &foreign)]);

        let tree = first.build_tree(&root).unwrap();
        assert!(!tree.contains_key("Foreign"));
        assert!(tree.subtree("Own").unwrap().subtree("Foreign").is_none());
    }

    #[test]
    fn test_explicit_name_changes_path_not_key() {
        let mut group = Group::new("g");
        let object = group.add_with(handle(Settings::new("A")), Declare::new().name("renamed"));
        let tree = group.build_tree(&root_of(&[("A", &object)])).unwrap();
        assert!(tree.contains_key("A"));
        assert_eq!(group.declaration(&object).unwrap().path(), Some("g.renamed"));
    }

    #[test]
    fn test_unreached_object_with_fixed_path_is_placed() {
        let mut group = Group::new("g");
        let detached = group.add_with(
            handle(Settings::new("Detached").with("v", 7)),
            Declare::new().path("g.Section.Detached"),
        );
        let tree = group.build_tree(&Root::new()).unwrap();
        assert_eq!(tree.get_path("Section.Detached.v"), Some(&Node::from(7)));
        assert_eq!(group.declaration(&detached).unwrap().path(), Some("g.Section.Detached"));
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut group = Group::new("g");
        let a = Rc::new(RefCell::new(Settings::new("A")));
        let a_handle: Handle = a.clone();
        group.add(a_handle.clone());
        let b = group.add(handle(Settings::new("B").with_object("A", a_handle.clone())));
        a.borrow_mut().set("B", Field::Object(b));

        let result = group.build_tree(&root_of(&[("A", &a_handle)]));
        assert!(matches!(
            result,
            Err(ConfigError::CycleDetected(path)) if path == "g.A.B.A"
        ));
    }

    #[test]
    fn test_shared_object_is_not_a_cycle() {
        let mut group = Group::new("g");
        let shared = group.add(handle(Settings::new("Shared").with("v", 1)));
        let parent = group.add(handle(
            Settings::new("Parent")
                .with_object("left", shared.clone())
                .with_object("right", shared.clone()),
        ));
        let tree = group.build_tree(&root_of(&[("Parent", &parent)])).unwrap();
        assert_eq!(tree.get_path("Parent.left.v"), Some(&Node::from(1)));
        assert_eq!(tree.get_path("Parent.right.v"), Some(&Node::from(1)));
    }

    #[test]
    fn test_build_local_tree() {
        let mut group = Group::new("g");
        let object = group.add(handle(Settings::new("Local").with("v", 1)));
        let local = group.build_local_tree(&object).unwrap().unwrap();
        assert_eq!(local.value("v"), Some(&Value::Int(1)));
        assert_eq!(group.declaration(&object).unwrap().path(), Some("g.Local"));

        let stranger = handle(Settings::new("Stranger"));
        assert!(group.build_local_tree(&stranger).unwrap().is_none());
    }
}
