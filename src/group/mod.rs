//! Groups: registries of configurable objects and their current tree.

mod apply;
mod build;
mod builder;
mod declaration;
mod persist;

pub use builder::GroupBuilder;
pub use declaration::{Declaration, Declare};

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::object::{Field, Handle, ObjectId, Root};
use crate::tree::{ConfigTree, Value, JSON_SERIALIZABLE};
use crate::ConfigError;

/// Default attribute exclusion rule: names starting with `_` are private.
pub fn is_private(name: &str) -> bool {
    name.starts_with('_')
}

/// A named registry of configurable objects.
///
/// The group remembers which objects were registered, builds a
/// [`ConfigTree`] from them, writes it to a file, and applies loaded trees
/// back onto the objects. The tree is replaced wholesale on every build or
/// load.
///
/// ## Example
///
/// ```no_run
/// use cfgtree::{handle, Field, Group, Root, Settings};
///
/// let mut group = Group::builder("app").with_file("app.json").build();
/// let server = group.add(handle(Settings::new("Server").with("port", 8080)));
///
/// let mut root = Root::new();
/// root.insert("Server".into(), Field::Object(server));
///
/// group.build_tree(&root)?;
/// group.load(&mut root)?;
/// # Ok::<(), cfgtree::ConfigError>(())
/// ```
#[derive(Debug)]
pub struct Group {
    name: String,
    filepath: Option<PathBuf>,
    lenient: bool,
    exclude_attr: fn(&str) -> bool,
    registered: IndexMap<ObjectId, Declaration>,
    tree: ConfigTree,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder(name).build()
    }

    /// Creates a builder for a group with non-default settings.
    pub fn builder(name: impl Into<String>) -> GroupBuilder {
        GroupBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The file used by [`save`](Self::save) and [`load`](Self::load).
    pub fn filepath(&self) -> Option<&Path> {
        self.filepath.as_deref()
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ConfigTree {
        &mut self.tree
    }

    pub fn set_tree(&mut self, tree: ConfigTree) {
        self.tree = tree;
    }

    /// Drops every leaf of the current tree that no format can write.
    pub fn retain_serializable(&mut self) {
        self.tree.retain_kinds_in_place(JSON_SERIALIZABLE, &[]);
    }

    /// Registers an object and hands it back.
    pub fn add(&mut self, handle: Handle) -> Handle {
        self.add_with(handle, Declare::new())
    }

    /// Registers an object with explicit options.
    ///
    /// Registering the same object again only fills options that were not
    /// set the first time.
    pub fn add_with(&mut self, handle: Handle, declare: Declare) -> Handle {
        let id = ObjectId::of(&handle);
        match self.registered.get_mut(&id) {
            Some(existing) if existing.refers_to(&handle) => {
                debug!(group = %self.name, "object already registered, merging options");
                existing.merge(declare);
            }
            _ => {
                debug!(
                    group = %self.name,
                    object = handle.borrow().type_name(),
                    "registering object"
                );
                self.registered
                    .insert(id, Declaration::new(&self.name, &handle, declare));
            }
        }
        handle
    }

    /// Registers an object, replacing any earlier record and enabling it.
    pub fn force_add(&mut self, handle: Handle, declare: Declare) -> Handle {
        let id = ObjectId::of(&handle);
        let mut declaration = Declaration::new(&self.name, &handle, declare);
        declaration.enabled = true;
        self.registered.insert(id, declaration);
        handle
    }

    /// Registers the root entry called `name`.
    ///
    /// Fails with [`ConfigError::NotConfigurable`] if the entry is a plain
    /// value. A missing entry is reported the same way.
    pub fn add_entry(&mut self, root: &Root, name: &str) -> Result<Handle, ConfigError> {
        match root.get(name) {
            Some(Field::Object(handle)) => Ok(self.add(handle.clone())),
            Some(Field::Value(_)) | None => Err(ConfigError::NotConfigurable(name.to_owned())),
        }
    }

    /// True if `handle` is registered here, enabled or not.
    pub fn is_registered(&self, handle: &Handle) -> bool {
        self.declaration(handle).is_some()
    }

    pub fn declaration(&self, handle: &Handle) -> Option<&Declaration> {
        self.registered
            .get(&ObjectId::of(handle))
            .filter(|declaration| declaration.refers_to(handle))
    }

    /// Includes or leaves out a registered object from future builds.
    ///
    /// Returns false if the object is not registered.
    pub fn set_enabled(&mut self, handle: &Handle, enabled: bool) -> bool {
        match self.registered.get_mut(&ObjectId::of(handle)) {
            Some(declaration) if declaration.refers_to(handle) => {
                declaration.enabled = enabled;
                true
            }
            _ => false,
        }
    }

    /// Iterates over the registration records in registration order.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.registered.values()
    }

    /// Forgets records whose objects have been dropped.
    pub fn prune(&mut self) -> usize {
        let before = self.registered.len();
        self.registered
            .retain(|_, declaration| declaration.object().is_some());
        before - self.registered.len()
    }

    /// Normalizes a raw parsed mapping into a tree tagged with this group.
    pub fn rebuild_tree(&self, raw: IndexMap<String, Value>) -> ConfigTree {
        ConfigTree::rebuild(raw, Some(&self.name))
    }

    fn is_member(&self, handle: &Handle) -> bool {
        self.declaration(handle)
            .is_some_and(|declaration| declaration.enabled)
    }

    fn warn_missing(&self, path: &str, object: &str) {
        warn!(group = %self.name, %path, object, "attribute not found, assigning anyway");
    }
}
