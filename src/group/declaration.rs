use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::object::{Configurable, Handle};

/// Registration options for [`Group::add_with`](super::Group::add_with).
///
/// ```
/// use cfgtree::{handle, Declare, Group, Settings};
///
/// let mut group = Group::new("app");
/// let window = group.add_with(
///     handle(Settings::new("Window").with("width", 640).with("_cache", 0)),
///     Declare::new().name("main_window").exclude(["width"]),
/// );
/// assert!(group.is_registered(&window));
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct Declare {
    pub(super) enabled: bool,
    pub(super) name: Option<String>,
    pub(super) path: Option<String>,
    pub(super) include: Option<Vec<String>>,
    pub(super) exclude: Vec<String>,
}

impl Default for Declare {
    fn default() -> Self {
        Self {
            enabled: true,
            name: None,
            path: None,
            include: None,
            exclude: Vec::new(),
        }
    }
}

impl Declare {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the object but leaves it out of built trees.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Overrides the path segment the object contributes.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Fixes the object's dotted path instead of deriving it while building.
    ///
    /// Objects with a fixed path that are not reachable from the root are
    /// placed in the tree at that path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Lists exactly which fields to serialize, in this order.
    ///
    /// Listed names bypass the group's name-based exclusion rule.
    pub fn include<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(names.into_iter().map(Into::into));
        self
    }
}

/// What a group records about one registered object.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub(super) group: String,
    pub(super) enabled: bool,
    pub(super) name: Option<String>,
    pub(super) fixed_path: Option<String>,
    pub(super) path: Option<String>,
    pub(super) include: Option<Vec<String>>,
    pub(super) exclude: Vec<String>,
    pub(super) object: Weak<RefCell<dyn Configurable>>,
}

impl Declaration {
    pub(super) fn new(group: &str, handle: &Handle, declare: Declare) -> Self {
        Self {
            group: group.to_owned(),
            enabled: declare.enabled,
            name: declare.name,
            path: declare.path.clone(),
            fixed_path: declare.path,
            include: declare.include,
            exclude: declare.exclude,
            object: Rc::downgrade(handle),
        }
    }

    /// Fills unset options from a repeated registration; earlier settings win.
    pub(super) fn merge(&mut self, declare: Declare) {
        if self.name.is_none() {
            self.name = declare.name;
        }
        if self.fixed_path.is_none() && declare.path.is_some() {
            self.path = declare.path.clone();
            self.fixed_path = declare.path;
        }
        if self.include.is_none() {
            self.include = declare.include;
        }
        for name in declare.exclude {
            if !self.exclude.contains(&name) {
                self.exclude.push(name);
            }
        }
    }

    /// Name of the owning group.
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The dotted path assigned by the last build, or the fixed one.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn include(&self) -> Option<&[String]> {
        self.include.as_deref()
    }

    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    /// Returns the live object, if it still exists.
    pub fn object(&self) -> Option<Handle> {
        self.object.upgrade()
    }

    /// True if this record still refers to `handle`'s object.
    pub(super) fn refers_to(&self, handle: &Handle) -> bool {
        self.object
            .upgrade()
            .is_some_and(|object| Rc::ptr_eq(&object, handle))
    }
}
