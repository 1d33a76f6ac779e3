use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use super::{is_private, Group};
use crate::tree::ConfigTree;

/// Builder for a [`Group`] with a default file, a load-failure policy, or a
/// custom attribute exclusion rule.
///
/// ## Example
///
/// ```
/// use cfgtree::Group;
///
/// let group = Group::builder("app")
///     .with_file("config/app.toml")
///     .lenient(true)
///     .exclude_when(|name| name.starts_with("tmp_"))
///     .build();
/// assert_eq!(group.filepath().unwrap().to_str(), Some("config/app.toml"));
/// ```
#[derive(Debug)]
#[must_use = "builders do nothing until .build() is called"]
pub struct GroupBuilder {
    name: String,
    filepath: Option<PathBuf>,
    lenient: bool,
    exclude_attr: fn(&str) -> bool,
}

impl GroupBuilder {
    pub(super) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filepath: None,
            lenient: false,
            exclude_attr: is_private,
        }
    }

    /// Sets the file used by [`Group::save`] and [`Group::load`].
    ///
    /// The extension selects the format.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.filepath = Some(path.as_ref().to_path_buf());
        self
    }

    /// When lenient, [`Group::load`] logs a file that fails to load and
    /// overwrites it with the current tree instead of returning the error.
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Replaces the rule that skips attributes by name (default: a leading `_`).
    ///
    /// Names listed with [`Declare::include`](super::Declare::include) are
    /// never skipped by this rule.
    pub fn exclude_when(mut self, exclude: fn(&str) -> bool) -> Self {
        self.exclude_attr = exclude;
        self
    }

    pub fn build(self) -> Group {
        Group {
            tree: ConfigTree::for_group(&self.name),
            name: self.name,
            filepath: self.filepath,
            lenient: self.lenient,
            exclude_attr: self.exclude_attr,
            registered: IndexMap::new(),
        }
    }
}
