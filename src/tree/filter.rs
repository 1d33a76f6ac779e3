//! Removing entries that should not reach a serializer.

use super::{ConfigTree, Node, ValueKind};
use crate::ConfigError;

/// Which parts of an entry a removal predicate is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inspect {
    pub name: bool,
    pub value: bool,
}

impl Inspect {
    pub const NAME: Inspect = Inspect {
        name: true,
        value: false,
    };
    pub const VALUE: Inspect = Inspect {
        name: false,
        value: true,
    };
    pub const BOTH: Inspect = Inspect {
        name: true,
        value: true,
    };
    pub const NONE: Inspect = Inspect {
        name: false,
        value: false,
    };
}

impl ConfigTree {
    /// Returns a copy of the tree without the entries `remove` selects.
    ///
    /// `remove` receives the entry name and/or node, according to `inspect`;
    /// the axis that is not inspected is passed as `None`. Nested trees are
    /// filtered first and are then themselves offered to `remove`.
    ///
    /// Fails with [`ConfigError::NoFilterAxis`] when `inspect` selects
    /// nothing.
    pub fn remove_by<F>(&self, inspect: Inspect, remove: F) -> Result<ConfigTree, ConfigError>
    where
        F: FnMut(Option<&str>, Option<&Node>) -> bool,
    {
        let mut tree = self.copy_for(self.group());
        tree.remove_by_in_place(inspect, remove)?;
        Ok(tree)
    }

    /// In-place form of [`remove_by`](Self::remove_by).
    pub fn remove_by_in_place<F>(
        &mut self,
        inspect: Inspect,
        mut remove: F,
    ) -> Result<(), ConfigError>
    where
        F: FnMut(Option<&str>, Option<&Node>) -> bool,
    {
        if inspect == Inspect::NONE {
            return Err(ConfigError::NoFilterAxis);
        }
        self.remove_where(inspect, &mut remove);
        Ok(())
    }

    fn remove_where(
        &mut self,
        inspect: Inspect,
        remove: &mut dyn FnMut(Option<&str>, Option<&Node>) -> bool,
    ) {
        self.retain(|key, node| {
            if let Node::Tree(nested) = node {
                nested.remove_where(inspect, remove);
            }
            let name = inspect.name.then_some(key.as_str());
            let value = if inspect.value { Some(&*node) } else { None };
            !remove(name, value)
        });
    }

    /// Returns a copy of the tree keeping only leaves whose kind is in
    /// `allowed` and not in `disallowed`.
    ///
    /// Nested trees are always kept and filtered recursively.
    pub fn retain_kinds(&self, allowed: &[ValueKind], disallowed: &[ValueKind]) -> ConfigTree {
        let mut tree = self.copy_for(self.group());
        tree.retain_kinds_in_place(allowed, disallowed);
        tree
    }

    /// In-place form of [`retain_kinds`](Self::retain_kinds).
    pub fn retain_kinds_in_place(&mut self, allowed: &[ValueKind], disallowed: &[ValueKind]) {
        self.retain(|_, node| match node {
            Node::Tree(nested) => {
                nested.retain_kinds_in_place(allowed, disallowed);
                true
            }
            Node::Value(value) => {
                allowed.iter().any(|kind| kind.matches(value))
                    && !disallowed.iter().any(|kind| kind.matches(value))
            }
        });
    }
}
