//! Persistent configuration for live object graphs.
//!
//! Objects implementing [`Configurable`] are registered with a [`Group`],
//! which builds a [`ConfigTree`] from their fields, saves it in one of the
//! supported [`Format`]s and applies a loaded tree back onto the objects.

mod error;
pub mod format;
pub mod group;
mod object;
pub mod tree;

pub use error::{ConfigError, FieldError};
pub use format::Format;
pub use group::{Declaration, Declare, Group, GroupBuilder};
pub use object::{handle, Configurable, Field, Handle, ObjectId, Root, Settings};
pub use tree::{ConfigTree, Inspect, Node, Opaque, Value, ValueKind, JSON_SERIALIZABLE};
