//! The capability interface through which groups read and write live objects.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::FieldError;
use crate::tree::Value;

/// Shared reference to a live configurable object.
pub type Handle = Rc<RefCell<dyn Configurable>>;

/// The explicit top-level namespace passed to build and load calls.
pub type Root = IndexMap<String, Field>;

/// Wraps a value in a [`Handle`].
///
/// Keep a typed `Rc<RefCell<T>>` around instead when typed access is needed
/// later; cloning it into a `Handle` keeps the same identity.
pub fn handle<T: Configurable + 'static>(value: T) -> Handle {
    Rc::new(RefCell::new(value))
}

/// An attribute as seen through [`Configurable::get_field`].
#[derive(Clone)]
pub enum Field {
    Value(Value),
    Object(Handle),
}

impl Field {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Field::Value(value) => Some(value),
            Field::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&Handle> {
        match self {
            Field::Object(handle) => Some(handle),
            Field::Value(_) => None,
        }
    }
}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Field::Object(handle) => match handle.try_borrow() {
                Ok(object) => write!(f, "Object({})", object.type_name()),
                Err(_) => f.write_str("Object(<borrowed>)"),
            },
        }
    }
}

impl<T: Into<Value>> From<T> for Field {
    fn from(value: T) -> Self {
        Field::Value(value.into())
    }
}

/// Identity of a live object, derived from the address of its shared cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

impl ObjectId {
    pub fn of(handle: &Handle) -> Self {
        ObjectId(Rc::as_ptr(handle) as *const () as usize)
    }
}

/// Field-level access to an object whose attributes are configuration.
///
/// Implement it by hand, with [`impl_configurable!`](crate::impl_configurable),
/// or use [`Settings`] for a dynamic attribute bag.
pub trait Configurable {
    /// Name used in log output.
    fn type_name(&self) -> &str;

    /// Attribute names in the order a tree should list them.
    fn field_names(&self) -> Vec<String>;

    fn get_field(&self, name: &str) -> Option<Field>;

    /// Assigns a loaded value.
    ///
    /// Objects that cannot grow new attributes return [`FieldError::Unknown`]
    /// for names they do not have.
    fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldError>;

    fn has_field(&self, name: &str) -> bool {
        self.get_field(name).is_some()
    }
}

/// A dynamic configurable object: an ordered bag of named fields.
///
/// `set_field` creates missing fields and overwrites existing ones.
#[derive(Debug, Clone)]
pub struct Settings {
    name: String,
    fields: IndexMap<String, Field>,
}

impl Settings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Adds a field, replacing any previous one with the same name.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, field: impl Into<Field>) -> Self {
        self.fields.insert(name.into(), field.into());
        self
    }

    /// Adds a nested object field.
    #[must_use]
    pub fn with_object(mut self, name: impl Into<String>, object: Handle) -> Self {
        self.fields.insert(name.into(), Field::Object(object));
        self
    }

    pub fn set(&mut self, name: impl Into<String>, field: impl Into<Field>) {
        self.fields.insert(name.into(), field.into());
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Returns the plain value of a field, if it has one.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).and_then(Field::as_value)
    }
}

impl Configurable for Settings {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    fn get_field(&self, name: &str) -> Option<Field> {
        self.fields.get(name).cloned()
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldError> {
        self.fields.insert(name.to_owned(), Field::Value(value));
        Ok(())
    }

    fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}

/// Implements [`Configurable`] for a struct with a fixed set of fields.
///
/// Each listed field must be `Clone + Into<Value>` and `TryFrom<Value, Error = FieldError>`.
/// Unlisted names are rejected with [`FieldError::Unknown`].
///
/// ```
/// use cfgtree::{impl_configurable, Configurable, Value};
///
/// struct Server {
///     host: String,
///     port: u16,
/// }
///
/// impl_configurable!(Server { host, port });
///
/// let mut server = Server { host: "localhost".into(), port: 80 };
/// server.set_field("port", Value::Int(8080)).unwrap();
/// assert_eq!(server.port, 8080);
/// assert_eq!(server.field_names(), vec!["host", "port"]);
/// ```
#[macro_export]
macro_rules! impl_configurable {
    ($ty:ident { $($field:ident),* $(,)? }) => {
        impl $crate::Configurable for $ty {
            fn type_name(&self) -> &str {
                stringify!($ty)
            }

            fn field_names(&self) -> ::std::vec::Vec<::std::string::String> {
                ::std::vec![$(::std::string::String::from(stringify!($field))),*]
            }

            fn get_field(&self, name: &str) -> ::std::option::Option<$crate::Field> {
                match name {
                    $(stringify!($field) => ::std::option::Option::Some(
                        $crate::Field::Value(::std::convert::Into::into(
                            ::std::clone::Clone::clone(&self.$field),
                        )),
                    ),)*
                    _ => ::std::option::Option::None,
                }
            }

            fn set_field(
                &mut self,
                name: &str,
                value: $crate::Value,
            ) -> ::std::result::Result<(), $crate::FieldError> {
                match name {
                    $(stringify!($field) => {
                        self.$field = ::std::convert::TryFrom::try_from(value)?;
                        ::std::result::Result::Ok(())
                    })*
                    other => ::std::result::Result::Err(
                        $crate::FieldError::Unknown(::std::string::String::from(other)),
                    ),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Window {
        title: String,
        width: u32,
        maximized: bool,
    }

    crate::impl_configurable!(Window { title, width, maximized });

    #[test]
    fn test_object_id_matches_typed_and_dyn_handles() {
        let typed = Rc::new(RefCell::new(Settings::new("A")));
        let dynamic: Handle = typed.clone();
        assert_eq!(ObjectId::of(&dynamic), ObjectId::of(&dynamic.clone()));
        let other = handle(Settings::new("A"));
        assert_ne!(ObjectId::of(&dynamic), ObjectId::of(&other));
    }

    #[test]
    fn test_settings_create_or_overwrite() {
        let mut settings = Settings::new("App").with("debug", false);
        settings.set_field("debug", Value::Bool(true)).unwrap();
        settings.set_field("extra", Value::Int(3)).unwrap();
        assert_eq!(settings.value("debug"), Some(&Value::Bool(true)));
        assert_eq!(settings.field_names(), vec!["debug", "extra"]);
    }

    #[test]
    fn test_macro_get_and_set() {
        let mut window = Window {
            title: "main".into(),
            width: 640,
            maximized: false,
        };
        assert_eq!(window.type_name(), "Window");
        assert!(matches!(
            window.get_field("width"),
            Some(Field::Value(Value::Int(640)))
        ));
        window.set_field("width", Value::from("800")).unwrap();
        window.set_field("maximized", Value::Bool(true)).unwrap();
        window.set_field("title", Value::from("side")).unwrap();
        assert_eq!(window.width, 800);
        assert!(window.maximized);
        assert_eq!(window.title, "side");
    }

    #[test]
    fn test_macro_rejects_unknown_and_mismatched() {
        let mut window = Window {
            title: "main".into(),
            width: 640,
            maximized: false,
        };
        assert_eq!(
            window.set_field("height", Value::Int(1)),
            Err(FieldError::Unknown("height".into()))
        );
        assert!(matches!(
            window.set_field("width", Value::List(vec![])),
            Err(FieldError::TypeMismatch { .. })
        ));
        assert!(!window.has_field("height"));
    }
}
