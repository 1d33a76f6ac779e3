//! Leaf values stored in a [`ConfigTree`](super::ConfigTree).

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FieldError;

/// A configuration value.
///
/// Everything a file format can express, plus [`Value::Opaque`] for host
/// values that have no serialized form.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    Opaque(Opaque),
}

/// The kind of a [`Value`], used by [`ConfigTree::retain_kinds`](super::ConfigTree::retain_kinds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    List,
    Map,
    Opaque,
    /// Matches every value.
    Any,
}

/// Kinds every serializer in this crate can write.
pub const JSON_SERIALIZABLE: &[ValueKind] = &[
    ValueKind::Bool,
    ValueKind::Int,
    ValueKind::Float,
    ValueKind::String,
    ValueKind::Map,
    ValueKind::List,
    ValueKind::Null,
];

impl ValueKind {
    /// Returns true if `value` is of this kind.
    pub fn matches(self, value: &Value) -> bool {
        self == ValueKind::Any || self == value.kind()
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Opaque(_) => ValueKind::Opaque,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Renders a scalar the way it appears in text formats.
    ///
    /// Returns `None` for lists, maps and opaque values.
    pub fn to_scalar_string(&self) -> Option<String> {
        match self {
            Value::Null => Some(String::new()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            // debug formatting keeps the fraction, so "1.0" reads back as a float
            Value::Float(f) => Some(format!("{f:?}")),
            Value::String(s) => Some(s.clone()),
            Value::List(_) | Value::Map(_) | Value::Opaque(_) => None,
        }
    }
}

/// A host value with no serialized form.
///
/// Cloning shares the payload; two opaque values are equal only when they
/// point at the same payload.
#[derive(Clone)]
pub struct Opaque {
    type_name: &'static str,
    payload: Rc<dyn Any>,
}

impl Opaque {
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            payload: Rc::new(value),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.payload, &other.payload)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque({})", self.type_name)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Value::Opaque(opaque) => Err(ser::Error::custom(format!(
                "value of type `{}` is not serializable",
                opaque.type_name()
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a configuration value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(i64::try_from(v).map_or(Value::Float(v as f64), Value::Int))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut entries = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            entries.insert(key, value);
        }
        Ok(Value::Map(entries))
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => String,
    &str => String,
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<Opaque> for Value {
    fn from(opaque: Opaque) -> Self {
        Value::Opaque(opaque)
    }
}

fn mismatch(expected: &'static str, value: &Value) -> FieldError {
    FieldError::TypeMismatch {
        expected,
        found: value.kind(),
    }
}

impl TryFrom<Value> for bool {
    type Error = FieldError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::String(ref s) if s.eq_ignore_ascii_case("true") => Ok(true),
            Value::String(ref s) if s.eq_ignore_ascii_case("false") => Ok(false),
            other => Err(mismatch("bool", &other)),
        }
    }
}

macro_rules! int_try_from {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<Value> for $ty {
                type Error = FieldError;

                fn try_from(value: Value) -> Result<Self, Self::Error> {
                    let wide = match &value {
                        Value::Int(i) => Some(*i),
                        Value::String(s) => s.trim().parse::<i64>().ok(),
                        _ => None,
                    };
                    wide.and_then(|i| <$ty>::try_from(i).ok())
                        .ok_or_else(|| mismatch(stringify!($ty), &value))
                }
            }
        )*
    };
}

int_try_from!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

macro_rules! float_try_from {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<Value> for $ty {
                type Error = FieldError;

                fn try_from(value: Value) -> Result<Self, Self::Error> {
                    match &value {
                        Value::Float(f) => Ok(*f as $ty),
                        Value::Int(i) => Ok(*i as $ty),
                        Value::String(s) => s
                            .trim()
                            .parse::<$ty>()
                            .map_err(|_| mismatch(stringify!($ty), &value)),
                        _ => Err(mismatch(stringify!($ty), &value)),
                    }
                }
            }
        )*
    };
}

float_try_from!(f32, f64);

/// Strings accept any scalar; text formats hand back `"8080"` as readily as `8080`.
/// Null reads as the empty string, since INI cannot tell the two apart.
impl TryFrom<Value> for String {
    type Error = FieldError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(s),
            Value::Null => Ok(String::new()),
            other => other
                .to_scalar_string()
                .ok_or_else(|| mismatch("string", &other)),
        }
    }
}

impl<T: TryFrom<Value, Error = FieldError>> TryFrom<Value> for Vec<T> {
    type Error = FieldError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::List(items) => items.into_iter().map(T::try_from).collect(),
            other => Err(mismatch("list", &other)),
        }
    }
}

impl<T: TryFrom<Value, Error = FieldError>> TryFrom<Value> for Option<T> {
    type Error = FieldError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(None),
            other => T::try_from(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_any_matches_everything() {
        assert!(ValueKind::Any.matches(&Value::Null));
        assert!(ValueKind::Any.matches(&Value::Opaque(Opaque::new(()))));
        assert!(!ValueKind::Int.matches(&Value::Bool(true)));
    }

    #[test]
    fn test_opaque_equality_is_identity() {
        let a = Opaque::new(5u8);
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, Opaque::new(5u8));
        assert_eq!(a.downcast_ref::<u8>(), Some(&5));
    }

    #[test]
    fn test_conversions_from_text() {
        assert_eq!(u16::try_from(Value::from("8080")).unwrap(), 8080);
        assert!(bool::try_from(Value::from("TRUE")).unwrap());
        assert_eq!(f64::try_from(Value::Int(2)).unwrap(), 2.0);
        assert_eq!(String::try_from(Value::Int(7)).unwrap(), "7");
        assert_eq!(String::try_from(Value::Null).unwrap(), "");
    }

    #[test]
    fn test_conversion_mismatch() {
        let err = u8::try_from(Value::Int(300)).unwrap_err();
        assert!(matches!(
            err,
            FieldError::TypeMismatch { expected: "u8", found: ValueKind::Int }
        ));
        assert!(String::try_from(Value::List(vec![])).is_err());
    }

    #[test]
    fn test_option_and_vec() {
        let none: Option<i32> = Value::Null.try_into().unwrap();
        assert_eq!(none, None);
        let list: Vec<i64> = Value::from(vec![1, 2, 3]).try_into().unwrap();
        assert_eq!(list, vec![1, 2, 3]);
    }
}
