//! Dynamic values flowing through the injector.
//!
//! Constructor and function bodies receive their arguments as [`Value`]s
//! bundled in [`Args`], and produce either a [`Value`] or an [`Instance`].
//! Objects are type-erased [`Instance`] handles; everything else is plain
//! data as it would appear in configuration.

use std::any::{Any, type_name};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::de::{Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

use crate::error::{InjectorError, Result};
use crate::invoker::Invokable;
use crate::key::TypeName;

/// A built object: its runtime class name plus the type-erased value.
///
/// Cloning is cheap and keeps identity; use [`Instance::ptr_eq`] to check
/// whether two handles point at the same object.
#[derive(Clone)]
pub struct Instance {
    class: TypeName,
    object: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    /// Wraps `object` as an instance of `class`.
    pub fn new<T: Any + Send + Sync>(class: impl Into<TypeName>, object: T) -> Self {
        Self {
            class: class.into(),
            object: Arc::new(object),
        }
    }

    /// Wraps an already shared object.
    pub fn from_arc<T: Any + Send + Sync>(class: impl Into<TypeName>, object: Arc<T>) -> Self {
        Self {
            class: class.into(),
            object,
        }
    }

    /// The runtime class of this instance.
    #[inline]
    pub fn class(&self) -> &TypeName {
        &self.class
    }

    /// Returns a typed handle if the object is a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.object).downcast::<T>().ok()
    }

    /// Borrows the object as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }

    /// Returns `true` if both handles refer to the same object.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({} @ {:p})", self.class, Arc::as_ptr(&self.object))
    }
}

/// A dynamically typed value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// A built object.
    Object(Instance),
    /// Something that can be turned into an executable.
    Invokable(Invokable),
    /// A type name to build, as opposed to a string to pass verbatim.
    Injection(String),
}

impl Value {
    /// Short name of the value's kind, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::Invokable(_) => "invokable",
            Value::Injection(_) => "injection",
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Converts into `T`, reporting the mismatch on failure.
    pub fn into_typed<T: FromValue>(self) -> std::result::Result<T, ValueError> {
        T::from_value(self)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Injection(a), Value::Injection(b)) => TypeName::new(a) == TypeName::new(b),
            _ => false,
        }
    }
}

macro_rules! value_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Int(i64::from(value))
                }
            }
        )*
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

/// Wider integers saturate at `i64::MAX`.
macro_rules! value_from_wide_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Int(i64::try_from(value).unwrap_or(i64::MAX))
                }
            }
        )*
    };
}

value_from_wide_int!(u64, usize, isize);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Instance> for Value {
    fn from(value: Instance) -> Self {
        Value::Object(value)
    }
}

impl From<Invokable> for Value {
    fn from(value: Invokable) -> Self {
        Value::Invokable(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Value::Map(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// A value did not have the shape a conversion expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueError {
    pub expected: String,
    pub found: &'static str,
}

impl ValueError {
    fn new(expected: impl Into<String>, found: &Value) -> Self {
        Self {
            expected: expected.into(),
            found: found.type_name(),
        }
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {}, found {}", self.expected, self.found)
    }
}

impl std::error::Error for ValueError {}

/// Conversion out of a dynamic [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: Value) -> std::result::Result<Self, ValueError>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> std::result::Result<Self, ValueError> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> std::result::Result<Self, ValueError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(ValueError::new("bool", &other)),
        }
    }
}

macro_rules! int_from_value {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> std::result::Result<Self, ValueError> {
                    match value {
                        Value::Int(i) => <$ty>::try_from(i)
                            .map_err(|_| ValueError::new(stringify!($ty), &Value::Int(i))),
                        other => Err(ValueError::new(stringify!($ty), &other)),
                    }
                }
            }
        )*
    };
}

int_from_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: Value) -> std::result::Result<Self, ValueError> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            other => Err(ValueError::new("float", &other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> std::result::Result<Self, ValueError> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> std::result::Result<Self, ValueError> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(ValueError::new("string", &other)),
        }
    }
}

impl FromValue for Instance {
    fn from_value(value: Value) -> std::result::Result<Self, ValueError> {
        match value {
            Value::Object(instance) => Ok(instance),
            other => Err(ValueError::new("object", &other)),
        }
    }
}

impl FromValue for Invokable {
    fn from_value(value: Value) -> std::result::Result<Self, ValueError> {
        Invokable::try_from(value).map_err(|found| ValueError::new("invokable", &found))
    }
}

impl<T: Any + Send + Sync> FromValue for Arc<T> {
    fn from_value(value: Value) -> std::result::Result<Self, ValueError> {
        match value {
            Value::Object(instance) => instance
                .downcast::<T>()
                .ok_or_else(|| ValueError {
                    expected: type_name::<T>().to_string(),
                    found: "object",
                }),
            other => Err(ValueError::new(type_name::<T>(), &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> std::result::Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> std::result::Result<Self, ValueError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(ValueError::new("list", &other)),
        }
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: Value) -> std::result::Result<Self, ValueError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(key, value)| T::from_value(value).map(|value| (key, value)))
                .collect(),
            other => Err(ValueError::new("map", &other)),
        }
    }
}

impl<T: FromValue> FromValue for HashMap<String, T> {
    fn from_value(value: Value) -> std::result::Result<Self, ValueError> {
        BTreeMap::<String, T>::from_value(value).map(|entries| entries.into_iter().collect())
    }
}

/// Positional arguments handed to a native body.
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: Vec<Value>,
}

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrows the value at `index`; missing positions read as null.
    pub fn value(&self, index: usize) -> &Value {
        const NULL: &Value = &Value::Null;
        self.values.get(index).unwrap_or(NULL)
    }

    /// Converts the value at `index` into `T`.
    ///
    /// # Errors
    /// [`InjectorError::InvalidArgument`] when the value has another shape.
    pub fn get<T: FromValue>(&self, index: usize) -> Result<T> {
        T::from_value(self.value(index).clone()).map_err(|source| {
            InjectorError::InvalidArgument {
                position: index,
                source,
            }
        })
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

// Config trees read from serde formats arrive as plain data.
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("any configuration value")
            }

            fn visit_bool<E>(self, v: bool) -> std::result::Result<Value, E> {
                Ok(Value::Bool(v))
            }

            fn visit_i64<E>(self, v: i64) -> std::result::Result<Value, E> {
                Ok(Value::Int(v))
            }

            fn visit_u64<E>(self, v: u64) -> std::result::Result<Value, E> {
                Ok(i64::try_from(v).map_or(Value::Float(v as f64), Value::Int))
            }

            fn visit_f64<E>(self, v: f64) -> std::result::Result<Value, E> {
                Ok(Value::Float(v))
            }

            fn visit_str<E>(self, v: &str) -> std::result::Result<Value, E> {
                Ok(Value::Str(v.to_string()))
            }

            fn visit_string<E>(self, v: String) -> std::result::Result<Value, E> {
                Ok(Value::Str(v))
            }

            fn visit_unit<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> std::result::Result<Value, D::Error> {
                Value::deserialize(d)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Value, A::Error> {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Value::List(items))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Value, A::Error> {
                let mut entries = BTreeMap::new();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    entries.insert(key, value);
                }
                Ok(Value::Map(entries))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
