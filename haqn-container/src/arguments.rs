//! Parameter overrides for a single class or call.
//!
//! Configuration data encodes overrides with string-prefixed keys:
//!
//! | key          | meaning                                              |
//! |--------------|------------------------------------------------------|
//! | `0`, `1`, .. | positional value, injected as is                     |
//! | `name`       | build the type named by the value and inject it      |
//! | `:name`      | raw value, injected as is                            |
//! | `+name`      | call the value with the parameter name, inject result|
//! | `@name`      | `[type, {overrides}]`: build `type` with overrides   |
//!
//! [`Arguments::from_value`] parses that format; inside the injector each
//! kind is kept in its own map.

use std::collections::{BTreeMap, HashMap};

use crate::error::{InjectorError, Result};
use crate::invoker::Invokable;
use crate::value::Value;

pub const RAW_PREFIX: char = ':';
pub const DELEGATE_PREFIX: char = '+';
pub const DEFINE_PREFIX: char = '@';

/// A set of overrides for constructor or function parameters.
///
/// # Examples
/// ```
/// use haqn_container::{Arguments, Override};
///
/// let args = Arguments::new()
///     .raw("size", 128)
///     .named("logger", "App\\FileLogger");
///
/// assert!(matches!(args.lookup(0, "logger"), Some(Override::Named("App\\FileLogger"))));
/// assert!(matches!(args.lookup(1, "size"), Some(Override::Raw(_))));
/// assert!(args.lookup(2, "other").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    positional: BTreeMap<usize, Value>,
    named: HashMap<String, String>,
    raw: HashMap<String, Value>,
    delegates: HashMap<String, Invokable>,
    definitions: HashMap<String, (String, Arguments)>,
}

/// The override that applies to one parameter.
#[derive(Debug, Clone, Copy)]
pub enum Override<'a> {
    Positional(&'a Value),
    /// A type name to build.
    Named(&'a str),
    Raw(&'a Value),
    Delegate(&'a Invokable),
    /// A type name to build with its own overrides.
    Define(&'a str, &'a Arguments),
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Injects `value` at `position`.
    pub fn position(mut self, position: usize, value: impl Into<Value>) -> Self {
        self.positional.insert(position, value.into());
        self
    }

    /// Builds `class` for parameter `param`.
    pub fn named(mut self, param: impl Into<String>, class: impl Into<String>) -> Self {
        self.named.insert(param.into(), class.into());
        self
    }

    /// Injects `value` verbatim for parameter `param`.
    pub fn raw(mut self, param: impl Into<String>, value: impl Into<Value>) -> Self {
        self.raw.insert(param.into(), value.into());
        self
    }

    /// Calls `invokable` with the parameter name to produce the value.
    pub fn delegate(mut self, param: impl Into<String>, invokable: impl Into<Invokable>) -> Self {
        self.delegates.insert(param.into(), invokable.into());
        self
    }

    /// Builds `class` with its own `overrides` for parameter `param`.
    pub fn define(mut self, param: impl Into<String>, class: impl Into<String>, overrides: Arguments) -> Self {
        self.definitions.insert(param.into(), (class.into(), overrides));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty()
            && self.named.is_empty()
            && self.raw.is_empty()
            && self.delegates.is_empty()
            && self.definitions.is_empty()
    }

    /// Layers `overrides` on top of `self`; same-key entries of `overrides` win.
    pub fn merged(&self, overrides: &Arguments) -> Arguments {
        let mut merged = self.clone();
        merged.extend(overrides.clone());
        merged
    }

    fn extend(&mut self, other: Arguments) {
        self.positional.extend(other.positional);
        self.named.extend(other.named);
        self.raw.extend(other.raw);
        self.delegates.extend(other.delegates);
        self.definitions.extend(other.definitions);
    }

    /// Finds the override for a parameter, in precedence order: positional,
    /// named, raw, delegate, define.
    pub fn lookup(&self, position: usize, name: &str) -> Option<Override<'_>> {
        if let Some(value) = self.positional.get(&position) {
            return Some(Override::Positional(value));
        }
        if let Some(class) = self.named.get(name) {
            return Some(Override::Named(class));
        }
        if let Some(value) = self.raw.get(name) {
            return Some(Override::Raw(value));
        }
        if let Some(invokable) = self.delegates.get(name) {
            return Some(Override::Delegate(invokable));
        }
        self.definitions
            .get(name)
            .map(|(class, overrides)| Override::Define(class, overrides))
    }

    /// Parses the prefixed-key configuration format.
    ///
    /// A list is read as positional values; `null` is empty.
    ///
    /// # Errors
    /// [`InjectorError::ConfigInvalid`] for anything that does not fit.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::List(items) => Ok(items
                .iter()
                .enumerate()
                .fold(Self::new(), |args, (i, v)| args.position(i, v.clone()))),
            Value::Map(entries) => entries
                .iter()
                .try_fold(Self::new(), |args, (key, v)| args.parse_entry(key, v)),
            other => Err(InjectorError::ConfigInvalid(format!(
                "Argument definitions must be a map, received {}",
                other.type_name()
            ))),
        }
    }

    /// Parses a `param → value` map from configuration mappings.
    ///
    /// Bare keys are raw values unless the value is a
    /// [`Value::Injection`], which builds that type. Prefixed and numeric
    /// keys are read as in [`from_value`](Self::from_value).
    pub fn from_definitions(value: &Value) -> Result<Self> {
        let Value::Map(entries) = value else {
            return Self::from_value(value);
        };

        entries.iter().try_fold(Self::new(), |args, (key, v)| {
            let prefixed = key.starts_with([RAW_PREFIX, DELEGATE_PREFIX, DEFINE_PREFIX]);
            match v {
                _ if prefixed || key.parse::<usize>().is_ok() => args.parse_entry(key, v),
                Value::Injection(class) => Ok(args.named(key.as_str(), class.clone())),
                _ => Ok(args.raw(key.as_str(), v.clone())),
            }
        })
    }

    fn parse_entry(self, key: &str, value: &Value) -> Result<Self> {
        if let Ok(position) = key.parse::<usize>() {
            return Ok(self.position(position, value.clone()));
        }

        let mut chars = key.chars();
        let (prefix, param) = match chars.next() {
            Some(c @ (RAW_PREFIX | DELEGATE_PREFIX | DEFINE_PREFIX)) => (Some(c), chars.as_str()),
            _ => (None, key),
        };

        if param.is_empty() {
            return Err(InjectorError::ConfigInvalid(format!(
                "Argument definition key '{key}' does not name a parameter"
            )));
        }

        match prefix {
            Some(RAW_PREFIX) => Ok(self.raw(param, value.clone())),
            Some(DELEGATE_PREFIX) => {
                let invokable = Invokable::try_from(value.clone()).map_err(|found| {
                    InjectorError::ConfigInvalid(format!(
                        "Delegate for parameter '{param}' must be callable, received {}",
                        found.type_name()
                    ))
                })?;
                Ok(self.delegate(param, invokable))
            }
            Some(_) => {
                let (class, overrides) = parse_definition(param, value)?;
                Ok(self.define(param, class, overrides))
            }
            None => match value {
                Value::Str(class) | Value::Injection(class) => Ok(self.named(param, class.clone())),
                other => Err(InjectorError::ConfigInvalid(format!(
                    "Named argument '{param}' must be a type name, received {}; use ':{param}' for raw values",
                    other.type_name()
                ))),
            },
        }
    }
}

fn parse_definition(param: &str, value: &Value) -> Result<(String, Arguments)> {
    let invalid = || {
        InjectorError::ConfigInvalid(format!(
            "Definition for parameter '{param}' must be [type, overrides], received {}",
            value.type_name()
        ))
    };

    let Value::List(items) = value else {
        return Err(invalid());
    };
    let class = match items.first() {
        Some(Value::Str(class) | Value::Injection(class)) => class.clone(),
        _ => return Err(invalid()),
    };
    let overrides = match items.get(1) {
        Some(overrides) => Arguments::from_value(overrides)?,
        None => Arguments::new(),
    };
    Ok((class, overrides))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(json: &str) -> Value {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn precedence_is_positional_named_raw_delegate_define() {
        let args = Arguments::new()
            .define("dep", "Other", Arguments::new())
            .delegate("dep", "make_dep")
            .raw("dep", 1)
            .named("dep", "Impl")
            .position(0, "first");

        assert!(matches!(args.lookup(0, "dep"), Some(Override::Positional(_))));
        assert!(matches!(args.lookup(1, "dep"), Some(Override::Named("Impl"))));

        let args = Arguments::new().define("dep", "Other", Arguments::new()).delegate("dep", "make_dep");
        assert!(matches!(args.lookup(0, "dep"), Some(Override::Delegate(_))));
    }

    #[test]
    fn merge_replaces_same_key_only() {
        let registered = Arguments::new().raw("foo", "literal").raw("bar", 1).named("dep", "Dep");
        let call_site = Arguments::new().raw("foo", "override");

        let merged = registered.merged(&call_site);
        assert!(matches!(merged.lookup(0, "foo"), Some(Override::Raw(Value::Str(s))) if s == "override"));
        assert!(matches!(merged.lookup(1, "bar"), Some(Override::Raw(Value::Int(1)))));
        assert!(matches!(merged.lookup(2, "dep"), Some(Override::Named("Dep"))));
    }

    #[test]
    fn parses_prefixed_keys() {
        let args = Arguments::from_value(&config(
            r#"{
                "0": "positional",
                "logger": "App\\FileLogger",
                ":size": 128,
                "+token": "App\\tokens",
                "@db": ["App\\Database", {":dsn": "sqlite::memory:"}]
            }"#,
        ))
        .unwrap();

        assert!(matches!(args.lookup(0, "x"), Some(Override::Positional(Value::Str(_)))));
        assert!(matches!(args.lookup(9, "logger"), Some(Override::Named("App\\FileLogger"))));
        assert!(matches!(args.lookup(9, "size"), Some(Override::Raw(Value::Int(128)))));
        assert!(matches!(args.lookup(9, "token"), Some(Override::Delegate(Invokable::Name(_)))));

        match args.lookup(9, "db") {
            Some(Override::Define(class, overrides)) => {
                assert_eq!(class, "App\\Database");
                assert!(matches!(overrides.lookup(0, "dsn"), Some(Override::Raw(_))));
            }
            other => panic!("Expected Define, got: {other:?}"),
        }
    }

    #[test]
    fn mapping_definitions_default_to_raw() {
        let mut entries = BTreeMap::new();
        entries.insert("dsn".to_string(), Value::from("sqlite::memory:"));
        entries.insert("logger".to_string(), Value::Injection("App\\FileLogger".into()));
        entries.insert(":retries".to_string(), Value::Int(3));

        let args = Arguments::from_definitions(&Value::Map(entries)).unwrap();
        assert!(matches!(args.lookup(0, "dsn"), Some(Override::Raw(Value::Str(_)))));
        assert!(matches!(args.lookup(0, "logger"), Some(Override::Named("App\\FileLogger"))));
        assert!(matches!(args.lookup(0, "retries"), Some(Override::Raw(Value::Int(3)))));
    }

    #[test]
    fn rejects_malformed_entries() {
        for json in [r#"{"logger": 5}"#, r#"{"@db": "App\\Database"}"#, r#"{":": 1}"#, r#"{"+cb": 3}"#, "7"] {
            let err = Arguments::from_value(&config(json)).unwrap_err();
            assert!(matches!(err, InjectorError::ConfigInvalid(_)), "accepted {json}");
        }
    }
}
