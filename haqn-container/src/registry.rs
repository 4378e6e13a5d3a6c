//! Registration state of an injector.
//!
//! Every map is keyed by [`TypeName`]. The registry only stores and checks
//! registrations; building happens in the [`Injector`](crate::Injector).

use std::collections::{BTreeMap, HashMap};

use bitflags::bitflags;
use tracing::{debug, trace};

use crate::arguments::Arguments;
use crate::error::{InjectorError, Result};
use crate::invoker::Invokable;
use crate::key::TypeName;
use crate::value::{Instance, Value};

const NON_EMPTY_STRING_ALIAS: &str = "Invalid alias: non-empty string required at arguments 1 and 2";

bitflags! {
    /// Categories selected by [`Injector::inspect`](crate::Injector::inspect).
    /// An empty set selects all of them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Inspect: u8 {
        /// Class definitions registered with `define`.
        const BINDINGS = 1 << 0;
        const DELEGATES = 1 << 1;
        const PREPARES = 1 << 2;
        const ALIASES = 1 << 3;
        const SHARES = 1 << 4;
    }
}

/// Argument to [`Injector::share`](crate::Injector::share).
#[derive(Debug, Clone)]
pub enum Share {
    /// Mark a class shared; it is stored the first time it is built.
    Class(String),
    /// Share an already built instance under its runtime class.
    Instance(Instance),
    /// Anything else; rejected with the name of its kind.
    Invalid(&'static str),
}

impl From<&str> for Share {
    fn from(name: &str) -> Self {
        Share::Class(name.to_string())
    }
}

impl From<String> for Share {
    fn from(name: String) -> Self {
        Share::Class(name)
    }
}

impl From<Instance> for Share {
    fn from(instance: Instance) -> Self {
        Share::Instance(instance)
    }
}

impl From<Value> for Share {
    fn from(value: Value) -> Self {
        match value {
            Value::Str(name) | Value::Injection(name) => Share::Class(name),
            Value::Object(instance) => Share::Instance(instance),
            other => Share::Invalid(other.type_name()),
        }
    }
}

/// A read-only snapshot of registrations.
#[derive(Debug, Clone, Default)]
pub struct Inspection {
    pub bindings: BTreeMap<TypeName, Arguments>,
    pub delegates: BTreeMap<TypeName, Invokable>,
    pub prepares: BTreeMap<TypeName, Invokable>,
    pub aliases: BTreeMap<TypeName, TypeName>,
    /// `None` for classes marked shared but not built yet.
    pub shares: BTreeMap<TypeName, Option<Instance>>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Registry {
    pub aliases: HashMap<TypeName, TypeName>,
    pub shares: HashMap<TypeName, Option<Instance>>,
    pub class_definitions: HashMap<TypeName, Arguments>,
    pub delegates: HashMap<TypeName, Invokable>,
    pub prepares: HashMap<TypeName, Invokable>,
    pub param_definitions: HashMap<String, Value>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follows one alias hop.
    pub fn resolve_alias(&self, name: &TypeName) -> TypeName {
        match self.aliases.get(name) {
            Some(target) => {
                trace!(from = %name, to = %target, "Following alias");
                target.clone()
            }
            None => name.clone(),
        }
    }

    pub fn shared_instance(&self, name: &TypeName) -> Option<&Instance> {
        self.shares.get(name).and_then(Option::as_ref)
    }

    /// Whether `name` was aliased, delegated or shared explicitly.
    pub fn is_explicitly_registered(&self, name: &TypeName) -> bool {
        self.aliases.contains_key(name) || self.delegates.contains_key(name) || self.shares.contains_key(name)
    }

    pub fn define(&mut self, name: &str, arguments: Arguments) {
        let class = self.resolve_alias(&TypeName::new(name));
        debug!(class = %class, "Defined class arguments");
        self.class_definitions.insert(class, arguments);
    }

    pub fn define_param(&mut self, param: &str, value: Value) {
        debug!(param, "Defined global parameter");
        self.param_definitions.insert(param.to_string(), value);
    }

    /// Redirects `original` to `alias`.
    ///
    /// # Errors
    /// [`InjectorError::ConfigInvalid`] for empty names,
    /// [`InjectorError::SharedCannotAlias`] if `original` holds a shared
    /// instance.
    pub fn alias(&mut self, original: &str, alias: &str) -> Result<()> {
        let original_key = TypeName::new(original);
        let alias_key = TypeName::new(alias);
        if original_key.is_empty() || alias_key.is_empty() {
            return Err(InjectorError::ConfigInvalid(NON_EMPTY_STRING_ALIAS.to_string()));
        }

        match self.shares.get(&original_key) {
            Some(Some(_)) => {
                return Err(InjectorError::SharedCannotAlias {
                    original: original_key,
                    alias: alias_key,
                });
            }
            Some(None) => {
                self.shares.remove(&original_key);
                self.shares.entry(alias_key.clone()).or_insert(None);
                trace!(from = %original_key, to = %alias_key, "Moved shared mark to alias target");
            }
            None => {}
        }

        if original_key == alias_key {
            trace!(class = %original_key, "Ignoring alias to itself");
            return Ok(());
        }

        debug!(original = %original_key, alias = %alias_key, "Registered alias");
        self.aliases.insert(original_key, alias_key);
        Ok(())
    }

    /// Marks the alias-resolved class shared, keeping an instance it may
    /// already hold.
    pub fn share_class(&mut self, name: &str) {
        let class = self.resolve_alias(&TypeName::new(name));
        debug!(class = %class, "Marked class shared");
        self.shares.entry(class).or_insert(None);
    }

    /// # Errors
    /// [`InjectorError::AliasedCannotShare`] if the instance's class is
    /// aliased.
    pub fn share_instance(&mut self, instance: Instance) -> Result<()> {
        let class = instance.class().clone();
        if let Some(alias) = self.aliases.get(&class) {
            return Err(InjectorError::AliasedCannotShare {
                class,
                alias: alias.clone(),
            });
        }

        debug!(class = %class, "Shared instance");
        self.shares.insert(class, Some(instance));
        Ok(())
    }

    /// Stores a built instance into an existing share slot.
    pub fn store_shared(&mut self, name: &TypeName, instance: &Instance) {
        if let Some(slot) = self.shares.get_mut(name) {
            trace!(class = %name, "Storing shared instance");
            *slot = Some(instance.clone());
        }
    }

    pub fn prepare(&mut self, name: &str, invokable: Invokable) {
        let class = self.resolve_alias(&TypeName::new(name));
        debug!(class = %class, hook = %invokable.describe(), "Registered prepare hook");
        self.prepares.insert(class, invokable);
    }

    /// Delegates bind to the requested name, not its alias target.
    pub fn delegate(&mut self, name: &str, invokable: Invokable) {
        let class = TypeName::new(name);
        debug!(class = %class, delegate = %invokable.describe(), "Registered delegate");
        self.delegates.insert(class, invokable);
    }

    pub fn inspect(&self, name: Option<&str>, filter: Inspect) -> Inspection {
        let filter = if filter.is_empty() { Inspect::all() } else { filter };
        let name = name.filter(|n| !n.is_empty()).map(TypeName::new);

        fn select<V: Clone>(map: &HashMap<TypeName, V>, name: Option<&TypeName>) -> BTreeMap<TypeName, V> {
            match name {
                Some(name) => map
                    .get_key_value(name)
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .into_iter()
                    .collect(),
                None => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            }
        }

        let name = name.as_ref();
        let mut inspection = Inspection::default();
        if filter.contains(Inspect::BINDINGS) {
            inspection.bindings = select(&self.class_definitions, name);
        }
        if filter.contains(Inspect::DELEGATES) {
            inspection.delegates = select(&self.delegates, name);
        }
        if filter.contains(Inspect::PREPARES) {
            inspection.prepares = select(&self.prepares, name);
        }
        if filter.contains(Inspect::ALIASES) {
            inspection.aliases = select(&self.aliases, name);
        }
        if filter.contains(Inspect::SHARES) {
            inspection.shares = select(&self.shares, name);
        }
        inspection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_resolves_one_hop() {
        let mut reg = Registry::new();
        reg.alias("A", "B").unwrap();
        reg.alias("B", "C").unwrap();

        assert_eq!(reg.resolve_alias(&"a".into()), TypeName::new("B"));
        assert_eq!(reg.resolve_alias(&"Other".into()), TypeName::new("Other"));
    }

    #[test]
    fn alias_to_self_is_not_stored() {
        let mut reg = Registry::new();
        reg.alias("Mailer", "\\mailer").unwrap();
        assert!(reg.aliases.is_empty());
    }

    #[test]
    fn alias_rejects_empty_names() {
        let mut reg = Registry::new();
        assert!(matches!(reg.alias("", "B"), Err(InjectorError::ConfigInvalid(_))));
        assert!(matches!(reg.alias("A", "\\"), Err(InjectorError::ConfigInvalid(_))));
    }

    #[test]
    fn alias_moves_empty_share_mark() {
        let mut reg = Registry::new();
        reg.share_class("Iface");
        reg.alias("Iface", "Impl").unwrap();

        assert!(!reg.shares.contains_key(&TypeName::new("Iface")));
        assert_eq!(reg.shares.get(&TypeName::new("Impl")).map(Option::is_none), Some(true));
    }

    #[test]
    fn alias_of_built_share_fails() {
        let mut reg = Registry::new();
        reg.share_instance(Instance::new("Impl", 1u8)).unwrap();

        let err = reg.alias("Impl", "Other").unwrap_err();
        assert!(matches!(err, InjectorError::SharedCannotAlias { .. }));
    }

    #[test]
    fn aliased_instance_cannot_be_shared() {
        let mut reg = Registry::new();
        reg.alias("Impl", "Other").unwrap();

        let err = reg.share_instance(Instance::new("Impl", 1u8)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot share class Impl because it is currently aliased to Other"
        );
    }

    #[test]
    fn resharing_keeps_built_instance() {
        let mut reg = Registry::new();
        let instance = Instance::new("Db", 1u8);
        reg.share_instance(instance.clone()).unwrap();
        reg.share_class("db");

        assert!(reg.shared_instance(&"Db".into()).unwrap().ptr_eq(&instance));
    }

    #[test]
    fn delegate_skips_alias_but_prepare_follows_it() {
        let mut reg = Registry::new();
        reg.alias("Iface", "Impl").unwrap();
        reg.delegate("Iface", Invokable::from("factory"));
        reg.prepare("Iface", Invokable::from("hook"));
        reg.define("Iface", Arguments::new().raw("x", 1));

        assert!(reg.delegates.contains_key(&TypeName::new("Iface")));
        assert!(reg.prepares.contains_key(&TypeName::new("Impl")));
        assert!(reg.class_definitions.contains_key(&TypeName::new("Impl")));
    }

    #[test]
    fn inspect_filters_by_name_and_category() {
        let mut reg = Registry::new();
        reg.alias("Iface", "Impl").unwrap();
        reg.alias("Other", "Impl").unwrap();
        reg.share_class("Impl");
        reg.delegate("Factory", Invokable::from("make_factory"));

        let all = reg.inspect(None, Inspect::empty());
        assert_eq!(all.aliases.len(), 2);
        assert_eq!(all.shares.len(), 1);
        assert_eq!(all.delegates.len(), 1);

        let one = reg.inspect(Some("\\IFACE"), Inspect::ALIASES | Inspect::SHARES);
        assert_eq!(one.aliases.len(), 1);
        assert!(one.shares.is_empty());
        assert!(one.delegates.is_empty());
    }
}
