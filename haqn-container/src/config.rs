//! Registrations read from configuration data.
//!
//! A config tree with any of these keys can be applied with
//! [`Injector::register_mappings`]:
//!
//! ```text
//! standardAliases:     { Interface: Class }
//! sharedAliases:       { Interface: Class }        aliased and shared
//! argumentDefinitions: { Class: { param: value } }
//! argumentProviders:   { param: { interface: Interface, mappings: { Class: callable } } }
//! delegations:         { Class: callable }
//! preparations:        { Class: callable }
//! ```
//!
//! Since [`Value`] implements `serde::Deserialize`, the tree can come from
//! any serde format.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::arguments::Arguments;
use crate::error::{InjectorError, Result};
use crate::injector::Injector;
use crate::invoker::Invokable;
use crate::key::TypeName;
use crate::provider::Provider;
use crate::reflection::Parameter;
use crate::value::Value;

pub const STANDARD_ALIASES: &str = "standardAliases";
pub const SHARED_ALIASES: &str = "sharedAliases";
pub const ARGUMENT_DEFINITIONS: &str = "argumentDefinitions";
pub const ARGUMENT_PROVIDERS: &str = "argumentProviders";
pub const DELEGATIONS: &str = "delegations";
pub const PREPARATIONS: &str = "preparations";

/// A source of configuration values.
pub trait ConfigSource {
    fn has_key(&self, key: &str) -> bool;
    fn get_key(&self, key: &str) -> Option<Value>;
}

impl ConfigSource for Value {
    fn has_key(&self, key: &str) -> bool {
        self.as_map().is_some_and(|map| map.contains_key(key))
    }

    fn get_key(&self, key: &str) -> Option<Value> {
        self.as_map().and_then(|map| map.get(key)).cloned()
    }
}

impl ConfigSource for BTreeMap<String, Value> {
    fn has_key(&self, key: &str) -> bool {
        self.contains_key(key)
    }

    fn get_key(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

type Section = BTreeMap<String, Value>;

/// The six mapping sections, read from a [`ConfigSource`].
#[derive(Debug, Clone, Default)]
pub struct ConfigMappings {
    standard_aliases: Section,
    shared_aliases: Section,
    argument_definitions: Section,
    argument_providers: Section,
    delegations: Section,
    preparations: Section,
}

impl ConfigMappings {
    /// Reads every section; missing sections are empty.
    ///
    /// # Errors
    /// [`InjectorError::InvalidMappings`] when a section is not a map.
    pub fn from_source(source: &dyn ConfigSource) -> Result<Self> {
        let section = |key: &str| -> Result<Section> {
            if !source.has_key(key) {
                return Ok(Section::new());
            }
            match source.get_key(key) {
                None | Some(Value::Null) => Ok(Section::new()),
                Some(Value::Map(map)) => Ok(map),
                Some(other) => Err(InjectorError::InvalidMappings {
                    source: Box::new(InjectorError::ConfigInvalid(format!(
                        "Configuration key '{key}' must hold a map, received {}",
                        other.type_name()
                    ))),
                }),
            }
        };

        Ok(Self {
            standard_aliases: section(STANDARD_ALIASES)?,
            shared_aliases: section(SHARED_ALIASES)?,
            argument_definitions: section(ARGUMENT_DEFINITIONS)?,
            argument_providers: section(ARGUMENT_PROVIDERS)?,
            delegations: section(DELEGATIONS)?,
            preparations: section(PREPARATIONS)?,
        })
    }

    fn apply(&self, injector: &mut Injector) -> Result<()> {
        // Shared aliases are aliases too; standard entries win on conflict.
        let mut aliases = self.shared_aliases.clone();
        aliases.extend(self.standard_aliases.clone());
        for (interface, class) in &aliases {
            let class = type_name(interface, class)?;
            if TypeName::new(interface) != TypeName::new(&class) {
                injector.alias(interface, &class)?;
            }
        }

        for interface in self.shared_aliases.keys() {
            injector.share(interface.as_str())?;
        }

        for (class, definitions) in &self.argument_definitions {
            injector.define(class, Arguments::from_definitions(definitions)?);
        }

        for (param, provider) in &self.argument_providers {
            self.define_argument_provider(injector, param, provider)?;
        }

        for (class, callable) in &self.delegations {
            injector.delegate(class, invokable(class, callable)?)?;
        }

        for (class, callable) in &self.preparations {
            injector.prepare(class, invokable(class, callable)?)?;
        }

        Ok(())
    }

    fn define_argument_provider(&self, injector: &mut Injector, param: &str, provider: &Value) -> Result<()> {
        let Some(mappings) = provider.get_key("mappings") else {
            return Err(InjectorError::ConfigInvalid(format!(
                "Failed to define argument providers for argument '{param}'. Reason: The key 'mappings' was not found."
            )));
        };
        let Value::Map(mappings) = mappings else {
            return Err(InjectorError::ConfigInvalid(format!(
                "Argument provider mappings for '{param}' must be a map, received {}",
                mappings.type_name()
            )));
        };
        let interface = provider.get_key("interface").unwrap_or_default();

        for (class, callable) in mappings {
            let callable = invokable(&class, &callable)?;
            let requested_as = Value::from(class.as_str());
            let interface = interface.clone();

            let target = injector.registry.resolve_alias(&TypeName::new(&class));
            let existing = injector
                .registry
                .class_definitions
                .get(&target)
                .cloned()
                .unwrap_or_default();

            let provide = Invokable::closure([Parameter::new("param")], move |injector, _| {
                injector.call(&callable, vec![requested_as.clone(), interface.clone()])
            });
            injector.define(&class, existing.delegate(param, provide));
        }

        debug!(param, "Defined argument provider");
        Ok(())
    }
}

fn type_name(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::Str(name) | Value::Injection(name) => Ok(name.clone()),
        other => Err(InjectorError::ConfigInvalid(format!(
            "Mapping for '{key}' must be a type name, received {}",
            other.type_name()
        ))),
    }
}

fn invokable(key: &str, value: &Value) -> Result<Invokable> {
    Invokable::try_from(value.clone()).map_err(|found| {
        InjectorError::ConfigInvalid(format!(
            "Mapping for '{key}' must be callable, received {}",
            found.type_name()
        ))
    })
}

impl Provider for ConfigMappings {
    fn register(&self, injector: &mut Injector) -> Result<()> {
        self.apply(injector)
    }

    fn name(&self) -> &str {
        "config mappings"
    }
}

impl Injector {
    /// Applies the alias, share, argument, delegate and prepare mappings
    /// found in `source`.
    ///
    /// # Errors
    /// Any failure is reported as [`InjectorError::InvalidMappings`]
    /// wrapping its cause.
    #[instrument(level = "debug", skip_all)]
    pub fn register_mappings(&mut self, source: &dyn ConfigSource) -> Result<&mut Self> {
        let mappings = ConfigMappings::from_source(source)?;
        mappings.apply(self).map_err(|err| match err {
            err @ InjectorError::InvalidMappings { .. } => err,
            err => InjectorError::InvalidMappings { source: Box::new(err) },
        })?;
        Ok(self)
    }
}
