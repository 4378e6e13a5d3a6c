//! Lookup of raw descriptors by name.

use std::collections::HashMap;
use std::sync::Arc;

use haqn_support::rendering::suggest_similar;
use tracing::{debug, trace};

use super::descriptor::{ClassDescriptor, ClassRegistration, FunctionDescriptor, Injectable};
use crate::error::{ClassNotFoundError, ReflectionError};
use crate::key::TypeName;

/// The introspection primitive the reflector is built on.
pub trait TypeIntrospector: Send + Sync {
    /// Finds a class, interface or abstract class by name.
    fn class(&self, name: &TypeName) -> Result<Arc<ClassDescriptor>, ReflectionError>;

    /// Finds a named free function.
    fn function(&self, name: &str) -> Result<Arc<FunctionDescriptor>, ReflectionError>;
}

/// An in-memory table of descriptors.
///
/// [`from_inventory`](Self::from_inventory) starts from everything submitted
/// by `#[derive(Injectable)]`; hand-written descriptors can be added on top.
#[derive(Debug, Default, Clone)]
pub struct DescriptorTable {
    classes: HashMap<TypeName, Arc<ClassDescriptor>>,
    functions: HashMap<TypeName, Arc<FunctionDescriptor>>,
}

impl DescriptorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding every class registered at build time.
    pub fn from_inventory() -> Self {
        let mut table = Self::new();
        for registration in inventory::iter::<ClassRegistration> {
            table.register_class(registration.descriptor());
        }
        debug!(classes = table.classes.len(), "Collected build-time class descriptors");
        table
    }

    /// Adds or replaces a class descriptor.
    pub fn register_class(&mut self, descriptor: ClassDescriptor) -> &mut Self {
        trace!(class = %descriptor.name(), "Registering class descriptor");
        self.classes.insert(descriptor.name().clone(), Arc::new(descriptor));
        self
    }

    /// Adds or replaces a named function.
    pub fn register_function(&mut self, descriptor: FunctionDescriptor) -> &mut Self {
        trace!(function = descriptor.name(), "Registering function descriptor");
        self.functions.insert(TypeName::new(descriptor.name()), Arc::new(descriptor));
        self
    }

    pub fn with_class(mut self, descriptor: ClassDescriptor) -> Self {
        self.register_class(descriptor);
        self
    }

    /// Adds the descriptor of an [`Injectable`] type.
    pub fn with_injectable<T: Injectable>(self) -> Self {
        self.with_class(T::descriptor())
    }

    pub fn with_function(mut self, descriptor: FunctionDescriptor) -> Self {
        self.register_function(descriptor);
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl TypeIntrospector for DescriptorTable {
    fn class(&self, name: &TypeName) -> Result<Arc<ClassDescriptor>, ReflectionError> {
        if let Some(descriptor) = self.classes.get(name) {
            return Ok(Arc::clone(descriptor));
        }

        let known: Vec<&str> = self.classes.keys().map(TypeName::as_str).collect();
        Err(ReflectionError::ClassNotFound(ClassNotFoundError {
            class: name.clone(),
            suggestions: suggest_similar(name.as_str(), &known, 3),
        }))
    }

    fn function(&self, name: &str) -> Result<Arc<FunctionDescriptor>, ReflectionError> {
        self.functions
            .get(&TypeName::new(name))
            .cloned()
            .ok_or_else(|| ReflectionError::FunctionNotFound(name.to_string()))
    }
}
