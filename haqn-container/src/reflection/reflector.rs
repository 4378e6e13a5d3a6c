//! The reflection API the injector talks to.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::trace;

use super::cache::{Cached, KEY_PREFIX, ReflectionCache};
use super::descriptor::{ClassDescriptor, FunctionDescriptor, FunctionKind, Parameter};
use super::introspector::TypeIntrospector;
use crate::error::ReflectionError;
use crate::key::TypeName;
use crate::value::Instance;

pub type ReflectionResult<T> = std::result::Result<T, ReflectionError>;

/// Ancestors of a class: parent classes nearest first, then every
/// interface implemented directly, through a parent or through another
/// interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lineage {
    pub parents: Vec<TypeName>,
    pub interfaces: Vec<TypeName>,
}

impl Lineage {
    pub fn contains(&self, class: &TypeName) -> bool {
        self.parents.contains(class) || self.interfaces.contains(class)
    }
}

/// Where a method is looked up.
#[derive(Debug, Clone, Copy)]
pub enum MethodTarget<'a> {
    Class(&'a TypeName),
    /// Looked up on the instance's runtime class.
    Instance(&'a Instance),
}

impl MethodTarget<'_> {
    pub fn class(&self) -> &TypeName {
        match self {
            MethodTarget::Class(class) => class,
            MethodTarget::Instance(instance) => instance.class(),
        }
    }
}

/// Reflection queries used while provisioning.
pub trait Reflector: Send + Sync {
    fn class(&self, name: &TypeName) -> ReflectionResult<Arc<ClassDescriptor>>;

    /// `None` when the class declares no constructor.
    fn constructor(&self, name: &TypeName) -> ReflectionResult<Option<Arc<FunctionDescriptor>>>;

    /// `None` when the class declares no constructor.
    fn constructor_params(&self, name: &TypeName) -> ReflectionResult<Option<Arc<[Parameter]>>>;

    /// The class-like type of a parameter, ignoring primitives.
    fn param_type_hint(&self, function: &FunctionDescriptor, param: &Parameter) -> Option<TypeName>;

    fn function(&self, name: &str) -> ReflectionResult<Arc<FunctionDescriptor>>;

    /// Finds a method on the target's class or one of its parents.
    fn method(&self, target: MethodTarget<'_>, method: &str) -> ReflectionResult<Arc<FunctionDescriptor>>;

    fn lineage(&self, class: &TypeName) -> ReflectionResult<Arc<Lineage>>;

    /// `true` if `class` is `target`, extends it or implements it.
    fn is_a(&self, class: &TypeName, target: &TypeName) -> ReflectionResult<bool> {
        if class == target {
            return Ok(true);
        }
        Ok(self.lineage(class)?.contains(target))
    }
}

/// Uncached reflection straight from a [`TypeIntrospector`].
#[derive(Clone)]
pub struct StandardReflector {
    introspector: Arc<dyn TypeIntrospector>,
}

impl StandardReflector {
    pub fn new(introspector: Arc<dyn TypeIntrospector>) -> Self {
        Self { introspector }
    }
}

impl Reflector for StandardReflector {
    fn class(&self, name: &TypeName) -> ReflectionResult<Arc<ClassDescriptor>> {
        self.introspector.class(name)
    }

    fn constructor(&self, name: &TypeName) -> ReflectionResult<Option<Arc<FunctionDescriptor>>> {
        Ok(self.class(name)?.constructor_descriptor().cloned())
    }

    fn constructor_params(&self, name: &TypeName) -> ReflectionResult<Option<Arc<[Parameter]>>> {
        Ok(self.constructor(name)?.map(|ctor| Arc::clone(ctor.parameters())))
    }

    fn param_type_hint(&self, _function: &FunctionDescriptor, param: &Parameter) -> Option<TypeName> {
        param.class_hint().cloned()
    }

    fn function(&self, name: &str) -> ReflectionResult<Arc<FunctionDescriptor>> {
        self.introspector.function(name)
    }

    fn method(&self, target: MethodTarget<'_>, method: &str) -> ReflectionResult<Arc<FunctionDescriptor>> {
        let requested = target.class();
        let mut current = Some(requested.clone());
        let mut visited = Vec::new();

        while let Some(class) = current.take() {
            if visited.contains(&class) {
                break;
            }
            let descriptor = self.introspector.class(&class)?;
            if let Some(found) = descriptor.declared_method(method) {
                return Ok(Arc::clone(found));
            }
            current = descriptor.parent().cloned();
            visited.push(class);
        }

        Err(ReflectionError::MethodNotFound {
            class: requested.clone(),
            method: method.to_string(),
        })
    }

    fn lineage(&self, class: &TypeName) -> ReflectionResult<Arc<Lineage>> {
        let descriptor = self.introspector.class(class)?;
        let mut lineage = Lineage::default();
        let mut pending: VecDeque<TypeName> = descriptor.interfaces().iter().cloned().collect();

        let mut next_parent = descriptor.parent().cloned();
        while let Some(parent) = next_parent.take() {
            if parent == *class || lineage.parents.contains(&parent) {
                break;
            }
            match self.introspector.class(&parent) {
                Ok(found) => {
                    pending.extend(found.interfaces().iter().cloned());
                    next_parent = found.parent().cloned();
                }
                Err(_) => trace!(class = %class, parent = %parent, "Parent class has no descriptor"),
            }
            lineage.parents.push(parent);
        }

        while let Some(interface) = pending.pop_front() {
            if lineage.interfaces.contains(&interface) {
                continue;
            }
            // Interfaces without a descriptor still count, they just add no parents.
            if let Ok(found) = self.introspector.class(&interface) {
                pending.extend(found.interfaces().iter().cloned());
                pending.extend(found.parent().cloned());
            }
            lineage.interfaces.push(interface);
        }

        Ok(Arc::new(lineage))
    }
}

/// A [`Reflector`] that memoizes another one in a [`ReflectionCache`].
pub struct CachingReflector {
    inner: Arc<dyn Reflector>,
    cache: Arc<dyn ReflectionCache>,
}

impl CachingReflector {
    pub fn new(inner: Arc<dyn Reflector>, cache: Arc<dyn ReflectionCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Arc<dyn ReflectionCache> {
        &self.cache
    }

    fn key(kind: &str, name: &str) -> String {
        format!("{KEY_PREFIX}{kind}.{name}")
    }

    fn cached<T>(
        &self,
        key: String,
        unpack: impl FnOnce(Cached) -> Option<T>,
        pack: impl FnOnce(T) -> Cached,
        compute: impl FnOnce() -> ReflectionResult<T>,
    ) -> ReflectionResult<T>
    where
        T: Clone,
    {
        if let Some(hit) = self.cache.fetch(&key).and_then(unpack) {
            trace!(key = %key, "Reflection cache hit");
            return Ok(hit);
        }

        trace!(key = %key, "Reflection cache miss");
        let value = compute()?;
        self.cache.store(&key, pack(value.clone()));
        Ok(value)
    }
}

impl Reflector for CachingReflector {
    fn class(&self, name: &TypeName) -> ReflectionResult<Arc<ClassDescriptor>> {
        self.cached(
            Self::key("classes", name.normalized()),
            |c| match c {
                Cached::Class(class) => Some(class),
                _ => None,
            },
            Cached::Class,
            || self.inner.class(name),
        )
    }

    fn constructor(&self, name: &TypeName) -> ReflectionResult<Option<Arc<FunctionDescriptor>>> {
        self.cached(
            Self::key("ctors", name.normalized()),
            |c| match c {
                Cached::Constructor(ctor) => Some(ctor),
                _ => None,
            },
            Cached::Constructor,
            || Ok(self.class(name)?.constructor_descriptor().cloned()),
        )
    }

    fn constructor_params(&self, name: &TypeName) -> ReflectionResult<Option<Arc<[Parameter]>>> {
        self.cached(
            Self::key("ctor-params", name.normalized()),
            |c| match c {
                Cached::Parameters(params) => Some(params),
                _ => None,
            },
            Cached::Parameters,
            || Ok(self.constructor(name)?.map(|ctor| Arc::clone(ctor.parameters()))),
        )
    }

    fn param_type_hint(&self, function: &FunctionDescriptor, param: &Parameter) -> Option<TypeName> {
        let scope = match function.kind() {
            FunctionKind::Closure => return self.inner.param_type_hint(function, param),
            FunctionKind::Function => format!("funcs.{}", TypeName::normalize(function.name())),
            FunctionKind::Method { class, .. } | FunctionKind::Constructor { class } => format!(
                "classes.{}.{}",
                class.normalized(),
                function.name().to_lowercase()
            ),
        };
        let key = format!("{KEY_PREFIX}{scope}.param-{}", param.name());

        let hint = self.cached(
            key,
            |c| match c {
                Cached::TypeHint(hint) => Some(hint),
                _ => None,
            },
            Cached::TypeHint,
            || Ok(self.inner.param_type_hint(function, param)),
        );
        hint.ok().flatten()
    }

    fn function(&self, name: &str) -> ReflectionResult<Arc<FunctionDescriptor>> {
        self.cached(
            Self::key("funcs", &TypeName::normalize(name)),
            |c| match c {
                Cached::Function(function) => Some(function),
                _ => None,
            },
            Cached::Function,
            || self.inner.function(name),
        )
    }

    fn method(&self, target: MethodTarget<'_>, method: &str) -> ReflectionResult<Arc<FunctionDescriptor>> {
        let name = format!("{}.{}", target.class().normalized(), method.to_lowercase());
        self.cached(
            Self::key("methods", &name),
            |c| match c {
                Cached::Function(function) => Some(function),
                _ => None,
            },
            Cached::Function,
            || self.inner.method(target, method),
        )
    }

    fn lineage(&self, class: &TypeName) -> ReflectionResult<Arc<Lineage>> {
        self.cached(
            Self::key("lineage", class.normalized()),
            |c| match c {
                Cached::Lineage(lineage) => Some(lineage),
                _ => None,
            },
            Cached::Lineage,
            || self.inner.lineage(class),
        )
    }
}
