//! # The Injector
//!
//! Builds object graphs from descriptor tables, following aliases, shared
//! instances, delegates, argument definitions and prepare hooks.
//!
//! # Architecture
//! ```text
//! InjectorBuilder ──build()──> Injector
//!                                 │ make(name)
//!                                 ▼
//!          alias ─> cycle check ─> share? ─> delegate? ─> constructor
//!                                                 │
//!                            prepare hooks <──────┘
//! ```
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use haqn_container::prelude::*;
//!
//! struct Transport;
//! struct Mailer {
//!     transport: Arc<Transport>,
//! }
//!
//! let table = DescriptorTable::new()
//!     .with_class(ClassDescriptor::new("Transport").without_constructor(|| Transport))
//!     .with_class(
//!         ClassDescriptor::new("Mailer")
//!             .constructor([Parameter::new("transport").class("Transport")], |args| {
//!                 Ok(Mailer { transport: args.get(0)? })
//!             }),
//!     );
//!
//! let mut injector = Injector::builder().introspector(table).build();
//! injector.share("Transport").unwrap();
//!
//! let a: Arc<Mailer> = injector.make_as("Mailer").unwrap();
//! let b: Arc<Mailer> = injector.make_as("Mailer").unwrap();
//! assert!(Arc::ptr_eq(&a.transport, &b.transport));
//! ```

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, trace, warn};

use crate::arguments::{Arguments, Override};
use crate::chain::InjectionChain;
use crate::error::{
    CyclicDependencyError, InjectorError, InvalidInvokableError, InvokableFault, NeedsDefinitionError,
    ReflectionError, Result, Uninstantiable, UndefinedParameterError,
};
use crate::invoker::{Executable, Invokable};
use crate::key::TypeName;
use crate::provider::Provider;
use crate::reflection::{
    ArrayCache, CachingReflector, ClassKind, DescriptorTable, FunctionDescriptor, Parameter, ReflectionCache,
    Reflector, StandardReflector, TypeIntrospector, Visibility,
};
use crate::registry::{Inspect, Inspection, Registry, Share};
use crate::value::{Args, Instance, Value};

/// Default limit on nested `make` calls.
pub const DEFAULT_MAX_DEPTH: usize = 256;

// ============================================================
// InjectorBuilder
// ============================================================

/// Configures how an [`Injector`] reflects over types.
///
/// Without any settings the injector reads the descriptors collected from
/// `#[derive(Injectable)]` and caches reflection per injector.
pub struct InjectorBuilder {
    introspector: Option<Arc<dyn TypeIntrospector>>,
    reflector: Option<Arc<dyn Reflector>>,
    cache: Option<Arc<dyn ReflectionCache>>,
    max_depth: usize,
}

impl InjectorBuilder {
    fn new() -> Self {
        Self {
            introspector: None,
            reflector: None,
            cache: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Source of class and function descriptors.
    pub fn introspector(mut self, introspector: impl TypeIntrospector + 'static) -> Self {
        self.introspector = Some(Arc::new(introspector));
        self
    }

    /// Replaces the reflector entirely; `introspector` and `cache` are then
    /// ignored.
    pub fn reflector(mut self, reflector: Arc<dyn Reflector>) -> Self {
        self.reflector = Some(reflector);
        self
    }

    /// Cache for reflection results, e.g. a [`TieredCache`](crate::reflection::TieredCache).
    pub fn cache(mut self, cache: Arc<dyn ReflectionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Maximum number of nested `make` calls before failing.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn build(self) -> Injector {
        let reflector = match self.reflector {
            Some(reflector) => reflector,
            None => {
                let introspector = self
                    .introspector
                    .unwrap_or_else(|| Arc::new(DescriptorTable::from_inventory()));
                let cache = self.cache.unwrap_or_else(|| Arc::new(ArrayCache::new()));
                Arc::new(CachingReflector::new(Arc::new(StandardReflector::new(introspector)), cache))
            }
        };

        debug!(max_depth = self.max_depth, "Injector built");
        Injector {
            reflector,
            registry: Registry::new(),
            in_progress: Vec::new(),
            max_depth: self.max_depth,
        }
    }
}

// ============================================================
// Injector
// ============================================================

/// A reflective dependency injection container.
///
/// Not meant for concurrent use: building mutates the recursion stack and
/// share slots in place. Use one injector per thread, or
/// [`clone`](Clone::clone) one per task.
pub struct Injector {
    pub(crate) reflector: Arc<dyn Reflector>,
    pub(crate) registry: Registry,
    in_progress: Vec<TypeName>,
    max_depth: usize,
}

impl Injector {
    /// An injector over the build-time descriptor table.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> InjectorBuilder {
        InjectorBuilder::new()
    }

    // ── Registration ──

    /// Replaces the argument definitions of the (alias-resolved) class.
    pub fn define(&mut self, name: &str, arguments: Arguments) -> &mut Self {
        self.registry.define(name, arguments);
        self
    }

    /// Sets a global value for typeless parameters named `param`.
    pub fn define_param(&mut self, param: &str, value: impl Into<Value>) -> &mut Self {
        self.registry.define_param(param, value.into());
        self
    }

    /// Makes requests for `original` build `alias` instead.
    ///
    /// # Errors
    /// [`InjectorError::ConfigInvalid`] for empty names and
    /// [`InjectorError::SharedCannotAlias`] when `original` already holds a
    /// shared instance.
    pub fn alias(&mut self, original: &str, alias: &str) -> Result<&mut Self> {
        self.registry.alias(original, alias)?;
        Ok(self)
    }

    /// Shares a class by name, or an already built instance.
    ///
    /// # Errors
    /// [`InjectorError::AliasedCannotShare`] when an instance's class is
    /// aliased, [`InjectorError::ConfigInvalid`] for anything that is neither
    /// a name nor an object.
    pub fn share(&mut self, target: impl Into<Share>) -> Result<&mut Self> {
        match target.into() {
            Share::Class(name) => self.registry.share_class(&name),
            Share::Instance(instance) => self.registry.share_instance(instance)?,
            Share::Invalid(kind) => {
                return Err(InjectorError::ConfigInvalid(format!(
                    "Injector::share() requires a string class name or object instance at Argument 1; {kind} provided"
                )));
            }
        }
        Ok(self)
    }

    /// Runs `hook` on every instance of the (alias-resolved) class or of
    /// any class implementing that interface.
    ///
    /// # Errors
    /// [`InjectorError::InvalidInvokable`] when `hook` is not executable.
    pub fn prepare(&mut self, name: &str, hook: impl Into<Invokable>) -> Result<&mut Self> {
        let hook = hook.into();
        if !self.is_executable(&hook) {
            return Err(InjectorError::InvalidInvokable(InvalidInvokableError::new(
                hook.describe(),
                InvokableFault::Malformed,
            )));
        }
        self.registry.prepare(name, hook);
        Ok(self)
    }

    /// Builds `name` with `factory` instead of its constructor.
    ///
    /// The delegate is stored under `name` as given, without following
    /// aliases.
    ///
    /// # Errors
    /// [`InjectorError::ConfigInvalid`] when `factory` is not executable.
    pub fn delegate(&mut self, name: &str, factory: impl Into<Invokable>) -> Result<&mut Self> {
        let factory = factory.into();
        if !self.is_executable(&factory) {
            return Err(InjectorError::ConfigInvalid(format!(
                "Injector::delegate expects a valid callable or executable class::method string at Argument 2 but received '{}'",
                haqn_support::rendering::truncate_callable(&factory.describe())
            )));
        }
        self.registry.delegate(name, factory);
        Ok(self)
    }

    /// Applies a [`Provider`] module.
    pub fn add_provider(&mut self, provider: &dyn Provider) -> Result<&mut Self> {
        debug!(provider = provider.name(), "Registering provider");
        provider.register(self)?;
        Ok(self)
    }

    /// Snapshot of registrations, optionally for one name and some
    /// categories. An empty `filter` selects every category.
    pub fn inspect(&self, name: Option<&str>, filter: Inspect) -> Inspection {
        self.registry.inspect(name, filter)
    }

    /// The types currently under construction, outermost first.
    pub fn injection_chain(&self) -> InjectionChain {
        InjectionChain::new(self.in_progress.clone())
    }

    // ── Building ──

    /// Builds `name` without call-site overrides.
    pub fn make(&mut self, name: &str) -> Result<Instance> {
        self.make_with(name, &Arguments::new())
    }

    /// Builds `name` and downcasts the result.
    ///
    /// # Errors
    /// [`InjectorError::TypeMismatch`] when the built object is not a `T`.
    pub fn make_as<T: Any + Send + Sync>(&mut self, name: &str) -> Result<Arc<T>> {
        let instance = self.make(name)?;
        instance.downcast::<T>().ok_or_else(|| InjectorError::TypeMismatch {
            class: instance.class().clone(),
            expected: type_name::<T>(),
        })
    }

    /// Builds `name`; `args` apply to its own parameters only.
    #[instrument(level = "debug", skip(self, args))]
    pub fn make_with(&mut self, name: &str, args: &Arguments) -> Result<Instance> {
        let class = self.registry.resolve_alias(&TypeName::new(name));

        if self.in_progress.contains(&class) {
            let chain = self.injection_chain();
            warn!(class = %class, chain = %chain, "Cyclic dependency detected");
            return Err(InjectorError::CyclicDependency(CyclicDependencyError { class, chain }));
        }

        if self.in_progress.len() >= self.max_depth {
            return Err(InjectorError::RecursionLimit {
                class,
                limit: self.max_depth,
                chain: self.injection_chain(),
            });
        }

        let depth = self.in_progress.len();
        self.in_progress.push(class.clone());
        let result = self.make_in_frame(&class, args);
        self.in_progress.truncate(depth);

        if result.is_ok() {
            trace!(class = %class, "Made instance");
        }
        result
    }

    /// Calls `invokable` with dependency-injected arguments.
    pub fn execute(&mut self, invokable: impl Into<Invokable>) -> Result<Value> {
        self.execute_with(invokable, &Arguments::new())
    }

    /// Calls `invokable`, resolving its parameters with `args` first.
    #[instrument(level = "debug", skip_all)]
    pub fn execute_with(&mut self, invokable: impl Into<Invokable>, args: &Arguments) -> Result<Value> {
        let invokable = invokable.into();
        let executable = self.build_executable(&invokable)?;
        self.invoke_provisioned(&executable, args)
    }

    /// Calls `invokable` with exactly `values`, without any resolution.
    pub fn call(&mut self, invokable: &Invokable, values: Vec<Value>) -> Result<Value> {
        let executable = self.build_executable(invokable)?;
        executable.invoke(self, values)
    }

    // ── Internal ──

    fn make_in_frame(&mut self, class: &TypeName, args: &Arguments) -> Result<Instance> {
        if let Some(shared) = self.registry.shared_instance(class) {
            trace!(class = %class, "Returning shared instance");
            return Ok(shared.clone());
        }

        let made = match self.registry.delegates.get(class).cloned() {
            Some(delegate) => {
                trace!(class = %class, delegate = %delegate.describe(), "Building through delegate");
                let executable = self.build_executable(&delegate).map_err(|err| self.attach_chain(err))?;
                self.invoke_provisioned(&executable, args).map_err(|err| self.attach_chain(err))?
            }
            None => Value::Object(self.provision_instance(class, args)?),
        };

        let instance = self.prepare_instance(made, class)?;
        self.registry.store_shared(class, &instance);
        Ok(instance)
    }

    fn invoke_provisioned(&mut self, executable: &Executable, args: &Arguments) -> Result<Value> {
        let function = Arc::clone(executable.function());
        let values = self.provision_args(&function, function.parameters(), args)?;
        executable.invoke(self, values)
    }

    /// Records the current chain on an invokable failure raised mid-build.
    fn attach_chain(&self, err: InjectorError) -> InjectorError {
        match err {
            InjectorError::InvalidInvokable(mut e) if e.chain.is_none() => {
                e.chain = Some(self.injection_chain());
                InjectorError::InvalidInvokable(e)
            }
            err => err,
        }
    }

    fn make_failure(&self, class: &TypeName, err: ReflectionError) -> InjectorError {
        InjectorError::MakeFailure {
            class: class.clone(),
            source: Box::new(err.into()),
            chain: self.injection_chain(),
        }
    }

    fn provision_instance(&mut self, class: &TypeName, args: &Arguments) -> Result<Instance> {
        let ctor = self
            .reflector
            .constructor(class)
            .map_err(|err| self.make_failure(class, err))?;

        let Some(ctor) = ctor else {
            return self.instantiate_without_args(class);
        };

        let descriptor = self.reflector.class(class).map_err(|err| self.make_failure(class, err))?;
        if descriptor.kind() != ClassKind::Concrete {
            return self.instantiate_without_args(class);
        }

        if ctor.visibility() != Visibility::Public {
            return Err(InjectorError::NonPublicConstructor {
                class: class.clone(),
                chain: self.injection_chain(),
            });
        }

        let params = self
            .reflector
            .constructor_params(class)
            .map_err(|err| self.make_failure(class, err))?;
        let params = match params {
            Some(params) if !params.is_empty() => params,
            _ => return self.instantiate_without_args(class),
        };

        let definition = match self.registry.class_definitions.get(class) {
            Some(registered) => registered.merged(args),
            None => args.clone(),
        };

        let values = self.provision_args(&ctor, &params, &definition)?;
        descriptor.instantiate(Args::new(values)).map_err(|err| match err {
            InjectorError::Reflection(err) => self.make_failure(class, err),
            err => err,
        })
    }

    fn instantiate_without_args(&mut self, class: &TypeName) -> Result<Instance> {
        let descriptor = self.reflector.class(class).map_err(|err| self.make_failure(class, err))?;

        let kind = match descriptor.kind() {
            ClassKind::Concrete => return descriptor.instantiate(Args::default()).map_err(|err| match err {
                InjectorError::Reflection(err) => self.make_failure(class, err),
                err => err,
            }),
            ClassKind::Interface => Uninstantiable::Interface,
            ClassKind::Abstract => Uninstantiable::AbstractClass,
        };

        Err(InjectorError::NeedsDefinition(NeedsDefinitionError {
            kind,
            class: descriptor.name().clone(),
            chain: self.injection_chain(),
        }))
    }

    /// Resolves every parameter, first match wins: positional, named,
    /// raw, delegate and define overrides, then the class type hint, then
    /// global parameter definitions and declared defaults.
    fn provision_args(
        &mut self,
        function: &FunctionDescriptor,
        params: &[Parameter],
        definition: &Arguments,
    ) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(params.len());

        for param in params {
            let value = match definition.lookup(param.position(), param.name()) {
                Some(Override::Positional(value)) | Some(Override::Raw(value)) => value.clone(),
                Some(Override::Named(class)) => Value::Object(self.make(class)?),
                Some(Override::Delegate(provider)) => self.call(provider, vec![Value::from(param.name())])?,
                Some(Override::Define(class, overrides)) => Value::Object(self.make_with(class, overrides)?),
                None => self.provision_default(function, param)?,
            };
            values.push(value);
        }

        Ok(values)
    }

    fn provision_default(&mut self, function: &FunctionDescriptor, param: &Parameter) -> Result<Value> {
        if let Some(hint) = self.reflector.param_type_hint(function, param) {
            let value = match param.default_value() {
                // Only an explicit registration beats a declared default.
                Some(default) if !self.registry.is_explicitly_registered(&hint) => default.clone(),
                _ => Value::Object(self.make(hint.as_str())?),
            };
            if !value.is_null() {
                return Ok(value);
            }
        }

        if let Some(value) = self.registry.param_definitions.get(param.name()) {
            return Ok(value.clone());
        }
        if let Some(default) = param.default_value() {
            return Ok(default.clone());
        }
        if param.is_optional() {
            return Ok(Value::Null);
        }

        Err(InjectorError::UndefinedParameter(UndefinedParameterError {
            name: param.name().to_string(),
            position: param.position(),
            function: function.display_name(),
            chain: self.injection_chain(),
        }))
    }

    fn prepare_instance(&mut self, made: Value, class: &TypeName) -> Result<Instance> {
        let mut instance = match made {
            Value::Object(instance) => instance,
            other => {
                return Err(InjectorError::MakingFailed {
                    class: class.clone(),
                    found: other.type_name().to_string(),
                    chain: self.injection_chain(),
                });
            }
        };

        if let Some(hook) = self.registry.prepares.get(class).cloned() {
            instance = self.run_prepare(&hook, instance, class)?;
        }

        let interfaces = match self.reflector.lineage(instance.class()) {
            Ok(lineage) => lineage.interfaces.clone(),
            Err(err) => {
                debug!(class = %class, runtime = %instance.class(), error = %err, "Runtime class has no descriptor");
                return Err(self.unreflected(class, instance.class()));
            }
        };

        for interface in interfaces {
            if let Some(hook) = self.registry.prepares.get(&interface).cloned() {
                trace!(class = %class, interface = %interface, "Running interface prepare hook");
                instance = self.run_prepare(&hook, instance, class)?;
            }
        }

        Ok(instance)
    }

    /// A hook result replaces the instance only if it is still a `class`.
    fn run_prepare(&mut self, hook: &Invokable, instance: Instance, class: &TypeName) -> Result<Instance> {
        let result = self
            .call(hook, vec![Value::Object(instance.clone())])
            .map_err(|err| self.attach_chain(err))?;

        let Value::Object(replacement) = result else {
            return Ok(instance);
        };

        match self.reflector.is_a(replacement.class(), class) {
            Ok(true) => {
                trace!(class = %class, "Prepare hook replaced the instance");
                Ok(replacement)
            }
            Ok(false) => Ok(instance),
            Err(err) => {
                debug!(class = %class, runtime = %replacement.class(), error = %err, "Prepare hook result has no descriptor");
                Err(self.unreflected(class, replacement.class()))
            }
        }
    }

    fn unreflected(&self, class: &TypeName, runtime: &TypeName) -> InjectorError {
        InjectorError::MakingFailed {
            class: class.clone(),
            found: runtime.to_string(),
            chain: self.injection_chain(),
        }
    }
}

impl Default for Injector {
    fn default() -> Self {
        Self::new()
    }
}

/// Duplicates the registrations; shared instances and the reflector are
/// shared by reference, the recursion stack starts empty.
impl Clone for Injector {
    fn clone(&self) -> Self {
        Self {
            reflector: Arc::clone(&self.reflector),
            registry: self.registry.clone(),
            in_progress: Vec::new(),
            max_depth: self.max_depth,
        }
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("registry", &self.registry)
            .field("in_progress", &self.in_progress)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}
