//! Descriptors for classes, constructors, functions and methods.
//!
//! Rust has no runtime reflection, so the injector works from descriptor
//! tables: either generated by `#[derive(Injectable)]` or written by hand
//! with the builders below.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{InjectorError, InvalidInvokableError, InvokableFault, ReflectionError, Result};
use crate::injector::Injector;
use crate::key::TypeName;
use crate::value::{Args, Instance, Value};

/// A native function body: receives the injector, the bound receiver (for
/// instance methods) and the provisioned arguments.
pub type NativeFn = Arc<dyn Fn(&mut Injector, Option<&Instance>, Args) -> Result<Value> + Send + Sync>;

/// Builds an instance of a class from its provisioned constructor arguments.
pub type Factory = Arc<dyn Fn(Args) -> Result<Instance> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Concrete,
    Abstract,
    Interface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// Declared type of a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeHint {
    /// A primitive such as `int` or `string`; never built by the injector.
    Builtin(String),
    /// A class or interface name.
    Class(TypeName),
}

/// A single declared parameter.
///
/// ```
/// use haqn_container::reflection::Parameter;
///
/// let p = Parameter::new("logger").class("App\\Logger").optional();
/// assert_eq!(p.class_hint().unwrap().as_str(), "App\\Logger");
/// assert!(p.is_optional());
/// assert!(!p.has_default());
/// ```
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    position: usize,
    hint: Option<TypeHint>,
    default: Option<Value>,
    optional: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: 0,
            hint: None,
            default: None,
            optional: false,
        }
    }

    /// Declares a class-like type.
    pub fn class(mut self, class: impl Into<TypeName>) -> Self {
        self.hint = Some(TypeHint::Class(class.into()));
        self
    }

    /// Declares a primitive type.
    pub fn builtin(mut self, ty: impl Into<String>) -> Self {
        self.hint = Some(TypeHint::Builtin(ty.into()));
        self
    }

    /// Declares a default value. Implies [`optional`](Self::optional).
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self.optional = true;
        self
    }

    /// Marks the parameter optional without a retrievable default.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub(crate) fn at(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn hint(&self) -> Option<&TypeHint> {
        self.hint.as_ref()
    }

    /// The declared class-like type, ignoring primitives.
    pub fn class_hint(&self) -> Option<&TypeName> {
        match &self.hint {
            Some(TypeHint::Class(class)) => Some(class),
            _ => None,
        }
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    #[inline]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    #[inline]
    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

fn positioned(parameters: impl IntoIterator<Item = Parameter>) -> Arc<[Parameter]> {
    parameters
        .into_iter()
        .enumerate()
        .map(|(position, p)| p.at(position))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionKind {
    Function,
    Closure,
    Method { class: TypeName, is_static: bool },
    Constructor { class: TypeName },
}

/// A callable's signature plus its native body.
#[derive(Clone)]
pub struct FunctionDescriptor {
    name: String,
    kind: FunctionKind,
    visibility: Visibility,
    parameters: Arc<[Parameter]>,
    body: Option<NativeFn>,
}

impl FunctionDescriptor {
    /// Name given to every anonymous function.
    pub const CLOSURE_NAME: &'static str = "{closure}";

    /// A named free function.
    pub fn function<F>(name: impl Into<String>, parameters: impl IntoIterator<Item = Parameter>, body: F) -> Self
    where
        F: Fn(&mut Injector, Args) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: FunctionKind::Function,
            visibility: Visibility::Public,
            parameters: positioned(parameters),
            body: Some(Arc::new(move |injector: &mut Injector, _: Option<&Instance>, args: Args| {
                body(injector, args)
            })),
        }
    }

    /// An anonymous function.
    pub fn closure<F>(parameters: impl IntoIterator<Item = Parameter>, body: F) -> Self
    where
        F: Fn(&mut Injector, Args) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            kind: FunctionKind::Closure,
            ..Self::function(Self::CLOSURE_NAME, parameters, body)
        }
    }

    pub(crate) fn constructor(class: TypeName, parameters: Arc<[Parameter]>, visibility: Visibility) -> Self {
        Self {
            name: "new".to_string(),
            kind: FunctionKind::Constructor { class },
            visibility,
            parameters,
            body: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FunctionKind {
        &self.kind
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn parameters(&self) -> &Arc<[Parameter]> {
        &self.parameters
    }

    /// The declaring class for methods and constructors.
    pub fn class(&self) -> Option<&TypeName> {
        match &self.kind {
            FunctionKind::Method { class, .. } | FunctionKind::Constructor { class } => Some(class),
            _ => None,
        }
    }

    pub fn is_static(&self) -> bool {
        !matches!(self.kind, FunctionKind::Method { is_static: false, .. })
    }

    pub fn is_closure(&self) -> bool {
        self.kind == FunctionKind::Closure
    }

    /// `Class::method` for methods and constructors, the bare name otherwise.
    pub fn display_name(&self) -> String {
        match self.class() {
            Some(class) => format!("{class}::{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Runs the body with already provisioned arguments.
    pub fn call(&self, injector: &mut Injector, receiver: Option<&Instance>, args: Args) -> Result<Value> {
        let Some(body) = &self.body else {
            return Err(InjectorError::InvalidInvokable(InvalidInvokableError::new(
                self.display_name(),
                InvokableFault::NotInvokable,
            )));
        };

        if !self.is_static() && receiver.is_none() {
            return Err(InjectorError::InvalidInvokable(InvalidInvokableError::new(
                self.display_name(),
                InvokableFault::NotInvokable,
            )));
        }

        body(injector, receiver, args)
    }
}

impl fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("visibility", &self.visibility)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Everything the injector needs to know about a class.
///
/// # Examples
/// ```
/// use haqn_container::reflection::{ClassDescriptor, Parameter};
///
/// struct Mailer {
///     sender: String,
/// }
///
/// let mailer = ClassDescriptor::new("App\\Mailer")
///     .implements("App\\Transport")
///     .constructor([Parameter::new("sender")], |args| {
///         Ok(Mailer { sender: args.get(0)? })
///     });
///
/// assert!(mailer.is_instantiable());
/// assert_eq!(mailer.constructor_descriptor().unwrap().parameters().len(), 1);
/// ```
#[derive(Clone)]
pub struct ClassDescriptor {
    name: TypeName,
    kind: ClassKind,
    parent: Option<TypeName>,
    interfaces: Vec<TypeName>,
    constructor: Option<Arc<FunctionDescriptor>>,
    factory: Option<Factory>,
    methods: HashMap<String, Arc<FunctionDescriptor>>,
}

impl ClassDescriptor {
    /// A concrete class with no constructor and no factory yet.
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            kind: ClassKind::Concrete,
            parent: None,
            interfaces: Vec::new(),
            constructor: None,
            factory: None,
            methods: HashMap::new(),
        }
    }

    pub fn interface(name: impl Into<TypeName>) -> Self {
        Self {
            kind: ClassKind::Interface,
            ..Self::new(name)
        }
    }

    pub fn abstract_class(name: impl Into<TypeName>) -> Self {
        Self {
            kind: ClassKind::Abstract,
            ..Self::new(name)
        }
    }

    /// Adds an implemented interface. For interfaces this names a parent
    /// interface.
    pub fn implements(mut self, interface: impl Into<TypeName>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn extends(mut self, parent: impl Into<TypeName>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Declares a public constructor and the factory that runs it.
    pub fn constructor<T, F>(self, parameters: impl IntoIterator<Item = Parameter>, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(Args) -> Result<T> + Send + Sync + 'static,
    {
        let class = self.name.clone();
        let parameters = positioned(parameters);
        let ctor = FunctionDescriptor::constructor(class.clone(), parameters, Visibility::Public);
        Self {
            constructor: Some(Arc::new(ctor)),
            factory: Some(Arc::new(move |args: Args| {
                Ok(Instance::new(class.clone(), factory(args)?))
            })),
            ..self
        }
    }

    /// Declares a class without a constructor, built by `factory`.
    pub fn without_constructor<T, F>(self, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let class = self.name.clone();
        Self {
            constructor: None,
            factory: Some(Arc::new(move |_: Args| Ok(Instance::new(class.clone(), factory())))),
            ..self
        }
    }

    /// Restricts the visibility of an already declared constructor.
    pub fn constructor_visibility(mut self, visibility: Visibility) -> Self {
        if let Some(ctor) = self.constructor.take() {
            let ctor = FunctionDescriptor::constructor(self.name.clone(), Arc::clone(&ctor.parameters), visibility);
            self.constructor = Some(Arc::new(ctor));
        }
        self
    }

    /// Adds an instance method.
    pub fn method<F>(self, name: impl Into<String>, parameters: impl IntoIterator<Item = Parameter>, body: F) -> Self
    where
        F: Fn(&mut Injector, &Instance, Args) -> Result<Value> + Send + Sync + 'static,
    {
        let body: NativeFn = Arc::new(move |injector: &mut Injector, receiver: Option<&Instance>, args: Args| match receiver {
            Some(receiver) => body(injector, receiver, args),
            None => Err(InjectorError::ConfigInvalid(
                "instance method called without a receiver".to_string(),
            )),
        });
        self.with_method(name.into(), false, positioned(parameters), body)
    }

    /// Adds a static method.
    pub fn static_method<F>(self, name: impl Into<String>, parameters: impl IntoIterator<Item = Parameter>, body: F) -> Self
    where
        F: Fn(&mut Injector, Args) -> Result<Value> + Send + Sync + 'static,
    {
        let body: NativeFn =
            Arc::new(move |injector: &mut Injector, _: Option<&Instance>, args: Args| body(injector, args));
        self.with_method(name.into(), true, positioned(parameters), body)
    }

    fn with_method(mut self, name: String, is_static: bool, parameters: Arc<[Parameter]>, body: NativeFn) -> Self {
        let descriptor = FunctionDescriptor {
            name: name.clone(),
            kind: FunctionKind::Method {
                class: self.name.clone(),
                is_static,
            },
            visibility: Visibility::Public,
            parameters,
            body: Some(body),
        };
        self.methods.insert(name.to_lowercase(), Arc::new(descriptor));
        self
    }

    #[inline]
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    pub fn parent(&self) -> Option<&TypeName> {
        self.parent.as_ref()
    }

    /// Directly declared interfaces.
    pub fn interfaces(&self) -> &[TypeName] {
        &self.interfaces
    }

    pub fn is_instantiable(&self) -> bool {
        self.kind == ClassKind::Concrete
            && self
                .constructor
                .as_ref()
                .is_none_or(|ctor| ctor.visibility == Visibility::Public)
    }

    pub fn constructor_descriptor(&self) -> Option<&Arc<FunctionDescriptor>> {
        self.constructor.as_ref()
    }

    /// Looks up a method declared on this class (case-insensitive).
    pub fn declared_method(&self, name: &str) -> Option<&Arc<FunctionDescriptor>> {
        self.methods.get(&name.to_lowercase())
    }

    /// Runs the factory with provisioned constructor arguments.
    pub fn instantiate(&self, args: Args) -> Result<Instance> {
        match &self.factory {
            Some(factory) => factory(args),
            None => Err(ReflectionError::MissingFactory(self.name.clone()).into()),
        }
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.methods.values().map(|m| m.name()).collect();
        methods.sort_unstable();

        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("interfaces", &self.interfaces)
            .field("constructor", &self.constructor)
            .field("methods", &methods)
            .finish_non_exhaustive()
    }
}

/// A Rust type with a class descriptor.
///
/// Usually derived:
///
/// ```rust,ignore
/// #[derive(Injectable)]
/// #[injectable(name = "App\\Mailer", implements = "App\\Transport")]
/// struct Mailer {
///     transport: Arc<SmtpTransport>,
///     #[inject(default = "noreply@example.com")]
///     sender: String,
/// }
/// ```
pub trait Injectable: Any + Send + Sync {
    /// The class name the descriptor is registered under.
    const NAME: &'static str;

    fn descriptor() -> ClassDescriptor;
}

/// A class descriptor submitted at build time.
///
/// `#[derive(Injectable)]` emits one of these per type through
/// `inventory::submit!`; [`DescriptorTable::from_inventory`](super::DescriptorTable::from_inventory)
/// collects them.
pub struct ClassRegistration {
    build: fn() -> ClassDescriptor,
}

impl ClassRegistration {
    pub const fn new(build: fn() -> ClassDescriptor) -> Self {
        Self { build }
    }

    pub fn descriptor(&self) -> ClassDescriptor {
        (self.build)()
    }
}

inventory::collect!(ClassRegistration);
