//! Turning callables into executables.
//!
//! An [`Invokable`] is anything the injector accepts where a callable is
//! expected: a function name, a `Class::method` string, a class whose
//! instances have an `invoke` method, a `(class or instance, method)` pair,
//! an invokable object or a native closure. Building one yields an
//! [`Executable`], a function descriptor plus its bound receiver.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::{InjectorError, InvalidInvokableError, InvokableFault, ReflectionError, Result};
use crate::injector::Injector;
use crate::key::TypeName;
use crate::reflection::{FunctionDescriptor, MethodTarget, Parameter};
use crate::value::{Args, Instance, Value};

/// Method called on invokable objects.
pub const INVOKE_METHOD: &str = "invoke";

/// Separator of `Class::parent::method` strings.
const PARENT_CALL: &str = "::parent::";

/// The receiver half of a `(receiver, method)` pair.
#[derive(Debug, Clone)]
pub enum Receiver {
    /// Static call, or the class is built first for instance methods.
    Class(String),
    Instance(Instance),
}

/// Something that can be built into an [`Executable`].
#[derive(Clone)]
pub enum Invokable {
    /// Function name, invokable class name or `Class::method` string.
    Name(String),
    Method(Receiver, String),
    /// An object with an `invoke` method.
    Object(Instance),
    Closure(Arc<FunctionDescriptor>),
}

impl Invokable {
    /// A native closure with declared parameters.
    pub fn closure<F>(parameters: impl IntoIterator<Item = Parameter>, body: F) -> Self
    where
        F: Fn(&mut Injector, Args) -> Result<Value> + Send + Sync + 'static,
    {
        Self::Closure(Arc::new(FunctionDescriptor::closure(parameters, body)))
    }

    /// A `Class::method` pair.
    pub fn method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self::Method(Receiver::Class(class.into()), method.into())
    }

    /// Human-readable form used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Invokable::Name(name) => name.clone(),
            Invokable::Method(Receiver::Class(class), method) => format!("{class}::{method}"),
            Invokable::Method(Receiver::Instance(instance), method) => {
                format!("{}::{method}", instance.class())
            }
            Invokable::Object(instance) => format!("object({})", instance.class()),
            Invokable::Closure(function) => function.display_name(),
        }
    }
}

impl fmt::Debug for Invokable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invokable({})", self.describe())
    }
}

impl From<&str> for Invokable {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Invokable {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Instance> for Invokable {
    fn from(instance: Instance) -> Self {
        Self::Object(instance)
    }
}

impl From<FunctionDescriptor> for Invokable {
    fn from(function: FunctionDescriptor) -> Self {
        Self::Closure(Arc::new(function))
    }
}

impl From<(&str, &str)> for Invokable {
    fn from((class, method): (&str, &str)) -> Self {
        Self::method(class, method)
    }
}

impl From<(Instance, &str)> for Invokable {
    fn from((instance, method): (Instance, &str)) -> Self {
        Self::Method(Receiver::Instance(instance), method.to_string())
    }
}

/// Reads a callable out of configuration data. Hands the value back if it
/// has no callable shape.
impl TryFrom<Value> for Invokable {
    type Error = Value;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        match value {
            Value::Str(name) if !name.is_empty() => Ok(Invokable::Name(name)),
            Value::Invokable(invokable) => Ok(invokable),
            Value::Object(instance) => Ok(Invokable::Object(instance)),
            Value::List(items) => match items.as_slice() {
                [Value::Str(class), Value::Str(method)] => Ok(Invokable::method(class.clone(), method.clone())),
                [Value::Object(instance), Value::Str(method)] => Ok(Invokable::Method(
                    Receiver::Instance(instance.clone()),
                    method.clone(),
                )),
                _ => Err(Value::List(items)),
            },
            other => Err(other),
        }
    }
}

/// A function descriptor bound to its receiver, ready to call.
#[derive(Debug, Clone)]
pub struct Executable {
    function: Arc<FunctionDescriptor>,
    receiver: Option<Instance>,
}

impl Executable {
    pub fn new(function: Arc<FunctionDescriptor>, receiver: Option<Instance>) -> Self {
        Self { function, receiver }
    }

    pub fn function(&self) -> &Arc<FunctionDescriptor> {
        &self.function
    }

    pub fn receiver(&self) -> Option<&Instance> {
        self.receiver.as_ref()
    }

    /// Calls the function with already provisioned arguments.
    pub fn invoke(&self, injector: &mut Injector, args: Vec<Value>) -> Result<Value> {
        self.function.call(injector, self.receiver.as_ref(), Args::new(args))
    }
}

fn invalid(description: &str, fault: InvokableFault) -> InjectorError {
    InjectorError::InvalidInvokable(InvalidInvokableError::new(description, fault))
}

fn invalid_from(description: &str, err: &ReflectionError) -> InjectorError {
    let fault = match err {
        ReflectionError::FunctionNotFound(_) => InvokableFault::UnknownFunction,
        ReflectionError::MethodNotFound { .. } => InvokableFault::UnknownMethod,
        _ => InvokableFault::Malformed,
    };
    invalid(description, fault)
}

impl Injector {
    /// Builds an executable, making receivers that must be instantiated.
    ///
    /// # Errors
    /// [`InjectorError::InvalidInvokable`] when the callable does not
    /// resolve; build errors of receivers propagate unchanged.
    pub fn build_executable(&mut self, invokable: &Invokable) -> Result<Executable> {
        match invokable {
            Invokable::Closure(function) => Ok(Executable::new(Arc::clone(function), None)),
            Invokable::Object(instance) => self.bound_method(instance, INVOKE_METHOD, &invokable.describe()),
            Invokable::Method(Receiver::Instance(instance), method) => {
                self.bound_method(instance, method, &invokable.describe())
            }
            Invokable::Method(Receiver::Class(class), method) => self.class_method(class, method),
            Invokable::Name(name) => self.string_executable(name),
        }
    }

    /// Whether `invokable` would build, without instantiating anything.
    pub fn is_executable(&self, invokable: &Invokable) -> bool {
        match invokable {
            Invokable::Closure(_) => true,
            Invokable::Object(instance) => self.has_method(MethodTarget::Instance(instance), INVOKE_METHOD),
            Invokable::Method(Receiver::Instance(instance), method) => {
                self.has_method(MethodTarget::Instance(instance), method)
            }
            Invokable::Method(Receiver::Class(class), method) => {
                let class = self.registry.resolve_alias(&TypeName::new(class));
                self.has_method(MethodTarget::Class(&class), method)
            }
            Invokable::Name(name) => {
                if name.is_empty() {
                    return false;
                }
                if self.reflector.function(name).is_ok() {
                    return true;
                }
                let class = TypeName::new(name);
                if self.reflector.class(&class).is_ok() {
                    return self.has_method(MethodTarget::Class(&class), INVOKE_METHOD);
                }
                if let Some((class, method)) = name.split_once(PARENT_CALL) {
                    return self
                        .reflector
                        .class(&TypeName::new(class))
                        .ok()
                        .and_then(|c| c.parent().cloned())
                        .is_some_and(|parent| self.has_method(MethodTarget::Class(&parent), method));
                }
                name.rsplit_once("::").is_some_and(|(class, method)| {
                    let class = self.registry.resolve_alias(&TypeName::new(class));
                    self.has_method(MethodTarget::Class(&class), method)
                })
            }
        }
    }

    fn has_method(&self, target: MethodTarget<'_>, method: &str) -> bool {
        self.reflector.method(target, method).is_ok()
    }

    fn bound_method(&mut self, instance: &Instance, method: &str, description: &str) -> Result<Executable> {
        let function = self
            .reflector
            .method(MethodTarget::Instance(instance), method)
            .map_err(|err| match err {
                ReflectionError::MethodNotFound { .. } if method == INVOKE_METHOD => {
                    invalid(description, InvokableFault::NotInvokable)
                }
                err => invalid_from(description, &err),
            })?;
        Ok(Executable::new(function, Some(instance.clone())))
    }

    fn string_executable(&mut self, name: &str) -> Result<Executable> {
        if name.is_empty() {
            return Err(invalid(name, InvokableFault::Malformed));
        }

        if let Ok(function) = self.reflector.function(name) {
            trace!(function = name, "Executable is a free function");
            return Ok(Executable::new(function, None));
        }

        let class = TypeName::new(name);
        if self.reflector.class(&class).is_ok()
            && self.has_method(MethodTarget::Class(&class), INVOKE_METHOD)
        {
            trace!(class = %class, "Executable is an invokable class");
            let instance = self.make(name)?;
            return self.bound_method(&instance, INVOKE_METHOD, name);
        }

        if let Some((class, method)) = name.split_once(PARENT_CALL) {
            let parent = self
                .reflector
                .class(&TypeName::new(class))
                .map_err(|err| invalid_from(name, &err))?
                .parent()
                .cloned()
                .ok_or_else(|| invalid(name, InvokableFault::Malformed))?;
            let function = self
                .reflector
                .method(MethodTarget::Class(&parent), method)
                .map_err(|err| invalid_from(name, &err))?;
            return Ok(Executable::new(function, None));
        }

        match name.rsplit_once("::") {
            Some((class, method)) if !class.is_empty() && !method.is_empty() => self.class_method(class, method),
            _ => Err(invalid(name, InvokableFault::UnknownFunction)),
        }
    }

    fn class_method(&mut self, class: &str, method: &str) -> Result<Executable> {
        let description = format!("{class}::{method}");
        let concrete = self.registry.resolve_alias(&TypeName::new(class));

        let function = self
            .reflector
            .method(MethodTarget::Class(&concrete), method)
            .map_err(|err| invalid_from(&description, &err))?;
        if function.is_static() {
            return Ok(Executable::new(function, None));
        }

        let instance = self.make(class)?;
        // The built instance may be a subclass overriding the method.
        self.bound_method(&instance, method, &description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn reads_callables_from_config_values() {
        assert!(matches!(Invokable::try_from(Value::from("strlen")), Ok(Invokable::Name(_))));
        assert!(matches!(
            Invokable::try_from(Value::List(vec![Value::from("Greeter"), Value::from("hello")])),
            Ok(Invokable::Method(Receiver::Class(_), _))
        ));
        assert!(Invokable::try_from(Value::Int(3)).is_err());
        assert!(Invokable::try_from(Value::from("")).is_err());
    }

    #[test]
    fn builds_free_functions_and_static_methods() {
        let mut injector = fixtures::injector();

        let answer = injector.build_executable(&"fixtures\\answer".into()).unwrap();
        assert!(answer.receiver().is_none());
        assert_eq!(answer.invoke(&mut injector, vec![]).unwrap(), Value::Int(42));

        let hello = injector.build_executable(&"Greeter::hello".into()).unwrap();
        assert!(hello.receiver().is_none());
        assert_eq!(
            hello.invoke(&mut injector, vec![Value::from("you")]).unwrap(),
            Value::from("hello you")
        );
    }

    #[test]
    fn invokable_class_names_are_made_first() {
        let mut injector = fixtures::injector();
        let exe = injector.build_executable(&"Doubler".into()).unwrap();

        assert_eq!(exe.receiver().unwrap().class(), &TypeName::new("Doubler"));
        assert_eq!(exe.invoke(&mut injector, vec![Value::Int(4)]).unwrap(), Value::Int(8));
    }

    #[test]
    fn instance_methods_bind_a_made_receiver() {
        let mut injector = fixtures::injector();
        let exe = injector.build_executable(&Invokable::method("Counter", "next")).unwrap();
        assert!(exe.receiver().is_some());
    }

    #[test]
    fn parent_calls_resolve_on_the_parent_class() {
        let mut injector = fixtures::injector();
        let exe = injector.build_executable(&"LoudGreeter::parent::hello".into()).unwrap();

        assert_eq!(exe.function().display_name(), "Greeter::hello");
        assert!(exe.receiver().is_none());
    }

    #[test]
    fn unrecognized_shapes_are_invalid() {
        let mut injector = fixtures::injector();

        for (invokable, fault) in [
            (Invokable::from("no_such_function"), InvokableFault::UnknownFunction),
            (Invokable::from("Greeter::missing"), InvokableFault::UnknownMethod),
            (Invokable::from(Instance::new("Plain", ())), InvokableFault::NotInvokable),
        ] {
            assert!(!injector.is_executable(&invokable));
            match injector.build_executable(&invokable) {
                Err(InjectorError::InvalidInvokable(e)) => assert_eq!(e.fault, fault, "{invokable:?}"),
                other => panic!("Expected InvalidInvokable for {invokable:?}, got: {other:?}"),
            }
        }
    }

    #[test]
    fn recognized_shapes_are_executable() {
        let injector = fixtures::injector();
        for invokable in [
            Invokable::from("fixtures\\answer"),
            Invokable::from("Greeter::hello"),
            Invokable::from("Doubler"),
            Invokable::method("Counter", "next"),
            Invokable::from("LoudGreeter::parent::hello"),
            Invokable::closure([], |_, _| Ok(Value::Null)),
        ] {
            assert!(injector.is_executable(&invokable), "{invokable:?}");
        }
    }
}
