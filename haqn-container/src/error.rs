//! Error types for injector operations.
//!
//! Build-time failures carry the injection chain that was being built when
//! they were raised, so a caller can see which dependency path failed.

use std::fmt;

use haqn_support::rendering::{shorten_type_name, truncate_callable};

use crate::chain::InjectionChain;
use crate::key::TypeName;
use crate::value::ValueError;

/// Main error type for all injector operations.
#[derive(Debug, thiserror::Error)]
pub enum InjectorError {
    /// Malformed registration arguments.
    #[error("{0}")]
    ConfigInvalid(String),

    /// `alias()` was called for a type that already holds a shared instance.
    #[error("Cannot alias class {original} to {alias} because it is currently shared")]
    SharedCannotAlias { original: TypeName, alias: TypeName },

    /// `share()` was given an instance whose class is aliased elsewhere.
    #[error("Cannot share class {class} because it is currently aliased to {alias}")]
    AliasedCannotShare { class: TypeName, alias: TypeName },

    /// An interface or abstract class was requested with nothing resolving it.
    #[error("{}", .0)]
    NeedsDefinition(NeedsDefinitionError),

    /// The constructor exists but is not public.
    #[error("Cannot instantiate protected/private constructor in class {class}")]
    NonPublicConstructor {
        class: TypeName,
        chain: InjectionChain,
    },

    /// A typeless parameter had nothing to provision it.
    #[error("{}", .0)]
    UndefinedParameter(UndefinedParameterError),

    /// A type is required to build itself.
    #[error("{}", .0)]
    CyclicDependency(CyclicDependencyError),

    /// Reflection or instantiation failed underneath a build.
    #[error("Could not make {class}: {source}")]
    MakeFailure {
        class: TypeName,
        #[source]
        source: Box<InjectorError>,
        chain: InjectionChain,
    },

    /// A supplied callable does not resolve to anything executable.
    #[error("{}", .0)]
    InvalidInvokable(InvalidInvokableError),

    /// A delegate, constructor or hook produced something other than an
    /// object, or an object whose runtime class cannot be reflected.
    #[error("Making {class} did not result in an object, instead result is of type '{found}'")]
    MakingFailed {
        class: TypeName,
        found: String,
        chain: InjectionChain,
    },

    /// Introspection failure.
    #[error(transparent)]
    Reflection(#[from] ReflectionError),

    /// A native body received an argument it cannot convert.
    #[error("Invalid argument at position {position}: {source}")]
    InvalidArgument {
        position: usize,
        #[source]
        source: ValueError,
    },

    /// A typed make got an object of another Rust type.
    #[error("Making {class} produced an object that is not a {expected}")]
    TypeMismatch {
        class: TypeName,
        expected: &'static str,
    },

    /// The dependency graph is deeper than the configured limit.
    #[error("Maximum injection depth of {limit} exceeded while provisioning {class}")]
    RecursionLimit {
        class: TypeName,
        limit: usize,
        chain: InjectionChain,
    },

    /// Registering configuration mappings failed.
    #[error("Failed to process configuration mappings: {source}")]
    InvalidMappings {
        #[source]
        source: Box<InjectorError>,
    },

    /// A user-supplied body failed.
    #[error("Callable failed: {0}")]
    Callable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Fieldless discriminant of [`InjectorError`], for matching by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ConfigInvalid,
    SharedCannotAlias,
    AliasedCannotShare,
    NeedsDefinition,
    NonPublicConstructor,
    UndefinedParameter,
    CyclicDependency,
    MakeFailure,
    InvalidInvokable,
    MakingFailed,
    Reflection,
    InvalidArgument,
    TypeMismatch,
    RecursionLimit,
    InvalidMappings,
    Callable,
}

impl InjectorError {
    /// Wraps a foreign error raised inside a delegate, hook or factory.
    pub fn callable(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Callable(err.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigInvalid(_) => ErrorKind::ConfigInvalid,
            Self::SharedCannotAlias { .. } => ErrorKind::SharedCannotAlias,
            Self::AliasedCannotShare { .. } => ErrorKind::AliasedCannotShare,
            Self::NeedsDefinition(_) => ErrorKind::NeedsDefinition,
            Self::NonPublicConstructor { .. } => ErrorKind::NonPublicConstructor,
            Self::UndefinedParameter(_) => ErrorKind::UndefinedParameter,
            Self::CyclicDependency(_) => ErrorKind::CyclicDependency,
            Self::MakeFailure { .. } => ErrorKind::MakeFailure,
            Self::InvalidInvokable(_) => ErrorKind::InvalidInvokable,
            Self::MakingFailed { .. } => ErrorKind::MakingFailed,
            Self::Reflection(_) => ErrorKind::Reflection,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::RecursionLimit { .. } => ErrorKind::RecursionLimit,
            Self::InvalidMappings { .. } => ErrorKind::InvalidMappings,
            Self::Callable(_) => ErrorKind::Callable,
        }
    }

    /// The injection chain captured when a build-time failure was raised.
    pub fn dependency_chain(&self) -> Option<&InjectionChain> {
        match self {
            Self::NeedsDefinition(e) => Some(&e.chain),
            Self::NonPublicConstructor { chain, .. }
            | Self::MakeFailure { chain, .. }
            | Self::MakingFailed { chain, .. }
            | Self::RecursionLimit { chain, .. } => Some(chain),
            Self::UndefinedParameter(e) => Some(&e.chain),
            Self::CyclicDependency(e) => Some(&e.chain),
            Self::InvalidInvokable(e) => e.chain.as_ref(),
            Self::InvalidMappings { source } => source.dependency_chain(),
            _ => None,
        }
    }
}

/// What kind of non-instantiable type was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uninstantiable {
    Interface,
    AbstractClass,
}

impl fmt::Display for Uninstantiable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interface => f.write_str("interface"),
            Self::AbstractClass => f.write_str("abstract class"),
        }
    }
}

#[derive(Debug)]
pub struct NeedsDefinitionError {
    pub kind: Uninstantiable,
    pub class: TypeName,
    pub chain: InjectionChain,
}

impl fmt::Display for NeedsDefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Injection definition required for {} {}", self.kind, self.class)?;
        write!(
            f,
            "\n  Hint: alias {} to a concrete class, or register a delegate or shared instance for it",
            shorten_type_name(self.class.as_str())
        )
    }
}

#[derive(Debug)]
pub struct UndefinedParameterError {
    pub name: String,
    pub position: usize,
    /// Display name of the function or constructor declaring the parameter.
    pub function: String,
    pub chain: InjectionChain,
}

impl fmt::Display for UndefinedParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No definition available to provision typeless parameter ${} at position {} in {}(). Injection Chain: {}",
            self.name, self.position, self.function, self.chain
        )
    }
}

/// Shows the chain that was being built when the cycle closed.
#[derive(Debug)]
pub struct CyclicDependencyError {
    /// The type requested a second time.
    pub class: TypeName,
    /// The stack at detection time, excluding the repeated request.
    pub chain: InjectionChain,
}

impl fmt::Display for CyclicDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Detected a cyclic dependency while provisioning {}", self.class)?;
        write!(f, "\n  Injection Chain: {} → {}", self.chain, self.class)?;
        write!(
            f,
            "\n  Hint: Consider a delegate or a shared instance to break the cycle"
        )
    }
}

/// Why a callable could not be turned into an executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokableFault {
    /// The shape is not one of the recognized callable forms.
    Malformed,
    UnknownFunction,
    UnknownMethod,
    /// An object or class without an invoke method.
    NotInvokable,
}

#[derive(Debug)]
pub struct InvalidInvokableError {
    /// Description of the rejected callable, if it had one.
    pub callable: Option<String>,
    pub fault: InvokableFault,
    /// Set when the callable was a delegate or hook reached during a build.
    pub chain: Option<InjectionChain>,
}

impl InvalidInvokableError {
    pub fn new(callable: impl Into<String>, fault: InvokableFault) -> Self {
        Self {
            callable: Some(callable.into()),
            fault,
            chain: None,
        }
    }
}

impl fmt::Display for InvalidInvokableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Invalid invokable: callable or provisional string required")?;
        if let Some(callable) = &self.callable {
            write!(f, ". Invalid callable was '{}'", truncate_callable(callable))?;
        }
        match self.fault {
            InvokableFault::Malformed => Ok(()),
            InvokableFault::UnknownFunction => write!(f, "\n  Reason: no such function"),
            InvokableFault::UnknownMethod => write!(f, "\n  Reason: no such method on the receiver"),
            InvokableFault::NotInvokable => {
                write!(f, "\n  Reason: the receiver has no invoke method")
            }
        }
    }
}

/// Failures of the descriptor lookup layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReflectionError {
    #[error("{}", .0)]
    ClassNotFound(ClassNotFoundError),

    #[error("Function {0} does not exist")]
    FunctionNotFound(String),

    #[error("Method {class}::{method}() does not exist")]
    MethodNotFound { class: TypeName, method: String },

    #[error("Class {0} does not have a parent")]
    NoParent(TypeName),

    #[error("Class {0} has no factory to instantiate it with")]
    MissingFactory(TypeName),
}

#[derive(Debug, Clone)]
pub struct ClassNotFoundError {
    pub class: TypeName,
    /// Known class names close to the requested one.
    pub suggestions: Vec<String>,
}

impl fmt::Display for ClassNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class {} does not exist", self.class)?;

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }
        Ok(())
    }
}

/// Convenient Result type for injector operations.
pub type Result<T> = std::result::Result<T, InjectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(names: &[&str]) -> InjectionChain {
        InjectionChain::new(names.iter().map(|n| TypeName::new(n)).collect())
    }

    #[test]
    fn cyclic_dependency_display() {
        let err = InjectorError::CyclicDependency(CyclicDependencyError {
            class: "X".into(),
            chain: chain(&["X", "Y"]),
        });

        let msg = err.to_string();
        assert!(msg.starts_with("Detected a cyclic dependency while provisioning X"));
        assert!(msg.contains("X → Y → X"));
        assert_eq!(err.kind(), ErrorKind::CyclicDependency);
        assert_eq!(err.dependency_chain().unwrap().len(), 2);
    }

    #[test]
    fn undefined_parameter_display() {
        let err = InjectorError::UndefinedParameter(UndefinedParameterError {
            name: "thumbnailSize".into(),
            position: 1,
            function: "Gallery::__construct".into(),
            chain: chain(&["App", "Gallery"]),
        });

        assert_eq!(
            err.to_string(),
            "No definition available to provision typeless parameter $thumbnailSize at position 1 \
             in Gallery::__construct(). Injection Chain: App → Gallery"
        );
    }

    #[test]
    fn invalid_invokable_truncates_description() {
        let long = format!("App\\{}::run", "X".repeat(400));
        let err = InvalidInvokableError::new(long, InvokableFault::UnknownMethod);

        let msg = err.to_string();
        assert!(msg.starts_with("Invalid invokable: callable or provisional string required"));
        assert!(msg.contains("no such method"));
        assert!(msg.len() < 400);
        assert!(InjectorError::InvalidInvokable(err).dependency_chain().is_none());
    }

    #[test]
    fn needs_definition_names_kind() {
        let err = InjectorError::NeedsDefinition(NeedsDefinitionError {
            kind: Uninstantiable::Interface,
            class: "App\\Transport".into(),
            chain: chain(&["App\\Transport"]),
        });

        assert!(err.to_string().starts_with("Injection definition required for interface App\\Transport"));
    }

    #[test]
    fn make_failure_wraps_reflection_cause() {
        let err = InjectorError::MakeFailure {
            class: "Missing".into(),
            source: Box::new(
                ReflectionError::ClassNotFound(ClassNotFoundError {
                    class: "Missing".into(),
                    suggestions: vec!["Mission".into()],
                })
                .into(),
            ),
            chain: chain(&["Missing"]),
        };

        let msg = err.to_string();
        assert!(msg.starts_with("Could not make Missing: Class Missing does not exist"));
        assert!(msg.contains("- Mission"));
        assert_eq!(err.kind(), ErrorKind::MakeFailure);
    }

    #[test]
    fn mappings_error_exposes_inner_chain() {
        let inner = InjectorError::MakingFailed {
            class: "Iface".into(),
            found: "null".to_string(),
            chain: chain(&["Iface"]),
        };
        let err = InjectorError::InvalidMappings {
            source: Box::new(inner),
        };

        assert_eq!(err.kind(), ErrorKind::InvalidMappings);
        assert_eq!(err.dependency_chain().unwrap().chain()[0], TypeName::new("Iface"));
    }
}
