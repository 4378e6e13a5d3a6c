//! Core injector implementation for Haqn DI.
//!
//! Types are described by [`ClassDescriptor`](reflection::ClassDescriptor)s,
//! usually generated by `#[derive(Injectable)]`. The [`Injector`] builds
//! them by name, recursively provisioning constructor parameters.

pub mod arguments;
pub mod chain;
pub mod config;
pub mod error;
pub mod injector;
pub mod invoker;
pub mod key;
pub mod provider;
pub mod reflection;
pub mod registry;
pub mod value;

#[cfg(test)]
mod fixtures;

pub use arguments::{Arguments, Override};
pub use chain::InjectionChain;
pub use config::{ConfigMappings, ConfigSource};
pub use error::{ErrorKind, InjectorError, ReflectionError, Result};
pub use injector::{Injector, InjectorBuilder};
pub use invoker::{Executable, Invokable, Receiver};
pub use key::TypeName;
pub use provider::Provider;
pub use reflection::Injectable;
pub use registry::{Inspect, Inspection, Share};
pub use value::{Args, FromValue, Instance, Value};

#[doc(hidden)]
pub use inventory;

pub mod prelude {
    pub use crate::arguments::{Arguments, Override};
    pub use crate::chain::InjectionChain;
    pub use crate::config::{ConfigMappings, ConfigSource};
    pub use crate::error::{ErrorKind, InjectorError, Result};
    pub use crate::injector::{Injector, InjectorBuilder};
    pub use crate::invoker::Invokable;
    pub use crate::key::TypeName;
    pub use crate::provider::Provider;
    pub use crate::reflection::{ClassDescriptor, DescriptorTable, FunctionDescriptor, Injectable, Parameter};
    pub use crate::registry::{Inspect, Share};
    pub use crate::value::{Args, Instance, Value};
}
