//! Descriptor-based reflection and its caches.
//!
//! ```text
//! TypeIntrospector ──> StandardReflector ──> CachingReflector ──> Injector
//!  (descriptor table)                          │
//!                                      ReflectionCache
//!                           (ArrayCache / TtlCache / TieredCache)
//! ```

pub mod cache;
pub mod descriptor;
pub mod introspector;
pub mod reflector;

pub use cache::{ArrayCache, Cached, ReflectionCache, TieredCache, TtlCache};
pub use descriptor::{
    ClassDescriptor, ClassKind, ClassRegistration, Factory, FunctionDescriptor, FunctionKind, Injectable, NativeFn,
    Parameter, TypeHint, Visibility,
};
pub use introspector::{DescriptorTable, TypeIntrospector};
pub use reflector::{CachingReflector, Lineage, MethodTarget, ReflectionResult, Reflector, StandardReflector};
