//! Provider trait: a module of related registrations.
//!
//! # Examples
//! ```rust
//! use haqn_container::prelude::*;
//!
//! struct MailProvider;
//!
//! impl Provider for MailProvider {
//!     fn register(&self, injector: &mut Injector) -> haqn_container::Result<()> {
//!         injector.alias("App\\Transport", "App\\SmtpTransport")?;
//!         injector.share("App\\Transport")?;
//!         Ok(())
//!     }
//! }
//!
//! let mut injector = Injector::builder().introspector(DescriptorTable::new()).build();
//! injector.add_provider(&MailProvider).unwrap();
//! assert_eq!(injector.inspect(None, Inspect::ALIASES).aliases.len(), 1);
//! ```

use crate::error::Result;
use crate::injector::Injector;

/// A module that registers related definitions into an injector.
///
/// Split registrations by domain instead of one long setup block:
///
/// ```rust,ignore
/// injector.add_provider(&DatabaseProvider)?;
/// injector.add_provider(&MailProvider)?;
/// ```
pub trait Provider: Send + Sync {
    /// Registers aliases, shares, definitions, delegates and hooks.
    fn register(&self, injector: &mut Injector) -> Result<()>;

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> Provider for F
where
    F: Fn(&mut Injector) -> Result<()> + Send + Sync,
{
    fn register(&self, injector: &mut Injector) -> Result<()> {
        self(injector)
    }
}
