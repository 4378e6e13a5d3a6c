//! Procedural macros for Haqn DI.
//!
//! * `#[derive(Injectable)]` - generates a class descriptor and registers it
//!   for [`DescriptorTable::from_inventory`].
//!
//! Use these through the `haqn` crate; the generated code refers to
//! `::haqn` paths.

use proc_macro::TokenStream;

mod injectable;

/// Derives `haqn::Injectable` and submits the descriptor at build time.
///
/// ```ignore
/// #[derive(Injectable)]
/// #[injectable(name = "App\\Mailer", implements = "App\\Transport")]
/// struct Mailer {
///     transport: Arc<SmtpTransport>,
///     #[inject(name = "sender", default = "noreply@example.com")]
///     from: String,
///     #[inject(skip)]
///     sent: AtomicUsize,
/// }
/// ```
///
/// # Container attributes
///
/// - `name = "..."` - class name (default: module path and type name)
/// - `implements = "..."` - an implemented interface, repeatable
/// - `extends = "..."` - parent class
///
/// # Field attributes
///
/// - `name = "..."` - parameter name (default: field name)
/// - `class = "..."` - class type hint; inferred for `Arc<T>` and
///   `Option<Arc<T>>` where `T: Injectable`
/// - `default = <literal>` - declared default value
/// - `optional` - optional without a default
/// - `skip` - not a parameter, initialized with `Default::default()`
#[proc_macro_derive(Injectable, attributes(injectable, inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    injectable::derive_injectable(input)
}
