//! # Haqn: a reflective dependency injection container
//!
//! Classes are described once, usually with `#[derive(Injectable)]`, and
//! the [`Injector`] builds them by name: constructor parameters are
//! provisioned recursively from type hints, argument definitions,
//! delegates and shared instances.
//!
//! ```rust
//! use std::sync::Arc;
//! use haqn::prelude::*;
//!
//! #[derive(Injectable)]
//! #[injectable(name = "Transport")]
//! struct Transport {
//!     #[inject(default = "localhost")]
//!     host: String,
//! }
//!
//! #[derive(Injectable)]
//! #[injectable(name = "Mailer")]
//! struct Mailer {
//!     transport: Arc<Transport>,
//! }
//!
//! fn main() {
//!     let mut injector = Injector::new();
//!     injector.define("Transport", Arguments::new().raw("host", "smtp.example.com"));
//!
//!     let mailer: Arc<Mailer> = injector.make_as("Mailer").unwrap();
//!     assert_eq!(mailer.transport.host, "smtp.example.com");
//! }
//! ```

pub use haqn_container::*;
pub use haqn_derive::*;
pub use haqn_support::*;

pub mod prelude {
    pub use haqn_container::prelude::*;
    pub use haqn_derive::Injectable;
}
