//! Typed configuration fields backed by environment variables.
//!
//! ```rust
//! use envfield::{MapSource, Options, Registry};
//!
//! let mut registry = Registry::with_source(MapSource::new().with("PORT", "abc"));
//! registry.silence_errors();
//! let port = registry.field("PORT", 8080i64, Options::new().required());
//!
//! // An invalid value falls back to the default
//! assert_eq!(port.get_or_default(), 8080);
//! assert!(port.get().is_err());
//! ```

pub mod error;
pub mod field;
pub mod options;
pub mod parser;
pub mod print;
pub mod registry;
pub mod source;
pub mod value;

// Re-export main types
pub use error::{ConfigError, ErrorHook, ErrorKind};
pub use field::{AnyField, Field, Resolved};
pub use options::Options;
pub use print::{Format, PrintError};
pub use registry::{FieldInfo, Registry};
pub use source::{MapSource, ProcessEnv, Source};
pub use value::{FieldValue, ValueError};

// Re-export macro
pub use envfield_macros::define_config;

/// A group of fields declared together, usually generated by [`define_config!`]
pub trait Declare: Sized {
    /// Declare every field of the group in `registry`
    fn declare(registry: &mut Registry) -> Self;
}
