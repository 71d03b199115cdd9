use crate::error::{format_config_errors, log_error, ConfigError, ErrorHook};
use crate::field::{AnyField, Context, Field};
use crate::options::Options;
use crate::print::{self, Format, PrintError};
use crate::source::{ProcessEnv, Source};
use crate::value::FieldValue;
use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    fmt, io,
    panic::Location,
    sync::{Arc, PoisonError, RwLock},
};

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[A-Z0-9_]+$").expect("field name pattern is valid"));

/// Snapshot of a declared field for documentation and introspection
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldInfo {
    /// Environment variable key
    pub name: String,
    /// Kind label, e.g. `Int` or `StringArray`
    pub kind: String,
    /// Generated or custom description
    pub description: String,
    pub required: bool,
    pub allowed_values: Option<Vec<String>>,
    /// Default value in raw form
    pub default: String,
    /// Current raw value, or the default if it is unset or invalid
    pub value: String,
    /// Declaration site as `file:line`
    pub location: String,
}

/// The set of declared fields, in declaration order.
///
/// A registry owns the [`Source`] its fields read from and the hook that
/// observes resolution errors.
///
/// # Example
/// ```rust
/// use envfield::{MapSource, Options, Registry};
///
/// let mut registry = Registry::with_source(MapSource::new().with("PORT", "9090"));
/// let port = registry.field("PORT", 8080i64, Options::new().required());
///
/// assert_eq!(port.get(), Ok(9090));
/// assert!(registry.validate().is_ok());
/// ```
pub struct Registry {
    context: Arc<Context>,
    fields: Vec<Box<dyn AnyField>>,
}

impl Registry {
    /// Create a registry reading from the process environment
    pub fn new() -> Self {
        Self::with_source(ProcessEnv)
    }

    pub fn with_source(source: impl Source + 'static) -> Self {
        let hook: ErrorHook = Arc::new(log_error);
        Self {
            context: Arc::new(Context {
                source: Box::new(source),
                hook: RwLock::new(hook),
            }),
            fields: Vec::new(),
        }
    }

    /// Declare a field.
    ///
    /// # Panics
    ///
    /// If `name` contains anything but capital letters, digits and
    /// underscores, or if a field with that name was already declared.
    #[track_caller]
    pub fn field<T: FieldValue>(&mut self, name: &str, default: T, options: Options) -> Field<T> {
        if !NAME_PATTERN.is_match(name) {
            panic!(
                "field name [{}] must only contain capital letters, numbers or underscores",
                name
            );
        }
        if self.contains(name) {
            panic!("field [{}] is already declared", name);
        }

        let field = Field::new(
            name,
            default,
            options,
            Location::caller(),
            Arc::clone(&self.context),
        );
        self.fields.push(Box::new(field.clone()));
        field
    }

    /// Replace the hook that observes every failed resolution
    pub fn set_error_hook(&mut self, hook: impl Fn(&ConfigError) + Send + Sync + 'static) {
        *self
            .context
            .hook
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(hook);
    }

    /// Stop reporting resolution errors
    pub fn silence_errors(&mut self) {
        self.set_error_hook(|_| {});
    }

    pub fn fields(&self) -> impl Iterator<Item = &dyn AnyField> {
        self.fields.iter().map(|field| &**field)
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field.name() == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Forget all declared fields. Existing handles keep working.
    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Resolve every field and collect all errors
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let errors: Vec<ConfigError> = self.fields.iter().filter_map(|f| f.check()).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Resolve every field and panic if there were any errors
    pub fn validate_or_panic(&self) {
        if let Err(errors) = self.validate() {
            panic!("{}", format_config_errors(&errors));
        }
    }

    pub fn snapshot(&self) -> Vec<FieldInfo> {
        self.fields.iter().map(|field| field.info()).collect()
    }

    /// Print all fields with their current values
    pub fn print<W: io::Write>(&self, writer: &mut W, format: Format) -> io::Result<()> {
        print::print(writer, self.fields(), format)
    }

    /// Like [`Registry::print`], with the format given by name
    pub fn print_named<W: io::Write>(&self, writer: &mut W, format: &str) -> Result<(), PrintError> {
        let format: Format = format.parse()?;
        Ok(self.print(writer, format)?)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("fields", &self.names())
            .finish()
    }
}
