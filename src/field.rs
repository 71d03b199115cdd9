use crate::{
    error::{ConfigError, ErrorHook},
    options::{join_quoted, Options},
    registry::FieldInfo,
    source::Source,
    value::{FieldValue, ValueError},
};
use std::{
    fmt,
    panic::Location,
    sync::{Arc, PoisonError, RwLock},
};

/// State shared by a registry and every field it declared
pub(crate) struct Context {
    pub(crate) source: Box<dyn Source>,
    pub(crate) hook: RwLock<ErrorHook>,
}

impl Context {
    fn report(&self, error: &ConfigError) {
        let hook = self
            .hook
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        hook(error);
    }
}

struct Inner<T> {
    name: String,
    location: &'static Location<'static>,
    default: T,
    options: Options,
    context: Arc<Context>,
}

/// Result of a single resolution: the value to use and, if the value is the
/// fallback default, why.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub error: Option<ConfigError>,
}

impl<T> Resolved<T> {
    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }

    pub fn into_result(self) -> Result<T, ConfigError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.value),
        }
    }
}

/// A declared configuration field, created by
/// [`Registry::field`](crate::Registry::field).
///
/// Handles are cheap to clone and every read goes back to the environment.
pub struct Field<T: FieldValue> {
    inner: Arc<Inner<T>>,
}

impl<T: FieldValue> Field<T> {
    pub(crate) fn new(
        name: &str,
        default: T,
        options: Options,
        location: &'static Location<'static>,
        context: Arc<Context>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.to_string(),
                location,
                default,
                options,
                context,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn default_value(&self) -> &T {
        &self.inner.default
    }

    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    /// Source location of the declaration, as `file:line`
    pub fn location(&self) -> String {
        format!("{}:{}", self.inner.location.file(), self.inner.location.line())
    }

    /// Human readable description, or the custom description if one was given
    pub fn description(&self) -> String {
        let options = &self.inner.options;
        if let Some(text) = options.custom_description() {
            return text.to_string();
        }

        let mut sentences = vec![format!("{} field.", T::LABEL)];
        if options.is_required() {
            sentences.push("Required field.".to_string());
        }
        if let Some(allowed) = options.allowed() {
            sentences.push(format!("Allowed values are {}.", join_quoted(allowed)));
        }
        sentences.push(format!(
            "The default value is '{}'.",
            self.inner.default.format_raw()
        ));
        sentences.push(format!("Defined at {}.", self.location()));
        sentences.join(" ")
    }

    /// Looks up the trimmed raw text and checks it against the allowed values.
    /// `Ok(None)` means "not set and not required".
    fn lookup(&self) -> Result<Option<String>, ConfigError> {
        let inner = &self.inner;
        let Some(raw) = inner.context.source.lookup(&inner.name) else {
            if inner.options.is_required() {
                return Err(ConfigError::MissingValue {
                    key: inner.name.clone(),
                    default: inner.default.format_raw(),
                });
            }
            return Ok(None);
        };

        let raw = raw.trim();
        if !inner.options.is_allowed(raw) {
            return Err(self.invalid(
                raw,
                ValueError::NotAllowed {
                    allowed: join_quoted(inner.options.allowed().unwrap_or_default()),
                },
            ));
        }
        Ok(Some(raw.to_string()))
    }

    fn invalid(&self, raw: &str, reason: ValueError) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.inner.name.clone(),
            value: raw.to_string(),
            reason,
            default: self.inner.default.format_raw(),
        }
    }

    fn fallback(&self, error: ConfigError) -> Resolved<T> {
        self.inner.context.report(&error);
        Resolved {
            value: self.inner.default.clone(),
            error: Some(error),
        }
    }

    /// Resolves the field from the environment. All access methods go through here.
    pub fn resolve(&self) -> Resolved<T> {
        let raw = match self.lookup() {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                return Resolved {
                    value: self.inner.default.clone(),
                    error: None,
                }
            }
            Err(e) => return self.fallback(e),
        };

        match T::parse_raw(&raw) {
            Ok(value) => Resolved { value, error: None },
            Err(reason) => {
                let error = self.invalid(&raw, reason);
                self.fallback(error)
            }
        }
    }

    /// Returns the value, or the error explaining why the default would be used
    pub fn get(&self) -> Result<T, ConfigError> {
        self.resolve().into_result()
    }

    /// Returns the value, falling back to the default on any error
    pub fn get_or_default(&self) -> T {
        self.resolve().value
    }

    /// Returns the value, panicking on any error
    pub fn must_get(&self) -> T {
        match self.get() {
            Ok(value) => value,
            Err(e) => panic!("{}", e),
        }
    }

    /// Raw text resolution, going through the same checks as [`Field::resolve`]
    /// without converting the text
    fn resolve_raw(&self) -> Resolved<String> {
        match self.lookup() {
            Ok(Some(raw)) => Resolved {
                value: raw,
                error: None,
            },
            Ok(None) => Resolved {
                value: self.inner.default.format_raw(),
                error: None,
            },
            Err(e) => {
                self.inner.context.report(&e);
                Resolved {
                    value: self.inner.default.format_raw(),
                    error: Some(e),
                }
            }
        }
    }

    /// Returns the trimmed raw text, or the error explaining why the formatted
    /// default would be used
    pub fn get_raw(&self) -> Result<String, ConfigError> {
        self.resolve_raw().into_result()
    }

    pub fn get_raw_or_default(&self) -> String {
        self.resolve_raw().value
    }

    pub fn must_get_raw(&self) -> String {
        match self.get_raw() {
            Ok(value) => value,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<T: FieldValue> Clone for Field<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: FieldValue + fmt::Debug> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.inner.name)
            .field("default", &self.inner.default)
            .field("options", &self.inner.options)
            .field("location", &self.location())
            .finish()
    }
}

/// Type-erased view of a field, used by the registry for enumeration
pub trait AnyField: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> String;
    fn get_raw_or_default(&self) -> String;
    /// Resolves the field and returns the error, if any
    fn check(&self) -> Option<ConfigError>;
    fn info(&self) -> FieldInfo;
}

impl<T: FieldValue> AnyField for Field<T> {
    fn name(&self) -> &str {
        Field::name(self)
    }

    fn description(&self) -> String {
        Field::description(self)
    }

    fn get_raw_or_default(&self) -> String {
        Field::get_raw_or_default(self)
    }

    fn check(&self) -> Option<ConfigError> {
        self.resolve().error
    }

    fn info(&self) -> FieldInfo {
        let options = self.options();
        FieldInfo {
            name: self.name().to_string(),
            kind: T::LABEL.to_string(),
            description: Field::description(self),
            required: options.is_required(),
            allowed_values: options.allowed().map(<[String]>::to_vec),
            default: self.inner.default.format_raw(),
            value: Field::get_raw_or_default(self),
            location: self.location(),
        }
    }
}
