/// Declaration options of a field
///
/// # Example
/// ```rust
/// use envfield::Options;
///
/// let options = Options::new()
///     .required()
///     .allowed_values(["dev", "prod"])
///     .description("Deployment environment");
/// assert!(options.is_required());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    required: bool,
    allowed_values: Option<Vec<String>>,
    description: Option<String>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a missing environment variable as an error
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Restrict the raw (trimmed) text to the given values
    pub fn allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the generated description
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn allowed(&self) -> Option<&[String]> {
        self.allowed_values.as_deref()
    }

    pub fn custom_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub(crate) fn is_allowed(&self, raw: &str) -> bool {
        match &self.allowed_values {
            Some(values) => values.iter().any(|value| value == raw),
            None => true,
        }
    }
}

/// Joins values as `'a', 'b' and 'c'`
pub(crate) fn join_quoted(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| format!("'{v}'")).collect();
    match quoted.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {}", rest.join(", "), last),
    }
}
