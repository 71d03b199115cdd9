use std::{
    collections::HashMap,
    env,
    sync::{Arc, PoisonError, RwLock},
};

/// Where fields look up their raw values
pub trait Source: Send + Sync {
    /// Returns the raw value for `name`, or `None` when it is not set.
    /// An empty string is a set value.
    fn lookup(&self, name: &str) -> Option<String>;
}

impl<S: Source + ?Sized> Source for Arc<S> {
    fn lookup(&self, name: &str) -> Option<String> {
        (**self).lookup(name)
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn lookup(&self, name: &str) -> Option<String> {
        (**self).lookup(name)
    }
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ProcessEnv {
    /// Loads `.env` from the current directory (or a parent) into the process
    /// environment first. A missing file is not an error.
    pub fn with_dotenv() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "failed to load .env file");
            }
        }
        Self
    }
}

impl Source for ProcessEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        env::var_os(name).map(|value| value.to_string_lossy().into_owned())
    }
}

/// An in-memory source. Values can be changed after fields were declared.
#[derive(Debug, Default)]
pub struct MapSource {
    values: RwLock<HashMap<String, String>>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`MapSource::set`]
    pub fn with(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), value.into());
    }

    pub fn unset(&self, name: &str) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }
}

impl Source for MapSource {
    fn lookup(&self, name: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let values = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }
}
