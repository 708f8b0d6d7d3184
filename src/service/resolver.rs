// SPDX-License-Identifier: MIT OR Apache-2.0

//! The caller-facing resolver and its builder.

use crate::adapters::ProcessEnvExpander;
use crate::domain::{
    Deadline, KeyPath, RawValue, RegistryError, ResolverOptions, Result,
};
use crate::ports::{Access, EnvExpander, OptionsSource, RegistryStore};
use crate::service::key_resolver::KeyPathResolver;
use crate::service::owned_key::OwnedKey;
use crate::service::value_query::{display_name, ValueQuery};
use crate::service::value_waiter::ValueWaiter;
use std::time::Duration;

/// Blocking, deadline-bound access to a hierarchical key/value store.
///
/// Every waiting operation computes its deadline once from the store clock and the given
/// timeout; all retries and nested waits share it. Failures are logged here, with the key path
/// the store reports, and returned to the caller.
///
/// # Examples
///
/// ```rust
/// use hexreg::adapters::MemoryStore;
/// use hexreg::ports::Access;
/// use hexreg::service::RegistryResolver;
/// use std::thread;
/// use std::time::Duration;
///
/// # fn main() -> hexreg::domain::Result<()> {
/// let store = MemoryStore::new();
/// let writer = {
///     let store = store.clone();
///     thread::spawn(move || {
///         thread::sleep(Duration::from_millis(20));
///         store.create_key("Services\\Tunnel").unwrap();
///         store.set_dword("Services\\Tunnel", "Port", 51820).unwrap();
///     })
/// };
///
/// let resolver = RegistryResolver::new(store.clone());
/// let root = store.root_key();
/// let key = resolver.open_key_wait(&root, "Services\\Tunnel", Access::READ, Duration::from_secs(2))?;
/// let port = resolver.query_dword_wait(&key, "Port", Duration::from_secs(2))?;
/// assert_eq!(port, 51820);
/// # writer.join().unwrap();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RegistryResolver<S: RegistryStore, E: EnvExpander = ProcessEnvExpander> {
    store: S,
    expander: E,
    options: ResolverOptions,
}

impl<S: RegistryStore> RegistryResolver<S> {
    /// Creates a resolver with default options and the portable expander.
    pub fn new(store: S) -> Self {
        Self {
            store,
            expander: ProcessEnvExpander::new(),
            options: ResolverOptions::default(),
        }
    }

    /// Returns a builder for a resolver over `store`.
    pub fn builder(store: S) -> ResolverBuilder<S> {
        ResolverBuilder::new(store)
    }
}

impl<S: RegistryStore, E: EnvExpander> RegistryResolver<S, E> {
    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the options in effect.
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Returns the key path resolver used by [`open_key_wait`](Self::open_key_wait).
    pub fn key_resolver(&self) -> KeyPathResolver<'_, S> {
        KeyPathResolver::new(&self.store)
    }

    /// Returns the one-shot value reader used by the `query_*` operations.
    pub fn value_query(&self) -> ValueQuery<'_, S, E> {
        ValueQuery::new(&self.store, &self.expander, &self.options)
    }

    /// Returns the value waiter used by the `query_*_wait` operations.
    pub fn value_waiter(&self) -> ValueWaiter<'_, S, E> {
        ValueWaiter::new(&self.store, self.value_query())
    }

    fn deadline(&self, timeout: Duration) -> Deadline {
        Deadline::after(self.store.now(), timeout)
    }

    fn describe(&self, key: &S::Key, name: &str) -> String {
        format!("{}\\{}", self.store.key_path(key), display_name(Some(name)))
    }

    /// Opens `path` below `root`, waiting up to `timeout` for missing keys to be created.
    ///
    /// `root` must have been opened with notify access. Intermediate keys are released before
    /// returning; only the returned key stays open.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::PathTooLong`] if `path` has `max_path_chars` code units or more
    /// - [`RegistryError::Timeout`] if the key did not appear in time
    /// - any other error the store reports while opening
    pub fn open_key_wait(
        &self,
        root: &S::Key,
        path: &str,
        access: Access,
        timeout: Duration,
    ) -> Result<OwnedKey<'_, S>> {
        let path = KeyPath::from(path);
        let len = path.len_utf16();
        if len >= self.options.max_path_chars {
            let err = RegistryError::PathTooLong {
                path: path.into_string(),
                len,
                max: self.options.max_path_chars,
            };
            tracing::error!("{}", err);
            return Err(err);
        }

        let deadline = self.deadline(timeout);
        self.key_resolver()
            .open_wait(root, &path, access, deadline)
            .map_err(|err| {
                tracing::error!(
                    "Failed to open registry key {}\\{}: {}",
                    self.store.key_path(root),
                    path,
                    err
                );
                err
            })
    }

    /// Reads a value of any type, starting with a `size_hint`-byte buffer.
    ///
    /// An empty or absent `name` reads the key's default value.
    pub fn query_raw(
        &self,
        key: &S::Key,
        name: Option<&str>,
        size_hint: usize,
        log: bool,
    ) -> Result<RawValue> {
        self.value_query()
            .raw(key, name, size_hint)
            .map_err(|err| self.report(key, name.unwrap_or(""), err, log))
    }

    /// Reads a string value as terminated UTF-16.
    ///
    /// String, expandable-string and multi-string values are accepted; expandable strings are
    /// expanded and a multi-string yields its first string. A type mismatch is always logged,
    /// other failures only when `log` is set.
    pub fn query_string(&self, key: &S::Key, name: &str, log: bool) -> Result<Vec<u16>> {
        self.value_query()
            .string(key, Some(name))
            .map_err(|err| self.report(key, name, err, log))
    }

    /// Reads a string-shaped value as a doubly terminated UTF-16 string list.
    pub fn query_multi_string(&self, key: &S::Key, name: &str, log: bool) -> Result<Vec<u16>> {
        self.value_query()
            .multi_string(key, Some(name))
            .map_err(|err| self.report(key, name, err, log))
    }

    /// Reads a 32-bit integer value; any other type or size is a
    /// [`RegistryError::TypeMismatch`].
    pub fn query_dword(&self, key: &S::Key, name: &str, log: bool) -> Result<u32> {
        self.value_query()
            .dword(key, Some(name))
            .map_err(|err| self.report(key, name, err, log))
    }

    /// Like [`query_string`](Self::query_string), waiting up to `timeout` for the value to be
    /// set. The key must have been opened with query and notify access.
    pub fn query_string_wait(&self, key: &S::Key, name: &str, timeout: Duration) -> Result<Vec<u16>> {
        let deadline = self.deadline(timeout);
        self.value_waiter()
            .string(key, Some(name), deadline)
            .map_err(|err| self.report(key, name, err, true))
    }

    /// Like [`query_dword`](Self::query_dword), waiting up to `timeout` for the value to be set.
    pub fn query_dword_wait(&self, key: &S::Key, name: &str, timeout: Duration) -> Result<u32> {
        let deadline = self.deadline(timeout);
        self.value_waiter()
            .dword(key, Some(name), deadline)
            .map_err(|err| self.report(key, name, err, true))
    }

    fn report(&self, key: &S::Key, name: &str, err: RegistryError, log: bool) -> RegistryError {
        match &err {
            RegistryError::TypeMismatch { .. } => {
                tracing::error!("Value {}: {}", self.describe(key, name), err);
            }
            _ if log => {
                tracing::error!(
                    "Failed to query registry value {}: {}",
                    self.describe(key, name),
                    err
                );
            }
            _ => tracing::debug!("Query of {} failed: {}", self.describe(key, name), err),
        }
        err
    }
}

/// Builder for a [`RegistryResolver`].
///
/// Options start from explicit [`ResolverOptions`] (defaults if none are given) and are then
/// overridden by each [`OptionsSource`] in ascending priority order, so higher priorities win.
///
/// # Examples
///
/// ```rust
/// use hexreg::adapters::{EnvOptionsAdapter, MemoryStore, YamlOptionsFile};
/// use hexreg::service::RegistryResolver;
/// use std::collections::HashMap;
///
/// # fn main() -> hexreg::domain::Result<()> {
/// let mut env = HashMap::new();
/// env.insert("HEXREG_MAX_GROW_ATTEMPTS".to_string(), "4".to_string());
///
/// let resolver = RegistryResolver::builder(MemoryStore::new())
///     .with_options_source(Box::new(EnvOptionsAdapter::with_values(env)))
///     .with_options_source(Box::new(YamlOptionsFile::from_str("max_grow_attempts: 8\nmax_path_chars: 64")?))
///     .build()?;
///
/// assert_eq!(resolver.options().max_grow_attempts, 4);
/// assert_eq!(resolver.options().max_path_chars, 64);
/// # Ok(())
/// # }
/// ```
pub struct ResolverBuilder<S: RegistryStore, E: EnvExpander = ProcessEnvExpander> {
    store: S,
    expander: E,
    options: ResolverOptions,
    sources: Vec<Box<dyn OptionsSource>>,
}

impl<S: RegistryStore> ResolverBuilder<S> {
    /// Creates a builder over `store` with the portable expander.
    pub fn new(store: S) -> Self {
        Self {
            store,
            expander: ProcessEnvExpander::new(),
            options: ResolverOptions::default(),
            sources: Vec::new(),
        }
    }
}

impl<S: RegistryStore, E: EnvExpander> ResolverBuilder<S, E> {
    /// Replaces the environment variable expander.
    pub fn with_expander<E2: EnvExpander>(self, expander: E2) -> ResolverBuilder<S, E2> {
        ResolverBuilder {
            store: self.store,
            expander,
            options: self.options,
            sources: self.sources,
        }
    }

    /// Sets the base options that option sources are applied on top of.
    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    /// Adds an option source.
    pub fn with_options_source(mut self, source: Box<dyn OptionsSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Adds option overrides from `HEXREG_*` environment variables.
    #[cfg(feature = "env")]
    pub fn with_env_options(self) -> Self {
        use crate::adapters::EnvOptionsAdapter;
        self.with_options_source(Box::new(EnvOptionsAdapter::new()))
    }

    /// Adds option overrides from a YAML file.
    #[cfg(feature = "yaml")]
    pub fn with_yaml_options(self, path: impl AsRef<std::path::Path>) -> Result<Self> {
        use crate::adapters::YamlOptionsFile;
        let source = YamlOptionsFile::from_file(path)?;
        Ok(self.with_options_source(Box::new(source)))
    }

    /// Loads every option source and builds the resolver.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by an option source.
    pub fn build(mut self) -> Result<RegistryResolver<S, E>> {
        self.sources.sort_by_key(|source| source.priority());

        let mut options = self.options;
        for source in &self.sources {
            let overlay = source.load()?;
            if !overlay.is_empty() {
                tracing::debug!("Applying resolver options from {}", source.name());
                options.apply(&overlay);
            }
        }

        Ok(RegistryResolver {
            store: self.store,
            expander: self.expander,
            options,
        })
    }
}
