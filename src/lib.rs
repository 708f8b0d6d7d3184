// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blocking, deadline-bound resolution of keys and values in a hierarchical key/value store.
//!
//! Software that starts alongside a driver or service often needs a key that someone else is
//! still creating, or a value that has not been written yet. This crate opens such keys and
//! reads such values, waiting on the store's change notifications instead of polling, and
//! repairs the string values it reads so callers always get terminated data.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: Store-independent types (`KeyPath`, `Deadline`, `RawValue`, options, errors)
//! - **Ports**: Trait definitions for what the resolver consumes (`RegistryStore`,
//!   `ChangeEvent`, `EnvExpander`, `OptionsSource`)
//! - **Adapters**: Implementations of the ports (in-memory store, Windows registry,
//!   environment expanders, YAML and environment option sources)
//! - **Service**: The resolver that orchestrates everything
//!
//! # Features
//!
//! - **Waiting opens**: Open `A\B\C` even if `B` and `C` do not exist yet
//! - **Waiting reads**: Block until a string or integer value is set
//! - **Unknown sizes**: Reads grow their buffer to the size the store reports
//! - **String repair**: Missing terminators are added, `%VAR%` references expanded, single
//!   strings turned into string lists on request
//! - **Hardening limits**: Path length and grow-loop caps, configurable from YAML or the
//!   environment
//!
//! # Feature Flags
//!
//! - `yaml`: Enable loading options from YAML files (default)
//! - `env`: Enable loading options from `HEXREG_*` environment variables (default)
//! - `full`: Enable all features
//!
//! # Quick Start
//!
//! ```rust
//! use hexreg::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! store.create_key("Software\\Tunnel")?;
//! store.set_expand_string("Software\\Tunnel", "Config", "%CONFIG_DIR%\\wg0.conf")?;
//!
//! let resolver = RegistryResolver::builder(store.clone())
//!     .with_expander(ProcessEnvExpander::with_values(
//!         [("CONFIG_DIR".to_string(), "C:\\Tunnels".to_string())].into(),
//!     ))
//!     .build()?;
//!
//! let root = store.root_key();
//! let key = resolver.open_key_wait(&root, "Software\\Tunnel", Access::READ, Duration::from_secs(1))?;
//! let config = resolver.query_string(&key, "Config", true)?;
//! assert_eq!(decode_string(&config), "C:\\Tunnels\\wg0.conf");
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::domain::value::{decode_multi_string, decode_string};
    pub use crate::domain::{RawValue, RegistryError, ResolverOptions, Result, ValueType};
    pub use crate::ports::{Access, ChangeEvent, EnvExpander, OptionsSource, RegistryStore};
    pub use crate::service::{OwnedKey, RegistryResolver, ResolverBuilder};

    pub use crate::adapters::{MemoryStore, ProcessEnvExpander};
    // Re-export adapters based on feature flags
    #[cfg(feature = "env")]
    pub use crate::adapters::EnvOptionsAdapter;
    #[cfg(windows)]
    pub use crate::adapters::{WindowsEnvExpander, WindowsRegistry};
    #[cfg(feature = "yaml")]
    pub use crate::adapters::YamlOptionsFile;
}
