// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing core types.
//!
//! This module contains the store-independent types of the resolver: key paths, deadlines,
//! value blobs, options and errors. It has no knowledge of any concrete store.

pub mod buffer;
pub mod deadline;
pub mod errors;
pub mod key_path;
pub mod options;
pub mod value;

// Re-export commonly used types
pub use deadline::Deadline;
pub use errors::{RegistryError, Result};
pub use key_path::KeyPath;
pub use options::{OptionsOverlay, ResolverOptions};
pub use value::{RawValue, ValueType};
