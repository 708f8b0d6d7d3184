// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing port implementations.
//!
//! This module contains concrete implementations of the traits defined in the ports layer:
//! stores the resolver can read from, environment expanders, and option sources.

pub mod env_expander;
#[cfg(feature = "env")]
pub mod env_var;
pub mod memory;
#[cfg(windows)]
pub mod windows;
#[cfg(feature = "yaml")]
pub mod yaml_file;

// Re-export adapters based on feature flags
pub use env_expander::ProcessEnvExpander;
#[cfg(feature = "env")]
pub use env_var::EnvOptionsAdapter;
pub use memory::{MemoryEvent, MemoryKey, MemoryStore};
#[cfg(windows)]
pub use windows::{WindowsEnvExpander, WindowsEvent, WindowsKey, WindowsRegistry};
#[cfg(feature = "yaml")]
pub use yaml_file::YamlOptionsFile;
