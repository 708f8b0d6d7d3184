// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! This module contains the traits the resolver consumes: the store it reads from, the events
//! it waits on, the expander it uses for expandable strings and the sources it loads options
//! from. Adapters in the adapters layer implement them.

pub mod event;
pub mod expander;
pub mod options_source;
pub mod store;

// Re-export commonly used types
pub use event::{ChangeEvent, WaitStatus};
pub use expander::EnvExpander;
pub use options_source::OptionsSource;
pub use store::{Access, ChangeFilter, QueryStatus, RegistryStore};
