// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer containing the resolver.
//!
//! This module builds the waiting and reading operations on top of the ports: recursive key
//! resolution, value waiting, grow-until-fits reads and string normalization, with
//! [`RegistryResolver`] as the caller-facing entry point.

pub mod key_resolver;
pub mod owned_key;
#[cfg(test)]
mod recording;
pub mod resolver;
pub mod string_normalizer;
pub mod value_query;
pub mod value_waiter;
mod wait;

// Re-export commonly used types
pub use key_resolver::KeyPathResolver;
pub use owned_key::OwnedKey;
pub use resolver::{RegistryResolver, ResolverBuilder};
pub use string_normalizer::StringNormalizer;
pub use value_query::ValueQuery;
pub use value_waiter::ValueWaiter;
