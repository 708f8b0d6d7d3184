// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property-based tests using proptest.
//!
//! These tests feed arbitrary, possibly malformed buffers through string normalization and
//! arbitrary values through the grow-until-fits read.

use hexreg::adapters::{MemoryStore, ProcessEnvExpander};
use hexreg::domain::value::wide_len;
use hexreg::domain::ValueType;
use hexreg::service::{RegistryResolver, StringNormalizer};
use proptest::prelude::*;

fn string_type() -> impl Strategy<Value = ValueType> {
    prop_oneof![Just(ValueType::String), Just(ValueType::MultiString)]
}

// A normalized string always has a terminator and never loses declared content
proptest! {
    #[test]
    fn test_normalized_string_is_terminated(
        buf in prop::collection::vec(0u16..4, 0..64),
        extra in 0usize..8,
    ) {
        let expander = ProcessEnvExpander::new();
        let normalizer = StringNormalizer::new(&expander, 16);
        let len = buf.len().saturating_sub(extra);
        let out = normalizer.normalize_string(buf.clone(), len, ValueType::String).unwrap();
        prop_assert!(out.contains(&0));
        prop_assert!(out.len() >= len);
        let end = wide_len(&out, out.len());
        prop_assert_eq!(&out[..end], &buf[..end]);
    }
}

// A normalized string list is always terminated: empty, or closed by two consecutive zeros
proptest! {
    #[test]
    fn test_normalized_multi_string_is_doubly_terminated(
        buf in prop::collection::vec(0u16..4, 0..64),
        value_type in string_type(),
    ) {
        let expander = ProcessEnvExpander::new();
        let normalizer = StringNormalizer::new(&expander, 16);
        let len = buf.len();
        let out = normalizer.normalize_multi_string(buf, len, value_type).unwrap();
        prop_assert!(out.len() >= 2);
        prop_assert!(out[0] == 0 || out.windows(2).any(|pair| pair == [0, 0]));
    }
}

// Normalizing an already normalized string list changes nothing
proptest! {
    #[test]
    fn test_multi_string_normalization_is_idempotent(
        buf in prop::collection::vec(0u16..4, 0..64),
    ) {
        let expander = ProcessEnvExpander::new();
        let normalizer = StringNormalizer::new(&expander, 16);
        let len = buf.len();
        let once = normalizer
            .normalize_multi_string(buf, len, ValueType::MultiString)
            .unwrap();
        let len = once.len();
        let twice = normalizer
            .normalize_multi_string(once.clone(), len, ValueType::MultiString)
            .unwrap();
        prop_assert_eq!(once, twice);
    }
}

// Any initial guess reads the full value
proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]
    #[test]
    fn test_raw_read_ignores_size_hint(
        data in prop::collection::vec(any::<u8>(), 0..4096),
        hint in 0usize..8192,
    ) {
        let store = MemoryStore::new();
        store.set_value("", "Blob", ValueType::Binary, data.clone()).unwrap();
        let resolver = RegistryResolver::new(store.clone());
        let root = store.root_key();
        let raw = resolver.query_raw(&root, Some("Blob"), hint, false).unwrap();
        prop_assert_eq!(raw.data(), data.as_slice());
    }
}
