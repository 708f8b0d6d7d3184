// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fallible zero-initialized buffer allocation.
//!
//! Value sizes come from the store and are not trusted, so growth goes through
//! `try_reserve_exact` and surfaces as [`RegistryError::AllocationFailure`] instead of aborting.

use crate::domain::errors::{RegistryError, Result};

/// Allocates a buffer of `len` zeroed elements.
pub fn alloc_zeroed<T: Copy + Default>(len: usize) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|e| RegistryError::from_try_reserve(len, e))?;
    buf.resize(len, T::default());
    Ok(buf)
}

/// Truncates or zero-extends `buf` to exactly `len` elements, keeping the existing prefix.
pub fn resize_zeroed<T: Copy + Default>(buf: &mut Vec<T>, len: usize) -> Result<()> {
    if len > buf.len() {
        buf.try_reserve_exact(len - buf.len())
            .map_err(|e| RegistryError::from_try_reserve(len, e))?;
    }
    buf.resize(len, T::default());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_zeroed() {
        let buf: Vec<u16> = alloc_zeroed(4).unwrap();
        assert_eq!(buf, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_resize_zeroed_grows_with_zeros() {
        let mut buf = vec![1u16, 2];
        resize_zeroed(&mut buf, 4).unwrap();
        assert_eq!(buf, vec![1, 2, 0, 0]);
    }

    #[test]
    fn test_resize_zeroed_truncates() {
        let mut buf = vec![1u8, 2, 3];
        resize_zeroed(&mut buf, 1).unwrap();
        assert_eq!(buf, vec![1]);
    }

    #[test]
    fn test_alloc_zeroed_reports_allocation_failure() {
        let result: Result<Vec<u64>> = alloc_zeroed(usize::MAX);
        assert!(matches!(
            result,
            Err(RegistryError::AllocationFailure { .. })
        ));
    }
}
