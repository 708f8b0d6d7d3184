// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment variable expansion trait definition.

/// Expands `%NAME%` references in a terminated UTF-16 string.
///
/// The contract follows the platform primitive: the return value is the size, in code units
/// and including the terminator, that the fully expanded string needs. When that size fits in
/// `output` the expanded string has been written there. A return of `0` means failure. Callers
/// grow `output` to the returned size and call again until it fits.
///
/// # Examples
///
/// ```rust
/// use hexreg::ports::EnvExpander;
///
/// struct Identity;
///
/// impl EnvExpander for Identity {
///     fn expand(&self, input: &[u16], output: &mut [u16]) -> u32 {
///         let len = input.iter().position(|&c| c == 0).unwrap_or(input.len());
///         if len + 1 <= output.len() {
///             output[..len].copy_from_slice(&input[..len]);
///             output[len] = 0;
///         }
///         (len + 1) as u32
///     }
/// }
///
/// let mut out = [0u16; 3];
/// assert_eq!(Identity.expand(&[104, 105, 0], &mut out), 3);
/// assert_eq!(out, [104, 105, 0]);
/// ```
pub trait EnvExpander: Send + Sync {
    /// Expands `input` into `output`, returning the required size or `0` on failure.
    fn expand(&self, input: &[u16], output: &mut [u16]) -> u32;
}
