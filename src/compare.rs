// BSL 1.0 License

//! Rust makes comparing objects (especially floats) hard
//! sometimes, so this module contains some wrapper structs
//! for use in sorting/comparing objects.

use core::cmp;

/// Wraps an object that implements `PartialOrd` and `PartialEq`,
/// then makes it `Eq` and `Ord`.
///
/// This asserts that none of the involves objects are `NaN` or the like.
#[derive(Debug, Copy, Clone, Default, PartialEq, PartialOrd)]
pub(crate) struct AbsoluteEq<T>(pub(crate) T);

impl<T: PartialEq> Eq for AbsoluteEq<T> {}
#[allow(clippy::derive_ord_xor_partial_ord)]
impl<T: PartialOrd> Ord for AbsoluteEq<T> {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.0
            .partial_cmp(&other.0)
            .expect("Expected non-NaN values")
    }
}
