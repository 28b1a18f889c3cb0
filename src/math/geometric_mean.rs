use crate::math::full_math::{narrow, sqrt_512, widen};
use alloy_primitives::U256;

/// Fractional bits dropped from the square root of the product.
pub const GEOMETRIC_MEAN_SHIFT: usize = 104;

/// Returns `floor(sqrt(a * b))` with the product formed in 512 bits.
#[inline]
pub fn product_root(a: U256, b: U256) -> U256 {
    let root = sqrt_512(widen(a) * widen(b));
    // sqrt of a 512-bit value is below 2^256
    narrow(root).unwrap_or(U256::MAX)
}

/// Returns `floor(sqrt(a * b)) >> 104`.
///
/// The pool integrals fed into this are X216 values, so the mean comes out
/// as an X112 value.
pub fn geometric_mean(a: U256, b: U256) -> U256 {
    product_root(a, b) >> GEOMETRIC_MEAN_SHIFT
}
