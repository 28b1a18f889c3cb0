use crate::error::MathError;
use alloy_primitives::{U256, U512};

/// Zero-extends a `U256` into the low half of a `U512`.
#[inline(always)]
pub fn widen(x: U256) -> U512 {
    let l = x.as_limbs();
    U512::from_limbs([l[0], l[1], l[2], l[3], 0, 0, 0, 0])
}

/// Narrows a `U512` back to `U256`, returning `MathError::Overflow` if any
/// of the upper 256 bits are set.
#[inline(always)]
pub fn narrow(x: U512) -> Result<U256, MathError> {
    let l = x.as_limbs();
    if l[4..].iter().any(|&limb| limb != 0) {
        return Err(MathError::Overflow);
    }
    Ok(U256::from_limbs([l[0], l[1], l[2], l[3]]))
}

/// Computes `a * b / denominator` rounding down, with the intermediate
/// product held in 512 bits.
///
/// Fails with `DivisionByZero` for a zero denominator and with `Overflow`
/// when the quotient does not fit in 256 bits.
#[inline]
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    narrow(widen(a) * widen(b) / widen(denominator))
}

/// Integer square root of a 512-bit value, rounded down.
///
/// Newton iteration seeded from above with a power of two, so the sequence
/// decreases monotonically until it settles on `floor(sqrt(n))`.
pub fn sqrt_512(n: U512) -> U512 {
    if n.is_zero() {
        return U512::ZERO;
    }

    let mut x = U512::ONE << n.bit_len().div_ceil(2);
    loop {
        let y = (x + n / x) >> 1;
        if y >= x {
            return x;
        }
        x = y;
    }
}
