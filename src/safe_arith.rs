//! Safe arithmetic operations that guard against overflow.
//!
//! Fee math never wraps: ledger deltas live in a signed domain and unsigned
//! amounts enter it through [`saturating_signed`].

/// Error representing the failure of an arithmetic operation.
#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum ArithError {
    #[error("overflow")]
    Overflow,
    #[error("divide by zero")]
    DivisionByZero,
}

pub type Result<T> = std::result::Result<T, ArithError>;

/// Trait providing safe arithmetic operations for built-in types.
pub trait SafeArith<Rhs = Self>: Sized + Copy {
    /// Safe variant of `+` that guards against overflow.
    fn safe_add(&self, other: Rhs) -> Result<Self>;

    /// Safe variant of `-` that guards against overflow.
    fn safe_sub(&self, other: Rhs) -> Result<Self>;

    /// Safe variant of `%` that guards against division by 0.
    fn safe_rem(&self, other: Rhs) -> Result<Self>;

    /// Safe variant of `/` that guards against division by 0.
    fn safe_div(&self, other: Rhs) -> Result<Self>;

    /// Safe variant of `*` that guards against overflow.
    fn safe_mul(&self, other: Rhs) -> Result<Self>;
}

macro_rules! impl_safe_arith {
    ($typ:ty) => {
        impl SafeArith for $typ {
            #[inline]
            fn safe_add(&self, other: Self) -> Result<Self> {
                self.checked_add(other).ok_or(ArithError::Overflow)
            }

            #[inline]
            fn safe_sub(&self, other: Self) -> Result<Self> {
                self.checked_sub(other).ok_or(ArithError::Overflow)
            }

            #[inline]
            fn safe_rem(&self, other: Self) -> Result<Self> {
                self.checked_rem(other).ok_or(ArithError::DivisionByZero)
            }

            #[inline]
            fn safe_div(&self, other: Self) -> Result<Self> {
                self.checked_div(other).ok_or(ArithError::DivisionByZero)
            }

            #[inline]
            fn safe_mul(&self, other: Self) -> Result<Self> {
                self.checked_mul(other).ok_or(ArithError::Overflow)
            }
        }
    };
}

impl_safe_arith!(u64);
impl_safe_arith!(u128);
impl_safe_arith!(i128);

/// `floor(value * numerator / denominator)` without an intermediate product
/// that could overflow `u128`.
///
/// With `value = q * d + r` the result is `q * n + floor(r * n / d)`; `r * n`
/// stays below `d * n`, which fits for the basis-point denominators used here.
pub fn mul_div_floor(value: u128, numerator: u128, denominator: u128) -> Result<u128> {
    let quotient = value.safe_div(denominator)?;
    let remainder = value.safe_rem(denominator)?;
    let high = quotient.safe_mul(numerator)?;
    let low = remainder.safe_mul(numerator)?.safe_div(denominator)?;
    high.safe_add(low)
}

/// Narrow an unsigned value into the signed domain, clamping at `i128::MAX`.
#[inline]
pub fn saturating_signed(value: u128) -> i128 {
    i128::try_from(value).unwrap_or(i128::MAX)
}
