//! Q32.32 fixed-point kernel.
//!
//! A [`Fixed`] is a two's complement 64-bit integer whose value is `raw / 2^32`.
//! Results that cannot be represented are carried as [`Value::Undefined`] or
//! [`Value::Overflow`] instead of aborting the computation, much like NaN and
//! Infinity in floating point.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Not, Rem, Sub};
use thiserror::Error;

pub const FRACTION_BITS: u32 = 32;

/// Raw encoding of [`Value::Undefined`] at the bit-compatible boundary.
pub const UNDEFINED_BITS: u64 = 0x8000_0000_0000_0000;
/// Raw encoding of [`Value::Overflow`] at the bit-compatible boundary.
pub const OVERFLOW_BITS: u64 = 0x7FFF_FFFF_FFFF_FFFF;

/// Decimal digits after the point that a literal may carry.
pub const MAX_FRACTION_DIGITS: usize = 10;

const ONE_RAW: i64 = 1 << FRACTION_BITS;
const FRACTION_MASK: u64 = (1 << FRACTION_BITS) - 1;
const DISPLAY_SCALE: u128 = 10_000_000_000;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralError {
    #[error("malformed digits")]
    Malformed,
    #[error("value does not fit in 32 integer bits")]
    OutOfRange,
    #[error("more than {MAX_FRACTION_DIGITS} fractional digits")]
    PrecisionExceeded,
}

/// A finite Q32.32 number. Never holds either sentinel pattern.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(i64);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(ONE_RAW);

    /// Wraps a raw encoding, refusing the two patterns reserved for sentinels.
    pub fn from_raw(raw: i64) -> Option<Fixed> {
        if raw == i64::MIN || raw == i64::MAX {
            None
        } else {
            Some(Fixed(raw))
        }
    }

    pub fn from_int(value: i32) -> Fixed {
        Fixed(i64::from(value) << FRACTION_BITS)
    }

    pub fn from_bool(value: bool) -> Fixed {
        if value {
            Fixed::ONE
        } else {
            Fixed::ZERO
        }
    }

    pub fn raw(self) -> i64 {
        self.0
    }

    pub fn to_bits(self) -> u64 {
        self.0 as u64
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Lossy conversion, only meant for display and comparisons in tests.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / ONE_RAW as f64
    }

    pub fn checked_add(self, rhs: Fixed) -> Option<Fixed> {
        self.0.checked_add(rhs.0).and_then(Fixed::from_raw)
    }

    pub fn checked_sub(self, rhs: Fixed) -> Option<Fixed> {
        self.0.checked_sub(rhs.0).and_then(Fixed::from_raw)
    }

    /// Multiplies and rescales by 2^32, truncating toward zero.
    pub fn checked_mul(self, rhs: Fixed) -> Option<Fixed> {
        let product = i128::from(self.0) * i128::from(rhs.0) / i128::from(ONE_RAW);
        i64::try_from(product).ok().and_then(Fixed::from_raw)
    }

    /// Divides with the dividend pre-scaled by 2^32, truncating toward zero.
    pub fn checked_div(self, rhs: Fixed) -> Option<Fixed> {
        if rhs.is_zero() {
            return None;
        }
        let quotient = (i128::from(self.0) << FRACTION_BITS) / i128::from(rhs.0);
        i64::try_from(quotient).ok().and_then(Fixed::from_raw)
    }

    pub fn checked_rem(self, rhs: Fixed) -> Option<Fixed> {
        self.0.checked_rem(rhs.0).and_then(Fixed::from_raw)
    }

    /// `self` raised to `exponent` by repeated squaring, truncating each step.
    pub fn checked_powi(self, mut exponent: u64) -> Option<Fixed> {
        let mut result = Fixed::ONE;
        let mut square = self;
        while exponent > 0 {
            if exponent & 1 == 1 {
                result = result.checked_mul(square)?;
            }
            exponent >>= 1;
            if exponent > 0 {
                square = square.checked_mul(square)?;
            }
        }
        Some(result)
    }

    pub fn checked_neg(self) -> Option<Fixed> {
        self.0.checked_neg().and_then(Fixed::from_raw)
    }

    /// Square root of a non-negative number. Callers must reject negative
    /// values first; the magnitude is read as unsigned.
    pub fn sqrt(self) -> Fixed {
        // fpsqrt of anything below 2^63 stays below 2^48
        Fixed(fpsqrt(self.to_bits()) as i64)
    }

    /// Converts a decimal literal such as `12`, `0.75`, `3.` or `.5`.
    ///
    /// The fractional part is scaled by 2^32 and rounded to nearest.
    pub fn parse_literal(text: &str) -> Result<Fixed, LiteralError> {
        let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
        let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction)
        {
            return Err(LiteralError::Malformed);
        }
        if fraction.len() > MAX_FRACTION_DIGITS {
            return Err(LiteralError::PrecisionExceeded);
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| LiteralError::OutOfRange)?
        };

        let mut fraction_raw: u128 = 0;
        if !fraction.is_empty() {
            let digits: u128 = fraction.parse().map_err(|_| LiteralError::Malformed)?;
            let scale = 10u128.pow(fraction.len() as u32);
            fraction_raw = ((digits << FRACTION_BITS) + scale / 2) / scale;
        }

        let raw = (u128::from(whole) << FRACTION_BITS) + fraction_raw;
        i64::try_from(raw)
            .ok()
            .and_then(Fixed::from_raw)
            .ok_or(LiteralError::OutOfRange)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        let mut whole = magnitude >> FRACTION_BITS;
        let fraction = u128::from(magnitude & FRACTION_MASK);
        let mut digits = (fraction * DISPLAY_SCALE + (1 << (FRACTION_BITS - 1))) >> FRACTION_BITS;
        if digits == DISPLAY_SCALE {
            whole += 1;
            digits = 0;
        }

        if self.is_negative() && (whole != 0 || digits != 0) {
            write!(f, "-")?;
        }
        write!(f, "{}", whole)?;
        if digits != 0 {
            let rendered = format!("{:010}", digits);
            write!(f, ".{}", rendered.trim_end_matches('0'))?;
        }
        Ok(())
    }
}

/// Result of any evaluation: a number or one of the two sentinels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Number(Fixed),
    /// NaN-equivalent.
    Undefined,
    /// Infinity-equivalent.
    Overflow,
}

impl Default for Value {
    fn default() -> Self {
        Value::ZERO
    }
}

impl Value {
    pub const ZERO: Value = Value::Number(Fixed::ZERO);

    pub fn from_int(value: i32) -> Value {
        Value::Number(Fixed::from_int(value))
    }

    /// Decodes the legacy raw encoding.
    pub fn from_bits(bits: u64) -> Value {
        match bits {
            UNDEFINED_BITS => Value::Undefined,
            OVERFLOW_BITS => Value::Overflow,
            _ => Value::Number(Fixed(bits as i64)),
        }
    }

    /// Encodes into the legacy raw encoding.
    pub fn to_bits(self) -> u64 {
        match self {
            Value::Number(n) => n.to_bits(),
            Value::Undefined => UNDEFINED_BITS,
            Value::Overflow => OVERFLOW_BITS,
        }
    }

    pub fn is_sentinel(self) -> bool {
        !matches!(self, Value::Number(_))
    }

    pub fn number(self) -> Option<Fixed> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Unwraps two operands, or yields the sentinel that wins: `Undefined`
    /// dominates `Overflow`.
    fn operands(self, rhs: Value) -> Result<(Fixed, Fixed), Value> {
        match (self, rhs) {
            (Value::Undefined, _) | (_, Value::Undefined) => Err(Value::Undefined),
            (Value::Overflow, _) | (_, Value::Overflow) => Err(Value::Overflow),
            (Value::Number(a), Value::Number(b)) => Ok((a, b)),
        }
    }

    fn checked(result: Option<Fixed>) -> Value {
        result.map_or(Value::Overflow, Value::Number)
    }

    /// Applies a comparison, producing 1 or 0.
    pub fn compare(self, rhs: Value, accept: impl FnOnce(Ordering) -> bool) -> Value {
        match self.operands(rhs) {
            Ok((a, b)) => Value::Number(Fixed::from_bool(accept(a.cmp(&b)))),
            Err(sentinel) => sentinel,
        }
    }

    /// Raises to a whole-number power by repeated squaring.
    ///
    /// A fractional exponent is `Undefined`. A negative exponent divides one by
    /// the positive power, so `0 ^ -n` is `Overflow`. `x ^ 0` is one.
    pub fn pow(self, rhs: Value) -> Value {
        let (base, exponent) = match self.operands(rhs) {
            Ok(pair) => pair,
            Err(sentinel) => return sentinel,
        };
        if exponent.to_bits() & FRACTION_MASK != 0 {
            return Value::Undefined;
        }

        let magnitude = (exponent.raw() >> FRACTION_BITS).unsigned_abs();
        match (base.checked_powi(magnitude), exponent.is_negative()) {
            (Some(power), false) => Value::Number(power),
            (Some(power), true) => Value::Number(Fixed::ONE) / Value::Number(power),
            (None, false) => Value::Overflow,
            // the reciprocal of a power too large to hold is below resolution
            (None, true) => Value::ZERO,
        }
    }

    /// Square root with the built-in's domain rules applied.
    pub fn sqrt(self) -> Value {
        match self {
            Value::Number(n) if n.is_negative() => Value::Undefined,
            Value::Number(n) => Value::Number(n.sqrt()),
            sentinel => sentinel,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => fmt::Display::fmt(n, f),
            Value::Undefined => write!(f, "NaN"),
            Value::Overflow => write!(f, "Inf"),
        }
    }
}

impl From<Fixed> for Value {
    fn from(value: Fixed) -> Self {
        Value::Number(value)
    }
}

impl Add for Value {
    type Output = Value;

    fn add(self, rhs: Self) -> Self::Output {
        match self.operands(rhs) {
            Ok((a, b)) => Value::checked(a.checked_add(b)),
            Err(sentinel) => sentinel,
        }
    }
}

impl Sub for Value {
    type Output = Value;

    fn sub(self, rhs: Self) -> Self::Output {
        match self.operands(rhs) {
            Ok((a, b)) => Value::checked(a.checked_sub(b)),
            Err(sentinel) => sentinel,
        }
    }
}

impl Mul for Value {
    type Output = Value;

    fn mul(self, rhs: Self) -> Self::Output {
        match self.operands(rhs) {
            Ok((a, b)) => Value::checked(a.checked_mul(b)),
            Err(sentinel) => sentinel,
        }
    }
}

impl Div for Value {
    type Output = Value;

    fn div(self, rhs: Self) -> Self::Output {
        match self.operands(rhs) {
            Ok((a, b)) if b.is_zero() => {
                if a.is_zero() {
                    Value::Undefined
                } else {
                    Value::Overflow
                }
            }
            Ok((a, b)) => Value::checked(a.checked_div(b)),
            Err(sentinel) => sentinel,
        }
    }
}

impl Rem for Value {
    type Output = Value;

    fn rem(self, rhs: Self) -> Self::Output {
        match self.operands(rhs) {
            Ok((_, b)) if b.is_zero() => Value::Undefined,
            Ok((a, b)) => Value::checked(a.checked_rem(b)),
            Err(sentinel) => sentinel,
        }
    }
}

impl Neg for Value {
    type Output = Value;

    fn neg(self) -> Self::Output {
        match self {
            Value::Number(n) => Value::checked(n.checked_neg()),
            sentinel => sentinel,
        }
    }
}

/// Logical negation: 1 for zero, 0 otherwise.
impl Not for Value {
    type Output = Value;

    fn not(self) -> Self::Output {
        match self {
            Value::Number(n) => Value::Number(Fixed::from_bool(n.is_zero())),
            sentinel => sentinel,
        }
    }
}

/// Fixed-point square root by the binary digit-by-digit method.
///
/// Inputs below 2^48 are pre-scaled by 2^16 and the root shifted back by 8
/// bits, which buys eight extra bits of fractional precision. For those
/// inputs the result is exactly `floor(sqrt(n * 2^32))`.
pub fn fpsqrt(mut n: u64) -> u64 {
    let offset: u32 = if n < 1 << 48 { 8 } else { 0 };
    n <<= offset * 2;
    n >>= 15;
    let mut root = 0u64;
    let mut s = 0u64;
    let mut bit = 1u64 << 47;
    while bit >= 1 << offset {
        let t = s + bit;
        if n >= t {
            n -= t;
            s = t + bit;
            root += bit;
        }
        n <<= 1;
        bit >>= 1;
    }
    root >> offset
}
