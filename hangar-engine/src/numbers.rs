//! Numeric helpers: the `Decimal` big number and the safe casts built around it.
//!
//! Enemy stats compound across ninety missions and five difficulty multipliers, which
//! overflows `f64` long before the end of the ladder. `Decimal` keeps a normalized
//! mantissa in `[1, 10)` and a signed 64-bit power of ten, so every stat in the planner
//! stays comparable no matter how far the campaign goes.

use num_traits::cast::cast;
use num_traits::{One, Zero};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};
use std::str::FromStr;

/// Exponent gap past which the smaller addend no longer affects an `f64` mantissa.
const MAX_SIGNIFICANT_DIGITS: i64 = 17;
/// Magnitudes below this are treated as zero before normalizing.
const UNDERFLOW_FLOOR: f64 = 1e-300;

/// Arbitrary-magnitude number stored as `mantissa × 10^exponent`.
#[derive(Debug, Clone, Copy)]
pub struct Decimal {
    mantissa: f64,
    exponent: i64,
}

/// Raised when a string cannot be read as a [`Decimal`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid decimal literal: {0:?}")]
pub struct ParseDecimalError(pub String);

impl Decimal {
    pub const ZERO: Self = Self {
        mantissa: 0.0,
        exponent: 0,
    };
    pub const ONE: Self = Self {
        mantissa: 1.0,
        exponent: 0,
    };

    /// Build from an unnormalized mantissa and exponent.
    #[must_use]
    pub fn from_parts(mantissa: f64, exponent: i64) -> Self {
        Self::normalize(mantissa, exponent)
    }

    fn normalize(mantissa: f64, exponent: i64) -> Self {
        if !mantissa.is_finite() || mantissa.abs() < UNDERFLOW_FLOOR {
            return Self::ZERO;
        }
        let shift = floor_f64_to_i64(mantissa.abs().log10());
        let mut m = mantissa / pow10(shift);
        let mut e = exponent.saturating_add(shift);
        if m.abs() >= 10.0 {
            m /= 10.0;
            e = e.saturating_add(1);
        } else if m.abs() < 1.0 {
            m *= 10.0;
            e = e.saturating_sub(1);
        }
        Self {
            mantissa: m,
            exponent: e,
        }
    }

    #[must_use]
    pub const fn mantissa(&self) -> f64 {
        self.mantissa
    }

    #[must_use]
    pub const fn exponent(&self) -> i64 {
        self.exponent
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.mantissa == 0.0
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.mantissa > 0.0
    }

    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.mantissa < 0.0
    }

    #[must_use]
    pub fn abs(self) -> Self {
        Self {
            mantissa: self.mantissa.abs(),
            exponent: self.exponent,
        }
    }

    /// Closest `f64`; saturates to infinity outside the native range.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        if self.is_zero() {
            return 0.0;
        }
        if self.exponent > 308 {
            return self.mantissa.signum() * f64::INFINITY;
        }
        if self.exponent < -320 {
            return 0.0;
        }
        self.mantissa * pow10(self.exponent)
    }

    /// Base-10 logarithm of the value. Zero maps to negative infinity and negative
    /// values to NaN, so callers gate on [`Decimal::is_positive`] first.
    #[must_use]
    pub fn log10(&self) -> f64 {
        if self.is_zero() {
            return f64::NEG_INFINITY;
        }
        if self.is_negative() {
            return f64::NAN;
        }
        i64_to_f64(self.exponent) + self.mantissa.log10()
    }

    /// Raise to a real power through the log domain.
    #[must_use]
    pub fn pow(self, power: f64) -> Self {
        if power == 0.0 {
            return Self::ONE;
        }
        if self.is_zero() || !power.is_finite() {
            return Self::ZERO;
        }
        let negative_result = if self.is_negative() {
            if power.fract() != 0.0 {
                return Self::ZERO;
            }
            power.rem_euclid(2.0) == 1.0
        } else {
            false
        };
        let log = self.abs().log10() * power;
        if !log.is_finite() {
            return Self::ZERO;
        }
        let exponent = log.floor();
        let mantissa = 10f64.powf(log - exponent);
        let magnitude = Self::normalize(mantissa, floor_f64_to_i64(exponent));
        if negative_result { -magnitude } else { magnitude }
    }

    /// `base^n` for an integer exponent, negative exponents included.
    #[must_use]
    pub fn powi(base: f64, n: i64) -> Self {
        Self::from(base).pow(i64_to_f64(n))
    }

    /// Division that refuses a zero divisor.
    #[must_use]
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        if rhs.is_zero() {
            return None;
        }
        Some(Self::normalize(
            self.mantissa / rhs.mantissa,
            self.exponent.saturating_sub(rhs.exponent),
        ))
    }

    /// Largest integer not above the value. Integers stored as a rounded mantissa
    /// (113 as `1.13e2` reads back as `112.99999999999999`) floor to themselves.
    #[must_use]
    pub fn floor(self) -> Self {
        if self.is_zero() || self.exponent >= MAX_SIGNIFICANT_DIGITS {
            return self;
        }
        Self::from(snap_to_integer(self.to_f64()).floor())
    }

    /// Round down to a multiple of `step`.
    #[must_use]
    pub fn floor_to(self, step: f64) -> Self {
        let step = Self::from(step);
        self.checked_div(step)
            .map_or(self, |quotient| quotient.floor() * step)
    }

    fn signum_rank(&self) -> i8 {
        if self.mantissa > 0.0 {
            1
        } else if self.mantissa < 0.0 {
            -1
        } else {
            0
        }
    }
}

impl Default for Decimal {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<f64> for Decimal {
    fn from(value: f64) -> Self {
        Self::normalize(value, 0)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self::normalize(i64_to_f64(value), 0)
    }
}

impl From<u32> for Decimal {
    fn from(value: u32) -> Self {
        Self::normalize(f64::from(value), 0)
    }
}

impl Add for Decimal {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        if self.is_zero() {
            return rhs;
        }
        if rhs.is_zero() {
            return self;
        }
        let (big, small) = if self.exponent >= rhs.exponent {
            (self, rhs)
        } else {
            (rhs, self)
        };
        let gap = big.exponent - small.exponent;
        if gap > MAX_SIGNIFICANT_DIGITS {
            return big;
        }
        Self::normalize(big.mantissa + small.mantissa / pow10(gap), big.exponent)
    }
}

impl AddAssign for Decimal {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Decimal {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl Neg for Decimal {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            mantissa: -self.mantissa,
            exponent: self.exponent,
        }
    }
}

impl Mul for Decimal {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::normalize(
            self.mantissa * rhs.mantissa,
            self.exponent.saturating_add(rhs.exponent),
        )
    }
}

/// Division by zero yields zero so a single degenerate ratio cannot poison a search.
impl Div for Decimal {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        self.checked_div(rhs).unwrap_or(Self::ZERO)
    }
}

impl Sum for Decimal {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl Zero for Decimal {
    fn zero() -> Self {
        Self::ZERO
    }

    fn is_zero(&self) -> bool {
        self.mantissa == 0.0
    }
}

impl One for Decimal {
    fn one() -> Self {
        Self::ONE
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let (lhs, rhs) = (self.signum_rank(), other.signum_rank());
        if lhs != rhs {
            return lhs.cmp(&rhs);
        }
        if lhs == 0 {
            return Ordering::Equal;
        }
        let magnitude = self
            .exponent
            .cmp(&other.exponent)
            .then_with(|| self.mantissa.abs().total_cmp(&other.mantissa.abs()));
        if lhs > 0 {
            magnitude
        } else {
            magnitude.reverse()
        }
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        if (-7..21).contains(&self.exponent) {
            write!(f, "{}", snap_to_integer(self.to_f64()))
        } else {
            write!(f, "{}e{}", self.mantissa, self.exponent)
        }
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || ParseDecimalError(s.to_string());
        match trimmed.rsplit_once(['e', 'E']) {
            Some((mantissa, exponent)) => {
                let mantissa: f64 = mantissa.parse().map_err(|_| invalid())?;
                let exponent: i64 = exponent
                    .trim_start_matches('+')
                    .parse()
                    .map_err(|_| invalid())?;
                if !mantissa.is_finite() {
                    return Err(invalid());
                }
                Ok(Self::from_parts(mantissa, exponent))
            }
            None => {
                let value: f64 = trimmed.parse().map_err(|_| invalid())?;
                if !value.is_finite() {
                    return Err(invalid());
                }
                Ok(Self::from(value))
            }
        }
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct DecimalVisitor;

impl Visitor<'_> for DecimalVisitor {
    type Value = Decimal;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a number or a decimal string such as \"1.5e300\"")
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Decimal, E> {
        Ok(Decimal::from(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Decimal, E> {
        Ok(Decimal::from(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Decimal, E> {
        Ok(Decimal::from(u64_to_f64(value)))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Decimal, E> {
        value.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DecimalVisitor)
    }
}

fn pow10(exponent: i64) -> f64 {
    let clamped = exponent.clamp(-330, 330);
    10f64.powi(cast::<i64, i32>(clamped).unwrap_or(0))
}

/// Tolerance, in units of relative epsilon, for reading a value as an integer.
const INTEGER_SNAP_ULPS: f64 = 4.0;

/// Round `value` to the nearest integer when it sits within rounding noise of one.
fn snap_to_integer(value: f64) -> f64 {
    let rounded = value.round();
    if (value - rounded).abs() <= INTEGER_SNAP_ULPS * f64::EPSILON * value.abs() {
        rounded
    } else {
        value
    }
}

/// Floor a f64 and clamp it to the i64 range, returning 0 for non-finite values.
#[must_use]
pub fn floor_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    cast::<f64, i64>(value.clamp(min, max).floor()).unwrap_or(0)
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Replace NaN and infinities with zero.
#[must_use]
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
