//! Fixed-width two-state bit vectors backed by a single `u64`.
//!
//! Every operation that can overflow a [`Value`] truncates its result to the
//! governing width. The scheduler's change detection compares masked
//! magnitudes, so this truncation is observable: a 4-bit counter at 15 plus
//! one is 0, and assigning it back to a net holding 0 is not a change.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, BitAnd, BitOr, BitXor, Not, Shl, Shr, Sub};

use crate::error::ValueError;

/// Widest value the 64-bit backing store can hold.
pub const MAX_WIDTH: u32 = 64;

/// A two-state bit vector of 1 to 64 bits.
///
/// Equality compares magnitudes only, so values of different widths holding
/// the same number are equal (zero-extension semantics, as in HDL `==`).
#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "RawValue", into = "RawValue")]
pub struct Value {
    width: u32,
    bits: u64,
}

impl Value {
    /// Creates a value of the given width, truncating `bits` to fit.
    ///
    /// # Panics
    ///
    /// Panics if `width` is zero or larger than [`MAX_WIDTH`].
    pub fn new(width: u32, bits: u64) -> Self {
        match Self::try_new(width, bits) {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        }
    }

    /// Creates a value of the given width, truncating `bits` to fit.
    pub fn try_new(width: u32, bits: u64) -> Result<Self, ValueError> {
        if width == 0 || width > MAX_WIDTH {
            return Err(ValueError::InvalidWidth { width });
        }
        Ok(Self {
            width,
            bits: bits & mask(width),
        })
    }

    /// Creates an all-zero value of the given width.
    ///
    /// # Panics
    ///
    /// Panics if `width` is zero or larger than [`MAX_WIDTH`].
    pub fn zero(width: u32) -> Self {
        Self::new(width, 0)
    }

    /// Creates a 32-bit value from a signed integer literal (two's complement).
    pub fn from_int(value: i32) -> Self {
        Self {
            width: 32,
            bits: value as u32 as u64,
        }
    }

    /// Creates a value from a signed integer, truncated two's complement.
    ///
    /// # Panics
    ///
    /// Panics if `width` is zero or larger than [`MAX_WIDTH`].
    pub fn from_signed(value: i64, width: u32) -> Self {
        Self::new(width, value as u64)
    }

    /// Creates a single-bit value.
    pub fn from_bool(value: bool) -> Self {
        Self {
            width: 1,
            bits: value as u64,
        }
    }

    /// Returns the bit width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the unsigned magnitude.
    pub fn as_u64(&self) -> u64 {
        self.bits
    }

    /// Returns the magnitude interpreted as a two's complement number.
    pub fn as_i64(&self) -> i64 {
        let shift = 64 - self.width;
        ((self.bits << shift) as i64) >> shift
    }

    /// Returns true if every bit is zero.
    pub fn is_zero(&self) -> bool {
        self.bits == 0
    }

    /// Returns true if any bit is set (the HDL truth value).
    pub fn to_bool(&self) -> bool {
        self.bits != 0
    }

    /// Returns the most significant bit.
    pub fn msb(&self) -> bool {
        (self.bits >> (self.width - 1)) & 1 == 1
    }

    /// Truncates or zero-extends to `width` bits.
    ///
    /// # Panics
    ///
    /// Panics if `width` is zero or larger than [`MAX_WIDTH`].
    pub fn resize(self, width: u32) -> Self {
        Self::new(width, self.bits)
    }

    /// Extracts bits `hi` down to `lo` inclusive as a `hi - lo + 1` bit value.
    pub fn range(self, hi: u32, lo: u32) -> Result<Self, ValueError> {
        if hi < lo || hi >= self.width {
            return Err(ValueError::InvalidRange {
                hi,
                lo,
                width: self.width,
            });
        }
        let width = hi - lo + 1;
        Ok(Self {
            width,
            bits: (self.bits >> lo) & mask(width),
        })
    }

    /// Extracts a single bit as a 1-bit value.
    pub fn bit(self, index: u32) -> Result<Self, ValueError> {
        self.range(index, index)
    }

    /// Concatenates `high` above `low`; the result is `high.width + low.width` wide.
    pub fn concat(high: Self, low: Self) -> Result<Self, ValueError> {
        let width = high.width + low.width;
        if width > MAX_WIDTH {
            return Err(ValueError::ConcatTooWide {
                high: high.width,
                low: low.width,
            });
        }
        Ok(Self {
            width,
            bits: (high.bits << low.width) | low.bits,
        })
    }

    /// Logical AND (`&&`): 1-bit result, true iff both operands are non-zero.
    pub fn logical_and(self, rhs: Self) -> Self {
        Self::from_bool(self.to_bool() && rhs.to_bool())
    }

    /// Logical OR (`||`): 1-bit result, true iff either operand is non-zero.
    pub fn logical_or(self, rhs: Self) -> Self {
        Self::from_bool(self.to_bool() || rhs.to_bool())
    }

    /// Logical negation (`!`): 1-bit result, true iff the operand is zero.
    pub fn logical_not(self) -> Self {
        Self::from_bool(self.is_zero())
    }

    /// Renders the value as exactly `width` binary digits, MSB first.
    pub fn to_binary_string(&self) -> String {
        (0..self.width)
            .rev()
            .map(|i| if (self.bits >> i) & 1 == 1 { '1' } else { '0' })
            .collect()
    }

    /// Builds a result of the wider operand's width from already-combined bits.
    fn widest(self, rhs: Self, bits: u64) -> Self {
        let width = self.width.max(rhs.width);
        Self {
            width,
            bits: bits & mask(width),
        }
    }
}

/// Bit mask covering the low `width` bits.
fn mask(width: u32) -> u64 {
    if width >= MAX_WIDTH {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::from_bool(false)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'h{:x}", self.width, self.bits)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({self})")
    }
}

impl Add for Value {
    type Output = Value;

    fn add(self, rhs: Self) -> Value {
        self.widest(rhs, self.bits.wrapping_add(rhs.bits))
    }
}

impl Sub for Value {
    type Output = Value;

    fn sub(self, rhs: Self) -> Value {
        self.widest(rhs, self.bits.wrapping_sub(rhs.bits))
    }
}

impl BitAnd for Value {
    type Output = Value;

    fn bitand(self, rhs: Self) -> Value {
        self.widest(rhs, self.bits & rhs.bits)
    }
}

impl BitOr for Value {
    type Output = Value;

    fn bitor(self, rhs: Self) -> Value {
        self.widest(rhs, self.bits | rhs.bits)
    }
}

impl BitXor for Value {
    type Output = Value;

    fn bitxor(self, rhs: Self) -> Value {
        self.widest(rhs, self.bits ^ rhs.bits)
    }
}

impl Not for Value {
    type Output = Value;

    fn not(self) -> Value {
        Self {
            width: self.width,
            bits: !self.bits & mask(self.width),
        }
    }
}

impl Shl<u32> for Value {
    type Output = Value;

    fn shl(self, amount: u32) -> Value {
        Self {
            width: self.width,
            bits: self.bits.checked_shl(amount).unwrap_or(0) & mask(self.width),
        }
    }
}

impl Shr<u32> for Value {
    type Output = Value;

    fn shr(self, amount: u32) -> Value {
        Self {
            width: self.width,
            bits: self.bits.checked_shr(amount).unwrap_or(0),
        }
    }
}

/// Wire form used by serde so deserialized values are re-validated and masked.
#[derive(Serialize, Deserialize)]
struct RawValue {
    width: u32,
    bits: u64,
}

impl TryFrom<RawValue> for Value {
    type Error = ValueError;

    fn try_from(raw: RawValue) -> Result<Self, ValueError> {
        Value::try_new(raw.width, raw.bits)
    }
}

impl From<Value> for RawValue {
    fn from(v: Value) -> Self {
        RawValue {
            width: v.width,
            bits: v.bits,
        }
    }
}
