//! Invalid-operand errors raised by [`Value`](crate::Value) operations.
//!
//! These indicate a mistake in the simulated model (asking for bit 40 of a
//! 32-bit net, an edge on a bus), never a runtime condition to recover from.

/// Errors raised when a value operation receives an operand it cannot honor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// The requested width is zero or wider than the 64-bit backing store.
    #[error("invalid width {width} (must be 1..=64)")]
    InvalidWidth {
        /// The rejected width.
        width: u32,
    },

    /// A bit range was malformed or reached past the value's width.
    #[error("invalid bit range [{hi}:{lo}] on a {width}-bit value")]
    InvalidRange {
        /// Most significant bit of the request.
        hi: u32,
        /// Least significant bit of the request.
        lo: u32,
        /// Width of the value being sliced.
        width: u32,
    },

    /// A single-bit operation (edge detection) was applied to a wider value.
    #[error("operation requires a 1-bit value, found {width} bits")]
    NotSingleBit {
        /// Width of the offending value.
        width: u32,
    },

    /// Concatenation would produce a value wider than 64 bits.
    #[error("concatenation of {high} and {low} bits exceeds 64 bits")]
    ConcatTooWide {
        /// Width of the high operand.
        high: u32,
        /// Width of the low operand.
        low: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_width_display() {
        let e = ValueError::InvalidWidth { width: 0 };
        assert_eq!(e.to_string(), "invalid width 0 (must be 1..=64)");
    }

    #[test]
    fn invalid_range_display() {
        let e = ValueError::InvalidRange {
            hi: 3,
            lo: 5,
            width: 8,
        };
        assert_eq!(e.to_string(), "invalid bit range [3:5] on a 8-bit value");
    }

    #[test]
    fn not_single_bit_display() {
        let e = ValueError::NotSingleBit { width: 4 };
        assert_eq!(e.to_string(), "operation requires a 1-bit value, found 4 bits");
    }

    #[test]
    fn concat_too_wide_display() {
        let e = ValueError::ConcatTooWide { high: 40, low: 32 };
        assert_eq!(
            e.to_string(),
            "concatenation of 40 and 32 bits exceeds 64 bits"
        );
    }
}
