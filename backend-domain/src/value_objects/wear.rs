// Wear value object and its order-preserving integer encoding

use serde::{Serialize, Serializer};

/// Reinterprets the IEEE-754 bits of `value` as an `i32`.
///
/// For non-negative finite floats the sign bit is clear, so the bit patterns
/// sort exactly like the floats they encode.
pub fn encode_wear(value: f32) -> i32 {
    value.to_bits() as i32
}

/// Exact bit-pattern inverse of [`encode_wear`].
pub fn decode_wear(bits: i32) -> f32 {
    f32::from_bits(bits as u32)
}

/// A cosmetic condition value known to be positive and finite.
///
/// Zero, negative and non-finite inputs mark items without a wear (stickers,
/// cases, agents) and never become a `Wear`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Wear(f32);

impl Wear {
    pub fn new(value: f32) -> Option<Self> {
        if value.is_finite() && value > 0.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Rebuilds a wear from a stored column; stored values were validated on
    /// the way in.
    pub fn from_encoded(bits: i32) -> Self {
        Self(decode_wear(bits))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    pub fn encoded(self) -> i32 {
        encode_wear(self.0)
    }
}

impl Serialize for Wear {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f32(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sentinel_values_are_rejected() {
        assert!(Wear::new(0.0).is_none());
        assert!(Wear::new(-0.0).is_none());
        assert!(Wear::new(-0.25).is_none());
        assert!(Wear::new(f32::NAN).is_none());
        assert!(Wear::new(f32::INFINITY).is_none());
        assert!(Wear::new(0.07).is_some());
    }

    #[test]
    fn encoding_matches_big_endian_int_view() {
        let wear = 0.15_f32;
        let expected = i32::from_be_bytes(wear.to_be_bytes());
        assert_eq!(encode_wear(wear), expected);
        assert!(encode_wear(wear) > 0);
    }

    #[test]
    fn stored_wear_rebuilds_exactly() {
        let wear = Wear::new(0.123_456).expect("valid wear");
        assert_eq!(Wear::from_encoded(wear.encoded()), wear);
    }

    fn non_negative_finite() -> impl Strategy<Value = f32> {
        (0u32..0x7f80_0000).prop_map(f32::from_bits)
    }

    proptest! {
        #[test]
        fn round_trip_is_exact(value in non_negative_finite()) {
            prop_assert_eq!(decode_wear(encode_wear(value)).to_bits(), value.to_bits());
        }

        #[test]
        fn encoding_preserves_order(a in non_negative_finite(), b in non_negative_finite()) {
            prop_assert_eq!(a < b, encode_wear(a) < encode_wear(b));
        }
    }
}
