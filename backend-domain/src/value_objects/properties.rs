// Packed classification fields

use serde::{Deserialize, Serialize};

const ORIGIN_SHIFT: u32 = 0;
const QUALITY_SHIFT: u32 = 8;
const RARITY_SHIFT: u32 = 16;
const FIELD_MASK: u32 = 0xff;

/// Origin, quality and rarity of an item.
///
/// Stored as one `u32`: bits `[0, 8)` origin, `[8, 16)` quality,
/// `[16, 24)` rarity. The top byte is reserved and written as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Properties {
    pub origin: u8,
    pub quality: u8,
    pub rarity: u8,
}

impl Properties {
    pub fn pack(self) -> u32 {
        (u32::from(self.origin) << ORIGIN_SHIFT)
            | (u32::from(self.quality) << QUALITY_SHIFT)
            | (u32::from(self.rarity) << RARITY_SHIFT)
    }

    pub fn unpack(packed: u32) -> Self {
        Self {
            origin: ((packed >> ORIGIN_SHIFT) & FIELD_MASK) as u8,
            quality: ((packed >> QUALITY_SHIFT) & FIELD_MASK) as u8,
            rarity: ((packed >> RARITY_SHIFT) & FIELD_MASK) as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn layout_places_fields_in_low_three_bytes() {
        let props = Properties {
            origin: 0x08,
            quality: 0x0c,
            rarity: 0x06,
        };
        assert_eq!(props.pack(), 0x0006_0c08);
    }

    #[test]
    fn reserved_byte_is_ignored_on_unpack() {
        let props = Properties::unpack(0xab06_0c08);
        assert_eq!(
            props,
            Properties {
                origin: 0x08,
                quality: 0x0c,
                rarity: 0x06,
            }
        );
    }

    proptest! {
        #[test]
        fn round_trip_is_exact(origin in any::<u8>(), quality in any::<u8>(), rarity in any::<u8>()) {
            let props = Properties { origin, quality, rarity };
            let packed = props.pack();
            prop_assert_eq!(packed >> 24, 0);
            prop_assert_eq!(Properties::unpack(packed), props);
        }
    }
}
