// Sticker attachments

use serde::{Deserialize, Serialize};

/// A sticker as reported by the upstream feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawSticker {
    pub slot: u8,
    pub sticker_id: u32,
    #[serde(default)]
    pub wear: Option<f32>,
}

/// A stored sticker. `duplicates` is set on one member of each group of
/// stickers sharing a `sticker_id` and holds the group size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sticker {
    pub slot: u8,
    pub sticker_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wear: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicates: Option<u32>,
}

impl From<RawSticker> for Sticker {
    fn from(raw: RawSticker) -> Self {
        Self {
            slot: raw.slot,
            sticker_id: raw.sticker_id,
            wear: raw.wear,
            duplicates: None,
        }
    }
}
