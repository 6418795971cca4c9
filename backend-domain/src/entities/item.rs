// Item entity
// One canonical record per (defindex, paintindex, wear, paint_seed)

use serde::{Deserialize, Serialize};

use crate::entities::{RawSticker, Sticker};
use crate::services::stickers::canonicalize_stickers;
use crate::value_objects::{decode_u64, encode_u64, u64_string, Holder, Properties, Wear};

/// Quality id of souvenir items.
pub const SOUVENIR_QUALITY: u8 = 12;

/// A raw observation from the upstream feed.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemObservation {
    #[serde(with = "u64_string")]
    pub asset_id: u64,
    #[serde(default, with = "u64_string")]
    pub account_id: u64,
    #[serde(default, with = "u64_string")]
    pub listing_id: u64,
    #[serde(default, with = "u64_string")]
    pub linked_id: u64,
    pub defindex: u16,
    pub paintindex: u16,
    #[serde(default)]
    pub paint_seed: u16,
    pub wear: f32,
    #[serde(default)]
    pub kill_eater_value: Option<u32>,
    #[serde(default)]
    pub origin: u8,
    #[serde(default)]
    pub quality: u8,
    #[serde(default)]
    pub rarity: u8,
    #[serde(default)]
    pub stickers: Vec<RawSticker>,
}

/// A fully decoded item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    #[serde(with = "u64_string")]
    pub asset_id: u64,
    pub holder: Holder,
    #[serde(with = "u64_string")]
    pub linked_id: u64,
    pub defindex: u16,
    pub paintindex: u16,
    pub paint_seed: u16,
    pub wear: Wear,
    pub stattrak: bool,
    pub souvenir: bool,
    #[serde(flatten)]
    pub properties: Properties,
    pub stickers: Option<Vec<Sticker>>,
    pub updated_at: i64,
}

impl Item {
    /// Builds an item from an observation, or `None` when the observation has
    /// no usable wear and must not be stored.
    pub fn from_observation(observation: ItemObservation, observed_at: i64) -> Option<Self> {
        let wear = Wear::new(observation.wear)?;
        Some(Self {
            asset_id: observation.asset_id,
            holder: Holder::from_feed(observation.account_id, observation.listing_id),
            linked_id: observation.linked_id,
            defindex: observation.defindex,
            paintindex: observation.paintindex,
            paint_seed: observation.paint_seed,
            wear,
            stattrak: observation.kill_eater_value.is_some(),
            souvenir: observation.quality == SOUVENIR_QUALITY,
            properties: Properties {
                origin: observation.origin,
                quality: observation.quality,
                rarity: observation.rarity,
            },
            stickers: canonicalize_stickers(observation.stickers),
            updated_at: observed_at,
        })
    }
}

/// Deduplication identity of a stored item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKey {
    pub defindex: u16,
    pub paintindex: u16,
    pub wear: i32,
    pub paint_seed: u16,
}

/// The population an item is ranked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RankClass {
    pub defindex: u16,
    pub paintindex: u16,
    pub stattrak: bool,
    pub souvenir: bool,
}

/// An item in its persisted form: ids and wear encoded for signed columns,
/// classification packed.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredItem {
    pub asset_id: i64,
    pub holder_id: i64,
    pub linked_id: i64,
    pub defindex: u16,
    pub paintindex: u16,
    pub paint_seed: u16,
    pub wear: i32,
    pub stattrak: bool,
    pub souvenir: bool,
    pub properties: u32,
    pub rarity: u16,
    pub stickers: Option<Vec<Sticker>>,
    pub updated_at: i64,
}

impl StoredItem {
    pub fn key(&self) -> CanonicalKey {
        CanonicalKey {
            defindex: self.defindex,
            paintindex: self.paintindex,
            wear: self.wear,
            paint_seed: self.paint_seed,
        }
    }

    pub fn class(&self) -> RankClass {
        RankClass {
            defindex: self.defindex,
            paintindex: self.paintindex,
            stattrak: self.stattrak,
            souvenir: self.souvenir,
        }
    }

    pub fn decode(&self) -> Item {
        Item {
            asset_id: decode_u64(self.asset_id),
            holder: Holder::classify(decode_u64(self.holder_id)),
            linked_id: decode_u64(self.linked_id),
            defindex: self.defindex,
            paintindex: self.paintindex,
            paint_seed: self.paint_seed,
            wear: Wear::from_encoded(self.wear),
            stattrak: self.stattrak,
            souvenir: self.souvenir,
            properties: Properties::unpack(self.properties),
            stickers: self.stickers.clone(),
            updated_at: self.updated_at,
        }
    }
}

impl From<&Item> for StoredItem {
    fn from(item: &Item) -> Self {
        Self {
            asset_id: encode_u64(item.asset_id),
            holder_id: encode_u64(item.holder.id()),
            linked_id: encode_u64(item.linked_id),
            defindex: item.defindex,
            paintindex: item.paintindex,
            paint_seed: item.paint_seed,
            wear: item.wear.encoded(),
            stattrak: item.stattrak,
            souvenir: item.souvenir,
            properties: item.properties.pack(),
            rarity: u16::from(item.properties.rarity),
            stickers: item.stickers.clone(),
            updated_at: item.updated_at,
        }
    }
}
