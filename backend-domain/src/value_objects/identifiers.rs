// Identifier value objects

use serde::Serialize;

use crate::value_objects::unsigned::u64_string;

/// First 64-bit id of the individual account range; individual accounts
/// occupy the next 2^32 ids.
pub const ACCOUNT_ID_BASE: u64 = 76_561_197_960_265_728;
const ACCOUNT_ID_SPAN: u64 = 1 << 32;

/// Who holds an item: a player account or a market listing. Both share one
/// stored column and are told apart by value range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Holder {
    Account(#[serde(with = "u64_string")] u64),
    Listing(#[serde(with = "u64_string")] u64),
}

impl Holder {
    pub fn classify(id: u64) -> Self {
        if (ACCOUNT_ID_BASE..ACCOUNT_ID_BASE + ACCOUNT_ID_SPAN).contains(&id) {
            Holder::Account(id)
        } else {
            Holder::Listing(id)
        }
    }

    /// Upstream sends the account id as zero when the item is on the market.
    pub fn from_feed(account_id: u64, listing_id: u64) -> Self {
        if account_id != 0 {
            Self::classify(account_id)
        } else {
            Self::classify(listing_id)
        }
    }

    pub fn id(self) -> u64 {
        match self {
            Holder::Account(id) | Holder::Listing(id) => id,
        }
    }
}
