// Bounded wear rank

use crate::entities::{Rank, StoredItem};
use crate::ports::ItemRepository;

/// Scan bound for each side of a rank query.
pub const DEFAULT_RANK_CAP: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankDirection {
    /// Items with a strictly lower wear, scanned in ascending wear order.
    Below,
    /// Items with a strictly higher wear, scanned in descending wear order.
    Above,
}

/// Ranks an item within its class by counting neighbours on each side,
/// reading at most `cap` rows per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankEngine {
    cap: usize,
}

impl Default for RankEngine {
    fn default() -> Self {
        Self::new(DEFAULT_RANK_CAP)
    }
}

impl RankEngine {
    pub fn new(cap: usize) -> Self {
        Self { cap: cap.max(1) }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Turns a capped neighbour count into a 1-based rank. A count that
    /// reached the cap has no reliable rank.
    pub fn resolve(&self, counted: usize) -> Option<u32> {
        if counted >= self.cap {
            return None;
        }
        u32::try_from(counted + 1).ok()
    }

    pub async fn rank(
        &self,
        repo: &dyn ItemRepository,
        target: &StoredItem,
    ) -> anyhow::Result<Rank> {
        let class = target.class();
        let below = repo
            .count_in_class(&class, target.wear, RankDirection::Below, self.cap)
            .await?;
        let above = repo
            .count_in_class(&class, target.wear, RankDirection::Above, self.cap)
            .await?;
        Ok(Rank {
            low_rank: self.resolve(below),
            high_rank: self.resolve(above),
        })
    }
}
