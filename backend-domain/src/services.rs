// Domain services

pub mod dedup;
pub mod rank;
pub mod stickers;

pub use dedup::*;
pub use rank::*;
pub use stickers::*;
