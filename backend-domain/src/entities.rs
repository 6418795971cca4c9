// Domain entities

pub mod item;
pub mod model;
pub mod sticker;

pub use item::*;
pub use model::*;
pub use sticker::*;
