pub mod item_handlers;
pub mod ops_handlers;

pub use item_handlers::*;
pub use ops_handlers::*;
