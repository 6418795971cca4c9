pub mod sqlite_items;

pub use sqlite_items::*;
