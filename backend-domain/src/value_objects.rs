// Domain value objects
pub mod identifiers;
pub mod properties;
pub mod unsigned;
pub mod wear;

pub use identifiers::*;
pub use properties::*;
pub use unsigned::*;
pub use wear::*;
