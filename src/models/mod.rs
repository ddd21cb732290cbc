pub mod asset;
pub mod budget;
pub mod event;
pub mod labor;

pub use asset::*;
pub use budget::*;
pub use event::*;
pub use labor::*;
