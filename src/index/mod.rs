mod gsi;
mod lsi;
mod projection;
mod storage;

pub use gsi::{GlobalSecondaryIndex, GsiBuilder};
pub use lsi::{LocalSecondaryIndex, LsiBuilder};
pub use projection::Projection;
