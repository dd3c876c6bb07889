mod algorithms;
mod primitives;

pub use algorithms::*;
pub use primitives::*;
