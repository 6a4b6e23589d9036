pub mod entry;
pub mod point;

pub use entry::*;
pub use point::*;
