//! Helpers built on top of the buffer types.
mod boomerang;

pub use boomerang::Boomerang;
