mod chunk;
mod region;

pub(crate) use chunk::Chunk;
pub use region::{DynBuf, Region};
