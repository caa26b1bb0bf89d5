mod memory;

pub use memory::{PathCache, ProcessedPathCache};
