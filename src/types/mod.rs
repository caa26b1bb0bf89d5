mod file;
mod job;
mod preview;

pub use file::SourceFile;
pub use job::*;
pub use preview::*;
