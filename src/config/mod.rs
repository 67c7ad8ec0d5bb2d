mod hook;
mod project;

pub(crate) use hook::non_empty;
pub use hook::*;
pub use project::*;
