mod base;
mod loader;
mod table;

pub use base::*;
pub use loader::*;
pub use table::*;
