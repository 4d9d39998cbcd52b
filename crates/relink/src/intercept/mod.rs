mod behaviors;
mod context;

#[cfg(all(target_os = "windows", target_arch = "x86_64"))]
mod thunks;

pub use behaviors::*;
pub use context::*;

#[cfg(all(target_os = "windows", target_arch = "x86_64"))]
pub use thunks::*;
