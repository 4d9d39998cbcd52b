mod backend;
mod hooks;

#[cfg(all(target_os = "windows", target_arch = "x86_64"))]
mod inline;

#[cfg(test)]
pub mod mock;

pub use backend::HookBackend;
pub use hooks::{HookBinding, HookEngine};

#[cfg(all(target_os = "windows", target_arch = "x86_64"))]
pub use inline::InlineBackend;

#[cfg(test)]
pub use mock::{MockBackend, MockOp};
