//! In-process loader shim for the relink agent.
//!
//! This cdylib is what actually gets loaded into the host. It owns the
//! host lifecycle events: on attach it brings up the console and logging,
//! then hands the entire setup sequence to a worker thread; on detach it
//! only says goodbye — hooks are left in place because the terminating
//! host invalidates them anyway.

#[cfg(all(target_os = "windows", target_arch = "x86_64"))]
mod entry;
#[cfg(all(target_os = "windows", target_arch = "x86_64"))]
mod logging;
