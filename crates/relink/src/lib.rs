//! # relink
//!
//! Core library for the relink in-process hook agent.
//!
//! This crate provides:
//! - Module-base-relative address resolution from a configurable offset table
//! - A hook engine with separate install and enable phases, behind a
//!   swappable trampoline backend
//! - The interceptor set: URL rewrite toward a configurable backend and a
//!   policy-gated matchmaking block
//! - Startup policy resolution from small text sources
//! - The agent lifecycle that sequences resolve, install, and enable on a
//!   dedicated worker thread
//!
//! The library is portable; the inline-patching backend and the raw
//! interceptor entry points are compiled only for x86_64 Windows, where
//! the supported host runs.

pub mod agent;
pub mod engine;
pub mod error;
pub mod intercept;
pub mod policy;
pub mod resolve;

pub use agent::{Agent, AgentState, Replacements, spawn_startup};
pub use engine::{HookBackend, HookBinding, HookEngine};
pub use error::{Error, Result};
pub use intercept::{AgentContext, DEFAULT_BACKEND, Disposition, ready_for_match, rewrite_url};
pub use policy::{Policy, load_flag, load_url};
pub use resolve::{ModuleBase, OffsetTable, load_offsets, load_offsets_or_builtin, save_offsets};

#[cfg(all(target_os = "windows", target_arch = "x86_64"))]
pub use engine::InlineBackend;
#[cfg(all(target_os = "windows", target_arch = "x86_64"))]
pub use intercept::{HostString, get_url_thunk, set_ready_for_match_thunk};
