//! QuickJS backend for Mochi script modules.
//!
//! A script bundle defines a global class (`Source` unless the manifest says
//! otherwise). The host evaluates a small prelude that provides `console`
//! and a promise-based `request` API, evaluates the bundle, instantiates the
//! class once and calls its methods with codec-encoded arguments.

mod bridge;
mod module;

pub use module::ScriptModule;
