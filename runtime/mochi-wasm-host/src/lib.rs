//! wasmtime backend for Mochi bytecode modules.
//!
//! A guest imports capabilities from the `env`, `crypto`, `html`, `json`,
//! `http`, `structs_meta` and `structs_video` namespaces, exports its linear
//! memory as `memory` and exposes entry points as plain exported functions.
//! Strings and byte buffers cross the boundary as `(ptr, len)` pairs,
//! everything composite as `i32` handles into the instance's arena.

mod engine;
mod imports;
mod inspect;
mod module;
mod state;

pub use engine::{build_engine, load_or_compile_module};
pub use imports::{NAMESPACES, define_host};
pub use inspect::{ExportEntry, ImportEntry, ModuleSummary, inspect};
pub use module::WasmModule;
pub use state::HostState;
