use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use mochi_runtime_core::HostConfig;
use tracing::debug;
use wasmtime::{Cache, Config, Engine, Module};

pub fn build_engine(host: &HostConfig) -> Result<Engine> {
    let mut config = Config::new();
    config.max_wasm_stack(host.wasm_max_stack);
    debug!(max_wasm_stack = host.wasm_max_stack, "configured wasmtime stack");
    if host.wasm_cache {
        let cache = Cache::from_file(None).map_err(anyhow::Error::from).context("load wasmtime cache config")?;
        config.cache(Some(cache));
        debug!("wasmtime cache enabled");
    }
    Engine::new(&config).map_err(anyhow::Error::from).context("create wasmtime engine")
}

/// Reads and compiles a module from disk. With the compilation cache
/// enabled, repeated loads of the same bytes skip cranelift.
pub fn load_or_compile_module(engine: &Engine, wasm_path: &Path, label: &str) -> Result<Module> {
    let read_start = Instant::now();
    let wasm_bytes = fs::read(wasm_path).with_context(|| format!("read {label} {wasm_path:?}"))?;
    debug!(label, elapsed = ?read_start.elapsed(), bytes = wasm_bytes.len(), "read module");
    let compile_start = Instant::now();
    let module = Module::new(engine, wasm_bytes).map_err(anyhow::Error::from)
        .with_context(|| format!("compile {label} {wasm_path:?}"))?;
    debug!(label, elapsed = ?compile_start.elapsed(), "compiled module");
    Ok(module)
}
