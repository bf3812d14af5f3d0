use anyhow::{Context, Result, bail};
use mochi_obj_model::{Fault, Handle};
use mochi_runtime::{HostArena, HostValue};
use mochi_runtime_core::{
    BackendKind, DynValue, HostConfig, KeyStyle, ModuleBackend, ModuleError, ModuleManifest,
};
use tracing::debug;
use wasmtime::{Engine, FuncType, Instance, Linker, Module, Store, Val, ValType};

use crate::engine::{build_engine, load_or_compile_module};
use crate::imports::define_host;
use crate::state::HostState;

/// One instantiated bytecode module with its own store and arena.
pub struct WasmModule {
    store: Store<HostState>,
    instance: Instance,
}

impl WasmModule {
    /// Compiles and instantiates the module a manifest points at.
    pub fn load(manifest: &ModuleManifest, config: &HostConfig) -> Result<Self> {
        if manifest.backend != BackendKind::Wasm {
            bail!("module {} is not a wasm module", manifest.id);
        }
        let engine = build_engine(config)?;
        let module = load_or_compile_module(&engine, &manifest.file, &manifest.id)?;
        Self::instantiate(&engine, &module, &manifest.id, config)
    }

    /// Compiles `bytes` (binary, or text when wasmtime's `wat` feature is
    /// on) and instantiates it.
    pub fn from_bytes(module_id: &str, bytes: impl AsRef<[u8]>, config: &HostConfig) -> Result<Self> {
        let engine = build_engine(config)?;
        let module = Module::new(&engine, bytes.as_ref()).map_err(anyhow::Error::from).with_context(|| format!("compile {module_id}"))?;
        Self::instantiate(&engine, &module, module_id, config)
    }

    pub fn instantiate(engine: &Engine, module: &Module, module_id: &str, config: &HostConfig) -> Result<Self> {
        let mut store = Store::new(engine, HostState::new(module_id, config));
        let mut linker = Linker::new(engine);
        define_host(&mut linker)?;
        debug!(module = module_id, "instantiating");
        let instance = linker
            .instantiate(&mut store, module).map_err(anyhow::Error::from)
            .with_context(|| format!("instantiate {module_id}"))?;
        set_memory_from_exports(&mut store, &instance);
        debug!(module = module_id, "instantiated");
        Ok(Self { store, instance })
    }

    pub fn arena(&self) -> &HostArena {
        self.store.data().arena()
    }

    /// Generation of the arena, advanced once per invocation.
    pub fn generation(&self) -> u64 {
        self.arena().generation()
    }

    /// Lowers one argument for a parameter of type `param`. Booleans and
    /// numbers travel as scalars; anything else, or a fractional number
    /// for an `i32` slot, is placed in the arena and passed as a handle.
    fn lower(&self, entry: &str, index: usize, arg: &DynValue, param: &ValType) -> Result<Val, ModuleError> {
        let val = match (arg, param) {
            (DynValue::Bool(flag), ValType::I32) => Val::I32(i32::from(*flag)),
            (DynValue::Bool(flag), ValType::I64) => Val::I64(i64::from(*flag)),
            (DynValue::Number(number), ValType::I32)
                if number.fract() == 0.0 && (i32::MIN as f64..=i32::MAX as f64).contains(number) =>
            {
                Val::I32(*number as i32)
            }
            (DynValue::Number(number), ValType::I64) if number.fract() == 0.0 => Val::I64(*number as i64),
            (DynValue::Number(number), ValType::F32) => Val::F32((*number as f32).to_bits()),
            (DynValue::Number(number), ValType::F64) => Val::F64(number.to_bits()),
            (_, ValType::I32) => Val::I32(self.arena().add(HostValue::from_dyn(arg.clone())).raw()),
            _ => {
                return Err(ModuleError::Config(format!(
                    "argument {index} of `{entry}` cannot be passed as {param}"
                )));
            }
        };
        Ok(val)
    }

    fn lift(&self, entry: &str, results: &[Val]) -> Result<DynValue, ModuleError> {
        match results {
            [] => Ok(DynValue::Null),
            [Val::I32(raw)] => self.resolve(Handle::from_raw(*raw)),
            [Val::I64(raw)] => Ok(DynValue::Number(*raw as f64)),
            [Val::F32(bits)] => Ok(DynValue::Number(f64::from(f32::from_bits(*bits)))),
            [Val::F64(bits)] => Ok(DynValue::Number(f64::from_bits(*bits))),
            _ => Err(ModuleError::Config(format!("`{entry}` has an unsupported result signature"))),
        }
    }

    fn resolve(&self, handle: Handle) -> Result<DynValue, ModuleError> {
        let arena = self.arena();
        if handle.is_fault() {
            let fault = arena
                .fault(handle)
                .unwrap_or_else(|| Fault::missing(format!("fault handle {handle} was never recorded")));
            return Err(fault.into());
        }
        Ok(arena.with(handle, |value| value.to_dyn(KeyStyle::SnakeCase))?)
    }
}

impl ModuleBackend for WasmModule {
    fn module_id(&self) -> &str {
        self.store.data().module_id()
    }

    fn key_style(&self) -> KeyStyle {
        KeyStyle::SnakeCase
    }

    fn invoke_dyn(&mut self, entry: &str, args: &[DynValue]) -> Result<DynValue, ModuleError> {
        let generation = self.arena().reset();
        debug!(module = self.module_id(), entry, generation, "invoke");
        let func = self
            .instance
            .get_func(&mut self.store, entry)
            .ok_or_else(|| ModuleError::MissingEntry(entry.to_string()))?;
        let ty = func.ty(&self.store);
        if ty.params().len() != args.len() {
            return Err(ModuleError::Config(format!(
                "`{entry}` takes {} arguments, got {}",
                ty.params().len(),
                args.len()
            )));
        }
        let params = ty
            .params()
            .zip(args)
            .enumerate()
            .map(|(index, (param, arg))| self.lower(entry, index, arg, &param))
            .collect::<Result<Vec<_>, _>>()?;
        let mut results = alloc_results(entry, &ty)?;
        func.call(&mut self.store, &params, &mut results)
            .map_err(|err| ModuleError::Trap(format!("{err:#}")))?;
        let arena = self.arena();
        debug!(
            module = self.module_id(),
            entry,
            live = arena.live_len(),
            faults = arena.fault_len(),
            "invoke returned"
        );
        self.lift(entry, &results)
    }
}

fn alloc_results(entry: &str, ty: &FuncType) -> Result<Vec<Val>, ModuleError> {
    ty.results()
        .map(|val_ty| {
            Val::default_for_ty(&val_ty).ok_or_else(|| {
                ModuleError::Config(format!("unsupported `{entry}` return type: {val_ty}"))
            })
        })
        .collect()
}

fn set_memory_from_exports(store: &mut Store<HostState>, instance: &Instance) {
    if store.data().memory.is_some() {
        return;
    }
    if let Some(mem) = instance.get_memory(&mut *store, "memory") {
        store.data_mut().memory = Some(mem);
    }
}
