use anyhow::Result;
use mochi_runtime_core::HostConfig;
use serde::Serialize;
use wasmtime::{Engine, ExternType, Linker, Module, Store};

use crate::imports::{NAMESPACES, define_host};
use crate::state::HostState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImportEntry {
    pub module: String,
    pub name: String,
    pub ty: String,
    /// Whether the host linker defines this import name.
    pub resolved: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportEntry {
    pub name: String,
    pub ty: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ModuleSummary {
    pub imports: Vec<ImportEntry>,
    pub exports: Vec<ExportEntry>,
}

impl ModuleSummary {
    /// Imports the host cannot link.
    pub fn unresolved(&self) -> impl Iterator<Item = &ImportEntry> {
        self.imports.iter().filter(|import| !import.resolved)
    }

    /// Imports from namespaces the host does not provide at all.
    pub fn foreign_namespaces(&self) -> impl Iterator<Item = &ImportEntry> {
        self.imports
            .iter()
            .filter(|import| !NAMESPACES.contains(&import.module.as_str()))
    }
}

/// Lists a module's imports and exports, resolving every import against the
/// host linker without instantiating the module.
pub fn inspect(engine: &Engine, module: &Module, config: &HostConfig) -> Result<ModuleSummary> {
    let mut store = Store::new(engine, HostState::new("inspect", config));
    let mut linker = Linker::new(engine);
    define_host(&mut linker)?;

    let mut summary = ModuleSummary::default();
    for import in module.imports() {
        let resolved = linker.get_by_import(&mut store, &import).is_some();
        summary.imports.push(ImportEntry {
            module: import.module().to_string(),
            name: import.name().to_string(),
            ty: describe(&import.ty()),
            resolved,
        });
    }
    for export in module.exports() {
        summary.exports.push(ExportEntry {
            name: export.name().to_string(),
            ty: describe(&export.ty()),
        });
    }
    Ok(summary)
}

fn describe(ty: &ExternType) -> String {
    match ty {
        ExternType::Func(func) => {
            let params = func.params().map(|param| param.to_string()).collect::<Vec<_>>();
            let results = func.results().map(|result| result.to_string()).collect::<Vec<_>>();
            if results.is_empty() {
                format!("func({})", params.join(", "))
            } else {
                format!("func({}) -> {}", params.join(", "), results.join(", "))
            }
        }
        ExternType::Memory(memory) => match memory.maximum() {
            Some(max) => format!("memory {}..{max}", memory.minimum()),
            None => format!("memory {}..", memory.minimum()),
        },
        ExternType::Table(table) => format!("table {}", table.minimum()),
        ExternType::Global(global) => format!("global {}", global.content()),
        _ => "other".to_string(),
    }
}
