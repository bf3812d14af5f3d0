use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use mochi_runtime_core::{BackendKind, DynValue, HostConfig, ModuleBackend, ModuleManifest};
use mochi_script_host::ScriptModule;
use mochi_wasm_host::{WasmModule, build_engine, inspect, load_or_compile_module};
use serde_json::Value as JsonValue;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mochi-host")]
#[command(about = "Runs Mochi modules outside the app.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Invoke one entry point and print its result as JSON.
    Invoke {
        manifest: PathBuf,
        entry: String,
        /// Positional argument for the entry point, as JSON. Repeatable.
        #[arg(long = "arg", value_name = "JSON")]
        args: Vec<String>,
    },
    /// List a wasm module's imports and exports.
    Inspect {
        module: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("MOCHI_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = HostConfig::from_env();
    match cli.command {
        Command::Invoke {
            manifest,
            entry,
            args,
        } => invoke(&config, &manifest, &entry, &args),
        Command::Inspect { module, json } => inspect_module(&config, &module, json),
    }
}

fn parse_args(raw: &[String]) -> Result<Vec<DynValue>> {
    raw.iter()
        .enumerate()
        .map(|(index, arg)| {
            serde_json::from_str::<JsonValue>(arg)
                .map(DynValue::from_json)
                .with_context(|| format!("argument {index} is not JSON: {arg}"))
        })
        .collect()
}

fn load_backend(manifest: &ModuleManifest, config: &HostConfig) -> Result<Box<dyn ModuleBackend>> {
    let backend: Box<dyn ModuleBackend> = match manifest.backend {
        BackendKind::Wasm => Box::new(WasmModule::load(manifest, config)?),
        BackendKind::Script => Box::new(ScriptModule::load(manifest, config)?),
    };
    Ok(backend)
}

fn invoke(config: &HostConfig, manifest_path: &Path, entry: &str, raw_args: &[String]) -> Result<()> {
    let manifest = ModuleManifest::load(manifest_path)?;
    let args = parse_args(raw_args)?;
    let mut backend = load_backend(&manifest, config)?;
    debug!(module = %manifest.id, version = %manifest.version, entry, "invoking");
    let value = backend
        .invoke_dyn(entry, &args)
        .with_context(|| format!("invoke `{entry}` on {}", manifest.id))?;
    println!("{}", serde_json::to_string_pretty(&value.to_json())?);
    Ok(())
}

fn inspect_module(config: &HostConfig, path: &Path, json: bool) -> Result<()> {
    let engine = build_engine(config)?;
    let module = load_or_compile_module(&engine, path, "module")?;
    let summary = inspect(&engine, &module, config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("imports:");
        for import in &summary.imports {
            let flag = if import.resolved { "" } else { "  [unsupported]" };
            println!("  {}.{}  {}{flag}", import.module, import.name, import.ty);
        }
        println!("exports:");
        for export in &summary.exports {
            println!("  {}  {}", export.name, export.ty);
        }
    }
    let unresolved = summary.unresolved().count();
    if unresolved > 0 {
        bail!("{unresolved} import(s) cannot be linked by this host");
    }
    Ok(())
}
