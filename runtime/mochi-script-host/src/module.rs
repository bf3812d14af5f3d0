use std::borrow::Cow;
use std::fs;
use std::rc::Rc;

use anyhow::{Context as _, Result, anyhow, bail};
use mochi_runtime::{HostArena, HttpClient};
use mochi_runtime_core::{
    BackendKind, DynValue, HostConfig, ModuleBackend, ModuleError, ModuleManifest,
};
use rquickjs::{CatchResultExt, Context, Function, Runtime};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::bridge::{self, ScriptState};

const PRELUDE: &str = include_str!("prelude.js");

/// One evaluated script bundle and its long-lived class instance.
pub struct ScriptModule {
    state: Rc<ScriptState>,
    class_name: String,
    max_jobs: usize,
    context: Context,
    runtime: Runtime,
}

impl ScriptModule {
    pub fn load(manifest: &ModuleManifest, config: &HostConfig) -> Result<Self> {
        if manifest.backend != BackendKind::Script {
            bail!("module {} is not a script module", manifest.id);
        }
        let source = fs::read_to_string(&manifest.file)
            .with_context(|| format!("read script {:?}", manifest.file))?;
        Self::new(&manifest.id, &source, manifest.class_name(), config)
    }

    pub fn new(module_id: &str, source: &str, class_name: &str, config: &HostConfig) -> Result<Self> {
        if !is_identifier(class_name) {
            bail!("class name `{class_name}` is not a JavaScript identifier");
        }
        let state = Rc::new(ScriptState {
            module_id: module_id.to_string(),
            arena: HostArena::new(),
            http: HttpClient::new(config),
        });
        let runtime = Runtime::new().map_err(|err| anyhow!("create QuickJS runtime: {err}"))?;
        let context = Context::full(&runtime).map_err(|err| anyhow!("create QuickJS context: {err}"))?;
        context.with(|ctx| -> Result<()> {
            bridge::install(&ctx, &state).map_err(|err| anyhow!("install host bridge: {err}"))?;
            ctx.eval::<(), _>(PRELUDE)
                .catch(&ctx)
                .map_err(|err| anyhow!("evaluate prelude: {err}"))?;
            ctx.eval::<(), _>(source)
                .catch(&ctx)
                .map_err(|err| anyhow!("evaluate {module_id}: {err}"))?;
            Ok(())
        })?;
        debug!(module = module_id, class_name, "script loaded");
        Ok(Self {
            state,
            class_name: class_name.to_string(),
            max_jobs: config.script_max_jobs,
            context,
            runtime,
        })
    }

    pub fn arena(&self) -> &HostArena {
        &self.state.arena
    }

    /// Generation of the arena, advanced once per invocation.
    pub fn generation(&self) -> u64 {
        self.state.arena.generation()
    }

    /// Runs queued promise jobs until the queue drains or `max_jobs` ran.
    fn pump(&self, entry: &str) -> Result<usize, ModuleError> {
        let mut jobs = 0;
        while self.runtime.is_job_pending() {
            if jobs == self.max_jobs {
                return Err(ModuleError::Script(format!(
                    "`{entry}` still pending after {jobs} promise jobs"
                )));
            }
            self.runtime.execute_pending_job().map_err(|_| {
                ModuleError::Script(format!("a promise job of `{entry}` raised an uncaught exception"))
            })?;
            jobs += 1;
        }
        Ok(jobs)
    }
}

impl ModuleBackend for ScriptModule {
    fn module_id(&self) -> &str {
        &self.state.module_id
    }

    fn invoke_dyn(&mut self, entry: &str, args: &[DynValue]) -> Result<DynValue, ModuleError> {
        let generation = self.state.arena.reset();
        debug!(module = %self.state.module_id, entry, generation, "invoke");
        let args = JsonValue::Array(args.iter().map(DynValue::to_json).collect()).to_string();
        let started = self.context.with(|ctx| {
            let start: Function = ctx.globals().get("__mochi_start").catch(&ctx).map_err(script_error)?;
            start
                .call::<_, bool>((self.class_name.as_str(), method_name(entry).as_ref(), args))
                .catch(&ctx)
                .map_err(script_error)
        })?;
        if !started {
            return Err(ModuleError::MissingEntry(entry.to_string()));
        }
        let jobs = self.pump(entry)?;
        let settled = self.context.with(|ctx| {
            let take: Function = ctx.globals().get("__mochi_take").catch(&ctx).map_err(script_error)?;
            take.call::<_, String>(()).catch(&ctx).map_err(script_error)
        })?;
        debug!(module = %self.state.module_id, entry, jobs, "invoke settled");
        settle(entry, &settled)
    }
}

fn script_error(err: impl std::fmt::Display) -> ModuleError {
    ModuleError::Script(err.to_string())
}

fn settle(entry: &str, settled: &str) -> Result<DynValue, ModuleError> {
    let mut state: JsonValue = serde_json::from_str(settled).map_err(script_error)?;
    if state["done"] != JsonValue::Bool(true) {
        return Err(ModuleError::Script(format!("`{entry}` never settled")));
    }
    if let Some(error) = state["error"].as_str() {
        return Err(ModuleError::Script(error.to_string()));
    }
    Ok(DynValue::from_json(state["value"].take()))
}

/// Conventional entry points are snake_case; script classes spell their
/// methods in camelCase.
fn method_name(entry: &str) -> Cow<'_, str> {
    if !entry.contains('_') {
        return Cow::Borrowed(entry);
    }
    let mut method = String::with_capacity(entry.len());
    let mut upper = false;
    for ch in entry.chars() {
        match ch {
            '_' if !method.is_empty() => upper = true,
            _ if upper => {
                method.extend(ch.to_uppercase());
                upper = false;
            }
            _ => method.push(ch),
        }
    }
    Cow::Owned(method)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|rest| rest.is_ascii_alphanumeric() || rest == '_' || rest == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_names_become_method_names() {
        assert_eq!(method_name("search_filters"), "searchFilters");
        assert_eq!(method_name("playlist_server"), "playlistServer");
        assert_eq!(method_name("search"), "search");
        assert_eq!(method_name("_private_call"), "_privateCall");
    }

    #[test]
    fn class_names_must_be_identifiers() {
        assert!(is_identifier("Source"));
        assert!(is_identifier("$Source_2"));
        assert!(!is_identifier("2Source"));
        assert!(!is_identifier("Source; alert(1)"));
        assert!(!is_identifier(""));
    }
}
