use mochi_obj_model::{Fault, FaultKind};

use crate::codec::{DecodeError, KeyStyle};
use crate::dyn_value::DynValue;

/// Top-level failure of one module invocation.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("module does not export entry point `{0}`")]
    MissingEntry(String),
    #[error("module returned a fault: {0}")]
    Fault(#[from] Fault),
    #[error("module result did not decode: {0}")]
    Decode(#[from] DecodeError),
    #[error("module trapped: {0}")]
    Trap(String),
    #[error("script error: {0}")]
    Script(String),
    #[error("module configuration: {0}")]
    Config(String),
}

impl ModuleError {
    /// The error as a normalized fault, for consumers that only speak the
    /// fault taxonomy.
    pub fn fault(&self) -> Fault {
        match self {
            ModuleError::Fault(fault) => fault.clone(),
            ModuleError::MissingEntry(_) => Fault::missing(self.to_string()),
            ModuleError::Decode(_) => Fault::cast(self.to_string()),
            ModuleError::Trap(message) if message.contains("out of bounds") => {
                Fault::new(FaultKind::MemoryFault, self.to_string())
            }
            ModuleError::Trap(_) | ModuleError::Script(_) | ModuleError::Config(_) => {
                Fault::unknown(self.to_string())
            }
        }
    }
}

/// An execution engine hosting one loaded module.
///
/// Every call to [`ModuleBackend::invoke_dyn`] is one top-level invocation:
/// the backend resets its arena before running guest code.
pub trait ModuleBackend {
    fn module_id(&self) -> &str;

    /// Key spelling the guest uses for record fields.
    fn key_style(&self) -> KeyStyle {
        KeyStyle::CamelCase
    }

    fn invoke_dyn(&mut self, entry: &str, args: &[DynValue]) -> Result<DynValue, ModuleError>;
}

impl<B: ModuleBackend + ?Sized> ModuleBackend for Box<B> {
    fn module_id(&self) -> &str {
        (**self).module_id()
    }

    fn key_style(&self) -> KeyStyle {
        (**self).key_style()
    }

    fn invoke_dyn(&mut self, entry: &str, args: &[DynValue]) -> Result<DynValue, ModuleError> {
        (**self).invoke_dyn(entry, args)
    }
}
