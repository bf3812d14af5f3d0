use std::fmt;

/// Failure taxonomy shared by every capability.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Out-of-bounds or malformed guest byte span.
    MemoryFault,
    /// Handle present but holding the wrong kind of value.
    CastError,
    /// Required field or handle absent.
    NullOrMissing,
    /// Network failure or timeout.
    TransportError,
    /// Malformed or unsupported markup or selector.
    DocumentError,
    UnknownError,
}

impl FaultKind {
    /// Stable numeric code exposed to guests.
    pub const fn code(self) -> i32 {
        match self {
            FaultKind::MemoryFault => 1,
            FaultKind::CastError => 2,
            FaultKind::NullOrMissing => 3,
            FaultKind::TransportError => 4,
            FaultKind::DocumentError => 5,
            FaultKind::UnknownError => 6,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            FaultKind::MemoryFault => "memory_fault",
            FaultKind::CastError => "cast_error",
            FaultKind::NullOrMissing => "null_or_missing",
            FaultKind::TransportError => "transport_error",
            FaultKind::DocumentError => "document_error",
            FaultKind::UnknownError => "unknown_error",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized failure value stored in the negative half of an arena.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Fault {
    pub kind: FaultKind,
    pub message: String,
}

impl Fault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn memory(message: impl Into<String>) -> Self {
        Self::new(FaultKind::MemoryFault, message)
    }

    pub fn cast(message: impl Into<String>) -> Self {
        Self::new(FaultKind::CastError, message)
    }

    pub fn missing(message: impl Into<String>) -> Self {
        Self::new(FaultKind::NullOrMissing, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FaultKind::TransportError, message)
    }

    pub fn document(message: impl Into<String>) -> Self {
        Self::new(FaultKind::DocumentError, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(FaultKind::UnknownError, message)
    }
}
