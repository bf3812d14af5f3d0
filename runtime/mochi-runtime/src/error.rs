use mochi_obj_model::{Fault, FaultKind};
use mochi_runtime_core::DecodeError;

/// Failure of one capability call, before it is stored as a fault.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error(transparent)]
    Fault(#[from] Fault),
    #[error("http transfer failed: {0}")]
    Http(#[from] ureq::Error),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("malformed url: {0}")]
    Url(#[from] url::ParseError),
    #[error("bytes are not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("{0}")]
    Decode(#[from] DecodeError),
    #[error("invalid css selector `{0}`")]
    Selector(String),
    #[error("cipher input has invalid padding")]
    Padding,
}

impl HostError {
    pub fn kind(&self) -> FaultKind {
        match self {
            HostError::Fault(fault) => fault.kind,
            HostError::Http(_) => FaultKind::TransportError,
            HostError::Json(_) | HostError::Url(_) | HostError::Selector(_) => {
                FaultKind::DocumentError
            }
            HostError::Base64(_)
            | HostError::Utf8(_)
            | HostError::Decode(_)
            | HostError::Padding => FaultKind::CastError,
        }
    }

    pub fn into_fault(self) -> Fault {
        match self {
            HostError::Fault(fault) => fault,
            other => Fault::new(other.kind(), other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    #[test]
    fn foreign_errors_map_to_fault_kinds() {
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(HostError::from(json).kind(), FaultKind::DocumentError);

        let b64 = base64::engine::general_purpose::STANDARD.decode("@@").unwrap_err();
        assert_eq!(HostError::from(b64).into_fault().kind, FaultKind::CastError);

        let fault = Fault::memory("span out of range");
        assert_eq!(HostError::from(fault.clone()).into_fault(), fault);
    }
}
