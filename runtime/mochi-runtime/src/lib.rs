//! Capabilities the Mochi host exposes to guest modules.
//!
//! Each namespace module holds plain functions over a [`HostArena`] and
//! already-decoded arguments. Backends decode guest arguments, call these
//! through the wrappers in [`translate`] and hand the resulting handle back.

pub mod crypto;
pub mod env;
mod error;
pub mod html;
pub mod http;
pub mod json;
pub mod structs;
pub mod translate;
mod value;

pub use error::HostError;
pub use html::HtmlSelection;
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use translate::{translate, translate_count, translate_scalar, translate_status};
pub use value::{HostArena, HostValue, kind};
