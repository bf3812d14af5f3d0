use tracing::debug;

use crate::backend::{ModuleBackend, ModuleError};
use crate::codec::{DynDecode, DynEncode, decode};
use crate::dyn_value::DynValue;
use crate::records::{
    DiscoverListing, EpisodeServerRequest, EpisodeServerResponse, EpisodeSource,
    EpisodeSourcesRequest, Paging, Playlist, PlaylistDetails, PlaylistItemsRequest,
    PlaylistItemsResponse, SearchFilter, SearchQuery,
};

pub const ENTRY_SEARCH_FILTERS: &str = "search_filters";
pub const ENTRY_SEARCH: &str = "search";
pub const ENTRY_DISCOVER_LISTINGS: &str = "discover_listings";
pub const ENTRY_PLAYLIST_DETAILS: &str = "playlist_details";
pub const ENTRY_PLAYLIST_EVENTS: &str = "playlist_events";
pub const ENTRY_PLAYLIST_SOURCES: &str = "playlist_sources";
pub const ENTRY_PLAYLIST_SERVER: &str = "playlist_server";

/// Typed view over a backend's conventional entry points.
pub struct ModuleClient<B> {
    backend: B,
}

impl<B: ModuleBackend> ModuleClient<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_inner(self) -> B {
        self.backend
    }

    /// Invokes `entry` with already-encoded arguments and decodes the
    /// result under the backend's key style.
    pub fn invoke<T: DynDecode>(&mut self, entry: &str, args: &[DynValue]) -> Result<T, ModuleError> {
        let style = self.backend.key_style();
        debug!(module = self.backend.module_id(), entry, args = args.len(), "invoke");
        let value = self.backend.invoke_dyn(entry, args)?;
        Ok(decode(&value, style)?)
    }

    fn invoke_with<A: DynEncode, T: DynDecode>(&mut self, entry: &str, arg: &A) -> Result<T, ModuleError> {
        let arg = arg.encode(self.backend.key_style());
        self.invoke(entry, &[arg])
    }

    pub fn search_filters(&mut self) -> Result<Vec<SearchFilter>, ModuleError> {
        self.invoke(ENTRY_SEARCH_FILTERS, &[])
    }

    pub fn search(&mut self, query: &SearchQuery) -> Result<Paging<Playlist>, ModuleError> {
        self.invoke_with(ENTRY_SEARCH, query)
    }

    pub fn discover_listings(&mut self) -> Result<Vec<DiscoverListing>, ModuleError> {
        self.invoke(ENTRY_DISCOVER_LISTINGS, &[])
    }

    pub fn playlist_details(&mut self, playlist_id: &str) -> Result<PlaylistDetails, ModuleError> {
        self.invoke(ENTRY_PLAYLIST_DETAILS, &[DynValue::from(playlist_id)])
    }

    pub fn playlist_events(
        &mut self,
        request: &PlaylistItemsRequest,
    ) -> Result<PlaylistItemsResponse, ModuleError> {
        self.invoke_with(ENTRY_PLAYLIST_EVENTS, request)
    }

    pub fn playlist_sources(
        &mut self,
        request: &EpisodeSourcesRequest,
    ) -> Result<Vec<EpisodeSource>, ModuleError> {
        self.invoke_with(ENTRY_PLAYLIST_SOURCES, request)
    }

    pub fn playlist_server(
        &mut self,
        request: &EpisodeServerRequest,
    ) -> Result<EpisodeServerResponse, ModuleError> {
        self.invoke_with(ENTRY_PLAYLIST_SERVER, request)
    }
}
