//! Domain records produced by modules.
//!
//! Bytecode guests assemble these through the `structs_*` builders; script
//! guests return plain objects that decode into the same shapes.

mod meta;
mod video;

pub use meta::{
    DiscoverListing, DiscoverListingKind, EpisodeServerRequest, EpisodeSourcesRequest, Playlist,
    PlaylistDetails, PlaylistGroup, PlaylistGroupVariant, PlaylistItem, PlaylistItemsRequest,
    PlaylistItemsResponse, PlaylistKind, PlaylistPreview, PlaylistPreviewKind, PlaylistStatus,
    SearchFilter, SearchFilterOption, SearchQuery, SearchQueryFilter,
};
pub use video::{
    EpisodeServer, EpisodeServerLink, EpisodeServerResponse, EpisodeServerSubtitle,
    EpisodeSource, LinkFormat, SkipTime, SkipTimeKind, SubtitleFormat,
};

use crate::codec::{DecodeContext, DecodeError, DynDecode, DynEncode, KeyStyle};
use crate::dyn_value::{DynObject, DynValue};

/// One page of items plus the tokens needed to fetch its neighbours.
#[derive(Clone, Debug, PartialEq)]
pub struct Paging<T> {
    pub id: String,
    pub previous_page: Option<String>,
    pub next_page: Option<String>,
    pub items: Vec<T>,
}

impl<T> Paging<T> {
    pub fn new(id: impl Into<String>, items: Vec<T>) -> Self {
        Self {
            id: id.into(),
            previous_page: None,
            next_page: None,
            items,
        }
    }

    /// Converts every item, stopping at the first one `f` rejects. Item
    /// order is kept.
    pub fn try_map_items<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Paging<U>, E> {
        let items = self.items.into_iter().map(f).collect::<Result<Vec<U>, E>>()?;
        Ok(Paging {
            id: self.id,
            previous_page: self.previous_page,
            next_page: self.next_page,
            items,
        })
    }
}

impl<T: DynEncode> DynEncode for Paging<T> {
    fn encode(&self, style: KeyStyle) -> DynValue {
        let mut object = DynObject::with_capacity(4);
        object.insert(style.key("id"), self.id.encode(style));
        object.insert(style.key("previous_page"), self.previous_page.encode(style));
        object.insert(style.key("next_page"), self.next_page.encode(style));
        object.insert(style.key("items"), self.items.encode(style));
        DynValue::Object(object)
    }
}

impl<T: DynDecode> DynDecode for Paging<T> {
    fn decode(value: &DynValue, cx: &mut DecodeContext) -> Result<Self, DecodeError> {
        let object = cx.expect_object(value)?;
        Ok(Self {
            id: cx.field(object, "id")?,
            previous_page: cx.field(object, "previous_page")?,
            next_page: cx.field(object, "next_page")?,
            items: cx.field(object, "items")?,
        })
    }
}

macro_rules! records {
    ($($variant:ident($ty:ty) => $label:literal),+ $(,)?) => {
        /// Any record a builder can place in the arena.
        #[derive(Clone, Debug, PartialEq)]
        pub enum Record {
            $($variant($ty)),+
        }

        impl Record {
            pub fn kind(&self) -> &'static str {
                match self {
                    $(Record::$variant(_) => $label),+
                }
            }
        }

        impl DynEncode for Record {
            fn encode(&self, style: KeyStyle) -> DynValue {
                match self {
                    $(Record::$variant(record) => record.encode(style)),+
                }
            }
        }

        $(
            impl From<$ty> for Record {
                fn from(record: $ty) -> Self {
                    Record::$variant(record)
                }
            }

            impl TryFrom<Record> for $ty {
                type Error = Record;

                fn try_from(record: Record) -> Result<Self, Record> {
                    match record {
                        Record::$variant(inner) => Ok(inner),
                        other => Err(other),
                    }
                }
            }
        )+
    };
}

records! {
    SearchFilterOption(SearchFilterOption) => "search_filter_option",
    SearchFilter(SearchFilter) => "search_filter",
    Paging(Paging<Record>) => "paging",
    DiscoverListing(DiscoverListing) => "discover_listing",
    Playlist(Playlist) => "playlist",
    PlaylistDetails(PlaylistDetails) => "playlist_details",
    PlaylistPreview(PlaylistPreview) => "playlist_preview",
    PlaylistItem(PlaylistItem) => "playlist_item",
    PlaylistGroup(PlaylistGroup) => "playlist_group",
    PlaylistGroupVariant(PlaylistGroupVariant) => "playlist_group_variant",
    PlaylistItemsResponse(PlaylistItemsResponse) => "playlist_items_response",
    EpisodeSource(EpisodeSource) => "episode_source",
    EpisodeServer(EpisodeServer) => "episode_server",
    EpisodeServerResponse(EpisodeServerResponse) => "episode_server_response",
    EpisodeServerLink(EpisodeServerLink) => "episode_server_link",
    EpisodeServerSubtitle(EpisodeServerSubtitle) => "episode_server_subtitle",
    SkipTime(SkipTime) => "skip_time",
}
