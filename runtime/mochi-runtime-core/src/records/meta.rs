use chrono::{DateTime, Utc};
use url::Url;

use super::Paging;
use crate::{dyn_enum, dyn_record};

#[derive(Clone, Debug, PartialEq)]
pub struct SearchFilterOption {
    pub id: String,
    pub display_name: String,
}

dyn_record!(SearchFilterOption { id, display_name });

#[derive(Clone, Debug, PartialEq)]
pub struct SearchFilter {
    pub id: String,
    pub display_name: String,
    pub options: Vec<SearchFilterOption>,
    pub multiselect: bool,
    pub required: bool,
}

dyn_record!(SearchFilter {
    id,
    display_name,
    options,
    multiselect,
    required,
});

/// Options the user picked for one filter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchQueryFilter {
    pub id: String,
    pub option_ids: Vec<String>,
}

dyn_record!(SearchQueryFilter { id, option_ids });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub page: Option<String>,
    pub filters: Vec<SearchQueryFilter>,
}

dyn_record!(SearchQuery {
    query,
    page,
    filters,
});

dyn_enum! {
    pub enum DiscoverListingKind {
        Default = 0 => "default",
        Rank = 1 => "rank",
        Featured = 2 => "featured",
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DiscoverListing {
    pub title: String,
    pub kind: DiscoverListingKind,
    pub paging: Paging<Playlist>,
}

dyn_record!(DiscoverListing { title, kind, paging });

dyn_enum! {
    pub enum PlaylistStatus {
        Unknown = 0 => "unknown",
        Upcoming = 1 => "upcoming",
        Ongoing = 2 => "ongoing",
        Completed = 3 => "completed",
        Paused = 4 => "paused",
        Cancelled = 5 => "cancelled",
    }
}

dyn_enum! {
    pub enum PlaylistKind {
        Video = 0 => "video",
        Image = 1 => "image",
        Text = 2 => "text",
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Playlist {
    pub id: String,
    pub title: Option<String>,
    pub poster_image: Option<Url>,
    pub banner_image: Option<Url>,
    pub url: Url,
    pub status: PlaylistStatus,
    pub kind: PlaylistKind,
}

dyn_record!(Playlist {
    id,
    title,
    poster_image,
    banner_image,
    url,
    status,
    kind,
});

dyn_enum! {
    pub enum PlaylistPreviewKind {
        Video = 0 => "video",
        Image = 1 => "image",
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlaylistPreview {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<Url>,
    pub link: Url,
    pub kind: PlaylistPreviewKind,
}

dyn_record!(PlaylistPreview {
    title,
    description,
    thumbnail,
    link,
    kind,
});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaylistDetails {
    pub synopsis: Option<String>,
    pub alt_titles: Vec<String>,
    pub alt_posters: Vec<Url>,
    pub alt_banners: Vec<Url>,
    pub genres: Vec<String>,
    pub year_released: Option<i32>,
    pub ratings: Option<i32>,
    pub previews: Vec<PlaylistPreview>,
}

dyn_record!(PlaylistDetails {
    synopsis,
    alt_titles,
    alt_posters,
    alt_banners,
    genres,
    year_released,
    ratings,
    previews,
});

#[derive(Clone, Debug, PartialEq)]
pub struct PlaylistItem {
    pub id: String,
    pub url: Option<Url>,
    pub number: f64,
    pub timestamp: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<Url>,
    pub tags: Vec<String>,
}

dyn_record!(PlaylistItem {
    id,
    url,
    number,
    timestamp,
    title,
    description,
    thumbnail,
    tags,
});

/// A named variant of a group (e.g. sub or dub), paginated.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaylistGroupVariant {
    pub id: String,
    pub title: String,
    pub pagings: Vec<Paging<PlaylistItem>>,
}

dyn_record!(PlaylistGroupVariant { id, title, pagings });

#[derive(Clone, Debug, PartialEq)]
pub struct PlaylistGroup {
    pub id: String,
    pub number: f64,
    pub alt_title: Option<String>,
    pub variants: Vec<PlaylistGroupVariant>,
}

dyn_record!(PlaylistGroup {
    id,
    number,
    alt_title,
    variants,
});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaylistItemsResponse {
    pub groups: Vec<PlaylistGroup>,
    pub selected_group_id: Option<String>,
    pub selected_variant_id: Option<String>,
}

dyn_record!(PlaylistItemsResponse {
    groups,
    selected_group_id,
    selected_variant_id,
});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaylistItemsRequest {
    pub playlist_id: String,
    pub group_id: Option<String>,
    pub variant_id: Option<String>,
    pub page_id: Option<String>,
}

dyn_record!(PlaylistItemsRequest {
    playlist_id,
    group_id,
    variant_id,
    page_id,
});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EpisodeSourcesRequest {
    pub playlist_id: String,
    pub episode_id: String,
}

dyn_record!(EpisodeSourcesRequest {
    playlist_id,
    episode_id,
});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EpisodeServerRequest {
    pub playlist_id: String,
    pub episode_id: String,
    pub source_id: String,
    pub server_id: String,
}

dyn_record!(EpisodeServerRequest {
    playlist_id,
    episode_id,
    source_id,
    server_id,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{KeyStyle, decode, encode};
    use crate::dyn_value::DynValue;
    use chrono::TimeZone;

    #[test]
    fn details_default_collections_when_absent() {
        let value = DynValue::from_json(serde_json::json!({"synopsis": "A quiet story."}));
        let details: PlaylistDetails = decode(&value, KeyStyle::CamelCase).unwrap();
        assert_eq!(details.synopsis.as_deref(), Some("A quiet story."));
        assert!(details.genres.is_empty());
        assert_eq!(details.year_released, None);
    }

    #[test]
    fn item_tree_round_trips() {
        let item = PlaylistItem {
            id: "ep-1".to_string(),
            url: Some(Url::parse("https://example.org/ep/1").unwrap()),
            number: 1.0,
            timestamp: Some(Utc.with_ymd_and_hms(2023, 9, 29, 0, 0, 0).unwrap()),
            title: Some("The Journey's End".to_string()),
            description: None,
            thumbnail: None,
            tags: vec!["filler".to_string()],
        };
        let response = PlaylistItemsResponse {
            groups: vec![PlaylistGroup {
                id: "season-1".to_string(),
                number: 1.0,
                alt_title: None,
                variants: vec![PlaylistGroupVariant {
                    id: "sub".to_string(),
                    title: "Subbed".to_string(),
                    pagings: vec![Paging::new("page-1", vec![item])],
                }],
            }],
            selected_group_id: Some("season-1".to_string()),
            selected_variant_id: None,
        };
        for style in [KeyStyle::CamelCase, KeyStyle::SnakeCase] {
            let decoded: PlaylistItemsResponse = decode(&encode(&response, style), style).unwrap();
            assert_eq!(decoded, response);
        }
    }

    #[test]
    fn playlist_requires_url() {
        let value = DynValue::from_json(serde_json::json!({
            "id": "frieren",
            "status": "ongoing",
            "kind": "video",
        }));
        let err = decode::<Playlist>(&value, KeyStyle::CamelCase).unwrap_err();
        assert_eq!(err.path, "url");
    }

    #[test]
    fn playlist_status_codes_are_stable() {
        assert_eq!(PlaylistStatus::Cancelled.code(), 5);
        assert_eq!(PlaylistStatus::try_from(2), Ok(PlaylistStatus::Ongoing));
        assert_eq!(PlaylistStatus::try_from(6), Err(6));
        assert_eq!(DiscoverListingKind::from_label("rank"), Some(DiscoverListingKind::Rank));
    }
}
