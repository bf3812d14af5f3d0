use mochi_obj_model::{Fault, Handle};
use mochi_runtime_core::records::{
    DiscoverListing, DiscoverListingKind, Playlist, PlaylistDetails, PlaylistGroup,
    PlaylistGroupVariant, PlaylistItem, PlaylistItemsResponse, PlaylistKind, PlaylistPreview,
    PlaylistPreviewKind, PlaylistStatus, SearchFilter, SearchFilterOption,
};
use mochi_runtime_core::{Paging, Record};

use super::{
    add, any_records, discriminant, optional_timestamp, optional_url, or_empty, record, record_list,
    required_url, string_list, url_list,
};
use crate::error::HostError;
use crate::value::HostArena;

fn narrow<T>(record: Record, expected: &str) -> Result<T, Fault>
where
    T: TryFrom<Record, Error = Record>,
{
    T::try_from(record)
        .map_err(|other| Fault::cast(format!("paging item: expected {expected}, found {}", other.kind())))
}

pub fn create_search_filter_option(arena: &HostArena, id: &str, display_name: &str) -> Handle {
    add(
        arena,
        SearchFilterOption {
            id: id.to_string(),
            display_name: display_name.to_string(),
        },
    )
}

pub fn create_search_filter(
    arena: &HostArena,
    id: &str,
    display_name: &str,
    options: Handle,
    multiselect: bool,
    required: bool,
) -> Result<Handle, HostError> {
    let options = record_list::<SearchFilterOption>(arena, options, "search_filter_option")?;
    Ok(add(
        arena,
        SearchFilter {
            id: id.to_string(),
            display_name: display_name.to_string(),
            options,
            multiselect,
            required,
        },
    ))
}

/// Generic page; item kinds are checked by whichever record consumes it.
pub fn create_paging(
    arena: &HostArena,
    id: &str,
    previous_page: Option<&str>,
    next_page: Option<&str>,
    items: Handle,
) -> Result<Handle, HostError> {
    let items = any_records(arena, items)?;
    Ok(add(
        arena,
        Paging {
            id: id.to_string(),
            previous_page: previous_page.map(str::to_owned),
            next_page: next_page.map(str::to_owned),
            items,
        },
    ))
}

pub fn create_discover_listing(
    arena: &HostArena,
    title: &str,
    kind: i32,
    paging: Handle,
) -> Result<Handle, HostError> {
    let kind: DiscoverListingKind = discriminant("kind", kind)?;
    let paging = record::<Paging<Record>>(arena, paging, "paging")?
        .try_map_items(|item| narrow::<Playlist>(item, "playlist"))?;
    Ok(add(
        arena,
        DiscoverListing {
            title: title.to_string(),
            kind,
            paging,
        },
    ))
}

#[allow(clippy::too_many_arguments)]
pub fn create_playlist(
    arena: &HostArena,
    id: &str,
    title: Option<&str>,
    poster_image: Option<&str>,
    banner_image: Option<&str>,
    url: &str,
    status: i32,
    kind: i32,
) -> Result<Handle, HostError> {
    let playlist = Playlist {
        id: id.to_string(),
        title: title.map(str::to_owned),
        poster_image: optional_url("poster_image", poster_image)?,
        banner_image: optional_url("banner_image", banner_image)?,
        url: required_url("url", url)?,
        status: discriminant::<PlaylistStatus>("status", status)?,
        kind: discriminant::<PlaylistKind>("kind", kind)?,
    };
    Ok(add(arena, playlist))
}

/// `year_released <= 0` and `ratings < 0` mean unknown. Every list handle
/// is optional.
#[allow(clippy::too_many_arguments)]
pub fn create_playlist_details(
    arena: &HostArena,
    synopsis: Option<&str>,
    alt_titles: Handle,
    alt_posters: Handle,
    alt_banners: Handle,
    genres: Handle,
    year_released: i32,
    ratings: i32,
    previews: Handle,
) -> Result<Handle, HostError> {
    let details = PlaylistDetails {
        synopsis: synopsis.map(str::to_owned),
        alt_titles: or_empty(arena, alt_titles, |list| string_list(arena, list))?,
        alt_posters: or_empty(arena, alt_posters, |list| url_list(arena, list, "alt_posters"))?,
        alt_banners: or_empty(arena, alt_banners, |list| url_list(arena, list, "alt_banners"))?,
        genres: or_empty(arena, genres, |list| string_list(arena, list))?,
        year_released: (year_released > 0).then_some(year_released),
        ratings: (ratings >= 0).then_some(ratings),
        previews: or_empty(arena, previews, |list| {
            record_list::<PlaylistPreview>(arena, list, "playlist_preview")
        })?,
    };
    Ok(add(arena, details))
}

pub fn create_playlist_preview(
    arena: &HostArena,
    title: Option<&str>,
    description: Option<&str>,
    thumbnail: Option<&str>,
    link: &str,
    kind: i32,
) -> Result<Handle, HostError> {
    let preview = PlaylistPreview {
        title: title.map(str::to_owned),
        description: description.map(str::to_owned),
        thumbnail: optional_url("thumbnail", thumbnail)?,
        link: required_url("link", link)?,
        kind: discriminant::<PlaylistPreviewKind>("kind", kind)?,
    };
    Ok(add(arena, preview))
}

/// `tags` is optional.
#[allow(clippy::too_many_arguments)]
pub fn create_playlist_item(
    arena: &HostArena,
    id: &str,
    url: Option<&str>,
    number: f64,
    timestamp: Option<&str>,
    title: Option<&str>,
    description: Option<&str>,
    thumbnail: Option<&str>,
    tags: Handle,
) -> Result<Handle, HostError> {
    let item = PlaylistItem {
        id: id.to_string(),
        url: optional_url("url", url)?,
        number,
        timestamp: optional_timestamp("timestamp", timestamp)?,
        title: title.map(str::to_owned),
        description: description.map(str::to_owned),
        thumbnail: optional_url("thumbnail", thumbnail)?,
        tags: or_empty(arena, tags, |list| string_list(arena, list))?,
    };
    Ok(add(arena, item))
}

/// A page of playlist items inside a group variant.
pub fn create_playlist_group_page(
    arena: &HostArena,
    id: &str,
    previous_page: Option<&str>,
    next_page: Option<&str>,
    items: Handle,
) -> Result<Handle, HostError> {
    let items = record_list::<PlaylistItem>(arena, items, "playlist_item")?
        .into_iter()
        .map(Record::from)
        .collect();
    Ok(add(
        arena,
        Paging {
            id: id.to_string(),
            previous_page: previous_page.map(str::to_owned),
            next_page: next_page.map(str::to_owned),
            items,
        },
    ))
}

pub fn create_playlist_group_variant(
    arena: &HostArena,
    id: &str,
    title: &str,
    pagings: Handle,
) -> Result<Handle, HostError> {
    let pagings = record_list::<Paging<Record>>(arena, pagings, "paging")?
        .into_iter()
        .map(|paging| paging.try_map_items(|item| narrow::<PlaylistItem>(item, "playlist_item")))
        .collect::<Result<Vec<_>, Fault>>()?;
    Ok(add(
        arena,
        PlaylistGroupVariant {
            id: id.to_string(),
            title: title.to_string(),
            pagings,
        },
    ))
}

pub fn create_playlist_group(
    arena: &HostArena,
    id: &str,
    number: f64,
    alt_title: Option<&str>,
    variants: Handle,
) -> Result<Handle, HostError> {
    let variants = record_list::<PlaylistGroupVariant>(arena, variants, "playlist_group_variant")?;
    Ok(add(
        arena,
        PlaylistGroup {
            id: id.to_string(),
            number,
            alt_title: alt_title.map(str::to_owned),
            variants,
        },
    ))
}

pub fn create_playlist_items_response(
    arena: &HostArena,
    groups: Handle,
    selected_group_id: Option<&str>,
    selected_variant_id: Option<&str>,
) -> Result<Handle, HostError> {
    let groups = record_list::<PlaylistGroup>(arena, groups, "playlist_group")?;
    Ok(add(
        arena,
        PlaylistItemsResponse {
            groups,
            selected_group_id: selected_group_id.map(str::to_owned),
            selected_variant_id: selected_variant_id.map(str::to_owned),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env;
    use crate::value::HostValue;
    use mochi_obj_model::FaultKind;

    fn array_of(arena: &HostArena, handles: &[Handle]) -> Handle {
        let array = env::create(arena, HostValue::Array(Vec::new()));
        for handle in handles {
            env::array_append(arena, array, *handle).unwrap();
        }
        array
    }

    fn playlist(arena: &HostArena, id: &str) -> Handle {
        create_playlist(
            arena,
            id,
            Some(id),
            None,
            None,
            &format!("https://example.org/{id}"),
            PlaylistStatus::Ongoing.code(),
            PlaylistKind::Video.code(),
        )
        .unwrap()
    }

    fn built<T: TryFrom<Record, Error = Record>>(arena: &HostArena, handle: Handle) -> T {
        record::<T>(arena, handle, "test").unwrap()
    }

    #[test]
    fn discover_listing_keeps_paging_order() {
        let arena = HostArena::new();
        let a = playlist(&arena, "a");
        let b = playlist(&arena, "b");
        let items = array_of(&arena, &[a, b]);
        let paging = create_paging(&arena, "p1", None, Some("p2"), items).unwrap();
        let before = arena.live_len();
        let listing = create_discover_listing(&arena, "T", DiscoverListingKind::Rank.code(), paging).unwrap();
        assert_eq!(arena.live_len(), before + 1);

        let listing: DiscoverListing = built(&arena, listing);
        assert_eq!(listing.title, "T");
        assert_eq!(listing.paging.id, "p1");
        let ids: Vec<&str> = listing.paging.items.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn fault_handle_as_required_child_is_a_cast_error() {
        let arena = HostArena::new();
        let first = arena.add_fault(Fault::transport("E1"));
        let second = arena.add_fault(Fault::document("E2"));
        assert_eq!((first.raw(), second.raw()), (-1, -2));
        let err = create_discover_listing(&arena, "T", 0, first).unwrap_err();
        assert_eq!(err.kind(), FaultKind::CastError);
    }

    #[test]
    fn wrong_kind_children_are_rejected() {
        let arena = HostArena::new();
        let option = create_search_filter_option(&arena, "o", "O");
        let items = array_of(&arena, &[option]);
        let paging = create_paging(&arena, "p", None, None, items).unwrap();
        assert_eq!(
            create_discover_listing(&arena, "T", 0, paging).unwrap_err().kind(),
            FaultKind::CastError
        );
        assert_eq!(
            create_discover_listing(&arena, "T", 0, option).unwrap_err().kind(),
            FaultKind::CastError
        );
        let text = env::create(&arena, HostValue::String("not a record".into()));
        let mixed = array_of(&arena, &[text]);
        assert_eq!(
            create_paging(&arena, "p", None, None, mixed).unwrap_err().kind(),
            FaultKind::CastError
        );
    }

    #[test]
    fn enum_codes_out_of_range_are_cast_errors() {
        let arena = HostArena::new();
        let err = create_playlist(&arena, "x", None, None, None, "https://x.example", 6, 0).unwrap_err();
        assert_eq!(err.kind(), FaultKind::CastError);
        let empty = array_of(&arena, &[]);
        let paging = create_paging(&arena, "p", None, None, empty).unwrap();
        assert!(create_discover_listing(&arena, "T", -1, paging).is_err());
    }

    #[test]
    fn optional_fields_degrade_but_malformed_values_fault() {
        let arena = HostArena::new();
        let tags = array_of(&arena, &[]);
        let item = create_playlist_item(&arena, "e1", None, 1.0, None, None, None, None, tags).unwrap();
        let item: PlaylistItem = built(&arena, item);
        assert_eq!(item.timestamp, None);
        assert!(item.tags.is_empty());

        let err = create_playlist_item(&arena, "e1", None, 1.0, Some("yesterday"), None, None, None, tags)
            .unwrap_err();
        assert_eq!(err.kind(), FaultKind::CastError);
        assert!(create_playlist(&arena, "x", None, Some("::"), None, "https://x.example", 0, 0).is_err());
    }

    #[test]
    fn absent_optional_lists_degrade_to_empty() {
        let arena = HostArena::new();
        let missing = arena.add_fault(Fault::missing("no tags"));
        let item = create_playlist_item(&arena, "e1", None, 1.0, None, None, None, None, missing).unwrap();
        let item: PlaylistItem = built(&arena, item);
        assert!(item.tags.is_empty());

        let null = env::create(&arena, HostValue::Null);
        let none = Handle::from_raw(-1);
        let details =
            create_playlist_details(&arena, None, none, null, none, null, 0, 0, none).unwrap();
        let details: PlaylistDetails = built(&arena, details);
        assert!(details.alt_titles.is_empty());
        assert!(details.alt_posters.is_empty());
        assert!(details.genres.is_empty());
        assert!(details.previews.is_empty());
        assert_eq!(details.year_released, None);
        assert_eq!(details.ratings, Some(0));
    }

    #[test]
    fn present_optional_lists_are_still_checked() {
        let arena = HostArena::new();
        let number = env::create(&arena, HostValue::Int(3));
        let err = create_playlist_item(&arena, "e1", None, 1.0, None, None, None, None, number).unwrap_err();
        assert_eq!(err.kind(), FaultKind::CastError);
        let wrong = array_of(&arena, &[number]);
        let none = Handle::from_raw(-1);
        let err = create_playlist_details(&arena, None, wrong, none, none, none, 0, 0, none).unwrap_err();
        assert_eq!(err.kind(), FaultKind::CastError);
        let dangling = Handle::from_raw(99);
        let err = create_playlist_item(&arena, "e1", None, 1.0, None, None, None, None, dangling).unwrap_err();
        assert_eq!(err.kind(), FaultKind::NullOrMissing);
    }

    #[test]
    fn group_tree_assembles_in_order() {
        let arena = HostArena::new();
        let tags = array_of(&arena, &[]);
        let episodes: Vec<Handle> = (1..=3)
            .map(|n| {
                create_playlist_item(
                    &arena,
                    &format!("ep-{n}"),
                    None,
                    f64::from(n),
                    Some("2024-01-05T00:00:00Z"),
                    None,
                    None,
                    None,
                    tags,
                )
                .unwrap()
            })
            .collect();
        let items = array_of(&arena, &episodes);
        let page = create_playlist_group_page(&arena, "page-1", None, None, items).unwrap();
        let pages = array_of(&arena, &[page]);
        let variant = create_playlist_group_variant(&arena, "sub", "Subbed", pages).unwrap();
        let variants = array_of(&arena, &[variant]);
        let group = create_playlist_group(&arena, "s1", 1.0, Some("Season 1"), variants).unwrap();
        let groups = array_of(&arena, &[group]);
        let response = create_playlist_items_response(&arena, groups, Some("s1"), Some("sub")).unwrap();

        let response: PlaylistItemsResponse = built(&arena, response);
        let page = &response.groups[0].variants[0].pagings[0];
        let numbers: Vec<f64> = page.items.iter().map(|item| item.number).collect();
        assert_eq!(numbers, [1.0, 2.0, 3.0]);
        assert_eq!(response.selected_variant_id.as_deref(), Some("sub"));
    }

    #[test]
    fn group_variant_rejects_pages_of_other_records() {
        let arena = HostArena::new();
        let a = playlist(&arena, "a");
        let items = array_of(&arena, &[a]);
        let paging = create_paging(&arena, "p", None, None, items).unwrap();
        let pages = array_of(&arena, &[paging]);
        assert_eq!(
            create_playlist_group_variant(&arena, "v", "V", pages).unwrap_err().kind(),
            FaultKind::CastError
        );
    }

    #[test]
    fn details_collect_lists() {
        let arena = HostArena::new();
        let title = env::create(&arena, HostValue::String("Sousou no Frieren".into()));
        let titles = array_of(&arena, &[title]);
        let poster = env::create(&arena, HostValue::String("https://img.example/p.png".into()));
        let posters = array_of(&arena, &[poster]);
        let empty = array_of(&arena, &[]);
        let preview =
            create_playlist_preview(&arena, Some("PV"), None, None, "https://video.example/pv", 0).unwrap();
        let previews = array_of(&arena, &[preview]);
        let details = create_playlist_details(
            &arena,
            Some("An elf mage..."),
            titles,
            posters,
            empty,
            empty,
            2023,
            -1,
            previews,
        )
        .unwrap();
        let details: PlaylistDetails = built(&arena, details);
        assert_eq!(details.alt_titles, ["Sousou no Frieren"]);
        assert_eq!(details.alt_posters[0].as_str(), "https://img.example/p.png");
        assert_eq!(details.year_released, Some(2023));
        assert_eq!(details.ratings, None);
        assert_eq!(details.previews[0].kind, PlaylistPreviewKind::Video);
    }

    #[test]
    fn search_filter_collects_options() {
        let arena = HostArena::new();
        let a = create_search_filter_option(&arena, "action", "Action");
        let b = create_search_filter_option(&arena, "drama", "Drama");
        let options = array_of(&arena, &[a, b]);
        let filter = create_search_filter(&arena, "genre", "Genre", options, true, false).unwrap();
        let filter: SearchFilter = built(&arena, filter);
        assert_eq!(filter.options.len(), 2);
        assert_eq!(filter.options[1].id, "drama");
        assert!(filter.multiselect);
    }
}
