use mochi_obj_model::Handle;
use mochi_runtime_core::records::{
    EpisodeServer, EpisodeServerLink, EpisodeServerResponse, EpisodeServerSubtitle, EpisodeSource,
    LinkFormat, SkipTime, SkipTimeKind, SubtitleFormat,
};

use super::{add, discriminant, or_empty, record_list, required_url, string_map};
use crate::error::HostError;
use crate::value::HostArena;

pub fn create_episode_source(
    arena: &HostArena,
    id: &str,
    display_name: &str,
    description: Option<&str>,
    servers: Handle,
) -> Result<Handle, HostError> {
    let servers = record_list::<EpisodeServer>(arena, servers, "episode_server")?;
    Ok(add(
        arena,
        EpisodeSource {
            id: id.to_string(),
            display_name: display_name.to_string(),
            description: description.map(str::to_owned),
            servers,
        },
    ))
}

pub fn create_episode_server(
    arena: &HostArena,
    id: &str,
    display_name: &str,
    description: Option<&str>,
) -> Handle {
    add(
        arena,
        EpisodeServer {
            id: id.to_string(),
            display_name: display_name.to_string(),
            description: description.map(str::to_owned),
        },
    )
}

/// `headers` is an object handle whose values are all strings. `links` is
/// required; `subtitles`, `skip_times` and `headers` are optional.
pub fn create_episode_server_response(
    arena: &HostArena,
    links: Handle,
    subtitles: Handle,
    skip_times: Handle,
    headers: Handle,
) -> Result<Handle, HostError> {
    let response = EpisodeServerResponse {
        links: record_list::<EpisodeServerLink>(arena, links, "episode_server_link")?,
        subtitles: or_empty(arena, subtitles, |list| {
            record_list::<EpisodeServerSubtitle>(arena, list, "episode_server_subtitle")
        })?,
        skip_times: or_empty(arena, skip_times, |list| {
            record_list::<SkipTime>(arena, list, "skip_time")
        })?,
        headers: or_empty(arena, headers, |map| string_map(arena, map))?,
    };
    Ok(add(arena, response))
}

pub fn create_episode_server_link(
    arena: &HostArena,
    url: &str,
    quality: i32,
    format: i32,
) -> Result<Handle, HostError> {
    let link = EpisodeServerLink {
        url: required_url("url", url)?,
        quality,
        format: discriminant::<LinkFormat>("format", format)?,
    };
    Ok(add(arena, link))
}

pub fn create_episode_server_subtitle(
    arena: &HostArena,
    url: &str,
    name: &str,
    format: i32,
    is_default: bool,
    autoselect: bool,
) -> Result<Handle, HostError> {
    let subtitle = EpisodeServerSubtitle {
        url: required_url("url", url)?,
        name: name.to_string(),
        format: discriminant::<SubtitleFormat>("format", format)?,
        is_default,
        autoselect,
    };
    Ok(add(arena, subtitle))
}

pub fn create_skip_time(
    arena: &HostArena,
    start_time: f64,
    end_time: f64,
    kind: i32,
) -> Result<Handle, HostError> {
    let skip = SkipTime {
        start_time,
        end_time,
        kind: discriminant::<SkipTimeKind>("kind", kind)?,
    };
    Ok(add(arena, skip))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env;
    use crate::structs::record;
    use crate::value::HostValue;
    use mochi_obj_model::FaultKind;

    fn array_of(arena: &HostArena, handles: &[Handle]) -> Handle {
        let array = env::create(arena, HostValue::Array(Vec::new()));
        for handle in handles {
            env::array_append(arena, array, *handle).unwrap();
        }
        array
    }

    #[test]
    fn server_response_assembles() {
        let arena = HostArena::new();
        let link = create_episode_server_link(&arena, "https://cdn.example/a.m3u8", 1080, 0).unwrap();
        let subtitle =
            create_episode_server_subtitle(&arena, "https://cdn.example/en.vtt", "English", 0, true, true)
                .unwrap();
        let intro = create_skip_time(&arena, 0.0, 90.0, 0).unwrap();
        let outro = create_skip_time(&arena, 1320.0, 1410.0, 1).unwrap();
        let headers = env::create(&arena, HostValue::Object(Vec::new()));
        let referer = env::create(&arena, HostValue::String("https://example.org".into()));
        env::object_set(&arena, headers, "Referer", referer).unwrap();

        let links = array_of(&arena, &[link]);
        let subtitles = array_of(&arena, &[subtitle]);
        let skips = array_of(&arena, &[intro, outro]);
        let response = create_episode_server_response(&arena, links, subtitles, skips, headers).unwrap();
        let response: EpisodeServerResponse = record(&arena, response, "episode_server_response").unwrap();
        assert_eq!(response.links[0].quality, 1080);
        assert_eq!(response.links[0].format, LinkFormat::Hls);
        assert_eq!(response.skip_times[1].kind, SkipTimeKind::Ending);
        assert_eq!(response.headers["Referer"], "https://example.org");
    }

    #[test]
    fn server_response_needs_only_links() {
        let arena = HostArena::new();
        let link = create_episode_server_link(&arena, "https://cdn.example/a.mp4", 720, 2).unwrap();
        let links = array_of(&arena, &[link]);
        let none = Handle::from_raw(-1);
        let null = env::create(&arena, HostValue::Null);
        let response = create_episode_server_response(&arena, links, none, null, none).unwrap();
        let response: EpisodeServerResponse = record(&arena, response, "episode_server_response").unwrap();
        assert_eq!(response.links.len(), 1);
        assert!(response.subtitles.is_empty());
        assert!(response.skip_times.is_empty());
        assert!(response.headers.is_empty());

        let failed = arena.add_fault(mochi_obj_model::Fault::transport("E1"));
        assert_eq!(
            create_episode_server_response(&arena, failed, none, none, none)
                .unwrap_err()
                .kind(),
            FaultKind::CastError
        );
    }

    #[test]
    fn source_lists_servers() {
        let arena = HostArena::new();
        let s1 = create_episode_server(&arena, "s1", "Server 1", None);
        let s2 = create_episode_server(&arena, "s2", "Server 2", Some("backup"));
        let servers = array_of(&arena, &[s1, s2]);
        let source = create_episode_source(&arena, "main", "Main", None, servers).unwrap();
        let source: EpisodeSource = record(&arena, source, "episode_source").unwrap();
        assert_eq!(source.servers[1].description.as_deref(), Some("backup"));
    }

    #[test]
    fn bad_inputs_fault() {
        let arena = HostArena::new();
        assert_eq!(
            create_episode_server_link(&arena, "https://cdn.example/a.mp4", 720, 3).unwrap_err().kind(),
            FaultKind::CastError
        );
        assert_eq!(create_skip_time(&arena, 0.0, 1.0, 4).unwrap_err().kind(), FaultKind::CastError);
        let server = create_episode_server(&arena, "s", "S", None);
        let not_links = array_of(&arena, &[server]);
        let empty = array_of(&arena, &[]);
        let headers = env::create(&arena, HostValue::Object(Vec::new()));
        assert_eq!(
            create_episode_server_response(&arena, not_links, empty, empty, headers)
                .unwrap_err()
                .kind(),
            FaultKind::CastError
        );
        let number = env::create(&arena, HostValue::Int(1));
        env::object_set(&arena, headers, "X", number).unwrap();
        assert!(create_episode_server_response(&arena, empty, empty, empty, headers).is_err());
    }
}
