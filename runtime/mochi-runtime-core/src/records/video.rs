use std::collections::BTreeMap;

use url::Url;

use crate::{dyn_enum, dyn_record};

#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeServer {
    pub id: String,
    pub display_name: String,
    pub description: Option<String>,
}

dyn_record!(EpisodeServer {
    id,
    display_name,
    description,
});

#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeSource {
    pub id: String,
    pub display_name: String,
    pub description: Option<String>,
    pub servers: Vec<EpisodeServer>,
}

dyn_record!(EpisodeSource {
    id,
    display_name,
    description,
    servers,
});

dyn_enum! {
    pub enum LinkFormat {
        Hls = 0 => "hls",
        Dash = 1 => "dash",
        Mp4 = 2 => "mp4",
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeServerLink {
    pub url: Url,
    /// Vertical resolution, e.g. `1080`.
    pub quality: i32,
    pub format: LinkFormat,
}

dyn_record!(EpisodeServerLink {
    url,
    quality,
    format,
});

dyn_enum! {
    pub enum SubtitleFormat {
        Vtt = 0 => "vtt",
        Srt = 1 => "srt",
        Ass = 2 => "ass",
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeServerSubtitle {
    pub url: Url,
    pub name: String,
    pub format: SubtitleFormat,
    pub is_default: bool,
    pub autoselect: bool,
}

dyn_record!(EpisodeServerSubtitle {
    url,
    name,
    format,
    is_default,
    autoselect,
});

dyn_enum! {
    pub enum SkipTimeKind {
        Opening = 0 => "opening",
        Ending = 1 => "ending",
        Recap = 2 => "recap",
        Preview = 3 => "preview",
    }
}

/// A skippable segment, in seconds from the start of the episode.
#[derive(Clone, Debug, PartialEq)]
pub struct SkipTime {
    pub start_time: f64,
    pub end_time: f64,
    pub kind: SkipTimeKind,
}

dyn_record!(SkipTime {
    start_time,
    end_time,
    kind,
});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EpisodeServerResponse {
    pub links: Vec<EpisodeServerLink>,
    pub subtitles: Vec<EpisodeServerSubtitle>,
    pub skip_times: Vec<SkipTime>,
    pub headers: BTreeMap<String, String>,
}

dyn_record!(EpisodeServerResponse {
    links,
    subtitles,
    skip_times,
    headers,
});
