//! Tag reading. `LoftyReader` is the production reader; the controller only
//! sees the `TagReader` trait.

use std::path::Path;
use std::time::Duration;

use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};

use crate::config::LibrarySettings;
use crate::error::PlayerError;

use super::display::{display_from_fields, fallback_tags};
use super::model::Track;

/// Metadata extracted from a file. Empty strings are normalised to `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<Duration>,
}

pub trait TagReader {
    fn read(&self, path: &Path) -> Result<TrackTags, PlayerError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyReader;

impl TagReader for LoftyReader {
    fn read(&self, path: &Path) -> Result<TrackTags, PlayerError> {
        let tagged =
            lofty::read_from_path(path).map_err(|e| PlayerError::metadata(path, e.to_string()))?;

        let mut tags = TrackTags {
            duration: Some(tagged.properties().duration()).filter(|d| !d.is_zero()),
            ..TrackTags::default()
        };

        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            tags.title = non_empty(tag.title().as_deref());
            tags.artist = non_empty(tag.artist().as_deref());
            tags.album = non_empty(tag.album().as_deref());
        }

        Ok(tags)
    }
}

fn non_empty(v: Option<&str>) -> Option<String> {
    v.map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("unknown"))
        .map(str::to_string)
}

/// Build a `Track` for `path`, filling gaps from the file name.
///
/// A tag read failure is returned alongside the track rather than instead of
/// it; callers decide whether to surface it.
pub fn build_track(
    path: &Path,
    reader: &dyn TagReader,
    settings: &LibrarySettings,
) -> (Track, Option<PlayerError>) {
    let (tags, warning) = match reader.read(path) {
        Ok(tags) => (tags, None),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "falling back to file name");
            (TrackTags::default(), Some(e))
        }
    };

    // The file name only fills in the artist when it also supplied the title.
    let (title, artist) = match tags.title {
        Some(title) => (title, tags.artist),
        None => {
            let (title, artist) = fallback_tags(path);
            (title, tags.artist.or(artist))
        }
    };

    let display = display_from_fields(
        path,
        &title,
        artist.as_deref(),
        tags.album.as_deref(),
        &settings.display_fields,
        &settings.display_separator,
    );

    let track = Track {
        path: path.to_path_buf(),
        title,
        artist,
        album: tags.album,
        duration: tags.duration,
        display,
    };
    (track, warning)
}
