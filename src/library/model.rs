use std::path::PathBuf;
use std::time::Duration;

/// One playlist entry: an audio file plus the metadata shown for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub path: PathBuf,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<Duration>,
    pub display: String,
}
