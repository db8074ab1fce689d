//! Error taxonomy for playlist and playback operations.
//!
//! Every variant is recoverable: the controller turns them into notices shown
//! to the user and keeps running.

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// Extension not in the configured list of audio formats.
    #[error("unsupported format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// The file or folder does not exist (or was moved since it was added).
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The engine could not open or decode the file.
    #[error("could not play {}: {reason}", path.display())]
    LoadFailure { path: PathBuf, reason: String },

    /// Tags could not be read; the track falls back to its file name.
    #[error("could not read tags from {}: {reason}", path.display())]
    MetadataRead { path: PathBuf, reason: String },

    #[error("playlist name cannot be empty")]
    EmptyPlaylistName,

    #[error("a playlist named '{0}' already exists")]
    PlaylistExists(String),

    /// `All` and `Favourite` are built in and cannot be created, deleted or
    /// edited by name.
    #[error("'{0}' is a built-in view")]
    ReservedPlaylist(String),

    #[error("no playlist named '{0}'")]
    NoSuchPlaylist(String),
}

impl PlayerError {
    pub fn unsupported(path: &Path) -> Self {
        Self::UnsupportedFormat {
            path: path.to_path_buf(),
        }
    }

    pub fn not_found(path: &Path) -> Self {
        Self::FileNotFound {
            path: path.to_path_buf(),
        }
    }

    pub fn load_failure(path: &Path, reason: impl Into<String>) -> Self {
        Self::LoadFailure {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn metadata(path: &Path, reason: impl Into<String>) -> Self {
        Self::MetadataRead {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// True for failures raised when handing a track to the playback engine.
    pub fn is_load_failure(&self) -> bool {
        matches!(self, Self::FileNotFound { .. } | Self::LoadFailure { .. })
    }

    /// Short heading used for the notice dialog.
    pub fn title(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => "Unsupported format",
            Self::FileNotFound { .. } => "File not found",
            Self::LoadFailure { .. } => "Playback error",
            Self::MetadataRead { .. } => "Metadata",
            Self::EmptyPlaylistName
            | Self::PlaylistExists(_)
            | Self::ReservedPlaylist(_)
            | Self::NoSuchPlaylist(_) => "Playlist",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_failures_cover_missing_and_undecodable_files() {
        let p = Path::new("/tmp/x.flac");
        assert!(PlayerError::not_found(p).is_load_failure());
        assert!(PlayerError::load_failure(p, "corrupt").is_load_failure());
        assert!(!PlayerError::unsupported(p).is_load_failure());
        assert!(!PlayerError::metadata(p, "no tags").is_load_failure());
        assert!(!PlayerError::NoSuchPlaylist("road trip".into()).is_load_failure());
    }

    #[test]
    fn messages_name_the_file_and_cause() {
        let e = PlayerError::load_failure(Path::new("/music/a.ogg"), "unsupported codec");
        let msg = e.to_string();
        assert!(msg.contains("/music/a.ogg"));
        assert!(msg.contains("unsupported codec"));
    }
}
