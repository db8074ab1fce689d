use crate::error::PlayerError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A dialog shown over the playlist until dismissed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

impl From<&PlayerError> for Notice {
    fn from(err: &PlayerError) -> Self {
        let level = match err {
            PlayerError::MetadataRead { .. }
            | PlayerError::EmptyPlaylistName
            | PlayerError::PlaylistExists(_)
            | PlayerError::ReservedPlaylist(_)
            | PlayerError::NoSuchPlaylist(_) => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        };
        Self {
            level,
            title: err.title().to_string(),
            message: err.to_string(),
        }
    }
}

/// What the bottom prompt line is collecting, if anything.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    AddFile,
    AddFolder,
    NewPlaylist,
    /// Name of the playlist the selected track goes into.
    AddToPlaylist,
}

impl InputMode {
    pub fn prompt(self) -> &'static str {
        match self {
            InputMode::Normal => "",
            InputMode::AddFile => "Add file: ",
            InputMode::AddFolder => "Add folder: ",
            InputMode::NewPlaylist => "New playlist: ",
            InputMode::AddToPlaylist => "Add to playlist: ",
        }
    }
}
