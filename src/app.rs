//! Application module: the playlist/transport controller used by the TUI,
//! the runtime and the MPRIS bridge.
//!
//! `App` lives in `app::model`; the transport state machine in
//! `app::transport`; user-facing notices and prompt modes in `app::notice`;
//! named playlists and list views in `app::playlists`.

mod model;
mod notice;
mod playlists;
mod transport;

pub use model::*;
pub use notice::{InputMode, Notice, NoticeLevel};
pub use playlists::View;
pub use transport::{PlaybackState, Transition, Transport};
