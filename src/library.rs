//! Library module: the `Track` model, the ordered `Playlist`, tag reading
//! and folder enumeration.

mod display;
mod model;
mod playlist;
mod scan;
mod tags;

pub use model::Track;
pub use playlist::Playlist;
pub use scan::{enumerate_folder, is_audio_file};
pub use tags::{LoftyReader, TagReader, TrackTags, build_track};
