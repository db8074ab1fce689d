//! Named playlists and the views the track list can show.
//!
//! The library (`App::playlist`) holds every added track. A view picks which
//! of those tracks the list shows: all of them, the favourites, or one of the
//! user's named playlists. Named playlists store paths, so a track shows up
//! in them for as long as some library entry still has that path.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::PlayerError;

pub const ALL: &str = "All";
pub const FAVOURITE: &str = "Favourite";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    All,
    Favourite,
    Named(String),
}

impl View {
    pub fn name(&self) -> &str {
        match self {
            View::All => ALL,
            View::Favourite => FAVOURITE,
            View::Named(name) => name,
        }
    }
}

fn is_reserved(name: &str) -> bool {
    name.eq_ignore_ascii_case(ALL) || name.eq_ignore_ascii_case(FAVOURITE)
}

/// User playlists keyed by name. Each keeps its paths in insertion order
/// without repeats.
#[derive(Debug, Default)]
pub struct Playlists {
    lists: BTreeMap<String, Vec<PathBuf>>,
}

impl Playlists {
    /// Create an empty playlist and return its trimmed name.
    pub fn create(&mut self, name: &str) -> Result<String, PlayerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlayerError::EmptyPlaylistName);
        }
        if is_reserved(name) {
            return Err(PlayerError::ReservedPlaylist(name.to_string()));
        }
        if self.lists.contains_key(name) {
            return Err(PlayerError::PlaylistExists(name.to_string()));
        }
        self.lists.insert(name.to_string(), Vec::new());
        Ok(name.to_string())
    }

    pub fn delete(&mut self, name: &str) -> Result<(), PlayerError> {
        let key = self.key(name)?;
        self.lists.remove(&key);
        Ok(())
    }

    /// Append `path` to `name`. Returns false when it is already there.
    pub fn add(&mut self, name: &str, path: &Path) -> Result<bool, PlayerError> {
        let key = self.key(name)?;
        let Some(list) = self.lists.get_mut(&key) else {
            return Err(PlayerError::NoSuchPlaylist(key));
        };
        if list.iter().any(|p| p == path) {
            return Ok(false);
        }
        list.push(path.to_path_buf());
        Ok(true)
    }

    /// Drop `path` from `name`. Returns false when it was not there.
    pub fn remove(&mut self, name: &str, path: &Path) -> Result<bool, PlayerError> {
        let key = self.key(name)?;
        let Some(list) = self.lists.get_mut(&key) else {
            return Err(PlayerError::NoSuchPlaylist(key));
        };
        let before = list.len();
        list.retain(|p| p != path);
        Ok(list.len() != before)
    }

    pub fn get(&self, name: &str) -> Option<&[PathBuf]> {
        self.lists.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lists.contains_key(name)
    }

    /// Names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.lists.keys().map(String::as_str)
    }

    /// Drop `path` from every playlist.
    pub fn forget(&mut self, path: &Path) {
        for list in self.lists.values_mut() {
            list.retain(|p| p != path);
        }
    }

    /// Empty every playlist but keep the names.
    pub fn empty_all(&mut self) {
        for list in self.lists.values_mut() {
            list.clear();
        }
    }

    /// Resolve a user-typed name to an existing key.
    fn key(&self, name: &str) -> Result<String, PlayerError> {
        let name = name.trim();
        if is_reserved(name) {
            return Err(PlayerError::ReservedPlaylist(name.to_string()));
        }
        if !self.lists.contains_key(name) {
            return Err(PlayerError::NoSuchPlaylist(name.to_string()));
        }
        Ok(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_trims_and_rejects_bad_names() {
        let mut lists = Playlists::default();
        assert_eq!(lists.create("  road trip ").unwrap(), "road trip");
        assert!(matches!(
            lists.create("road trip"),
            Err(PlayerError::PlaylistExists(_))
        ));
        assert!(matches!(lists.create("   "), Err(PlayerError::EmptyPlaylistName)));
        assert!(matches!(lists.create("all"), Err(PlayerError::ReservedPlaylist(_))));
        assert!(matches!(
            lists.create("Favourite"),
            Err(PlayerError::ReservedPlaylist(_))
        ));
        assert_eq!(lists.names().collect::<Vec<_>>(), vec!["road trip"]);
    }

    #[test]
    fn built_in_views_cannot_be_deleted() {
        let mut lists = Playlists::default();
        assert!(matches!(lists.delete(ALL), Err(PlayerError::ReservedPlaylist(_))));
        assert!(matches!(
            lists.delete(FAVOURITE),
            Err(PlayerError::ReservedPlaylist(_))
        ));
        assert!(matches!(lists.delete("gym"), Err(PlayerError::NoSuchPlaylist(_))));

        lists.create("gym").unwrap();
        lists.delete("gym").unwrap();
        assert!(!lists.contains("gym"));
    }

    #[test]
    fn paths_are_kept_once_in_insertion_order() {
        let mut lists = Playlists::default();
        lists.create("mix").unwrap();
        assert!(lists.add("mix", Path::new("b.mp3")).unwrap());
        assert!(lists.add("mix", Path::new("a.mp3")).unwrap());
        assert!(!lists.add("mix", Path::new("b.mp3")).unwrap());
        assert_eq!(
            lists.get("mix").unwrap(),
            [PathBuf::from("b.mp3"), PathBuf::from("a.mp3")]
        );

        assert!(lists.remove("mix", Path::new("b.mp3")).unwrap());
        assert!(!lists.remove("mix", Path::new("b.mp3")).unwrap());
        assert!(matches!(
            lists.add("nope", Path::new("a.mp3")),
            Err(PlayerError::NoSuchPlaylist(_))
        ));
    }

    #[test]
    fn forget_and_empty_keep_the_names() {
        let mut lists = Playlists::default();
        lists.create("one").unwrap();
        lists.create("two").unwrap();
        lists.add("one", Path::new("a.mp3")).unwrap();
        lists.add("two", Path::new("a.mp3")).unwrap();
        lists.add("two", Path::new("b.mp3")).unwrap();

        lists.forget(Path::new("a.mp3"));
        assert!(lists.get("one").unwrap().is_empty());
        assert_eq!(lists.get("two").unwrap(), [PathBuf::from("b.mp3")]);

        lists.empty_all();
        assert_eq!(lists.names().count(), 2);
        assert!(lists.get("two").unwrap().is_empty());
    }
}
