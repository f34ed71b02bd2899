//! Database access layer for songlib-srv

pub mod listing;
pub mod songs;

pub use listing::{list_songs, SongFilter, SongPage, SortOrder};
pub use songs::SongChanges;
