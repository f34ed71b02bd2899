//! Service layer: song writes and external metadata lookups

pub mod metadata_client;
pub mod song_writer;

pub use metadata_client::{MetadataClient, MetadataError, MetadataSource, SongMetadata};
pub use song_writer::{DetailsInput, NewSong, SongUpdate, SongWriter};
