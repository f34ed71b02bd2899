//! Song writer: add, edit and delete
//!
//! Validation and lookups run against the pool before any transaction is
//! opened; the multi-table writes themselves live in `db::songs`.

use serde::Deserialize;
use songlib_common::{Error, ReleaseDate, Result, Song, SongDetails};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::metadata_client::MetadataSource;
use crate::db::songs::{self, SongChanges};

/// Details fields of a request body, all optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsInput {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    /// `DD.MM.YYYY`, or `""` for "no date"
    #[serde(default)]
    pub release_date: Option<String>,
}

/// Body of `POST /songs`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewSong {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub song: String,
    #[serde(rename = "SongDetails", default)]
    pub details: Option<DetailsInput>,
}

/// Body of `PUT /songs/{id}`; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SongUpdate {
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub song: Option<String>,
    #[serde(rename = "SongDetails", default)]
    pub details: Option<DetailsInput>,
}

/// Writes songs and their details, optionally enriching new songs
#[derive(Clone)]
pub struct SongWriter {
    db: SqlitePool,
    metadata: Option<Arc<dyn MetadataSource>>,
}

impl SongWriter {
    pub fn new(db: SqlitePool, metadata: Option<Arc<dyn MetadataSource>>) -> Self {
        Self { db, metadata }
    }

    /// Create a song with its details
    pub async fn add(&self, new_song: NewSong) -> Result<Song> {
        let input = new_song.details.unwrap_or_default();
        let release_date = parse_release_date(input.release_date.as_deref())?.flatten();

        let group = require_non_blank("group", &new_song.group)?;
        let title = require_non_blank("song", &new_song.song)?;

        if songs::find_song_id_by_title(&self.db, group, title)
            .await?
            .is_some()
        {
            return Err(duplicate(group, title));
        }

        let mut details = SongDetails {
            song_id: 0,
            text: input.text.unwrap_or_default(),
            release_date,
            link: input.link.unwrap_or_default(),
        };
        self.enrich(group, title, &mut details).await;

        let created = songs::insert_song_with_details(&self.db, group, title, details)
            .await
            .map_err(|e| unique_violation_as_duplicate(e, group, title))?;

        info!(song_id = created.id, group = %group, song = %title, "Song added");
        Ok(created)
    }

    /// Apply a partial update and return the stored result
    pub async fn edit(&self, id: i64, update: SongUpdate) -> Result<Song> {
        let input = update.details.unwrap_or_default();
        let release_date = parse_release_date(input.release_date.as_deref())?;

        let group = update
            .group
            .as_deref()
            .map(|g| require_non_blank("group", g))
            .transpose()?;
        let title = update
            .song
            .as_deref()
            .map(|s| require_non_blank("song", s))
            .transpose()?;

        let existing = songs::find_song(&self.db, id)
            .await?
            .ok_or_else(|| song_not_found(id))?;
        if songs::find_details(&self.db, id).await?.is_none() {
            return Err(details_not_found(id));
        }

        let new_group = group.unwrap_or(existing.group_name.as_str());
        let new_title = title.unwrap_or(existing.song.as_str());
        if let Some(other) = songs::find_song_id_by_title(&self.db, new_group, new_title).await? {
            if other != id {
                return Err(duplicate(new_group, new_title));
            }
        }

        let changes = SongChanges {
            group: group.map(str::to_string),
            song: title.map(str::to_string),
            text: input.text,
            link: input.link,
            release_date,
        };

        let updated = songs::update_song_with_details(&self.db, id, &changes)
            .await
            .map_err(|e| unique_violation_as_duplicate(e, new_group, new_title))?;
        if !updated {
            // removed between the lookup and the update
            return Err(song_not_found(id));
        }

        info!(song_id = id, "Song updated");

        songs::find_song_with_details(&self.db, id)
            .await?
            .ok_or_else(|| song_not_found(id))
    }

    /// Delete a song and its details
    pub async fn delete(&self, id: i64) -> Result<()> {
        if songs::find_details(&self.db, id).await?.is_none() {
            return Err(song_not_found(id));
        }

        if !songs::delete_song_with_details(&self.db, id).await? {
            return Err(song_not_found(id));
        }

        info!(song_id = id, "Song deleted");
        Ok(())
    }

    /// Fill fields the caller left empty. Failures are logged and ignored.
    async fn enrich(&self, group: &str, title: &str, details: &mut SongDetails) {
        let Some(source) = &self.metadata else {
            return;
        };

        let complete =
            !details.text.is_empty() && !details.link.is_empty() && details.release_date.is_some();
        if complete {
            return;
        }

        match source.fetch(group, title).await {
            Ok(Some(fetched)) => {
                if details.text.is_empty() {
                    details.text = fetched.text;
                }
                if details.link.is_empty() {
                    details.link = fetched.link;
                }
                if details.release_date.is_none() {
                    details.release_date = fetched.release_date;
                }
                debug!(group = %group, song = %title, "Applied fetched metadata");
            }
            Ok(None) => {
                debug!(group = %group, song = %title, "No metadata available");
            }
            Err(e) => {
                warn!(group = %group, song = %title, error = %e, "Metadata enrichment failed, continuing without it");
            }
        }
    }
}

/// `None` when absent, `Some(None)` for `""`, `Some(Some(date))` otherwise
fn parse_release_date(raw: Option<&str>) -> Result<Option<Option<ReleaseDate>>> {
    match raw.map(str::trim) {
        None => Ok(None),
        Some("") => Ok(Some(None)),
        Some(value) => Ok(Some(Some(value.parse::<ReleaseDate>()?))),
    }
}

fn require_non_blank<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(format!("Field '{}' must not be empty", field)));
    }
    Ok(trimmed)
}

fn duplicate(group: &str, title: &str) -> Error {
    Error::Duplicate(format!("Song '{}' by '{}' already exists", title, group))
}

fn song_not_found(id: i64) -> Error {
    Error::NotFound(format!("Song {} not found", id))
}

fn details_not_found(id: i64) -> Error {
    Error::NotFound(format!("Details for song {} not found", id))
}

fn unique_violation_as_duplicate(err: Error, group: &str, title: &str) -> Error {
    match &err {
        Error::Database(db_err)
            if db_err
                .as_database_error()
                .is_some_and(|e| e.is_unique_violation()) =>
        {
            duplicate(group, title)
        }
        _ => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::metadata_client::{MetadataError, SongMetadata};
    use async_trait::async_trait;
    use songlib_common::db::init_memory_database;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSource {
        metadata: SongMetadata,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetadataSource for FixedSource {
        async fn fetch(
            &self,
            _group: &str,
            _song: &str,
        ) -> std::result::Result<Option<SongMetadata>, MetadataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(self.metadata.clone()))
        }
    }

    struct FailingSource;

    #[async_trait]
    impl MetadataSource for FailingSource {
        async fn fetch(
            &self,
            _group: &str,
            _song: &str,
        ) -> std::result::Result<Option<SongMetadata>, MetadataError> {
            Err(MetadataError::Network("connection refused".to_string()))
        }
    }

    fn new_song(group: &str, song: &str, details: Option<DetailsInput>) -> NewSong {
        NewSong {
            group: group.to_string(),
            song: song.to_string(),
            details,
        }
    }

    async fn writer(metadata: Option<Arc<dyn MetadataSource>>) -> SongWriter {
        SongWriter::new(init_memory_database().await.unwrap(), metadata)
    }

    #[tokio::test]
    async fn test_add_without_details() {
        let w = writer(None).await;
        let song = w.add(new_song("Muse", "Hysteria", None)).await.unwrap();

        assert_eq!(song.group, "Muse");
        assert_eq!(song.details, SongDetails::empty(song.id));
    }

    #[tokio::test]
    async fn test_add_rejects_impossible_date_before_writing() {
        let w = writer(None).await;
        let details = DetailsInput {
            release_date: Some("31.02.2024".to_string()),
            ..DetailsInput::default()
        };

        let err = w.add(new_song("Muse", "Hysteria", Some(details))).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songs")
            .fetch_one(&w.db)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_add_rejects_blank_fields() {
        let w = writer(None).await;
        assert!(matches!(
            w.add(new_song("  ", "Hysteria", None)).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            w.add(new_song("Muse", "", None)).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_add_duplicate() {
        let w = writer(None).await;
        w.add(new_song("Muse", "Hysteria", None)).await.unwrap();

        assert!(matches!(
            w.add(new_song("Muse", "Hysteria", None)).await,
            Err(Error::Duplicate(_))
        ));
        // same title, different group is fine
        w.add(new_song("Cover Band", "Hysteria", None)).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_enrichment_still_creates_song() {
        let w = writer(Some(Arc::new(FailingSource))).await;
        let song = w.add(new_song("Muse", "Hysteria", None)).await.unwrap();

        assert!(song.details.text.is_empty());
        assert!(song.details.link.is_empty());
        assert!(song.details.release_date.is_none());
    }

    #[tokio::test]
    async fn test_supplied_fields_win_over_fetched() {
        let source = Arc::new(FixedSource {
            metadata: SongMetadata {
                text: "fetched text".to_string(),
                link: "https://fetched".to_string(),
                release_date: ReleaseDate::from_ymd(2003, 12, 1),
            },
            calls: AtomicUsize::new(0),
        });
        let w = writer(Some(source.clone())).await;

        let details = DetailsInput {
            text: Some("my text".to_string()),
            ..DetailsInput::default()
        };
        let song = w.add(new_song("Muse", "Hysteria", Some(details))).await.unwrap();

        assert_eq!(song.details.text, "my text");
        assert_eq!(song.details.link, "https://fetched");
        assert_eq!(song.details.release_date, ReleaseDate::from_ymd(2003, 12, 1));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_complete_details_skip_enrichment() {
        let source = Arc::new(FixedSource {
            metadata: SongMetadata::default(),
            calls: AtomicUsize::new(0),
        });
        let w = writer(Some(source.clone())).await;

        let details = DetailsInput {
            text: Some("t".to_string()),
            link: Some("l".to_string()),
            release_date: Some("01.12.2003".to_string()),
        };
        w.add(new_song("Muse", "Hysteria", Some(details))).await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_edit_partial_update() {
        let w = writer(None).await;
        let details = DetailsInput {
            text: Some("old".to_string()),
            link: Some("https://old".to_string()),
            release_date: Some("01.12.2003".to_string()),
        };
        let created = w.add(new_song("Muse", "Hysteria", Some(details))).await.unwrap();

        let update = SongUpdate {
            song: Some("Hysteria (Live)".to_string()),
            details: Some(DetailsInput {
                release_date: Some(String::new()),
                ..DetailsInput::default()
            }),
            ..SongUpdate::default()
        };
        let edited = w.edit(created.id, update).await.unwrap();

        assert_eq!(edited.group, "Muse");
        assert_eq!(edited.song, "Hysteria (Live)");
        assert_eq!(edited.details.text, "old");
        assert_eq!(edited.details.link, "https://old");
        assert!(edited.details.release_date.is_none());
    }

    #[tokio::test]
    async fn test_edit_bad_date_format() {
        let w = writer(None).await;
        let created = w.add(new_song("Muse", "Hysteria", None)).await.unwrap();

        let update = SongUpdate {
            details: Some(DetailsInput {
                release_date: Some("2003-12-01".to_string()),
                ..DetailsInput::default()
            }),
            ..SongUpdate::default()
        };
        assert!(matches!(
            w.edit(created.id, update).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_edit_song_without_details_is_not_found() {
        let w = writer(None).await;
        sqlx::query("INSERT INTO songs (id, group_name, song) VALUES (42, 'Muse', 'Bare')")
            .execute(&w.db)
            .await
            .unwrap();

        let update = SongUpdate {
            group: Some("Renamed".to_string()),
            ..SongUpdate::default()
        };
        assert!(matches!(w.edit(42, update).await, Err(Error::NotFound(_))));

        let row = songs::find_song(&w.db, 42).await.unwrap().unwrap();
        assert_eq!(row.group_name, "Muse");
    }

    #[tokio::test]
    async fn test_edit_rename_onto_existing_is_duplicate() {
        let w = writer(None).await;
        w.add(new_song("Muse", "Hysteria", None)).await.unwrap();
        let other = w.add(new_song("Muse", "Uprising", None)).await.unwrap();

        let update = SongUpdate {
            song: Some("Hysteria".to_string()),
            ..SongUpdate::default()
        };
        assert!(matches!(
            w.edit(other.id, update).await,
            Err(Error::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let w = writer(None).await;
        let created = w.add(new_song("Muse", "Hysteria", None)).await.unwrap();

        w.delete(created.id).await.unwrap();
        assert!(songs::find_song(&w.db, created.id).await.unwrap().is_none());
        assert!(matches!(w.delete(created.id).await, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_parse_release_date_tri_state() {
        assert_eq!(parse_release_date(None).unwrap(), None);
        assert_eq!(parse_release_date(Some("")).unwrap(), Some(None));
        assert_eq!(
            parse_release_date(Some("16.07.2006")).unwrap(),
            Some(ReleaseDate::from_ymd(2006, 7, 16))
        );
        assert!(parse_release_date(Some("16/07/2006")).is_err());
    }
}
