//! Song and song details persistence
//!
//! Multi-table writes run inside one `sqlx::Transaction`. A transaction
//! dropped without `commit()` rolls back, so every `?` on the way out of
//! these functions leaves the database unchanged.

use songlib_common::{ReleaseDate, Result, Song, SongDetails};
use sqlx::sqlite::SqliteRow;
use sqlx::types::chrono::NaiveDate;
use sqlx::{Row, SqlitePool};
use tracing::debug;

/// Row from the `songs` table alone
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SongRow {
    pub id: i64,
    pub group_name: String,
    pub song: String,
}

/// Field changes for an edit; `None` leaves a column untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongChanges {
    pub group: Option<String>,
    pub song: Option<String>,
    pub text: Option<String>,
    pub link: Option<String>,
    /// `Some(None)` clears the stored date
    pub release_date: Option<Option<ReleaseDate>>,
}

/// Map a joined songs/song_details row
pub(crate) fn song_from_row(row: &SqliteRow) -> std::result::Result<Song, sqlx::Error> {
    let id: i64 = row.try_get("id")?;
    Ok(Song {
        id,
        group: row.try_get("group_name")?,
        song: row.try_get("song")?,
        details: SongDetails {
            song_id: id,
            text: row.try_get("text")?,
            release_date: row
                .try_get::<Option<NaiveDate>, _>("release_date")?
                .map(ReleaseDate::from),
            link: row.try_get("link")?,
        },
    })
}

fn details_from_row(row: &SqliteRow) -> std::result::Result<SongDetails, sqlx::Error> {
    Ok(SongDetails {
        song_id: row.try_get("song_id")?,
        text: row.try_get("text")?,
        release_date: row
            .try_get::<Option<NaiveDate>, _>("release_date")?
            .map(ReleaseDate::from),
        link: row.try_get("link")?,
    })
}

/// Load a song row without details
pub async fn find_song(pool: &SqlitePool, id: i64) -> Result<Option<SongRow>> {
    let row = sqlx::query_as::<_, SongRow>("SELECT id, group_name, song FROM songs WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Id of the song with this exact group and title, if any
pub async fn find_song_id_by_title(
    pool: &SqlitePool,
    group: &str,
    song: &str,
) -> Result<Option<i64>> {
    let id = sqlx::query_scalar("SELECT id FROM songs WHERE group_name = ? AND song = ?")
        .bind(group)
        .bind(song)
        .fetch_optional(pool)
        .await?;
    Ok(id)
}

/// Load the details row of a song
pub async fn find_details(pool: &SqlitePool, song_id: i64) -> Result<Option<SongDetails>> {
    let row = sqlx::query(
        "SELECT song_id, text, release_date, link FROM song_details WHERE song_id = ?",
    )
    .bind(song_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(details_from_row).transpose()?)
}

/// Load a song joined with its details
pub async fn find_song_with_details(pool: &SqlitePool, id: i64) -> Result<Option<Song>> {
    let row = sqlx::query(
        r#"
        SELECT s.id, s.group_name, s.song, d.text, d.release_date, d.link
        FROM songs s
        JOIN song_details d ON d.song_id = s.id
        WHERE s.id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(song_from_row).transpose()?)
}

/// Insert a song and its details atomically. `details.song_id` is ignored
/// and replaced by the generated id.
pub async fn insert_song_with_details(
    pool: &SqlitePool,
    group: &str,
    song: &str,
    details: SongDetails,
) -> Result<Song> {
    let mut tx = pool.begin().await?;

    let id = sqlx::query("INSERT INTO songs (group_name, song) VALUES (?, ?)")
        .bind(group)
        .bind(song)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

    sqlx::query(
        "INSERT INTO song_details (song_id, text, release_date, link) VALUES (?, ?, ?, ?)",
    )
    .bind(id)
    .bind(&details.text)
    .bind(details.release_date.map(|d| d.date()))
    .bind(&details.link)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    debug!(song_id = id, "Inserted song with details");

    Ok(Song {
        id,
        group: group.to_string(),
        song: song.to_string(),
        details: SongDetails {
            song_id: id,
            ..details
        },
    })
}

/// Apply changes to both rows of a song atomically.
///
/// Returns `false` if either row is missing, in which case nothing is
/// written.
pub async fn update_song_with_details(
    pool: &SqlitePool,
    id: i64,
    changes: &SongChanges,
) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let songs_updated = sqlx::query(
        r#"
        UPDATE songs
        SET group_name = COALESCE(?, group_name),
            song = COALESCE(?, song),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(&changes.group)
    .bind(&changes.song)
    .bind(id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let (set_date, date) = match changes.release_date {
        Some(date) => (true, date.map(|d| d.date())),
        None => (false, None),
    };

    let details_updated = sqlx::query(
        r#"
        UPDATE song_details
        SET text = COALESCE(?, text),
            link = COALESCE(?, link),
            release_date = CASE WHEN ? THEN ? ELSE release_date END
        WHERE song_id = ?
        "#,
    )
    .bind(&changes.text)
    .bind(&changes.link)
    .bind(set_date)
    .bind(date)
    .bind(id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if songs_updated == 0 || details_updated == 0 {
        // dropped without commit: rolled back
        return Ok(false);
    }

    tx.commit().await?;
    Ok(true)
}

/// Delete details then the song row atomically.
///
/// Returns `false` (and writes nothing) if there were no details.
pub async fn delete_song_with_details(pool: &SqlitePool, id: i64) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let details_deleted = sqlx::query("DELETE FROM song_details WHERE song_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if details_deleted == 0 {
        return Ok(false);
    }

    sqlx::query("DELETE FROM songs WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}
