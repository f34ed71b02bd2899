//! Filtered, sorted and paginated song listing
//!
//! Filters on `group`, `song` and `link` are exact matches, `text` is a
//! literal substring match. An unset filter matches everything.

use serde::Serialize;
use songlib_common::{Result, Song};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::songs::song_from_row;
use crate::pagination::PageParams;

/// Columns selected for a joined song row
const SONG_COLUMNS: &str = "s.id, s.group_name, s.song, d.text, d.release_date, d.link";

const SONG_JOIN: &str = "FROM songs s JOIN song_details d ON d.song_id = s.id";

/// Listing filters, `None` means "match all"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongFilter {
    pub group: Option<String>,
    pub song: Option<String>,
    pub link: Option<String>,
    pub text: Option<String>,
}

impl SongFilter {
    /// Build from raw query-string values.
    ///
    /// Empty values are dropped. In `text` the escape `\n` becomes a real
    /// newline so multi-line fragments can be searched from a URL.
    pub fn from_query(
        group: Option<String>,
        song: Option<String>,
        link: Option<String>,
        text: Option<String>,
    ) -> Self {
        Self {
            group: non_empty(group),
            song: non_empty(song),
            link: non_empty(link),
            text: non_empty(text).map(|t| t.replace("\\n", "\n")),
        }
    }

    fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1 = 1");
        if let Some(group) = &self.group {
            qb.push(" AND s.group_name = ").push_bind(group.clone());
        }
        if let Some(song) = &self.song {
            qb.push(" AND s.song = ").push_bind(song.clone());
        }
        if let Some(link) = &self.link {
            qb.push(" AND d.link = ").push_bind(link.clone());
        }
        if let Some(text) = &self.text {
            // instr() avoids LIKE wildcard interpretation of % and _
            qb.push(" AND instr(d.text, ")
                .push_bind(text.clone())
                .push(") > 0");
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Ordering by release date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// `asc`/`desc` (case-insensitive); anything else is ascending
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// One page of listing results
#[derive(Debug, Clone)]
pub struct SongPage {
    /// Matching rows before pagination
    pub total: i64,
    pub songs: Vec<Song>,
}

/// Run the listing query.
///
/// The count and the page are read in one transaction so `total` and
/// `songs` come from the same snapshot.
pub async fn list_songs(
    pool: &SqlitePool,
    filter: &SongFilter,
    sort: SortOrder,
    params: PageParams,
) -> Result<SongPage> {
    let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) ");
    count_query.push(SONG_JOIN);
    filter.push_where(&mut count_query);
    let mut tx = pool.begin().await?;

    let total: i64 = count_query.build_query_scalar().fetch_one(&mut *tx).await?;

    let mut query = QueryBuilder::<Sqlite>::new("SELECT ");
    query.push(SONG_COLUMNS).push(" ").push(SONG_JOIN);
    filter.push_where(&mut query);
    // id tie-break keeps pages stable for equal dates
    query
        .push(format!(" ORDER BY d.release_date {}, s.id ASC", sort.as_sql()))
        .push(" LIMIT ")
        .push_bind(params.limit)
        .push(" OFFSET ")
        .push_bind(params.offset());

    let rows = query.build().fetch_all(&mut *tx).await?;
    tx.commit().await?;

    let songs = rows
        .iter()
        .map(song_from_row)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(SongPage { total, songs })
}
