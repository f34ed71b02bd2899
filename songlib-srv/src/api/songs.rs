//! Song endpoints
//!
//! - `GET /songs` filtered, sorted, paginated listing
//! - `GET /songs/:id/text` paginated verses of one song
//! - `POST /songs` add (with optional enrichment)
//! - `PUT /songs/:id` partial edit
//! - `DELETE /songs/:id` delete

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use songlib_common::Song;
use tracing::debug;

use crate::db::{self, SongFilter, SortOrder};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{PageParams, DEFAULT_SONG_LIMIT, DEFAULT_VERSE_LIMIT};
use crate::services::{NewSong, SongUpdate};
use crate::verses::paginate_verses;
use crate::AppState;

/// Query parameters for `GET /songs`
///
/// Kept as raw strings so bad numbers surface as our own 400 body.
#[derive(Debug, Default, Deserialize)]
pub struct ListSongsQuery {
    pub group: Option<String>,
    pub song: Option<String>,
    pub link: Option<String>,
    pub text: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Query parameters for `GET /songs/:id/text`
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SongListResponse {
    pub page: i64,
    pub limit: i64,
    pub sort: SortOrder,
    pub total: i64,
    pub songs: Vec<Song>,
}

#[derive(Debug, Serialize)]
pub struct SongTextResponse {
    pub page: i64,
    pub limit: i64,
    pub total_verses: usize,
    pub text: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub id: i64,
}

/// GET /songs
pub async fn list_songs(
    State(state): State<AppState>,
    query: Result<Query<ListSongsQuery>, QueryRejection>,
) -> ApiResult<Json<SongListResponse>> {
    let Query(query) = query?;
    let params = PageParams::parse(
        query.page.as_deref(),
        query.limit.as_deref(),
        DEFAULT_SONG_LIMIT,
    )?;
    let sort = SortOrder::from_query(query.sort.as_deref());
    let filter = SongFilter::from_query(query.group, query.song, query.link, query.text);

    debug!(?filter, ?sort, page = params.page, limit = params.limit, "Listing songs");

    let page = db::list_songs(&state.db, &filter, sort, params).await?;

    Ok(Json(SongListResponse {
        page: params.page,
        limit: params.limit,
        sort,
        total: page.total,
        songs: page.songs,
    }))
}

/// GET /songs/:id/text
pub async fn get_song_text(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<SongTextResponse>> {
    let id = parse_id(&raw_id)?;
    let Query(query) = query?;
    let params = PageParams::parse(
        query.page.as_deref(),
        query.limit.as_deref(),
        DEFAULT_VERSE_LIMIT,
    )?;

    let details = db::songs::find_details(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Song {} not found", id)))?;

    if details.text.is_empty() {
        return Err(ApiError::NotFound(format!("Song {} has no lyrics", id)));
    }

    let page = paginate_verses(&details.text, params);

    Ok(Json(SongTextResponse {
        page: params.page,
        limit: params.limit,
        total_verses: page.total,
        text: page.verses.into_iter().map(str::to_string).collect(),
    }))
}

/// POST /songs
pub async fn add_song(
    State(state): State<AppState>,
    payload: Result<Json<NewSong>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Song>)> {
    let Json(new_song) = payload?;
    let song = state.writer().add(new_song).await?;
    Ok((StatusCode::CREATED, Json(song)))
}

/// PUT /songs/:id
pub async fn edit_song(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<SongUpdate>, JsonRejection>,
) -> ApiResult<Json<Song>> {
    let id = parse_id(&raw_id)?;
    let Json(update) = payload?;
    let song = state.writer().edit(id, update).await?;
    Ok(Json(song))
}

/// DELETE /songs/:id
pub async fn delete_song(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let id = parse_id(&raw_id)?;
    state.writer().delete(id).await?;
    Ok(Json(DeleteResponse {
        message: "Song deleted".to_string(),
        id,
    }))
}

fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid song id: '{}'", raw)))
}

/// Build song routes
pub fn song_routes() -> Router<AppState> {
    Router::new()
        .route("/songs", get(list_songs).post(add_song))
        .route("/songs/:id", axum::routing::put(edit_song).delete(delete_song))
        .route("/songs/:id/text", get(get_song_text))
}
