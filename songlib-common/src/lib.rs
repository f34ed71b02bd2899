//! # songlib Common Library
//!
//! Shared code for the song library service:
//! - Database models and schema initialization
//! - Release date type and its wire format
//! - Configuration loading
//! - Common error type

pub mod config;
pub mod db;
pub mod error;
pub mod release_date;

pub use db::models::{Song, SongDetails};
pub use error::{Error, Result};
pub use release_date::ReleaseDate;
