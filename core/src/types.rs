//! Wire records for the linkding API.
//!
//! # Design
//! Read records are lenient: text fields that are missing or `null` decode to
//! empty strings, matching what the service sends for bookmarks whose
//! metadata has not been scraped yet. Write payloads are strict: every field
//! is always serialized, and `tag_names` is a plain `Vec` so an absent tag
//! list cannot be expressed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One page of a list endpoint.
///
/// `next` and `previous` are opaque cursors (absolute URLs) passed through as
/// sent; `None` when the service returned `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// A bookmark as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: u64,
    pub url: String,
    /// User-supplied title.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// User-supplied description.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    /// Title scraped from the page.
    #[serde(default, deserialize_with = "null_as_default")]
    pub website_title: String,
    /// Description scraped from the page.
    #[serde(default, deserialize_with = "null_as_default")]
    pub website_description: String,
    #[serde(default)]
    pub web_archive_snapshot_url: Option<String>,
    #[serde(default)]
    pub favicon_url: Option<String>,
    #[serde(default)]
    pub preview_image_url: Option<String>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub unread: bool,
    #[serde(default)]
    pub shared: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag_names: Vec<String>,
    pub date_added: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

/// Body of a bookmark create or full-replacement update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkPayload {
    pub url: String,
    pub title: String,
    pub description: String,
    pub notes: String,
    pub is_archived: bool,
    pub unread: bool,
    pub shared: bool,
    pub tag_names: Vec<String>,
}

impl BookmarkPayload {
    /// Payload for `url` with every other field empty.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            description: String::new(),
            notes: String::new(),
            is_archived: false,
            unread: false,
            shared: false,
            tag_names: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tag_names = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn unread(mut self, unread: bool) -> Self {
        self.unread = unread;
        self
    }

    pub fn shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }

    pub fn archived(mut self, is_archived: bool) -> Self {
        self.is_archived = is_archived;
        self
    }
}

/// Replacement payload carrying the bookmark's current user-editable state.
impl From<&Bookmark> for BookmarkPayload {
    fn from(bookmark: &Bookmark) -> Self {
        Self {
            url: bookmark.url.clone(),
            title: bookmark.title.clone(),
            description: bookmark.description.clone(),
            notes: bookmark.notes.clone(),
            is_archived: bookmark.is_archived,
            unread: bookmark.unread,
            shared: bookmark.shared,
            tag_names: bookmark.tag_names.clone(),
        }
    }
}

/// A tag as returned by the service. Names are unique per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub name: String,
    pub date_added: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct TagPayload<'a> {
    pub name: &'a str,
}

/// Display and behavior settings of the authenticated user.
///
/// Missing or `null` values decode to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    #[serde(deserialize_with = "null_as_default")]
    pub theme: String,
    #[serde(deserialize_with = "null_as_default")]
    pub bookmark_date_display: String,
    #[serde(deserialize_with = "null_as_default")]
    pub bookmark_link_target: String,
    #[serde(deserialize_with = "null_as_default")]
    pub web_archive_integration: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tag_search: String,
    #[serde(deserialize_with = "null_as_default")]
    pub enable_sharing: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub enable_public_sharing: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub enable_favicons: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub display_url: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub permanent_notes: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub search_preferences: SearchPreferences,
}

/// Default search settings, nested in `UserPreferences`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchPreferences {
    #[serde(deserialize_with = "null_as_default")]
    pub sort: String,
    #[serde(deserialize_with = "null_as_default")]
    pub shared: String,
    #[serde(deserialize_with = "null_as_default")]
    pub unread: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
