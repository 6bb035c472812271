use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

const DEFAULT_LIMIT: usize = 100;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: u64,
    pub url: String,
    pub title: String,
    pub description: String,
    pub notes: String,
    pub website_title: Option<String>,
    pub website_description: Option<String>,
    pub web_archive_snapshot_url: Option<String>,
    pub favicon_url: Option<String>,
    pub preview_image_url: Option<String>,
    pub is_archived: bool,
    pub unread: bool,
    pub shared: bool,
    pub tag_names: Vec<String>,
    pub date_added: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub name: String,
    pub date_added: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Bookmark create/update body. Missing fields are validated by hand so the
/// server can answer with field-level 400s instead of a generic rejection.
#[derive(Debug, Deserialize)]
pub struct BookmarkInput {
    pub url: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub unread: bool,
    #[serde(default)]
    pub shared: bool,
    pub tag_names: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct TagInput {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub unread: Option<String>,
}

#[derive(Debug, Default)]
pub struct Store {
    bookmarks: BTreeMap<u64, Bookmark>,
    tags: BTreeMap<u64, Tag>,
    next_bookmark_id: u64,
    next_tag_id: u64,
}

impl Store {
    /// Create tags for any names not seen before.
    fn ensure_tags(&mut self, names: &[String], now: DateTime<Utc>) {
        for name in names {
            if self.find_tag(name).is_none() {
                self.insert_tag(name.clone(), now);
            }
        }
    }

    fn find_tag(&self, name: &str) -> Option<&Tag> {
        self.tags
            .values()
            .find(|tag| tag.name.eq_ignore_ascii_case(name))
    }

    fn insert_tag(&mut self, name: String, now: DateTime<Utc>) -> Tag {
        self.next_tag_id += 1;
        let tag = Tag {
            id: self.next_tag_id,
            name,
            date_added: now,
        };
        self.tags.insert(tag.id, tag.clone());
        tag
    }
}

#[derive(Clone)]
pub struct AppState {
    token: Arc<str>,
    store: Arc<RwLock<Store>>,
}

/// Error responses in the service's shape.
#[derive(Debug)]
pub enum Failure {
    NotFound,
    Invalid(BTreeMap<&'static str, Vec<&'static str>>),
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        match self {
            Failure::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response()
            }
            Failure::Invalid(fields) => (StatusCode::BAD_REQUEST, Json(fields)).into_response(),
        }
    }
}

pub fn app(token: &str) -> Router {
    let state = AppState {
        token: Arc::from(token),
        store: Arc::new(RwLock::new(Store::default())),
    };
    Router::new()
        .route("/api/bookmarks", get(list_bookmarks))
        .route("/api/bookmarks/", get(list_bookmarks).post(create_bookmark))
        .route(
            "/api/bookmarks/{id}/",
            get(get_bookmark).put(update_bookmark).delete(delete_bookmark),
        )
        .route("/api/tags", get(list_tags))
        .route("/api/tags/", get(list_tags).post(create_tag))
        .route("/api/tags/{id}/", get(get_tag))
        .route("/api/user/profile/", get(user_profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state)
}

pub async fn run(listener: TcpListener, token: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(token)).await
}

async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let expected = format!("Token {}", state.token);
    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if provided != Some(expected.as_str()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Invalid token."})),
        )
            .into_response();
    }
    next.run(request).await
}

// --- bookmarks ---

async fn list_bookmarks(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Page<Bookmark>> {
    let store = state.store.read().await;
    let terms: Vec<&str> = query.q.as_deref().unwrap_or("").split_whitespace().collect();
    let unread_only = query.unread.as_deref() == Some("yes");
    let matching: Vec<Bookmark> = store
        .bookmarks
        .values()
        .rev()
        .filter(|b| !unread_only || b.unread)
        .filter(|b| terms.iter().all(|term| matches_term(b, term)))
        .cloned()
        .collect();
    Json(paginate("/api/bookmarks/", matching, &query))
}

async fn get_bookmark(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Bookmark>, Failure> {
    let store = state.store.read().await;
    store.bookmarks.get(&id).cloned().map(Json).ok_or(Failure::NotFound)
}

async fn create_bookmark(
    State(state): State<AppState>,
    Json(input): Json<BookmarkInput>,
) -> Result<(StatusCode, Json<Bookmark>), Failure> {
    let (url, tag_names) = validate_bookmark(&input)?;
    let now = Utc::now();
    let mut store = state.store.write().await;
    store.ensure_tags(&tag_names, now);
    store.next_bookmark_id += 1;
    let bookmark = Bookmark {
        id: store.next_bookmark_id,
        url,
        title: input.title,
        description: input.description,
        notes: input.notes,
        website_title: None,
        website_description: None,
        web_archive_snapshot_url: None,
        favicon_url: None,
        preview_image_url: None,
        is_archived: input.is_archived,
        unread: input.unread,
        shared: input.shared,
        tag_names,
        date_added: now,
        date_modified: now,
    };
    store.bookmarks.insert(bookmark.id, bookmark.clone());
    debug!(id = bookmark.id, url = %bookmark.url, "bookmark created");
    Ok((StatusCode::CREATED, Json(bookmark)))
}

async fn update_bookmark(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<BookmarkInput>,
) -> Result<Json<Bookmark>, Failure> {
    let mut store = state.store.write().await;
    if !store.bookmarks.contains_key(&id) {
        return Err(Failure::NotFound);
    }
    let (url, tag_names) = validate_bookmark(&input)?;
    let now = Utc::now();
    store.ensure_tags(&tag_names, now);
    let bookmark = store.bookmarks.get_mut(&id).ok_or(Failure::NotFound)?;
    bookmark.url = url;
    bookmark.title = input.title;
    bookmark.description = input.description;
    bookmark.notes = input.notes;
    bookmark.is_archived = input.is_archived;
    bookmark.unread = input.unread;
    bookmark.shared = input.shared;
    bookmark.tag_names = tag_names;
    bookmark.date_modified = now;
    Ok(Json(bookmark.clone()))
}

async fn delete_bookmark(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, Failure> {
    let mut store = state.store.write().await;
    store
        .bookmarks
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(Failure::NotFound)
}

// --- tags ---

async fn list_tags(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Page<Tag>> {
    let store = state.store.read().await;
    let tags: Vec<Tag> = store.tags.values().cloned().collect();
    Json(paginate("/api/tags/", tags, &query))
}

async fn get_tag(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Tag>, Failure> {
    let store = state.store.read().await;
    store.tags.get(&id).cloned().map(Json).ok_or(Failure::NotFound)
}

async fn create_tag(
    State(state): State<AppState>,
    Json(input): Json<TagInput>,
) -> Result<(StatusCode, Json<Tag>), Failure> {
    let name = match input.name {
        None => return Err(invalid("name", "This field is required.")),
        Some(name) if name.trim().is_empty() => {
            return Err(invalid("name", "This field may not be blank."))
        }
        Some(name) => name,
    };
    let mut store = state.store.write().await;
    if store.find_tag(&name).is_some() {
        return Err(invalid("name", "Tag with this name already exists."));
    }
    let tag = store.insert_tag(name, Utc::now());
    debug!(id = tag.id, name = %tag.name, "tag created");
    Ok((StatusCode::CREATED, Json(tag)))
}

// --- user ---

async fn user_profile() -> Json<serde_json::Value> {
    Json(json!({
        "theme": "auto",
        "bookmark_date_display": "relative",
        "bookmark_link_target": "_blank",
        "web_archive_integration": "enabled",
        "tag_search": "lax",
        "enable_sharing": true,
        "enable_public_sharing": false,
        "enable_favicons": false,
        "display_url": false,
        "permanent_notes": false,
        "search_preferences": {
            "sort": "added_desc",
            "shared": "off",
            "unread": "off"
        }
    }))
}

// --- helpers ---

fn invalid(field: &'static str, message: &'static str) -> Failure {
    Failure::Invalid(BTreeMap::from([(field, vec![message])]))
}

fn validate_bookmark(input: &BookmarkInput) -> Result<(String, Vec<String>), Failure> {
    let mut errors: BTreeMap<&'static str, Vec<&'static str>> = BTreeMap::new();
    match input.url.as_deref() {
        None => errors.entry("url").or_default().push("This field is required."),
        Some(url) if url.trim().is_empty() => {
            errors.entry("url").or_default().push("This field may not be blank.")
        }
        Some(url) if !url.contains("://") => {
            errors.entry("url").or_default().push("Enter a valid URL.")
        }
        Some(_) => {}
    }
    if input.tag_names.is_none() {
        errors
            .entry("tag_names")
            .or_default()
            .push("This field is required.");
    }
    if !errors.is_empty() {
        return Err(Failure::Invalid(errors));
    }
    Ok((
        input.url.clone().unwrap_or_default(),
        input.tag_names.clone().unwrap_or_default(),
    ))
}

/// `#tag` terms match tag names, `!unread`/`!untagged` match flags, anything
/// else is a case-insensitive substring of the bookmark's text.
fn matches_term(bookmark: &Bookmark, term: &str) -> bool {
    if let Some(tag) = term.strip_prefix('#') {
        return bookmark
            .tag_names
            .iter()
            .any(|name| name.eq_ignore_ascii_case(tag));
    }
    match term {
        "!unread" => return bookmark.unread,
        "!untagged" => return bookmark.tag_names.is_empty(),
        _ => {}
    }
    let needle = term.to_lowercase();
    [
        bookmark.url.as_str(),
        bookmark.title.as_str(),
        bookmark.description.as_str(),
        bookmark.notes.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

fn paginate<T>(path: &str, items: Vec<T>, query: &ListQuery) -> Page<T> {
    let count = items.len();
    let limit = query.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT);
    let offset = query.offset.unwrap_or(0);
    let end = offset.saturating_add(limit);
    let next = (end < count).then(|| format!("{path}?limit={limit}&offset={end}"));
    let previous = (offset > 0).then(|| {
        let prev = offset.saturating_sub(limit);
        if prev == 0 {
            format!("{path}?limit={limit}")
        } else {
            format!("{path}?limit={limit}&offset={prev}")
        }
    });
    let results = items.into_iter().skip(offset).take(limit).collect();
    Page {
        count,
        next,
        previous,
        results,
    }
}
