//! List parameters and query-string construction.
//!
//! Only parameters that differ from their defaults are sent. Keys are
//! emitted in sorted order so identical parameter sets always produce
//! identical URLs.

use url::form_urlencoded;

/// Filters for `list_bookmarks`. `Default` sends no parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListBookmarksParams {
    /// Search phrase, passed as `q`. Supports the service's search syntax
    /// (`#tag`, `!untagged`, ...).
    pub query: String,
    pub limit: u32,
    pub offset: u32,
    /// Restrict to unread bookmarks.
    pub unread: bool,
}

/// Paging for `list_tags`. `Default` sends no parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListTagsParams {
    pub limit: u32,
    pub offset: u32,
}

pub(crate) fn bookmarks_query(path: &str, params: &ListBookmarksParams) -> String {
    let mut pairs = paging_pairs(params.limit, params.offset);
    if !params.query.is_empty() {
        pairs.push(("q", params.query.clone()));
    }
    if params.unread {
        pairs.push(("unread", "yes".to_string()));
    }
    with_query(path, pairs)
}

pub(crate) fn tags_query(path: &str, params: &ListTagsParams) -> String {
    with_query(path, paging_pairs(params.limit, params.offset))
}

fn paging_pairs(limit: u32, offset: u32) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if limit > 0 {
        pairs.push(("limit", limit.to_string()));
    }
    if offset > 0 {
        pairs.push(("offset", offset.to_string()));
    }
    pairs
}

fn with_query(path: &str, mut pairs: Vec<(&'static str, String)>) -> String {
    if pairs.is_empty() {
        return path.to_string();
    }
    pairs.sort_by_key(|(key, _)| *key);
    let encoded = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();
    format!("{path}?{encoded}")
}
