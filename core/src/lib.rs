//! Blocking, typed client for the linkding bookmark service's REST API.
//!
//! # Overview
//! Covers bookmarks (list, get, create, update, delete), tags (list, get,
//! create) and the user's preferences (read-only). Each method performs
//! exactly one authenticated HTTP request and decodes the JSON response.
//!
//! ```no_run
//! use linkding_core::{BookmarkPayload, LinkdingClient, ListBookmarksParams};
//!
//! # fn main() -> Result<(), linkding_core::ApiError> {
//! let client = LinkdingClient::new("https://linkding.example.org", "api-token")?;
//! let created = client.create_bookmark(&BookmarkPayload::new("https://www.rust-lang.org"))?;
//! let page = client.list_bookmarks(&ListBookmarksParams {
//!     query: "rust".to_string(),
//!     limit: 20,
//!     ..Default::default()
//! })?;
//! println!("{} of {} bookmarks, newest id {}", page.results.len(), page.count, created.id);
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - `LinkdingClient` holds only configuration (base URL, token, transport).
//!   No caching, no retries, no pagination traversal: `next`/`previous`
//!   cursors are returned as-is.
//! - The HTTP stack sits behind the `Transport` trait; `UreqTransport` is the
//!   default.
//! - Status codes are classified in one place (`client::classify`).

pub mod client;
pub mod error;
pub mod http;
pub mod query;
pub mod types;

pub use client::{ClientBuilder, LinkdingClient};
pub use error::{ApiError, ApiResult, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ResponseBody, Transport, UreqTransport};
pub use query::{ListBookmarksParams, ListTagsParams};
pub use types::{Bookmark, BookmarkPayload, Page, SearchPreferences, Tag, UserPreferences};
