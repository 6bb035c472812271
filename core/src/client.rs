//! Request pipeline and resource operations for the linkding API.
//!
//! # Design
//! `LinkdingClient` holds only configuration: the validated base URL, the
//! API token and a transport handle. Every operation goes through the same
//! three steps:
//!
//! 1. `build_request` turns a method, path and optional payload into an
//!    `HttpRequest` carrying the auth and content headers. No I/O.
//! 2. The `Transport` executes it (one attempt, no retries).
//! 3. `classify` maps the status code to either the open body or an
//!    `ApiError`, draining the body on every error path.
//!
//! Resource methods are thin shims over `execute` plus a JSON decode.

use serde::de::DeserializeOwned;
use serde::Serialize;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};
use url::Url;

use crate::error::{ApiError, ApiResult, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, ResponseBody, Transport, UreqTransport};
use crate::query::{bookmarks_query, tags_query, ListBookmarksParams, ListTagsParams};
use crate::types::{Bookmark, BookmarkPayload, Page, Tag, TagPayload, UserPreferences};

const BOOKMARKS_PATH: &str = "/api/bookmarks";
const TAGS_PATH: &str = "/api/tags";
const USER_PROFILE_PATH: &str = "/api/user/profile/";

const NO_PAYLOAD: Option<&()> = None;

/// Blocking client for a linkding instance.
///
/// Cheap to clone; clones share the transport (and with `UreqTransport`, its
/// connection pool). Safe to use from several threads at once when the
/// transport is.
#[derive(Debug, Clone)]
pub struct LinkdingClient<T = UreqTransport> {
    base_url: String,
    token: SecretString,
    transport: T,
}

/// Construction-time configuration for `LinkdingClient`.
#[derive(Debug)]
pub struct ClientBuilder<T = UreqTransport> {
    base_url: String,
    token: SecretString,
    transport: TransportSlot<T>,
}

/// A transport given to the builder, or how to make the default one.
#[derive(Debug)]
enum TransportSlot<T> {
    Deferred(fn() -> T),
    Ready(T),
}

impl<T> TransportSlot<T> {
    fn into_transport(self) -> T {
        match self {
            TransportSlot::Deferred(make) => make(),
            TransportSlot::Ready(transport) => transport,
        }
    }
}

impl ClientBuilder<UreqTransport> {
    /// Use a caller-configured `ureq::Agent` (timeouts, proxy, TLS roots).
    ///
    /// Error statuses are still classified into `ApiError` variants even if
    /// the agent treats them as errors.
    pub fn agent(self, agent: ureq::Agent) -> Self {
        self.transport(UreqTransport::with_agent(agent))
    }
}

impl<T> ClientBuilder<T> {
    /// Replace the HTTP stack entirely.
    pub fn transport<U: Transport>(self, transport: U) -> ClientBuilder<U> {
        ClientBuilder {
            base_url: self.base_url,
            token: self.token,
            transport: TransportSlot::Ready(transport),
        }
    }

    /// Validate the base URL and build the client.
    ///
    /// The default transport is only created here, once the URL is known to
    /// be usable.
    pub fn build(self) -> ApiResult<LinkdingClient<T>> {
        let base_url = validate_base_url(&self.base_url)?;
        Ok(LinkdingClient {
            base_url,
            token: self.token,
            transport: self.transport.into_transport(),
        })
    }
}

impl LinkdingClient<UreqTransport> {
    /// Client for the instance at `base_url` with a default transport.
    ///
    /// `base_url` is the origin only, e.g. `https://linkding.example.org`,
    /// without the `/api` prefix.
    pub fn new(base_url: &str, token: impl Into<String>) -> ApiResult<Self> {
        Self::builder(base_url, token).build()
    }

    pub fn builder(base_url: &str, token: impl Into<String>) -> ClientBuilder<UreqTransport> {
        ClientBuilder {
            base_url: base_url.to_string(),
            token: SecretString::new(token.into()),
            transport: TransportSlot::Deferred(UreqTransport::new),
        }
    }
}

impl<T> LinkdingClient<T> {
    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the request for `method` on `path` (which may carry a query
    /// string), serializing `payload` as the JSON body when present.
    pub fn build_request<P>(
        &self,
        method: HttpMethod,
        path: &str,
        payload: Option<&P>,
    ) -> ApiResult<HttpRequest>
    where
        P: Serialize + ?Sized,
    {
        let body = payload
            .map(serde_json::to_string)
            .transpose()
            .map_err(ApiError::Encode)?;

        let mut headers = Vec::with_capacity(3);
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        headers.push(("accept".to_string(), "application/json".to_string()));
        headers.push((
            "authorization".to_string(),
            format!("Token {}", self.token.expose_secret()),
        ));

        Ok(HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            headers,
            body,
        })
    }
}

impl<T: Transport> LinkdingClient<T> {
    /// Perform one request and return the body of a 2xx response.
    ///
    /// The caller owns the returned body and should read it to the end.
    pub fn execute<P>(
        &self,
        method: HttpMethod,
        path: &str,
        payload: Option<&P>,
    ) -> ApiResult<ResponseBody>
    where
        P: Serialize + ?Sized,
    {
        let request = self.build_request(method, path, payload)?;
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.transport.send(request)?;
        debug!(status = response.status, "received response");
        classify(response)
    }

    // Bookmarks

    pub fn list_bookmarks(&self, params: &ListBookmarksParams) -> ApiResult<Page<Bookmark>> {
        let path = bookmarks_query(BOOKMARKS_PATH, params);
        decode(self.execute(HttpMethod::Get, &path, NO_PAYLOAD)?)
    }

    pub fn get_bookmark(&self, id: u64) -> ApiResult<Bookmark> {
        let path = format!("{BOOKMARKS_PATH}/{id}/");
        decode(self.execute(HttpMethod::Get, &path, NO_PAYLOAD)?)
    }

    /// Create a bookmark; the returned record carries the assigned id and
    /// timestamps.
    pub fn create_bookmark(&self, payload: &BookmarkPayload) -> ApiResult<Bookmark> {
        let path = format!("{BOOKMARKS_PATH}/");
        decode(self.execute(HttpMethod::Post, &path, Some(payload))?)
    }

    /// Replace every user-editable field of bookmark `id`.
    pub fn update_bookmark(&self, id: u64, payload: &BookmarkPayload) -> ApiResult<Bookmark> {
        let path = format!("{BOOKMARKS_PATH}/{id}/");
        decode(self.execute(HttpMethod::Put, &path, Some(payload))?)
    }

    pub fn delete_bookmark(&self, id: u64) -> ApiResult<()> {
        let path = format!("{BOOKMARKS_PATH}/{id}/");
        let body = self.execute(HttpMethod::Delete, &path, NO_PAYLOAD)?;
        body.drain().map_err(TransportError::from)?;
        Ok(())
    }

    // Tags

    pub fn list_tags(&self, params: &ListTagsParams) -> ApiResult<Page<Tag>> {
        let path = tags_query(TAGS_PATH, params);
        decode(self.execute(HttpMethod::Get, &path, NO_PAYLOAD)?)
    }

    pub fn get_tag(&self, id: u64) -> ApiResult<Tag> {
        let path = format!("{TAGS_PATH}/{id}/");
        decode(self.execute(HttpMethod::Get, &path, NO_PAYLOAD)?)
    }

    pub fn create_tag(&self, name: &str) -> ApiResult<Tag> {
        let path = format!("{TAGS_PATH}/");
        decode(self.execute(HttpMethod::Post, &path, Some(&TagPayload { name }))?)
    }

    // User

    pub fn get_user_preferences(&self) -> ApiResult<UserPreferences> {
        decode(self.execute(HttpMethod::Get, USER_PROFILE_PATH, NO_PAYLOAD)?)
    }
}

/// Map a response to its body (2xx) or the matching `ApiError`.
///
/// Error bodies are always consumed before returning; a 400 body is kept as
/// the error's detail.
pub fn classify(response: HttpResponse) -> ApiResult<ResponseBody> {
    let HttpResponse { status, body, .. } = response;
    if (200..300).contains(&status) {
        return Ok(body);
    }

    let err = match status {
        400 => {
            let detail = body.into_bytes().unwrap_or_else(|e| {
                warn!(error = %e, "failed to read bad request body");
                Vec::new()
            });
            ApiError::BadRequest { detail }
        }
        _ => {
            if let Err(e) = body.drain() {
                debug!(error = %e, "failed to drain error response body");
            }
            match status {
                401 => ApiError::Unauthorized,
                404 => ApiError::NotFound,
                500 => ApiError::InternalServerError,
                status => ApiError::UnexpectedStatus { status },
            }
        }
    };
    debug!(status, error = %err, "request failed");
    Err(err)
}

/// Decode a JSON success body.
pub fn decode<R: DeserializeOwned>(body: ResponseBody) -> ApiResult<R> {
    serde_json::from_reader(body).map_err(|e| {
        if e.is_io() {
            ApiError::Transport(TransportError::Io(e.into()))
        } else {
            ApiError::Decode(e)
        }
    })
}

fn validate_base_url(raw: &str) -> Result<String, TransportError> {
    let trimmed = raw.trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|source| TransportError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;
    if parsed.cannot_be_a_base() || parsed.host().is_none() {
        return Err(TransportError::MissingHost(raw.to_string()));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(TransportError::QueryInBaseUrl(raw.to_string()));
    }
    Ok(trimmed.to_string())
}
