use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Bookmark, Page, Tag};
use tower::ServiceExt;

const TOKEN: &str = "test-token";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Token {TOKEN}"))
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Token {TOKEN}"))
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_token_returns_401() {
    let resp = app(TOKEN)
        .oneshot(
            Request::builder()
                .uri("/api/bookmarks")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_token_returns_401() {
    let resp = app(TOKEN)
        .oneshot(
            Request::builder()
                .uri("/api/user/profile/")
                .header(http::header::AUTHORIZATION, "Token nope")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- list ---

#[tokio::test]
async fn list_bookmarks_empty() {
    let resp = app(TOKEN)
        .oneshot(request("GET", "/api/bookmarks"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let page: Page<Bookmark> = body_json(resp).await;
    assert_eq!(page.count, 0);
    assert!(page.next.is_none());
    assert!(page.results.is_empty());
}

#[tokio::test]
async fn list_tags_empty() {
    let resp = app(TOKEN)
        .oneshot(request("GET", "/api/tags?limit=10"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let page: Page<Tag> = body_json(resp).await;
    assert_eq!(page.count, 0);
}

// --- create ---

#[tokio::test]
async fn create_bookmark_returns_201() {
    let resp = app(TOKEN)
        .oneshot(json_request(
            "POST",
            "/api/bookmarks/",
            r#"{"url":"https://example.com","title":"Example","tag_names":["web"]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let bookmark: Bookmark = body_json(resp).await;
    assert_eq!(bookmark.id, 1);
    assert_eq!(bookmark.url, "https://example.com");
    assert_eq!(bookmark.tag_names, vec!["web"]);
    assert_eq!(bookmark.date_added, bookmark.date_modified);
}

#[tokio::test]
async fn create_bookmark_without_tag_names_returns_400() {
    let resp = app(TOKEN)
        .oneshot(json_request(
            "POST",
            "/api/bookmarks/",
            r#"{"url":"https://example.com"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["tag_names"][0], "This field is required.");
}

#[tokio::test]
async fn create_bookmark_blank_url_returns_400() {
    let resp = app(TOKEN)
        .oneshot(json_request(
            "POST",
            "/api/bookmarks/",
            r#"{"url":"","tag_names":[]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["url"][0], "This field may not be blank.");
}

#[tokio::test]
async fn create_tag_blank_name_returns_400() {
    let resp = app(TOKEN)
        .oneshot(json_request("POST", "/api/tags/", r#"{"name":"  "}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- get ---

#[tokio::test]
async fn get_bookmark_not_found() {
    let resp = app(TOKEN)
        .oneshot(request("GET", "/api/bookmarks/42/"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_bookmark_bad_id_returns_400() {
    let resp = app(TOKEN)
        .oneshot(request("GET", "/api/bookmarks/not-a-number/"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_tag_not_found() {
    let resp = app(TOKEN)
        .oneshot(request("GET", "/api/tags/7/"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- update / delete ---

#[tokio::test]
async fn update_bookmark_not_found() {
    let resp = app(TOKEN)
        .oneshot(json_request(
            "PUT",
            "/api/bookmarks/42/",
            r#"{"url":"https://example.com","tag_names":[]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_bookmark_not_found() {
    let resp = app(TOKEN)
        .oneshot(request("DELETE", "/api/bookmarks/42/"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- user ---

#[tokio::test]
async fn user_profile_has_search_preferences() {
    let resp = app(TOKEN)
        .oneshot(request("GET", "/api/user/profile/"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["theme"], "auto");
    assert_eq!(body["search_preferences"]["sort"], "added_desc");
}

// --- full lifecycle ---

#[tokio::test]
async fn bookmark_lifecycle() {
    use tower::Service;

    let mut app = app(TOKEN).into_service();

    // create two bookmarks; the first introduces the "rust" tag
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/api/bookmarks/",
            r#"{"url":"https://www.rust-lang.org","title":"Rust","unread":true,"tag_names":["rust"]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let rust: Bookmark = body_json(resp).await;

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/api/bookmarks/",
            r#"{"url":"https://go.dev","title":"Go","tag_names":[]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // tag was created implicitly
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", "/api/tags"))
        .await
        .unwrap();
    let tags: Page<Tag> = body_json(resp).await;
    assert_eq!(tags.count, 1);
    assert_eq!(tags.results[0].name, "rust");

    // duplicate tag rejected
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/api/tags/", r#"{"name":"Rust"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // search, unread filter and paging
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", "/api/bookmarks?q=%23rust"))
        .await
        .unwrap();
    let page: Page<Bookmark> = body_json(resp).await;
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].id, rust.id);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", "/api/bookmarks?unread=yes"))
        .await
        .unwrap();
    let page: Page<Bookmark> = body_json(resp).await;
    assert_eq!(page.count, 1);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", "/api/bookmarks?limit=1"))
        .await
        .unwrap();
    let page: Page<Bookmark> = body_json(resp).await;
    assert_eq!(page.count, 2);
    assert_eq!(page.results.len(), 1);
    assert_eq!(page.next.as_deref(), Some("/api/bookmarks/?limit=1&offset=1"));

    // update replaces the whole record
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            &format!("/api/bookmarks/{}/", rust.id),
            r#"{"url":"https://www.rust-lang.org","title":"Rust home","tag_names":[]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Bookmark = body_json(resp).await;
    assert_eq!(updated.title, "Rust home");
    assert!(!updated.unread);
    assert!(updated.tag_names.is_empty());
    assert_eq!(updated.date_added, rust.date_added);

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("DELETE", &format!("/api/bookmarks/{}/", rust.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let body = body_bytes(resp).await;
    assert!(body.is_empty());

    // get after delete is 404
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", &format!("/api/bookmarks/{}/", rust.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
