//! ApiClient 对 mock 后端的行为测试

use re2no_client::api::{
    ApiClient, ApiError, AuthMode, DateRange, FilterCriteria, PostView, SavePostRequest, SortMode,
};
use re2no_client::ClientConfig;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Fixture {
    server: MockServer,
    client: ApiClient,
    config: ClientConfig,
    _dir: TempDir,
}

async fn fixture(mode: AuthMode) -> Fixture {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = ClientConfig {
        base_url: server.uri(),
        timeout_ms: 5_000,
        auth_mode: mode,
        token_path: dir.path().join("auth_token"),
    };
    let client = ApiClient::new(&config).unwrap();
    Fixture {
        server,
        client,
        config,
        _dir: dir,
    }
}

fn reddit_post(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": format!("Post {}", id),
        "author": "ferris",
        "subreddit": "rust",
        "score": 10,
        "url": "https://example.com",
        "permalink": format!("/r/rust/comments/{}/", id),
        "created_utc": 1_700_000_000.0,
        "num_comments": 0,
        "thumbnail": "",
        "selftext": "body",
        "is_video": false
    })
}

#[tokio::test]
async fn current_user_401_is_none() {
    let f = fixture(AuthMode::Bearer).await;
    Mock::given(method("GET"))
        .and(path("/api/auth/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "not authenticated"})))
        .mount(&f.server)
        .await;

    let user = f.client.current_user().await.unwrap();
    assert!(user.is_none());
}

#[tokio::test]
async fn current_user_returns_user() {
    let f = fixture(AuthMode::Bearer).await;
    Mock::given(method("GET"))
        .and(path("/api/auth/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {
                "id": 1,
                "notion_user_id": "n-1",
                "email": "ferris@example.com",
                "name": "Ferris",
                "created_at": "2024-10-10T12:00:00Z"
            }
        })))
        .mount(&f.server)
        .await;

    let user = f.client.current_user().await.unwrap().unwrap();
    assert_eq!(user.id, 1);
    assert_eq!(user.email, "ferris@example.com");
    assert!(user.created_at.is_some());
}

#[tokio::test]
async fn current_user_other_errors_propagate() {
    let f = fixture(AuthMode::Bearer).await;
    Mock::given(method("GET"))
        .and(path("/api/auth/user"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "user not found"})))
        .mount(&f.server)
        .await;

    let err = f.client.current_user().await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "user not found (HTTP 404)");
}

#[tokio::test]
async fn list_posts_401_is_not_authenticated() {
    let f = fixture(AuthMode::Bearer).await;
    Mock::given(method("GET"))
        .and(path("/api/reddit/posts"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "authentication required"})))
        .mount(&f.server)
        .await;

    let err = f.client.list_posts(&FilterCriteria::default()).await.unwrap_err();
    assert!(err.is_not_authenticated());
    assert!(matches!(err, ApiError::NotAuthenticated));
}

#[tokio::test]
async fn non_json_500_falls_back_to_status_text() {
    let f = fixture(AuthMode::Bearer).await;
    Mock::given(method("GET"))
        .and(path("/api/reddit/posts"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&f.server)
        .await;

    let err = f.client.list_posts(&FilterCriteria::default()).await.unwrap_err();
    match err {
        ApiError::Remote { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Internal Server Error");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn list_posts_sends_query_and_bearer_token() {
    let f = fixture(AuthMode::Bearer).await;
    f.client.credentials().store("tok-123").unwrap();

    Mock::given(method("GET"))
        .and(path("/api/reddit/posts"))
        .and(query_param("subreddits", "rust,golang"))
        .and(query_param("keyword", "async"))
        .and(query_param("sort", "top"))
        .and(query_param("date_range", "week"))
        .and(query_param("limit", "5"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "posts": [reddit_post("a"), reddit_post("b")],
            "count": 2
        })))
        .expect(1)
        .mount(&f.server)
        .await;

    let criteria = FilterCriteria {
        subreddits: vec!["r/rust".to_string(), "golang".to_string()],
        keyword: Some(" async ".to_string()),
        date_range: DateRange::Week,
        sort: SortMode::Top,
        limit: 5,
        view: PostView::All,
    };
    let posts = f.client.list_posts(&criteria).await.unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id, "a");
    assert_eq!(posts[0].content, "body");
    assert_eq!(posts[0].url, "https://www.reddit.com/r/rust/comments/a/");
    assert!(!posts[0].saved);
}

#[tokio::test]
async fn list_posts_unsaved_view_filters_saved() {
    let f = fixture(AuthMode::Bearer).await;
    Mock::given(method("GET"))
        .and(path("/api/reddit/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "posts": [reddit_post("a"), reddit_post("b"), reddit_post("c")],
            "count": 3
        })))
        .mount(&f.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/notion/saved-posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "posts": [{ "reddit_id": "b", "title": "Post b", "notion_page_url": "https://notion.so/b" }]
        })))
        .expect(1)
        .mount(&f.server)
        .await;

    let criteria = FilterCriteria {
        view: PostView::Unsaved,
        ..Default::default()
    };
    let posts = f.client.list_posts(&criteria).await.unwrap();
    let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);
}

#[tokio::test]
async fn saved_posts_are_remapped() {
    let f = fixture(AuthMode::Bearer).await;
    Mock::given(method("GET"))
        .and(path("/api/notion/saved-posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "posts": [{
                "reddit_id": "abc",
                "title": "Hello",
                "subreddit": "rust",
                "content": "",
                "author": "ferris",
                "score": 3,
                "saved_at": "2024-10-10T12:00:00Z",
                "url": "https://reddit.com/r/rust/abc",
                "notion_page_url": "https://notion.so/abc"
            }]
        })))
        .mount(&f.server)
        .await;

    let posts = f.client.saved_posts().await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, "abc");
    assert_eq!(posts[0].created, "2024-10-10T12:00:00Z");
    assert!(posts[0].saved);
    assert_eq!(posts[0].notion_page_url.as_deref(), Some("https://notion.so/abc"));
}

#[tokio::test]
async fn exchange_token_stores_durable_token() {
    let f = fixture(AuthMode::Bearer).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/exchange-token"))
        .and(body_json(json!({"token": "short-lived"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "durable",
            "user": { "id": 7, "email": "ferris@example.com" }
        })))
        .mount(&f.server)
        .await;

    let user = f.client.exchange_token(" short-lived ").await.unwrap().unwrap();
    assert_eq!(user.id, 7);
    assert_eq!(f.config.token_store().load().as_deref(), Some("durable"));
    assert!(f.client.credentials().has_credential());
}

#[tokio::test]
async fn exchange_token_without_durable_token_keeps_presented() {
    let f = fixture(AuthMode::Bearer).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/exchange-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": null })))
        .mount(&f.server)
        .await;

    let user = f.client.exchange_token("presented").await.unwrap();
    assert!(user.is_none());
    assert_eq!(f.config.token_store().load().as_deref(), Some("presented"));
}

#[tokio::test]
async fn exchange_token_rejected_stores_nothing() {
    let f = fixture(AuthMode::Bearer).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/exchange-token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&f.server)
        .await;

    let err = f.client.exchange_token("bad").await.unwrap_err();
    assert!(err.is_not_authenticated());
    assert!(f.config.token_store().load().is_none());
}

#[tokio::test]
async fn logout_clears_token() {
    let f = fixture(AuthMode::Bearer).await;
    f.client.credentials().store("tok").unwrap();
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "logged out successfully"})))
        .mount(&f.server)
        .await;

    let message = f.client.logout().await.unwrap();
    assert_eq!(message, "logged out successfully");
    assert!(f.config.token_store().load().is_none());
}

#[tokio::test]
async fn logout_with_expired_session_still_clears_token() {
    let f = fixture(AuthMode::Bearer).await;
    f.client.credentials().store("stale").unwrap();
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&f.server)
        .await;

    let message = f.client.logout().await.unwrap();
    assert_eq!(message, "already logged out");
    assert!(f.config.token_store().load().is_none());
}

#[tokio::test]
async fn logout_server_error_keeps_token() {
    let f = fixture(AuthMode::Bearer).await;
    f.client.credentials().store("tok").unwrap();
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&f.server)
        .await;

    let err = f.client.logout().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(f.config.token_store().load().as_deref(), Some("tok"));
}

#[tokio::test]
async fn notion_auth_url_is_returned() {
    let f = fixture(AuthMode::Bearer).await;
    Mock::given(method("GET"))
        .and(path("/api/auth/notion/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"url": "https://api.notion.com/v1/oauth/authorize?state=x"})))
        .mount(&f.server)
        .await;

    let url = f.client.notion_auth_url().await.unwrap();
    assert!(url.starts_with("https://api.notion.com/"));
}

#[tokio::test]
async fn notion_databases_listed() {
    let f = fixture(AuthMode::Bearer).await;
    Mock::given(method("GET"))
        .and(path("/api/notion/databases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "databases": [
                { "id": "db-1", "title": "Reading list", "url": "https://notion.so/db-1" },
                { "id": "db-2", "title": "Untitled", "url": "https://notion.so/db-2" }
            ]
        })))
        .mount(&f.server)
        .await;

    let databases = f.client.notion_databases().await.unwrap();
    assert_eq!(databases.len(), 2);
    assert_eq!(databases[0].title, "Reading list");
}

#[tokio::test]
async fn save_post_sends_body_and_reads_response() {
    let f = fixture(AuthMode::Bearer).await;
    let request = SavePostRequest {
        title: "Hello".to_string(),
        subreddit: "rust".to_string(),
        content: "body".to_string(),
        author: "ferris".to_string(),
        score: 10,
        url: "https://www.reddit.com/r/rust/comments/a/".to_string(),
        reddit_id: "a".to_string(),
        database_id: "db-1".to_string(),
    };

    Mock::given(method("POST"))
        .and(path("/api/notion/save"))
        .and(body_json(serde_json::to_value(&request).unwrap()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "notion_page_id": "page-1",
            "notion_page_url": "https://notion.so/page-1",
            "message": "Post saved to Notion successfully"
        })))
        .mount(&f.server)
        .await;

    let response = f.client.save_post(&request).await.unwrap();
    assert!(response.success);
    assert_eq!(response.notion_page_url, "https://notion.so/page-1");
}

#[tokio::test]
async fn save_post_from_builds_request_from_listed_post() {
    let f = fixture(AuthMode::Bearer).await;
    Mock::given(method("GET"))
        .and(path("/api/reddit/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "posts": [reddit_post("a")],
            "count": 1
        })))
        .mount(&f.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/notion/save"))
        .and(body_json(json!({
            "title": "Post a",
            "subreddit": "rust",
            "content": "body",
            "author": "ferris",
            "score": 10,
            "url": "https://www.reddit.com/r/rust/comments/a/",
            "reddit_id": "a",
            "database_id": "db-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "notion_page_id": "page-a",
            "notion_page_url": "https://notion.so/page-a",
            "message": "Post saved to Notion successfully"
        })))
        .expect(1)
        .mount(&f.server)
        .await;

    let posts = f.client.list_posts(&FilterCriteria::default()).await.unwrap();
    let response = f.client.save_post_from(&posts[0], "db-1").await.unwrap();
    assert_eq!(response.notion_page_url, "https://notion.so/page-a");
}

#[tokio::test]
async fn save_post_error_uses_server_message() {
    let f = fixture(AuthMode::Bearer).await;
    Mock::given(method("POST"))
        .and(path("/api/notion/save"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "Failed to save post to Notion",
            "details": "validation_error"
        })))
        .mount(&f.server)
        .await;

    let request = SavePostRequest {
        title: String::new(),
        subreddit: String::new(),
        content: String::new(),
        author: String::new(),
        score: 0,
        url: String::new(),
        reddit_id: "a".to_string(),
        database_id: "db-1".to_string(),
    };
    let err = f.client.save_post(&request).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to save post to Notion (HTTP 500)");
}

#[tokio::test]
async fn delete_saved_post_by_id() {
    let f = fixture(AuthMode::Bearer).await;
    Mock::given(method("DELETE"))
        .and(path("/api/notion/saved-posts/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&f.server)
        .await;

    f.client.delete_saved_post("abc").await.unwrap();
}

#[tokio::test]
async fn delete_missing_post_surfaces_not_found() {
    let f = fixture(AuthMode::Bearer).await;
    Mock::given(method("DELETE"))
        .and(path("/api/notion/saved-posts/zzz"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Post not found"})))
        .mount(&f.server)
        .await;

    let err = f.client.delete_saved_post("zzz").await.unwrap_err();
    match err {
        ApiError::Remote { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Post not found");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn delete_encodes_reserved_characters_in_id() {
    let f = fixture(AuthMode::Bearer).await;
    Mock::given(method("DELETE"))
        .and(path("/api/notion/saved-posts/a%2Fb%3Fx=1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&f.server)
        .await;

    f.client.delete_saved_post("a/b?x=1").await.unwrap();

    let requests = f.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.query().is_none());
}

#[tokio::test]
async fn delete_cannot_escape_saved_posts_path() {
    let f = fixture(AuthMode::Bearer).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&f.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/notion/saved-posts/..%2F..%2Fauth%2Flogout"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Post not found"})))
        .expect(1)
        .mount(&f.server)
        .await;

    let err = f.client.delete_saved_post("../../auth/logout").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn delete_rejects_blank_and_dot_ids_locally() {
    let f = fixture(AuthMode::Bearer).await;

    for id in ["  ", ".", ".."] {
        let err = f.client.delete_saved_post(id).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)), "id {:?}: {:?}", id, err);
    }

    let requests = f.server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn create_database_under_parent_page() {
    let f = fixture(AuthMode::Bearer).await;
    Mock::given(method("POST"))
        .and(path("/api/notion/create-database"))
        .and(body_json(json!({"parent_page_id": "page-9"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "database_id": "db-new",
            "database_url": "https://notion.so/db-new",
            "message": "Reddit Posts database created successfully"
        })))
        .mount(&f.server)
        .await;

    let created = f.client.create_database("page-9").await.unwrap();
    assert_eq!(created.database_id, "db-new");
}

#[tokio::test]
async fn cookie_mode_replays_session_cookie() {
    let f = fixture(AuthMode::Cookie).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/exchange-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "auth_token=session-1; Path=/; HttpOnly")
                .set_body_json(json!({ "user": { "id": 1 } })),
        )
        .mount(&f.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/user"))
        .and(header("cookie", "auth_token=session-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": { "id": 1 } })))
        .expect(1)
        .mount(&f.server)
        .await;

    f.client.exchange_token("short").await.unwrap();
    let user = f.client.current_user().await.unwrap();
    assert_eq!(user.map(|u| u.id), Some(1));

    // cookie 模式不写本地 token 文件
    assert!(f.config.token_store().load().is_none());
}
