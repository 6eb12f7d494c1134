//! End-to-end tests of the axum router with the local repository.

mod support;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use dealership::db::repositories::LocalRepository;
use dealership::db::repository::{AccountRepository, FullRepository};
use dealership::http::{create_router, AppState};
use dealership::models::Session;
use dealership::services::{DealerDirectory, UpstreamError};

struct StubDirectory;

#[async_trait]
impl DealerDirectory for StubDirectory {
    async fn fetch_dealers(&self, state: Option<&str>) -> Result<Value, UpstreamError> {
        Ok(json!([{"id": 1, "state": state.unwrap_or("Kansas")}]))
    }

    async fn fetch_dealer(&self, dealer_id: i64) -> Result<Value, UpstreamError> {
        Err(UpstreamError::Status {
            url: format!("http://dealers/fetchDealer/{}", dealer_id),
            status: 500,
        })
    }

    async fn fetch_reviews(&self, _dealer_id: i64) -> Result<Vec<Value>, UpstreamError> {
        Ok(vec![json!({"review": "Fantastic services"})])
    }

    async fn analyze_sentiment(&self, _text: &str) -> Result<String, UpstreamError> {
        Ok("positive".to_string())
    }

    async fn post_review(&self, _review: &Value) -> Result<Value, UpstreamError> {
        Ok(json!({}))
    }
}

struct TestApp {
    router: Router,
    repo: Arc<LocalRepository>,
}

impl TestApp {
    fn new() -> Self {
        let repo = Arc::new(LocalRepository::new());
        let state = AppState::new(
            repo.clone() as Arc<dyn FullRepository>,
            Arc::new(StubDirectory),
        );
        Self {
            router: create_router(state),
            repo,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<&str>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = request
            .body(Body::from(body.unwrap_or_default().to_string()))
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn register(&self, username: &str) -> String {
        let body = json!({"username": username, "password": "pw"}).to_string();
        let (status, json) = self
            .send(Method::POST, "/api/register/", Some(&body), None)
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", json);
        json["token"].as_str().unwrap().to_string()
    }

    async fn first_car_id(&self) -> i64 {
        let (_, json) = self.send(Method::GET, "/api/cars/", None, None).await;
        json["cars"][0]["id"].as_i64().unwrap()
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, json) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "connected");
}

#[tokio::test]
async fn test_listing_seeds_catalogue() {
    let app = TestApp::new();
    let (status, json) = app.send(Method::GET, "/api/cars/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cars"].as_array().unwrap().len(), 21);
    assert!(json["cars"][0].get("is_favorite").is_none());
    assert_eq!(json["filters"]["price"]["max"], 3_900_000.0);

    let (_, json) = app
        .send(Method::GET, "/api/cars/?brand=Ferrari&price_max=300000", None, None)
        .await;
    let cars = json["cars"].as_array().unwrap();
    assert_eq!(cars.len(), 1);
    assert_eq!(cars[0]["name"], "F8 Tributo");
    assert_eq!(json["filters"]["brands"].as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn test_car_detail_and_missing_car() {
    let app = TestApp::new();
    let car_id = app.first_car_id().await;

    let (status, json) = app
        .send(Method::GET, &format!("/api/cars/{}/", car_id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["car"]["description"].is_string());

    let (status, json) = app.send(Method::GET, "/api/cars/9999/", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert!(json["error"].is_string());

    let (status, _) = app.send(Method::GET, "/api/cars/abc/", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_path_and_wrong_method_are_json() {
    let app = TestApp::new();
    let (status, json) = app.send(Method::GET, "/api/nothing/", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");

    let (status, json) = app.send(Method::POST, "/api/cars/", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json["code"], "METHOD_NOT_ALLOWED");

    let (status, _) = app.send(Method::GET, "/api/logout/", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_register_login_logout() {
    let app = TestApp::new();
    let body = json!({"userName": "ana", "password": "pw", "firstName": "Ana"}).to_string();
    let (status, json) = app
        .send(Method::POST, "/api/register/", Some(&body), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["user"]["full_name"], "Ana");

    let (status, json) = app
        .send(Method::POST, "/api/register/", Some(&body), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");

    let (status, _) = app
        .send(Method::POST, "/api/register/", Some("{oops"), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let bad = json!({"username": "ana", "password": "wrong"}).to_string();
    let (status, _) = app.send(Method::POST, "/api/login/", Some(&bad), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let good = json!({"username": "ana", "password": "pw"}).to_string();
    let (status, json) = app.send(Method::POST, "/api/login/", Some(&good), None).await;
    assert_eq!(status, StatusCode::OK);
    let token = json["token"].as_str().unwrap().to_string();

    let (status, _) = app
        .send(Method::GET, "/api/user/profile/", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = app
        .send(Method::DELETE, "/api/logout/", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");

    let (status, _) = app
        .send(Method::GET, "/api/user/profile/", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send(Method::POST, "/api/logout/", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_session_cookie_authenticates() {
    let app = TestApp::new();
    let token = app.register("ana").await;

    let request = Request::builder()
        .uri("/api/user/profile/")
        .header(header::COOKIE, format!("sessionid={}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_cookie_carries_session_lifetime() {
    let app = TestApp::new();
    app.register("ana").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/login/")
        .body(Body::from(r#"{"username": "ana", "password": "pw"}"#))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.contains("Max-Age=1209600"), "{}", cookie);
}

#[tokio::test]
async fn test_expired_session_is_signed_out() {
    let app = TestApp::new();
    app.register("ana").await;
    let user = app.repo.find_user_by_username("ana").await.unwrap().unwrap();
    app.repo
        .create_session(&Session {
            token: "stale".to_string(),
            user_id: user.id,
            created_at: Utc::now() - chrono::Duration::days(15),
        })
        .await
        .unwrap();

    let (status, _) = app
        .send(Method::GET, "/api/user/profile/", None, Some("stale"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(app.repo.find_session("stale").await.unwrap().is_none());
}

#[tokio::test]
async fn test_comment_endpoints() {
    let app = TestApp::new();
    let car_id = app.first_car_id().await;
    let ana = app.register("ana").await;
    let bia = app.register("bia").await;
    let comments_uri = format!("/api/cars/{}/comments/", car_id);

    // Car existence is checked before authentication.
    let (status, _) = app
        .send(Method::POST, "/api/cars/9999/comments/", Some(r#"{"content": "x"}"#), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(Method::POST, &comments_uri, Some(r#"{"content": "x"}"#), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app
        .send(Method::POST, &comments_uri, Some("{broken"), Some(&ana))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid JSON");

    let (status, _) = app
        .send(Method::POST, &comments_uri, Some(r#"{"content": "   "}"#), Some(&ana))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(Method::POST, &comments_uri, Some(""), Some(&ana))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = app
        .send(Method::POST, &comments_uri, Some(r#"{"content": "Love it"}"#), Some(&ana))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let c1 = json["comment"]["id"].as_i64().unwrap();
    assert_eq!(json["comment"]["replies"], json!([]));
    assert_eq!(json["comment"]["can_edit"], true);

    let reply = json!({"content": "Same", "parent_id": c1}).to_string();
    let (status, json) = app
        .send(Method::POST, &comments_uri, Some(&reply), Some(&bia))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let c2 = json["comment"]["id"].as_i64().unwrap();

    let orphan = json!({"content": "Lost", "parent_id": 9999}).to_string();
    let (status, _) = app
        .send(Method::POST, &comments_uri, Some(&orphan), Some(&bia))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = app.send(Method::GET, &comments_uri, None, Some(&ana)).await;
    assert_eq!(status, StatusCode::OK);
    let roots = json["comments"].as_array().unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["replies"][0]["id"], c2);
    assert_eq!(roots[0]["author"]["display_name"], "ana");

    let detail_uri = format!("/api/cars/{}/comments/{}/", car_id, c1);
    let (status, json) = app.send(Method::GET, &detail_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["comment"]["replies"], json!([]));
    assert_eq!(json["comment"]["can_edit"], false);

    let (status, _) = app
        .send(Method::GET, &format!("/api/cars/{}/comments/{}/", car_id + 1, c1), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(Method::PUT, &detail_uri, Some(r#"{"content": "Mine now"}"#), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(Method::PATCH, &detail_uri, Some(r#"{"content": "Mine now"}"#), Some(&bia))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app
        .send(Method::PATCH, &detail_uri, Some(r#"{"content": "Edited"}"#), Some(&ana))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["comment"]["content"], "Edited");

    let (status, _) = app.send(Method::DELETE, &detail_uri, None, Some(&bia)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app.send(Method::DELETE, &detail_uri, None, Some(&ana)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "deleted");
    assert_eq!(app.repo.comment_count(), 0);
}

#[tokio::test]
async fn test_toggle_endpoints() {
    let app = TestApp::new();
    let car_id = app.first_car_id().await;
    let favorite_uri = format!("/api/cars/{}/favorite/", car_id);

    let (status, _) = app.send(Method::POST, &favorite_uri, None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let ana = app.register("ana").await;
    let (status, json) = app.send(Method::POST, &favorite_uri, None, Some(&ana)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"favorited": true, "favorites": 1}));

    let (_, json) = app.send(Method::GET, "/api/cars/", None, Some(&ana)).await;
    let car = json["cars"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["id"] == car_id)
        .unwrap();
    assert_eq!(car["is_favorite"], true);
    assert_eq!(car["favorite_count"], 1);

    let (_, json) = app.send(Method::POST, &favorite_uri, None, Some(&ana)).await;
    assert_eq!(json, json!({"favorited": false, "favorites": 0}));

    let (status, _) = app
        .send(Method::POST, "/api/cars/9999/favorite/", None, Some(&ana))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, json) = app
        .send(
            Method::POST,
            &format!("/api/cars/{}/comments/", car_id),
            Some(r#"{"content": "Like me"}"#),
            Some(&ana),
        )
        .await;
    let comment_id = json["comment"]["id"].as_i64().unwrap();
    let like_uri = format!("/api/comments/{}/like/", comment_id);

    let (_, json) = app.send(Method::POST, &like_uri, None, Some(&ana)).await;
    assert_eq!(json, json!({"liked": true, "likes": 1}));
    let (_, json) = app.send(Method::POST, &like_uri, None, Some(&ana)).await;
    assert_eq!(json, json!({"liked": false, "likes": 0}));

    let (status, _) = app
        .send(Method::POST, "/api/comments/9999/like/", None, Some(&ana))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_legacy_endpoints() {
    let app = TestApp::new();

    let (status, json) = app.send(Method::GET, "/djangoapp/get_cars", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["CarModels"].as_array().unwrap().len(), 21);

    let (_, json) = app.send(Method::GET, "/djangoapp/get_dealers", None, None).await;
    assert_eq!(json["status"], 200);
    assert_eq!(json["dealers"][0]["state"], "Kansas");

    let (_, json) = app
        .send(Method::GET, "/djangoapp/get_dealers/Texas", None, None)
        .await;
    assert_eq!(json["dealers"][0]["state"], "Texas");

    let (_, json) = app
        .send(Method::GET, "/djangoapp/reviews/dealer/15", None, None)
        .await;
    assert_eq!(json["reviews"][0]["sentiment"], "positive");

    let (status, json) = app.send(Method::GET, "/djangoapp/dealer/15", None, None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "UPSTREAM_ERROR");

    let (status, json) = app
        .send(Method::POST, "/djangoapp/add_review", Some("{}"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json, json!({"status": 403, "message": "Unauthorized"}));

    let token = app.register("ana").await;
    let (_, json) = app
        .send(Method::POST, "/djangoapp/add_review", Some("not json"), Some(&token))
        .await;
    assert_eq!(json["status"], 400);

    let (status, json) = app
        .send(
            Method::POST,
            "/djangoapp/add_review",
            Some(r#"{"dealership": 15, "review": "Great"}"#),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"status": 200}));
}

#[tokio::test]
async fn test_staff_user_can_moderate_over_http() {
    let app = TestApp::new();
    let car_id = app.first_car_id().await;
    let ana = app.register("ana").await;
    support::create_user(app.repo.as_ref(), "moderator", true).await;
    let login = json!({"username": "moderator", "password": support::PASSWORD}).to_string();
    let (_, json) = app.send(Method::POST, "/api/login/", Some(&login), None).await;
    let staff = json["token"].as_str().unwrap().to_string();

    let (_, json) = app
        .send(
            Method::POST,
            &format!("/api/cars/{}/comments/", car_id),
            Some(r#"{"content": "spam"}"#),
            Some(&ana),
        )
        .await;
    let comment_id = json["comment"]["id"].as_i64().unwrap();

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/cars/{}/comments/{}/", car_id, comment_id),
            None,
            Some(&staff),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}
