//! Drinks API end-to-end tests
//!
//! Drives the real router with the in-memory store and an HMAC key set.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;

use drinks_server::auth::{StaticKeySet, TokenVerifier, permissions};
use drinks_server::db::{DrinkStore, MemoryDrinkStore, RepoError, RepoResult};
use drinks_server::{ServerState, api};
use shared::{Drink, NewDrink};

const SECRET: &[u8] = b"integration-test-secret-0123456789";
const KID: &str = "test-key";
const ISSUER: &str = "https://drinks.test/";
const AUDIENCE: &str = "drinks";

/// Memory store that counts calls and can be told to fail writes
#[derive(Default)]
struct SpyStore {
    inner: MemoryDrinkStore,
    calls: AtomicUsize,
    fail_writes: AtomicBool,
}

impl SpyStore {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn write_guard(&self) -> RepoResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepoError::Connection("connection reset by peer".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DrinkStore for SpyStore {
    async fn list_all(&self) -> RepoResult<Vec<Drink>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_all().await
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Drink>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_id(id).await
    }

    async fn insert(&self, drink: NewDrink) -> RepoResult<Drink> {
        self.write_guard()?;
        self.inner.insert(drink).await
    }

    async fn update(&self, drink: &Drink) -> RepoResult<()> {
        self.write_guard()?;
        self.inner.update(drink).await
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        self.write_guard()?;
        self.inner.delete(id).await
    }
}

struct TestApp {
    router: Router,
    store: Arc<SpyStore>,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(SpyStore::default());
        let keys = StaticKeySet::new().with_secret(KID, SECRET);
        let verifier = Arc::new(TokenVerifier::new(Arc::new(keys), ISSUER, AUDIENCE));
        let state = ServerState::new(store.clone(), verifier);
        Self {
            router: api::router(state),
            store,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        self.send_request(builder.body(body).unwrap()).await
    }

    async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(&self, title: &str, recipe: Value) -> Value {
        let token = token(&[permissions::CREATE_ITEM]);
        let (status, body) = self
            .send(
                Method::POST,
                "/drinks",
                Some(&token),
                Some(json!({"title": title, "recipe": recipe})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["items"][0].clone()
    }
}

fn mint(claims: Value) -> String {
    mint_with_kid(KID, claims)
}

fn mint_with_kid(kid: &str, claims: Value) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(kid.to_string());
    encode(&header, &claims, &EncodingKey::from_secret(SECRET)).unwrap()
}

fn claims(permissions: &[&str]) -> Value {
    json!({
        "sub": "auth0|tester",
        "iss": ISSUER,
        "aud": AUDIENCE,
        "exp": Utc::now().timestamp() + 3600,
        "permissions": permissions,
    })
}

fn token(permissions: &[&str]) -> String {
    mint(claims(permissions))
}

fn raw_request(method: Method, uri: &str, token: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(body)
        .unwrap()
}

fn all_permissions() -> String {
    token(permissions::ALL_PERMISSIONS)
}

fn latte() -> Value {
    json!([
        {"name": "Espresso", "color": "brown", "parts": 1},
        {"name": "Milk", "color": "white", "parts": 3},
    ])
}

// ========== Listing ==========

#[tokio::test]
async fn test_empty_menu_lists_nothing() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/drinks", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "items": []}));
}

#[tokio::test]
async fn test_public_list_hides_ingredient_names() {
    let app = TestApp::new();
    app.create("Latte", latte()).await;

    let (status, body) = app.send(Method::GET, "/drinks", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let recipe = body["items"][0]["recipe"].as_array().unwrap();
    assert_eq!(recipe.len(), 2);
    for ingredient in recipe {
        assert!(ingredient.get("name").is_none());
        assert!(ingredient.get("color").is_some());
    }
}

#[tokio::test]
async fn test_detail_round_trips_recipe_in_order() {
    let app = TestApp::new();
    let created = app.create("Latte", latte()).await;

    let token = token(&[permissions::READ_DETAIL]);
    let (status, body) = app
        .send(Method::GET, "/drinks-detail", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["items"][0]["id"], created["id"]);
    assert_eq!(body["items"][0]["recipe"], latte());
}

#[tokio::test]
async fn test_detail_without_permission_is_rejected_before_store() {
    let app = TestApp::new();
    let token = token(&[permissions::CREATE_ITEM]);

    let (status, body) = app
        .send(Method::GET, "/drinks-detail", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "unauthorized");
    assert_eq!(body["success"], false);
    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn test_token_without_permissions_claim() {
    let app = TestApp::new();
    let token = mint(json!({
        "iss": ISSUER,
        "aud": AUDIENCE,
        "exp": Utc::now().timestamp() + 3600,
    }));
    let (status, body) = app
        .send(Method::GET, "/drinks-detail", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid_claims");
}

// ========== Authentication ==========

#[tokio::test]
async fn test_missing_header_is_401() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/drinks-detail", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "missing_header");
    assert_eq!(body["message"], "Authorization header is expected.");
}

#[tokio::test]
async fn test_three_part_header_is_invalid() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/drinks-detail")
        .header(header::AUTHORIZATION, "Bearer a b")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send_request(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid_header");
}

#[tokio::test]
async fn test_expired_token() {
    let app = TestApp::new();
    let token = mint(json!({
        "iss": ISSUER,
        "aud": AUDIENCE,
        "exp": Utc::now().timestamp() - 3600,
        "permissions": [permissions::READ_DETAIL],
    }));
    let (status, body) = app
        .send(Method::GET, "/drinks-detail", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "token_expired");
}

#[tokio::test]
async fn test_auth_runs_before_body_parsing() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/drinks")
        .body(Body::from("this is not json"))
        .unwrap();
    let (status, body) = app.send_request(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "missing_header");
}

#[tokio::test]
async fn test_wrong_audience_is_invalid_claims() {
    let app = TestApp::new();
    let mut claims = claims(&[permissions::READ_DETAIL]);
    claims["aud"] = json!("https://someone-else.test/api");
    let token = mint(claims);

    let (status, body) = app
        .send(Method::GET, "/drinks-detail", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid_claims");
    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn test_unknown_kid_is_invalid_header() {
    let app = TestApp::new();
    let token = mint_with_kid("rotated-away", claims(&[permissions::READ_DETAIL]));

    let (status, body) = app
        .send(Method::GET, "/drinks-detail", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid_header");
    assert_eq!(body["message"], "Unable to find the appropriate key.");
    assert_eq!(app.store.calls(), 0);
}

// ========== Create ==========

#[tokio::test]
async fn test_create_returns_long_projection() {
    let app = TestApp::new();
    let item = app
        .create("Water", json!([{"name": "Water", "color": "blue", "parts": 1}]))
        .await;
    assert!(item["id"].as_i64().is_some());
    assert_eq!(item["title"], "Water");
    assert_eq!(item["recipe"][0]["name"], "Water");
}

#[tokio::test]
async fn test_create_missing_recipe_is_400() {
    let app = TestApp::new();
    let token = token(&[permissions::CREATE_ITEM]);
    let (status, body) = app
        .send(Method::POST, "/drinks", Some(&token), Some(json!({"title": "X"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "bad request");
    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn test_create_non_object_body_is_400() {
    let app = TestApp::new();
    let token = token(&[permissions::CREATE_ITEM]);
    let (status, _) = app
        .send(Method::POST, "/drinks", Some(&token), Some(json!(["Water"])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_non_json_body_is_400() {
    let app = TestApp::new();
    let token = token(&[permissions::CREATE_ITEM]);
    let request = raw_request(Method::POST, "/drinks", &token, Body::from("not json"));
    let (status, body) = app.send_request(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn test_empty_body_is_400() {
    let app = TestApp::new();
    let created = app.create("Latte", latte()).await;
    let id = created["id"].as_i64().unwrap();
    let token = token(&[permissions::CREATE_ITEM, permissions::UPDATE_ITEM]);
    let calls = app.store.calls();

    let request = raw_request(Method::POST, "/drinks", &token, Body::empty());
    let (status, _) = app.send_request(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = raw_request(Method::PATCH, &format!("/drinks/{id}"), &token, Body::empty());
    let (status, _) = app.send_request(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.calls(), calls);
}

#[tokio::test]
async fn test_oversized_body_is_400() {
    let app = TestApp::new();
    let token = token(&[permissions::CREATE_ITEM]);
    let body = Body::from(vec![b' '; 3 * 1024 * 1024]);
    let (status, body) = app
        .send_request(raw_request(Method::POST, "/drinks", &token, body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "bad request");
    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn test_create_accepts_any_string_title() {
    let app = TestApp::new();
    let long_title = "Double ristretto ".repeat(6);
    assert!(long_title.len() > 80);

    let item = app.create(&long_title, latte()).await;
    assert_eq!(item["title"], long_title.as_str());

    let item = app.create("", json!([])).await;
    assert_eq!(item["title"], "");
}

#[tokio::test]
async fn test_fractional_parts_round_trip() {
    let app = TestApp::new();
    let recipe = json!([
        {"name": "Espresso", "color": "brown", "parts": 1},
        {"name": "Syrup", "color": "amber", "parts": 1.5},
    ]);
    let item = app.create("Sweet shot", recipe.clone()).await;
    assert_eq!(item["recipe"], recipe);

    let token = token(&[permissions::READ_DETAIL]);
    let (_, body) = app
        .send(Method::GET, "/drinks-detail", Some(&token), None)
        .await;
    assert_eq!(body["items"][0]["recipe"], recipe);

    let (_, body) = app.send(Method::GET, "/drinks", None, None).await;
    assert_eq!(body["items"][0]["recipe"][1], json!({"color": "amber", "parts": 1.5}));
}

#[tokio::test]
async fn test_create_malformed_recipe_is_422_without_store_call() {
    let app = TestApp::new();
    let token = token(&[permissions::CREATE_ITEM]);
    let (status, body) = app
        .send(
            Method::POST,
            "/drinks",
            Some(&token),
            Some(json!({"title": "Soup", "recipe": "hot water"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "unprocessable");
    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn test_create_duplicate_title_is_422() {
    let app = TestApp::new();
    app.create("Latte", latte()).await;

    let token = token(&[permissions::CREATE_ITEM]);
    let (status, _) = app
        .send(
            Method::POST,
            "/drinks",
            Some(&token),
            Some(json!({"title": "Latte", "recipe": []})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_create_store_failure_is_422() {
    let app = TestApp::new();
    app.store.fail_writes.store(true, Ordering::SeqCst);

    let token = token(&[permissions::CREATE_ITEM]);
    let (status, body) = app
        .send(
            Method::POST,
            "/drinks",
            Some(&token),
            Some(json!({"title": "Latte", "recipe": latte()})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "unprocessable");
}

// ========== Update ==========

#[tokio::test]
async fn test_update_unknown_id_is_404() {
    let app = TestApp::new();
    let token = token(&[permissions::UPDATE_ITEM]);
    let (status, body) = app
        .send(Method::PATCH, "/drinks/999", Some(&token), Some(json!({"title": "X"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], 404);
}

#[tokio::test]
async fn test_update_recipe_only() {
    let app = TestApp::new();
    let created = app.create("Latte", latte()).await;
    let id = created["id"].as_i64().unwrap();

    let recipe = json!([{"name": "Oat milk", "color": "beige", "parts": 4}]);
    let token = token(&[permissions::UPDATE_ITEM]);
    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/drinks/{id}"),
            Some(&token),
            Some(json!({"recipe": recipe})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["items"][0]["title"], "Latte");
    assert_eq!(body["items"][0]["recipe"], recipe);

    let stored = app.store.inner.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Latte");
}

#[tokio::test]
async fn test_update_store_failure_is_422() {
    let app = TestApp::new();
    let created = app.create("Latte", latte()).await;
    let id = created["id"].as_i64().unwrap();
    app.store.fail_writes.store(true, Ordering::SeqCst);

    let token = token(&[permissions::UPDATE_ITEM]);
    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/drinks/{id}"),
            Some(&token),
            Some(json!({"title": "Caffe latte"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "unprocessable");

    let stored = app.store.inner.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Latte");
}

#[tokio::test]
async fn test_update_title_keeps_recipe_bytes() {
    let app = TestApp::new();
    let created = app.create("Latte", latte()).await;
    let id = created["id"].as_i64().unwrap();
    let before = app.store.inner.find_by_id(id).await.unwrap().unwrap();

    let token = token(&[permissions::UPDATE_ITEM]);
    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/drinks/{id}"),
            Some(&token),
            Some(json!({"title": "Caffe latte"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["title"], "Caffe latte");

    let after = app.store.inner.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(after.recipe, before.recipe);
    assert_eq!(after.title, "Caffe latte");
}

#[tokio::test]
async fn test_update_needs_a_field() {
    let app = TestApp::new();
    let created = app.create("Latte", latte()).await;
    let id = created["id"].as_i64().unwrap();

    let token = token(&[permissions::UPDATE_ITEM]);
    let (status, _) = app
        .send(Method::PATCH, &format!("/drinks/{id}"), Some(&token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_non_integer_id_is_404() {
    let app = TestApp::new();
    let token = token(&[permissions::UPDATE_ITEM]);
    let (status, _) = app
        .send(Method::PATCH, "/drinks/latte", Some(&token), Some(json!({"title": "X"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ========== Delete ==========

#[tokio::test]
async fn test_delete_returns_id_and_removes_drink() {
    let app = TestApp::new();
    let created = app.create("Latte", latte()).await;
    let id = created["id"].as_i64().unwrap();

    let token = token(&[permissions::DELETE_ITEM]);
    let (status, body) = app
        .send(Method::DELETE, &format!("/drinks/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "deletedId": id}));

    let (_, body) = app.send(Method::GET, "/drinks", None, None).await;
    assert_eq!(body["items"], json!([]));
}

#[tokio::test]
async fn test_delete_unknown_id_is_404() {
    let app = TestApp::new();
    let token = token(&[permissions::DELETE_ITEM]);
    let (status, _) = app
        .send(Method::DELETE, "/drinks/41", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_store_failure_is_422() {
    let app = TestApp::new();
    let created = app.create("Latte", latte()).await;
    let id = created["id"].as_i64().unwrap();
    app.store.fail_writes.store(true, Ordering::SeqCst);

    let token = token(&[permissions::DELETE_ITEM]);
    let (status, _) = app
        .send(Method::DELETE, &format!("/drinks/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// ========== Routing ==========

#[tokio::test]
async fn test_wrong_method_is_405() {
    let app = TestApp::new();
    let token = all_permissions();
    let (status, body) = app
        .send(Method::PUT, "/drinks/1", Some(&token), Some(json!({"title": "X"})))
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["message"], "method not allowed");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/coffee", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
