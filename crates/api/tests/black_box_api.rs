use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;
use stockroom_auth::JwtClaims;
use stockroom_core::UserId;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        // No USE_PERSISTENT_STORES in the test env, so this is the
        // in-memory backend and every server starts empty.
        let app = stockroom_api::app::build_app(
            jwt_secret.to_string(),
            ChronoDuration::minutes(10),
        )
        .await
        .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, user_id: i64, name: &str) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: UserId::new(user_id),
        name: name.to_string(),
        iat: now.timestamp(),
        exp: (now + ChronoDuration::minutes(10)).timestamp(),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn register_and_login(client: &reqwest::Client, base_url: &str, username: &str) -> String {
    let res = client
        .post(format!("{}/auth/register", base_url))
        .json(&json!({ "username": username, "password": "correct horse battery" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(format!("{}/auth/login", base_url))
        .json(&json!({ "username": username, "password": "correct horse battery" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let client = reqwest::Client::new();
    for path in ["/whoami", "/inventory/items", "/inventory/moves"] {
        let res = client
            .get(format!("{}{}", srv.base_url, path))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "GET {path}");
    }
}

#[tokio::test]
async fn register_login_and_whoami_round_trip() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let token = register_and_login(&client, &srv.base_url, "alice").await;

    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["username"], "alice");
    assert!(body["user_id"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let _ = register_and_login(&client, &srv.base_url, "alice").await;

    let res = client
        .post(format!("{}/auth/register", srv.base_url))
        .json(&json!({ "username": "alice", "password": "another password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn bad_credentials_are_rejected() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let _ = register_and_login(&client, &srv.base_url, "alice").await;

    // Wrong password and unknown user look the same from outside.
    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "username": "alice", "password": "wrong password!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "username": "nobody", "password": "wrong password!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn actor_context_is_derived_from_token() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let token = mint_jwt(jwt_secret, 999, "ghost");

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user_id"], 999);
    assert_eq!(body["username"], "ghost");
}

#[tokio::test]
async fn inventory_lifecycle_create_merge_move_audit() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &srv.base_url, "alice").await;

    // Create
    let res = client
        .post(format!("{}/inventory/items", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Cable", "category": "USB", "quantity": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["merged"], false);
    let id = created["id"].as_str().unwrap().to_string();

    // Same catalog key (trimmed, case-insensitive) merges instead of inserting.
    let res = client
        .post(format!("{}/inventory/items", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "  cable ", "category": "usb", "quantity": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let merged: serde_json::Value = res.json().await.unwrap();
    assert_eq!(merged["merged"], true);
    assert_eq!(merged["id"].as_str().unwrap(), id);
    assert_eq!(merged["quantity"], 15);

    // An Out move beyond the current quantity is refused.
    let res = client
        .post(format!("{}/inventory/items/{}/move", srv.base_url, id))
        .bearer_auth(&token)
        .json(&json!({ "direction": "Out", "amount": 16 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // A valid Out move lands.
    let res = client
        .post(format!("{}/inventory/items/{}/move", srv.base_url, id))
        .bearer_auth(&token)
        .json(&json!({ "direction": "Out", "amount": 5, "reason": " damaged " }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let moved: serde_json::Value = res.json().await.unwrap();
    assert_eq!(moved["quantity"], 10);

    // Direction strings are exact.
    let res = client
        .post(format!("{}/inventory/items/{}/move", srv.base_url, id))
        .bearer_auth(&token)
        .json(&json!({ "direction": "out", "amount": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Listing carries the creator and the low-stock contract fields.
    let res = client
        .get(format!("{}/inventory/items", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let items: serde_json::Value = res.json().await.unwrap();
    assert_eq!(items.as_array().unwrap().len(), 1);
    assert_eq!(items[0]["added_by"], "alice");
    assert_eq!(items[0]["low_stock"], false);

    // The per-item trail is newest-first with the exact action strings.
    let res = client
        .get(format!("{}/inventory/items/{}/moves", srv.base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let trail: serde_json::Value = res.json().await.unwrap();
    let actions: Vec<&str> = trail["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert_eq!(
        actions,
        vec!["Out 5 (damaged)", "Added (merged) +5", "Added"]
    );
    assert_eq!(trail["entries"][0]["performed_by"], "alice");

    // The flat feed sees the same entries across items.
    let res = client
        .get(format!("{}/inventory/moves", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let feed: serde_json::Value = res.json().await.unwrap();
    assert_eq!(feed.as_array().unwrap().len(), 3);
    assert_eq!(feed[0]["item_name"], "Cable");
}

#[tokio::test]
async fn recycle_bin_delete_restore_purge() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &srv.base_url, "alice").await;

    let res = client
        .post(format!("{}/inventory/items", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Laptop", "category": "Electronics", "quantity": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    // Soft delete: gone from the active listing, visible in the bin.
    let res = client
        .delete(format!("{}/inventory/items/{}", srv.base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/inventory/items", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let items: serde_json::Value = res.json().await.unwrap();
    assert!(items.as_array().unwrap().is_empty());

    let res = client
        .get(format!("{}/inventory/items/deleted", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let bin: serde_json::Value = res.json().await.unwrap();
    assert_eq!(bin.as_array().unwrap().len(), 1);
    assert!(bin[0]["deleted_at"].is_string());

    // A second delete observes the item as already absent.
    let res = client
        .delete(format!("{}/inventory/items/{}", srv.base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Restore brings it back; restoring again conflicts.
    let res = client
        .put(format!("{}/inventory/items/{}/restore", srv.base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let restored: serde_json::Value = res.json().await.unwrap();
    assert!(restored["deleted_at"].is_null());

    let res = client
        .put(format!("{}/inventory/items/{}/restore", srv.base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Purge is terminal and replay returns NotFound.
    let res = client
        .delete(format!("{}/inventory/items/{}/permanent", srv.base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/inventory/items/deleted", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let bin: serde_json::Value = res.json().await.unwrap();
    assert!(bin.as_array().unwrap().is_empty());

    let res = client
        .delete(format!("{}/inventory/items/{}/permanent", srv.base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_ids_and_payloads_are_bad_requests() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &srv.base_url, "alice").await;

    let res = client
        .delete(format!("{}/inventory/items/not-a-uuid", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{}/inventory/items", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "   ", "category": "USB", "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{}/inventory/items", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Cable", "category": "USB", "quantity": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
