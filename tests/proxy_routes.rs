mod support;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::json;
use storegate::cache::{CacheConfig, CacheKey};
use tower::ServiceExt;

use support::{HarnessBuilder, body_bytes, body_json, get, harness, header, json_request};

fn categories() -> serde_json::Value {
    json!([
        { "id": 15, "name": "Uncategorized" },
        { "id": 21, "name": "Shirts" }
    ])
}

#[tokio::test]
async fn categories_are_served_from_cache_byte_for_byte() {
    let h = harness();
    h.upstream
        .json(Method::GET, "/products/categories", StatusCode::OK, categories());

    let first = h.router.clone().oneshot(get("/api/categories")).await.expect("first");
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(header(&first, "x-cache"), Some("MISS"));
    assert_eq!(
        header(&first, "cache-control"),
        Some("public, s-maxage=900, stale-while-revalidate=1800")
    );
    let first_body = body_bytes(first).await;

    let second = h.router.clone().oneshot(get("/api/categories")).await.expect("second");
    assert_eq!(header(&second, "x-cache"), Some("HIT"));
    let second_body = body_bytes(second).await;

    assert_eq!(first_body, second_body);
    assert_eq!(h.upstream.call_count(), 1);

    let body: serde_json::Value = serde_json::from_slice(&first_body).expect("json");
    assert_eq!(body["success"], true);
    assert_eq!(body["categoryCount"], 2);
    assert_eq!(body["categories"][1]["name"], "Shirts");

    let call = &h.upstream.calls()[0];
    let query = call.url.query().unwrap_or_default();
    assert!(query.contains("per_page=100"));
    assert!(query.contains("consumer_key=ck_test"));
}

#[tokio::test]
async fn upstream_not_found_is_forwarded_and_not_cached() {
    let h = harness();
    h.upstream
        .text(Method::GET, "/products/999", StatusCode::NOT_FOUND, "Invalid ID");

    for _ in 0..2 {
        let response = h
            .router
            .clone()
            .oneshot(get("/api/products/999"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(header(&response, "cache-control"), Some("no-store"));
        let body = body_json(response).await;
        assert_eq!(body["error"], "Failed to fetch product: Not Found");
        assert_eq!(body["details"], "Invalid ID");
    }

    assert_eq!(h.upstream.call_count(), 2);
    let stores = h.state.catalog.stores().expect("cache enabled");
    assert!(stores.products.get(&CacheKey::product(999)).is_none());
}

#[tokio::test]
async fn product_query_id_and_path_id_share_a_cache_entry() {
    let h = harness();
    h.upstream.json(
        Method::GET,
        "/products/42",
        StatusCode::OK,
        json!({ "id": 42, "name": "Mug" }),
    );

    let by_path = h.router.clone().oneshot(get("/api/products/42")).await.expect("path");
    assert_eq!(header(&by_path, "x-cache"), Some("MISS"));
    let body = body_json(by_path).await;
    assert_eq!(body["product"]["name"], "Mug");

    let by_query = h
        .router
        .clone()
        .oneshot(get("/api/products?id=42"))
        .await
        .expect("query");
    assert_eq!(header(&by_query, "x-cache"), Some("HIT"));
    assert_eq!(h.upstream.call_count(), 1);
}

#[tokio::test]
async fn list_values_with_reserved_characters_get_their_own_cache_entry() {
    let h = harness();
    h.upstream
        .json(Method::GET, "/products", StatusCode::OK, json!([]));

    let smuggled = h
        .router
        .clone()
        .oneshot(get("/api/products?category=5%26search%3Dx"))
        .await
        .expect("smuggled");
    assert_eq!(header(&smuggled, "x-cache"), Some("MISS"));
    assert_eq!(body_json(smuggled).await["productCount"], 0);

    h.upstream
        .json(Method::GET, "/products", StatusCode::OK, json!([{ "id": 1 }]));
    let separate = h
        .router
        .clone()
        .oneshot(get("/api/products?category=5&search=x"))
        .await
        .expect("separate");
    assert_eq!(header(&separate, "x-cache"), Some("MISS"));
    assert_eq!(body_json(separate).await["productCount"], 1);

    assert_eq!(h.upstream.call_count(), 2);
    let stores = h.state.catalog.stores().expect("cache enabled");
    assert_eq!(stores.products.len(), 2);
}

#[tokio::test]
async fn invalid_product_ids_are_rejected_without_upstream_calls() {
    let h = harness();

    for uri in ["/api/products/abc", "/api/products?id=-3", "/api/products/0/variations"] {
        let response = h.router.clone().oneshot(get(uri)).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid product ID");
    }
    assert_eq!(h.upstream.call_count(), 0);
}

#[tokio::test]
async fn product_list_forwards_filters_and_rejects_bad_paging() {
    let h = harness();
    h.upstream.json(
        Method::GET,
        "/products",
        StatusCode::OK,
        json!([{ "id": 1 }, { "id": 2 }, { "id": 3 }]),
    );

    let response = h
        .router
        .clone()
        .oneshot(get("/api/products?category=21&per_page=3&featured=true"))
        .await
        .expect("list");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["productCount"], 3);

    let query = h.upstream.calls()[0].url.query().unwrap_or_default().to_string();
    assert!(query.contains("category=21"));
    assert!(query.contains("per_page=3"));
    assert!(query.contains("featured=true"));
    assert!(!query.contains("search="));

    let response = h
        .router
        .clone()
        .oneshot(get("/api/products?per_page=500"))
        .await
        .expect("bad paging");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(h.upstream.call_count(), 1);
}

#[tokio::test]
async fn malformed_query_string_becomes_bad_request_envelope() {
    let h = harness();
    let response = h
        .router
        .clone()
        .oneshot(get("/api/products?page=first"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(header(&response, "cache-control"), Some("no-store"));
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid request");
    assert_eq!(h.upstream.call_count(), 0);
}

#[tokio::test]
async fn missing_credentials_fail_before_any_upstream_call() {
    let h = HarnessBuilder::default().without_credentials().build();

    for uri in ["/api/categories", "/api/products", "/api/products/7/variations"] {
        let response = h.router.clone().oneshot(get(uri)).await.expect("response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(header(&response, "cache-control"), Some("no-store"));
        let body = body_json(response).await;
        assert_eq!(body["error"], "Missing WooCommerce credentials");
    }
    assert_eq!(h.upstream.call_count(), 0);
}

#[tokio::test]
async fn entries_expire_after_their_family_ttl() {
    let h = harness();
    h.upstream.json(
        Method::GET,
        "/products/5/variations",
        StatusCode::OK,
        json!([{ "id": 50 }]),
    );

    let first = h
        .router
        .clone()
        .oneshot(get("/api/products/5/variations"))
        .await
        .expect("first");
    assert_eq!(header(&first, "x-cache"), Some("MISS"));
    let body = body_json(first).await;
    assert_eq!(body["productId"], 5);
    assert_eq!(body["variationCount"], 1);

    h.clock.advance(Duration::from_secs(599));
    let fresh = h
        .router
        .clone()
        .oneshot(get("/api/products/5/variations"))
        .await
        .expect("fresh");
    assert_eq!(header(&fresh, "x-cache"), Some("HIT"));

    h.clock.advance(Duration::from_secs(1));
    let stale = h
        .router
        .clone()
        .oneshot(get("/api/products/5/variations"))
        .await
        .expect("stale");
    assert_eq!(header(&stale, "x-cache"), Some("MISS"));
    assert_eq!(h.upstream.call_count(), 2);
}

#[tokio::test]
async fn concurrent_misses_both_fetch_and_leave_one_entry() {
    let h = harness();
    h.upstream
        .json(Method::GET, "/products/categories", StatusCode::OK, categories());
    h.upstream.rendezvous(2);

    let (left, right) = tokio::join!(
        h.router.clone().oneshot(get("/api/categories")),
        h.router.clone().oneshot(get("/api/categories")),
    );
    let left = left.expect("left");
    let right = right.expect("right");
    assert_eq!(header(&left, "x-cache"), Some("MISS"));
    assert_eq!(header(&right, "x-cache"), Some("MISS"));
    assert_eq!(body_bytes(left).await, body_bytes(right).await);

    assert_eq!(h.upstream.call_count(), 2);
    let stores = h.state.catalog.stores().expect("cache enabled");
    assert_eq!(stores.categories.len(), 1);
}

#[tokio::test]
async fn server_failures_are_replayed_for_the_failure_ttl() {
    let h = HarnessBuilder::default()
        .cache(CacheConfig {
            failure_ttl: Duration::from_secs(30),
            ..CacheConfig::default()
        })
        .build();
    h.upstream.timeout(Method::GET, "/products/categories");

    let first = h.router.clone().oneshot(get("/api/categories")).await.expect("first");
    assert_eq!(first.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header(&first, "x-cache"), Some("MISS"));

    let replay = h.router.clone().oneshot(get("/api/categories")).await.expect("replay");
    assert_eq!(replay.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header(&replay, "x-cache"), Some("HIT"));
    assert_eq!(header(&replay, "cache-control"), Some("no-store"));
    let body = body_json(replay).await;
    assert_eq!(body["error"], "Failed to fetch categories");
    assert_eq!(h.upstream.call_count(), 1);

    h.upstream
        .json(Method::GET, "/products/categories", StatusCode::OK, categories());
    h.clock.advance(Duration::from_secs(30));
    let recovered = h
        .router
        .clone()
        .oneshot(get("/api/categories"))
        .await
        .expect("recovered");
    assert_eq!(recovered.status(), StatusCode::OK);
    assert_eq!(h.upstream.call_count(), 2);
}

#[tokio::test]
async fn disabled_cache_bypasses_every_read() {
    let h = HarnessBuilder::default()
        .cache(CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        })
        .build();
    h.upstream
        .json(Method::GET, "/products/categories", StatusCode::OK, categories());

    for _ in 0..2 {
        let response = h
            .router
            .clone()
            .oneshot(get("/api/categories"))
            .await
            .expect("response");
        assert_eq!(header(&response, "x-cache"), Some("BYPASS"));
    }
    assert_eq!(h.upstream.call_count(), 2);
    assert!(h.state.catalog.stores().is_none());
}

#[tokio::test]
async fn stock_update_invalidates_the_cached_product() {
    let h = harness();
    h.upstream.json(
        Method::GET,
        "/products/42",
        StatusCode::OK,
        json!({ "id": 42, "stock_quantity": 3 }),
    );
    h.upstream.json(
        Method::PUT,
        "/products/42",
        StatusCode::OK,
        json!({ "id": 42, "stock_quantity": 9, "stock_status": "instock" }),
    );

    h.router.clone().oneshot(get("/api/products/42")).await.expect("warm");
    let stores = h.state.catalog.stores().expect("cache enabled");
    assert!(stores.products.get(&CacheKey::product(42)).is_some());

    let response = h
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/products/update-stock",
            json!({ "productId": 42, "stockQuantity": 9 }),
        ))
        .await
        .expect("update");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "cache-control"), Some("no-store"));
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["stockQuantity"], 9);
    assert_eq!(body["stockStatus"], "instock");

    assert!(stores.products.get(&CacheKey::product(42)).is_none());
    let put = h
        .upstream
        .calls()
        .into_iter()
        .find(|call| call.method == Method::PUT)
        .expect("put call");
    assert_eq!(
        put.body,
        Some(json!({ "manage_stock": true, "stock_quantity": 9 }))
    );
}

#[tokio::test]
async fn stock_update_requires_both_fields() {
    let h = harness();
    let response = h
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/products/update-stock",
            json!({ "productId": 42 }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Product ID and stock quantity are required");

    let response = h
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/products/update-stock",
            json!({ "productId": 0, "stockQuantity": 5 }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid product ID");
    assert_eq!(h.upstream.call_count(), 0);
}

#[tokio::test]
async fn login_maps_upstream_rejection_to_unauthorized() {
    let h = harness();
    h.upstream.json(
        Method::POST,
        "/jwt-auth/v1/token",
        StatusCode::FORBIDDEN,
        json!({ "code": "[jwt_auth] incorrect_password", "message": "<strong>Error:</strong> Invalid credentials" }),
    );

    let response = h
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/login",
            json!({ "email": "a@b.com", "password": "wrong" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(header(&response, "cache-control"), Some("no-store"));
    let body = body_json(response).await;
    assert_eq!(body["error"], "Error: Invalid credentials");

    let call = &h.upstream.calls()[0];
    assert_eq!(call.url.host_str(), Some("id.test"));
    assert_eq!(
        call.body,
        Some(json!({ "username": "a@b.com", "password": "wrong" }))
    );
}

#[tokio::test]
async fn login_with_wrong_password_surfaces_upstream_message() {
    let h = harness();
    h.upstream.json(
        Method::POST,
        "/jwt-auth/v1/token",
        StatusCode::UNAUTHORIZED,
        json!({ "message": "Invalid credentials" }),
    );

    let response = h
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/login",
            json!({ "email": "a@b.com", "password": "wrong" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid credentials");
}

#[tokio::test]
async fn login_without_password_never_calls_upstream() {
    let h = harness();
    let response = h
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/login",
            json!({ "email": "a@b.com" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Email and password are required"
    );
    assert_eq!(h.upstream.call_count(), 0);
}

#[tokio::test]
async fn register_creates_customer_with_email_as_username() {
    let h = harness();
    h.upstream.json(
        Method::POST,
        "/wc/v3/customers",
        StatusCode::CREATED,
        json!({ "id": 77, "email": "new@b.com", "first_name": "New", "last_name": "Buyer" }),
    );

    let response = h
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/register",
            json!({ "email": "new@b.com", "password": "pw", "firstName": "New", "lastName": "Buyer" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["customer"]["id"], 77);
    assert_eq!(body["customer"]["firstName"], "New");

    let call = &h.upstream.calls()[0];
    let sent = call.body.as_ref().expect("json body");
    assert_eq!(sent["username"], "new@b.com");
    assert_eq!(sent["first_name"], "New");
}

#[tokio::test]
async fn register_rejection_keeps_upstream_status_and_message() {
    let h = harness();
    h.upstream.json(
        Method::POST,
        "/wc/v3/customers",
        StatusCode::BAD_REQUEST,
        json!({
            "code": "registration-error-email-exists",
            "message": "An account is already registered with your email address. <a href=\"#\">Please log in.</a>"
        }),
    );

    let response = h
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/register",
            json!({ "email": "taken@b.com", "password": "pw" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(header(&response, "cache-control"), Some("no-store"));
    assert_eq!(
        body_json(response).await["error"],
        "An account is already registered with your email address. Please log in."
    );
}

#[tokio::test]
async fn login_success_returns_token_and_user() {
    let h = harness();
    h.upstream.json(
        Method::POST,
        "/jwt-auth/v1/token",
        StatusCode::OK,
        json!({
            "token": "jwt.token.value",
            "user_email": "a@b.com",
            "user_nicename": "ab",
            "user_display_name": "A B"
        }),
    );

    let response = h
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/login",
            json!({ "email": "a@b.com", "password": "secret" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["token"], "jwt.token.value");
    assert_eq!(body["user"]["email"], "a@b.com");
}

#[tokio::test]
async fn validate_without_token_is_a_bad_request() {
    let h = harness();
    let response = h
        .router
        .clone()
        .oneshot(json_request(Method::POST, "/api/auth/validate", json!({})))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["error"], "Token is required");
}

#[tokio::test]
async fn validate_sends_bearer_token() {
    let h = harness();
    h.upstream.json(
        Method::POST,
        "/jwt-auth/v1/token/validate",
        StatusCode::OK,
        json!({ "code": "jwt_auth_valid_token", "data": { "status": 200 } }),
    );

    let response = h
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/validate",
            json!({ "token": "abc" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["data"]["status"], 200);
    assert_eq!(h.upstream.calls()[0].bearer.as_deref(), Some("abc"));
}

#[tokio::test]
async fn validate_maps_upstream_rejection_to_unauthorized() {
    let h = harness();
    h.upstream.json(
        Method::POST,
        "/jwt-auth/v1/token/validate",
        StatusCode::FORBIDDEN,
        json!({ "code": "jwt_auth_invalid_token", "message": "Expired token" }),
    );

    let response = h
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/validate",
            json!({ "token": "stale" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["error"], "Expired token");
    assert!(body.get("data").is_none_or(|data| data.is_null()));
}

#[tokio::test]
async fn customer_update_forwards_changes() {
    let h = harness();
    h.upstream.json(
        Method::PUT,
        "/customers/12",
        StatusCode::OK,
        json!({ "id": 12, "first_name": "Renamed" }),
    );

    let response = h
        .router
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/api/customer/12",
            json!({ "first_name": "Renamed" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "cache-control"), Some("no-store"));
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["customer"]["first_name"], "Renamed");

    let call = &h.upstream.calls()[0];
    assert_eq!(call.method, Method::PUT);
    assert_eq!(call.body, Some(json!({ "first_name": "Renamed" })));
}

#[tokio::test]
async fn customer_update_passes_upstream_errors_through() {
    let h = harness();
    h.upstream.text(
        Method::PUT,
        "/customers/12",
        StatusCode::NOT_FOUND,
        "Invalid resource ID.",
    );

    let response = h
        .router
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/api/customer/12",
            json!({ "first_name": "Renamed" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Failed to update customer: Not Found");
    assert_eq!(body["details"], "Invalid resource ID.");
}

#[tokio::test]
async fn customer_update_requires_an_object() {
    let h = harness();
    let response = h
        .router
        .clone()
        .oneshot(json_request(Method::PUT, "/api/customer/12", json!([1, 2])))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Customer update must be a JSON object");
    assert_eq!(h.upstream.call_count(), 0);
}

#[tokio::test]
async fn customer_lookup_is_never_cached() {
    let h = harness();
    h.upstream.json(
        Method::GET,
        "/customers/12",
        StatusCode::OK,
        json!({ "id": 12, "email": "a@b.com" }),
    );

    let response = h
        .router
        .clone()
        .oneshot(get("/api/customer/12"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "cache-control"), Some("no-store"));
    assert!(header(&response, "x-cache").is_none());
    let body = body_json(response).await;
    assert_eq!(body["customer"]["email"], "a@b.com");
}

#[tokio::test]
async fn file_proxy_serves_documents_with_validators() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(dir.path().join("manuals")).expect("category dir");
    std::fs::write(dir.path().join("manuals/guide.pdf"), b"%PDF-1.7 guide").expect("write");
    let h = HarnessBuilder::default()
        .documents(dir.path().to_path_buf())
        .build();

    let response = h
        .router
        .clone()
        .oneshot(get("/api/file-proxy?file=guide.pdf&category=manuals"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "content-type"), Some("application/pdf"));
    assert_eq!(header(&response, "cache-control"), Some("public, max-age=3600"));
    let etag = header(&response, "etag").expect("etag").to_string();
    assert_eq!(&body_bytes(response).await[..], b"%PDF-1.7 guide");

    let revalidated = h
        .router
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .uri("/api/file-proxy?file=guide.pdf&category=manuals")
                .header("if-none-match", etag.as_str())
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("revalidated");
    assert_eq!(revalidated.status(), StatusCode::NOT_MODIFIED);
    assert!(body_bytes(revalidated).await.is_empty());
}

#[tokio::test]
async fn file_proxy_rejects_missing_and_traversing_names() {
    let dir = tempfile::tempdir().expect("tempdir");
    let h = HarnessBuilder::default()
        .documents(dir.path().to_path_buf())
        .build();

    let missing = h.router.clone().oneshot(get("/api/file-proxy")).await.expect("missing");
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(missing).await["error"], "File parameter is required");

    let traversal = h
        .router
        .clone()
        .oneshot(get("/api/file-proxy?file=..&category=manuals"))
        .await
        .expect("traversal");
    assert_eq!(traversal.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(traversal).await["error"], "Invalid file path");

    let absent = h
        .router
        .clone()
        .oneshot(get("/api/file-proxy?file=nope.pdf"))
        .await
        .expect("absent");
    assert_eq!(absent.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let h = harness();

    let health = h.router.clone().oneshot(get("/_health")).await.expect("health");
    assert_eq!(health.status(), StatusCode::NO_CONTENT);
    assert!(header(&health, "x-request-id").is_some());

    let unknown = h.router.clone().oneshot(get("/api/nope")).await.expect("unknown");
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(unknown).await["error"], "Not found");
}
