//! Integration tests for the OAuth callback against a local Shopify stand-in.
//!
//! These tests require a running `PostgreSQL` database reachable through
//! `DATABASE_URL`.

use std::collections::BTreeMap;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use cart_survey_app::db::ShopRepository;
use cart_survey_app::routes::router;
use cart_survey_app::shopify::hmac::sign;
use cart_survey_core::ShopDomain;
use cart_survey_integration_tests::{
    TEST_CLIENT_SECRET, test_pool, test_state_with_api_origin, unique_domain,
};
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

/// Serve a Shopify stand-in that issues a token and shop metadata, and
/// answers script tag registration with `script_status`.
async fn spawn_shopify(shop_id: &str, script_status: StatusCode) -> String {
    let shop = json!({ "shop": { "id": shop_id, "name": "Callback Store" } });
    let app = Router::new()
        .route(
            "/admin/oauth/access_token",
            post(|| async { Json(json!({ "access_token": "shpat_fresh" })) }),
        )
        .route(
            "/admin/api/2024-01/shop.json",
            get(move || async move { Json(shop) }),
        )
        .route(
            "/admin/api/2024-01/script_tags.json",
            post(move |Json(_): Json<Value>| async move {
                (script_status, Json(json!({ "errors": { "src": ["is invalid"] } })))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
}

fn callback_uri(domain: &ShopDomain) -> String {
    let mut params = BTreeMap::from([
        ("code".to_string(), "authcode".to_string()),
        ("shop".to_string(), domain.to_string()),
        ("timestamp".to_string(), "1700000000".to_string()),
    ]);
    let signature = sign(&params, TEST_CLIENT_SECRET);
    params.insert("hmac".to_string(), signature);

    let query: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("/auth/callback?{}", query.join("&"))
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_failed_script_install_is_fatal_but_keeps_shop() {
    let pool = test_pool().await;
    let domain = unique_domain();
    let shop_id = Uuid::new_v4().as_u128().to_string();
    let origin = spawn_shopify(&shop_id, StatusCode::UNPROCESSABLE_ENTITY).await;

    let response = router(test_state_with_api_origin(pool.clone(), &origin))
        .oneshot(
            Request::builder()
                .uri(callback_uri(&domain))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(
        body.starts_with("OAuth error: Failed to install widget script: "),
        "{body}"
    );

    let shop = ShopRepository::new(&pool)
        .get_by_domain(&domain)
        .await
        .unwrap()
        .expect("shop row kept after script failure");
    assert_eq!(shop.shop_id, shop_id);
    assert_eq!(shop.name, "Callback Store");
    assert_eq!(shop.access_token.expose_secret(), "shpat_fresh");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_successful_install_redirects_to_dashboard() {
    let pool = test_pool().await;
    let domain = unique_domain();
    let shop_id = Uuid::new_v4().as_u128().to_string();
    let origin = spawn_shopify(&shop_id, StatusCode::CREATED).await;

    let response = router(test_state_with_api_origin(pool.clone(), &origin))
        .oneshot(
            Request::builder()
                .uri(callback_uri(&domain))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        format!("https://survey.test/dashboard?shop={domain}").as_str()
    );
    assert!(
        ShopRepository::new(&pool)
            .has_access_token(&domain)
            .await
            .unwrap()
    );
}
