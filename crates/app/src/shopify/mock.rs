//! In-process stand-in for the Shopify endpoints the install flow calls.

#![allow(clippy::unwrap_used)]

use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};

pub const ACCESS_TOKEN: &str = "shpat_mock_token";

/// Status and body each endpoint answers with.
#[derive(Clone)]
pub struct MockShopify {
    pub token: (StatusCode, Value),
    pub shop: (StatusCode, Value),
    pub script_tags: (StatusCode, Value),
}

impl Default for MockShopify {
    fn default() -> Self {
        Self {
            token: (
                StatusCode::OK,
                json!({ "access_token": ACCESS_TOKEN, "scope": "write_script_tags" }),
            ),
            shop: (
                StatusCode::OK,
                json!({ "shop": { "id": 548_380_009, "name": "Mock Store" } }),
            ),
            script_tags: (StatusCode::CREATED, json!({ "script_tag": { "id": 1 } })),
        }
    }
}

fn reply((status, body): (StatusCode, Value)) -> Response {
    (status, Json(body)).into_response()
}

/// Admin API calls without the issued token are answered 401.
fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("x-shopify-access-token")
        .is_some_and(|v| v == ACCESS_TOKEN)
}

impl MockShopify {
    fn router(self) -> Router {
        let token = self.token;
        let shop = self.shop;
        let script_tags = self.script_tags;

        Router::new()
            .route(
                "/admin/oauth/access_token",
                post(move || async move { reply(token) }),
            )
            .route(
                "/admin/api/2024-01/shop.json",
                get(move |headers: HeaderMap| async move {
                    if authorized(&headers) {
                        reply(shop)
                    } else {
                        StatusCode::UNAUTHORIZED.into_response()
                    }
                }),
            )
            .route(
                "/admin/api/2024-01/script_tags.json",
                post(move |headers: HeaderMap| async move {
                    if authorized(&headers) {
                        reply(script_tags)
                    } else {
                        StatusCode::UNAUTHORIZED.into_response()
                    }
                }),
            )
    }

    /// Serve on an ephemeral local port and return its origin.
    pub async fn spawn(self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = self.router();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}")
    }
}
