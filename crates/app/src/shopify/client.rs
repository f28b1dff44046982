//! Shopify OAuth and REST Admin API client.

use std::sync::Arc;

use cart_survey_core::ShopDomain;
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use super::ShopifyError;
use crate::config::ShopifyAppConfig;

/// Header carrying the per-shop access token on Admin API calls.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Client for the Shopify endpoints used during installation.
///
/// Cheap to clone; the HTTP connection pool and credentials are shared.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    http: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
    scopes: Vec<String>,
    callback_url: String,
    api_version: String,
    /// Replaces `https://<shop>` for server-side calls when set.
    api_origin: Option<String>,
}

/// Identity of an installed shop, as reported by `shop.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopMetadata {
    /// Numeric Shopify shop id, rendered as a string.
    pub id: String,
    /// Display name of the shop.
    pub name: String,
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
struct AccessTokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

#[derive(Deserialize)]
struct AccessTokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct ShopEnvelope {
    shop: ShopPayload,
}

#[derive(Deserialize)]
struct ShopPayload {
    id: ShopIdValue,
    name: String,
}

/// Shopify sends the shop id as a JSON number; accept a string as well.
#[derive(Deserialize)]
#[serde(untagged)]
enum ShopIdValue {
    Number(u64),
    Text(String),
}

impl From<ShopIdValue> for String {
    fn from(value: ShopIdValue) -> Self {
        match value {
            ShopIdValue::Number(n) => n.to_string(),
            ShopIdValue::Text(s) => s,
        }
    }
}

#[derive(Serialize)]
struct ScriptTagEnvelope<'a> {
    script_tag: ScriptTag<'a>,
}

#[derive(Serialize)]
struct ScriptTag<'a> {
    event: &'static str,
    src: &'a str,
    display_scope: &'static str,
    cache: bool,
}

impl ShopifyClient {
    /// Create a new client from the app configuration.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ShopifyAppConfig) -> Result<Self, ShopifyError> {
        Self::build(config, None)
    }

    /// Create a client whose token exchange and Admin API calls go to
    /// `origin` (for example `http://127.0.0.1:4000`) instead of the shop's
    /// own domain. The browser-facing authorization URL is unaffected.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Http` if the HTTP client cannot be built.
    pub fn with_api_origin(config: &ShopifyAppConfig, origin: &str) -> Result<Self, ShopifyError> {
        Self::build(config, Some(origin.trim_end_matches('/').to_string()))
    }

    fn build(config: &ShopifyAppConfig, api_origin: Option<String>) -> Result<Self, ShopifyError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ShopifyClientInner {
                http,
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                scopes: config.scopes.clone(),
                callback_url: config.callback_url.clone(),
                api_version: config.api_version.clone(),
                api_origin,
            }),
        })
    }

    /// Get the client secret (for HMAC verification).
    #[must_use]
    pub fn client_secret(&self) -> &SecretString {
        &self.inner.client_secret
    }

    fn shop_origin(&self, shop: &ShopDomain) -> String {
        self.inner
            .api_origin
            .clone()
            .unwrap_or_else(|| format!("https://{shop}"))
    }

    fn admin_api_url(&self, shop: &ShopDomain, resource: &str) -> String {
        format!(
            "{}/admin/api/{}/{resource}.json",
            self.shop_origin(shop),
            self.inner.api_version
        )
    }

    // =========================================================================
    // OAuth Flow
    // =========================================================================

    /// Build the URL that starts the OAuth grant for `shop`.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::InvalidDomain` if `shop` is not a
    /// `<store>.myshopify.com` domain.
    pub fn authorization_url(&self, shop: &str, state: &str) -> Result<String, ShopifyError> {
        let shop = ShopDomain::parse(shop)?;

        let mut url = Url::parse(&format!("https://{shop}/admin/oauth/authorize"))
            .map_err(|e| ShopifyError::Parse(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.inner.client_id)
            .append_pair("scope", &self.inner.scopes.join(","))
            .append_pair("redirect_uri", &self.inner.callback_url)
            .append_pair("state", state)
            .append_pair("shop", shop.as_str());

        Ok(url.into())
    }

    /// Exchange an authorization code for a permanent access token.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::TokenExchangeFailed` with the response body if
    /// Shopify answers with a non-success status.
    /// Returns `ShopifyError::Http` if the request fails.
    #[instrument(skip_all, fields(shop = %shop))]
    pub async fn exchange_code_for_token(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<SecretString, ShopifyError> {
        let url = format!("{}/admin/oauth/access_token", self.shop_origin(shop));
        let body = AccessTokenRequest {
            client_id: &self.inner.client_id,
            client_secret: self.inner.client_secret.expose_secret(),
            code,
        };

        let response = self.inner.http.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::TokenExchangeFailed(text));
        }

        let token: AccessTokenResponse = response.json().await?;
        Ok(SecretString::from(token.access_token))
    }

    // =========================================================================
    // REST Admin API
    // =========================================================================

    /// Fetch the shop's numeric id and display name.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::MetadataFetchFailed` with the response body if
    /// Shopify answers with a non-success status.
    /// Returns `ShopifyError::Http` if the request fails.
    #[instrument(skip_all, fields(shop = %shop))]
    pub async fn fetch_shop_metadata(
        &self,
        shop: &ShopDomain,
        access_token: &SecretString,
    ) -> Result<ShopMetadata, ShopifyError> {
        let response = self
            .inner
            .http
            .get(self.admin_api_url(shop, "shop"))
            .header(ACCESS_TOKEN_HEADER, access_token.expose_secret())
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::MetadataFetchFailed(text));
        }

        let envelope: ShopEnvelope = response.json().await?;
        Ok(ShopMetadata {
            id: envelope.shop.id.into(),
            name: envelope.shop.name,
        })
    }

    /// Register the survey widget as an `onload` script on the online store.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::ScriptInstallFailed` with the response body if
    /// Shopify answers with a non-success status.
    /// Returns `ShopifyError::Http` if the request fails.
    #[instrument(skip_all, fields(shop = %shop))]
    pub async fn install_widget_script(
        &self,
        shop: &ShopDomain,
        access_token: &SecretString,
        widget_url: &str,
    ) -> Result<(), ShopifyError> {
        let response = self
            .inner
            .http
            .post(self.admin_api_url(shop, "script_tags"))
            .header(ACCESS_TOKEN_HEADER, access_token.expose_secret())
            .json(&script_tag_body(widget_url))
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::ScriptInstallFailed(text));
        }

        Ok(())
    }
}

/// Generate an OAuth `state` value: 16 random bytes, hex encoded.
#[must_use]
pub fn generate_nonce() -> String {
    let mut bytes = [0_u8; 16];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

const fn script_tag_body(widget_url: &str) -> ScriptTagEnvelope<'_> {
    ScriptTagEnvelope {
        script_tag: ScriptTag {
            event: "onload",
            src: widget_url,
            display_scope: "online_store",
            cache: false,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::shopify::mock::{ACCESS_TOKEN, MockShopify};

    fn test_config() -> ShopifyAppConfig {
        ShopifyAppConfig {
            client_id: "abc123".to_string(),
            client_secret: SecretString::from("shpss_0123456789abcdef"),
            scopes: vec!["write_script_tags".to_string(), "read_products".to_string()],
            callback_url: "https://survey.test/auth/callback".to_string(),
            api_version: "2024-01".to_string(),
            http_timeout: Duration::from_secs(5),
        }
    }

    fn test_client() -> ShopifyClient {
        ShopifyClient::new(&test_config()).unwrap()
    }

    async fn mock_client(mock: MockShopify) -> ShopifyClient {
        let origin = mock.spawn().await;
        ShopifyClient::with_api_origin(&test_config(), &origin).unwrap()
    }

    fn shop() -> ShopDomain {
        ShopDomain::parse("my-shop.myshopify.com").unwrap()
    }

    fn token() -> SecretString {
        SecretString::from(ACCESS_TOKEN)
    }

    #[tokio::test]
    async fn test_exchange_code_for_token() {
        let client = mock_client(MockShopify::default()).await;
        let token = client
            .exchange_code_for_token(&shop(), "code")
            .await
            .unwrap();
        assert_eq!(token.expose_secret(), ACCESS_TOKEN);
    }

    #[tokio::test]
    async fn test_exchange_rejected_carries_body() {
        let client = mock_client(MockShopify {
            token: (
                StatusCode::BAD_REQUEST,
                json!({ "error": "invalid_request" }),
            ),
            ..MockShopify::default()
        })
        .await;

        let err = client
            .exchange_code_for_token(&shop(), "used-code")
            .await
            .unwrap_err();
        match err {
            ShopifyError::TokenExchangeFailed(body) => assert!(body.contains("invalid_request")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_shop_metadata() {
        let client = mock_client(MockShopify::default()).await;
        let metadata = client
            .fetch_shop_metadata(&shop(), &token())
            .await
            .unwrap();
        assert_eq!(
            metadata,
            ShopMetadata {
                id: "548380009".to_string(),
                name: "Mock Store".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_shop_metadata_failure() {
        let client = mock_client(MockShopify::default()).await;
        let err = client
            .fetch_shop_metadata(&shop(), &SecretString::from("shpat_wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShopifyError::MetadataFetchFailed(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_install_widget_script() {
        let client = mock_client(MockShopify::default()).await;
        client
            .install_widget_script(&shop(), &token(), "https://survey.test/survey/script")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_install_widget_script_failure() {
        let client = mock_client(MockShopify {
            script_tags: (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "errors": { "src": ["is invalid"] } }),
            ),
            ..MockShopify::default()
        })
        .await;

        let err = client
            .install_widget_script(&shop(), &token(), "https://survey.test/survey/script")
            .await
            .unwrap_err();
        match err {
            ShopifyError::ScriptInstallFailed(body) => assert!(body.contains("is invalid")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_origin_only_moves_server_calls() {
        let client =
            ShopifyClient::with_api_origin(&test_config(), "http://127.0.0.1:4000/").unwrap();
        assert_eq!(
            client.admin_api_url(&shop(), "shop"),
            "http://127.0.0.1:4000/admin/api/2024-01/shop.json"
        );

        let url = client.authorization_url("my-shop.myshopify.com", "n").unwrap();
        assert!(url.starts_with("https://my-shop.myshopify.com/admin/oauth/authorize?"));
    }

    #[test]
    fn test_generate_nonce() {
        let a = generate_nonce();
        let b = generate_nonce();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_authorization_url() {
        let url = test_client()
            .authorization_url("my-shop.myshopify.com", "nonce42")
            .unwrap();
        let parsed = Url::parse(&url).unwrap();

        assert_eq!(parsed.host_str(), Some("my-shop.myshopify.com"));
        assert_eq!(parsed.path(), "/admin/oauth/authorize");

        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("client_id".to_string(), "abc123".to_string()),
                ("scope".to_string(), "write_script_tags,read_products".to_string()),
                (
                    "redirect_uri".to_string(),
                    "https://survey.test/auth/callback".to_string()
                ),
                ("state".to_string(), "nonce42".to_string()),
                ("shop".to_string(), "my-shop.myshopify.com".to_string()),
            ]
        );
        assert!(url.contains("redirect_uri=https%3A%2F%2Fsurvey.test%2Fauth%2Fcallback"));
    }

    #[test]
    fn test_authorization_url_rejects_foreign_domain() {
        let result = test_client().authorization_url("shop.myshopify.com.evil.com", "n");
        assert!(matches!(result, Err(ShopifyError::InvalidDomain(_))));
    }

    #[test]
    fn test_admin_api_url() {
        let shop = ShopDomain::parse("my-shop.myshopify.com").unwrap();
        assert_eq!(
            test_client().admin_api_url(&shop, "script_tags"),
            "https://my-shop.myshopify.com/admin/api/2024-01/script_tags.json"
        );
    }

    #[test]
    fn test_script_tag_body() {
        let body = serde_json::to_value(script_tag_body(
            "https://survey.test/survey/script?shop=my-shop.myshopify.com",
        ))
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "script_tag": {
                    "event": "onload",
                    "src": "https://survey.test/survey/script?shop=my-shop.myshopify.com",
                    "display_scope": "online_store",
                    "cache": false
                }
            })
        );
    }

    #[test]
    fn test_shop_payload_numeric_id_becomes_string() {
        let envelope: ShopEnvelope = serde_json::from_str(
            r#"{"shop":{"id":548380009,"name":"John Smith Test Store","domain":"shop.example"}}"#,
        )
        .unwrap();
        assert_eq!(String::from(envelope.shop.id), "548380009");
        assert_eq!(envelope.shop.name, "John Smith Test Store");
    }

    #[test]
    fn test_access_token_request_shape() {
        let body = serde_json::to_value(AccessTokenRequest {
            client_id: "abc123",
            client_secret: "s3cr3t",
            code: "authcode",
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"client_id": "abc123", "client_secret": "s3cr3t", "code": "authcode"})
        );
    }
}
