//! Bearer token exchange
//!
//! Application-only auth: the consumer key and secret are sent once as a
//! Basic credential in a client-credentials grant, and the returned bearer
//! token is used for every later call in the session. There is no retry and
//! no refresh; a failure here ends the session before any fetch starts.

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use std::fmt;

/// Content type the token endpoint expects
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Cannot get Bearer: {0}")]
    Unavailable(String),

    #[error("Auth Error: credentials rejected ({0})")]
    Rejected(String),

    #[error("Token exchange failed with status {status}: {message}")]
    ExchangeFailed { status: u16, message: String },

    #[error("Token response did not contain an access_token")]
    MissingToken,

    #[error("Missing credential: {0}")]
    MissingCredentials(String),
}

/// Consumer key and secret
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }

    /// Reject empty values and the `-` placeholder used in config templates
    pub fn validate(&self) -> Result<(), AuthError> {
        let missing = |v: &str| v.trim().is_empty() || v.trim() == "-";
        if missing(&self.api_key) {
            return Err(AuthError::MissingCredentials("api_key".to_string()));
        }
        if missing(&self.api_secret) {
            return Err(AuthError::MissingCredentials("api_secret".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"***")
            .field("api_secret", &"***")
            .finish()
    }
}

/// Access token returned by the exchange
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

/// Performs the one-shot client-credentials exchange
#[derive(Debug, Clone)]
pub struct CredentialExchanger {
    client: reqwest::Client,
    token_url: String,
    user_agent: String,
}

impl CredentialExchanger {
    pub fn new(client: reqwest::Client, token_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Exchange the key and secret for a bearer token
    pub async fn exchange(&self, api_key: &str, api_secret: &str) -> Result<BearerToken, AuthError> {
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(api_key, Some(api_secret))
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(USER_AGENT, &self.user_agent)
            .body("grant_type=client_credentials")
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, timeout = e.is_timeout(), "Token request failed");
                AuthError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let failure = super::error::ApiFailure::from_response(response).await;
            failure.dump("Cannot get Bearer");
            return Err(if status.as_u16() == 403 {
                AuthError::Rejected(failure.message)
            } else {
                AuthError::ExchangeFailed {
                    status: status.as_u16(),
                    message: failure.message,
                }
            });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Unavailable(format!("invalid token response: {}", e)))?;
        if let Some(kind) = body.token_type.as_deref() {
            if !kind.eq_ignore_ascii_case("bearer") {
                tracing::warn!(token_type = kind, "Unexpected token type");
            }
        }
        body.access_token
            .filter(|t| !t.is_empty())
            .map(BearerToken::new)
            .ok_or(AuthError::MissingToken)
    }

    /// Validate then exchange a credential pair
    pub async fn exchange_credentials(&self, credentials: &Credentials) -> Result<BearerToken, AuthError> {
        credentials.validate()?;
        self.exchange(credentials.api_key(), credentials.api_secret()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn exchanger(server: &MockServer) -> CredentialExchanger {
        CredentialExchanger::new(
            reqwest::Client::new(),
            format!("{}/oauth2/token", server.uri()),
            "Twitter-Search 2.0",
        )
    }

    #[test]
    fn test_credentials_validation() {
        assert!(Credentials::new("key", "secret").validate().is_ok());
        assert!(matches!(
            Credentials::new("-", "secret").validate(),
            Err(AuthError::MissingCredentials(_))
        ));
        assert!(matches!(
            Credentials::new("key", " ").validate(),
            Err(AuthError::MissingCredentials(_))
        ));
    }

    #[test]
    fn test_secrets_are_not_debug_printed() {
        let creds = Credentials::new("visible-key", "visible-secret");
        let printed = format!("{:?} {:?}", creds, BearerToken::new("AAAA"));
        assert!(!printed.contains("visible"));
        assert!(!printed.contains("AAAA"));
    }

    #[tokio::test]
    async fn test_exchange_success() {
        let server = MockServer::start().await;
        // base64("key:secret")
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(header("authorization", "Basic a2V5OnNlY3JldA=="))
            .and(body_string("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "bearer",
                "access_token": "AAAA%2FBBBB"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = exchanger(&server).exchange("key", "secret").await.unwrap();
        assert_eq!(token.as_str(), "AAAA%2FBBBB");
        assert_eq!(token.authorization(), "Bearer AAAA%2FBBBB");
    }

    #[tokio::test]
    async fn test_exchange_forbidden_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "errors": [{"code": 99, "label": "authenticity_token_error", "message": "Unable to verify your credentials"}]
            })))
            .mount(&server)
            .await;

        let err = exchanger(&server).exchange("key", "bad").await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected(ref m) if m == "Unable to verify your credentials"));
    }

    #[tokio::test]
    async fn test_exchange_other_status_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = exchanger(&server).exchange("key", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::ExchangeFailed { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_exchange_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"token_type": "bearer"})))
            .mount(&server)
            .await;

        let err = exchanger(&server).exchange("key", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::MissingToken));
    }

    #[tokio::test]
    async fn test_exchange_unreachable() {
        let exchanger = CredentialExchanger::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9/oauth2/token",
            "ua",
        );
        let err = exchanger.exchange("key", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::Unavailable(_)));
    }
}
