//! Google OAuth 2.0 authorization-code client

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{distributions::Alphanumeric, Rng};
use reqwest::{Client, Url};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::{
    config::GoogleConfig,
    error::{AppError, AppResult},
    models::Principal,
};

pub const PROVIDER_GOOGLE: &str = "google";
const SCOPES: &str = "openid profile email";

/// External identity provider used for login
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Consent page the browser is sent to
    fn authorize_url(&self, state: &str, code_challenge: &str) -> AppResult<Url>;

    /// Trade an authorization code for the signed-in user's profile
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> AppResult<Principal>;
}

pub struct GoogleProvider {
    http: Client,
    config: GoogleConfig,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OpenID Connect userinfo document
#[derive(Debug, Deserialize)]
struct GoogleProfile {
    sub: String,
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

impl GoogleProvider {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    async fn fetch_access_token(&self, code: &str, code_verifier: &str) -> AppResult<String> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("code_verifier", code_verifier),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid token response: {}", e)))?;
        Ok(token.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> AppResult<GoogleProfile> {
        let response = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Userinfo request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Userinfo endpoint returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid userinfo response: {}", e)))
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorize_url(&self, state: &str, code_challenge: &str) -> AppResult<Url> {
        Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("response_type", "code"),
                ("scope", SCOPES),
                ("state", state),
                ("code_challenge", code_challenge),
                ("code_challenge_method", "S256"),
            ],
        )
        .map_err(|e| AppError::Internal(format!("Invalid Google auth URL: {}", e)))
    }

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> AppResult<Principal> {
        let access_token = self.fetch_access_token(code, code_verifier).await?;
        let profile = self.fetch_profile(&access_token).await?;
        principal_from_profile(profile)
    }
}

fn principal_from_profile(profile: GoogleProfile) -> AppResult<Principal> {
    if profile.sub.trim().is_empty() {
        return Err(AppError::Upstream("Google profile has no subject id".to_string()));
    }

    let display_name = profile
        .name
        .clone()
        .or_else(|| profile.email.clone())
        .unwrap_or_else(|| profile.sub.clone());

    Ok(Principal {
        id: profile.sub,
        display_name,
        emails: profile.email.into_iter().collect(),
        photos: profile.picture.into_iter().collect(),
        provider: PROVIDER_GOOGLE.to_string(),
    })
}

/// Random token for the OAuth `state` parameter and PKCE verifiers
pub fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// S256 PKCE challenge for `verifier`
pub fn code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GoogleProvider {
        GoogleProvider::new(GoogleConfig {
            client_id: "client-123".to_string(),
            client_secret: "secret".to_string(),
            ..GoogleConfig::default()
        })
    }

    #[test]
    fn test_code_challenge_rfc7636_vector() {
        // Appendix B of RFC 7636
        assert_eq!(
            code_challenge("dBjftJeZ4CK-1ZPmBTtV0VQm8kM4XUCKvPnhN1aXxO0"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_random_token_length() {
        let token = random_token(64);
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_authorize_url_carries_state_and_challenge() {
        let url = provider().authorize_url("xyz", "challenge").unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(params["client_id"], "client-123");
        assert_eq!(params["state"], "xyz");
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(params["scope"], "openid profile email");
    }

    #[test]
    fn test_profile_mapping() {
        let principal = principal_from_profile(GoogleProfile {
            sub: "1087".to_string(),
            name: None,
            email: Some("ada@example.com".to_string()),
            picture: None,
        })
        .unwrap();
        assert_eq!(principal.display_name, "ada@example.com");
        assert_eq!(principal.emails, vec!["ada@example.com"]);
        assert!(principal.photos.is_empty());
        assert_eq!(principal.provider, "google");
    }

    #[test]
    fn test_profile_without_subject_is_rejected() {
        let result = principal_from_profile(GoogleProfile {
            sub: " ".to_string(),
            name: Some("Nobody".to_string()),
            email: None,
            picture: None,
        });
        assert!(result.is_err());
    }
}
