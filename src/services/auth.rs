//! Login sessions: Google sign-in, session lookup and logout

use std::sync::Arc;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tower_sessions::{Expiry, Session};

use super::oauth::{self, IdentityProvider};
use crate::{
    config::SessionConfig,
    error::{AppError, AppResult},
    models::Principal,
};

const STATE_LEN: usize = 32;
const VERIFIER_LEN: usize = 64;

/// Keys under which login data lives in a session
pub struct SessionKeys;

impl SessionKeys {
    pub const PRINCIPAL: &'static str = "principal";
    pub const PENDING_LOGIN: &'static str = "pending_login";
}

/// Anti-forgery `state` and PKCE verifier of a login in progress
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PendingLogin {
    state: String,
    verifier: String,
}

/// Redirect-back parameters from the provider's consent page
#[derive(Debug, Default, Clone)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    config: SessionConfig,
}

impl AuthService {
    pub fn new(provider: Arc<dyn IdentityProvider>, config: SessionConfig) -> Self {
        Self { provider, config }
    }

    /// Principal signed in on this session, if any
    pub async fn principal(&self, session: &Session) -> AppResult<Option<Principal>> {
        Ok(session.get::<Principal>(SessionKeys::PRINCIPAL).await?)
    }

    /// Start a login: remember a fresh `state` and PKCE verifier in the
    /// session and return the consent URL to redirect to.
    pub async fn begin_login(&self, session: &Session) -> AppResult<Url> {
        let state = oauth::random_token(STATE_LEN);
        let verifier = oauth::random_token(VERIFIER_LEN);
        let url = self
            .provider
            .authorize_url(&state, &oauth::code_challenge(&verifier))?;

        session
            .insert(SessionKeys::PENDING_LOGIN, PendingLogin { state, verifier })
            .await?;
        Ok(url)
    }

    /// Finish a login from the provider's redirect.
    ///
    /// On success the session id is cycled before the principal is stored,
    /// so the id changes across login. Every failure is reported as
    /// [`AppError::Authentication`] and leaves no principal behind.
    pub async fn complete_login(
        &self,
        session: &Session,
        params: CallbackParams,
    ) -> AppResult<Principal> {
        if let Some(error) = params.error {
            tracing::warn!("Google sign-in returned error: {}", error);
            return Err(login_failed());
        }

        // The state and verifier are single use
        let Some(pending) = session
            .remove::<PendingLogin>(SessionKeys::PENDING_LOGIN)
            .await?
        else {
            tracing::warn!("Google callback without a login in progress");
            return Err(login_failed());
        };

        if params.state.as_deref() != Some(pending.state.as_str()) {
            tracing::warn!("Google callback state mismatch");
            return Err(login_failed());
        }
        let Some(code) = params.code else {
            tracing::warn!("Google callback without an authorization code");
            return Err(login_failed());
        };

        let principal = match self.provider.exchange_code(&code, &pending.verifier).await {
            Ok(principal) => principal,
            Err(e) => {
                tracing::warn!("Google code exchange failed: {}", e);
                return Err(login_failed());
            }
        };

        session.cycle_id().await?;
        if !self.config.rolling {
            let ends = OffsetDateTime::now_utc() + self.config.ttl();
            session.set_expiry(Some(Expiry::AtDateTime(ends)));
        }
        session.insert(SessionKeys::PRINCIPAL, &principal).await?;

        tracing::info!(user_id = %principal.id, "User signed in as {}", principal.display_name);
        Ok(principal)
    }

    /// Drop the session record and its data.
    ///
    /// A store failure is returned as is; the record is left in place.
    pub async fn logout(&self, session: &Session) -> AppResult<()> {
        let principal = self.principal(session).await?;
        session.flush().await?;

        if let Some(principal) = principal {
            tracing::info!(user_id = %principal.id, "User signed out");
        }
        Ok(())
    }
}

fn login_failed() -> AppError {
    AppError::Authentication("Google authentication failed".to_string())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tower_sessions::SessionStore;

    use super::*;
    use crate::services::sessions::MemorySessionStore;

    struct FakeProvider;

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        fn authorize_url(&self, state: &str, code_challenge: &str) -> AppResult<Url> {
            Url::parse_with_params(
                "https://idp.test/authorize",
                &[("state", state), ("code_challenge", code_challenge)],
            )
            .map_err(|e| AppError::Internal(e.to_string()))
        }

        async fn exchange_code(&self, code: &str, _code_verifier: &str) -> AppResult<Principal> {
            if code != "good-code" {
                return Err(AppError::Upstream("invalid_grant".to_string()));
            }
            Ok(Principal {
                id: "42".to_string(),
                display_name: "Ada Lovelace".to_string(),
                emails: vec!["ada@example.com".to_string()],
                photos: vec![],
                provider: "google".to_string(),
            })
        }
    }

    fn service(rolling: bool) -> (AuthService, MemorySessionStore, Session) {
        let store = MemorySessionStore::default();
        let config = SessionConfig {
            rolling,
            ..SessionConfig::default()
        };
        let session = Session::new(None, Arc::new(store.clone()), None);
        (
            AuthService::new(Arc::new(FakeProvider), config),
            store,
            session,
        )
    }

    fn state_of(url: &Url) -> String {
        url.query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    fn callback(state: &str, code: &str) -> CallbackParams {
        CallbackParams {
            code: Some(code.to_string()),
            state: Some(state.to_string()),
            error: None,
        }
    }

    #[tokio::test]
    async fn test_login_cycles_session_id_and_stores_principal() {
        let (auth, store, session) = service(false);
        let url = auth.begin_login(&session).await.unwrap();
        session.save().await.unwrap();
        let pending_id = session.id().unwrap();

        let principal = auth
            .complete_login(&session, callback(&state_of(&url), "good-code"))
            .await
            .unwrap();
        session.save().await.unwrap();

        assert_eq!(principal.display_name, "Ada Lovelace");
        let signed_in_id = session.id().unwrap();
        assert_ne!(signed_in_id, pending_id);
        assert!(store.load(&pending_id).await.unwrap().is_none());

        let record = store.load(&signed_in_id).await.unwrap().unwrap();
        assert!(record.data.contains_key(SessionKeys::PRINCIPAL));
        assert!(!record.data.contains_key(SessionKeys::PENDING_LOGIN));
    }

    #[tokio::test]
    async fn test_fixed_window_sessions_get_an_absolute_expiry() {
        let (auth, _store, session) = service(false);
        let url = auth.begin_login(&session).await.unwrap();
        auth.complete_login(&session, callback(&state_of(&url), "good-code"))
            .await
            .unwrap();
        assert!(matches!(session.expiry(), Some(Expiry::AtDateTime(_))));

        let (auth, _store, session) = service(true);
        let url = auth.begin_login(&session).await.unwrap();
        auth.complete_login(&session, callback(&state_of(&url), "good-code"))
            .await
            .unwrap();
        assert!(session.expiry().is_none());
    }

    #[tokio::test]
    async fn test_state_mismatch_fails_without_principal() {
        let (auth, _store, session) = service(false);
        let url = auth.begin_login(&session).await.unwrap();

        let result = auth
            .complete_login(&session, callback("forged", "good-code"))
            .await;
        assert!(matches!(result, Err(AppError::Authentication(_))));
        assert!(auth.principal(&session).await.unwrap().is_none());

        // The real state is now spent as well
        let result = auth
            .complete_login(&session, callback(&state_of(&url), "good-code"))
            .await;
        assert!(matches!(result, Err(AppError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_provider_error_fails_login() {
        let (auth, _store, session) = service(false);
        let url = auth.begin_login(&session).await.unwrap();

        let result = auth
            .complete_login(&session, callback(&state_of(&url), "bad-code"))
            .await;
        assert!(matches!(result, Err(AppError::Authentication(_))));

        let denied = CallbackParams {
            error: Some("access_denied".to_string()),
            ..CallbackParams::default()
        };
        assert!(auth.complete_login(&session, denied).await.is_err());
        assert!(auth.principal(&session).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_deletes_session_record() {
        let (auth, store, session) = service(false);
        let url = auth.begin_login(&session).await.unwrap();
        auth.complete_login(&session, callback(&state_of(&url), "good-code"))
            .await
            .unwrap();
        session.save().await.unwrap();
        let id = session.id().unwrap();

        auth.logout(&session).await.unwrap();
        assert!(store.load(&id).await.unwrap().is_none());
        assert!(auth.principal(&session).await.unwrap().is_none());

        // Logging out twice is harmless
        auth.logout(&session).await.unwrap();
    }
}
