//! Identity provider client.
//!
//! Talks to the provider's REST endpoints (password sign-in, sign-up,
//! token refresh, revocation, password reset). The provider issues the
//! [`Session`] that the gate owns; this module never stores one itself.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::session::{Session, SessionUser};

pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    public_key: String,
}

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
struct RecoverRequest<'a> {
    email: &'a str,
}

/// Session payload as the provider returns it.
#[derive(Debug, Deserialize)]
struct SessionResponse {
    access_token: String,
    refresh_token: String,
    user: SessionUser,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(alias = "error_description", alias = "msg")]
    message: Option<String>,
}

impl SessionResponse {
    fn into_session(self) -> Result<Session> {
        Session::new(self.access_token, self.refresh_token, self.user)
            .context("identity provider returned an unusable session")
    }
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            public_key: public_key.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn post_for_session<B: Serialize>(&self, url: String, body: &B) -> Result<Session> {
        let resp = self
            .http
            .post(url)
            .header("apikey", &self.public_key)
            .json(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp
                .json::<ProviderError>()
                .await
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| status.to_string());
            bail!("identity provider refused the request: {}", detail);
        }

        resp.json::<SessionResponse>().await?.into_session()
    }

    /// Password sign-in. Returns a fresh session on success.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.post_for_session(
            self.endpoint("token?grant_type=password"),
            &PasswordGrant { email, password },
        )
        .await
    }

    /// Exchange a stored refresh token for a current session. `Ok(None)`
    /// means the token is no longer valid and the user must log in again.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Option<Session>> {
        let resp = self
            .http
            .post(self.endpoint("token?grant_type=refresh_token"))
            .header("apikey", &self.public_key)
            .json(&RefreshGrant { refresh_token })
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::BAD_REQUEST
            || resp.status() == reqwest::StatusCode::UNAUTHORIZED
        {
            tracing::debug!("stored refresh token rejected by provider");
            return Ok(None);
        }
        if !resp.status().is_success() {
            bail!("identity provider returned {}", resp.status());
        }

        let session = resp.json::<SessionResponse>().await?.into_session()?;
        Ok(Some(session))
    }

    /// Create an account. Depending on provider settings the session may
    /// only become usable after email confirmation.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        self.post_for_session(self.endpoint("signup"), &PasswordGrant { email, password })
            .await
    }

    /// Revoke the session on the provider side. Local state is cleared by
    /// the gate regardless of whether this call succeeds.
    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        let resp = self
            .http
            .post(self.endpoint("logout"))
            .header("apikey", &self.public_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !resp.status().is_success() {
            tracing::warn!("provider logout returned {}", resp.status());
        }
        Ok(())
    }

    /// Ask the provider to email a password-reset link.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let resp = self
            .http
            .post(self.endpoint("recover"))
            .header("apikey", &self.public_key)
            .json(&RecoverRequest { email })
            .send()
            .await?;

        if !resp.status().is_success() {
            bail!("password reset request failed: {}", resp.status());
        }
        Ok(())
    }
}
