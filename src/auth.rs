use crate::{
    config::Credentials,
    consts::{BEARER_TOKEN_TYPE, GRANT_TYPE, TOKEN_ENDPOINT_SUFFIX},
    util::remove_trailing_slash,
};
use reqwest::{header::ACCEPT, Client, Error as ReqwestError};
use serde::Deserialize;
use serde_json::Error as SerdeJsonError;
use std::fmt;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum AuthError {
    #[error("HTTP build error")]
    HttpBuilder(#[source] ReqwestError),
    #[error("Failed to reach OAuth API")]
    Http(#[source] ReqwestError),
    #[error("Timeout calling OAuth API")]
    Timeout,
    #[error("Error from OAuth API, status code: {status}\n{body}")]
    Status { status: u16, body: String },
    #[error("Error decoding OAuth API response")]
    Decode(#[source] SerdeJsonError),
    #[error("Unknown token type: {0}")]
    TokenType(String),
}

impl AuthError {
    /// HTTP status returned by the token endpoint, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn from_send(error: ReqwestError) -> Self {
        if error.is_timeout() {
            AuthError::Timeout
        } else {
            AuthError::Http(error)
        }
    }
}

#[derive(Deserialize)]
pub struct AccessToken {
    token_type: String,
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl AccessToken {
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// The raw bearer value for the `Authorization` header.
    pub fn secret(&self) -> &str {
        &self.access_token
    }

    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token_type", &self.token_type)
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Authenticator {
    client: Client,
    /// Base URL of the OAuth authority
    /// e.g. https://login.microsoftonline.com
    authority: String,
}

impl Authenticator {
    pub fn new(client: Client, authority: &str) -> Self {
        Self {
            client,
            authority: remove_trailing_slash(authority),
        }
    }

    pub fn token_url(&self, tenant: &str) -> String {
        format!("{}/{}{}", self.authority, tenant, TOKEN_ENDPOINT_SUFFIX)
    }

    /// Client-credentials grant against the tenant's token endpoint.
    pub async fn fetch_token(&self, credentials: &Credentials) -> Result<AccessToken, AuthError> {
        let url = self.token_url(&credentials.tenant);

        tracing::debug!(%url, client_id = %credentials.client_id, "Requesting access token");

        let req = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .form(&[
                ("client_id", credentials.client_id.as_str()),
                ("scope", credentials.scope.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("grant_type", GRANT_TYPE),
            ])
            .build()
            .map_err(AuthError::HttpBuilder)?;

        let resp = self
            .client
            .execute(req)
            .await
            .map_err(AuthError::from_send)?;

        let status = resp.status();
        let body = resp.text().await.map_err(AuthError::from_send)?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "OAuth API rejected token request");
            return Err(AuthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let token: AccessToken = serde_json::from_str(&body).map_err(AuthError::Decode)?;
        if !token.token_type.eq_ignore_ascii_case(BEARER_TOKEN_TYPE) {
            return Err(AuthError::TokenType(token.token_type));
        }

        tracing::debug!(expires_in = ?token.expires_in, "Received access token");

        Ok(token)
    }
}
