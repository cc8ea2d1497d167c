use crate::{
    auth::AccessToken,
    consts::{NAMESPACE_ENDPOINT, REQUEST_TIMEOUT, USER_AGENT},
    request::namespace::{NamespaceRequest, NamespaceResponse},
    util::remove_trailing_slash,
};
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    Client, Error as ReqwestError, StatusCode,
};
use serde_json::Error as SerdeJsonError;
use std::time::Duration;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum ApiError {
    #[error("Serializing error")]
    Serializing(#[source] SerdeJsonError),
    #[error("HTTP build error")]
    HttpBuilder(#[source] ReqwestError),
    #[error("Got an error communicating with the Platform API")]
    Http(#[source] ReqwestError),
    #[error("Timeout calling Platform API")]
    Timeout,
    #[error("Error from Platform API, status code: {status}\n{body}")]
    Status { status: u16, body: String },
    #[error("Error decoding Platform API response")]
    Decode(#[source] SerdeJsonError),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn from_send(error: ReqwestError) -> Self {
        if error.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Http(error)
        }
    }
}

/// HTTP client shared by the token and namespace calls.
pub fn http_client() -> Result<Client, ReqwestError> {
    http_client_with_timeout(REQUEST_TIMEOUT)
}

pub fn http_client_with_timeout(timeout: Duration) -> Result<Client, ReqwestError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

#[derive(Debug, Clone)]
pub struct PlatformClient {
    client: Client,
    /// Base URL of the Platform API
    /// e.g. https://platform.example.com
    base_url: String,
}

impl PlatformClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: remove_trailing_slash(base_url),
        }
    }

    pub fn namespace_url(&self) -> String {
        format!("{}{}", self.base_url, NAMESPACE_ENDPOINT)
    }

    /// Creates the namespace, or updates it if it already exists.
    pub async fn upsert_namespace(
        &self,
        token: &AccessToken,
        request: &NamespaceRequest,
    ) -> Result<NamespaceResponse, ApiError> {
        let url = self.namespace_url();
        let body = serde_json::to_string(request).map_err(ApiError::Serializing)?;

        tracing::info!(
            %url,
            namespace = %request.namespace_name(),
            cluster = %request.cluster(),
            "Submitting namespace request"
        );
        tracing::debug!(%body, "Request body");

        let req = self
            .client
            .post(url)
            .bearer_auth(token.secret())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .build()
            .map_err(ApiError::HttpBuilder)?;

        let resp = self
            .client
            .execute(req)
            .await
            .map_err(ApiError::from_send)?;

        let status = resp.status();
        let text = resp.text().await.map_err(ApiError::from_send)?;

        Self::into_namespace_response(status, &text)
    }

    fn into_namespace_response(
        status_code: StatusCode,
        body: &str,
    ) -> Result<NamespaceResponse, ApiError> {
        if !status_code.is_success() {
            return Err(ApiError::Status {
                status: status_code.as_u16(),
                body: body.to_string(),
            });
        }

        serde_json::from_str(body).map_err(ApiError::Decode)
    }
}
