use std::{sync::Arc, time::Duration};

use log::trace;
use reqwest::{
    blocking::Client,
    header::{HeaderMap, HeaderValue, ACCEPT},
};

use crate::credentials::{CredentialProvider, GITHUB_SERVICE};

use super::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues GET requests against the forge API.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<ApiResponse, ApiError>;
}

/// Blocking HTTP transport. Credentials are fetched from the keychain for every request.
pub struct HttpTransport {
    client: Client,
    keychain: Arc<dyn CredentialProvider>,
}

impl HttpTransport {
    pub fn new(
        keychain: Arc<dyn CredentialProvider>,
        timeout: Option<Duration>,
    ) -> Result<HttpTransport, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        let mut builder = Client::builder()
            .user_agent(concat!("sourcefetch/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(HttpTransport {
            client: builder.build()?,
            keychain,
        })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<ApiResponse, ApiError> {
        let mut request = self.client.get(url);
        match self.keychain.service(GITHUB_SERVICE) {
            Some(credentials) => {
                trace!("GET {} as {}", url, credentials.username);
                request = request.basic_auth(credentials.username, Some(credentials.token));
            }
            None => trace!("GET {} without credentials", url),
        }
        let response = request.send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?.to_vec();
        Ok(ApiResponse { status, body })
    }
}
