use async_trait::async_trait;
use tracing::debug;

use crate::error::{Error, Result};

/// HTTP collaborator for the client.
///
/// Implementations perform exactly one request and return the response
/// body text; failures surface as `Error::Transport` unchanged. No retries
/// and no timeout policy at this layer; callers impose those on the
/// transport they inject.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `form` as application/x-www-form-urlencoded with extra headers.
    async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
        headers: &[(&'static str, String)],
    ) -> Result<String>;

    /// GET with query parameters.
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<String>;
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
        headers: &[(&'static str, String)],
    ) -> Result<String> {
        let mut request = self.http.post(url).form(form);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }
        debug!(url, "sending POST");
        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        response
            .text()
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }

    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<String> {
        debug!(url, "sending GET");
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        response
            .text()
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }
}
