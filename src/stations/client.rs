use crate::error::StationError;
use crate::model::WeatherAPIResponse;
use reqwest::{Client as ReqwestClient, IntoUrl, RequestBuilder};

/// Thin reqwest wrapper that snapshots every response for the raw archive.
#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    http_client: ReqwestClient,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            http_client: ReqwestClient::new(),
        }
    }

    pub fn get(&self, url: impl IntoUrl) -> RequestBuilder {
        self.http_client
            .get(url)
            .header("user-agent", concat!("pws-collector/", env!("CARGO_PKG_VERSION")))
    }

    pub fn post(&self, url: impl IntoUrl) -> RequestBuilder {
        self.http_client
            .post(url)
            .header("user-agent", concat!("pws-collector/", env!("CARGO_PKG_VERSION")))
    }

    /// Sends the request and captures the response whatever its status.
    pub async fn send(&self, request: RequestBuilder) -> Result<WeatherAPIResponse, StationError> {
        let response = request.send().await?;
        let captured = WeatherAPIResponse::from_response(response).await?;
        tracing::debug!(
            url = %captured.url,
            status = captured.status_code,
            "received vendor response"
        );
        Ok(captured)
    }
}

/// Fails on any non-2xx status, carrying the captured response for the archive.
pub fn ensure_success(response: &WeatherAPIResponse) -> Result<(), StationError> {
    if response.is_success() {
        Ok(())
    } else {
        Err(StationError::status(
            response.status_code,
            response.url.as_str(),
            response.text.as_str(),
        )
        .with_responses(vec![response.clone()]))
    }
}
