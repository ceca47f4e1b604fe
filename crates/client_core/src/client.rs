//! HTTP client for the place review service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use shared::{
    domain::{GeoPoint, Place, PlaceId},
    error::ErrorBody,
    protocol::{NextPlaceResponse, VerifyRequest, VerifyResponse},
};
use tracing::debug;
use url::Url;

use crate::error::NetworkError;

/// The two operations the review loop needs from the service.
///
/// Submissions are not idempotent: calling `submit_correction` twice records
/// two corrections and deduplication is left to the service.
#[async_trait]
pub trait ReviewBackend: Send + Sync {
    async fn fetch_next(&self) -> Result<Place, NetworkError>;
    async fn submit_correction(
        &self,
        place_id: &PlaceId,
        corrected: GeoPoint,
    ) -> Result<(), NetworkError>;
}

pub struct HttpReviewClient {
    http: Client,
    base_url: Url,
}

impl HttpReviewClient {
    pub fn new(mut base_url: Url, timeout: Duration) -> Result<Self, NetworkError> {
        // Url::join replaces the last path segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| NetworkError::transport(format!("failed to build http client: {err}")))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, NetworkError> {
        self.base_url
            .join(path)
            .map_err(|err| NetworkError::transport(format!("invalid endpoint '{path}': {err}")))
    }
}

async fn ensure_success(response: Response) -> Result<Response, NetworkError> {
    let status = response.status();
    // The service contract is exactly 200; other 2xx codes are not a success.
    if status == StatusCode::OK {
        return Ok(response);
    }
    let detail = response
        .text()
        .await
        .ok()
        .and_then(|raw| ErrorBody::parse_detail(&raw));
    Err(NetworkError::status(status, detail))
}

#[async_trait]
impl ReviewBackend for HttpReviewClient {
    async fn fetch_next(&self) -> Result<Place, NetworkError> {
        let url = self.endpoint("place/next")?;
        debug!(%url, "fetching next place");
        let response = ensure_success(self.http.get(url).send().await?).await?;
        let body: NextPlaceResponse = response.json().await?;
        Place::try_from(body).map_err(|err| {
            NetworkError::transport(format!("service returned an invalid place location: {err}"))
        })
    }

    async fn submit_correction(
        &self,
        place_id: &PlaceId,
        corrected: GeoPoint,
    ) -> Result<(), NetworkError> {
        let url = self.endpoint("place/verify")?;
        debug!(%url, place_id = %place_id, %corrected, "submitting correction");
        let response = ensure_success(
            self.http
                .post(url)
                .json(&VerifyRequest::new(place_id.clone(), corrected))
                .send()
                .await?,
        )
        .await?;
        // Only the status matters; the body is informational.
        let ack: VerifyResponse = response.json().await.unwrap_or_default();
        debug!(place_id = %place_id, status = ?ack.status, "correction acknowledged");
        Ok(())
    }
}
