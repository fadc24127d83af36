//! `reqwest` client for the Berez backend REST API.
//!
//! Reads retry transient failures with exponential backoff; writes are sent
//! once and any failure is surfaced to the caller unchanged.

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{ApiError, Result};
use crate::fountain::{Fountain, FountainPage};
use crate::location::Coordinates;
use crate::review::{
    validate_photo, FountainReport, FountainSubmission, Photo, PhotoUpload, Review, ReviewCreate,
    ReviewEnvelope,
};
use crate::source::FountainSource;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn transport(err: reqwest::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

/// Turn a non-2xx response into an [`ApiError`], keeping the backend's
/// `detail` message when the body carries one.
async fn status_error(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| match value.get("detail") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        })
        .unwrap_or(body);
    ApiError::Status { status, detail }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    if !response.status().is_success() {
        return Err(status_error(response).await);
    }
    let body = response.text().await.map_err(transport)?;
    serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Client for the Berez backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    max_tries: u32,
    backoff: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport)?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            max_tries: 3,
            backoff: Duration::from_millis(500),
        }
    }

    /// Bearer token sent with writes; reviews and reports may be anonymous.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_retries(mut self, max_tries: u32, backoff: Duration) -> Self {
        self.max_tries = max_tries.max(1);
        self.backoff = backoff;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Photo URLs come back relative to the API root.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            self.url(url)
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let mut delay = self.backoff;
        let mut attempt = 1;
        loop {
            debug!("[Berez] api: GET {} (attempt {})", url, attempt);
            let outcome = match self.client.get(&url).send().await {
                Ok(response) => read_json(response).await,
                Err(e) => Err(transport(e)),
            };
            match outcome {
                Err(err) if err.is_retryable() && attempt < self.max_tries => {
                    warn!(
                        "[Berez] api: attempt {}/{} for {} failed: {}",
                        attempt, self.max_tries, url, err
                    );
                    info!(
                        "[Berez] api: sleeping for {} milliseconds before retry",
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Response> {
        let url = self.url(path);
        debug!("[Berez] api: POST {}", url);
        let request = self.authorize(self.client.post(&url).json(body));
        let response = request.send().await.map_err(transport)?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(status_error(response).await)
        }
    }

    /// Fountains ordered by proximity to `at`.
    pub async fn nearby(&self, at: Coordinates) -> Result<Vec<Fountain>> {
        let path = format!("/fountains/{},{}", at.longitude, at.latitude);
        let page: FountainPage = self.get_json(&path).await?;
        info!(
            "[Berez] api: {} fountains near {}",
            page.items.len(),
            at
        );
        Ok(page.items)
    }

    pub async fn fountain(&self, id: i64) -> Result<Fountain> {
        self.get_json(&format!("/fountains/{}", id))
            .await
            .map_err(|err| match err {
                ApiError::Status { status: 404, .. } => ApiError::NotFound(id),
                other => other,
            })
    }

    /// Reviews of a fountain. The backend answers 404 when there are none.
    pub async fn reviews(&self, fountain_id: i64) -> Result<Vec<Review>> {
        match self
            .get_json::<Vec<Review>>(&format!("/reviews/{}", fountain_id))
            .await
        {
            Err(ApiError::Status { status: 404, .. }) => Ok(Vec::new()),
            other => other,
        }
    }

    pub async fn photos(&self, fountain_id: i64) -> Result<Vec<Photo>> {
        let photos: Vec<Photo> = match self
            .get_json::<Vec<Photo>>(&format!("/photos/fountain/{}", fountain_id))
            .await
        {
            Err(ApiError::Status { status: 404, .. }) => Vec::new(),
            other => other?,
        };
        Ok(photos
            .into_iter()
            .map(|photo| Photo {
                url: self.resolve_url(&photo.url),
                ..photo
            })
            .collect())
    }

    pub async fn submit_review(&self, review: &ReviewCreate) -> Result<Review> {
        let response = self.post_json("/review", review).await?;
        let envelope: ReviewEnvelope = read_json(response).await?;
        info!(
            "[Berez] api: review {} stored for fountain {}",
            envelope.review.id, envelope.review.fountain_id
        );
        Ok(envelope.review)
    }

    /// Upload an image file as multipart field `file`.
    pub async fn upload_photo(&self, path: &Path, fountain_id: Option<i64>) -> Result<PhotoUpload> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ApiError::Invalid(format!("{} has no file name", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::Invalid(format!("cannot read {}: {}", path.display(), e)))?;
        let mime = validate_photo(&file_name, bytes.len() as u64)?;

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(transport)?;
        let mut form = Form::new().part("file", part);
        if let Some(id) = fountain_id {
            form = form.text("fountain_id", id.to_string());
        }

        let request = self.authorize(self.client.post(self.url("/photos/upload")).multipart(form));
        let response = request.send().await.map_err(transport)?;
        let upload: PhotoUpload = read_json(response).await?;
        Ok(PhotoUpload {
            url: self.resolve_url(&upload.url),
            ..upload
        })
    }

    pub async fn submit_fountain(&self, submission: &FountainSubmission) -> Result<()> {
        submission.validate()?;
        self.post_json("/fountains/submit", submission).await?;
        Ok(())
    }

    pub async fn report_fountain(&self, report: &FountainReport) -> Result<()> {
        self.post_json("/fountains/report", report).await?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl FountainSource for ApiClient {
    async fn nearby(&self, at: Coordinates) -> Result<Vec<Fountain>> {
        ApiClient::nearby(self, at).await
    }

    async fn fountain(&self, id: i64) -> Result<Fountain> {
        ApiClient::fountain(self, id).await
    }
}
