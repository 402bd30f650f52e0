//! reqwest-backed [`CatalogApi`]

use crate::error::ClientError;
use lesson_cart_core::environment::{ApiFuture, CatalogApi};
use lesson_cart_core::{ApiError, Lesson, LessonId, OrderRequest};
use reqwest::{Client, Response, Url};
use serde::Serialize;
use std::time::Duration;

/// Request timeout used by [`CatalogClient::new`]
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the lesson catalog service
///
/// Talks JSON to four endpoints under a configurable API root:
///
/// | Call | Request |
/// |------|---------|
/// | fetch catalog | `GET {root}/lessons` |
/// | search | `GET {root}/search?q={query}` |
/// | place order | `POST {root}/orders` |
/// | sync capacity | `PUT {root}/lessons/{id}` with `{"spaces": n}` |
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    api_root: Url,
}

#[derive(Serialize)]
struct SpacesUpdate {
    spaces: u32,
}

impl CatalogClient {
    /// Client for `api_root` with [`DEFAULT_TIMEOUT`]
    ///
    /// # Errors
    ///
    /// See [`CatalogClient::with_timeout`].
    pub fn new(api_root: &str) -> Result<Self, ClientError> {
        Self::with_timeout(api_root, DEFAULT_TIMEOUT)
    }

    /// Client for `api_root` with a per-request timeout
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] unless `api_root` is an
    /// absolute `http` or `https` URL, and [`ClientError::Build`] if the TLS
    /// backend cannot be initialised.
    pub fn with_timeout(api_root: &str, timeout: Duration) -> Result<Self, ClientError> {
        let invalid = |reason: String| ClientError::InvalidBaseUrl {
            url: api_root.to_string(),
            reason,
        };

        let api_root_url = Url::parse(api_root).map_err(|e| invalid(e.to_string()))?;
        if !matches!(api_root_url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {:?}", api_root_url.scheme())));
        }
        if api_root_url.cannot_be_a_base() {
            return Err(invalid("not a base URL".to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_root: api_root_url,
        })
    }

    /// The configured API root
    #[must_use]
    pub const fn api_root(&self) -> &Url {
        &self.api_root
    }

    /// `GET /lessons`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, non-success status or an
    /// undecodable body.
    #[tracing::instrument(skip(self), fields(api_root = %self.api_root))]
    pub async fn lessons(&self) -> Result<Vec<Lesson>, ApiError> {
        let url = self.endpoint(&["lessons"])?;
        let response = self.client.get(url).send().await.map_err(transport)?;
        let lessons = decode(check_status(response).await?).await?;
        tracing::debug!(count = lessons.len(), "Catalog fetched");
        Ok(lessons)
    }

    /// `GET /search?q={query}`
    ///
    /// The query is sent as typed; the service decides how to match it.
    ///
    /// # Errors
    ///
    /// Same as [`CatalogClient::lessons`].
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<Lesson>, ApiError> {
        let url = self.endpoint(&["search"])?;
        let response = self
            .client
            .get(url)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(transport)?;
        let lessons = decode(check_status(response).await?).await?;
        tracing::debug!(count = lessons.len(), "Search results received");
        Ok(lessons)
    }

    /// `POST /orders`
    ///
    /// The response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-success status.
    #[tracing::instrument(
        skip(self, order),
        fields(lessons = order.items().len(), total = %order.total())
    )]
    pub async fn place_order(&self, order: &OrderRequest) -> Result<(), ApiError> {
        let url = self.endpoint(&["orders"])?;
        let response = self
            .client
            .post(url)
            .json(order)
            .send()
            .await
            .map_err(transport)?;
        check_status(response).await?;
        tracing::debug!("Order accepted");
        Ok(())
    }

    /// `PUT /lessons/{id}` with `{"spaces": n}`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-success status.
    #[tracing::instrument(skip(self, lesson_id), fields(lesson_id = %lesson_id))]
    pub async fn put_spaces(&self, lesson_id: &LessonId, spaces: u32) -> Result<(), ApiError> {
        let url = self.endpoint(&["lessons", lesson_id.as_str()])?;
        let response = self
            .client
            .put(url)
            .json(&SpacesUpdate { spaces })
            .send()
            .await
            .map_err(transport)?;
        check_status(response).await?;
        Ok(())
    }

    /// Append path segments to the API root, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.api_root.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Transport(format!("cannot extend {}", self.api_root)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl CatalogApi for CatalogClient {
    fn fetch_lessons(&self) -> ApiFuture<'_, Vec<Lesson>> {
        Box::pin(self.lessons())
    }

    fn search_lessons<'a>(&'a self, query: &'a str) -> ApiFuture<'a, Vec<Lesson>> {
        Box::pin(self.search(query))
    }

    fn submit_order<'a>(&'a self, order: &'a OrderRequest) -> ApiFuture<'a, ()> {
        Box::pin(self.place_order(order))
    }

    fn update_spaces<'a>(&'a self, lesson_id: &'a LessonId, spaces: u32) -> ApiFuture<'a, ()> {
        Box::pin(self.put_spaces(lesson_id, spaces))
    }
}

fn transport(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Transport(format!("request timed out: {error}"))
    } else {
        ApiError::Transport(error.to_string())
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("unknown status").to_string()
    } else {
        body
    };
    tracing::warn!(status = status.as_u16(), %message, "Request rejected");
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode(response: Response) -> Result<Vec<Lesson>, ApiError> {
    response
        .json::<Vec<Lesson>>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}
