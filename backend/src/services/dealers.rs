//! Pass-through access to the external dealer/review service.
//!
//! The dealer service owns dealers and reviews; this backend only forwards
//! requests and decorates reviews with a sentiment label from the separate
//! sentiment analyzer.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::UpstreamSettings;
use crate::routes::dealers::{
    DealerResponse, DealerReviewsResponse, DealersResponse, LegacyStatus, NEUTRAL_SENTIMENT,
};

use super::error::{ServiceError, ServiceResult};

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("Invalid upstream URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("Unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl From<UpstreamError> for ServiceError {
    fn from(err: UpstreamError) -> Self {
        ServiceError::Upstream(err.to_string())
    }
}

/// Dealer and review lookups plus review sentiment.
#[async_trait]
pub trait DealerDirectory: Send + Sync {
    /// All dealers, or only those in `state`.
    async fn fetch_dealers(&self, state: Option<&str>) -> Result<Value, UpstreamError>;

    async fn fetch_dealer(&self, dealer_id: i64) -> Result<Value, UpstreamError>;

    async fn fetch_reviews(&self, dealer_id: i64) -> Result<Vec<Value>, UpstreamError>;

    /// Sentiment label of a review text.
    async fn analyze_sentiment(&self, text: &str) -> Result<String, UpstreamError>;

    /// Forward a new review as-is.
    async fn post_review(&self, review: &Value) -> Result<Value, UpstreamError>;
}

/// [`DealerDirectory`] backed by the dealer and sentiment HTTP services.
#[derive(Debug, Clone)]
pub struct HttpDealerDirectory {
    client: reqwest::Client,
    dealer_url: String,
    sentiment_url: String,
}

impl HttpDealerDirectory {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| UpstreamError::Request {
                url: settings.dealer_backend_url.clone(),
                source: e,
            })?;
        Ok(Self {
            client,
            dealer_url: settings.dealer_backend_url.trim_end_matches('/').to_string(),
            sentiment_url: settings.sentiment_analyzer_url.clone(),
        })
    }

    fn dealer_endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, UpstreamError> {
        endpoint(&self.dealer_url, segments)
    }

    async fn get_json(&self, url: String) -> Result<Value, UpstreamError> {
        log::debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| UpstreamError::Request {
                url: url.clone(),
                source: e,
            })?;
        Self::read_json(url, response).await
    }

    async fn read_json(url: String, response: reqwest::Response) -> Result<Value, UpstreamError> {
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                url,
                status: status.as_u16(),
            });
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| UpstreamError::Decode {
                url,
                message: e.to_string(),
            })
    }

    fn sentiment_endpoint(&self, text: &str) -> Result<reqwest::Url, UpstreamError> {
        endpoint(&self.sentiment_url, &["analyze", text])
    }
}

/// `base` with `segments` appended as percent-encoded path segments.
fn endpoint(base: &str, segments: &[&str]) -> Result<reqwest::Url, UpstreamError> {
    let invalid = |message: String| UpstreamError::InvalidUrl {
        url: base.to_string(),
        message,
    };
    let mut url = reqwest::Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("cannot be a base URL".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[async_trait]
impl DealerDirectory for HttpDealerDirectory {
    async fn fetch_dealers(&self, state: Option<&str>) -> Result<Value, UpstreamError> {
        let url = match state {
            Some(state) => self.dealer_endpoint(&["fetchDealers", state])?,
            None => self.dealer_endpoint(&["fetchDealers"])?,
        };
        self.get_json(url.to_string()).await
    }

    async fn fetch_dealer(&self, dealer_id: i64) -> Result<Value, UpstreamError> {
        let url = self.dealer_endpoint(&["fetchDealer", &dealer_id.to_string()])?;
        self.get_json(url.to_string()).await
    }

    async fn fetch_reviews(&self, dealer_id: i64) -> Result<Vec<Value>, UpstreamError> {
        let url = self
            .dealer_endpoint(&["fetchReviews", "dealer", &dealer_id.to_string()])?
            .to_string();
        match self.get_json(url.clone()).await? {
            Value::Array(reviews) => Ok(reviews),
            other => Err(UpstreamError::Decode {
                url,
                message: format!("expected a list of reviews, got {}", other),
            }),
        }
    }

    async fn analyze_sentiment(&self, text: &str) -> Result<String, UpstreamError> {
        let url = self.sentiment_endpoint(text)?;
        let body = self.get_json(url.to_string()).await?;
        body.get("sentiment")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| UpstreamError::Decode {
                url: url.to_string(),
                message: "missing sentiment".to_string(),
            })
    }

    async fn post_review(&self, review: &Value) -> Result<Value, UpstreamError> {
        let url = self.dealer_endpoint(&["insert_review"])?.to_string();
        log::debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .json(review)
            .send()
            .await
            .map_err(|e| UpstreamError::Request {
                url: url.clone(),
                source: e,
            })?;
        Self::read_json(url, response).await
    }
}

/// Dealers, optionally restricted to a state. `All` means every state.
pub async fn get_dealers<D>(directory: &D, state: Option<&str>) -> ServiceResult<DealersResponse>
where
    D: DealerDirectory + ?Sized,
{
    let state = state.filter(|s| !s.is_empty() && *s != "All");
    let dealers = directory.fetch_dealers(state).await?;
    Ok(DealersResponse {
        status: 200,
        dealers,
    })
}

pub async fn dealer_details<D>(directory: &D, dealer_id: i64) -> ServiceResult<DealerResponse>
where
    D: DealerDirectory + ?Sized,
{
    let dealer = directory.fetch_dealer(dealer_id).await?;
    Ok(DealerResponse {
        status: 200,
        dealer,
    })
}

/// Reviews of a dealer, each with a `sentiment` field.
///
/// Analyzer failures and reviews without text fall back to neutral.
pub async fn dealer_reviews<D>(directory: &D, dealer_id: i64) -> ServiceResult<DealerReviewsResponse>
where
    D: DealerDirectory + ?Sized,
{
    let mut reviews = directory.fetch_reviews(dealer_id).await?;
    for review in reviews.iter_mut() {
        let text = review
            .get("review")
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string);
        let sentiment = match text {
            Some(text) => match directory.analyze_sentiment(&text).await {
                Ok(sentiment) => sentiment,
                Err(e) => {
                    log::warn!("Sentiment analysis failed: {}", e);
                    NEUTRAL_SENTIMENT.to_string()
                }
            },
            None => NEUTRAL_SENTIMENT.to_string(),
        };
        if let Value::Object(fields) = review {
            fields.insert("sentiment".to_string(), Value::String(sentiment));
        }
    }
    Ok(DealerReviewsResponse {
        status: 200,
        reviews,
    })
}

/// Forward a review. Failures are reported in the legacy status envelope.
pub async fn add_review<D>(directory: &D, review: &Value) -> LegacyStatus
where
    D: DealerDirectory + ?Sized,
{
    match directory.post_review(review).await {
        Ok(_) => LegacyStatus::ok(),
        Err(e) => {
            log::error!("Error posting review: {}", e);
            LegacyStatus::new(401, "Error in posting review")
        }
    }
}
