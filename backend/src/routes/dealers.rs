use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const GET_DEALERS: &str = "/djangoapp/get_dealers";
pub const GET_DEALERS_BY_STATE: &str = "/djangoapp/get_dealers/{state}";
pub const DEALER_DETAILS: &str = "/djangoapp/dealer/{dealer_id}";
pub const DEALER_REVIEWS: &str = "/djangoapp/reviews/dealer/{dealer_id}";
pub const ADD_REVIEW: &str = "/djangoapp/add_review";

/// Sentiment label used when the analyzer cannot be reached.
pub const NEUTRAL_SENTIMENT: &str = "neutral";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealersResponse {
    pub status: u16,
    pub dealers: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealerResponse {
    pub status: u16,
    pub dealer: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealerReviewsResponse {
    pub status: u16,
    pub reviews: Vec<Value>,
}

/// Envelope of the legacy `add_review` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyStatus {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LegacyStatus {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }

    pub fn ok() -> Self {
        Self {
            status: 200,
            message: None,
        }
    }
}
