use serde::{Deserialize, Serialize};

/// Error body the review service attaches to non-success responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl ErrorBody {
    /// Extracts `detail` from a raw response body, if it has that shape.
    pub fn parse_detail(raw: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(raw)
            .ok()
            .map(|body| body.detail)
            .filter(|detail| !detail.trim().is_empty())
    }
}
