use std::fmt::{Display, Formatter};

use mosaic_core::ProviderId;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

/// Request identifier (UUID v4) for correlating output with logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Envelope metadata. Field order is fixed so output is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub request_id: RequestId,
    pub generated_at: String,
    pub latency_ms: u64,
    pub sources: Vec<ProviderId>,
}

impl Metadata {
    pub fn new(sources: Vec<ProviderId>, latency_ms: u64) -> Self {
        Self {
            request_id: RequestId::new_v4(),
            generated_at: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z")),
            latency_ms,
            sources,
        }
    }
}

/// Top-level output document.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub meta: Metadata,
    pub data: T,
}
