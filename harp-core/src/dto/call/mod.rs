//! Call DTOs
//!
//! Submitting a job is a `POST /call/{endpoint}` carrying positional data;
//! the response names the event whose result stream is then read.

use serde::{Deserialize, Serialize};

/// Body of a job submission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallRequest {
    pub data: Vec<serde_json::Value>,
}

/// Response to a job submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallResponse {
    pub event_id: String,
}
