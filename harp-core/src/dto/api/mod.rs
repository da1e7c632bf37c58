//! API description DTOs
//!
//! Returned by `GET /info`; lists every named endpoint with its declared
//! parameters in positional order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// API description of a Gradio app
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiInfo {
    #[serde(default)]
    pub named_endpoints: HashMap<String, EndpointInfo>,
}

/// A named endpoint and its parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointInfo {
    #[serde(default)]
    pub parameters: Vec<ParameterInfo>,
}

/// One declared endpoint parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterInfo {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub parameter_name: Option<String>,
    #[serde(default)]
    pub component: Option<String>,
    #[serde(default)]
    pub python_type: Option<PythonType>,
}

/// Python-side type annotation of a parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonType {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub description: String,
}
