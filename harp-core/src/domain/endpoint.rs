//! Endpoint signatures
//!
//! The client decides which positional arguments to upload as files by
//! looking at the declared parameter kinds, captured once at connect time.

use crate::dto::api::{EndpointInfo, ParameterInfo};

/// Python type name Gradio declares for file-path parameters
const FILEPATH_TYPE: &str = "filepath";

/// Declared kind of an endpoint parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// A local path that must be uploaded and sent as a file reference
    Filepath,
    /// Any other value, sent verbatim
    Value,
}

impl From<&ParameterInfo> for ParamKind {
    fn from(param: &ParameterInfo) -> Self {
        match &param.python_type {
            Some(ty) if ty.type_name == FILEPATH_TYPE => ParamKind::Filepath,
            _ => ParamKind::Value,
        }
    }
}

/// Ordered parameter contract of a named endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSignature {
    /// Endpoint name as published, e.g. "/process"
    pub api_name: String,
    pub params: Vec<ParamKind>,
}

impl EndpointSignature {
    pub fn new(api_name: impl Into<String>, params: Vec<ParamKind>) -> Self {
        Self {
            api_name: api_name.into(),
            params,
        }
    }

    pub fn from_info(api_name: impl Into<String>, info: &EndpointInfo) -> Self {
        Self::new(api_name, info.parameters.iter().map(ParamKind::from).collect())
    }

    /// Number of positional parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Path segment used in `/call/{name}` URLs
    pub fn call_name(&self) -> &str {
        self.api_name.trim_start_matches('/')
    }
}
