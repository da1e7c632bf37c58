//! HARP HTTP Client
//!
//! A type-safe client for the remote side of HARP: a Gradio app exposing a
//! controls operation, a process operation and (optionally) a cancel operation.
//!
//! The client resolves the space address, reads the app's API description once
//! at connect time, and then submits jobs whose progress can be polled without
//! blocking.
//!
//! # Example
//!
//! ```no_run
//! use harp_client::{JobHandle, RemoteClient};
//! use harp_core::domain::job::{JobOutput, Operation};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = RemoteClient::connect("hugggof/pitch_shifter").await?;
//!
//!     let job = client.submit(Operation::FetchControls, vec![]).await?;
//!     while !job.poll_done() {
//!         tokio::time::sleep(std::time::Duration::from_millis(50)).await;
//!     }
//!
//!     if let JobOutput::Data(controls) = client.fetch_result(job).await? {
//!         println!("{}", controls);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod files;
mod jobs;
mod literal;
pub mod space;
pub mod sse;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use files::{Argument, bind_arguments};
pub use jobs::{CancelRequester, Job, JobHandle};
pub use space::SpaceAddress;

use harp_core::domain::endpoint::EndpointSignature;
use harp_core::domain::job::Operation;
use harp_core::dto::api::ApiInfo;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Path prefixes under which Gradio serves its API, oldest layout first
const API_PREFIXES: [&str; 2] = ["", "/gradio_api"];

const OPERATIONS: [Operation; 3] = [
    Operation::FetchControls,
    Operation::Process,
    Operation::Cancel,
];

/// Options applied when connecting
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Timeout for short requests (API description, submit, upload, cancel)
    pub request_timeout: Duration,
    /// Where file outputs are downloaded
    pub download_dir: PathBuf,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            download_dir: std::env::temp_dir().join("harp"),
        }
    }
}

/// HTTP client for a remote HARP app
///
/// Holds the endpoint signatures captured at connect time. Cheap to share
/// behind an `Arc`; one instance serves a whole invocation.
#[derive(Debug)]
pub struct RemoteClient {
    /// Gradio server URL including the API prefix
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Resolved signature per exposed operation
    endpoints: HashMap<Operation, EndpointSignature>,
    request_timeout: Duration,
    download_dir: PathBuf,
    /// Jobs submitted but not yet terminal
    outstanding: Arc<AtomicUsize>,
}

impl RemoteClient {
    /// Connect to a remote app with default options
    ///
    /// # Arguments
    /// * `address` - URL or space address (see [`SpaceAddress`])
    ///
    /// # Errors
    /// `ClientError::Connection` if the service is unreachable,
    /// `ClientError::MissingEndpoint` if it lacks the controls or process operation.
    pub async fn connect(address: &str) -> Result<Self> {
        Self::connect_with(address, ConnectOptions::default()).await
    }

    /// Connect to a remote app
    pub async fn connect_with(address: &str, options: ConnectOptions) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(options.request_timeout)
            .build()?;
        Self::connect_with_client(address, client, options).await
    }

    /// Connect using a custom HTTP client
    ///
    /// This allows you to configure proxies, TLS settings, etc.
    pub async fn connect_with_client(
        address: &str,
        client: Client,
        options: ConnectOptions,
    ) -> Result<Self> {
        let space = SpaceAddress::parse(address)?;
        info!("Connecting to {} ({})", space.gradio_url, space.user_input);
        if let Some(page) = &space.huggingface_url {
            debug!("Space page: {}", page);
        }

        let (base_url, info) =
            Self::discover(&client, &space.gradio_url, options.request_timeout).await?;
        let endpoints = resolve_endpoints(&info)?;

        info!(
            "Connected to {} ({} operation(s) available)",
            base_url,
            endpoints.len()
        );

        Ok(Self {
            base_url,
            client,
            endpoints,
            request_timeout: options.request_timeout,
            download_dir: options.download_dir,
            outstanding: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Get the base URL of the API, including its prefix
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the declared parameters of an operation
    pub fn signature(&self, operation: Operation) -> Result<&EndpointSignature> {
        self.endpoints
            .get(&operation)
            .ok_or_else(|| ClientError::MissingEndpoint(operation.to_string()))
    }

    /// Check whether the service exposes an operation
    pub fn supports(&self, operation: Operation) -> bool {
        self.endpoints.contains_key(&operation)
    }

    /// Fetch the API description, trying each known prefix
    async fn discover(
        client: &Client,
        root: &str,
        timeout: Duration,
    ) -> Result<(String, ApiInfo)> {
        for prefix in API_PREFIXES {
            let base = format!("{}{}", root, prefix);
            let response = client
                .get(format!("{}/info", base))
                .timeout(timeout)
                .send()
                .await
                .map_err(|e| ClientError::connection(root, e))?;

            if response.status() == StatusCode::NOT_FOUND {
                debug!("No API description at {}/info", base);
                continue;
            }

            let info = Self::handle_response(response)
                .await
                .map_err(|e| ClientError::connection(root, e))?;
            return Ok((base, info));
        }

        Err(ClientError::connection(
            root,
            "no API description found; is this a Gradio app?",
        ))
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

/// Pick the published endpoint for every known operation
fn resolve_endpoints(info: &ApiInfo) -> Result<HashMap<Operation, EndpointSignature>> {
    let mut endpoints = HashMap::new();

    for operation in OPERATIONS {
        let found = operation.endpoint_names().iter().find_map(|name| {
            info.named_endpoints
                .get(*name)
                .map(|endpoint| EndpointSignature::from_info(*name, endpoint))
        });

        match found {
            Some(signature) => {
                debug!(
                    "{} -> {} ({} parameter(s))",
                    operation,
                    signature.api_name,
                    signature.arity()
                );
                endpoints.insert(operation, signature);
            }
            None if operation.is_optional() => {
                warn!("Service does not expose the {} operation", operation);
            }
            None => return Err(ClientError::MissingEndpoint(operation.to_string())),
        }
    }

    Ok(endpoints)
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
