//! Data Transfer Objects for the Gradio HTTP API
//!
//! These mirror the JSON documents exchanged with the remote service. Domain
//! types are derived from them where the client needs a typed contract.

pub mod api;
pub mod call;
pub mod file;
