//! HARP Core
//!
//! Core types and abstractions shared by the HARP client and CLI.
//!
//! This crate contains:
//! - Domain types: controls, model cards, job status, operations and endpoint signatures
//! - DTOs: wire shapes of the Gradio HTTP API the remote service speaks

pub mod domain;
pub mod dto;
