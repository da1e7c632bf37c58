//! Core domain types
//!
//! This module contains the domain structures shared by the client (which
//! produces and tracks them) and the CLI (which persists and reports them).

pub mod control;
pub mod endpoint;
pub mod job;
