//! # dtrack-policy-client
//!
//! HTTP implementation of [`dtrack_policy_core::PolicyAccessor`] for the
//! Dependency-Track REST API v1.
//!
//! Every call is a single request authenticated with the `X-Api-Key` header
//! and bounded by the timeout given to [`DtrackClient::new`]. There are no
//! retries. HTTP 404 maps to `ApplyError::NotFound`, other failures to
//! `ApplyError::Service` or `ApplyError::Transport`.
//!
//! ```ignore
//! use std::time::Duration;
//! use dtrack_policy_client::DtrackClient;
//! use dtrack_policy_core::PolicyAccessor;
//!
//! let client = DtrackClient::new("http://127.0.0.1:8081/", "api-key", Duration::from_secs(10))?;
//! let policy = client.policy_by_name("kev").await?;
//! ```

mod client;

pub use client::{DtrackClient, PAGE_SIZE};
