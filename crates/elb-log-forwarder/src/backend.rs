// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Narrow interfaces to the two external services the forwarder talks to.
//!
//! The orchestrator and the forwarders only see these traits, so tests can run
//! the whole pipeline against in-memory fakes. [`crate::aws`] implements them
//! on top of the AWS SDK.

use std::pin::Pin;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::error::BackendError;

/// Sequential byte stream of a storage object.
pub type ObjectBody = Pin<Box<dyn AsyncRead + Send>>;

/// One event ready to be appended to a log stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputEvent {
    pub timestamp_millis: i64,
    pub message: String,
}

/// A log stream as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescription {
    pub name: String,
    pub sequence_token: Option<String>,
}

#[async_trait]
pub trait LogStreamBackend: Send + Sync {
    /// Lists the streams of `group` whose name starts with `prefix`.
    async fn list_streams(
        &self,
        group: &str,
        prefix: &str,
    ) -> Result<Vec<StreamDescription>, BackendError>;

    /// Creates the stream `name` in `group`.
    async fn create_stream(&self, group: &str, name: &str) -> Result<(), BackendError>;

    /// Appends `events` to the stream in a single call.
    ///
    /// Returns the sequence token to send with the next append.
    async fn append_events(
        &self,
        group: &str,
        name: &str,
        events: &[OutputEvent],
        sequence_token: Option<&str>,
    ) -> Result<Option<String>, BackendError>;
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<ObjectBody, String>;
}
