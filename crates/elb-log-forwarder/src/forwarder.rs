// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Batches events for one destination log stream and appends them to the
//! backend under the stream's sequence token.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::backend::{LogStreamBackend, OutputEvent};
use crate::config::BatchLimits;
use crate::error::{BackendError, ForwarderError};

#[derive(Debug, Default)]
struct StreamState {
    pending: Vec<OutputEvent>,
    pending_bytes: usize,
    sequence_token: Option<String>,
    ensured: bool,
}

impl StreamState {
    fn clear(&mut self) {
        self.pending.clear();
        self.pending_bytes = 0;
    }
}

/// Forwarder for a single log stream.
///
/// All operations take the state lock, so appends and flushes coming from
/// concurrent object tasks never interleave on the same stream. An append that
/// has to flush holds the lock until the flush is done.
pub struct StreamForwarder {
    group: String,
    name: String,
    backend: Arc<dyn LogStreamBackend>,
    limits: BatchLimits,
    state: Mutex<StreamState>,
}

impl StreamForwarder {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        backend: Arc<dyn LogStreamBackend>,
        limits: BatchLimits,
    ) -> Self {
        StreamForwarder {
            group: group.into(),
            name: name.into(),
            backend,
            limits,
            state: Mutex::new(StreamState::default()),
        }
    }

    #[cfg(test)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Buffers `event`, flushing the pending batch first if the event would
    /// not fit into it.
    pub async fn append(&self, mut event: OutputEvent) -> Result<(), ForwarderError> {
        let max_message_bytes = self.limits.max_message_bytes();
        if event.message.len() > max_message_bytes {
            warn!(
                stream = %self.name,
                size = event.message.len(),
                max = max_message_bytes,
                "Truncating oversized log event"
            );
            truncate_at_char_boundary(&mut event.message, max_message_bytes);
        }

        let size = self.limits.event_size(&event.message);
        let mut state = self.state.lock().await;
        if !state.pending.is_empty()
            && (state.pending_bytes + size > self.limits.max_batch_bytes
                || state.pending.len() >= self.limits.max_batch_count)
        {
            self.flush_locked(&mut state).await?;
        }

        state.pending_bytes += size;
        state.pending.push(event);
        Ok(())
    }

    /// Sends every pending event to the stream.
    ///
    /// The stream is looked up, or created, on the first flush.
    pub async fn flush(&self) -> Result<(), ForwarderError> {
        let mut state = self.state.lock().await;
        self.flush_locked(&mut state).await
    }

    #[cfg(test)]
    pub async fn pending_len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    #[cfg(test)]
    pub async fn sequence_token(&self) -> Option<String> {
        self.state.lock().await.sequence_token.clone()
    }

    async fn flush_locked(&self, state: &mut StreamState) -> Result<(), ForwarderError> {
        if !state.ensured {
            state.sequence_token = self.ensure_stream().await?;
            state.ensured = true;
        }

        if state.pending.is_empty() {
            return Ok(());
        }

        let mut retried = false;
        loop {
            let result = self
                .backend
                .append_events(
                    &self.group,
                    &self.name,
                    &state.pending,
                    state.sequence_token.as_deref(),
                )
                .await;

            match result {
                Ok(next_token) => {
                    debug!(
                        stream = %self.name,
                        events = state.pending.len(),
                        bytes = state.pending_bytes,
                        "Flushed log events"
                    );
                    state.sequence_token = next_token;
                    state.clear();
                    return Ok(());
                }
                Err(BackendError::DataAlreadyAccepted { next_token }) => {
                    debug!(stream = %self.name, "Batch was already accepted");
                    state.sequence_token = next_token;
                    state.clear();
                    return Ok(());
                }
                Err(BackendError::StaleToken { .. }) if retried => {
                    return Err(ForwarderError::BackendStaleToken {
                        stream: self.name.clone(),
                    });
                }
                Err(BackendError::StaleToken { expected }) => {
                    warn!(stream = %self.name, "Sequence token is stale, retrying once");
                    state.sequence_token = match expected {
                        Some(token) => Some(token),
                        None => self.current_token().await?,
                    };
                    retried = true;
                }
                Err(e) => return Err(self.unavailable(e)),
            }
        }
    }

    /// Adopts the token of the existing stream, or creates the stream.
    async fn ensure_stream(&self) -> Result<Option<String>, ForwarderError> {
        let streams = self
            .backend
            .list_streams(&self.group, &self.name)
            .await
            .map_err(|e| self.unavailable(e))?;

        if let Some(stream) = streams.into_iter().find(|s| s.name == self.name) {
            debug!(stream = %self.name, "Using existing log stream");
            return Ok(stream.sequence_token);
        }

        match self.backend.create_stream(&self.group, &self.name).await {
            Ok(()) => debug!(stream = %self.name, "Created log stream"),
            Err(BackendError::AlreadyExists) => {
                debug!(stream = %self.name, "Log stream was created concurrently");
            }
            Err(e) => return Err(self.unavailable(e)),
        }
        Ok(None)
    }

    async fn current_token(&self) -> Result<Option<String>, ForwarderError> {
        let streams = self
            .backend
            .list_streams(&self.group, &self.name)
            .await
            .map_err(|e| self.unavailable(e))?;
        Ok(streams
            .into_iter()
            .find(|s| s.name == self.name)
            .and_then(|s| s.sequence_token))
    }

    fn unavailable(&self, error: BackendError) -> ForwarderError {
        ForwarderError::BackendUnavailable {
            stream: self.name.clone(),
            message: error.to_string(),
        }
    }
}

fn truncate_at_char_boundary(message: &mut String, max_bytes: usize) {
    let mut end = max_bytes.min(message.len());
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    message.truncate(end);
}
