// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Invocation entry point: fans the notifications of one invocation out to
//! concurrent object tasks and collects the envelopes that must be redelivered.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::backend::{LogStreamBackend, ObjectStore, OutputEvent};
use crate::config::{Config, MessageFormat};
use crate::error::ForwarderError;
use crate::event::{BatchResponse, InvocationEvent, NotificationItem, QueueMessage, StorageRecord};
use crate::parser::ParsedRecord;
use crate::reader::LogReader;
use crate::registry::ForwarderRegistry;

/// Outcome of forwarding one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub stream: String,
    pub forwarded: usize,
    pub skipped: usize,
}

pub struct LogIngestor {
    config: Arc<Config>,
    backend: Arc<dyn LogStreamBackend>,
    store: Arc<dyn ObjectStore>,
}

impl LogIngestor {
    pub fn new(
        config: Arc<Config>,
        backend: Arc<dyn LogStreamBackend>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        LogIngestor {
            config,
            backend,
            store,
        }
    }

    /// Forwards every object referenced by `event`.
    ///
    /// Returns the ids of the envelopes that had at least one failed object.
    /// Failures of direct notifications are logged only.
    pub async fn process(&self, event: InvocationEvent) -> BatchResponse {
        debug!(items = event.records.len(), "Processing invocation");
        let registry = ForwarderRegistry::new(
            self.config.log_group.clone(),
            self.backend.clone(),
            self.config.batch_limits,
        );

        let failures = join_all(
            event
                .records
                .iter()
                .map(|item| self.process_item(&registry, item)),
        )
        .await;

        failures.into_iter().flatten().collect()
    }

    async fn process_item(
        &self,
        registry: &ForwarderRegistry,
        item: &NotificationItem,
    ) -> Option<String> {
        match item {
            NotificationItem::Storage(record) => {
                if let Err(e) = self.forward_object(registry, record).await {
                    error!(
                        bucket = record.bucket(),
                        key = record.raw_key(),
                        "Failed to forward object: {e}"
                    );
                }
                None
            }
            NotificationItem::Envelope(message) => self.process_envelope(registry, message).await,
            NotificationItem::Unrecognized(value) => {
                warn!("Skipping unrecognized notification: {value}");
                None
            }
        }
    }

    async fn process_envelope(
        &self,
        registry: &ForwarderRegistry,
        message: &QueueMessage,
    ) -> Option<String> {
        let records = match message.storage_records() {
            Ok(records) => records,
            Err(e) => {
                warn!(message_id = ?message.message_id, "Skipping message: {e}");
                return None;
            }
        };

        let results = join_all(
            records
                .iter()
                .map(|record| self.forward_object(registry, record)),
        )
        .await;

        let mut failed = false;
        for (record, result) in records.iter().zip(results) {
            if let Err(e) = result {
                error!(
                    message_id = ?message.message_id,
                    bucket = record.bucket(),
                    key = record.raw_key(),
                    "Failed to forward object: {e}"
                );
                failed = true;
            }
        }
        if !failed {
            return None;
        }

        if message.message_id.is_none() {
            error!("Failed message has no id and cannot be redelivered");
        }
        message.message_id.clone()
    }

    /// Streams one object into its log stream and flushes the stream.
    pub async fn forward_object(
        &self,
        registry: &ForwarderRegistry,
        record: &StorageRecord,
    ) -> Result<ObjectSummary, ForwarderError> {
        let bucket = record.bucket();
        let key = record.key()?;
        let stream = self.config.stream_name_source.resolve(&key)?;
        let forwarder = registry.resolve(&stream).await;

        let body = self
            .store
            .fetch(bucket, &key)
            .await
            .map_err(|message| ForwarderError::ObjectFetch {
                bucket: bucket.to_string(),
                key: key.clone(),
                message,
            })?;

        let mut reader = LogReader::new(body, bucket, key.as_str(), self.config.parse_error_policy);
        let mut forwarded = 0;
        while let Some(parsed) = reader.next_record().await? {
            forwarder.append(self.render(parsed)).await?;
            forwarded += 1;
        }
        forwarder.flush().await?;

        let summary = ObjectSummary {
            stream,
            forwarded,
            skipped: reader.skipped(),
        };
        info!(
            bucket = %bucket,
            key = %key,
            stream = %summary.stream,
            forwarded = summary.forwarded,
            skipped = summary.skipped,
            "Forwarded access log object"
        );
        Ok(summary)
    }

    fn render(&self, record: ParsedRecord) -> OutputEvent {
        let timestamp_millis = record.timestamp.timestamp_millis();
        let message = match self.config.message_format {
            MessageFormat::Plain => record.raw,
            MessageFormat::Json => serde_json::to_string(&record.fields).unwrap_or(record.raw),
        };
        OutputEvent {
            timestamp_millis,
            message,
        }
    }
}
