// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Invocation payloads: S3 event notifications, either delivered directly or
//! wrapped in SQS messages, and the SQS partial batch response.

use serde::{Deserialize, Serialize};

use crate::error::ForwarderError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvocationEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<NotificationItem>,
}

/// One top-level record of an invocation.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NotificationItem {
    /// S3 event notification delivered straight to the function.
    Storage(StorageRecord),
    /// SQS message whose body carries S3 event notifications.
    Envelope(QueueMessage),
    Unrecognized(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageRecord {
    s3: S3Entity,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct S3Entity {
    bucket: S3Bucket,
    object: S3Object,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct S3Bucket {
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct S3Object {
    key: String,
}

impl StorageRecord {
    #[cfg(test)]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        StorageRecord {
            s3: S3Entity {
                bucket: S3Bucket { name: bucket.into() },
                object: S3Object { key: key.into() },
            },
        }
    }

    pub fn bucket(&self) -> &str {
        &self.s3.bucket.name
    }

    /// Object key as it appears in the notification, URL-encoded.
    pub fn raw_key(&self) -> &str {
        &self.s3.object.key
    }

    /// Object key with the notification's URL encoding removed.
    pub fn key(&self) -> Result<String, ForwarderError> {
        let raw = self.raw_key();
        urlencoding::decode(&raw.replace('+', " "))
            .map(|key| key.into_owned())
            .map_err(|_| ForwarderError::UnrecognizedObjectKey(raw.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMessage {
    #[serde(default)]
    pub message_id: Option<String>,
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct EnvelopeBody {
    #[serde(rename = "Records")]
    records: Option<Vec<StorageRecord>>,
}

impl QueueMessage {
    /// Decodes the S3 notifications carried in the message body.
    pub fn storage_records(&self) -> Result<Vec<StorageRecord>, ForwarderError> {
        let body: EnvelopeBody = serde_json::from_str(&self.body)
            .map_err(|e| ForwarderError::MalformedEnvelope(e.to_string()))?;
        body.records
            .ok_or_else(|| ForwarderError::MalformedEnvelope("body has no Records".to_string()))
    }
}

/// Partial batch response reporting the SQS messages to redeliver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub batch_item_failures: Vec<BatchItemFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemFailure {
    pub item_identifier: String,
}

impl FromIterator<String> for BatchResponse {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        BatchResponse {
            batch_item_failures: iter
                .into_iter()
                .map(|item_identifier| BatchItemFailure { item_identifier })
                .collect(),
        }
    }
}
