// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! [`LogStreamBackend`] and [`ObjectStore`] backed by CloudWatch Logs and S3.

use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::error::DisplayErrorContext;
use aws_sdk_cloudwatchlogs::operation::create_log_stream::CreateLogStreamError;
use aws_sdk_cloudwatchlogs::operation::put_log_events::PutLogEventsError;
use aws_sdk_cloudwatchlogs::types::InputLogEvent;
use tracing::warn;

use crate::backend::{LogStreamBackend, ObjectBody, ObjectStore, OutputEvent, StreamDescription};
use crate::error::BackendError;

pub struct CloudWatchLogsBackend {
    client: aws_sdk_cloudwatchlogs::Client,
}

impl CloudWatchLogsBackend {
    pub fn new(client: aws_sdk_cloudwatchlogs::Client) -> Self {
        CloudWatchLogsBackend { client }
    }
}

#[async_trait]
impl LogStreamBackend for CloudWatchLogsBackend {
    async fn list_streams(
        &self,
        group: &str,
        prefix: &str,
    ) -> Result<Vec<StreamDescription>, BackendError> {
        let mut streams = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let output = self
                .client
                .describe_log_streams()
                .log_group_name(group)
                .log_stream_name_prefix(prefix)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| BackendError::Unavailable(DisplayErrorContext(&e).to_string()))?;

            streams.extend(output.log_streams().iter().filter_map(|stream| {
                Some(StreamDescription {
                    name: stream.log_stream_name()?.to_string(),
                    sequence_token: stream.upload_sequence_token().map(str::to_string),
                })
            }));

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => return Ok(streams),
            }
        }
    }

    async fn create_stream(&self, group: &str, name: &str) -> Result<(), BackendError> {
        match self
            .client
            .create_log_stream()
            .log_group_name(group)
            .log_stream_name(name)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => match e.into_service_error() {
                CreateLogStreamError::ResourceAlreadyExistsException(_) => {
                    Err(BackendError::AlreadyExists)
                }
                other => Err(BackendError::Unavailable(
                    DisplayErrorContext(&other).to_string(),
                )),
            },
        }
    }

    async fn append_events(
        &self,
        group: &str,
        name: &str,
        events: &[OutputEvent],
        sequence_token: Option<&str>,
    ) -> Result<Option<String>, BackendError> {
        let log_events = events
            .iter()
            .map(|event| {
                InputLogEvent::builder()
                    .timestamp(event.timestamp_millis)
                    .message(event.message.clone())
                    .build()
                    .map_err(|e| BackendError::Unavailable(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let result = self
            .client
            .put_log_events()
            .log_group_name(group)
            .log_stream_name(name)
            .set_log_events(Some(log_events))
            .set_sequence_token(sequence_token.map(str::to_string))
            .send()
            .await;

        match result {
            Ok(output) => {
                if let Some(rejected) = output.rejected_log_events_info() {
                    warn!(stream = name, "Log events rejected: {rejected:?}");
                }
                Ok(output.next_sequence_token().map(str::to_string))
            }
            Err(e) => Err(match e.into_service_error() {
                PutLogEventsError::InvalidSequenceTokenException(e) => BackendError::StaleToken {
                    expected: e.expected_sequence_token().map(str::to_string),
                },
                PutLogEventsError::DataAlreadyAcceptedException(e) => {
                    BackendError::DataAlreadyAccepted {
                        next_token: e.expected_sequence_token().map(str::to_string),
                    }
                }
                other => BackendError::Unavailable(DisplayErrorContext(&other).to_string()),
            }),
        }
    }
}

pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        S3ObjectStore { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<ObjectBody, String> {
        let object = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| aws_sdk_s3::error::DisplayErrorContext(&e).to_string())?;
        Ok(Box::pin(object.body.into_async_read()))
    }
}
