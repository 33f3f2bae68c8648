// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! In-memory stand-ins for CloudWatch Logs and S3

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use elb_log_forwarder::{
    BackendError, LogStreamBackend, ObjectBody, ObjectStore, OutputEvent, StreamDescription,
};

#[derive(Debug, Default, Clone)]
pub struct MockStream {
    pub events: Vec<OutputEvent>,
    pub sequence_token: Option<String>,
    pub appends: usize,
}

/// Log backend that enforces sequence tokens the way CloudWatch Logs does.
#[derive(Default)]
pub struct MockLogBackend {
    streams: Mutex<HashMap<String, MockStream>>,
    pub unavailable: AtomicBool,
    pub list_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
}

#[allow(dead_code)]
impl MockLogBackend {
    /// Registers a stream that already holds `token`.
    pub fn with_stream(self, name: &str, token: &str) -> Self {
        self.streams.lock().unwrap().insert(
            name.to_string(),
            MockStream {
                sequence_token: Some(token.to_string()),
                ..Default::default()
            },
        );
        self
    }

    pub fn stream(&self, name: &str) -> Option<MockStream> {
        self.streams.lock().unwrap().get(name).cloned()
    }

    pub fn messages(&self, name: &str) -> Vec<String> {
        self.stream(name)
            .map(|s| s.events.into_iter().map(|e| e.message).collect())
            .unwrap_or_default()
    }

    pub fn stream_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.streams.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait::async_trait]
impl LogStreamBackend for MockLogBackend {
    async fn list_streams(
        &self,
        _group: &str,
        prefix: &str,
    ) -> Result<Vec<StreamDescription>, BackendError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .streams
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, stream)| StreamDescription {
                name: name.clone(),
                sequence_token: stream.sequence_token.clone(),
            })
            .collect())
    }

    async fn create_stream(&self, _group: &str, name: &str) -> Result<(), BackendError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut streams = self.streams.lock().unwrap();
        if streams.contains_key(name) {
            return Err(BackendError::AlreadyExists);
        }
        streams.insert(name.to_string(), MockStream::default());
        Ok(())
    }

    async fn append_events(
        &self,
        _group: &str,
        name: &str,
        events: &[OutputEvent],
        sequence_token: Option<&str>,
    ) -> Result<Option<String>, BackendError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("ServiceUnavailableException".to_string()));
        }

        let mut streams = self.streams.lock().unwrap();
        let stream = streams
            .get_mut(name)
            .ok_or_else(|| BackendError::Unavailable(format!("ResourceNotFoundException: {name}")))?;

        if stream.sequence_token.as_deref() != sequence_token {
            return Err(BackendError::StaleToken {
                expected: stream.sequence_token.clone(),
            });
        }

        stream.appends += 1;
        stream.events.extend_from_slice(events);
        let next = format!("{name}-{}", stream.appends);
        stream.sequence_token = Some(next.clone());
        Ok(Some(next))
    }
}

/// Object store serving byte buffers keyed by bucket and key.
#[derive(Default)]
pub struct MockObjectStore {
    objects: HashMap<(String, String), Vec<u8>>,
    pub fetches: AtomicUsize,
}

#[allow(dead_code)]
impl MockObjectStore {
    pub fn with_object(mut self, bucket: &str, key: &str, data: Vec<u8>) -> Self {
        self.objects
            .insert((bucket.to_string(), key.to_string()), data);
        self
    }
}

#[async_trait::async_trait]
impl ObjectStore for MockObjectStore {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<ObjectBody, String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.objects.get(&(bucket.to_string(), key.to_string())) {
            Some(data) => Ok(Box::pin(Cursor::new(data.clone()))),
            None => Err(format!("NoSuchKey: s3://{bucket}/{key}")),
        }
    }
}
