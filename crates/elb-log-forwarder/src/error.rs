// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::parser::FormatKind;

/// Reasons a single access-log line cannot be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("line has no field at position {index}")]
    MissingField { index: usize },

    #[error("{kind} line has {actual} fields, expected {expected}")]
    FieldCount {
        kind: FormatKind,
        expected: usize,
        actual: usize,
    },

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("line is not valid UTF-8 after byte {valid_up_to}")]
    InvalidUtf8 { valid_up_to: usize },
}

/// Errors returned by a [`crate::backend::LogStreamBackend`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The continuity token sent with an append does not match the stream.
    #[error("invalid sequence token, expected {expected:?}")]
    StaleToken { expected: Option<String> },

    #[error("log stream already exists")]
    AlreadyExists,

    /// The batch was already stored by an earlier call with the same token.
    #[error("data already accepted, next token {next_token:?}")]
    DataAlreadyAccepted { next_token: Option<String> },

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while forwarding a storage object to its log stream.
#[derive(Debug, thiserror::Error)]
pub enum ForwarderError {
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("malformed record at line {line}: {source}")]
    MalformedRecord {
        line: usize,
        #[source]
        source: ParseError,
    },

    #[error("failed to read s3://{bucket}/{key}: {message}")]
    ObjectFetch {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("stream {stream} rejected the sequence token twice")]
    BackendStaleToken { stream: String },

    #[error("backend unavailable for stream {stream}: {message}")]
    BackendUnavailable { stream: String, message: String },

    #[error("cannot derive a log stream name from object key '{0}'")]
    UnrecognizedObjectKey(String),
}

/// Invalid or missing configuration, reported once at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
