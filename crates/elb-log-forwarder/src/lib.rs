// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Forwards Elastic Load Balancing access logs from S3 to CloudWatch Logs.
//!
//! An invocation carries S3 event notifications, either directly or wrapped in
//! SQS messages. Every referenced object is streamed, decompressed when
//! gzipped, and parsed line by line into ALB, NLB or CLB records. Records are
//! batched per destination log stream and appended under the stream's
//! sequence token.
//!
//! - [`ingest`]: invocation entry point and failure reporting
//! - [`reader`] and [`parser`]: object streaming and line parsing
//! - [`forwarder`] and [`registry`]: per-stream batching and append protocol
//! - [`backend`]: the seams to the object store and the log backend, with AWS
//!   implementations in [`aws`]

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod aws;
pub mod backend;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod forwarder;
pub mod ingest;
pub mod parser;
pub mod reader;
pub mod registry;
pub mod stream_name;

pub use backend::{LogStreamBackend, ObjectBody, ObjectStore, OutputEvent, StreamDescription};
pub use config::{BatchLimits, Config, MessageFormat, ParseErrorPolicy};
pub use error::{BackendError, ConfigError, ForwarderError, ParseError};
pub use event::{BatchItemFailure, BatchResponse, InvocationEvent, NotificationItem};
pub use ingest::LogIngestor;
pub use stream_name::StreamNameSource;
