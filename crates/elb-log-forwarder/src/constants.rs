// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Constants for CloudWatch Logs `PutLogEvents` limits.
//!
//! CloudWatch Logs rejects a `PutLogEvents` call outright when the batch is
//! too large, so the forwarder has to stay below these bounds on every flush:
//! - **Batch size**: sum of UTF-8 message lengths plus a fixed overhead per event
//! - **Batch count**: number of events in one call
//!
//! See <https://docs.aws.amazon.com/AmazonCloudWatchLogs/latest/APIReference/API_PutLogEvents.html>.

/// Maximum batch payload in bytes accepted by a single `PutLogEvents` call.
///
/// # Value: 1MB (1,048,576 bytes)
///
/// The size of a batch is computed as the sum of all message lengths in UTF-8
/// bytes plus [`LOG_EVENT_OVERHEAD_BYTES`] for each event.
pub const MAX_BATCH_SIZE_BYTES: usize = 1_024 * 1_024;

/// Maximum number of log events in a single `PutLogEvents` call.
pub const MAX_BATCH_COUNT: usize = 10_000;

/// Bytes CloudWatch Logs charges against the batch size for every event.
pub const LOG_EVENT_OVERHEAD_BYTES: usize = 26;
