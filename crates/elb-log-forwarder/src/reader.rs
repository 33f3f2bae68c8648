// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Streams parsed records out of one access-log object.

use std::collections::VecDeque;
use std::pin::Pin;

use async_compression::tokio::bufread::GzipDecoder;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Split};
use tracing::warn;

use crate::backend::ObjectBody;
use crate::config::ParseErrorPolicy;
use crate::error::{ForwarderError, ParseError};
use crate::parser::{self, ParsedRecord};

const GZIP_EXTENSION: &str = ".gz";

type LineSource = Pin<Box<dyn AsyncBufRead + Send>>;

/// Single pass reader over the lines of an object.
///
/// Objects whose key ends in `.gz` are decompressed on the fly. Blank lines are
/// ignored and lines are parsed one at a time, so the object is never held in
/// memory as a whole. A line that is not valid UTF-8 is treated as malformed.
pub struct LogReader {
    bucket: String,
    key: String,
    lines: Split<LineSource>,
    // Pieces of a physical line that contained lone '\r' separators.
    split: VecDeque<Vec<u8>>,
    line_number: usize,
    policy: ParseErrorPolicy,
    skipped: usize,
}

impl LogReader {
    pub fn new(
        body: ObjectBody,
        bucket: impl Into<String>,
        key: impl Into<String>,
        policy: ParseErrorPolicy,
    ) -> Self {
        let key = key.into();
        let buffered = BufReader::new(body);
        let source: LineSource = if key.ends_with(GZIP_EXTENSION) {
            let mut decoder = GzipDecoder::new(buffered);
            decoder.multiple_members(true);
            Box::pin(BufReader::new(decoder))
        } else {
            Box::pin(buffered)
        };

        LogReader {
            bucket: bucket.into(),
            key,
            lines: source.split(b'\n'),
            split: VecDeque::new(),
            line_number: 0,
            policy,
            skipped: 0,
        }
    }

    /// Returns the next record, or `None` once the object is exhausted.
    pub async fn next_record(&mut self) -> Result<Option<ParsedRecord>, ForwarderError> {
        while let Some(bytes) = self.next_line().await? {
            let parsed = match String::from_utf8(bytes) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => parser::parse(&line),
                Err(e) => Err(ParseError::InvalidUtf8 {
                    valid_up_to: e.utf8_error().valid_up_to(),
                }),
            };
            match parsed {
                Ok(record) => return Ok(Some(record)),
                Err(source) => match self.policy {
                    ParseErrorPolicy::Abort => {
                        return Err(ForwarderError::MalformedRecord {
                            line: self.line_number,
                            source,
                        });
                    }
                    ParseErrorPolicy::Skip => {
                        warn!(
                            bucket = %self.bucket,
                            key = %self.key,
                            line = self.line_number,
                            error = %source,
                            "Skipping malformed log line"
                        );
                        self.skipped += 1;
                    }
                },
            }
        }
        Ok(None)
    }

    /// Number of malformed lines skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    async fn next_line(&mut self) -> Result<Option<Vec<u8>>, ForwarderError> {
        if self.split.is_empty() {
            let Some(line) = self.lines.next_segment().await.map_err(|e| {
                ForwarderError::ObjectFetch {
                    bucket: self.bucket.clone(),
                    key: self.key.clone(),
                    message: e.to_string(),
                }
            })?
            else {
                return Ok(None);
            };
            let line = line.strip_suffix(b"\r").unwrap_or(&line[..]);
            self.split.extend(line.split(|b| *b == b'\r').map(<[u8]>::to_vec));
        }
        self.line_number += 1;
        Ok(self.split.pop_front())
    }
}
