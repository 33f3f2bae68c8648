// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Parsing of Elastic Load Balancing access-log lines.
//!
//! A line goes through two steps:
//!
//! 1. [`tokenize`] splits it into fields, honoring quotes and backslash escapes.
//! 2. [`classify_and_map`] detects the format from the tokens and projects
//!    them onto the named schema of that format.
//!
//! Application and network load balancer lines start with a type/version
//! preamble, so their load balancer id sits at a fixed early position and has
//! a recognizable prefix. Classic load balancer lines have no preamble and are
//! the fallback when neither prefix matches.

pub mod schema;
mod tokenizer;

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::ParseError;
use schema::{
    ALB_FIELDS, ALB_PREFIX, ALB_PREFIX_INDEX, CLB_FIELDS, NLB_FIELDS, NLB_PREFIX, NLB_PREFIX_INDEX,
};
pub use tokenizer::tokenize;

/// NLB timestamps have no offset, e.g. `2018-12-20T02:59:40`.
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Alb,
    Nlb,
    Clb,
}

impl FormatKind {
    /// Ordered field names of this format.
    pub fn schema(self) -> &'static [&'static str] {
        match self {
            FormatKind::Alb => &ALB_FIELDS,
            FormatKind::Nlb => &NLB_FIELDS,
            FormatKind::Clb => &CLB_FIELDS,
        }
    }

    fn timestamp_index(self) -> usize {
        match self {
            FormatKind::Alb => 1,
            FormatKind::Nlb => 2,
            FormatKind::Clb => 0,
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormatKind::Alb => "ALB",
            FormatKind::Nlb => "NLB",
            FormatKind::Clb => "CLB",
        };
        f.write_str(name)
    }
}

/// Named fields of one record, in schema order.
///
/// Serializes as a JSON object whose keys keep the schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fields(Vec<(&'static str, String)>);

impl Fields {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(key, value)| (*key, value.as_str()))
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(_, value)| value.as_str())
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// One access-log line mapped onto the schema of its format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub timestamp: DateTime<Utc>,
    pub kind: FormatKind,
    pub fields: Fields,
    pub raw: String,
}

/// Tokenizes, classifies and maps one line.
pub fn parse(line: &str) -> Result<ParsedRecord, ParseError> {
    classify_and_map(tokenize(line), line)
}

/// Detects the log format from the tokens of a line.
///
/// The order of the checks matters: CLB is only chosen when both the ALB and
/// the NLB prefix checks fail, so a garbage line is reported as CLB.
pub fn classify(tokens: &[String]) -> Result<FormatKind, ParseError> {
    if token_at(tokens, ALB_PREFIX_INDEX)?.starts_with(ALB_PREFIX) {
        return Ok(FormatKind::Alb);
    }
    if token_at(tokens, NLB_PREFIX_INDEX)?.starts_with(NLB_PREFIX) {
        return Ok(FormatKind::Nlb);
    }
    Ok(FormatKind::Clb)
}

/// Projects the tokens of `raw` onto the schema of the detected format.
pub fn classify_and_map(tokens: Vec<String>, raw: &str) -> Result<ParsedRecord, ParseError> {
    let kind = classify(&tokens)?;
    let schema = kind.schema();
    if tokens.len() != schema.len() {
        return Err(ParseError::FieldCount {
            kind,
            expected: schema.len(),
            actual: tokens.len(),
        });
    }

    let timestamp = parse_timestamp(&tokens[kind.timestamp_index()])?;
    let fields = schema.iter().copied().zip(tokens).collect();

    Ok(ParsedRecord {
        timestamp,
        kind,
        fields: Fields(fields),
        raw: raw.to_string(),
    })
}

fn token_at(tokens: &[String], index: usize) -> Result<&str, ParseError> {
    tokens
        .get(index)
        .map(String::as_str)
        .ok_or(ParseError::MissingField { index })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ParseError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, NAIVE_TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| ParseError::InvalidTimestamp(value.to_string()))
}
