// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::str::FromStr;

use crate::constants;
use crate::error::ConfigError;
use crate::stream_name::StreamNameSource;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// How a parsed record is rendered into the CloudWatch event message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageFormat {
    /// The access-log line as read from the object.
    #[default]
    Plain,
    /// The named fields serialized as a JSON object.
    Json,
}

impl FromStr for MessageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(MessageFormat::Plain),
            "json" => Ok(MessageFormat::Json),
            other => Err(format!("expected 'plain' or 'json', got '{other}'")),
        }
    }
}

/// What happens to an object when one of its lines cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseErrorPolicy {
    /// Fail the whole object on the first malformed line.
    #[default]
    Abort,
    /// Log the malformed line and continue with the next one.
    Skip,
}

impl FromStr for ParseErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abort" => Ok(ParseErrorPolicy::Abort),
            "skip" => Ok(ParseErrorPolicy::Skip),
            other => Err(format!("expected 'abort' or 'skip', got '{other}'")),
        }
    }
}

/// Hard limits of a single append call to the log backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub max_batch_bytes: usize,
    pub max_batch_count: usize,
    pub event_overhead_bytes: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_batch_bytes: constants::MAX_BATCH_SIZE_BYTES,
            max_batch_count: constants::MAX_BATCH_COUNT,
            event_overhead_bytes: constants::LOG_EVENT_OVERHEAD_BYTES,
        }
    }
}

impl BatchLimits {
    /// Largest message a single event can carry and still fit in a batch.
    pub fn max_message_bytes(&self) -> usize {
        self.max_batch_bytes
            .saturating_sub(self.event_overhead_bytes)
    }

    /// Bytes an event with `message` counts against the batch size.
    pub fn event_size(&self, message: &str) -> usize {
        message.len() + self.event_overhead_bytes
    }
}

/// Configuration of the forwarder, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Destination log group
    pub log_group: String,
    pub message_format: MessageFormat,
    pub stream_name_source: StreamNameSource,
    pub parse_error_policy: ParseErrorPolicy,
    pub batch_limits: BatchLimits,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_group = lookup("LOG_GROUP").ok_or(ConfigError::Missing("LOG_GROUP"))?;

        let message_format = parse_var(&lookup, "MESSAGE_FORMAT")?.unwrap_or_default();
        let parse_error_policy = parse_var(&lookup, "PARSE_ERROR_POLICY")?.unwrap_or_default();

        let stream_name_source = match lookup("LOG_STREAM_NAME") {
            Some(name) => StreamNameSource::Fixed(name),
            None => parse_var(&lookup, "LOG_STREAM_NAME_SOURCE")?.unwrap_or_default(),
        };

        let defaults = BatchLimits::default();
        let batch_limits = BatchLimits {
            max_batch_bytes: parse_var(&lookup, "MAX_BATCH_BYTES")?
                .unwrap_or(defaults.max_batch_bytes),
            max_batch_count: parse_var(&lookup, "MAX_BATCH_COUNT")?
                .unwrap_or(defaults.max_batch_count),
            event_overhead_bytes: parse_var(&lookup, "EVENT_OVERHEAD_BYTES")?
                .unwrap_or(defaults.event_overhead_bytes),
        };

        let log_level = lookup("LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|| "info".to_string());

        let config = Self {
            log_group,
            message_format,
            stream_name_source,
            parse_error_policy,
            batch_limits,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_group.trim().is_empty() {
            return Err(ConfigError::Invalid("LOG_GROUP cannot be empty".to_string()));
        }

        if let StreamNameSource::Fixed(name) = &self.stream_name_source {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "LOG_STREAM_NAME cannot be empty".to_string(),
                ));
            }
        }

        let limits = &self.batch_limits;
        if limits.max_batch_count == 0 {
            return Err(ConfigError::Invalid(
                "MAX_BATCH_COUNT must be greater than 0".to_string(),
            ));
        }
        if limits.event_overhead_bytes >= limits.max_batch_bytes {
            return Err(ConfigError::Invalid(format!(
                "EVENT_OVERHEAD_BYTES ({}) must be smaller than MAX_BATCH_BYTES ({})",
                limits.event_overhead_bytes, limits.max_batch_bytes
            )));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: ToString,
{
    lookup(name)
        .map(|value| {
            value.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
                name,
                value,
                reason: e.to_string(),
            })
        })
        .transpose()
}
