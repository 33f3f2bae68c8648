// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Derives the destination log stream name from an access-log object key.
//!
//! Elastic Load Balancing names its log objects after the load balancer:
//!
//! ```text
//! ALB: aws-account-id_elasticloadbalancing_region_app.load-balancer-id_end-time_ip-address_random-string.log.gz
//! NLB: aws-account-id_elasticloadbalancing_region_net.load-balancer-id_end-time_random-string.log.gz
//! CLB: aws-account-id_elasticloadbalancing_region_load-balancer-name_end-time_ip-address_random-string.log
//! ```
//!
//! The fourth `_` separated segment identifies the load balancer. For ALB and
//! NLB it is the load balancer id with `/` replaced by `.`, e.g.
//! `app.my-loadbalancer.50dc6c495c0c9188`.

use std::str::FromStr;

use crate::error::ForwarderError;

const LOAD_BALANCER_SEGMENT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StreamNameSource {
    /// Load balancer name, e.g. `my-loadbalancer`.
    #[default]
    ElbName,
    /// Full load balancer id, e.g. `app/my-loadbalancer/50dc6c495c0c9188`.
    ElbFullName,
    /// The same stream for every object.
    Fixed(String),
}

impl FromStr for StreamNameSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "elb-name" => Ok(StreamNameSource::ElbName),
            "elb-fullname" => Ok(StreamNameSource::ElbFullName),
            other => Err(format!("expected 'elb-name' or 'elb-fullname', got '{other}'")),
        }
    }
}

impl StreamNameSource {
    /// Resolves the log stream name for the object `key`.
    ///
    /// Pure function of the key and the source, no I/O.
    pub fn resolve(&self, key: &str) -> Result<String, ForwarderError> {
        let full_name = match self {
            StreamNameSource::Fixed(name) => return Ok(name.clone()),
            StreamNameSource::ElbName => false,
            StreamNameSource::ElbFullName => true,
        };

        let file_name = key.rsplit('/').next().unwrap_or(key);
        let segment = file_name
            .split('_')
            .nth(LOAD_BALANCER_SEGMENT)
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| ForwarderError::UnrecognizedObjectKey(key.to_string()))?;

        let parts: Vec<&str> = segment.split('.').collect();
        if parts.len() >= 3 {
            // application or network load balancer
            if full_name {
                Ok(parts.join("/"))
            } else {
                Ok(parts[1].to_string())
            }
        } else {
            // classic load balancer
            Ok(parts[0].to_string())
        }
    }
}
