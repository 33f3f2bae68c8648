// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helper functions for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use async_compression::tokio::bufread::GzipEncoder;
use elb_log_forwarder::{
    BatchLimits, BatchResponse, Config, InvocationEvent, LogIngestor, MessageFormat, ParseErrorPolicy,
    StreamNameSource,
};
use serde_json::{json, Value};
use tokio::io::AsyncReadExt;

use super::mocks::{MockLogBackend, MockObjectStore};

pub const BUCKET: &str = "elb-access-logs";

pub const ALB_HTTP: &str = "http 2018-07-02T22:23:00.186641Z app/my-loadbalancer/50dc6c495c0c9188 \
    192.168.131.39:2817 10.0.0.1:80 0.000 0.001 0.000 200 200 34 366 \
    \"GET http://www.example.com:80/ HTTP/1.1\" \"curl/7.46.0\" - - \
    arn:aws:elasticloadbalancing:us-east-2:123456789012:targetgroup/my-targets/73e2d6bc24d8a067 \
    \"Root=1-58337262-36d228ad5d99923122bbe354\" \"-\" \"-\" \
    0 2018-07-02T22:22:48.364000Z \"forward\" \"-\" \"-\" 10.0.0.1:80 200 \"-\" \"-\"";

pub const ALB_HTTPS: &str = "https 2018-07-02T22:23:00.186641Z app/my-loadbalancer/50dc6c495c0c9188 \
    192.168.131.39:2817 10.0.0.1:80 0.086 0.048 0.037 200 200 0 57 \
    \"GET https://www.example.com:443/ HTTP/1.1\" \"curl/7.46.0\" ECDHE-RSA-AES128-GCM-SHA256 TLSv1.2 \
    arn:aws:elasticloadbalancing:us-east-2:123456789012:targetgroup/my-targets/73e2d6bc24d8a067 \
    \"Root=1-58337281-1d84f3d73c47ec4e58577259\" \"www.example.com\" \"arn:aws:acm:us-east-2:123456789012:certificate/12345678-1234-1234-1234-123456789012\" \
    1 2018-07-02T22:22:48.364000Z \"authenticate,forward\" \"-\" \"-\" 10.0.0.1:80 200 \"-\" \"-\"";

pub const NLB_TLS: &str = "tls 2.0 2018-12-20T02:59:40 net/my-network-loadbalancer/c6e77e28c25b2234 g3d4b5e8bb8464cd \
    72.21.218.154:51341 172.100.100.185:443 5 2 98 246 - \
    arn:aws:acm:us-east-2:671290407336:certificate/2a108f19-aded-46b0-8493-c63eb1ef4a99 - \
    ECDHE-RSA-AES128-SHA tlsv12 - \
    my-network-loadbalancer-c6e77e28c25b2234.elb.us-east-2.amazonaws.com \
    - - -";

pub const CLB_HTTP: &str = "2015-05-13T23:39:43.945958Z my-loadbalancer 192.168.131.39:2817 10.0.0.1:80 \
    0.000073 0.001048 0.000057 200 200 0 29 \"GET http://www.example.com:80/ HTTP/1.1\" \"curl/7.38.0\" - -";

pub const ALB_KEY: &str = "AWSLogs/123456789012/elasticloadbalancing/us-east-2/2018/07/02/\
    123456789012_elasticloadbalancing_us-east-2_app.my-loadbalancer.50dc6c495c0c9188_20180702T2225Z_10.0.0.1_5r0z0y1w.log.gz";
pub const ALB_KEY_2: &str = "AWSLogs/123456789012/elasticloadbalancing/us-east-2/2018/07/02/\
    123456789012_elasticloadbalancing_us-east-2_app.my-loadbalancer.50dc6c495c0c9188_20180702T2230Z_10.0.0.2_6s1a1z2x.log.gz";
pub const NLB_KEY: &str = "AWSLogs/123456789012/elasticloadbalancing/us-east-2/2018/12/20/\
    123456789012_elasticloadbalancing_us-east-2_net.my-network-loadbalancer.c6e77e28c25b2234_20181220T0300Z_1a2b3c4d.log.gz";
pub const CLB_KEY: &str = "AWSLogs/123456789012/elasticloadbalancing/us-west-2/2014/02/15/\
    123456789012_elasticloadbalancing_us-west-2_my-classic-lb_20140215T2340Z_172.160.001.192_20sg8hgm.log";

/// Gzip `lines` joined by newlines
pub async fn gzip_lines(lines: &[&str]) -> Vec<u8> {
    let data = lines.join("\n");
    let mut encoder = GzipEncoder::new(data.as_bytes());
    let mut out = Vec::new();
    encoder
        .read_to_end(&mut out)
        .await
        .expect("Failed to gzip test object");
    out
}

pub fn plain_lines(lines: &[&str]) -> Vec<u8> {
    format!("{}\n", lines.join("\n")).into_bytes()
}

pub fn test_config() -> Config {
    Config {
        log_group: "/aws/elb/access-logs".to_string(),
        message_format: MessageFormat::Plain,
        stream_name_source: StreamNameSource::ElbName,
        parse_error_policy: ParseErrorPolicy::Abort,
        batch_limits: BatchLimits::default(),
        log_level: "info".to_string(),
    }
}

pub fn ingestor(
    config: Config,
    backend: &Arc<MockLogBackend>,
    store: MockObjectStore,
) -> (LogIngestor, Arc<MockObjectStore>) {
    let store = Arc::new(store);
    let ingestor = LogIngestor::new(Arc::new(config), backend.clone(), store.clone());
    (ingestor, store)
}

/// S3 event notification for one object, with the key URL-encoded
pub fn s3_record(key: &str) -> Value {
    json!({
        "eventVersion": "2.1",
        "eventSource": "aws:s3",
        "awsRegion": "us-east-2",
        "eventName": "ObjectCreated:Put",
        "s3": {
            "s3SchemaVersion": "1.0",
            "bucket": {"name": BUCKET, "arn": format!("arn:aws:s3:::{BUCKET}")},
            "object": {"key": urlencoding::encode(key), "size": 1024}
        }
    })
}

/// SQS message wrapping S3 notifications for `keys`
pub fn sqs_message(message_id: &str, keys: &[&str]) -> Value {
    let records: Vec<Value> = keys.iter().map(|key| s3_record(key)).collect();
    json!({
        "messageId": message_id,
        "receiptHandle": "AQEBwJnKyrHigUMZj6rYigCgxlaS3SLy0a",
        "body": json!({"Records": records}).to_string(),
        "eventSource": "aws:sqs",
        "awsRegion": "us-east-2"
    })
}

pub fn invocation(records: Vec<Value>) -> InvocationEvent {
    serde_json::from_value(json!({"Records": records})).expect("Failed to decode invocation")
}

/// Identifiers reported for redelivery, in response order
pub fn failed_ids(response: &BatchResponse) -> Vec<&str> {
    response
        .batch_item_failures
        .iter()
        .map(|failure| failure.item_identifier.as_str())
        .collect()
}
