// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, sync::Arc};

use aws_config::BehaviorVersion;
use lambda_runtime::{run, service_fn, Error as LambdaError, LambdaEvent};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use elb_log_forwarder::{
    aws::{CloudWatchLogsBackend, S3ObjectStore},
    BatchResponse, Config, InvocationEvent, LogIngestor,
};

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    let log_level = env::var("LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = format!(
        "aws_smithy_runtime=off,aws_config=warn,h2=off,hyper=off,rustls=off,{}",
        log_level
    );

    let filter = match EnvFilter::try_new(env_filter) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("could not parse log level '{log_level}': {e}");
            EnvFilter::new("info")
        }
    };
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    debug!("Logging subsystem enabled");

    let config = match Config::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Error creating config on forwarder startup: {e}");
            return Err(e.into());
        }
    };
    info!(
        log_group = %config.log_group,
        stream_name_source = ?config.stream_name_source,
        message_format = ?config.message_format,
        "Starting ELB access log forwarder"
    );

    let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let ingestor = Arc::new(LogIngestor::new(
        config,
        Arc::new(CloudWatchLogsBackend::new(aws_sdk_cloudwatchlogs::Client::new(&sdk_config))),
        Arc::new(S3ObjectStore::new(aws_sdk_s3::Client::new(&sdk_config))),
    ));

    run(service_fn(|event: LambdaEvent<InvocationEvent>| {
        let ingestor = Arc::clone(&ingestor);
        async move { Ok::<BatchResponse, LambdaError>(ingestor.process(event.payload).await) }
    }))
    .await
}
