// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::backend::LogStreamBackend;
use crate::config::BatchLimits;
use crate::forwarder::StreamForwarder;

/// Hands out one [`StreamForwarder`] per destination stream name.
///
/// A registry lives for a single invocation, so forwarders are never evicted.
pub struct ForwarderRegistry {
    group: String,
    backend: Arc<dyn LogStreamBackend>,
    limits: BatchLimits,
    forwarders: Mutex<HashMap<String, Arc<StreamForwarder>>>,
}

impl ForwarderRegistry {
    pub fn new(
        group: impl Into<String>,
        backend: Arc<dyn LogStreamBackend>,
        limits: BatchLimits,
    ) -> Self {
        ForwarderRegistry {
            group: group.into(),
            backend,
            limits,
            forwarders: Mutex::new(HashMap::new()),
        }
    }

    pub async fn resolve(&self, name: &str) -> Arc<StreamForwarder> {
        let mut forwarders = self.forwarders.lock().await;
        if let Some(forwarder) = forwarders.get(name) {
            return forwarder.clone();
        }
        let forwarder = Arc::new(StreamForwarder::new(
            self.group.clone(),
            name,
            self.backend.clone(),
            self.limits,
        ));
        forwarders.insert(name.to_string(), forwarder.clone());
        forwarder
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.forwarders.lock().await.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.forwarders.lock().await.is_empty()
    }
}
