//! Control request sink backed by platform manual imports

use crate::client::PlatformApi;
use async_trait::async_trait;
use std::sync::Arc;
use supctl_core::{ControlRequest, ControlRequestSink, SinkError, SinkReceipt};

/// Submits control requests as manual imports into the own data source
#[derive(Clone)]
pub struct PlatformSink {
    api: Arc<dyn PlatformApi>,
}

impl PlatformSink {
    pub fn new(api: Arc<dyn PlatformApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ControlRequestSink for PlatformSink {
    async fn submit(&self, requests: &[ControlRequest]) -> Result<SinkReceipt, SinkError> {
        let result = self
            .api
            .create_manual_import(requests)
            .await
            .map_err(|e| SinkError(e.to_string()))?;

        Ok(SinkReceipt {
            reference: result.reference,
        })
    }
}
