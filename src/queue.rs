//! Queue-triggered operations.
//!
//! The storage-queue workstream carries the same payloads as the HTTP
//! endpoints, minus the response: a record is processed to completion or
//! its error propagates out of the handler so the transport's redelivery
//! policy takes over. Which operation runs is decided by the queue name,
//! taken from the record's event source.

use lambda_runtime::Error;
use serde::Deserialize;

use crate::config::DbConfig;
use crate::{opslog, protocolpart};

pub const OPERATIONS_LOG_QUEUE: &str = "operations-log-insert";
pub const PROTOCOL_PART_QUEUE: &str = "protocol-part-insert-test";

/// A batch of queue records, as the host delivers them.
#[derive(Deserialize)]
pub struct QueueEvent {
    #[serde(rename = "Records")]
    pub records: Vec<QueueRecord>,
}

#[derive(Deserialize)]
pub struct QueueRecord {
    pub body: String,
    #[serde(rename = "eventSourceARN")]
    pub event_source_arn: String,
}

impl QueueRecord {
    /// The queue name is the last segment of the event source ARN.
    pub fn queue_name(&self) -> &str {
        self.event_source_arn
            .rsplit(':')
            .next()
            .unwrap_or(&self.event_source_arn)
    }
}

pub async fn dispatch(queue: &str, body: &str, cfg: &DbConfig) -> Result<(), Error> {
    match queue {
        OPERATIONS_LOG_QUEUE => opslog::queue_handler(body, cfg).await,
        PROTOCOL_PART_QUEUE => protocolpart::queue_handler(body, cfg).await,
        other => Err(format!("unhandled queue: {other}").into()),
    }
}
